use criterion::{black_box, criterion_group, criterion_main, Criterion};
use oracle_datum::{OracleDatum, VoteTally};
use oracle_types::{KeyHash, PublicKey, ScriptHash};

fn sample_datum() -> OracleDatum {
    OracleDatum {
        proposal_id: "bench_proposal".into(),
        policy_id: ScriptHash::new([1; 28]),
        creator: KeyHash::new([2; 28]),
        deadline: 1_700_000_000_000,
        oracles: (0..16u8).map(|i| PublicKey([i; 32])).collect(),
        min_signatures: 11,
        payment: KeyHash::new([3; 28]),
        results: Some(b"1,2,3|4,5,6|7,8,9".to_vec()),
    }
}

fn encode_bench(c: &mut Criterion) {
    let datum = sample_datum();
    c.bench_function("oracle_datum_encode_16_oracles", |b| {
        b.iter(|| black_box(&datum).encode().unwrap())
    });
}

fn decode_bench(c: &mut Criterion) {
    let cbor = sample_datum().encode().unwrap();
    c.bench_function("oracle_datum_decode_16_oracles", |b| {
        b.iter(|| OracleDatum::decode(black_box(&cbor)).unwrap())
    });
}

fn tally_bench(c: &mut Criterion) {
    let text = (0..32)
        .map(|i| format!("{i}:{},{}:{}", i * 10, i + 1, i * 20))
        .collect::<Vec<_>>()
        .join("|");
    c.bench_function("vote_tally_parse_32_questions", |b| {
        b.iter(|| black_box(&text).parse::<VoteTally>().unwrap())
    });
}

criterion_group!(benches, encode_bench, decode_bench, tally_bench);
criterion_main!(benches);
