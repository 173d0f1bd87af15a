use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn ed25519_sign_bench(c: &mut Criterion) {
    let kp = oracle_crypto::keypair_from_seed(&[3u8; 32]);
    let msg = b"1,2,3|4,5,6|7,8,9";

    c.bench_function("ed25519_sign_results", |b| {
        b.iter(|| oracle_crypto::sign_message(black_box(msg), &kp.private))
    });
}

fn ed25519_verify_bench(c: &mut Criterion) {
    let kp = oracle_crypto::keypair_from_seed(&[3u8; 32]);
    let msg = b"1,2,3|4,5,6|7,8,9";
    let sig = oracle_crypto::sign_message(msg, &kp.private);

    c.bench_function("ed25519_verify_results", |b| {
        b.iter(|| oracle_crypto::verify_signature(black_box(msg), &sig, &kp.public))
    });
}

fn blake2b_224_bench(c: &mut Criterion) {
    let script = vec![0xABu8; 4096];

    c.bench_function("blake2b_224_4KB_script", |b| {
        b.iter(|| oracle_crypto::blake2b_224(black_box(&script)))
    });
}

fn enforce_format_bench(c: &mut Criterion) {
    let results = (0..64)
        .map(|i| format!("{i},{},{}", i * 2, i * 3))
        .collect::<Vec<_>>()
        .join("|");

    c.bench_function("enforce_format_64_groups", |b| {
        b.iter(|| oracle_crypto::enforce_format(black_box(&results)))
    });
}

fn address_roundtrip_bench(c: &mut Criterion) {
    let kp = oracle_crypto::keypair_from_seed(&[5u8; 32]);
    let addr = oracle_crypto::enterprise_address(oracle_types::NetworkId::Testnet, &kp.public);

    c.bench_function("bech32_address_roundtrip", |b| {
        b.iter(|| {
            let text = oracle_crypto::encode_address(black_box(&addr)).unwrap();
            oracle_crypto::decode_address(&text).unwrap()
        })
    });
}

criterion_group!(
    benches,
    ed25519_sign_bench,
    ed25519_verify_bench,
    blake2b_224_bench,
    enforce_format_bench,
    address_roundtrip_bench,
);
criterion_main!(benches);
