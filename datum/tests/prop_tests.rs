use oracle_datum::{OracleDatum, PlutusData, VoteTally};
use oracle_types::{KeyHash, PublicKey, ScriptHash};
use proptest::prelude::*;

fn plutus_data() -> impl Strategy<Value = PlutusData> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(PlutusData::int),
        any::<u64>().prop_map(PlutusData::int),
        prop::collection::vec(any::<u8>(), 0..150).prop_map(PlutusData::bytes),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(PlutusData::list),
            (0u64..300, prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(alt, fields)| PlutusData::constr(alt, fields)),
            prop::collection::vec((inner.clone(), inner), 0..3).prop_map(PlutusData::Map),
        ]
    })
}

fn oracle_datum() -> impl Strategy<Value = OracleDatum> {
    (
        "[a-z0-9_]{0,40}",
        any::<[u8; 28]>(),
        any::<[u8; 28]>(),
        any::<u64>(),
        prop::collection::vec(any::<[u8; 32]>(), 0..8),
        any::<u64>(),
        any::<[u8; 28]>(),
        prop::option::of(prop::collection::vec(any::<u8>(), 0..200)),
    )
        .prop_map(
            |(proposal_id, policy, creator, deadline, oracles, min_signatures, payment, results)| {
                OracleDatum {
                    proposal_id,
                    policy_id: ScriptHash::new(policy),
                    creator: KeyHash::new(creator),
                    deadline,
                    oracles: oracles.into_iter().map(PublicKey).collect(),
                    min_signatures,
                    payment: KeyHash::new(payment),
                    results,
                }
            },
        )
}

proptest! {
    #[test]
    fn plutus_data_decodes_what_it_encodes(data in plutus_data()) {
        let cbor = data.to_cbor().unwrap();
        prop_assert_eq!(PlutusData::from_cbor(&cbor).unwrap(), data);
    }

    #[test]
    fn oracle_datum_decodes_what_it_encodes(datum in oracle_datum()) {
        let cbor = datum.encode().unwrap();
        prop_assert_eq!(OracleDatum::decode(&cbor).unwrap(), datum);
    }

    #[test]
    fn with_results_preserves_other_fields(datum in oracle_datum(), results in prop::collection::vec(any::<u8>(), 0..64)) {
        let updated = datum.with_results(results.clone());
        prop_assert_eq!(updated.results.as_deref(), Some(results.as_slice()));
        prop_assert_eq!(OracleDatum { results: datum.results.clone(), ..updated }, datum);
    }

    #[test]
    fn vote_tally_text_roundtrip(questions in prop::collection::vec(prop::collection::vec((any::<u64>(), any::<u64>()), 1..5), 1..5)) {
        let text = questions
            .iter()
            .map(|votes| votes.iter().map(|(c, w)| format!("{c}:{w}")).collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join("|");
        let tally: VoteTally = text.parse().unwrap();
        prop_assert_eq!(tally.to_string(), text);
    }

    #[test]
    fn decoder_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = PlutusData::from_cbor(&bytes);
        let _ = OracleDatum::decode(&bytes);
    }
}
