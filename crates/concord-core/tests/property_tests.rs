//! Property-based tests for concord-core using proptest
//!
//! These tests verify invariants that should hold for all valid inputs.

use proptest::prelude::*;
use concord_core::{
    der::{decode_exact, DerValue},
    Error, Generation, PrivateKey,
};

// ============================================
// Arbitrary Implementations
// ============================================

fn arb_der_leaf() -> impl Strategy<Value = DerValue> {
    prop_oneof![
        any::<bool>().prop_map(DerValue::Boolean),
        any::<i64>().prop_map(DerValue::Integer),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(DerValue::Bytes),
        "[ -~]{0,32}".prop_map(DerValue::String),
        prop::collection::btree_set("[a-zA-Z0-9]{1,16}", 0..6).prop_map(DerValue::StringSet),
    ]
}

fn arb_der_value() -> impl Strategy<Value = DerValue> {
    arb_der_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(DerValue::Sequence),
            prop::collection::btree_map("[A-Za-z]{1,12}", inner, 0..6)
                .prop_map(DerValue::Dictionary),
        ]
    })
}

fn arb_private_key() -> impl Strategy<Value = PrivateKey> {
    any::<[u8; 32]>().prop_filter_map("valid scalar", |bytes| PrivateKey::from_bytes(&bytes).ok())
}

// ============================================
// Property Tests
// ============================================

proptest! {
    // ----------------------------------------
    // DER Properties
    // ----------------------------------------

    #[test]
    fn der_roundtrip(value in arb_der_value()) {
        let bytes = value.encode();
        let decoded = decode_exact(&bytes).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn der_truncation_never_decodes(value in arb_der_value()) {
        let bytes = value.encode();
        for len in 0..bytes.len() {
            prop_assert!(decode_exact(&bytes[..len]).is_err());
        }
    }

    #[test]
    fn der_trailing_byte_rejected(value in arb_der_value(), extra in any::<u8>()) {
        let mut bytes = value.encode();
        bytes.push(extra);
        prop_assert_eq!(decode_exact(&bytes), Err(Error::TrailingBytes(1)));
    }

    // ----------------------------------------
    // Generation Properties
    // ----------------------------------------

    #[test]
    fn generation_increment_is_strictly_newer(v in 0i64..i64::MAX) {
        let g = Generation::from_value(v).unwrap();
        let next = g.incremented().unwrap();
        prop_assert!(g.is_older_than(&next));
        prop_assert!(!next.is_older_than(&g));
    }

    #[test]
    fn generation_baseline_is_newer(v in 0i64..i64::MAX) {
        let reference = Generation::from_value(v).unwrap();
        let baseline = Generation::with_baseline(&reference).unwrap();
        prop_assert!(reference.is_older_than(&baseline));
    }

    #[test]
    fn generation_rejects_negative(v in i64::MIN..0) {
        prop_assert_eq!(Generation::from_value(v), Err(Error::NegativeGeneration(v)));
    }

    // ----------------------------------------
    // Signature Properties
    // ----------------------------------------

    #[test]
    fn signature_verifies_only_original_message(
        key in arb_private_key(),
        message in prop::collection::vec(any::<u8>(), 1..128),
        flip in any::<usize>(),
    ) {
        let pubkey = key.public_key().unwrap();
        let signature = key.sign(&message).unwrap();
        prop_assert!(pubkey.verify(&message, &signature).is_ok());

        let mut tampered = message.clone();
        let idx = flip % tampered.len();
        tampered[idx] ^= 0x01;
        prop_assert!(pubkey.verify(&tampered, &signature).is_err());
    }

    #[test]
    fn key_id_is_deterministic(key in arb_private_key()) {
        let pubkey = key.public_key().unwrap();
        prop_assert_eq!(pubkey.key_id(), pubkey.key_id());
        prop_assert_eq!(pubkey.key_id().short().len(), 8);
    }
}
