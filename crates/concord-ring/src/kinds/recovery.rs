//! Account recovery key registration ring
//!
//! Membership works like a basic ring. The payload is an encoded
//! [`RecoveryKeyBag`] naming the account's current recovery key.

use concord_core::{FullPeerInfo, PrivateKey, RecoveryKeyBag};

use crate::error::{Result, RingError};
use crate::kinds::{expect_kind, require_payload};
use crate::ring::Ring;
use crate::traits::RingKind;
use crate::types::RingKindTag;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryRing;

impl RingKind for RecoveryRing {
    fn tag(&self) -> RingKindTag {
        RingKindTag::Recovery
    }

    fn validate_payload(&self, payload: &[u8]) -> Result<()> {
        RecoveryKeyBag::decode(payload)
            .map(|_| ())
            .map_err(|e| RingError::InvalidPayload(e.to_string()))
    }
}

impl Ring {
    /// Store `bag` as the payload and sign the new generation
    pub fn set_recovery_key_bag(
        &mut self,
        user_key: Option<&PrivateKey>,
        bag: &RecoveryKeyBag,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        expect_kind(self, RingKindTag::Recovery)?;
        let encoded = bag.encode()?;
        self.set_payload(user_key, &encoded, requestor)
    }

    pub fn copy_recovery_key_bag(&self) -> Result<RecoveryKeyBag> {
        expect_kind(self, RingKindTag::Recovery)?;
        let payload = require_payload(self, "recovery key bag")?;
        RecoveryKeyBag::decode(payload).map_err(|e| RingError::InvalidPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing;

    fn device(seed: u8) -> FullPeerInfo {
        FullPeerInfo::new(PrivateKey::from_bytes(&[seed; 32]).unwrap(), Vec::<String>::new())
            .unwrap()
    }

    #[test]
    fn test_recovery_key_bag_roundtrip() {
        let me = device(1);
        let mut ring = Ring::create("recovery", RingKindTag::Recovery).unwrap();
        ring.reset_to_offering(None, &me).unwrap();

        let bag = RecoveryKeyBag::new("1234567890", vec![0xAB; 33]);
        ring.set_recovery_key_bag(None, &bag, &me).unwrap();

        assert_eq!(ring.copy_recovery_key_bag().unwrap(), bag);
        assert!(signing::verify_peer_signed(&ring, me.peer_info()));
        assert_eq!(ring.generation().value(), 3);
    }

    #[test]
    fn test_rejects_foreign_payload() {
        let me = device(1);
        let mut ring = Ring::create("recovery", RingKindTag::Recovery).unwrap();
        ring.reset_to_offering(None, &me).unwrap();
        let before = ring.clone();

        assert!(matches!(
            ring.set_payload(None, b"not a key bag", &me),
            Err(RingError::InvalidPayload(_))
        ));
        assert_eq!(ring, before);
    }

    #[test]
    fn test_empty_payload_has_no_bag() {
        let ring = Ring::create("recovery", RingKindTag::Recovery).unwrap();
        assert!(matches!(
            ring.copy_recovery_key_bag(),
            Err(RingError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_wrong_kind() {
        let me = device(1);
        let mut ring = Ring::create("basic", RingKindTag::Basic).unwrap();
        let bag = RecoveryKeyBag::new("1234567890", vec![1; 33]);
        assert!(matches!(
            ring.set_recovery_key_bag(None, &bag, &me),
            Err(RingError::UnexpectedType { .. })
        ));
    }
}
