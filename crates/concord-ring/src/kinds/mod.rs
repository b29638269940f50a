//! Shipped ring kinds

pub mod backup;
pub mod basic;
pub mod recovery;

pub use backup::BackupRing;
pub use basic::BasicRing;
pub use recovery::RecoveryRing;

use crate::error::{Result, RingError};
use crate::ring::Ring;
use crate::types::RingKindTag;

/// Fail unless `ring` is of kind `expected`
pub(crate) fn expect_kind(ring: &Ring, expected: RingKindTag) -> Result<()> {
    if ring.kind() != expected {
        return Err(RingError::UnexpectedType {
            expected,
            found: ring.kind(),
        });
    }
    Ok(())
}

/// Payload of `ring`, or an error naming what was expected
pub(crate) fn require_payload<'r>(ring: &'r Ring, what: &str) -> Result<&'r [u8]> {
    match ring.payload() {
        Some(payload) if !payload.is_empty() => Ok(payload),
        _ => Err(RingError::InvalidPayload(format!("{} holds no {}", ring.name(), what))),
    }
}
