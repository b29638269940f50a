//! Membership-only ring

use crate::traits::RingKind;
use crate::types::RingKindTag;

/// Plain membership ring; every operation uses the shared defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRing;

impl RingKind for BasicRing {
    fn tag(&self) -> RingKindTag {
        RingKindTag::Basic
    }
}
