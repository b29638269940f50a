//! Closed enums shared by ring operations

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ring kind discriminator, as carried in the signed `RingType` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum RingKindTag {
    /// Membership only
    Basic = 0,
    /// View-scoped backup slice
    Backup = 1,
    /// Reserved, no implementation
    PeerKeyed = 2,
    /// Reserved, no implementation
    EntropyKeyed = 3,
    /// Reserved, no implementation
    PkKeyed = 4,
    /// Account recovery key registration
    Recovery = 5,
}

impl RingKindTag {
    /// Get the tag from its wire value
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Basic),
            1 => Some(Self::Backup),
            2 => Some(Self::PeerKeyed),
            3 => Some(Self::EntropyKeyed),
            4 => Some(Self::PkKeyed),
            5 => Some(Self::Recovery),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Get the human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Backup => "Backup",
            Self::PeerKeyed => "PeerKeyed",
            Self::EntropyKeyed => "EntropyKeyed",
            Self::PkKeyed => "PKKeyed",
            Self::Recovery => "Recovery",
        }
    }

    /// True for the tags that have a kind implementation bound
    pub fn is_implemented(&self) -> bool {
        matches!(self, Self::Basic | Self::Backup | Self::Recovery)
    }
}

impl fmt::Display for RingKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a peer id sits relative to a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingStatus {
    Member,
    Applicant,
    Rejected,
    NotInRing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_wire_values() {
        for v in 0..6u32 {
            let tag = RingKindTag::from_u32(v).unwrap();
            assert_eq!(tag.as_u32(), v);
        }
        assert_eq!(RingKindTag::from_u32(6), None);
    }

    #[test]
    fn test_reserved_tags_not_implemented() {
        assert!(RingKindTag::Basic.is_implemented());
        assert!(RingKindTag::Recovery.is_implemented());
        assert!(!RingKindTag::PeerKeyed.is_implemented());
        assert!(!RingKindTag::EntropyKeyed.is_implemented());
        assert!(!RingKindTag::PkKeyed.is_implemented());
        assert_eq!(RingKindTag::PkKeyed.to_string(), "PKKeyed");
    }
}
