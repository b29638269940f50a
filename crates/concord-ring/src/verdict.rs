//! Concordance verdicts

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RingError};

/// Outcome of evaluating a proposed ring against what a peer already trusts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConcordanceVerdict {
    Trusted,
    /// Proposed generation is not newer than the known one
    GenOld,
    BadUserSignature,
    NoUserSignature,
    NoUserKey,
    BadPeerSignature,
    NoPeerSignature,
    /// Signer is not a recognized, admitted peer
    NoPeer,
    /// Local peer belongs in the ring but is absent
    MissingMe,
    /// Local peer is in the ring but does not qualify
    NotWorthy,
    /// Kind-specific membership invariant violated
    InvalidMembership,
    /// Type mismatch or internal failure
    Error,
}

impl ConcordanceVerdict {
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Trusted => "trusted",
            Self::GenOld => "generation is not newer than the known ring",
            Self::BadUserSignature => "account key signature does not verify",
            Self::NoUserSignature => "account key has not signed",
            Self::NoUserKey => "no account key available",
            Self::BadPeerSignature => "a peer signature does not verify",
            Self::NoPeerSignature => "no required peer has signed",
            Self::NoPeer => "no recognized peer signed",
            Self::MissingMe => "local peer should be a member but is not",
            Self::NotWorthy => "local peer is a member but does not qualify",
            Self::InvalidMembership => "ring membership violates its kind's rules",
            Self::Error => "ring kinds differ or evaluation failed",
        }
    }

    /// Map a refusal onto the error taxonomy
    pub fn ensure_trusted(self) -> Result<()> {
        match self {
            Self::Trusted => Ok(()),
            Self::GenOld => Err(RingError::Replay(self.description().to_string())),
            Self::NoUserKey => Err(RingError::PublicKeyAbsent),
            Self::BadUserSignature
            | Self::NoUserSignature
            | Self::BadPeerSignature
            | Self::NoPeerSignature => Err(RingError::BadSignature(self.description().to_string())),
            Self::NoPeer | Self::MissingMe | Self::NotWorthy | Self::InvalidMembership => {
                Err(RingError::Untrusted(self))
            }
            Self::Error => Err(RingError::Untrusted(self)),
        }
    }
}

impl fmt::Display for ConcordanceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
