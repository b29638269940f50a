//! Error types for ring operations

use thiserror::Error;

use crate::types::RingKindTag;
use crate::verdict::ConcordanceVerdict;

/// Result type for ring operations
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors that can occur while building, signing or decoding a ring
#[derive(Debug, Error)]
pub enum RingError {
    /// Rings must be named
    #[error("Ring name must not be empty")]
    NoName,

    /// The kind tag is valid on the wire but has no implementation
    #[error("Unsupported ring kind: {0}")]
    UnsupportedKind(RingKindTag),

    /// Operation targeted a ring of the wrong kind
    #[error("Unexpected ring type: expected {expected}, found {found}")]
    UnexpectedType {
        expected: RingKindTag,
        found: RingKindTag,
    },

    /// A signature could not be produced or an application did not verify
    #[error("Bad signature: {0}")]
    BadSignature(String),

    /// Ring is incomplete and cannot be encoded
    #[error("Ring encoding failed: {0}")]
    Encode(String),

    /// Wire form is malformed
    #[error("Ring decoding failed: {0}")]
    Decode(String),

    /// Withdraw targeted a peer the ring does not know
    #[error("Peer not found in ring: {0}")]
    PeerNotFound(String),

    /// Stale generation or membership-exclusion violation
    #[error("Replay rejected: {0}")]
    Replay(String),

    /// Account public key missing where required
    #[error("Account public key absent")]
    PublicKeyAbsent,

    /// Backup ring member lacks a view the ring covers
    #[error("Peer {peer_id} is not permitted for view {view}")]
    ViewNotPermitted { peer_id: String, view: String },

    /// Payload does not decode as the kind's key bag
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Concordance evaluation refused the ring
    #[error("Ring not trusted: {0}")]
    Untrusted(ConcordanceVerdict),

    /// Error from the core primitives
    #[error(transparent)]
    Core(#[from] concord_core::Error),
}
