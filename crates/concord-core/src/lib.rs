//! Concord Core - keys, generation counters, DER values and peer records
//!
//! This crate provides the leaf primitives the Concord ring engine is built
//! on. Nothing here knows about rings.

pub mod crypto;
pub mod der;
pub mod error;
pub mod generation;
pub mod keybag;
pub mod peer;
pub mod types;

pub use crypto::{sha256, sha256_multi, PrivateKey, PublicKey, SIGNATURE_SIZE};
pub use der::DerValue;
pub use error::{Error, Result};
pub use generation::Generation;
pub use keybag::{BackupSliceKeyBag, RecoveryKeyBag};
pub use peer::{FullPeerInfo, PeerInfo, PeerSet};
pub use types::KeyId;

/// Maximum nesting accepted by the DER decoder
pub const MAX_DER_DEPTH: usize = 32;

/// Recovery key bag format version
pub const RECOVERY_KEY_BAG_VERSION: i64 = 1;
