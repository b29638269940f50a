//! # Concord Ring
//!
//! Peer-signed, generation-counted membership rings and the concordance
//! trust decision that gates accepting a proposed ring state.
//!
//! ## Lifecycle
//!
//! ```text
//!   create ──► Empty ──reset_to_offering──► Offering ──apply──► Populated
//!                ▲                                                  │
//!                └──────────────reset_to_empty / withdraw───────────┘
//! ```
//!
//! Every state change that peers must agree on goes through
//! [`signing::generation_sign`], which bumps the generation and discards
//! all prior signatures. A second party (usually the account key) may then
//! co-sign the same state with [`signing::concordance_sign`].
//!
//! Before adopting a ring received from elsewhere, a peer evaluates it with
//! [`concordance_trust`] against the last ring it trusted.
//!
//! ## Kinds
//!
//! | Tag | Kind | Payload |
//! |---|---|---|
//! | 0 | Basic | opaque |
//! | 1 | Backup | [`concord_core::BackupSliceKeyBag`] |
//! | 2-4 | reserved | dispatch fails with [`RingError::UnsupportedKind`] |
//! | 5 | Recovery | [`concord_core::RecoveryKeyBag`] |

pub mod codec;
pub mod concordance;
pub mod dispatch;
pub mod error;
pub mod kinds;
pub mod ring;
pub mod signing;
pub mod traits;
pub mod types;
pub mod verdict;

pub use concordance::ConcordanceRequest;
pub use dispatch::{concordance_trust, kind_for, user_key_concordance_trust};
pub use error::{Result, RingError};
pub use ring::Ring;
pub use traits::RingKind;
pub use types::{RingKindTag, RingStatus};
pub use verdict::ConcordanceVerdict;

/// Structure version written into every ring's signed section
pub const RING_VERSION: i64 = 1;
