//! Kind dispatch
//!
//! Every public ring operation looks up the ring's own kind tag and forwards
//! to that kind. Reserved tags have no kind and fail with
//! [`RingError::UnsupportedKind`].

use concord_core::{FullPeerInfo, PrivateKey, PublicKey};
use tracing::warn;

use crate::concordance::{self, ConcordanceRequest};
use crate::error::{Result, RingError};
use crate::kinds::{BackupRing, BasicRing, RecoveryRing};
use crate::ring::Ring;
use crate::traits::RingKind;
use crate::types::{RingKindTag, RingStatus};
use crate::verdict::ConcordanceVerdict;

static BASIC: BasicRing = BasicRing;
static BACKUP: BackupRing = BackupRing;
static RECOVERY: RecoveryRing = RecoveryRing;

/// The kind bound to `tag`
pub fn kind_for(tag: RingKindTag) -> Result<&'static dyn RingKind> {
    match tag {
        RingKindTag::Basic => Ok(&BASIC),
        RingKindTag::Backup => Ok(&BACKUP),
        RingKindTag::Recovery => Ok(&RECOVERY),
        RingKindTag::PeerKeyed | RingKindTag::EntropyKeyed | RingKindTag::PkKeyed => {
            Err(RingError::UnsupportedKind(tag))
        }
    }
}

impl Ring {
    /// Create an empty ring of `kind`
    pub fn create(name: &str, kind: RingKindTag) -> Result<Ring> {
        kind_for(kind)?.create(name)
    }

    fn kind_impl(&self) -> Result<&'static dyn RingKind> {
        kind_for(self.kind())
    }

    pub fn reset_to_empty(&mut self, requestor_peer_id: &str) -> Result<()> {
        self.kind_impl()?.reset_to_empty(self, requestor_peer_id)
    }

    pub fn reset_to_offering(
        &mut self,
        user_key: Option<&PrivateKey>,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        self.kind_impl()?.reset_to_offering(self, user_key, requestor)
    }

    pub fn device_is_in_ring(&self, peer_id: &str) -> Result<RingStatus> {
        Ok(self.kind_impl()?.device_is_in_ring(self, peer_id))
    }

    pub fn apply(&mut self, user_pubkey: &PublicKey, requestor: &FullPeerInfo) -> Result<()> {
        self.kind_impl()?.apply(self, user_pubkey, requestor)
    }

    pub fn withdraw(
        &mut self,
        user_key: Option<&PrivateKey>,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        self.kind_impl()?.withdraw(self, user_key, requestor)
    }

    pub fn generation_sign(
        &mut self,
        user_key: Option<&PrivateKey>,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        self.kind_impl()?.generation_sign(self, user_key, requestor)
    }

    pub fn concordance_sign(&mut self, requestor: &FullPeerInfo) -> Result<()> {
        self.kind_impl()?.concordance_sign(self, requestor)
    }

    pub fn accept(&mut self, user_key: Option<&PrivateKey>, requestor: &FullPeerInfo) -> Result<()> {
        self.kind_impl()?.accept(self, user_key, requestor)
    }

    pub fn reject(&mut self, user_key: Option<&PrivateKey>, requestor: &FullPeerInfo) -> Result<()> {
        self.kind_impl()?.reject(self, user_key, requestor)
    }

    pub fn set_payload(
        &mut self,
        user_key: Option<&PrivateKey>,
        payload: &[u8],
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        self.kind_impl()?.set_payload(self, user_key, payload, requestor)
    }

    pub fn get_payload(&self) -> Result<Option<&[u8]>> {
        Ok(self.kind_impl()?.get_payload(self))
    }
}

/// Kind of the request, or `None` when known and proposed rings disagree
fn request_kind(req: &ConcordanceRequest<'_>) -> Result<Option<&'static dyn RingKind>> {
    let kind = kind_for(req.proposed_ring.kind())?;
    if let Some(known) = req.known_ring {
        if known.kind() != req.proposed_ring.kind() {
            warn!(
                "Known ring {} is {}, proposed ring is {}",
                known.name(),
                known.kind(),
                req.proposed_ring.kind()
            );
            return Ok(None);
        }
    }
    Ok(Some(kind))
}

/// Decide whether `req.proposed_ring` may replace `req.known_ring`
pub fn concordance_trust(req: &ConcordanceRequest<'_>) -> Result<ConcordanceVerdict> {
    Ok(match request_kind(req)? {
        Some(kind) => kind.concordance_trust(req),
        None => ConcordanceVerdict::Error,
    })
}

/// Like [`concordance_trust`] but the account key must also have signed
pub fn user_key_concordance_trust(req: &ConcordanceRequest<'_>) -> Result<ConcordanceVerdict> {
    Ok(match request_kind(req)? {
        Some(_) => concordance::user_key_concordance_trust(req),
        None => ConcordanceVerdict::Error,
    })
}
