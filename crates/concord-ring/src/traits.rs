//! Capability trait implemented by every ring kind
//!
//! Default bodies carry the behavior shared by all shipped kinds; a kind
//! overrides only where its rules differ. Mutating operations work on a
//! copy and commit it once every step has succeeded, so a failed call
//! leaves the ring untouched.

use concord_core::{FullPeerInfo, PeerInfo, PrivateKey, PublicKey};
use tracing::{debug, instrument};

use crate::concordance::{self, ConcordanceRequest};
use crate::error::{Result, RingError};
use crate::ring::Ring;
use crate::signing;
use crate::types::{RingKindTag, RingStatus};
use crate::verdict::ConcordanceVerdict;

pub trait RingKind: Send + Sync {
    /// The tag this kind is bound to
    fn tag(&self) -> RingKindTag;

    /// Fresh, empty ring of this kind
    fn create(&self, name: &str) -> Result<Ring> {
        Ring::blank(name, self.tag())
    }

    /// Check that `peer` may be a member of `ring`
    fn admit(&self, _ring: &Ring, _peer: &PeerInfo) -> Result<()> {
        Ok(())
    }

    /// Check that `payload` is well formed for this kind
    fn validate_payload(&self, _payload: &[u8]) -> Result<()> {
        Ok(())
    }

    /// Drop all membership and payload and restart the generation
    fn reset_to_empty(&self, ring: &mut Ring, requestor_peer_id: &str) -> Result<()> {
        ring.clear_membership();
        ring.put_payload(Vec::new());
        signing::restart_generation(ring)?;
        ring.set_last_modifier(requestor_peer_id);
        debug!("Reset {} to empty", ring.name());
        Ok(())
    }

    /// Reset to a ring whose only member is `requestor`
    #[instrument(skip_all, fields(ring = %ring.name(), peer = %requestor.peer_id()))]
    fn reset_to_offering(
        &self,
        ring: &mut Ring,
        user_key: Option<&PrivateKey>,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        self.admit(ring, requestor.peer_info())?;

        let mut next = ring.clone();
        self.reset_to_empty(&mut next, requestor.peer_id())?;
        next.add_peer_id(requestor.peer_id())?;
        self.generation_sign(&mut next, user_key, requestor)?;

        *ring = next;
        debug!("Offering {}", ring.describe());
        Ok(())
    }

    fn device_is_in_ring(&self, ring: &Ring, peer_id: &str) -> RingStatus {
        ring.status_of(peer_id)
    }

    /// Join `ring` once the account key has admitted `requestor`
    #[instrument(skip_all, fields(ring = %ring.name(), peer = %requestor.peer_id()))]
    fn apply(&self, ring: &mut Ring, user_pubkey: &PublicKey, requestor: &FullPeerInfo) -> Result<()> {
        let peer = requestor.peer_info();
        let peer_id = requestor.peer_id();
        if !peer.application_verify(user_pubkey) {
            return Err(RingError::BadSignature(format!(
                "application of {} does not verify with the account key",
                peer_id
            )));
        }
        if ring.has_peer_id(peer_id) {
            debug!("Already a member");
            return Ok(());
        }
        self.admit(ring, peer)?;

        let mut next = ring.clone();
        next.remove_applicant(peer_id);
        next.remove_rejection(peer_id);
        next.add_peer_id(peer_id)?;
        signing::generation_sign(&mut next, Some(requestor.device_key()), peer_id)?;

        *ring = next;
        debug!("Applied to {}", ring.describe());
        Ok(())
    }

    /// Leave `ring`, from whichever set holds `requestor`
    #[instrument(skip_all, fields(ring = %ring.name(), peer = %requestor.peer_id()))]
    fn withdraw(
        &self,
        ring: &mut Ring,
        user_key: Option<&PrivateKey>,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        let peer_id = requestor.peer_id();
        let mut next = ring.clone();
        let removed = next.remove_peer_id(peer_id)
            | next.remove_applicant(peer_id)
            | next.remove_rejection(peer_id);
        if !removed {
            return Err(RingError::PeerNotFound(peer_id.to_string()));
        }
        self.generation_sign(&mut next, user_key, requestor)?;

        *ring = next;
        debug!("Withdrew from {}", ring.describe());
        Ok(())
    }

    /// Sign a new generation with the requestor's device key, co-signed by
    /// the account key when one is supplied
    fn generation_sign(
        &self,
        ring: &mut Ring,
        user_key: Option<&PrivateKey>,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        signing::generation_sign(ring, Some(requestor.device_key()), requestor.peer_id())?;
        if let Some(user_key) = user_key {
            signing::concordance_sign(ring, user_key)?;
        }
        Ok(())
    }

    fn concordance_sign(&self, ring: &mut Ring, requestor: &FullPeerInfo) -> Result<()> {
        signing::concordance_sign(ring, requestor.device_key())
    }

    fn concordance_trust(&self, req: &ConcordanceRequest<'_>) -> ConcordanceVerdict {
        concordance::peer_key_concordance_trust(req)
    }

    /// No applicant workflow; always succeeds
    fn accept(
        &self,
        _ring: &mut Ring,
        _user_key: Option<&PrivateKey>,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        debug!("{} ring accept for {} is a no-op", self.tag(), requestor.peer_id());
        Ok(())
    }

    /// No applicant workflow; always succeeds
    fn reject(
        &self,
        _ring: &mut Ring,
        _user_key: Option<&PrivateKey>,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        debug!("{} ring reject for {} is a no-op", self.tag(), requestor.peer_id());
        Ok(())
    }

    /// Store a payload and sign the new generation
    fn set_payload(
        &self,
        ring: &mut Ring,
        user_key: Option<&PrivateKey>,
        payload: &[u8],
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        self.validate_payload(payload)?;
        let mut next = ring.clone();
        next.put_payload(payload.to_vec());
        self.generation_sign(&mut next, user_key, requestor)?;
        *ring = next;
        Ok(())
    }

    fn get_payload<'r>(&self, ring: &'r Ring) -> Option<&'r [u8]> {
        ring.payload()
    }
}
