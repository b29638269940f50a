//! View-scoped backup ring
//!
//! A backup ring covers a set of views. Every member must be permitted for
//! all of them, and a peer permitted for all of them belongs in the ring.
//! The payload is an encoded [`BackupSliceKeyBag`].

use concord_core::{BackupSliceKeyBag, FullPeerInfo, PeerInfo, PrivateKey};
use tracing::{debug, instrument};

use crate::concordance::{self, ConcordanceRequest, SignerScope};
use crate::error::{Result, RingError};
use crate::kinds::{expect_kind, require_payload};
use crate::ring::Ring;
use crate::traits::RingKind;
use crate::types::RingKindTag;
use crate::verdict::ConcordanceVerdict;

#[derive(Debug, Clone, Copy, Default)]
pub struct BackupRing;

impl BackupRing {
    /// Membership checks that run before any signature is looked at
    fn membership_verdict(&self, req: &ConcordanceRequest<'_>) -> Option<ConcordanceVerdict> {
        let proposed = req.proposed_ring;
        let views = proposed.backup_views();

        if let Some(me) = req.me {
            let belongs = me.peer_info().is_permitted_for_all(&views);
            let present = proposed.has_peer_id(me.peer_id());
            match (belongs, present) {
                (true, false) => return Some(ConcordanceVerdict::MissingMe),
                (false, true) => return Some(ConcordanceVerdict::NotWorthy),
                _ => {}
            }
        }

        let all_permitted = proposed.peer_ids().iter().all(|peer_id| {
            req.peers
                .resolve(peer_id)
                .map_or(false, |peer| peer.is_permitted_for_all(&views))
        });
        if !all_permitted {
            return Some(ConcordanceVerdict::InvalidMembership);
        }
        None
    }
}

impl RingKind for BackupRing {
    fn tag(&self) -> RingKindTag {
        RingKindTag::Backup
    }

    fn create(&self, name: &str) -> Result<Ring> {
        let mut ring = Ring::blank(name, RingKindTag::Backup)?;
        ring.set_backup_view_set(Vec::new())?;
        Ok(ring)
    }

    fn admit(&self, ring: &Ring, peer: &PeerInfo) -> Result<()> {
        match ring
            .backup_views()
            .into_iter()
            .find(|view| !peer.is_permitted_for_view(view))
        {
            Some(view) => Err(RingError::ViewNotPermitted {
                peer_id: peer.peer_id().to_string(),
                view,
            }),
            None => Ok(()),
        }
    }

    fn validate_payload(&self, payload: &[u8]) -> Result<()> {
        BackupSliceKeyBag::decode(payload)
            .map(|_| ())
            .map_err(|e| RingError::InvalidPayload(e.to_string()))
    }

    #[instrument(skip_all, fields(ring = %req.proposed_ring.name()))]
    fn concordance_trust(&self, req: &ConcordanceRequest<'_>) -> ConcordanceVerdict {
        let Some(user) = req.user_pubkey else {
            return ConcordanceVerdict::NoUserKey;
        };
        if req.proposed_ring.is_empty() {
            return ConcordanceVerdict::Trusted;
        }
        let verdict = self.membership_verdict(req).unwrap_or_else(|| {
            concordance::evaluate_signers(req, user, SignerScope::Transitive)
        });
        debug!("{} -> {:?}", req.proposed_ring.describe(), verdict);
        verdict
    }
}

impl Ring {
    /// Store `bag` as the payload and sign the new generation
    pub fn set_backup_key_bag(
        &mut self,
        user_key: Option<&PrivateKey>,
        bag: &BackupSliceKeyBag,
        requestor: &FullPeerInfo,
    ) -> Result<()> {
        expect_kind(self, RingKindTag::Backup)?;
        let encoded = bag.encode()?;
        self.set_payload(user_key, &encoded, requestor)
    }

    pub fn copy_backup_key_bag(&self) -> Result<BackupSliceKeyBag> {
        expect_kind(self, RingKindTag::Backup)?;
        let payload = require_payload(self, "backup key bag")?;
        BackupSliceKeyBag::decode(payload).map_err(|e| RingError::InvalidPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::signing;
    use concord_core::PeerSet;
    use ConcordanceVerdict::*;

    const VIEW: &str = "ViewX";

    fn device(seed: u8, views: &[&str], user: &PrivateKey) -> FullPeerInfo {
        let key = PrivateKey::from_bytes(&[seed; 32]).unwrap();
        let mut full =
            FullPeerInfo::new(key, views.iter().map(|v| v.to_string())).unwrap();
        full.sign_application(user).unwrap();
        full
    }

    fn user() -> PrivateKey {
        PrivateKey::from_bytes(&[0x42; 32]).unwrap()
    }

    fn backup_ring() -> Ring {
        let mut ring = Ring::create("backup", RingKindTag::Backup).unwrap();
        ring.set_backup_view_set(vec![VIEW.to_string()]).unwrap();
        ring
    }

    #[test]
    fn test_create_has_view_set() {
        let ring = Ring::create("backup", RingKindTag::Backup).unwrap();
        assert_eq!(ring.backup_view_set().map(|v| v.len()), Some(0));
    }

    #[test]
    fn test_apply_requires_view_permission() {
        let user = user();
        let outsider = device(2, &[], &user);
        let mut ring = backup_ring();
        let err = ring
            .apply(&user.public_key().unwrap(), &outsider)
            .unwrap_err();
        assert!(matches!(err, RingError::ViewNotPermitted { view, .. } if view == VIEW));
        assert!(ring.is_empty());
    }

    #[test]
    fn test_member_outside_view_is_invalid() {
        let user = user();
        let user_pub = user.public_key().unwrap();
        let member = device(1, &[VIEW], &user);
        let outsider = device(2, &[], &user);

        let mut ring = backup_ring();
        ring.reset_to_offering(None, &member).unwrap();
        ring.add_peer_id(outsider.peer_id()).unwrap();
        ring.generation_sign(None, &member).unwrap();

        let peers: PeerSet = [member.peer_info().clone(), outsider.peer_info().clone()]
            .into_iter()
            .collect();
        let req = ConcordanceRequest::new(&peers, &ring).with_user_pubkey(&user_pub);
        assert_eq!(BackupRing.concordance_trust(&req), InvalidMembership);
    }

    #[test]
    fn test_widened_views_invalidate_members() {
        let user = user();
        let user_pub = user.public_key().unwrap();
        let member = device(1, &[VIEW], &user);
        let peers: PeerSet = std::iter::once(member.peer_info().clone()).collect();

        let mut ring = backup_ring();
        ring.reset_to_offering(None, &member).unwrap();
        ring.set_backup_view_set(vec![VIEW.to_string(), "ViewY".to_string()])
            .unwrap();
        ring.generation_sign(None, &member).unwrap();

        let req = ConcordanceRequest::new(&peers, &ring).with_user_pubkey(&user_pub);
        assert_eq!(BackupRing.concordance_trust(&req), InvalidMembership);

        // composing operations check the widened views
        let mut fresh = ring.clone();
        assert!(matches!(
            fresh.reset_to_offering(None, &member),
            Err(RingError::ViewNotPermitted { view, .. }) if view == "ViewY"
        ));
        assert_eq!(fresh, ring);
    }

    #[test]
    fn test_me_placement() {
        let user = user();
        let user_pub = user.public_key().unwrap();
        let member = device(1, &[VIEW], &user);
        let eligible = device(2, &[VIEW], &user);
        let ineligible = device(3, &[], &user);

        let mut ring = backup_ring();
        ring.reset_to_offering(None, &member).unwrap();
        let peers: PeerSet = [member.peer_info(), eligible.peer_info(), ineligible.peer_info()]
            .into_iter()
            .cloned()
            .collect();

        let req = ConcordanceRequest::new(&peers, &ring)
            .with_user_pubkey(&user_pub)
            .with_me(&eligible);
        assert_eq!(BackupRing.concordance_trust(&req), MissingMe);

        let req = ConcordanceRequest::new(&peers, &ring)
            .with_user_pubkey(&user_pub)
            .with_me(&ineligible);
        assert_eq!(BackupRing.concordance_trust(&req), Trusted);

        let req = ConcordanceRequest::new(&peers, &ring)
            .with_user_pubkey(&user_pub)
            .with_me(&member);
        assert_eq!(BackupRing.concordance_trust(&req), Trusted);

        // a member that lost the view no longer qualifies
        let mut demoted = member.clone();
        demoted.peer_info_mut().disable_view(VIEW);
        let req = ConcordanceRequest::new(&peers, &ring)
            .with_user_pubkey(&user_pub)
            .with_me(&demoted);
        assert_eq!(BackupRing.concordance_trust(&req), NotWorthy);
    }

    #[test]
    fn test_departed_member_cannot_vouch() {
        let user = user();
        let user_pub = user.public_key().unwrap();
        let a = device(1, &[VIEW], &user);
        let b = device(2, &[VIEW], &user);
        let c = device(3, &[VIEW], &user);
        let peers: PeerSet = [a.peer_info(), b.peer_info(), c.peer_info()]
            .into_iter()
            .cloned()
            .collect();

        let mut known = backup_ring();
        known.reset_to_offering(None, &a).unwrap();
        known.add_peer_id(b.peer_id()).unwrap();
        known.add_peer_id(c.peer_id()).unwrap();
        known.generation_sign(None, &a).unwrap();

        let mut proposed = known.clone();
        proposed.withdraw(None, &a).unwrap();
        assert_eq!(proposed.count_peers(), 2);

        let req = ConcordanceRequest::new(&peers, &proposed)
            .with_known_ring(&known)
            .with_user_pubkey(&user_pub);
        assert_eq!(BackupRing.concordance_trust(&req), NoPeerSignature);

        // a remaining member's signature is enough
        proposed.concordance_sign(&b).unwrap();
        let req = ConcordanceRequest::new(&peers, &proposed)
            .with_known_ring(&known)
            .with_user_pubkey(&user_pub);
        assert_eq!(BackupRing.concordance_trust(&req), Trusted);
    }

    #[test]
    fn test_unrelated_peer_does_not_sway_verdict() {
        let user = user();
        let user_pub = user.public_key().unwrap();
        let a = device(1, &[VIEW], &user);
        let b = device(2, &[VIEW], &user);
        let stranger = device(4, &[VIEW], &user);
        let peers: PeerSet = [a.peer_info(), b.peer_info(), stranger.peer_info()]
            .into_iter()
            .cloned()
            .collect();

        let mut known = backup_ring();
        known.reset_to_offering(None, &a).unwrap();
        known.add_peer_id(b.peer_id()).unwrap();
        known.generation_sign(None, &a).unwrap();

        let mut proposed = known.clone();
        signing::generation_sign(&mut proposed, Some(stranger.device_key()), stranger.peer_id())
            .unwrap();
        let req = ConcordanceRequest::new(&peers, &proposed)
            .with_known_ring(&known)
            .with_user_pubkey(&user_pub);
        assert_eq!(BackupRing.concordance_trust(&req), NoPeerSignature);

        let key_id = stranger.peer_info().copy_public_key().key_id();
        let mut sig = proposed.signature_for(&key_id).unwrap().to_vec();
        sig[5] ^= 0x01;
        proposed.add_signature(key_id, sig);
        let req = ConcordanceRequest::new(&peers, &proposed)
            .with_known_ring(&known)
            .with_user_pubkey(&user_pub);
        assert_eq!(BackupRing.concordance_trust(&req), NoPeerSignature);
    }

    #[test]
    fn test_backup_key_bag() {
        let user = user();
        let member = device(1, &[VIEW], &user);
        let mut ring = backup_ring();
        ring.reset_to_offering(Some(&user), &member).unwrap();

        let mut wrapped = BTreeMap::new();
        wrapped.insert(member.peer_id().to_string(), vec![7; 40]);
        let bag = BackupSliceKeyBag::new(vec![1, 2, 3, 4], wrapped);
        ring.set_backup_key_bag(Some(&user), &bag, &member).unwrap();

        assert_eq!(ring.copy_backup_key_bag().unwrap(), bag);
        assert!(signing::verify_peer_signed(&ring, member.peer_info()));
        assert!(signing::verify(&ring, &user.public_key().unwrap()));

        assert!(matches!(
            ring.set_payload(None, &[0x04, 0x01, 0x00], &member),
            Err(RingError::InvalidPayload(_))
        ));
    }
}
