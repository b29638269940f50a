//! Concordance trust evaluation
//!
//! Decides whether a proposed ring state may replace the last state a peer
//! trusted. The decision is a pure function of the request snapshot; nothing
//! here mutates or retains its inputs.
//!
//! Per-signer verdicts fold with this precedence:
//!
//! ```text
//! BadPeerSignature  >  Trusted  >  NoPeerSignature  >  NoPeer (initial)
//! ```
//!
//! One valid signature from an admitted peer is enough to trust, but a
//! single forged or corrupted one poisons the whole state.

use concord_core::{FullPeerInfo, PeerInfo, PeerSet, PublicKey};
use tracing::{debug, instrument};

use crate::ring::Ring;
use crate::signing;
use crate::verdict::ConcordanceVerdict;

/// Inputs to one trust decision
#[derive(Debug, Clone, Copy)]
pub struct ConcordanceRequest<'a> {
    /// Evaluating peer; only membership-sensitive kinds consult it
    pub me: Option<&'a FullPeerInfo>,
    /// Every peer the evaluator can resolve
    pub peers: &'a PeerSet,
    /// Last trusted state
    pub known_ring: Option<&'a Ring>,
    pub proposed_ring: &'a Ring,
    /// Account key that was current when `known_ring` was trusted. Peer
    /// applications are only checked against `user_pubkey`.
    pub known_pubkey: Option<&'a PublicKey>,
    /// Current account key
    pub user_pubkey: Option<&'a PublicKey>,
    /// Peer not required to have signed, usually the evaluator itself
    pub exclude_peer_id: Option<&'a str>,
}

impl<'a> ConcordanceRequest<'a> {
    pub fn new(peers: &'a PeerSet, proposed_ring: &'a Ring) -> Self {
        Self {
            me: None,
            peers,
            known_ring: None,
            proposed_ring,
            known_pubkey: None,
            user_pubkey: None,
            exclude_peer_id: None,
        }
    }

    pub fn with_me(mut self, me: &'a FullPeerInfo) -> Self {
        self.me = Some(me);
        self
    }

    pub fn with_known_ring(mut self, known_ring: &'a Ring) -> Self {
        self.known_ring = Some(known_ring);
        self
    }

    pub fn with_known_pubkey(mut self, known_pubkey: &'a PublicKey) -> Self {
        self.known_pubkey = Some(known_pubkey);
        self
    }

    pub fn with_user_pubkey(mut self, user_pubkey: &'a PublicKey) -> Self {
        self.user_pubkey = Some(user_pubkey);
        self
    }

    pub fn excluding(mut self, peer_id: &'a str) -> Self {
        self.exclude_peer_id = Some(peer_id);
        self
    }

    /// The known ring, if it describes the same ring as the proposal
    pub(crate) fn comparable_known_ring(&self) -> Option<&'a Ring> {
        self.known_ring.filter(|known| {
            known.name() == self.proposed_ring.name()
                && known.identifier() == self.proposed_ring.identifier()
        })
    }
}

/// Which peers must be checked for signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignerScope {
    /// Members the signers ring claims
    Claimed,
    /// Known peers present in the status ring
    Transitive,
}

/// Verdict contributed by a single peer
pub(crate) fn check_peer_status(
    peer_id: &str,
    peers: &PeerSet,
    status_ring: &Ring,
    user_pubkey: &PublicKey,
    exclude_peer_id: Option<&str>,
) -> ConcordanceVerdict {
    let Some(peer) = peers.resolve(peer_id) else {
        return ConcordanceVerdict::NoPeer;
    };
    if !peer.id_matches_key() || !peer.application_verify(user_pubkey) {
        return ConcordanceVerdict::NoPeer;
    }

    let pubkey = peer.copy_public_key();
    if !signing::verify_signature_exists(status_ring, &pubkey) {
        if exclude_peer_id == Some(peer_id) || peer.is_cloud_identity() {
            return ConcordanceVerdict::NoPeer;
        }
        return ConcordanceVerdict::NoPeerSignature;
    }
    if !signing::verify(status_ring, &pubkey) {
        return ConcordanceVerdict::BadPeerSignature;
    }
    ConcordanceVerdict::Trusted
}

/// Fold one peer's verdict into the running verdict
pub(crate) fn combine(
    current: ConcordanceVerdict,
    next: ConcordanceVerdict,
) -> ConcordanceVerdict {
    use ConcordanceVerdict::*;
    match (current, next) {
        (BadPeerSignature, _) | (_, BadPeerSignature) => BadPeerSignature,
        (Trusted, _) | (_, Trusted) => Trusted,
        (NoPeerSignature, _) | (_, NoPeerSignature) => NoPeerSignature,
        (current, _) => current,
    }
}

/// Check every member `signers_ring` claims against `status_ring`'s signatures
pub(crate) fn get_signers_status(
    peers: &PeerSet,
    signers_ring: &Ring,
    status_ring: &Ring,
    user_pubkey: &PublicKey,
    exclude_peer_id: Option<&str>,
) -> ConcordanceVerdict {
    signers_ring
        .peer_ids()
        .iter()
        .map(|peer_id| check_peer_status(peer_id, peers, status_ring, user_pubkey, exclude_peer_id))
        .fold(ConcordanceVerdict::NoPeer, combine)
}

/// Check every known peer that is a member of `status_ring`
///
/// Members the evaluator cannot resolve are skipped instead of counting as
/// `NoPeer`, so peers outside the evaluator's view scope do not weigh in.
/// `signers_ring` does not widen the set: a peer that left the proposed
/// state cannot vouch for it.
pub(crate) fn get_signers_status_transitive(
    peers: &PeerSet,
    signers_ring: &Ring,
    status_ring: &Ring,
    user_pubkey: &PublicKey,
    exclude_peer_id: Option<&str>,
) -> ConcordanceVerdict {
    peers
        .iter()
        .map(PeerInfo::peer_id)
        .filter(|peer_id| status_ring.has_peer_id(peer_id))
        .map(|peer_id| check_peer_status(peer_id, peers, status_ring, user_pubkey, exclude_peer_id))
        .fold(ConcordanceVerdict::NoPeer, combine)
}

fn signers_status(
    scope: SignerScope,
    peers: &PeerSet,
    signers_ring: &Ring,
    status_ring: &Ring,
    user_pubkey: &PublicKey,
    exclude_peer_id: Option<&str>,
) -> ConcordanceVerdict {
    match scope {
        SignerScope::Claimed => {
            get_signers_status(peers, signers_ring, status_ring, user_pubkey, exclude_peer_id)
        }
        SignerScope::Transitive => {
            get_signers_status_transitive(peers, signers_ring, status_ring, user_pubkey, exclude_peer_id)
        }
    }
}

/// Generation and signer checks shared by every variant
///
/// A proposal with no comparable known state, or an offering, must be
/// signed by its own members. Otherwise it must be newer than the known
/// state and signed by the known state's members.
pub(crate) fn evaluate_signers(
    req: &ConcordanceRequest<'_>,
    user_pubkey: &PublicKey,
    scope: SignerScope,
) -> ConcordanceVerdict {
    let proposed = req.proposed_ring;
    let known = match req.comparable_known_ring() {
        Some(known) if !known.is_empty() && !proposed.is_offering() => known,
        _ => return signers_status(scope, req.peers, proposed, proposed, user_pubkey, None),
    };

    if !known.is_older_generation(proposed) {
        return ConcordanceVerdict::GenOld;
    }

    signers_status(
        scope,
        req.peers,
        known,
        proposed,
        user_pubkey,
        req.exclude_peer_id,
    )
}

/// Trust decision based on peer device signatures
#[instrument(skip_all, fields(ring = %req.proposed_ring.name()))]
pub fn peer_key_concordance_trust(req: &ConcordanceRequest<'_>) -> ConcordanceVerdict {
    let verdict = peer_key_verdict(req, SignerScope::Claimed);
    debug!("{} -> {:?}", req.proposed_ring.describe(), verdict);
    verdict
}

pub(crate) fn peer_key_verdict(
    req: &ConcordanceRequest<'_>,
    scope: SignerScope,
) -> ConcordanceVerdict {
    let Some(user) = req.user_pubkey else {
        return ConcordanceVerdict::NoUserKey;
    };
    if req.proposed_ring.is_empty() {
        return ConcordanceVerdict::Trusted;
    }
    evaluate_signers(req, user, scope)
}

/// Trust decision that also requires the account key's own signature
#[instrument(skip_all, fields(ring = %req.proposed_ring.name()))]
pub fn user_key_concordance_trust(req: &ConcordanceRequest<'_>) -> ConcordanceVerdict {
    let verdict = user_key_verdict(req);
    debug!("{} -> {:?} (account key)", req.proposed_ring.describe(), verdict);
    verdict
}

fn user_key_verdict(req: &ConcordanceRequest<'_>) -> ConcordanceVerdict {
    let Some(user) = req.user_pubkey else {
        return ConcordanceVerdict::NoUserKey;
    };
    if !signing::verify_signature_exists(req.proposed_ring, user) {
        return ConcordanceVerdict::NoUserSignature;
    }
    if !signing::verify(req.proposed_ring, user) {
        return ConcordanceVerdict::BadUserSignature;
    }
    peer_key_verdict(req, SignerScope::Claimed)
}
