//! Peer records consumed by ring operations
//!
//! A [`PeerInfo`] is the public identity of a device: its signing key, the
//! views it may participate in, and the account key's signature over its
//! application. A [`FullPeerInfo`] adds the device's private key and is only
//! held by the device itself.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::crypto::{sha256_multi, PrivateKey, PublicKey};
use crate::error::Result;
use crate::types::hex_opt_bytes;

/// Domain separator for application signatures
const APPLICATION_DOMAIN: &[u8] = b"concord-peer-application-v1";

/// Public identity of a peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Key id of `public_key`
    peer_id: String,

    /// Device signing key
    public_key: PublicKey,

    /// Views this peer is permitted to sync
    views: BTreeSet<String>,

    /// Cloud identities are never required to sign a ring
    cloud_identity: bool,

    /// Account key signature over the application digest
    #[serde(with = "hex_opt_bytes")]
    application: Option<Vec<u8>>,
}

impl PeerInfo {
    /// Create an unapplied peer record for `public_key`
    pub fn new(public_key: PublicKey, views: impl IntoIterator<Item = String>) -> Self {
        Self {
            peer_id: public_key.key_id().into_string(),
            public_key,
            views: views.into_iter().collect(),
            cloud_identity: false,
            application: None,
        }
    }

    /// Mark this record as the account's cloud identity
    pub fn with_cloud_identity(mut self, cloud_identity: bool) -> Self {
        self.cloud_identity = cloud_identity;
        self
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn copy_public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn permitted_views(&self) -> &BTreeSet<String> {
        &self.views
    }

    pub fn is_permitted_for_view(&self, view: &str) -> bool {
        self.views.contains(view)
    }

    /// True if every view in `views` is permitted
    pub fn is_permitted_for_all<'a>(&self, views: impl IntoIterator<Item = &'a String>) -> bool {
        views.into_iter().all(|v| self.views.contains(v))
    }

    pub fn is_cloud_identity(&self) -> bool {
        self.cloud_identity
    }

    /// Grant an extra view
    pub fn enable_view(&mut self, view: impl Into<String>) {
        self.views.insert(view.into());
    }

    /// Revoke a view
    pub fn disable_view(&mut self, view: &str) -> bool {
        self.views.remove(view)
    }

    pub fn application(&self) -> Option<&[u8]> {
        self.application.as_deref()
    }

    /// Digest the account key signs to admit this peer
    pub fn application_digest(&self) -> [u8; 32] {
        sha256_multi(&[
            APPLICATION_DOMAIN,
            &(self.peer_id.len() as u32).to_be_bytes(),
            self.peer_id.as_bytes(),
            self.public_key.as_bytes(),
        ])
    }

    /// Check the application signature against the account key
    pub fn application_verify(&self, user_pubkey: &PublicKey) -> bool {
        match &self.application {
            Some(sig) => user_pubkey
                .verify(&self.application_digest(), sig)
                .is_ok(),
            None => false,
        }
    }

    /// Re-derive the peer id from the key and compare
    pub fn id_matches_key(&self) -> bool {
        self.public_key.key_id().as_str() == self.peer_id
    }
}

/// A peer record together with the device's own signing key
#[derive(Debug, Clone)]
pub struct FullPeerInfo {
    peer_info: PeerInfo,
    device_key: PrivateKey,
}

impl FullPeerInfo {
    pub fn new(device_key: PrivateKey, views: impl IntoIterator<Item = String>) -> Result<Self> {
        let public_key = device_key.public_key()?;
        Ok(Self {
            peer_info: PeerInfo::new(public_key, views),
            device_key,
        })
    }

    /// Sign this peer's application with the account key
    pub fn sign_application(&mut self, user_privkey: &PrivateKey) -> Result<()> {
        let digest = self.peer_info.application_digest();
        self.peer_info.application = Some(user_privkey.sign(&digest)?);
        Ok(())
    }

    pub fn peer_info(&self) -> &PeerInfo {
        &self.peer_info
    }

    pub fn peer_info_mut(&mut self) -> &mut PeerInfo {
        &mut self.peer_info
    }

    pub fn peer_id(&self) -> &str {
        self.peer_info.peer_id()
    }

    pub fn device_key(&self) -> &PrivateKey {
        &self.device_key
    }
}

/// Known peers, indexed by peer id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSet {
    peers: BTreeMap<String, PeerInfo>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a peer; returns the previous record for that id
    pub fn insert(&mut self, peer: PeerInfo) -> Option<PeerInfo> {
        self.peers.insert(peer.peer_id.clone(), peer)
    }

    pub fn remove(&mut self, peer_id: &str) -> Option<PeerInfo> {
        self.peers.remove(peer_id)
    }

    /// Look up a peer by id
    pub fn resolve(&self, peer_id: &str) -> Option<&PeerInfo> {
        self.peers.get(peer_id)
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerInfo> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl FromIterator<PeerInfo> for PeerSet {
    fn from_iter<I: IntoIterator<Item = PeerInfo>>(iter: I) -> Self {
        let mut set = PeerSet::new();
        for peer in iter {
            set.insert(peer);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> PrivateKey {
        PrivateKey::from_bytes(&[seed; 32]).unwrap()
    }

    #[test]
    fn test_peer_id_is_key_id() {
        let fpi = FullPeerInfo::new(key(1), vec!["ViewA".to_string()]).unwrap();
        let pk = key(1).public_key().unwrap();
        assert_eq!(fpi.peer_id(), pk.key_id().as_str());
        assert!(fpi.peer_info().id_matches_key());
    }

    #[test]
    fn test_application_verify() {
        let user = key(42);
        let other_user = key(43);
        let mut fpi = FullPeerInfo::new(key(1), Vec::new()).unwrap();
        let user_pub = user.public_key().unwrap();

        assert!(!fpi.peer_info().application_verify(&user_pub));

        fpi.sign_application(&user).unwrap();
        assert!(fpi.peer_info().application_verify(&user_pub));
        assert!(!fpi
            .peer_info()
            .application_verify(&other_user.public_key().unwrap()));
    }

    #[test]
    fn test_views() {
        let mut pi = PeerInfo::new(
            key(2).public_key().unwrap(),
            vec!["A".to_string(), "B".to_string()],
        );
        assert!(pi.is_permitted_for_view("A"));
        assert!(!pi.is_permitted_for_view("C"));

        let wanted: BTreeSet<String> = ["A".to_string(), "C".to_string()].into();
        assert!(!pi.is_permitted_for_all(&wanted));
        pi.enable_view("C");
        assert!(pi.is_permitted_for_all(&wanted));
        assert!(pi.disable_view("A"));
        assert!(!pi.is_permitted_for_all(&wanted));
    }

    #[test]
    fn test_peer_set_resolve() {
        let a = PeerInfo::new(key(3).public_key().unwrap(), Vec::new());
        let b = PeerInfo::new(key(4).public_key().unwrap(), Vec::new()).with_cloud_identity(true);
        let set: PeerSet = vec![a.clone(), b.clone()].into_iter().collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.resolve(a.peer_id()), Some(&a));
        assert!(set.resolve(b.peer_id()).unwrap().is_cloud_identity());
        assert!(set.resolve("nobody").is_none());
    }

    #[test]
    fn test_peer_info_json_roundtrip() {
        let mut fpi = FullPeerInfo::new(key(5), vec!["V".to_string()]).unwrap();
        fpi.sign_application(&key(6)).unwrap();
        let json = serde_json::to_string(fpi.peer_info()).unwrap();
        let back: PeerInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, fpi.peer_info());
    }
}
