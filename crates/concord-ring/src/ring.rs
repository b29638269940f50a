//! Ring data model
//!
//! A ring is four sections:
//! ```text
//! unsigned info   applicants, rejections, last modifier   (not signed)
//! signed info     name, type, version, identifier,
//!                 generation, peer ids, payload,
//!                 backup views                            (hashed and signed)
//! signatures      key id -> signature over signed info
//! data            reserved extension dictionary
//! ```
//!
//! Mutators here never sign. Generation and signatures only change through
//! [`crate::signing`], so several edits can be batched under one signature.

use std::collections::{BTreeMap, BTreeSet};

use concord_core::{DerValue, Generation, KeyId};
use uuid::Uuid;

use crate::error::{Result, RingError};
use crate::types::{RingKindTag, RingStatus};
use crate::RING_VERSION;

/// Section not covered by signatures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UnsignedInfo {
    pub(crate) applicants: BTreeSet<String>,
    pub(crate) rejections: BTreeSet<String>,
    pub(crate) last_modifier: Option<String>,
    /// Unrecognized entries, kept for re-encoding
    pub(crate) extensions: BTreeMap<String, DerValue>,
}

/// Section covered by signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedInfo {
    pub(crate) name: String,
    pub(crate) kind: RingKindTag,
    pub(crate) version: i64,
    pub(crate) identifier: String,
    pub(crate) generation: Generation,
    pub(crate) peer_ids: BTreeSet<String>,
    pub(crate) payload: Option<Vec<u8>>,
    pub(crate) backup_view_set: Option<BTreeSet<String>>,
    /// Unrecognized entries; they are part of the signed hash
    pub(crate) extensions: BTreeMap<String, DerValue>,
}

/// Peer-signed, generation-counted consensus ring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    pub(crate) unsigned: UnsignedInfo,
    pub(crate) signed: SignedInfo,
    pub(crate) signatures: BTreeMap<KeyId, Vec<u8>>,
    pub(crate) data: BTreeMap<String, DerValue>,
}

impl Ring {
    /// Empty ring of `kind` with a fresh identifier and a zero generation
    pub(crate) fn blank(name: &str, kind: RingKindTag) -> Result<Self> {
        if name.is_empty() {
            return Err(RingError::NoName);
        }
        Ok(Self {
            unsigned: UnsignedInfo::default(),
            signed: SignedInfo {
                name: name.to_string(),
                kind,
                version: RING_VERSION,
                identifier: Uuid::new_v4().to_string().to_uppercase(),
                generation: Generation::new(),
                peer_ids: BTreeSet::new(),
                payload: Some(Vec::new()),
                backup_view_set: None,
                extensions: BTreeMap::new(),
            },
            signatures: BTreeMap::new(),
            data: BTreeMap::new(),
        })
    }

    // ---- identity -------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.signed.name
    }

    pub fn kind(&self) -> RingKindTag {
        self.signed.kind
    }

    pub fn version(&self) -> i64 {
        self.signed.version
    }

    pub fn identifier(&self) -> &str {
        &self.signed.identifier
    }

    pub fn generation(&self) -> Generation {
        self.signed.generation
    }

    /// Same name, kind and identifier; version may differ across upgrades
    pub fn is_same_ring(&self, other: &Ring) -> bool {
        self.signed.name == other.signed.name
            && self.signed.kind == other.signed.kind
            && self.signed.identifier == other.signed.identifier
    }

    /// True if this ring's generation strictly precedes `other`'s
    pub fn is_older_generation(&self, other: &Ring) -> bool {
        self.signed.generation.is_older_than(&other.signed.generation)
    }

    pub fn last_modifier(&self) -> Option<&str> {
        self.unsigned.last_modifier.as_deref()
    }

    pub fn set_last_modifier(&mut self, peer_id: &str) {
        self.unsigned.last_modifier = Some(peer_id.to_string());
    }

    // ---- membership -----------------------------------------------------

    pub fn peer_ids(&self) -> &BTreeSet<String> {
        &self.signed.peer_ids
    }

    pub fn copy_peer_ids(&self) -> BTreeSet<String> {
        self.signed.peer_ids.clone()
    }

    pub fn has_peer_id(&self, peer_id: &str) -> bool {
        self.signed.peer_ids.contains(peer_id)
    }

    pub fn count_peers(&self) -> usize {
        self.signed.peer_ids.len()
    }

    /// Add a member; fails if the id is an applicant or rejected
    pub fn add_peer_id(&mut self, peer_id: &str) -> Result<bool> {
        self.check_exclusive(peer_id, RingStatus::Member)?;
        Ok(self.signed.peer_ids.insert(peer_id.to_string()))
    }

    pub fn remove_peer_id(&mut self, peer_id: &str) -> bool {
        self.signed.peer_ids.remove(peer_id)
    }

    pub fn peer_ids_match(&self, other: &Ring) -> bool {
        self.signed.peer_ids == other.signed.peer_ids
    }

    /// No members
    pub fn is_empty(&self) -> bool {
        self.signed.peer_ids.is_empty()
    }

    /// Exactly one member: its creator
    pub fn is_offering(&self) -> bool {
        self.signed.peer_ids.len() == 1
    }

    pub fn applicants(&self) -> &BTreeSet<String> {
        &self.unsigned.applicants
    }

    pub fn copy_applicants(&self) -> BTreeSet<String> {
        self.unsigned.applicants.clone()
    }

    pub fn has_applicant(&self, peer_id: &str) -> bool {
        self.unsigned.applicants.contains(peer_id)
    }

    pub fn count_applicants(&self) -> usize {
        self.unsigned.applicants.len()
    }

    /// Add an applicant; fails if the id is a member or rejected
    pub fn add_applicant(&mut self, peer_id: &str) -> Result<bool> {
        self.check_exclusive(peer_id, RingStatus::Applicant)?;
        Ok(self.unsigned.applicants.insert(peer_id.to_string()))
    }

    pub fn remove_applicant(&mut self, peer_id: &str) -> bool {
        self.unsigned.applicants.remove(peer_id)
    }

    pub fn rejections(&self) -> &BTreeSet<String> {
        &self.unsigned.rejections
    }

    pub fn copy_rejections(&self) -> BTreeSet<String> {
        self.unsigned.rejections.clone()
    }

    pub fn has_rejection(&self, peer_id: &str) -> bool {
        self.unsigned.rejections.contains(peer_id)
    }

    pub fn count_rejections(&self) -> usize {
        self.unsigned.rejections.len()
    }

    /// Add a rejection; fails if the id is a member or an applicant
    pub fn add_rejection(&mut self, peer_id: &str) -> Result<bool> {
        self.check_exclusive(peer_id, RingStatus::Rejected)?;
        Ok(self.unsigned.rejections.insert(peer_id.to_string()))
    }

    pub fn remove_rejection(&mut self, peer_id: &str) -> bool {
        self.unsigned.rejections.remove(peer_id)
    }

    /// Which of the three sets holds `peer_id`
    pub fn status_of(&self, peer_id: &str) -> RingStatus {
        if self.signed.peer_ids.contains(peer_id) {
            RingStatus::Member
        } else if self.unsigned.applicants.contains(peer_id) {
            RingStatus::Applicant
        } else if self.unsigned.rejections.contains(peer_id) {
            RingStatus::Rejected
        } else {
            RingStatus::NotInRing
        }
    }

    fn check_exclusive(&self, peer_id: &str, target: RingStatus) -> Result<()> {
        match self.status_of(peer_id) {
            RingStatus::NotInRing => Ok(()),
            current if current == target => Ok(()),
            current => Err(RingError::Replay(format!(
                "{} is already {:?}, cannot also be {:?}",
                peer_id, current, target
            ))),
        }
    }

    /// Drop every member, applicant and rejection
    pub(crate) fn clear_membership(&mut self) {
        self.signed.peer_ids.clear();
        self.unsigned.applicants.clear();
        self.unsigned.rejections.clear();
    }

    // ---- payload --------------------------------------------------------

    pub fn payload(&self) -> Option<&[u8]> {
        self.signed.payload.as_deref()
    }

    /// Store a payload without signing
    pub fn put_payload(&mut self, payload: Vec<u8>) {
        self.signed.payload = Some(payload);
    }

    pub fn clear_payload(&mut self) {
        self.signed.payload = None;
    }

    // ---- backup views ---------------------------------------------------

    pub fn backup_view_set(&self) -> Option<&BTreeSet<String>> {
        self.signed.backup_view_set.as_ref()
    }

    /// Views a backup ring covers; empty for other kinds
    pub fn backup_views(&self) -> BTreeSet<String> {
        self.signed.backup_view_set.clone().unwrap_or_default()
    }

    /// Replace the covered views; only backup rings carry a view set
    ///
    /// Current members are not re-checked here. `apply` and
    /// `reset_to_offering` enforce view permission for peers they add, and
    /// concordance evaluation rejects a ring whose members fall outside
    /// its views with `InvalidMembership`.
    pub fn set_backup_view_set(&mut self, views: impl IntoIterator<Item = String>) -> Result<()> {
        if self.signed.kind != RingKindTag::Backup {
            return Err(RingError::UnexpectedType {
                expected: RingKindTag::Backup,
                found: self.signed.kind,
            });
        }
        self.signed.backup_view_set = Some(views.into_iter().collect());
        Ok(())
    }

    // ---- signatures and data -------------------------------------------

    pub fn signatures(&self) -> &BTreeMap<KeyId, Vec<u8>> {
        &self.signatures
    }

    pub fn signature_for(&self, key_id: &KeyId) -> Option<&[u8]> {
        self.signatures.get(key_id).map(Vec::as_slice)
    }

    /// Key ids that have signed this state
    pub fn signer_key_ids(&self) -> impl Iterator<Item = &KeyId> {
        self.signatures.keys()
    }

    /// Merge a signature gathered elsewhere; it is only trusted once verified
    pub fn add_signature(&mut self, key_id: KeyId, signature: Vec<u8>) {
        self.signatures.insert(key_id, signature);
    }

    pub fn data(&self) -> &BTreeMap<String, DerValue> {
        &self.data
    }

    /// One-line summary for logs
    pub fn describe(&self) -> String {
        let members: Vec<&str> = self.signed.peer_ids.iter().map(|p| short_id(p)).collect();
        let signers: Vec<&str> = self.signatures.keys().map(|k| k.short()).collect();
        format!(
            "Ring {} ({}) gen {} members [{}] signers [{}]",
            self.signed.name,
            self.signed.kind,
            self.signed.generation,
            members.join(", "),
            signers.join(", ")
        )
    }
}

fn short_id(id: &str) -> &str {
    let end = id.char_indices().nth(8).map(|(i, _)| i).unwrap_or(id.len());
    &id[..end]
}
