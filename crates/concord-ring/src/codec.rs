//! Ring wire format
//!
//! ```text
//! Ring ::= SEQUENCE {
//!     unSignedInformation   Dictionary,   -- Applicants, Rejections, LastModifier
//!     signedInformation     Dictionary,   -- RingName, RingType, RingVersion, Identifier,
//!                                         -- Generation, PeerIDs, Payload, BackupViews?
//!     signatures            Dictionary,   -- key id -> signature
//!     data                  Dictionary    -- reserved
//! }
//! ```
//!
//! Entries with unknown keys in either info dictionary are carried through
//! untouched so a newer peer's signatures still verify after re-encoding.

use std::collections::{BTreeMap, BTreeSet};

use concord_core::der::{decode_exact, DerValue};
use concord_core::{Generation, KeyId};

use crate::error::{Result, RingError};
use crate::ring::{Ring, SignedInfo, UnsignedInfo};
use crate::types::RingKindTag;

pub const KEY_APPLICANTS: &str = "Applicants";
pub const KEY_REJECTIONS: &str = "Rejections";
pub const KEY_LAST_MODIFIER: &str = "LastModifier";
pub const KEY_NAME: &str = "RingName";
pub const KEY_TYPE: &str = "RingType";
pub const KEY_VERSION: &str = "RingVersion";
pub const KEY_IDENTIFIER: &str = "Identifier";
pub const KEY_GENERATION: &str = "Generation";
pub const KEY_PEER_IDS: &str = "PeerIDs";
pub const KEY_PAYLOAD: &str = "Payload";
pub const KEY_BACKUP_VIEWS: &str = "BackupViews";

impl UnsignedInfo {
    fn to_der(&self) -> DerValue {
        let mut map = self.extensions.clone();
        map.insert(
            KEY_APPLICANTS.to_string(),
            DerValue::StringSet(self.applicants.clone()),
        );
        map.insert(
            KEY_REJECTIONS.to_string(),
            DerValue::StringSet(self.rejections.clone()),
        );
        if let Some(modifier) = &self.last_modifier {
            map.insert(
                KEY_LAST_MODIFIER.to_string(),
                DerValue::String(modifier.clone()),
            );
        }
        DerValue::Dictionary(map)
    }

    fn from_der(mut map: BTreeMap<String, DerValue>) -> Result<Self> {
        let applicants = take_string_set(&mut map, KEY_APPLICANTS)?.unwrap_or_default();
        let rejections = take_string_set(&mut map, KEY_REJECTIONS)?.unwrap_or_default();
        let last_modifier = take_string(&mut map, KEY_LAST_MODIFIER)?;
        Ok(Self {
            applicants,
            rejections,
            last_modifier,
            extensions: map,
        })
    }
}

impl SignedInfo {
    pub(crate) fn to_der(&self) -> DerValue {
        let mut map = self.extensions.clone();
        map.insert(KEY_NAME.to_string(), DerValue::String(self.name.clone()));
        map.insert(
            KEY_TYPE.to_string(),
            DerValue::Integer(self.kind.as_u32() as i64),
        );
        map.insert(KEY_VERSION.to_string(), DerValue::Integer(self.version));
        map.insert(
            KEY_IDENTIFIER.to_string(),
            DerValue::String(self.identifier.clone()),
        );
        map.insert(
            KEY_GENERATION.to_string(),
            DerValue::Integer(self.generation.value()),
        );
        map.insert(
            KEY_PEER_IDS.to_string(),
            DerValue::StringSet(self.peer_ids.clone()),
        );
        if let Some(payload) = &self.payload {
            map.insert(KEY_PAYLOAD.to_string(), DerValue::Bytes(payload.clone()));
        }
        if let Some(views) = &self.backup_view_set {
            map.insert(
                KEY_BACKUP_VIEWS.to_string(),
                DerValue::StringSet(views.clone()),
            );
        }
        DerValue::Dictionary(map)
    }

    fn from_der(mut map: BTreeMap<String, DerValue>) -> Result<Self> {
        let name = take_string(&mut map, KEY_NAME)?
            .filter(|n| !n.is_empty())
            .ok_or_else(|| missing(KEY_NAME))?;

        let raw_kind = take_integer(&mut map, KEY_TYPE)?.ok_or_else(|| missing(KEY_TYPE))?;
        let kind = u32::try_from(raw_kind)
            .ok()
            .and_then(RingKindTag::from_u32)
            .ok_or_else(|| RingError::Decode(format!("unknown ring type {}", raw_kind)))?;

        let version = take_integer(&mut map, KEY_VERSION)?.ok_or_else(|| missing(KEY_VERSION))?;

        let identifier = take_string(&mut map, KEY_IDENTIFIER)?
            .filter(|i| !i.is_empty())
            .ok_or_else(|| missing(KEY_IDENTIFIER))?;

        let generation = take_integer(&mut map, KEY_GENERATION)?
            .ok_or_else(|| missing(KEY_GENERATION))
            .and_then(|g| {
                Generation::from_value(g).map_err(|e| RingError::Decode(e.to_string()))
            })?;

        let peer_ids = take_string_set(&mut map, KEY_PEER_IDS)?.unwrap_or_default();

        let payload = match map.remove(KEY_PAYLOAD) {
            None => None,
            Some(DerValue::Bytes(b)) => Some(b),
            Some(other) => return Err(wrong_type(KEY_PAYLOAD, &other)),
        };

        let backup_view_set = take_string_set(&mut map, KEY_BACKUP_VIEWS)?;

        Ok(Self {
            name,
            kind,
            version,
            identifier,
            generation,
            peer_ids,
            payload,
            backup_view_set,
            extensions: map,
        })
    }
}

fn missing(key: &str) -> RingError {
    RingError::Decode(format!("missing {}", key))
}

fn wrong_type(key: &str, value: &DerValue) -> RingError {
    RingError::Decode(format!("{} is a {}", key, value.type_name()))
}

fn take_string(map: &mut BTreeMap<String, DerValue>, key: &str) -> Result<Option<String>> {
    match map.remove(key) {
        None => Ok(None),
        Some(DerValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(wrong_type(key, &other)),
    }
}

fn take_integer(map: &mut BTreeMap<String, DerValue>, key: &str) -> Result<Option<i64>> {
    match map.remove(key) {
        None => Ok(None),
        Some(DerValue::Integer(v)) => Ok(Some(v)),
        Some(other) => Err(wrong_type(key, &other)),
    }
}

fn take_string_set(
    map: &mut BTreeMap<String, DerValue>,
    key: &str,
) -> Result<Option<BTreeSet<String>>> {
    match map.remove(key) {
        None => Ok(None),
        Some(DerValue::StringSet(s)) => Ok(Some(s)),
        Some(other) => Err(wrong_type(key, &other)),
    }
}

fn into_dictionary(value: DerValue, section: &str) -> Result<BTreeMap<String, DerValue>> {
    match value {
        DerValue::Dictionary(map) => Ok(map),
        other => Err(RingError::Decode(format!(
            "{} section is a {}",
            section,
            other.type_name()
        ))),
    }
}

impl Ring {
    /// Serialize all four sections
    ///
    /// A ring must be complete to travel: name, identifier and payload must
    /// be present.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.signed.name.is_empty() {
            return Err(RingError::Encode("ring has no name".to_string()));
        }
        if self.signed.identifier.is_empty() {
            return Err(RingError::Encode("ring has no identifier".to_string()));
        }
        if self.signed.payload.is_none() {
            return Err(RingError::Encode("ring has no payload".to_string()));
        }

        let signatures = self
            .signatures
            .iter()
            .map(|(id, sig)| (id.as_str().to_string(), DerValue::Bytes(sig.clone())))
            .collect();

        Ok(DerValue::Sequence(vec![
            self.unsigned.to_der(),
            self.signed.to_der(),
            DerValue::Dictionary(signatures),
            DerValue::Dictionary(self.data.clone()),
        ])
        .encode())
    }

    /// Parse a ring; trailing bytes after the fourth section are rejected
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value = decode_exact(bytes).map_err(|e| RingError::Decode(e.to_string()))?;
        let sections = match value {
            DerValue::Sequence(items) => items,
            other => {
                return Err(RingError::Decode(format!(
                    "ring is a {}",
                    other.type_name()
                )))
            }
        };
        let [unsigned, signed, signatures, data] = <[DerValue; 4]>::try_from(sections)
            .map_err(|s| RingError::Decode(format!("ring has {} sections, expected 4", s.len())))?;

        let unsigned = UnsignedInfo::from_der(into_dictionary(unsigned, "unsigned")?)?;
        let signed = SignedInfo::from_der(into_dictionary(signed, "signed")?)?;

        let signatures = into_dictionary(signatures, "signatures")?
            .into_iter()
            .map(|(id, sig)| match sig {
                DerValue::Bytes(b) => Ok((KeyId::new(id), b)),
                other => Err(wrong_type(&id, &other)),
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let data = into_dictionary(data, "data")?;

        let ring = Self {
            unsigned,
            signed,
            signatures,
            data,
        };
        ring.check_membership_disjoint()?;
        Ok(ring)
    }

    fn check_membership_disjoint(&self) -> Result<()> {
        let peers = &self.signed.peer_ids;
        let applicants = &self.unsigned.applicants;
        let rejections = &self.unsigned.rejections;
        let overlap = peers
            .intersection(applicants)
            .chain(peers.intersection(rejections))
            .chain(applicants.intersection(rejections))
            .next();
        match overlap {
            Some(id) => Err(RingError::Decode(format!(
                "{} appears in more than one membership set",
                id
            ))),
            None => Ok(()),
        }
    }
}
