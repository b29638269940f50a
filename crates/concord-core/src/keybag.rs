//! Key bags carried as ring payloads
//!
//! Backup rings carry a [`BackupSliceKeyBag`], recovery rings a
//! [`RecoveryKeyBag`]. Both are DER SEQUENCEs built from
//! [`DerValue`](crate::der::DerValue):
//! ```text
//! BackupSliceKeyBag ::= SEQUENCE {
//!     aksBag        OCTET STRING,
//!     wrappedKeys   Dictionary      -- peer id -> wrapped backup key
//! }
//!
//! RecoveryKeyBag ::= SEQUENCE {
//!     accountDSID   UTF8String,
//!     generation    INTEGER,
//!     version       INTEGER,
//!     recoveryKey   OCTET STRING
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::der::{decode_exact, DerValue};
use crate::error::{Error, Result};
use crate::generation::Generation;
use crate::RECOVERY_KEY_BAG_VERSION;

/// Per-view backup slice: a keybag plus its key wrapped for each member peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSliceKeyBag {
    aks_bag: Vec<u8>,
    wrapped_keys: BTreeMap<String, Vec<u8>>,
}

impl BackupSliceKeyBag {
    pub fn new(aks_bag: Vec<u8>, wrapped_keys: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            aks_bag,
            wrapped_keys,
        }
    }

    pub fn aks_bag(&self) -> &[u8] {
        &self.aks_bag
    }

    pub fn wrapped_key_for(&self, peer_id: &str) -> Option<&[u8]> {
        self.wrapped_keys.get(peer_id).map(Vec::as_slice)
    }

    /// Peers this slice is wrapped to
    pub fn peer_ids(&self) -> BTreeSet<String> {
        self.wrapped_keys.keys().cloned().collect()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.aks_bag.is_empty() {
            return Err(Error::IncompleteKeyBag("aks bag"));
        }
        let wrapped = self
            .wrapped_keys
            .iter()
            .map(|(peer, key)| (peer.clone(), DerValue::Bytes(key.clone())))
            .collect();
        Ok(DerValue::Sequence(vec![
            DerValue::Bytes(self.aks_bag.clone()),
            DerValue::Dictionary(wrapped),
        ])
        .encode())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let items = match decode_exact(bytes)? {
            DerValue::Sequence(items) => items,
            other => {
                return Err(Error::Decode(format!(
                    "backup slice key bag is a {}",
                    other.type_name()
                )))
            }
        };
        let [aks_bag, wrapped] = <[DerValue; 2]>::try_from(items).map_err(|items| {
            Error::Decode(format!(
                "backup slice key bag has {} elements",
                items.len()
            ))
        })?;

        let aks_bag = match aks_bag {
            DerValue::Bytes(b) if !b.is_empty() => b,
            _ => return Err(Error::IncompleteKeyBag("aks bag")),
        };
        let wrapped_keys = match wrapped {
            DerValue::Dictionary(map) => map
                .into_iter()
                .map(|(peer, value)| match value {
                    DerValue::Bytes(key) => Ok((peer, key)),
                    other => Err(Error::Decode(format!(
                        "wrapped key for {} is a {}",
                        peer,
                        other.type_name()
                    ))),
                })
                .collect::<Result<BTreeMap<_, _>>>()?,
            other => {
                return Err(Error::Decode(format!(
                    "wrapped keys is a {}",
                    other.type_name()
                )))
            }
        };

        Ok(Self {
            aks_bag,
            wrapped_keys,
        })
    }
}

/// Recovery key registration for an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryKeyBag {
    account_dsid: String,
    generation: Generation,
    version: i64,
    recovery_key: Vec<u8>,
}

impl RecoveryKeyBag {
    pub fn new(account_dsid: impl Into<String>, recovery_key: Vec<u8>) -> Self {
        Self {
            account_dsid: account_dsid.into(),
            generation: Generation::new(),
            version: RECOVERY_KEY_BAG_VERSION,
            recovery_key,
        }
    }

    /// Replace the key, moving the bag's generation forward
    pub fn rotate(&mut self, recovery_key: Vec<u8>) -> Result<()> {
        self.generation = self.generation.incremented()?;
        self.recovery_key = recovery_key;
        Ok(())
    }

    pub fn account_dsid(&self) -> &str {
        &self.account_dsid
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn recovery_key(&self) -> &[u8] {
        &self.recovery_key
    }

    /// Encode; every field must be present
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.account_dsid.is_empty() {
            return Err(Error::IncompleteKeyBag("account dsid"));
        }
        if self.recovery_key.is_empty() {
            return Err(Error::IncompleteKeyBag("recovery key"));
        }
        Ok(DerValue::Sequence(vec![
            DerValue::String(self.account_dsid.clone()),
            DerValue::Integer(self.generation.value()),
            DerValue::Integer(self.version),
            DerValue::Bytes(self.recovery_key.clone()),
        ])
        .encode())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let items = match decode_exact(bytes)? {
            DerValue::Sequence(items) => items,
            other => {
                return Err(Error::Decode(format!(
                    "recovery key bag is a {}",
                    other.type_name()
                )))
            }
        };
        let [dsid, generation, version, key] =
            <[DerValue; 4]>::try_from(items).map_err(|items| {
                Error::Decode(format!("recovery key bag has {} elements", items.len()))
            })?;

        let account_dsid = match dsid {
            DerValue::String(s) if !s.is_empty() => s,
            _ => return Err(Error::IncompleteKeyBag("account dsid")),
        };
        let generation = generation
            .as_integer()
            .ok_or_else(|| Error::Decode("recovery key bag generation".to_string()))
            .and_then(Generation::from_value)?;
        let version = version
            .as_integer()
            .ok_or_else(|| Error::Decode("recovery key bag version".to_string()))?;
        let recovery_key = match key {
            DerValue::Bytes(b) if !b.is_empty() => b,
            _ => return Err(Error::IncompleteKeyBag("recovery key")),
        };

        Ok(Self {
            account_dsid,
            generation,
            version,
            recovery_key,
        })
    }
}
