//! Cryptographic primitives for Concord
//!
//! Rings are signed with secp256k1 ECDSA over SHA-256. Everything above this
//! module only sees [`PrivateKey::sign`], [`PublicKey::verify`] and
//! [`PublicKey::key_id`].

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use k256::{
    ecdsa::{
        signature::{Signer, Verifier},
        Signature as K256Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::types::{hex_bytes_33, KeyId};

/// Size of a raw r || s signature
pub const SIGNATURE_SIZE: usize = 64;

/// Compressed public key (33 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "hex_bytes_33")] pub [u8; 33]);

impl PublicKey {
    /// Create a new PublicKey from compressed bytes
    pub fn new(bytes: [u8; 33]) -> Self {
        Self(bytes)
    }

    /// Parse any SEC1 encoding (compressed or not) into the compressed form
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        let verifying_key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| Error::InvalidPublicKey(e.to_string()))?;
        Self::from_verifying_key(&verifying_key)
    }

    fn from_verifying_key(key: &VerifyingKey) -> Result<Self> {
        let encoded = key.as_affine().to_encoded_point(true);
        let bytes: [u8; 33] = encoded
            .as_bytes()
            .try_into()
            .map_err(|_| Error::Crypto("Failed to encode public key".to_string()))?;
        Ok(Self(bytes))
    }

    /// Get the compressed bytes
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 33];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| Error::Crypto(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Derive the key identifier used to index signatures and peers
    pub fn key_id(&self) -> KeyId {
        KeyId::new(STANDARD.encode(sha256(&self.0)))
    }

    /// Verify a signature over `message` (hashed with SHA-256 internally)
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let verifying_key = VerifyingKey::from_sec1_bytes(&self.0)
            .map_err(|e| Error::InvalidPublicKey(e.to_string()))?;

        let sig = K256Signature::from_slice(signature)
            .map_err(|e| Error::Crypto(format!("Invalid signature format: {}", e)))?;

        verifying_key
            .verify(message, &sig)
            .map_err(|_| Error::SignatureVerificationFailed)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Device or account signing key
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Generate a fresh random key
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(SigningKey::random(rng))
    }

    /// Load a key from its 32-byte scalar
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key = SigningKey::from_slice(bytes)
            .map_err(|e| Error::Crypto(format!("Invalid private key: {}", e)))?;
        Ok(Self(key))
    }

    /// Export the 32-byte scalar; the buffer is wiped when dropped
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.0.to_bytes().into())
    }

    /// Public half of this key
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_verifying_key(self.0.verifying_key())
    }

    /// Sign `message` (hashed with SHA-256 internally), returning r || s
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let sig: K256Signature = self
            .0
            .try_sign(message)
            .map_err(|e| Error::Crypto(format!("Signing failed: {}", e)))?;
        Ok(sig.to_bytes().to_vec())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// Hash data using SHA256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple pieces of data using SHA256
pub fn sha256_multi(data: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for d in data {
        hasher.update(d);
    }
    hasher.finalize().into()
}
