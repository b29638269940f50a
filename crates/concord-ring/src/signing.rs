//! Ring signing engine
//!
//! Signatures cover the SHA-256 of the canonical DER encoding of the signed
//! section. Signature map entries are keyed by the signer's [`KeyId`].
//!
//! [`KeyId`]: concord_core::KeyId

use concord_core::{sha256, Generation, PeerInfo, PrivateKey, PublicKey};
use tracing::debug;

use crate::error::{Result, RingError};
use crate::ring::Ring;

/// Digest every signature on `ring` covers
pub fn signed_info_hash(ring: &Ring) -> [u8; 32] {
    sha256(&ring.signed.to_der().encode())
}

/// Start a new generation signed only by `device_key`
///
/// Sets the last modifier, increments the generation and drops every prior
/// signature before signing.
pub fn generation_sign(
    ring: &mut Ring,
    device_key: Option<&PrivateKey>,
    requestor_peer_id: &str,
) -> Result<()> {
    let device_key =
        device_key.ok_or_else(|| RingError::BadSignature("no device key to sign with".into()))?;
    let key_id = device_key.public_key()?.key_id();
    let next = ring.signed.generation.incremented()?;

    ring.set_last_modifier(requestor_peer_id);
    ring.signed.generation = next;
    ring.signatures.clear();

    let signature = device_key.sign(&signed_info_hash(ring))?;
    debug!(
        "Generation {} of {} signed by {}",
        next,
        ring.name(),
        key_id.short()
    );
    ring.signatures.insert(key_id, signature);
    Ok(())
}

/// Add or replace one signature over the current state
pub fn concordance_sign(ring: &mut Ring, key: &PrivateKey) -> Result<()> {
    let key_id = key.public_key()?.key_id();
    let signature = key.sign(&signed_info_hash(ring))?;
    debug!(
        "Concordance signature on {} gen {} by {}",
        ring.name(),
        ring.generation(),
        key_id.short()
    );
    ring.signatures.insert(key_id, signature);
    Ok(())
}

/// True if `pubkey` has a signature entry, valid or not
pub fn verify_signature_exists(ring: &Ring, pubkey: &PublicKey) -> bool {
    ring.signatures.contains_key(&pubkey.key_id())
}

/// True if `pubkey` has an entry and it verifies against the current state
pub fn verify(ring: &Ring, pubkey: &PublicKey) -> bool {
    match ring.signatures.get(&pubkey.key_id()) {
        Some(signature) => pubkey.verify(&signed_info_hash(ring), signature).is_ok(),
        None => false,
    }
}

pub fn verify_peer_signed(ring: &Ring, peer: &PeerInfo) -> bool {
    verify(ring, &peer.copy_public_key())
}

/// Move to a generation strictly newer than the current one and drop all
/// signatures, without signing
pub(crate) fn restart_generation(ring: &mut Ring) -> Result<()> {
    ring.signed.generation = Generation::with_baseline(&ring.signed.generation)?;
    ring.signatures.clear();
    Ok(())
}
