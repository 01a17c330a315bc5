/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Cryptographic primitives.
//!
//! The definitions and re-exports in this module provide two categories of cryptographic primitives:
//! 1. **Cryptographic Hashes**: provided by the [`sha2`] crate.
//! 2. **Digital Signatures**: provided by the [`ed25519_dalek`] crate.
//!
//! ## Signing input
//!
//! An Acknowledged signature attests a `(payload, view)` pair. The bytes that get signed are the 32-byte
//! [`signing_hash`]: `SHA-256(payload bytes || borsh(view))`. Since the Borsh encoding of a
//! [`View`] is canonical, every honest process computes the same signing input for the same payload and
//! logical view.

use borsh::BorshSerialize;

use super::{
    basic::{Payload, PayloadHash, ProcessId, SignatureBytes},
    view::View,
};

// re-exports below.
pub use sha2::Digest;
pub use sha2::Sha256 as CryptoHasher;

pub use ed25519_dalek::{Signature, SignatureError, Signer, SigningKey, Verifier, VerifyingKey};

/// A facade around [`SigningKey`] that implements method for [`sign`](Self::sign)-ing messages as well
/// as a getter for the [`id`](Self::id) of the process that owns the signing key.
#[derive(Clone)]
pub struct Keypair(SigningKey);

impl Keypair {
    /// Create a `Keypair` that wraps over `signing_key`.
    pub fn new(signing_key: SigningKey) -> Keypair {
        Keypair(signing_key)
    }

    /// Sign an arbitrary `message` with the `Keypair`.
    pub fn sign(&self, message: &[u8]) -> SignatureBytes {
        SignatureBytes::new(self.0.sign(message).to_bytes())
    }

    /// Sign the `(payload, view)` pair, as done when acknowledging a Prepare message.
    pub fn sign_payload(&self, payload: &Payload, view: &View) -> SignatureBytes {
        self.sign(&signing_hash(payload, view))
    }

    /// Get the `VerifyingKey` of this `Keypair`.
    pub fn public(&self) -> VerifyingKey {
        self.0.verifying_key()
    }

    /// Get the process id derived from the `VerifyingKey` of this `Keypair`.
    pub fn id(&self) -> ProcessId {
        ProcessId::from(self.0.verifying_key())
    }
}

/// Compute the [`PayloadHash`] of `payload`.
pub fn payload_hash(payload: &Payload) -> PayloadHash {
    let mut hasher = CryptoHasher::new();
    hasher.update(payload.bytes());
    PayloadHash::new(hasher.finalize().into())
}

/// Compute the hash that processes sign to acknowledge `payload` under `view`.
pub fn signing_hash(payload: &Payload, view: &View) -> [u8; 32] {
    let mut hasher = CryptoHasher::new();
    hasher.update(payload.bytes());
    // Serializing a BTreeSet of fixed-size arrays into a Vec cannot fail.
    hasher.update(view.try_to_vec().unwrap());
    hasher.finalize().into()
}

/// Check whether `signature` is a valid signature by `signer` over `message`.
///
/// Returns `false` if `signer` is not a valid Ed25519 public key.
pub fn verify(signer: &ProcessId, message: &[u8], signature: &SignatureBytes) -> bool {
    match signer.to_verifying_key() {
        Ok(verifying_key) => verifying_key
            .verify(message, &Signature::from_bytes(&signature.bytes()))
            .is_ok(),
        Err(_) => false,
    }
}

/// Check whether `signature` is a valid acknowledgement of `(payload, view)` by `signer`.
pub fn verify_payload_signature(
    signer: &ProcessId,
    payload: &Payload,
    view: &View,
    signature: &SignatureBytes,
) -> bool {
    verify(signer, &signing_hash(payload, view), signature)
}
