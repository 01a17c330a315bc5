/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! "Inert" types that are sent around and inspected by the DBRB protocol, but have no active behavior.
//!
//! These types follow the newtype pattern and the API for using these types is defined in this module.

use std::{
    fmt::{self, Debug, Display, Formatter},
    time::Duration,
};

use borsh::{BorshDeserialize, BorshSerialize};
use ed25519_dalek::VerifyingKey;

use crate::logging::first_seven_base64_chars;

/// Identity of a process taking part in DBRB: the bytes of its Ed25519 public key.
///
/// Equality and ordering are byte-wise, which is also the order in which processes appear in a
/// [`View`](super::view::View).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct ProcessId([u8; 32]);

impl ProcessId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Interpret the process id as an Ed25519 public key.
    ///
    /// Fails if the bytes do not encode a point on the curve, which can only happen if the id did not
    /// come from a real keypair.
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, ed25519_dalek::SignatureError> {
        VerifyingKey::from_bytes(&self.0)
    }
}

impl From<VerifyingKey> for ProcessId {
    fn from(value: VerifyingKey) -> Self {
        ProcessId(value.to_bytes())
    }
}

impl From<&VerifyingKey> for ProcessId {
    fn from(value: &VerifyingKey) -> Self {
        ProcessId(value.to_bytes())
    }
}

impl Display for ProcessId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", first_seven_base64_chars(&self.0))
    }
}

impl Debug for ProcessId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessId({})", first_seven_base64_chars(&self.0))
    }
}

/// The hash of a payload. Given a [payload](Payload) the hash is obtained
/// [like this](crate::types::crypto_primitives::payload_hash).
///
/// This is the only key used to identify a broadcast round across processes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl Display for PayloadHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", first_seven_base64_chars(&self.0))
    }
}

impl Debug for PayloadHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PayloadHash({})", first_seven_base64_chars(&self.0))
    }
}

/// Signature represented in bytes.
#[derive(Clone, Copy, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct SignatureBytes([u8; 64]);

impl SignatureBytes {
    pub const fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 64] {
        self.0
    }
}

impl Debug for SignatureBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBytes({})", first_seven_base64_chars(&self.0))
    }
}

/// Opaque bytes broadcast through DBRB. The engine never looks inside a payload; hosts may plug in a
/// [validation callback](crate::replica::ReplicaSpec) to reject payloads they cannot use.
#[derive(Clone, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> &Vec<u8> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload(value)
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({} bytes)", self.0.len())
    }
}

/// Milliseconds since the Unix Epoch.
///
/// Used to ask the [view supplier](crate::view_supplier::ViewSupplier) which view is valid at a given
/// moment, and to express registration expiration times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn new(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn millis(&self) -> u64 {
        self.0
    }

    /// Subtract `duration` from this timestamp, returning `None` if the result would precede the Unix Epoch.
    pub fn checked_sub(&self, duration: Duration) -> Option<Timestamp> {
        self.0.checked_sub(duration.as_millis() as u64).map(Timestamp)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
