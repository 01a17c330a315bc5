/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Messages exchanged by processes running DBRB.
//!
//! A broadcast round for a payload goes through four kinds of messages, in this causal order:
//! 1. [`Prepare`]: proposes a payload for broadcast under a view.
//! 2. [`Acknowledged`]: attests that the sender validated and signed `(payload, view)`.
//! 3. [`Commit`]: carries a [`Certificate`] formed from a quorum of Acknowledged signatures.
//! 4. [`Deliver`]: attests that the sender has committed and is ready to deliver.
//!
//! ## Wire format
//!
//! Messages are serialized with Borsh. The encoding of a [`Message`] is a one byte variant tag, the
//! sender's [`ProcessId`], then the phase-specific fields. Views are serialized as a count-prefixed
//! sequence of process ids, and certificates as a count-prefixed sequence of `(ProcessId, SignatureBytes)`
//! pairs.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    error::DbrbError,
    types::{
        basic::{Payload, PayloadHash, ProcessId, SignatureBytes},
        certificate::Certificate,
        view::View,
    },
};

/// All message variants used in DBRB-rs.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Message {
    Prepare(Prepare),
    Acknowledged(Acknowledged),
    Commit(Commit),
    Deliver(Deliver),
}

impl Message {
    /// Get the `sender` field of the inner message.
    pub fn sender(&self) -> ProcessId {
        match self {
            Message::Prepare(msg) => msg.sender,
            Message::Acknowledged(msg) => msg.sender,
            Message::Commit(msg) => msg.sender,
            Message::Deliver(msg) => msg.sender,
        }
    }

    /// Get the `view` field of the inner message.
    pub fn view(&self) -> &View {
        match self {
            Message::Prepare(msg) => &msg.view,
            Message::Acknowledged(msg) => &msg.view,
            Message::Commit(msg) => &msg.view,
            Message::Deliver(msg) => &msg.view,
        }
    }

    /// Get the hash of the payload this message is about.
    pub fn payload_hash(&self) -> PayloadHash {
        match self {
            Message::Prepare(msg) => crate::types::crypto_primitives::payload_hash(&msg.payload),
            Message::Acknowledged(msg) => msg.payload_hash,
            Message::Commit(msg) => msg.payload_hash,
            Message::Deliver(msg) => msg.payload_hash,
        }
    }

    /// Serialize the message into its wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Writing into a Vec never fails.
        self.try_to_vec().unwrap()
    }

    /// Deserialize a message from its wire format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Message, DbrbError> {
        Ok(Message::try_from_slice(bytes)?)
    }
}

impl From<Prepare> for Message {
    fn from(value: Prepare) -> Self {
        Message::Prepare(value)
    }
}

impl From<Acknowledged> for Message {
    fn from(value: Acknowledged) -> Self {
        Message::Acknowledged(value)
    }
}

impl From<Commit> for Message {
    fn from(value: Commit) -> Self {
        Message::Commit(value)
    }
}

impl From<Deliver> for Message {
    fn from(value: Deliver) -> Self {
        Message::Deliver(value)
    }
}

/// Proposal of `payload` for broadcast among the members of `view`.
///
/// `bootstrap_view` is the broadcaster's trusted seed view, carried so that receivers can bridge view
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Prepare {
    pub sender: ProcessId,
    pub payload: Payload,
    pub view: View,
    pub bootstrap_view: View,
}

/// Attestation that `sender` has validated and signed the payload identified by `payload_hash` under
/// `view`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Acknowledged {
    pub sender: ProcessId,
    pub payload_hash: PayloadHash,
    pub view: View,
    pub payload_signature: SignatureBytes,
}

/// Proof, in the form of a quorum [`Certificate`], that the members of `view` acknowledged the payload
/// identified by `payload_hash`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Commit {
    pub sender: ProcessId,
    pub payload_hash: PayloadHash,
    pub certificate: Certificate,
    pub view: View,
}

/// Attestation that `sender` has committed the payload identified by `payload_hash` and is ready to
/// deliver it. Sent only to the sender of the Commit message that caused it.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Deliver {
    pub sender: ProcessId,
    pub payload_hash: PayloadHash,
    pub view: View,
}
