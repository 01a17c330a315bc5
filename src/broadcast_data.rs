/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Per-payload state of the broadcast rounds a process takes part in.
//!
//! Every round is identified by the [`PayloadHash`] of its payload. Its state lives in a
//! [`BroadcastRecord`], which is created when the payload becomes known: by a local
//! [broadcast](crate::process::DbrbProcess::broadcast) or by an accepted Prepare. Messages about rounds
//! without a record are dropped.

use std::collections::HashMap;

use crate::{
    quorum::QuorumManager,
    types::{
        basic::{Payload, PayloadHash, ProcessId, SignatureBytes},
        certificate::Certificate,
        view::View,
    },
};

/// Everything a process knows about one broadcast round.
#[derive(Clone, Debug, Default)]
pub struct BroadcastRecord {
    /// The payload, once a Prepare for it was accepted or this process broadcast it.
    pub payload: Option<Payload>,

    /// The view the payload is being broadcast to.
    pub broadcast_view: View,

    /// The broadcaster's bootstrap view, as carried by the Prepare message.
    pub bootstrap_view: View,

    /// Acknowledged signatures, keyed by the view they were made under and their signer.
    pub signatures: HashMap<(View, ProcessId), SignatureBytes>,

    /// Empty until a quorum of Acknowledged messages has been collected.
    pub certificate: Certificate,

    /// Whether this process has already disseminated a Commit for the round.
    pub commit_message_disseminated: bool,

    /// Whether this process has already accepted a Prepare for the round.
    pub prepare_processed: bool,

    pub quorum_manager: QuorumManager,
}

impl BroadcastRecord {
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Build a certificate out of the stored signatures of every process that acknowledged `payload_hash`
    /// under `view`.
    ///
    /// # Panics
    ///
    /// Panics if one of those processes has no stored signature. The quorum manager is only updated after
    /// the signature is stored, so this indicates a bug.
    pub fn assemble_certificate(&self, payload_hash: &PayloadHash, view: &View) -> Certificate {
        self.quorum_manager
            .acknowledging_processes(payload_hash, view)
            .into_iter()
            .map(|process| {
                match self.signatures.get(&(view.clone(), process)) {
                    Some(signature) => (process, *signature),
                    None => panic!(
                        "no Acknowledged signature stored for process {} in view {}",
                        process, view
                    ),
                }
            })
            .collect()
    }
}

/// Table of [`BroadcastRecord`]s keyed by [`PayloadHash`].
#[derive(Clone, Debug, Default)]
pub struct BroadcastData(HashMap<PayloadHash, BroadcastRecord>);

impl BroadcastData {
    pub fn new() -> BroadcastData {
        Self::default()
    }

    /// Get the record for `payload_hash`, creating a default one if none exists yet.
    pub fn get_or_create(&mut self, payload_hash: &PayloadHash) -> &mut BroadcastRecord {
        self.0.entry(*payload_hash).or_default()
    }

    pub fn get(&self, payload_hash: &PayloadHash) -> Option<&BroadcastRecord> {
        self.0.get(payload_hash)
    }

    pub fn get_mut(&mut self, payload_hash: &PayloadHash) -> Option<&mut BroadcastRecord> {
        self.0.get_mut(payload_hash)
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }
}
