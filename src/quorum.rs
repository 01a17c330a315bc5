/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Bookkeeping of corroborating evidence for a single broadcast round.
//!
//! A [`QuorumManager`] lives inside every [`BroadcastRecord`](crate::broadcast_data::BroadcastRecord).
//! It counts, per view, the processes that sent Acknowledged and Deliver messages, and reports when the
//! [quorum size](crate::types::view::View::quorum_size) of that view has been reached.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::types::{
    basic::{PayloadHash, ProcessId},
    view::View,
};

#[derive(Clone, Debug, Default)]
pub struct QuorumManager {
    /// Per view, which payload hash each process claims to have acknowledged.
    pub acknowledged_payloads: HashMap<View, BTreeMap<ProcessId, PayloadHash>>,

    /// Per view, which processes have been observed to be ready to deliver.
    pub deliver_quorum_collected_processes: HashMap<View, BTreeSet<ProcessId>>,
}

impl QuorumManager {
    pub fn new() -> QuorumManager {
        Self::default()
    }

    /// Record that `sender` acknowledged `payload_hash` under `view`, and return whether a quorum of `view`
    /// has now acknowledged `payload_hash`.
    ///
    /// A process has at most one entry per view, so a repeated Acknowledged from the same sender does not
    /// inflate the count.
    pub fn update_acknowledged(
        &mut self,
        sender: ProcessId,
        payload_hash: PayloadHash,
        view: &View,
    ) -> bool {
        let acknowledged = self.acknowledged_payloads.entry(view.clone()).or_default();
        acknowledged.insert(sender, payload_hash);

        let count = acknowledged
            .values()
            .filter(|hash| **hash == payload_hash)
            .count();
        count >= view.quorum_size()
    }

    /// Get the processes that acknowledged `payload_hash` under `view`, in ascending order.
    pub fn acknowledging_processes(&self, payload_hash: &PayloadHash, view: &View) -> Vec<ProcessId> {
        match self.acknowledged_payloads.get(view) {
            Some(acknowledged) => acknowledged
                .iter()
                .filter(|(_, hash)| *hash == payload_hash)
                .map(|(process, _)| *process)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Record that `sender` is ready to deliver under `view`, and return whether a quorum of `view` is now
    /// ready to deliver.
    pub fn update_deliver(&mut self, sender: ProcessId, view: &View) -> bool {
        let ready = self
            .deliver_quorum_collected_processes
            .entry(view.clone())
            .or_default();
        ready.insert(sender);
        ready.len() >= view.quorum_size()
    }
}
