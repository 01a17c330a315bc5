/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definition of the [Certificate] type, which serves as evidence that a quorum of a view has
//! acknowledged a given payload under that view.

use std::collections::{btree_map, BTreeMap};

use borsh::{BorshDeserialize, BorshSerialize};

use super::{
    basic::{Payload, ProcessId, SignatureBytes},
    crypto_primitives::{signing_hash, verify},
    view::View,
};

/// Acknowledged signatures from distinct processes over the same `(payload, view)` pair.
///
/// A certificate is assembled once a process observes a quorum of Acknowledged messages, and travels
/// inside Commit messages. It serializes as a count-prefixed sequence of `(ProcessId, SignatureBytes)`
/// pairs in ascending order of process id.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Certificate(BTreeMap<ProcessId, SignatureBytes>);

impl Certificate {
    pub fn new() -> Certificate {
        Certificate(BTreeMap::new())
    }

    pub fn insert(&mut self, signer: ProcessId, signature: SignatureBytes) {
        self.0.insert(signer, signature);
    }

    pub fn get(&self, signer: &ProcessId) -> Option<&SignatureBytes> {
        self.0.get(signer)
    }

    pub fn iter(&self) -> btree_map::Iter<ProcessId, SignatureBytes> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks if the certificate holds a quorum of `view`, and whether every signature in it is a correct
    /// acknowledgement of `payload` under `view` by a member of `view`.
    pub fn is_correct(&self, payload: &Payload, view: &View) -> bool {
        if self.len() < view.quorum_size() {
            return false;
        }

        let hash = signing_hash(payload, view);
        self.iter()
            .all(|(signer, signature)| view.is_member(signer) && verify(signer, &hash, signature))
    }
}

impl FromIterator<(ProcessId, SignatureBytes)> for Certificate {
    fn from_iter<T: IntoIterator<Item = (ProcessId, SignatureBytes)>>(iter: T) -> Self {
        Certificate(iter.into_iter().collect())
    }
}
