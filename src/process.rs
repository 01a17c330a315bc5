/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The DBRB protocol state machine.
//!
//! A [`DbrbProcess`] plays both roles of the protocol: broadcaster of the payloads its host hands to
//! [`broadcast`](DbrbProcess::broadcast), and receiver of the messages its network hands to
//! [`process_message`](DbrbProcess::process_message).
//!
//! ## Protocol
//!
//! A broadcast round for a payload goes through four phases:
//! 1. **Prepare**: the broadcaster disseminates the payload to the view it is broadcasting to. Every member
//!    that accepts the Prepare echoes it to the whole view, signs `(payload, view)` and disseminates an
//!    Acknowledged message carrying the signature.
//! 2. **Acknowledged**: once a process has collected valid Acknowledged signatures from a quorum of the
//!    view, it assembles them into a [`Certificate`] and disseminates a Commit carrying it.
//! 3. **Commit**: a process that receives a correct Commit echoes it once to the whole view, and replies
//!    with a Deliver to the process the Commit came from.
//! 4. **Deliver**: once a process has collected Deliver messages from a quorum of the view, it delivers the
//!    payload to its host, at most once per payload.
//!
//! Invalid messages are dropped silently: no state is created or changed, and nothing is disseminated. The
//! reason is logged at the `debug` level. Only a Prepare that is accepted, or a local broadcast, creates a
//! [`BroadcastRecord`].
//!
//! ## Concurrency
//!
//! All methods take `&self`. The protocol state sits behind a single lock. Messages produced while handling
//! are handed to the network only after that lock is released, and so is the payload handed to the deliver
//! callback, so a network that loops messages back synchronously cannot deadlock the process.

use std::collections::{BTreeSet, HashSet};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use crate::broadcast_data::{BroadcastData, BroadcastRecord};
use crate::config::Configuration;
use crate::error::DbrbError;
use crate::events::*;
use crate::messages::{Acknowledged, Commit, Deliver, Message, Prepare};
use crate::networking::{Dissemination, Network, SenderHandle};
use crate::types::{
    basic::{Payload, PayloadHash, ProcessId, Timestamp},
    crypto_primitives::{payload_hash, verify_payload_signature, Keypair},
    view::View,
};
use crate::view_supplier::ViewSupplier;

/// Called with the payload of every broadcast round a process delivers.
pub type DeliverCallback = Box<dyn Fn(&Payload) + Send + Sync>;

/// Called with the payload of every Prepare a process is about to accept. Returning `false` rejects the
/// Prepare.
pub type ValidationCallback = Box<dyn Fn(&Payload) -> bool + Send + Sync>;

pub struct DbrbProcess<N: Network> {
    id: ProcessId,
    keypair: Keypair,
    registration_grace_period: Duration,
    state: Mutex<ProcessState>,
    sender: SenderHandle<N>,
    on_deliver: Option<DeliverCallback>,
    on_validate: Option<ValidationCallback>,
}

struct ProcessState {
    current_view: View,
    bootstrap_view: View,
    broadcast_data: BroadcastData,
    // Survives view updates. Only the host prunes it, through `DbrbProcess::retain_delivered`.
    delivered: HashSet<PayloadHash>,
    event_publisher: Option<Sender<Event>>,
}

impl<N: Network> DbrbProcess<N> {
    /// Create a process with empty current and bootstrap views.
    pub fn new(configuration: &Configuration, network: N) -> DbrbProcess<N> {
        let keypair = Keypair::new(configuration.me.clone());
        Self {
            id: keypair.id(),
            keypair,
            registration_grace_period: configuration.registration_grace_period,
            state: Mutex::new(ProcessState {
                current_view: View::new(),
                bootstrap_view: View::new(),
                broadcast_data: BroadcastData::new(),
                delivered: HashSet::new(),
                event_publisher: None,
            }),
            sender: SenderHandle::new(network),
            on_deliver: None,
            on_validate: None,
        }
    }

    /// Register the callback that receives delivered payloads.
    pub fn on_deliver(mut self, callback: impl Fn(&Payload) + Send + Sync + 'static) -> Self {
        self.on_deliver = Some(Box::new(callback));
        self
    }

    /// Register the callback that decides whether a proposed payload is acceptable.
    pub fn on_validate(mut self, callback: impl Fn(&Payload) -> bool + Send + Sync + 'static) -> Self {
        self.on_validate = Some(Box::new(callback));
        self
    }

    pub(crate) fn with_event_publisher(self, event_publisher: Option<Sender<Event>>) -> Self {
        self.lock_state().event_publisher = event_publisher;
        self
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn current_view(&self) -> View {
        self.lock_state().current_view.clone()
    }

    pub fn bootstrap_view(&self) -> View {
        self.lock_state().bootstrap_view.clone()
    }

    /// Install `view` as the current view, without touching the broadcast records.
    pub fn set_current_view(&self, view: View) {
        self.lock_state().current_view = view;
    }

    pub fn set_bootstrap_view(&self, view: View) {
        self.lock_state().bootstrap_view = view;
    }

    /// Get a copy of the record of the broadcast round for `payload_hash`, if the process knows of it.
    pub fn broadcast_record(&self, payload_hash: &PayloadHash) -> Option<BroadcastRecord> {
        self.lock_state().broadcast_data.get(payload_hash).cloned()
    }

    pub fn has_delivered(&self, payload_hash: &PayloadHash) -> bool {
        self.lock_state().delivered.contains(payload_hash)
    }

    /// Forget every delivered payload hash for which `keep` returns `false`.
    ///
    /// The set of delivered hashes is what keeps a payload from being delivered twice, and it is kept
    /// across [view updates](Self::update_view). It therefore grows by one hash per delivered payload for
    /// the lifetime of the process, unless the host prunes it here once it knows that a payload can no
    /// longer be broadcast again, for example because it has expired. A forgotten payload can be delivered
    /// again if a new broadcast round for it completes.
    pub fn retain_delivered(&self, keep: impl Fn(&PayloadHash) -> bool) {
        self.lock_state().delivered.retain(|hash| keep(hash));
    }

    /// Every message this process has handed to its network so far, in order.
    pub fn disseminations(&self) -> Vec<Dissemination> {
        self.sender.log()
    }

    /// Start a broadcast round for `payload` among `recipients`.
    ///
    /// Returns the hash of the payload, or `None` if the recipients do not form a non-empty subview of
    /// the current view that contains this process.
    pub fn broadcast(&self, payload: Payload, recipients: &BTreeSet<ProcessId>) -> Option<PayloadHash> {
        let view = View::from(recipients.clone());
        let mut effects = Effects::default();

        let hash = {
            let mut guard = self.lock_state();
            let state = &mut *guard;

            if view.is_empty() {
                log::warn!("{} cannot broadcast to an empty view", self.id);
                return None;
            }
            if !view.is_subview_of(&state.current_view) {
                log::warn!(
                    "{} cannot broadcast to {}: not a subview of the current view {}",
                    self.id,
                    view,
                    state.current_view
                );
                return None;
            }
            if !view.is_member(&self.id) {
                log::warn!("{} cannot broadcast to {}: not a member", self.id, view);
                return None;
            }

            let hash = payload_hash(&payload);
            let bootstrap_view = state.bootstrap_view.clone();
            let record = state.broadcast_data.get_or_create(&hash);
            record.payload = Some(payload.clone());
            record.broadcast_view = view.clone();
            record.bootstrap_view = bootstrap_view.clone();

            effects.disseminate(
                Prepare {
                    sender: self.id,
                    payload,
                    view: view.clone(),
                    bootstrap_view,
                }
                .into(),
                view.member_set().clone(),
            );
            Event::publish(
                &state.event_publisher,
                Event::Broadcast(BroadcastEvent {
                    timestamp: SystemTime::now(),
                    payload_hash: hash,
                    view,
                }),
            );
            hash
        };

        self.apply(effects);
        Some(hash)
    }

    /// Handle a message received from the network.
    pub fn process_message(&self, message: Message) {
        let mut effects = Effects::default();
        {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            match message {
                Message::Prepare(prepare) => self.on_receive_prepare(prepare, state, &mut effects),
                Message::Acknowledged(acknowledged) => {
                    self.on_receive_acknowledged(acknowledged, state, &mut effects)
                }
                Message::Commit(commit) => self.on_receive_commit(commit, state, &mut effects),
                Message::Deliver(deliver) => self.on_receive_deliver(deliver, state, &mut effects),
            }
        }
        self.apply(effects);
    }

    /// Fetch the current and bootstrap views from `view_supplier` and install them.
    ///
    /// The current view becomes the supplied view merged with the bootstrap view. All broadcast records are
    /// dropped; the set of delivered payloads is kept. Returns whether this process is a member of the
    /// supplied view or of the bootstrap view.
    pub fn update_view(
        &self,
        view_supplier: &impl ViewSupplier,
        now: Timestamp,
    ) -> Result<bool, DbrbError> {
        let supplied_view = view_supplier.view(now);
        let bootstrap_view = view_supplier.bootstrap_view();
        let current_view = supplied_view.merge(&bootstrap_view);
        if current_view.is_empty() {
            return Err(DbrbError::NoProcesses);
        }

        let mut state = self.lock_state();
        state.broadcast_data.clear();
        state.current_view = current_view.clone();
        state.bootstrap_view = bootstrap_view.clone();
        log::debug!("{} current view is now {}", self.id, current_view);
        Event::publish(
            &state.event_publisher,
            Event::UpdateView(UpdateViewEvent {
                timestamp: SystemTime::now(),
                current_view,
                bootstrap_view: bootstrap_view.clone(),
            }),
        );

        Ok(supplied_view.is_member(&self.id) || bootstrap_view.is_member(&self.id))
    }

    /// Check whether this process should (re-)register itself with the system.
    ///
    /// A process that is in neither the supplied view nor the bootstrap view must register. A registered
    /// process must register again once `now` reaches the start of the grace period before its registration
    /// expires. A process that is only in the bootstrap view never has to register.
    pub fn is_registration_required(
        &self,
        view_supplier: &impl ViewSupplier,
        now: Timestamp,
    ) -> Result<bool, DbrbError> {
        if view_supplier.view(now).is_member(&self.id) {
            let expiration_time = view_supplier
                .expiration_time(&self.id)
                .unwrap_or(Timestamp::new(0));
            let grace_period_start = expiration_time
                .checked_sub(self.registration_grace_period)
                .ok_or(DbrbError::InvalidExpirationTime { process: self.id })?;
            Ok(now >= grace_period_start)
        } else {
            Ok(!view_supplier.bootstrap_view().is_member(&self.id))
        }
    }

    fn on_receive_prepare(&self, prepare: Prepare, state: &mut ProcessState, effects: &mut Effects) {
        if !state.current_view.is_member(&self.id) {
            log::debug!("{} drops Prepare: not a member of its current view", self.id);
            return;
        }
        if !prepare.view.is_member(&prepare.sender) {
            log::debug!(
                "{} drops Prepare: sender {} is not a member of {}",
                self.id,
                prepare.sender,
                prepare.view
            );
            return;
        }
        if prepare.view != state.current_view {
            log::debug!(
                "{} drops Prepare: view {} is not the current view {}",
                self.id,
                prepare.view,
                state.current_view
            );
            return;
        }

        let hash = payload_hash(&prepare.payload);
        if state
            .broadcast_data
            .get(&hash)
            .map_or(false, |record| record.prepare_processed)
        {
            log::debug!("{} drops Prepare: {} already prepared", self.id, hash);
            return;
        }
        if let Some(validate) = &self.on_validate {
            if !validate(&prepare.payload) {
                log::debug!("{} drops Prepare: payload {} is invalid", self.id, hash);
                return;
            }
        }

        let record = state.broadcast_data.get_or_create(&hash);
        record.payload = Some(prepare.payload.clone());
        record.broadcast_view = prepare.view.clone();
        record.bootstrap_view = prepare.bootstrap_view.clone();
        record.prepare_processed = true;
        Event::publish(
            &state.event_publisher,
            Event::ReceivePrepare(ReceivePrepareEvent {
                timestamp: SystemTime::now(),
                origin: prepare.sender,
                payload_hash: hash,
                view: prepare.view.clone(),
            }),
        );

        let view = prepare.view.clone();
        let acknowledged = Acknowledged {
            sender: self.id,
            payload_hash: hash,
            view: view.clone(),
            payload_signature: self.keypair.sign_payload(&prepare.payload, &view),
        };
        effects.disseminate(prepare.into(), view.member_set().clone());
        effects.disseminate(acknowledged.into(), view.member_set().clone());
        Event::publish(
            &state.event_publisher,
            Event::Acknowledge(AcknowledgeEvent {
                timestamp: SystemTime::now(),
                payload_hash: hash,
                view,
            }),
        );
    }

    fn on_receive_acknowledged(
        &self,
        acknowledged: Acknowledged,
        state: &mut ProcessState,
        effects: &mut Effects,
    ) {
        let Acknowledged {
            sender,
            payload_hash,
            view,
            payload_signature,
        } = acknowledged;

        if !view.is_member(&sender) {
            log::debug!(
                "{} drops Acknowledged: sender {} is not a member of {}",
                self.id,
                sender,
                view
            );
            return;
        }
        let record = match state.broadcast_data.get_mut(&payload_hash) {
            Some(record) => record,
            None => {
                log::debug!("{} drops Acknowledged: unknown payload {}", self.id, payload_hash);
                return;
            }
        };
        let payload = match &record.payload {
            Some(payload) => payload,
            None => {
                log::debug!("{} drops Acknowledged: unknown payload {}", self.id, payload_hash);
                return;
            }
        };
        if view != record.broadcast_view {
            log::debug!(
                "{} drops Acknowledged: view {} is not the broadcast view {}",
                self.id,
                view,
                record.broadcast_view
            );
            return;
        }
        if !verify_payload_signature(&sender, payload, &view, &payload_signature) {
            log::debug!("{} drops Acknowledged: bad signature from {}", self.id, sender);
            return;
        }

        record.signatures.insert((view.clone(), sender), payload_signature);
        Event::publish(
            &state.event_publisher,
            Event::ReceiveAcknowledged(ReceiveAcknowledgedEvent {
                timestamp: SystemTime::now(),
                origin: sender,
                payload_hash,
                view: view.clone(),
            }),
        );

        let quorum_collected = record
            .quorum_manager
            .update_acknowledged(sender, payload_hash, &view);
        if !quorum_collected || !record.certificate.is_empty() {
            return;
        }

        let certificate = record.assemble_certificate(&payload_hash, &view);
        record.certificate = certificate.clone();
        record.commit_message_disseminated = true;
        let broadcast_view = record.broadcast_view.clone();
        log::trace!(
            "{} collected a certificate of {} signatures for {}",
            self.id,
            certificate.len(),
            payload_hash
        );
        Event::publish(
            &state.event_publisher,
            Event::CollectCertificate(CollectCertificateEvent {
                timestamp: SystemTime::now(),
                payload_hash,
                view: broadcast_view.clone(),
                certificate: certificate.clone(),
            }),
        );

        effects.disseminate(
            Commit {
                sender: self.id,
                payload_hash,
                certificate,
                view: broadcast_view.clone(),
            }
            .into(),
            broadcast_view.member_set().clone(),
        );
        Event::publish(
            &state.event_publisher,
            Event::Commit(CommitEvent {
                timestamp: SystemTime::now(),
                payload_hash,
                view: broadcast_view,
            }),
        );
    }

    fn on_receive_commit(&self, commit: Commit, state: &mut ProcessState, effects: &mut Effects) {
        let record = match state.broadcast_data.get_mut(&commit.payload_hash) {
            Some(record) => record,
            None => {
                log::debug!("{} drops Commit: unknown payload {}", self.id, commit.payload_hash);
                return;
            }
        };
        let payload = match &record.payload {
            Some(payload) => payload,
            None => {
                log::debug!("{} drops Commit: unknown payload {}", self.id, commit.payload_hash);
                return;
            }
        };
        if commit.view != record.broadcast_view {
            log::debug!(
                "{} drops Commit: view {} is not the broadcast view {}",
                self.id,
                commit.view,
                record.broadcast_view
            );
            return;
        }
        if !commit.certificate.is_correct(payload, &commit.view) {
            log::debug!(
                "{} drops Commit: incorrect certificate from {}",
                self.id,
                commit.sender
            );
            return;
        }

        Event::publish(
            &state.event_publisher,
            Event::ReceiveCommit(ReceiveCommitEvent {
                timestamp: SystemTime::now(),
                origin: commit.sender,
                payload_hash: commit.payload_hash,
                view: commit.view.clone(),
            }),
        );

        if !record.commit_message_disseminated {
            record.commit_message_disseminated = true;
            effects.disseminate(
                Commit {
                    sender: self.id,
                    payload_hash: commit.payload_hash,
                    certificate: commit.certificate.clone(),
                    view: commit.view.clone(),
                }
                .into(),
                commit.view.member_set().clone(),
            );
            Event::publish(
                &state.event_publisher,
                Event::Commit(CommitEvent {
                    timestamp: SystemTime::now(),
                    payload_hash: commit.payload_hash,
                    view: commit.view.clone(),
                }),
            );
        }

        effects.send(
            commit.sender,
            Deliver {
                sender: self.id,
                payload_hash: commit.payload_hash,
                view: commit.view.clone(),
            }
            .into(),
        );
        Event::publish(
            &state.event_publisher,
            Event::SendDeliver(SendDeliverEvent {
                timestamp: SystemTime::now(),
                recipient: commit.sender,
                payload_hash: commit.payload_hash,
                view: commit.view,
            }),
        );
    }

    fn on_receive_deliver(&self, deliver: Deliver, state: &mut ProcessState, effects: &mut Effects) {
        let Deliver {
            sender,
            payload_hash,
            view,
        } = deliver;

        if !state.current_view.is_member(&self.id) {
            log::debug!("{} drops Deliver: not a member of its current view", self.id);
            return;
        }
        if !view.is_member(&sender) {
            log::debug!(
                "{} drops Deliver: sender {} is not a member of {}",
                self.id,
                sender,
                view
            );
            return;
        }
        let record = match state.broadcast_data.get_mut(&payload_hash) {
            Some(record) if record.has_payload() => record,
            _ => {
                log::debug!("{} drops Deliver: unknown payload {}", self.id, payload_hash);
                return;
            }
        };
        if view != record.broadcast_view {
            log::debug!(
                "{} drops Deliver: view {} is not the broadcast view {}",
                self.id,
                view,
                record.broadcast_view
            );
            return;
        }

        Event::publish(
            &state.event_publisher,
            Event::ReceiveDeliver(ReceiveDeliverEvent {
                timestamp: SystemTime::now(),
                origin: sender,
                payload_hash,
                view: view.clone(),
            }),
        );

        let quorum_collected = record.quorum_manager.update_deliver(sender, &view);
        if !quorum_collected || state.delivered.contains(&payload_hash) {
            return;
        }

        if let Some(payload) = record.payload.clone() {
            state.delivered.insert(payload_hash);
            log::debug!("{} delivers {}", self.id, payload_hash);
            Event::publish(
                &state.event_publisher,
                Event::Deliver(DeliverEvent {
                    timestamp: SystemTime::now(),
                    payload_hash,
                    payload: payload.clone(),
                }),
            );
            effects.delivery = Some(payload);
        }
    }

    /// Hand the effects of handling a message to the network and the host. Must be called without holding
    /// the state lock.
    fn apply(&self, effects: Effects) {
        for outbound in effects.outbound {
            match outbound {
                Outbound::Disseminate {
                    message,
                    recipients,
                } => self.sender.disseminate(message, recipients),
                Outbound::Send { recipient, message } => self.sender.send(recipient, message),
            }
        }

        if let (Some(payload), Some(on_deliver)) = (effects.delivery, &self.on_deliver) {
            on_deliver(&payload);
        }
    }

    fn lock_state(&self) -> MutexGuard<ProcessState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("a thread panicked while holding the state of process {}", self.id),
        }
    }
}

enum Outbound {
    Disseminate {
        message: Message,
        recipients: BTreeSet<ProcessId>,
    },
    Send {
        recipient: ProcessId,
        message: Message,
    },
}

/// What handling a message asks of the network and the host.
#[derive(Default)]
struct Effects {
    outbound: Vec<Outbound>,
    delivery: Option<Payload>,
}

impl Effects {
    fn disseminate(&mut self, message: Message, recipients: BTreeSet<ProcessId>) {
        self.outbound.push(Outbound::Disseminate {
            message,
            recipients,
        });
    }

    fn send(&mut self, recipient: ProcessId, message: Message) {
        self.outbound.push(Outbound::Send { recipient, message });
    }
}
