/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions of DBRB-rs events for event handling and logging.
//!
//! Note: an event for a given action indicates that the action has been completed.

use std::sync::mpsc::Sender;
use std::time::SystemTime;

use crate::types::{
    basic::{Payload, PayloadHash, ProcessId},
    certificate::Certificate,
    view::View,
};

pub enum Event {
    // Events that involve disseminating or sending a message.
    Broadcast(BroadcastEvent),
    Acknowledge(AcknowledgeEvent),
    Commit(CommitEvent),
    SendDeliver(SendDeliverEvent),
    // Events that involve receiving a message.
    ReceivePrepare(ReceivePrepareEvent),
    ReceiveAcknowledged(ReceiveAcknowledgedEvent),
    ReceiveCommit(ReceiveCommitEvent),
    ReceiveDeliver(ReceiveDeliverEvent),
    // Events that change the state of a broadcast round, or of the process.
    CollectCertificate(CollectCertificateEvent),
    Deliver(DeliverEvent),
    UpdateView(UpdateViewEvent),
}

impl Event {
    /// Publish `event` if there is someone subscribed to events.
    pub(crate) fn publish(event_publisher: &Option<Sender<Event>>, event: Event) {
        if let Some(event_publisher) = event_publisher {
            // The event bus shuts down before the process, events emitted while it does are dropped.
            let _ = event_publisher.send(event);
        }
    }
}

/// This process disseminated a Prepare for a payload it broadcasts.
pub struct BroadcastEvent {
    pub timestamp: SystemTime,
    pub payload_hash: PayloadHash,
    pub view: View,
}

/// This process accepted a Prepare.
pub struct ReceivePrepareEvent {
    pub timestamp: SystemTime,
    pub origin: ProcessId,
    pub payload_hash: PayloadHash,
    pub view: View,
}

/// This process signed a payload and disseminated its Acknowledged message.
pub struct AcknowledgeEvent {
    pub timestamp: SystemTime,
    pub payload_hash: PayloadHash,
    pub view: View,
}

pub struct ReceiveAcknowledgedEvent {
    pub timestamp: SystemTime,
    pub origin: ProcessId,
    pub payload_hash: PayloadHash,
    pub view: View,
}

/// This process collected a quorum of Acknowledged messages and assembled a certificate out of them.
pub struct CollectCertificateEvent {
    pub timestamp: SystemTime,
    pub payload_hash: PayloadHash,
    pub view: View,
    pub certificate: Certificate,
}

/// This process disseminated a Commit, either its own or an echo of one it received.
pub struct CommitEvent {
    pub timestamp: SystemTime,
    pub payload_hash: PayloadHash,
    pub view: View,
}

pub struct ReceiveCommitEvent {
    pub timestamp: SystemTime,
    pub origin: ProcessId,
    pub payload_hash: PayloadHash,
    pub view: View,
}

pub struct SendDeliverEvent {
    pub timestamp: SystemTime,
    pub recipient: ProcessId,
    pub payload_hash: PayloadHash,
    pub view: View,
}

pub struct ReceiveDeliverEvent {
    pub timestamp: SystemTime,
    pub origin: ProcessId,
    pub payload_hash: PayloadHash,
    pub view: View,
}

/// This process delivered a payload to its host.
pub struct DeliverEvent {
    pub timestamp: SystemTime,
    pub payload_hash: PayloadHash,
    pub payload: Payload,
}

/// This process installed a new current view, dropping all of its broadcast records.
pub struct UpdateViewEvent {
    pub timestamp: SystemTime,
    pub current_view: View,
    pub bootstrap_view: View,
}
