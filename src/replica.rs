/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Methods to build and run a process on background threads.
//!
//! A [`DbrbProcess`] does nothing by itself: someone has to feed it the messages its network receives. A
//! [`Replica`] does that on a poller thread, and, if any event handlers are registered, fires them on an
//! event bus thread.
//!
//! The key components of this module are:
//! - The builder-pattern interface to construct a [specification of the replica](ReplicaSpec) with:
//!   1. `ReplicaSpec::builder` to construct a `ReplicaSpecBuilder`,
//!   2. The setters of the `ReplicaSpecBuilder`, and
//!   3. The `ReplicaSpecBuilder::build` method to construct a [ReplicaSpec],
//! - The function to [start](ReplicaSpec::start) a [Replica] given its specification,
//! - [The type](Replica) which keeps the replica alive.
//!
//! ## Starting a replica
//!
//! ```ignore
//! let replica =
//!     ReplicaSpec::builder()
//!     .network(network)
//!     .configuration(configuration)
//!     .current_view(view)
//!     .on_deliver(deliver_handler)
//!     .on_collect_certificate(collect_certificate_handler)
//!     .build()
//!     .start();
//!
//! replica.process().broadcast(payload, &recipients);
//! ```
//!
//! ### Required setters
//! - `.network(...)`
//! - `.configuration(...)`
//!
//! ### Optional setters
//!
//! The initial views, and the callbacks a process calls synchronously:
//! - `.current_view(...)`
//! - `.bootstrap_view(...)`
//! - `.on_deliver(...)`
//! - `.on_validate(...)`
//!
//! Handlers for events from [crate::events]:
//! - `.on_broadcast(...)`
//! - `.on_acknowledge(...)`
//! - `.on_commit(...)`
//! - `.on_send_deliver(...)`
//! - `.on_receive_prepare(...)`
//! - `.on_receive_acknowledged(...)`
//! - `.on_receive_commit(...)`
//! - `.on_receive_deliver(...)`
//! - `.on_collect_certificate(...)`
//! - `.on_deliver_event(...)`
//! - `.on_update_view(...)`

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use typed_builder::TypedBuilder;

use crate::config::Configuration;
use crate::event_bus::*;
use crate::events::*;
use crate::networking::{start_polling, Network};
use crate::process::{DbrbProcess, DeliverCallback, ValidationCallback};
use crate::types::{basic::Payload, view::View};

/// Stores all necessary parameters and trait implementations required to run the [Replica].
#[derive(TypedBuilder)]
pub struct ReplicaSpec<N: Network> {
    // Required parameters
    #[builder(setter(doc = "Set the implementation of peer-to-peer networking. The argument must implement the [Network](crate::networking::Network) trait. Required."))]
    network: N,
    #[builder(setter(doc = "Set the [configuration](Configuration), which contains the necessary parameters to run a process. Required."))]
    configuration: Configuration,
    // Optional parameters
    #[builder(default, setter(doc = "Set the view the process starts in. Optional, defaults to an empty view."))]
    current_view: View,
    #[builder(default, setter(doc = "Set the bootstrap view the process starts with. Optional, defaults to an empty view."))]
    bootstrap_view: View,
    #[builder(default, setter(transform = |handler: impl Fn(&Payload) + Send + Sync + 'static| Some(Box::new(handler) as DeliverCallback),
    doc = "Register a callback to be invoked with every payload the process delivers. Optional."))]
    on_deliver: Option<DeliverCallback>,
    #[builder(default, setter(transform = |handler: impl Fn(&Payload) -> bool + Send + Sync + 'static| Some(Box::new(handler) as ValidationCallback),
    doc = "Register a callback that decides whether proposed payloads are acceptable. Optional, all payloads are accepted by default."))]
    on_validate: Option<ValidationCallback>,
    #[builder(default, setter(transform = |handler: impl Fn(&BroadcastEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<BroadcastEvent>),
    doc = "Register a handler closure to be invoked after the process broadcasts a payload. Optional."))]
    on_broadcast: Option<HandlerPtr<BroadcastEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&AcknowledgeEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<AcknowledgeEvent>),
    doc = "Register a handler closure to be invoked after the process acknowledges a payload. Optional."))]
    on_acknowledge: Option<HandlerPtr<AcknowledgeEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&CommitEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<CommitEvent>),
    doc = "Register a handler closure to be invoked after the process disseminates a Commit. Optional."))]
    on_commit: Option<HandlerPtr<CommitEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&SendDeliverEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<SendDeliverEvent>),
    doc = "Register a handler closure to be invoked after the process sends a Deliver. Optional."))]
    on_send_deliver: Option<HandlerPtr<SendDeliverEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceivePrepareEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ReceivePrepareEvent>),
    doc = "Register a handler closure to be invoked after the process accepts a Prepare. Optional."))]
    on_receive_prepare: Option<HandlerPtr<ReceivePrepareEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceiveAcknowledgedEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ReceiveAcknowledgedEvent>),
    doc = "Register a handler closure to be invoked after the process accepts an Acknowledged. Optional."))]
    on_receive_acknowledged: Option<HandlerPtr<ReceiveAcknowledgedEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceiveCommitEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ReceiveCommitEvent>),
    doc = "Register a handler closure to be invoked after the process accepts a Commit. Optional."))]
    on_receive_commit: Option<HandlerPtr<ReceiveCommitEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceiveDeliverEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ReceiveDeliverEvent>),
    doc = "Register a handler closure to be invoked after the process accepts a Deliver. Optional."))]
    on_receive_deliver: Option<HandlerPtr<ReceiveDeliverEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&CollectCertificateEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<CollectCertificateEvent>),
    doc = "Register a handler closure to be invoked after the process collects a certificate. Optional."))]
    on_collect_certificate: Option<HandlerPtr<CollectCertificateEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&DeliverEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<DeliverEvent>),
    doc = "Register a handler closure to be invoked on the event bus after the process delivers a payload. Optional."))]
    on_deliver_event: Option<HandlerPtr<DeliverEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&UpdateViewEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<UpdateViewEvent>),
    doc = "Register a handler closure to be invoked after the process installs a new view. Optional."))]
    on_update_view: Option<HandlerPtr<UpdateViewEvent>>,
}

impl<N: Network> ReplicaSpec<N> {
    /// Starts all threads and channels associated with running a replica, and returns the handles to them
    /// in a [Replica] struct.
    pub fn start(self) -> Replica<N> {
        let event_handlers = EventHandlers::new(
            self.configuration.log_events,
            self.on_broadcast,
            self.on_acknowledge,
            self.on_commit,
            self.on_send_deliver,
            self.on_receive_prepare,
            self.on_receive_acknowledged,
            self.on_receive_commit,
            self.on_receive_deliver,
            self.on_collect_certificate,
            self.on_deliver_event,
            self.on_update_view,
        );

        let (event_publisher, event_subscriber) = if !event_handlers.is_empty() {
            Some(mpsc::channel()).unzip()
        } else {
            (None, None)
        };

        let mut process = DbrbProcess::new(&self.configuration, self.network.clone())
            .with_event_publisher(event_publisher);
        if let Some(on_deliver) = self.on_deliver {
            process = process.on_deliver(on_deliver);
        }
        if let Some(on_validate) = self.on_validate {
            process = process.on_validate(on_validate);
        }
        process.set_current_view(self.current_view);
        process.set_bootstrap_view(self.bootstrap_view);
        let process = Arc::new(process);

        let (poller_shutdown, poller_shutdown_receiver) = mpsc::channel();
        let poller = start_polling(self.network, process.clone(), poller_shutdown_receiver);

        let (event_bus, event_bus_shutdown) = match event_subscriber {
            Some(event_subscriber) => {
                let (event_bus_shutdown, event_bus_shutdown_receiver) = mpsc::channel();
                let event_bus = start_event_bus(
                    event_handlers,
                    event_subscriber,
                    event_bus_shutdown_receiver,
                );
                (Some(event_bus), Some(event_bus_shutdown))
            }
            None => (None, None),
        };

        Replica {
            process,
            poller: Some(poller),
            poller_shutdown,
            event_bus,
            event_bus_shutdown,
        }
    }
}

/// A handle to the background threads of a DBRB-rs replica. When this value is dropped, all background
/// threads are gracefully shut down.
pub struct Replica<N: Network> {
    process: Arc<DbrbProcess<N>>,
    poller: Option<JoinHandle<()>>,
    poller_shutdown: Sender<()>,
    event_bus: Option<JoinHandle<()>>,
    event_bus_shutdown: Option<Sender<()>>,
}

impl<N: Network> Replica<N> {
    /// The process run by this replica, e.g., to [broadcast](DbrbProcess::broadcast) payloads or
    /// [update its view](DbrbProcess::update_view).
    pub fn process(&self) -> &Arc<DbrbProcess<N>> {
        &self.process
    }
}

impl<N: Network> Drop for Replica<N> {
    fn drop(&mut self) {
        self.event_bus_shutdown
            .iter()
            .for_each(|shutdown| shutdown.send(()).unwrap());
        if let Some(event_bus) = self.event_bus.take() {
            event_bus.join().unwrap();
        }

        self.poller_shutdown.send(()).unwrap();
        if let Some(poller) = self.poller.take() {
            poller.join().unwrap();
        }
    }
}
