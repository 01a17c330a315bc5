/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! [Trait definition](Network) for pluggable peer-to-peer networking, as well as the internal types and
//! functions that processes use to interact with the network.
//!
//! DBRB-rs has modular peer-to-peer networking, with each peer reachable by its [`ProcessId`]. Networking
//! providers interact with a [`DbrbProcess`] through implementations of the [`Network`] trait, which has
//! three methods: one to disseminate a message to a set of processes, one to send a message to a single
//! process, and one to receive messages.

use std::collections::BTreeSet;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::messages::Message;
use crate::process::DbrbProcess;
use crate::types::basic::ProcessId;

pub trait Network: Clone + Send + 'static {
    /// Send a message to every process in `recipients` without blocking.
    fn disseminate(&mut self, message: Message, recipients: &BTreeSet<ProcessId>);

    /// Send a message to the specified process without blocking.
    fn send(&mut self, recipient: ProcessId, message: Message);

    /// Receive a message from any process. Returns immediately with a `None` if no message is available now.
    fn recv(&mut self) -> Option<Message>;
}

/// A message handed to the network, and the processes it was addressed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dissemination {
    pub message: Message,
    pub recipients: BTreeSet<ProcessId>,
}

/// The sending end of a process's network, which records every dissemination in a log before handing it
/// to the network.
///
/// The network is cloned out of its lock for every send, so a network that delivers messages
/// synchronously may call back into the process that is sending.
pub(crate) struct SenderHandle<N: Network> {
    network: Mutex<N>,
    log: Mutex<Vec<Dissemination>>,
}

impl<N: Network> SenderHandle<N> {
    pub(crate) fn new(network: N) -> SenderHandle<N> {
        Self {
            network: Mutex::new(network),
            log: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn disseminate(&self, message: Message, recipients: BTreeSet<ProcessId>) {
        self.record(message.clone(), recipients.clone());
        self.network().disseminate(message, &recipients);
    }

    pub(crate) fn send(&self, recipient: ProcessId, message: Message) {
        self.record(message.clone(), BTreeSet::from([recipient]));
        self.network().send(recipient, message);
    }

    /// Get a copy of every dissemination made so far, in the order they were made.
    pub(crate) fn log(&self) -> Vec<Dissemination> {
        lock(&self.log).clone()
    }

    fn record(&self, message: Message, recipients: BTreeSet<ProcessId>) {
        lock(&self.log).push(Dissemination {
            message,
            recipients,
        });
    }

    fn network(&self) -> N {
        lock(&self.network).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("a thread panicked while holding the network lock"),
    }
}

/// Spawn the poller thread, which polls the Network for messages and hands them to `process`.
pub(crate) fn start_polling<N: Network>(
    mut network: N,
    process: Arc<DbrbProcess<N>>,
    shutdown_signal: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) => return,
            Err(TryRecvError::Empty) => (),
            Err(TryRecvError::Disconnected) => {
                panic!("Poller thread disconnected from main thread")
            }
        }

        if let Some(message) = network.recv() {
            process.process_message(message);
        } else {
            thread::yield_now()
        }
    })
}
