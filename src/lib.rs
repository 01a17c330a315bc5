/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A Rust implementation of Dynamic Byzantine Reliable Broadcast (DBRB).
//!
//! DBRB lets one process of a set of processes (a "view") broadcast an opaque payload such that all correct
//! members of the view either deliver the identical payload exactly once, or none of them do, despite
//! Byzantine members and despite the set of members changing over time.
//!
//! The entry point is the [`DbrbProcess`](process::DbrbProcess), which can be driven directly, or run on
//! background threads by a [`Replica`](replica::Replica). Processes talk to each other through a
//! user-provided implementation of [`Network`](networking::Network), and learn about views from a
//! user-provided implementation of [`ViewSupplier`](view_supplier::ViewSupplier).

pub mod broadcast_data;

pub mod config;

pub mod error;

pub mod events;

pub(crate) mod event_bus;

pub mod logging;

pub mod messages;

pub mod networking;

pub mod process;

pub mod quorum;

pub mod replica;

pub mod types;

pub mod view_supplier;
