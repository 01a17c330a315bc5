/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! [Trait definition](ViewSupplier) for the source of truth about which processes take part in DBRB.
//!
//! Deciding who belongs to a view (e.g., by reading registrations from chain state) is outside DBRB-rs.
//! Hosts provide that knowledge by implementing [`ViewSupplier`], which a
//! [`DbrbProcess`](crate::process::DbrbProcess) consults in
//! [`update_view`](crate::process::DbrbProcess::update_view) and
//! [`is_registration_required`](crate::process::DbrbProcess::is_registration_required).

use crate::types::{
    basic::{ProcessId, Timestamp},
    view::View,
};

pub trait ViewSupplier {
    /// The registered processes whose registrations are valid at `now`.
    fn view(&self, now: Timestamp) -> View;

    /// The trusted set of processes that are always part of the system, registered or not.
    fn bootstrap_view(&self) -> View;

    /// When the registration of `process` expires, or `None` if it is not registered.
    fn expiration_time(&self, process: &ProcessId) -> Option<Timestamp>;
}
