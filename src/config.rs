/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! User-defined parameters of a DBRB process.
//!
//! The configuration can be defined using the builder pattern, for example:
//!
//! ```ignore
//! let configuration =
//!     Configuration::builder()
//!     .me(signing_key)
//!     .registration_grace_period(Duration::from_secs(3600))
//!     .log_events(true)
//!     .build()
//! ```

use std::time::Duration;

use ed25519_dalek::SigningKey;
use typed_builder::TypedBuilder;

/// Stores the user-defined parameters required to run a process, that is:
/// 1. The process's [keypair](ed25519_dalek::SigningKey). Its verifying key is the process's
///    [id](crate::types::basic::ProcessId).
/// 2. The registration grace period: how long before its registration expires a process should register
///    again.
/// 3. The "Log Events" flag, if set to "true" then logs should be printed.
///
/// ## Log Events
///
/// DBRB-rs logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages printed
/// onto a terminal or to a file, set up a [logging
/// implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
#[derive(Clone, TypedBuilder)]
#[builder(builder_method(doc =
    "
    Create a builder for building a [Configuration]. On the builder call the following methods to construct a valid [Configuration].

    Required:
    - `.me(...)`

    Optional:
    - `.registration_grace_period(...)`
    - `.log_events(...)`
"
))]
pub struct Configuration {
    #[builder(setter(doc = "Set the process's keypair, used to sign Acknowledged messages. Required."))]
    pub me: SigningKey,
    #[builder(default = Duration::ZERO, setter(doc = "Set how long before its registration expires a process should register again. Optional, defaults to zero."))]
    pub registration_grace_period: Duration,
    #[builder(default = false, setter(doc = "Enable logging? Optional, defaults to false."))]
    pub log_events: bool,
}
