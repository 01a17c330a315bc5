/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Errors returned to the host of a [`DbrbProcess`](crate::process::DbrbProcess).
//!
//! Invalid protocol messages are not errors: they are dropped silently by the process. The variants
//! below cover the fallible operations a host calls directly.

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use crate::types::basic::ProcessId;

#[derive(Debug)]
pub enum DbrbError {
    /// The view supplier returned an empty view, and there are no bootstrap processes either.
    NoProcesses,

    /// A registered process has an expiration time earlier than the registration grace period.
    InvalidExpirationTime { process: ProcessId },

    /// Bytes that were expected to be an Ed25519 public key are not a valid point on the curve.
    InvalidProcessId,

    /// Error when trying to deserialize a message received from the network.
    Deserialization(std::io::Error),
}

impl Display for DbrbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DbrbError::NoProcesses => write!(f, "no DBRB processes"),
            DbrbError::InvalidExpirationTime { process } => {
                write!(f, "invalid expiration time for process {}", process)
            }
            DbrbError::InvalidProcessId => write!(f, "process id is not a valid Ed25519 public key"),
            DbrbError::Deserialization(err) => write!(f, "failed to deserialize message: {}", err),
        }
    }
}

impl Error for DbrbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DbrbError::Deserialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DbrbError {
    fn from(value: std::io::Error) -> Self {
        DbrbError::Deserialization(value)
    }
}

impl From<ed25519_dalek::SignatureError> for DbrbError {
    fn from(_: ed25519_dalek::SignatureError) -> Self {
        DbrbError::InvalidProcessId
    }
}
