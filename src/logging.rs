/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the replica's
//! [config](crate::config::Configuration).
//!
//! DBRB-rs logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages printed onto
//! a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet is
//! how a [ReceiveAcknowledged](crate::events::ReceiveAcknowledgedEvent) is printed:
//!
//! ```text
//! ReceiveAcknowledged, 1701329264, Id5u7f6, fNGCJyk, 4
//! ```
//!
//! In the snippet:
//! - The third value is the first seven characters of the Base64 encoding of the id of the sender.
//! - The fourth value is the first seven characters of the Base64 encoding of the payload hash.
//! - The fifth value is the number of members of the view the message was sent under.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use std::time::SystemTime;

use crate::events::*;

// Names of each event in PascalCase for printing:
pub const BROADCAST: &str = "Broadcast";
pub const ACKNOWLEDGE: &str = "Acknowledge";
pub const COMMIT: &str = "Commit";
pub const SEND_DELIVER: &str = "SendDeliver";

pub const RECEIVE_PREPARE: &str = "ReceivePrepare";
pub const RECEIVE_ACKNOWLEDGED: &str = "ReceiveAcknowledged";
pub const RECEIVE_COMMIT: &str = "ReceiveCommit";
pub const RECEIVE_DELIVER: &str = "ReceiveDeliver";

pub const COLLECT_CERTIFICATE: &str = "CollectCertificate";
pub const DELIVER: &str = "Deliver";
pub const UPDATE_VIEW: &str = "UpdateView";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> Box<dyn Fn(&Self) + Send>;
}

impl Logger for BroadcastEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |broadcast_event: &BroadcastEvent| {
            log::info!(
                "{}, {}, {}, {}",
                BROADCAST,
                secs_since_unix_epoch(broadcast_event.timestamp),
                first_seven_base64_chars(&broadcast_event.payload_hash.bytes()),
                broadcast_event.view.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for AcknowledgeEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |acknowledge_event: &AcknowledgeEvent| {
            log::info!(
                "{}, {}, {}, {}",
                ACKNOWLEDGE,
                secs_since_unix_epoch(acknowledge_event.timestamp),
                first_seven_base64_chars(&acknowledge_event.payload_hash.bytes()),
                acknowledge_event.view.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for CommitEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |commit_event: &CommitEvent| {
            log::info!(
                "{}, {}, {}, {}",
                COMMIT,
                secs_since_unix_epoch(commit_event.timestamp),
                first_seven_base64_chars(&commit_event.payload_hash.bytes()),
                commit_event.view.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for SendDeliverEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |send_deliver_event: &SendDeliverEvent| {
            log::info!(
                "{}, {}, {}, {}",
                SEND_DELIVER,
                secs_since_unix_epoch(send_deliver_event.timestamp),
                first_seven_base64_chars(&send_deliver_event.recipient.bytes()),
                first_seven_base64_chars(&send_deliver_event.payload_hash.bytes())
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceivePrepareEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |receive_prepare_event: &ReceivePrepareEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                RECEIVE_PREPARE,
                secs_since_unix_epoch(receive_prepare_event.timestamp),
                first_seven_base64_chars(&receive_prepare_event.origin.bytes()),
                first_seven_base64_chars(&receive_prepare_event.payload_hash.bytes()),
                receive_prepare_event.view.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceiveAcknowledgedEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |receive_acknowledged_event: &ReceiveAcknowledgedEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                RECEIVE_ACKNOWLEDGED,
                secs_since_unix_epoch(receive_acknowledged_event.timestamp),
                first_seven_base64_chars(&receive_acknowledged_event.origin.bytes()),
                first_seven_base64_chars(&receive_acknowledged_event.payload_hash.bytes()),
                receive_acknowledged_event.view.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceiveCommitEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |receive_commit_event: &ReceiveCommitEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                RECEIVE_COMMIT,
                secs_since_unix_epoch(receive_commit_event.timestamp),
                first_seven_base64_chars(&receive_commit_event.origin.bytes()),
                first_seven_base64_chars(&receive_commit_event.payload_hash.bytes()),
                receive_commit_event.view.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceiveDeliverEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |receive_deliver_event: &ReceiveDeliverEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                RECEIVE_DELIVER,
                secs_since_unix_epoch(receive_deliver_event.timestamp),
                first_seven_base64_chars(&receive_deliver_event.origin.bytes()),
                first_seven_base64_chars(&receive_deliver_event.payload_hash.bytes()),
                receive_deliver_event.view.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for CollectCertificateEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |collect_certificate_event: &CollectCertificateEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                COLLECT_CERTIFICATE,
                secs_since_unix_epoch(collect_certificate_event.timestamp),
                first_seven_base64_chars(&collect_certificate_event.payload_hash.bytes()),
                collect_certificate_event.view.len(),
                collect_certificate_event.certificate.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for DeliverEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |deliver_event: &DeliverEvent| {
            log::info!(
                "{}, {}, {}, {}",
                DELIVER,
                secs_since_unix_epoch(deliver_event.timestamp),
                first_seven_base64_chars(&deliver_event.payload_hash.bytes()),
                deliver_event.payload.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for UpdateViewEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |update_view_event: &UpdateViewEvent| {
            log::info!(
                "{}, {}, {}, {}",
                UPDATE_VIEW,
                secs_since_unix_epoch(update_view_event.timestamp),
                update_view_event.current_view,
                update_view_event.bootstrap_view
            )
        };
        Box::new(logger)
    }
}

/// Get a more readable representation of a byte sequence by base64-encoding it and taking the first 7
/// characters.
pub fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
