use std::sync::{Arc, Mutex};

use dbrb_rs::{
    config::Configuration,
    messages::{Acknowledged, Commit, Deliver, Message, Prepare},
    process::DbrbProcess,
    types::{
        basic::{Payload, ProcessId},
        certificate::Certificate,
        crypto_primitives::{payload_hash, Keypair, SigningKey},
        view::View,
    },
};
use rand_core::OsRng;

use crate::common::network::SilentNetwork;

pub(crate) type Deliveries = Arc<Mutex<Vec<Payload>>>;

pub(crate) fn signing_keys(n: usize) -> Vec<SigningKey> {
    let mut csprg = OsRng {};
    (0..n).map(|_| SigningKey::generate(&mut csprg)).collect()
}

pub(crate) fn id_of(key: &SigningKey) -> ProcessId {
    ProcessId::from(key.verifying_key())
}

pub(crate) fn view_of(keys: &[SigningKey]) -> View {
    keys.iter().map(id_of).collect()
}

pub(crate) fn configuration(key: &SigningKey) -> Configuration {
    Configuration::builder().me(key.clone()).build()
}

pub(crate) fn random_payload() -> Payload {
    Payload::new(rand::random::<[u8; 32]>().to_vec())
}

/// A process on a network that drops everything, with `current_view` installed, that records the payloads
/// it delivers.
pub(crate) fn silent_process(
    key: &SigningKey,
    current_view: View,
) -> (DbrbProcess<SilentNetwork>, Deliveries) {
    let deliveries: Deliveries = Arc::new(Mutex::new(Vec::new()));
    let recorder = deliveries.clone();
    let process = DbrbProcess::new(&configuration(key), SilentNetwork)
        .on_deliver(move |payload| recorder.lock().unwrap().push(payload.clone()));
    process.set_current_view(current_view);
    (process, deliveries)
}

pub(crate) fn prepare_from(key: &SigningKey, payload: &Payload, view: &View) -> Message {
    Prepare {
        sender: id_of(key),
        payload: payload.clone(),
        view: view.clone(),
        bootstrap_view: View::new(),
    }
    .into()
}

pub(crate) fn acknowledged_from(key: &SigningKey, payload: &Payload, view: &View) -> Message {
    Acknowledged {
        sender: id_of(key),
        payload_hash: payload_hash(payload),
        view: view.clone(),
        payload_signature: Keypair::new(key.clone()).sign_payload(payload, view),
    }
    .into()
}

pub(crate) fn certificate_from(keys: &[SigningKey], payload: &Payload, view: &View) -> Certificate {
    keys.iter()
        .map(|key| (id_of(key), Keypair::new(key.clone()).sign_payload(payload, view)))
        .collect()
}

pub(crate) fn commit_from(
    key: &SigningKey,
    payload: &Payload,
    certificate: Certificate,
    view: &View,
) -> Message {
    Commit {
        sender: id_of(key),
        payload_hash: payload_hash(payload),
        certificate,
        view: view.clone(),
    }
    .into()
}

pub(crate) fn deliver_from(key: &SigningKey, payload: &Payload, view: &View) -> Message {
    Deliver {
        sender: id_of(key),
        payload_hash: payload_hash(payload),
        view: view.clone(),
    }
    .into()
}
