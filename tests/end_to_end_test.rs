//! Runs whole broadcast rounds among several processes over an in-memory message pool.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use dbrb_rs::{
    process::DbrbProcess,
    types::{
        basic::{Payload, ProcessId},
        crypto_primitives::{payload_hash, SigningKey},
        view::View,
    },
};
use log::LevelFilter;

mod common;

use crate::common::{
    logging::setup_logger,
    network::{MessagePool, PoolNetwork},
    process::{configuration, id_of, random_payload, signing_keys, view_of, Deliveries},
};

struct Cluster {
    pool: MessagePool,
    processes: HashMap<ProcessId, Arc<DbrbProcess<PoolNetwork>>>,
    deliveries: HashMap<ProcessId, Deliveries>,
}

impl Cluster {
    /// Create one process per key, with the current view of the process at index `i` being
    /// `current_views[i]`.
    fn new(keys: &[SigningKey], current_views: Vec<View>) -> Cluster {
        let pool = MessagePool::new();
        let mut processes = HashMap::new();
        let mut deliveries = HashMap::new();
        for (key, current_view) in keys.iter().zip(current_views) {
            let delivered: Deliveries = Arc::new(Mutex::new(Vec::new()));
            let recorder = delivered.clone();
            let process = DbrbProcess::new(&configuration(key), pool.network())
                .on_deliver(move |payload: &Payload| recorder.lock().unwrap().push(payload.clone()));
            process.set_current_view(current_view);
            processes.insert(id_of(key), Arc::new(process));
            deliveries.insert(id_of(key), delivered);
        }
        Cluster {
            pool,
            processes,
            deliveries,
        }
    }

    fn process(&self, key: &SigningKey) -> &Arc<DbrbProcess<PoolNetwork>> {
        &self.processes[&id_of(key)]
    }

    fn delivered(&self, key: &SigningKey) -> Vec<Payload> {
        self.deliveries[&id_of(key)].lock().unwrap().clone()
    }
}

#[test]
fn excluded_process_delivers_nothing_test() {
    setup_logger(LevelFilter::Debug);
    let keys = signing_keys(4);
    let (members, excluded) = (&keys[..3], &keys[3]);
    let view = view_of(members);
    let cluster = Cluster::new(&keys, vec![view.clone(), view.clone(), view.clone(), view_of(&keys)]);

    let payload = random_payload();
    let hash = cluster
        .process(&keys[0])
        .broadcast(payload.clone(), view.member_set())
        .unwrap();
    assert!(cluster.pool.pump(&cluster.processes) > 0);

    for member in members {
        assert_eq!(cluster.delivered(member), vec![payload.clone()]);
        assert!(cluster.process(member).has_delivered(&hash));
    }
    assert!(cluster.delivered(excluded).is_empty());
    assert!(cluster.process(excluded).broadcast_record(&hash).is_none());
    assert!(cluster.process(excluded).disseminations().is_empty());
}

#[test]
fn silent_member_is_tolerated_test() {
    setup_logger(LevelFilter::Debug);
    let keys = signing_keys(4);
    let view = view_of(&keys);
    let mut cluster = Cluster::new(&keys, vec![view.clone(); 4]);

    // The fourth member never processes anything: one fault out of four members.
    let silent = id_of(&keys[3]);
    cluster.processes.remove(&silent);

    let payload = random_payload();
    cluster
        .process(&keys[1])
        .broadcast(payload.clone(), view.member_set())
        .unwrap();
    cluster.pool.pump(&cluster.processes);

    for key in &keys[..3] {
        assert_eq!(cluster.delivered(key), vec![payload.clone()]);
    }
    assert!(cluster.delivered(&keys[3]).is_empty());
}

#[test]
fn concurrent_broadcasts_test() {
    let keys = signing_keys(4);
    let view = view_of(&keys);
    let cluster = Cluster::new(&keys, vec![view.clone(); 4]);

    // Every member broadcasts its own payload before any message is handed over.
    let payloads: Vec<Payload> = keys
        .iter()
        .map(|key| {
            let payload = random_payload();
            cluster
                .process(key)
                .broadcast(payload.clone(), view.member_set())
                .unwrap();
            payload
        })
        .collect();
    cluster.pool.pump(&cluster.processes);

    for key in &keys {
        let delivered = cluster.delivered(key);
        assert_eq!(delivered.len(), payloads.len());
        for payload in &payloads {
            assert_eq!(delivered.iter().filter(|d| *d == payload).count(), 1);
        }
    }

    // Replaying every message once more changes nothing.
    for key in &keys {
        for dissemination in cluster.process(key).disseminations() {
            for recipient in &dissemination.recipients {
                cluster.processes[recipient].process_message(dissemination.message.clone());
            }
        }
    }
    cluster.pool.pump(&cluster.processes);
    for key in &keys {
        assert_eq!(cluster.delivered(key).len(), payloads.len());
    }
    assert!(payloads
        .iter()
        .all(|payload| keys.iter().all(|key| cluster.process(key).has_delivered(&payload_hash(payload)))));
}
