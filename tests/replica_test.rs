use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use dbrb_rs::{
    config::Configuration,
    events::{CollectCertificateEvent, DeliverEvent},
    replica::{Replica, ReplicaSpec},
    types::basic::Payload,
};
use log::LevelFilter;

mod common;

use crate::common::{
    logging::setup_logger,
    network::{mock_network, ChannelNetwork},
    process::{id_of, random_payload, signing_keys, view_of},
};

#[test]
fn replica_test() {
    setup_logger(LevelFilter::Trace);

    // 1. Initialize test components.

    // 1.1. Create signing keys for 4 replicas, all members of the same view.
    let keys = signing_keys(4);
    let view = view_of(&keys);

    // 1.2. Create a mock network connecting the 4 replicas.
    let networks = mock_network(keys.iter().map(id_of));

    // 1.3. Start all replicas, counting deliveries and collected certificates.
    let deliveries: Arc<Mutex<Vec<Payload>>> = Arc::new(Mutex::new(Vec::new()));
    let certificates_collected = Arc::new(AtomicUsize::new(0));
    let deliver_events = Arc::new(AtomicUsize::new(0));
    let replicas: Vec<Replica<ChannelNetwork>> = keys
        .iter()
        .zip(networks)
        .map(|(key, network)| {
            let recorder = deliveries.clone();
            let certificate_counter = certificates_collected.clone();
            let deliver_event_counter = deliver_events.clone();
            ReplicaSpec::builder()
                .network(network)
                .configuration(
                    Configuration::builder()
                        .me(key.clone())
                        .log_events(true)
                        .build(),
                )
                .current_view(view.clone())
                .on_deliver(move |payload: &Payload| recorder.lock().unwrap().push(payload.clone()))
                .on_collect_certificate(move |_: &CollectCertificateEvent| {
                    certificate_counter.fetch_add(1, Ordering::SeqCst);
                })
                .on_deliver_event(move |_: &DeliverEvent| {
                    deliver_event_counter.fetch_add(1, Ordering::SeqCst);
                })
                .build()
                .start()
        })
        .collect();

    // 2. Broadcast a payload from the first replica.
    let payload = random_payload();
    log::debug!("Broadcasting a payload from the first replica.");
    replicas[0]
        .process()
        .broadcast(payload.clone(), view.member_set())
        .unwrap();

    // 3. Poll until every replica delivered it.
    let deadline = Instant::now() + Duration::from_secs(30);
    while deliveries.lock().unwrap().len() < keys.len() {
        assert!(Instant::now() < deadline, "replicas did not deliver in time");
        thread::sleep(Duration::from_millis(50));
    }
    while deliver_events.load(Ordering::SeqCst) < keys.len() {
        assert!(Instant::now() < deadline, "deliver events were not handled in time");
        thread::sleep(Duration::from_millis(50));
    }

    // Give stragglers a moment, then check that nobody delivered twice.
    thread::sleep(Duration::from_millis(200));
    assert_eq!(*deliveries.lock().unwrap(), vec![payload; keys.len()]);
    assert!(certificates_collected.load(Ordering::SeqCst) >= 1);

    // 4. Dropping the replicas shuts their threads down.
    drop(replicas);
}
