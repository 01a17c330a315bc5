use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    sync::{
        mpsc::{self, Receiver, Sender, TryRecvError},
        Arc, Mutex,
    },
};

use dbrb_rs::{
    messages::Message, networking::Network, process::DbrbProcess, types::basic::ProcessId,
};

/// A network that drops everything. Tests that use it inspect the process's dissemination log instead.
#[derive(Clone)]
pub(crate) struct SilentNetwork;

impl Network for SilentNetwork {
    fn disseminate(&mut self, _: Message, _: &BTreeSet<ProcessId>) {}

    fn send(&mut self, _: ProcessId, _: Message) {}

    fn recv(&mut self) -> Option<Message> {
        None
    }
}

/// A network whose messages wait in a single shared queue until the test [pumps](MessagePool::pump) them.
#[derive(Clone)]
pub(crate) struct PoolNetwork {
    queue: Arc<Mutex<VecDeque<(ProcessId, Vec<u8>)>>>,
}

impl Network for PoolNetwork {
    fn disseminate(&mut self, message: Message, recipients: &BTreeSet<ProcessId>) {
        let bytes = message.to_bytes();
        let mut queue = self.queue.lock().unwrap();
        for recipient in recipients {
            queue.push_back((*recipient, bytes.clone()));
        }
    }

    fn send(&mut self, recipient: ProcessId, message: Message) {
        self.queue
            .lock()
            .unwrap()
            .push_back((recipient, message.to_bytes()));
    }

    fn recv(&mut self) -> Option<Message> {
        None
    }
}

/// The shared queue behind every [PoolNetwork] created from it.
pub(crate) struct MessagePool {
    queue: Arc<Mutex<VecDeque<(ProcessId, Vec<u8>)>>>,
}

impl MessagePool {
    pub(crate) fn new() -> MessagePool {
        MessagePool {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub(crate) fn network(&self) -> PoolNetwork {
        PoolNetwork {
            queue: self.queue.clone(),
        }
    }

    /// Hand queued messages, in FIFO order, to the processes they are addressed to until the queue is
    /// empty. Messages addressed to processes not in `processes` are dropped. Returns how many messages
    /// were handed over.
    pub(crate) fn pump(&self, processes: &HashMap<ProcessId, Arc<DbrbProcess<PoolNetwork>>>) -> usize {
        let mut handed_over = 0;
        loop {
            // The lock must be released before calling into a process, which pushes onto the queue.
            let next = self.queue.lock().unwrap().pop_front();
            let Some((recipient, bytes)) = next else {
                return handed_over;
            };
            if let Some(process) = processes.get(&recipient) {
                let message = Message::from_bytes(&bytes).unwrap();
                process.process_message(message);
                handed_over += 1;
            }
        }
    }
}

/// A mock network stub which passes messages from and to threads using channels.
#[derive(Clone)]
pub(crate) struct ChannelNetwork {
    all_peers: HashMap<ProcessId, Sender<Message>>,
    inbox: Arc<Mutex<Receiver<Message>>>,
}

impl Network for ChannelNetwork {
    fn disseminate(&mut self, message: Message, recipients: &BTreeSet<ProcessId>) {
        for recipient in recipients {
            if let Some(peer) = self.all_peers.get(recipient) {
                let _ = peer.send(message.clone());
            }
        }
    }

    fn send(&mut self, recipient: ProcessId, message: Message) {
        if let Some(peer) = self.all_peers.get(&recipient) {
            let _ = peer.send(message);
        }
    }

    fn recv(&mut self) -> Option<Message> {
        match self.inbox.lock().unwrap().try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => panic!(),
        }
    }
}

pub(crate) fn mock_network(peers: impl Iterator<Item = ProcessId>) -> Vec<ChannelNetwork> {
    let mut all_peers = HashMap::new();
    let inboxes: Vec<Receiver<Message>> = peers
        .map(|peer| {
            let (sender, receiver) = mpsc::channel();
            all_peers.insert(peer, sender);
            receiver
        })
        .collect();

    inboxes
        .into_iter()
        .map(|inbox| ChannelNetwork {
            all_peers: all_peers.clone(),
            inbox: Arc::new(Mutex::new(inbox)),
        })
        .collect()
}
