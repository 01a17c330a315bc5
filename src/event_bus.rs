/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The thread that receives [events](crate::events) published by a process and fires the handlers
//! registered for them.

use crate::events::*;
use crate::logging::Logger;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::TryRecvError;
use std::thread;
use std::thread::JoinHandle;

pub(crate) type HandlerPtr<T> = Box<dyn Fn(&T) + Send>;

pub(crate) struct EventHandlers {
    pub(crate) broadcast_handlers: Vec<HandlerPtr<BroadcastEvent>>,
    pub(crate) acknowledge_handlers: Vec<HandlerPtr<AcknowledgeEvent>>,
    pub(crate) commit_handlers: Vec<HandlerPtr<CommitEvent>>,
    pub(crate) send_deliver_handlers: Vec<HandlerPtr<SendDeliverEvent>>,
    pub(crate) receive_prepare_handlers: Vec<HandlerPtr<ReceivePrepareEvent>>,
    pub(crate) receive_acknowledged_handlers: Vec<HandlerPtr<ReceiveAcknowledgedEvent>>,
    pub(crate) receive_commit_handlers: Vec<HandlerPtr<ReceiveCommitEvent>>,
    pub(crate) receive_deliver_handlers: Vec<HandlerPtr<ReceiveDeliverEvent>>,
    pub(crate) collect_certificate_handlers: Vec<HandlerPtr<CollectCertificateEvent>>,
    pub(crate) deliver_handlers: Vec<HandlerPtr<DeliverEvent>>,
    pub(crate) update_view_handlers: Vec<HandlerPtr<UpdateViewEvent>>,
}

impl EventHandlers {
    /// Collect the user-defined handlers, plus the default logging handlers if `log_events` is true.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        log_events: bool,
        broadcast_handler: Option<HandlerPtr<BroadcastEvent>>,
        acknowledge_handler: Option<HandlerPtr<AcknowledgeEvent>>,
        commit_handler: Option<HandlerPtr<CommitEvent>>,
        send_deliver_handler: Option<HandlerPtr<SendDeliverEvent>>,
        receive_prepare_handler: Option<HandlerPtr<ReceivePrepareEvent>>,
        receive_acknowledged_handler: Option<HandlerPtr<ReceiveAcknowledgedEvent>>,
        receive_commit_handler: Option<HandlerPtr<ReceiveCommitEvent>>,
        receive_deliver_handler: Option<HandlerPtr<ReceiveDeliverEvent>>,
        collect_certificate_handler: Option<HandlerPtr<CollectCertificateEvent>>,
        deliver_handler: Option<HandlerPtr<DeliverEvent>>,
        update_view_handler: Option<HandlerPtr<UpdateViewEvent>>,
    ) -> EventHandlers {
        fn handlers<T: Logger>(log_events: bool, user_handler: Option<HandlerPtr<T>>) -> Vec<HandlerPtr<T>> {
            let mut handlers = Vec::new();
            if log_events {
                handlers.push(T::get_logger());
            }
            handlers.extend(user_handler);
            handlers
        }

        EventHandlers {
            broadcast_handlers: handlers(log_events, broadcast_handler),
            acknowledge_handlers: handlers(log_events, acknowledge_handler),
            commit_handlers: handlers(log_events, commit_handler),
            send_deliver_handlers: handlers(log_events, send_deliver_handler),
            receive_prepare_handlers: handlers(log_events, receive_prepare_handler),
            receive_acknowledged_handlers: handlers(log_events, receive_acknowledged_handler),
            receive_commit_handlers: handlers(log_events, receive_commit_handler),
            receive_deliver_handlers: handlers(log_events, receive_deliver_handler),
            collect_certificate_handlers: handlers(log_events, collect_certificate_handler),
            deliver_handlers: handlers(log_events, deliver_handler),
            update_view_handlers: handlers(log_events, update_view_handler),
        }
    }

    /// Whether no handler at all is registered, in which case there is no need to run the event bus.
    pub(crate) fn is_empty(&self) -> bool {
        self.broadcast_handlers.is_empty()
            && self.acknowledge_handlers.is_empty()
            && self.commit_handlers.is_empty()
            && self.send_deliver_handlers.is_empty()
            && self.receive_prepare_handlers.is_empty()
            && self.receive_acknowledged_handlers.is_empty()
            && self.receive_commit_handlers.is_empty()
            && self.receive_deliver_handlers.is_empty()
            && self.collect_certificate_handlers.is_empty()
            && self.deliver_handlers.is_empty()
            && self.update_view_handlers.is_empty()
    }

    pub(crate) fn fire_handlers(&self, event: Event) {
        match event {
            Event::Broadcast(broadcast_event) =>
                self.broadcast_handlers.iter().for_each(|handler| handler(&broadcast_event)),

            Event::Acknowledge(acknowledge_event) =>
                self.acknowledge_handlers.iter().for_each(|handler| handler(&acknowledge_event)),

            Event::Commit(commit_event) =>
                self.commit_handlers.iter().for_each(|handler| handler(&commit_event)),

            Event::SendDeliver(send_deliver_event) =>
                self.send_deliver_handlers.iter().for_each(|handler| handler(&send_deliver_event)),

            Event::ReceivePrepare(receive_prepare_event) =>
                self.receive_prepare_handlers.iter().for_each(|handler| handler(&receive_prepare_event)),

            Event::ReceiveAcknowledged(receive_acknowledged_event) =>
                self.receive_acknowledged_handlers.iter().for_each(|handler| handler(&receive_acknowledged_event)),

            Event::ReceiveCommit(receive_commit_event) =>
                self.receive_commit_handlers.iter().for_each(|handler| handler(&receive_commit_event)),

            Event::ReceiveDeliver(receive_deliver_event) =>
                self.receive_deliver_handlers.iter().for_each(|handler| handler(&receive_deliver_event)),

            Event::CollectCertificate(collect_certificate_event) =>
                self.collect_certificate_handlers.iter().for_each(|handler| handler(&collect_certificate_event)),

            Event::Deliver(deliver_event) =>
                self.deliver_handlers.iter().for_each(|handler| handler(&deliver_event)),

            Event::UpdateView(update_view_event) =>
                self.update_view_handlers.iter().for_each(|handler| handler(&update_view_event)),
        }
    }
}

pub(crate) fn start_event_bus(
    event_handlers: EventHandlers,
    event_subscriber: Receiver<Event>,
    shutdown_signal: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) => return,
            Err(TryRecvError::Empty) => (),
            Err(TryRecvError::Disconnected) => {
                panic!("event_bus thread disconnected from main thread")
            }
        }

        match event_subscriber.try_recv() {
            Ok(event) => event_handlers.fire_handlers(event),
            Err(TryRecvError::Empty) => thread::yield_now(),
            // The process (event publisher) is dropped together with the replica; keep waiting for the
            // shutdown signal.
            Err(TryRecvError::Disconnected) => thread::yield_now(),
        }
    })
}
