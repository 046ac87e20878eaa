use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use pipeline_ids::Clock;
use pipeline_types::{CorrelationId, Event, EventPayload};

use crate::subscriber::{Inbox, Subscriber};
use crate::DEFAULT_SUBSCRIBER_CAPACITY;

/// Scopes every published event to one session's correlation id and stamps
/// a strictly increasing `seq` (C10, §4.8). Cloning shares the same
/// sequence counter and subscriber list — clone this, not the original,
/// when handing producers their publish handle.
#[derive(Clone)]
pub struct EventBus {
    correlation_id: CorrelationId,
    clock: Arc<dyn Clock>,
    seq: Arc<AtomicU64>,
    subscribers: Arc<Mutex<Vec<Arc<Inbox>>>>,
}

impl EventBus {
    pub fn new(correlation_id: CorrelationId, clock: Arc<dyn Clock>) -> Self {
        Self {
            correlation_id,
            clock,
            seq: Arc::new(AtomicU64::new(0)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Produces a fresh-sequence bus for a new session while keeping the
    /// existing subscriber list attached. Lets a host application subscribe
    /// once, before the first `start_listening`, and keep receiving every
    /// session's events (including the session's earliest ones) without
    /// racing session construction — subscribing only becomes possible once
    /// a session's bus exists, but `rebind` means that bus can be the same
    /// long-lived one the orchestrator hands out from actor start.
    pub fn rebind(&self, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            clock: self.clock.clone(),
            seq: Arc::new(AtomicU64::new(0)),
            subscribers: self.subscribers.clone(),
        }
    }

    /// Registers a new subscriber with the default (1024) bounded buffer.
    pub fn subscribe(&self) -> Subscriber {
        self.subscribe_with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    pub fn subscribe_with_capacity(&self, capacity: usize) -> Subscriber {
        let inbox = Arc::new(Inbox::new(capacity));
        self.subscribers.lock().unwrap().push(inbox.clone());
        Subscriber::new(inbox)
    }

    /// Stamps and fans out one event to every current subscriber, in
    /// publish order (§8 invariant 1). Never awaits: a full subscriber
    /// inbox drops per the policy in [`crate::subscriber::Inbox::push`]
    /// rather than blocking this call.
    pub fn publish(&self, payload: EventPayload) -> Event {
        let event = Event {
            v: Event::VERSION,
            correlation_id: self.correlation_id.clone(),
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            ts: self.clock.now_ms(),
            payload,
        };

        for inbox in self.subscribers.lock().unwrap().iter() {
            inbox.push(event.clone());
        }

        event
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}
