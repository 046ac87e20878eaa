use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use pipeline_types::{Event, EventPayload};
use tokio::sync::Notify;

fn is_critical(payload: &EventPayload) -> bool {
    matches!(payload, EventPayload::Error { .. } | EventPayload::FinalReport { .. })
}

/// One subscriber's bounded inbox. Shared between the bus (which pushes) and
/// the subscriber handle held by the reader (which pops).
pub(crate) struct Inbox {
    capacity: usize,
    buffer: Mutex<VecDeque<Event>>,
    notify: Notify,
    dropped_since_last: AtomicU32,
}

impl Inbox {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            notify: Notify::new(),
            dropped_since_last: AtomicU32::new(0),
        }
    }

    /// Pushes `event`, applying the drop-oldest-non-critical backpressure
    /// policy when the inbox is at capacity (§4.8).
    pub(crate) fn push(&self, event: Event) {
        let mut buffer = self.buffer.lock().unwrap();

        if buffer.len() >= self.capacity {
            let evict_at = buffer.iter().position(|queued| !is_critical(&queued.payload));

            match evict_at {
                Some(index) => {
                    buffer.remove(index);
                    self.dropped_since_last.fetch_add(1, Ordering::Relaxed);
                }
                None if !is_critical(&event.payload) => {
                    // Every queued event is critical and this one isn't:
                    // drop the incoming event rather than grow unboundedly
                    // or evict a protected one.
                    self.dropped_since_last.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                None => {
                    // Incoming is critical and the inbox is full of other
                    // critical events: grow past capacity rather than lose it.
                }
            }
        }

        buffer.push_back(event);
        drop(buffer);
        self.notify.notify_one();
    }
}

/// A reader's handle onto one subscription. Delivery order matches publish
/// order (§5, §8 invariant 1); only the oldest non-critical entries are ever
/// dropped under backpressure. `Clone` shares the same underlying inbox —
/// useful when one task owns the `recv()` loop but another needs to read
/// `take_dropped_count()`/`queued_len()` without competing for events.
#[derive(Clone)]
pub struct Subscriber {
    inbox: std::sync::Arc<Inbox>,
}

impl Subscriber {
    pub(crate) fn new(inbox: std::sync::Arc<Inbox>) -> Self {
        Self { inbox }
    }

    /// Awaits the next event for this subscriber.
    pub async fn recv(&self) -> Event {
        loop {
            if let Some(event) = self.inbox.buffer.lock().unwrap().pop_front() {
                return event;
            }
            self.inbox.notify.notified().await;
        }
    }

    /// Best-effort, non-blocking read: returns `None` if nothing is queued.
    pub fn try_recv(&self) -> Option<Event> {
        self.inbox.buffer.lock().unwrap().pop_front()
    }

    /// Number of non-critical events dropped for this subscriber since the
    /// last call, resetting the counter. The orchestrator folds this into
    /// the next `status` event's `dropped_since_last` field.
    pub fn take_dropped_count(&self) -> u32 {
        self.inbox.dropped_since_last.swap(0, Ordering::Relaxed)
    }

    pub fn queued_len(&self) -> usize {
        self.inbox.buffer.lock().unwrap().len()
    }
}
