//! Typed fan-out of domain events to subscribers (C10, §4.8, §6.2).
//!
//! A single writer (the orchestrator) publishes [`EventPayload`]s; the bus
//! stamps `seq`/`ts`/`correlation_id` and fans each one out to every
//! subscriber in publish order. Each subscriber owns a bounded buffer; on
//! overflow the oldest non-critical (`error`/`final_report`) event is
//! dropped rather than blocking the publisher, per §5's "never unbounded
//! wait in producers".

mod bus;
mod subscriber;

pub use bus::EventBus;
pub use subscriber::Subscriber;

pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1024;
