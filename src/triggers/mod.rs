//! Deferred trigger scheduling.
//!
//! Triggers react to events, but never inside the resolution that fired
//! them. A trigger's `should_trigger` returns a [`TriggerAction`]; the
//! session queues it in a [`PendingTriggerQueue`] and runs it on the next
//! `flush_pending_triggers()`.
//!
//! ## Loop Detection
//!
//! Actions often resolve new events that queue further triggers. A flush
//! drains the queue in batches, and every batch's actions append to a
//! fresh queue. The session bounds the number of batches per flush; two
//! effects that keep re-triggering each other hit the bound and the flush
//! fails with [`ResolutionError::TriggerLoop`](crate::core::ResolutionError).

mod queue;

pub use queue::{defer, PendingTrigger, PendingTriggerQueue, TriggerAction};
