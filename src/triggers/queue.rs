//! Pending-trigger queue.
//!
//! Trigger effects never run inside the resolution that fired them. Their
//! actions are queued here with the trigger's priority and drained in
//! batches by the session's flush.

use crate::core::{EffectId, Priority};
use crate::engine::EventSystem;

/// A deferred zero-argument reaction produced by a trigger.
pub type TriggerAction = Box<dyn FnOnce(&EventSystem)>;

/// Wrap a closure as a [`TriggerAction`].
///
/// Saves spelling out the closure's argument type at each call site.
pub fn defer(action: impl FnOnce(&EventSystem) + 'static) -> TriggerAction {
    Box::new(action)
}

/// A queued trigger action.
pub struct PendingTrigger {
    priority: Priority,
    effect: EffectId,
    action: TriggerAction,
}

impl PendingTrigger {
    /// Priority of the trigger that queued this action.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// The trigger effect that queued this action.
    #[must_use]
    pub fn effect(&self) -> EffectId {
        self.effect
    }

    /// Run the action.
    pub fn run(self, system: &EventSystem) {
        (self.action)(system);
    }
}

impl std::fmt::Debug for PendingTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTrigger")
            .field("priority", &self.priority)
            .field("effect", &self.effect)
            .finish_non_exhaustive()
    }
}

/// Queue of trigger actions awaiting a flush.
///
/// Insertion order is kept so that equal priorities run in the order they
/// were queued.
#[derive(Debug, Default)]
pub struct PendingTriggerQueue {
    entries: Vec<PendingTrigger>,
}

impl PendingTriggerQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action.
    pub fn push(&mut self, priority: Priority, effect: EffectId, action: TriggerAction) {
        self.entries.push(PendingTrigger {
            priority,
            effect,
            action,
        });
    }

    /// Number of queued actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every queued action without running it.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Swap out the queued actions for an empty queue and return them in
    /// run order: priority ascending, then queue order.
    pub fn take_batch(&mut self) -> Vec<PendingTrigger> {
        let mut batch = std::mem::take(&mut self.entries);
        // Stable sort keeps queue order within a priority
        batch.sort_by_key(PendingTrigger::priority);
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> TriggerAction {
        defer(|_| {})
    }

    #[test]
    fn test_queue_new() {
        let queue = PendingTriggerQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_take_batch_orders_by_priority_then_queue_order() {
        let mut queue = PendingTriggerQueue::new();
        queue.push(2, EffectId::new(0), noop());
        queue.push(1, EffectId::new(1), noop());
        queue.push(2, EffectId::new(2), noop());
        queue.push(-1, EffectId::new(3), noop());
        queue.push(1, EffectId::new(4), noop());

        let batch = queue.take_batch();
        let order: Vec<u64> = batch.iter().map(|p| p.effect().raw()).collect();
        assert_eq!(order, vec![3, 1, 4, 0, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut queue = PendingTriggerQueue::new();
        queue.push(0, EffectId::new(0), noop());
        queue.push(0, EffectId::new(1), noop());
        assert_eq!(queue.len(), 2);

        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.take_batch().is_empty());
    }

    #[test]
    fn test_run_action() {
        use std::cell::Cell;
        use std::rc::Rc;

        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let mut queue = PendingTriggerQueue::new();
        queue.push(0, EffectId::new(0), defer(move |_| flag.set(true)));

        let system = EventSystem::new();
        for pending in queue.take_batch() {
            pending.run(&system);
        }
        assert!(ran.get());
    }
}
