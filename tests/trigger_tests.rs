//! Trigger scheduling integration tests.
//!
//! These tests verify that trigger actions are deferred, run in priority
//! order, and that perpetual re-triggering is cut off by the flush bound.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use effect_engine::{
    defer, Effect, EffectId, EngineConfig, Event, EventKind, EventSystem, Priority,
    ResolutionError, Trigger, TriggerAction, DEFAULT_MAX_TRIGGER_ITERATIONS,
};

// =============================================================================
// Test Event Types
// =============================================================================

#[derive(Clone, Debug)]
struct Moved {
    unit: u32,
}

impl EventKind for Moved {
    type Output = ();

    fn resolve(&self, _system: &EventSystem) {}
}

#[derive(Clone, Debug)]
struct Ping;

impl EventKind for Ping {
    type Output = ();

    fn resolve(&self, _system: &EventSystem) {}
}

// =============================================================================
// Test Effects
// =============================================================================

type Journal = Rc<RefCell<Vec<&'static str>>>;

/// Appends its label to the journal when any unit moves.
struct Note {
    label: &'static str,
    priority: Priority,
    journal: Journal,
}

impl Note {
    fn new(label: &'static str, priority: Priority, journal: &Journal) -> Self {
        Self {
            label,
            priority,
            journal: Rc::clone(journal),
        }
    }
}

impl Trigger<Moved> for Note {
    fn priority(&self) -> Priority {
        self.priority
    }

    fn should_trigger(&self, _system: &EventSystem, _event: &Event<Moved>) -> Option<TriggerAction> {
        let journal = Rc::clone(&self.journal);
        let label = self.label;
        Some(defer(move |_| journal.borrow_mut().push(label)))
    }
}

/// Moves another unit whenever `watch` moves.
struct Follow {
    watch: u32,
    mover: u32,
    runs: Rc<Cell<usize>>,
}

impl Trigger<Moved> for Follow {
    fn should_trigger(&self, _system: &EventSystem, event: &Event<Moved>) -> Option<TriggerAction> {
        if event.unit != self.watch {
            return None;
        }
        let runs = Rc::clone(&self.runs);
        let mover = self.mover;
        Some(defer(move |system| {
            runs.set(runs.get() + 1);
            system.resolve_payload(Moved { unit: mover });
        }))
    }
}

// =============================================================================
// Deferral and Ordering
// =============================================================================

/// Test that actions never run during the resolution that queued them.
#[test]
fn test_triggers_deferred_until_flush() {
    let system = EventSystem::new();
    let journal = Journal::default();
    system.register(Effect::trigger(Note::new("a", 0, &journal)));

    system.resolve_payload(Moved { unit: 1 });
    system.resolve_payload(Moved { unit: 2 });
    assert!(journal.borrow().is_empty());
    assert_eq!(system.pending_trigger_count(), 2);

    assert_eq!(system.flush_pending_triggers(), Ok(true));
    assert_eq!(*journal.borrow(), vec!["a", "a"]);
    assert!(!system.has_pending_triggers());
}

/// Test that a flush with nothing queued reports no work.
#[test]
fn test_empty_flush() {
    let system = EventSystem::new();
    assert_eq!(system.flush_pending_triggers(), Ok(false));
}

/// Test ordering by priority, then by enqueue order.
#[test]
fn test_priority_then_enqueue_order() {
    let system = EventSystem::new();
    let journal = Journal::default();
    system.register(Effect::trigger(Note::new("late", 5, &journal)));
    system.register(Effect::trigger(Note::new("first", -1, &journal)));
    system.register(Effect::trigger(Note::new("second", 0, &journal)));
    system.register(Effect::trigger(Note::new("third", 0, &journal)));

    system.resolve_payload(Moved { unit: 1 });
    system.flush_pending_triggers().unwrap();

    assert_eq!(*journal.borrow(), vec!["first", "second", "third", "late"]);
}

/// Test that the registration-time priority override orders actions.
#[test]
fn test_priority_override_orders_actions() {
    let system = EventSystem::new();
    let journal = Journal::default();
    system.register(Effect::trigger(Note::new("b", 0, &journal)));
    system.register(Effect::trigger(Note::new("a", 0, &journal)).with_priority(-3));

    system.resolve_payload(Moved { unit: 1 });
    system.flush_pending_triggers().unwrap();

    assert_eq!(*journal.borrow(), vec!["a", "b"]);
}

/// Test that actions queued during a batch wait for the next batch.
#[test]
fn test_new_actions_join_next_batch() {
    struct Urgent(Journal);

    impl Trigger<Ping> for Urgent {
        fn priority(&self) -> Priority {
            -100
        }

        fn should_trigger(&self, _system: &EventSystem, _event: &Event<Ping>) -> Option<TriggerAction> {
            let journal = Rc::clone(&self.0);
            Some(defer(move |_| journal.borrow_mut().push("urgent")))
        }
    }

    struct Relay(Journal);

    impl Trigger<Moved> for Relay {
        fn should_trigger(&self, _system: &EventSystem, _event: &Event<Moved>) -> Option<TriggerAction> {
            let journal = Rc::clone(&self.0);
            Some(defer(move |system| {
                journal.borrow_mut().push("relay");
                system.resolve_payload(Ping);
            }))
        }
    }

    let system = EventSystem::new();
    let journal = Journal::default();
    system.register(Effect::trigger(Urgent(Rc::clone(&journal))));
    system.register(Effect::trigger(Relay(Rc::clone(&journal))));
    system.register(Effect::trigger(Note::new("note", 10, &journal)));

    system.resolve_payload(Moved { unit: 1 });
    assert_eq!(system.flush_pending_triggers(), Ok(true));

    assert_eq!(*journal.borrow(), vec!["relay", "note", "urgent"]);
}

// =============================================================================
// Loop Detection
// =============================================================================

/// Test that two units following each other forever hit the bound.
#[test]
fn test_mutual_follow_detected() {
    let system = EventSystem::new();
    let runs = Rc::new(Cell::new(0));
    system.register(Effect::trigger(Follow { watch: 1, mover: 2, runs: Rc::clone(&runs) }));
    system.register(Effect::trigger(Follow { watch: 2, mover: 1, runs: Rc::clone(&runs) }));

    system.resolve_payload(Moved { unit: 1 });
    let result = system.flush_pending_triggers();

    assert_eq!(
        result,
        Err(ResolutionError::TriggerLoop { iterations: DEFAULT_MAX_TRIGGER_ITERATIONS })
    );
    // One action per batch
    assert_eq!(runs.get(), 128);
    assert!(system.has_pending_triggers());

    system.clear_pending_triggers();
    assert_eq!(system.flush_pending_triggers(), Ok(false));
}

/// Test that a chain shorter than the bound completes.
#[test]
fn test_finite_chain_completes() {
    let system = EventSystem::with_config(EngineConfig::new().with_max_trigger_iterations(3));
    let runs = Rc::new(Cell::new(0));
    system.register(Effect::trigger(Follow { watch: 1, mover: 2, runs: Rc::clone(&runs) }));
    system.register(Effect::trigger(Follow { watch: 2, mover: 3, runs: Rc::clone(&runs) }));
    system.register(Effect::trigger(Follow { watch: 3, mover: 4, runs: Rc::clone(&runs) }));

    system.resolve_payload(Moved { unit: 1 });
    assert_eq!(system.flush_pending_triggers(), Ok(true));
    assert_eq!(runs.get(), 3);
}

/// Test that the loop error message names the bound.
#[test]
fn test_loop_error_display() {
    let err = ResolutionError::TriggerLoop { iterations: 128 };
    assert!(err.to_string().contains("128"));
}

// =============================================================================
// Deregistration
// =============================================================================

/// Test that a trigger deregistered by an earlier one does not fire.
#[test]
fn test_deregister_during_trigger_phase() {
    struct Silence {
        target: Rc<Cell<Option<EffectId>>>,
    }

    impl Trigger<Moved> for Silence {
        fn should_trigger(&self, system: &EventSystem, _event: &Event<Moved>) -> Option<TriggerAction> {
            if let Some(id) = self.target.take() {
                system.deregister(id);
            }
            None
        }
    }

    let system = EventSystem::new();
    let journal = Journal::default();
    let target = Rc::new(Cell::new(None));
    system.register(Effect::trigger(Silence { target: Rc::clone(&target) }));
    let note = system.register(Effect::trigger(Note::new("note", 0, &journal)));
    target.set(Some(note));

    system.resolve_payload(Moved { unit: 1 });
    assert!(!system.has_pending_triggers());
    assert!(!system.is_registered(note));
}

/// Test that already-queued actions survive deregistration of their trigger.
#[test]
fn test_queued_action_outlives_trigger() {
    let system = EventSystem::new();
    let journal = Journal::default();
    let note = system.register(Effect::trigger(Note::new("note", 0, &journal)));

    system.resolve_payload(Moved { unit: 1 });
    system.deregister(note);
    system.resolve_payload(Moved { unit: 2 });

    system.flush_pending_triggers().unwrap();
    assert_eq!(*journal.borrow(), vec!["note"]);
}
