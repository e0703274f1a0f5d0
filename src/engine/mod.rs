//! The resolution session.
//!
//! An [`EventSystem`] owns one effect registry, one pending-trigger queue
//! and one history tree. It is the only thing domain code talks to:
//!
//! - `resolve(event)` / `resolve_payload(payload)`
//! - `register(effect)` / `deregister(id)`
//! - `flush_pending_triggers()` / `has_pending_triggers()`
//! - `state_value(key, owner, request, base)` for modifiable values
//! - history queries (`last`, `descendants`, `any_descendant`, ...)
//!
//! ## Sessions are explicit
//!
//! There is no process-wide session. Each game, simulation or test creates
//! its own `EventSystem` and passes `&EventSystem` down to whatever needs
//! it; every effect callback and event body receives the session as an
//! argument. Resolution is re-entrant: effects call back into the same
//! session from inside a resolution, on the same call stack.
//!
//! The session uses `Rc`/`RefCell` internally and is therefore neither
//! `Send` nor `Sync`: one session lives on one thread. Independent sessions
//! on different threads share nothing.

mod resolve;

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{EffectId, EngineConfig, EventId, EventName, SourceId};
use crate::effects::{Effect, EffectKind, EffectRegistry};
use crate::events::{Event, EventKind, HistoryTree};
use crate::triggers::PendingTriggerQueue;

/// One isolated resolution session.
pub struct EventSystem {
    config: EngineConfig,
    registry: RefCell<EffectRegistry>,
    pending: RefCell<PendingTriggerQueue>,
    history: RefCell<HistoryTree>,

    /// Events whose base resolution is in progress, innermost last.
    resolving: RefCell<Vec<EventId>>,
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSystem {
    /// Create a session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a session with an explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            registry: RefCell::new(EffectRegistry::new()),
            pending: RefCell::new(PendingTriggerQueue::new()),
            history: RefCell::new(HistoryTree::new()),
            resolving: RefCell::new(Vec::new()),
        }
    }

    /// The session's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // === Registration ===

    /// Register an effect, returns its ID.
    ///
    /// The effect takes part in every resolution or query that starts
    /// after this call.
    pub fn register(&self, effect: Effect) -> EffectId {
        let kind = effect.kind();
        let id = self.registry.borrow_mut().register(effect);
        tracing::debug!(effect = %id, kind = %kind, "registered effect");
        id
    }

    /// Remove an effect by identity.
    ///
    /// Removing an effect that is not registered is a no-op and returns
    /// `false`. Removal takes effect immediately, including for
    /// resolutions currently in progress.
    pub fn deregister(&self, id: EffectId) -> bool {
        let removed = self.registry.borrow_mut().deregister(id);
        if removed {
            tracing::debug!(effect = %id, "deregistered effect");
        }
        removed
    }

    /// Remove every effect owned by `source`. Returns how many were removed.
    pub fn deregister_source(&self, source: SourceId) -> usize {
        let removed = self.registry.borrow_mut().remove_for_source(source);
        tracing::debug!(source = %source, removed, "deregistered source effects");
        removed
    }

    /// Registered effects owned by `source`, in registration order.
    #[must_use]
    pub fn effects_for_source(&self, source: SourceId) -> Vec<EffectId> {
        self.registry.borrow().effects_for_source(source)
    }

    /// Check whether an effect is currently registered.
    #[must_use]
    pub fn is_registered(&self, id: EffectId) -> bool {
        self.registry.borrow().contains(id)
    }

    /// Kind of a registered effect.
    #[must_use]
    pub fn effect_kind(&self, id: EffectId) -> Option<EffectKind> {
        self.registry.borrow().kind_of(id)
    }

    /// Number of registered effects.
    #[must_use]
    pub fn effect_count(&self) -> usize {
        self.registry.borrow().len()
    }

    // === Pending Triggers ===

    /// Check whether trigger actions are waiting for a flush.
    #[must_use]
    pub fn has_pending_triggers(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Number of trigger actions waiting for a flush.
    #[must_use]
    pub fn pending_trigger_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Drop every queued trigger action without running it.
    pub fn clear_pending_triggers(&self) {
        self.pending.borrow_mut().clear();
    }

    // === History ===

    /// The event whose base resolution is currently running, if any.
    #[must_use]
    pub fn current_event(&self) -> Option<EventId> {
        self.resolving.borrow().last().copied()
    }

    /// Most recently resolved event of kind `P` in this session.
    #[must_use]
    pub fn last<P: EventKind>(&self) -> Option<Rc<Event<P>>> {
        self.history.borrow().last::<P>()
    }

    /// A recorded event by id, if it is of kind `P`.
    #[must_use]
    pub fn get<P: EventKind>(&self, id: EventId) -> Option<Rc<Event<P>>> {
        self.history.borrow().get::<P>(id)
    }

    /// Name of a recorded or in-flight event.
    #[must_use]
    pub fn event_name(&self, id: EventId) -> Option<EventName> {
        self.history.borrow().name(id)
    }

    /// The event `id` was resolved inside of, if any.
    #[must_use]
    pub fn parent_of(&self, id: EventId) -> Option<EventId> {
        self.history.borrow().parent(id)
    }

    /// Top-level events, in the order they started resolving.
    #[must_use]
    pub fn root_events(&self) -> Vec<EventId> {
        self.history.borrow().roots()
    }

    /// Events resolved directly inside `id`, in the order they started.
    #[must_use]
    pub fn children_of(&self, id: EventId) -> Vec<EventId> {
        self.history.borrow().children(id)
    }

    /// All events of kind `P` resolved anywhere inside `id`.
    #[must_use]
    pub fn descendants<P: EventKind>(&self, id: EventId) -> Vec<Rc<Event<P>>> {
        self.history.borrow().descendants::<P>(id)
    }

    /// Check whether an event of kind `P` was resolved anywhere inside `id`.
    #[must_use]
    pub fn any_descendant<P: EventKind>(&self, id: EventId) -> bool {
        self.history.borrow().any_descendant::<P>(id)
    }

    /// Number of events recorded in history.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    /// Forget recorded history.
    ///
    /// Events still resolving keep their nodes so they can finish
    /// recording; everything else is dropped.
    pub fn clear_history(&self) {
        let in_flight = self.resolving.borrow().clone();
        self.history.borrow_mut().clear_except(&in_flight);
        tracing::debug!(in_flight = in_flight.len(), "cleared history");
    }
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("config", &self.config)
            .field("effects", &self.effect_count())
            .field("pending_triggers", &self.pending_trigger_count())
            .field("history", &self.history_len())
            .finish()
    }
}
