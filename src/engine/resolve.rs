//! Event resolution, state-modifier folding and trigger flushing.
//!
//! ## Resolution order
//!
//! `resolve(event)`:
//!
//! 1. **Validity.** An invalid event is skipped: no result, no history.
//! 2. **Replacement.** Among the replacements bound to the event's name
//!    that have not yet acted on its lineage and whose `can_replace`
//!    holds, the one with the lowest (priority, registration order) is
//!    recorded on the event and its `resolve` output becomes the result.
//!    Nothing else runs for the replaced event.
//! 3. **Triggers.** Every trigger bound to the name is asked for an
//!    action; returned actions are queued, never run.
//! 4. **Base resolution.** The payload's own `resolve` runs with the event
//!    recorded as the current history node, so anything it resolves
//!    becomes its child.
//! 5. **Hooks.** Every hook bound to the name observes the finished event.
//!
//! No registry, queue or history borrow is held while effect or event code
//! runs, so every callback may re-enter the session.

use crate::core::{EventId, EventName, ResolutionError, Result, StateKey};
use crate::effects::{Candidate, EffectKind, Hook, Replacement, StateModifier, Trigger};
use crate::events::{Event, EventKind};

use super::EventSystem;

/// Keeps an event on the resolving stack for the duration of its base
/// resolution. If the body unwinds before `finish`, the event's history
/// node is discarded instead of being left open.
struct ResolvingGuard<'a> {
    system: &'a EventSystem,
    id: EventId,
    finished: bool,
}

impl<'a> ResolvingGuard<'a> {
    fn enter(system: &'a EventSystem, id: EventId) -> Self {
        system.resolving.borrow_mut().push(id);
        Self {
            system,
            id,
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.system.resolving.borrow_mut().pop();
        if self.finished {
            return;
        }
        if let Ok(mut history) = self.system.history.try_borrow_mut() {
            tracing::debug!(event = %self.id, "discarding unfinished event");
            history.discard(self.id);
        }
    }
}

impl EventSystem {
    /// Resolve an event against the registered effects.
    ///
    /// Returns the event's final value, or `None` if the event was invalid
    /// or a replacement suppressed it. The same value is stored in the
    /// event's result slot.
    pub fn resolve<P: EventKind>(&self, event: &mut Event<P>) -> Option<P::Output> {
        let name = P::name();

        if !event.payload().is_valid() {
            tracing::trace!(event = %name, "skipping invalid event");
            return None;
        }

        if let Some(output) = self.apply_replacement(event, name) {
            return output;
        }

        self.queue_triggers(event, name);
        let output = self.resolve_base(event, name);
        self.run_hooks(event, name);
        Some(output)
    }

    /// Wrap a payload in a fresh event and resolve it.
    pub fn resolve_payload<P: EventKind>(&self, payload: P) -> Option<P::Output> {
        self.resolve(&mut Event::new(payload))
    }

    /// Returns `Some(output)` if a replacement took over the event.
    fn apply_replacement<P: EventKind>(
        &self,
        event: &mut Event<P>,
        name: EventName,
    ) -> Option<Option<P::Output>> {
        let candidates = self
            .registry
            .borrow()
            .candidates::<dyn Replacement<P>>(EffectKind::Replacement, name.as_str());
        if candidates.is_empty() {
            return None;
        }

        let chosen = {
            let view: &Event<P> = event;
            candidates
                .into_iter()
                .filter(|c| !view.was_replaced_by(c.id))
                .filter(|c| self.is_registered(c.id))
                .filter(|c| c.handler.can_replace(self, view))
                .min_by_key(Candidate::order_key)?
        };

        tracing::debug!(
            event = %name,
            effect = %chosen.id,
            priority = chosen.priority,
            "replacement applied"
        );

        event.mark_replaced(chosen.id);
        let output = chosen.handler.resolve(self, event);
        event.set_result(output.clone());
        Some(output)
    }

    fn queue_triggers<P: EventKind>(&self, event: &Event<P>, name: EventName) {
        let triggers = self
            .registry
            .borrow()
            .candidates::<dyn Trigger<P>>(EffectKind::Trigger, name.as_str());

        for trigger in triggers {
            // An earlier trigger may have deregistered this one
            if !self.is_registered(trigger.id) {
                continue;
            }
            if let Some(action) = trigger.handler.should_trigger(self, event) {
                tracing::trace!(event = %name, effect = %trigger.id, "trigger queued");
                self.pending
                    .borrow_mut()
                    .push(trigger.priority, trigger.id, action);
            }
        }
    }

    fn resolve_base<P: EventKind>(&self, event: &mut Event<P>, name: EventName) -> P::Output {
        let node = if self.config.record_history {
            let parent = self.current_event();
            let id = self.history.borrow_mut().open(name, parent);
            event.set_id(id);
            Some(id)
        } else {
            None
        };

        tracing::trace!(event = %name, "base resolution");
        let guard = node.map(|id| ResolvingGuard::enter(self, id));
        let output = event.payload().resolve(self);
        if let Some(guard) = guard {
            guard.finish();
        }

        event.set_result(Some(output.clone()));
        if let Some(id) = node {
            self.history.borrow_mut().close(id, event.clone());
        }
        output
    }

    fn run_hooks<P: EventKind>(&self, event: &Event<P>, name: EventName) {
        let mut hooks = self
            .registry
            .borrow()
            .candidates::<dyn Hook<P>>(EffectKind::Hook, name.as_str());
        hooks.sort_by_key(Candidate::order_key);

        for hook in hooks {
            if self.is_registered(hook.id) {
                hook.handler.on_event(self, event);
            }
        }
    }

    /// Compute the effective value of a modifiable attribute or method.
    ///
    /// Folds every state modifier registered under `key` over `base`, in
    /// (priority, registration order). A modifier only applies when its
    /// `should_modify` holds for the value computed so far. Modifiers
    /// registered during the fold are not picked up; modifiers
    /// deregistered during it are skipped.
    pub fn state_value<O, R, V>(&self, key: StateKey, owner: &O, request: &R, base: V) -> V
    where
        O: ?Sized + 'static,
        R: 'static,
        V: 'static,
    {
        let mut modifiers = self
            .registry
            .borrow()
            .candidates::<dyn StateModifier<O, R, V>>(EffectKind::StateModifier, key.as_str());
        if modifiers.is_empty() {
            return base;
        }
        modifiers.sort_by_key(Candidate::order_key);

        let mut value = base;
        for modifier in modifiers {
            if !self.is_registered(modifier.id) {
                continue;
            }
            if modifier.handler.should_modify(self, owner, request, &value) {
                value = modifier.handler.modify(self, owner, request, value);
            }
        }
        value
    }

    /// Run queued trigger actions until the queue stays empty.
    ///
    /// Each round swaps the queue out for an empty one and runs the taken
    /// batch in (priority, queue order); actions that queue further
    /// triggers feed the next round. Returns whether any action ran.
    ///
    /// # Errors
    ///
    /// [`ResolutionError::TriggerLoop`] if actions are still queued after
    /// `max_trigger_iterations` rounds. The remaining actions stay queued.
    pub fn flush_pending_triggers(&self) -> Result<bool> {
        let limit = self.config.max_trigger_iterations;
        let mut worked = false;

        for iteration in 0..limit {
            let batch = self.pending.borrow_mut().take_batch();
            if batch.is_empty() {
                return Ok(worked);
            }

            worked = true;
            tracing::debug!(iteration, actions = batch.len(), "running trigger batch");
            for pending in batch {
                pending.run(self);
            }
        }

        if !self.has_pending_triggers() {
            return Ok(worked);
        }

        tracing::warn!(iterations = limit, "trigger loop detected");
        Err(ResolutionError::TriggerLoop { iterations: limit })
    }
}
