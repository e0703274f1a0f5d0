//! Event definitions.
//!
//! An event is a named, resolvable unit of domain action. Domain code
//! describes an event kind by implementing [`EventKind`] on a payload type
//! and hands `Event<P>` values to the session for resolution.
//!
//! ## Lifecycle
//!
//! An `Event` is created by a caller, resolved exactly once, and afterwards
//! carries its result and its position in the history tree. Everything else
//! is fixed: replacement effects that want a different outcome *branch* the
//! event into a new one instead of editing it.

use std::fmt;
use std::ops::Deref;

use im::HashSet as ImHashSet;

use crate::core::{EffectId, EventId, EventName};
use crate::engine::EventSystem;

/// Definition contract for an event kind.
///
/// The payload type carries the event's fields; the trait supplies its
/// name, validity check and intrinsic resolution.
///
/// ```
/// use effect_engine::{EventKind, EventSystem};
///
/// #[derive(Clone, Debug)]
/// struct Heal { amount: i64 }
///
/// impl EventKind for Heal {
///     type Output = i64;
///
///     fn is_valid(&self) -> bool {
///         self.amount > 0
///     }
///
///     fn resolve(&self, _system: &EventSystem) -> i64 {
///         self.amount
///     }
/// }
///
/// let system = EventSystem::new();
/// assert_eq!(system.resolve_payload(Heal { amount: 3 }), Some(3));
/// assert_eq!(system.resolve_payload(Heal { amount: 0 }), None);
/// ```
pub trait EventKind: Clone + fmt::Debug + 'static {
    /// Value produced by resolving the event.
    type Output: Clone + fmt::Debug + 'static;

    /// Name effects bind to.
    ///
    /// Derived from the type's declared name unless overridden. The derived
    /// name is only stable within one build, and two kinds with the same
    /// type name in different modules share it. Override this for kinds
    /// whose name is stored or compared across builds, or that would
    /// otherwise collide.
    fn name() -> EventName
    where
        Self: Sized,
    {
        EventName::of::<Self>()
    }

    /// Whether the event does anything at all.
    ///
    /// Invalid events are skipped entirely: no replacements, no triggers,
    /// no result and no history entry.
    fn is_valid(&self) -> bool {
        true
    }

    /// Perform the event's intrinsic effect.
    fn resolve(&self, system: &EventSystem) -> Self::Output;
}

/// An event instance: payload plus resolution bookkeeping.
#[derive(Clone)]
pub struct Event<P: EventKind> {
    payload: P,

    /// Replacement effects that already acted on this event's lineage.
    replaced_by: ImHashSet<EffectId>,

    /// Populated once resolution finishes.
    result: Option<P::Output>,

    /// Position in the history tree, if base resolution recorded it.
    id: Option<EventId>,
}

impl<P: EventKind> Event<P> {
    /// Wrap a payload in a fresh, unresolved event.
    pub fn new(payload: P) -> Self {
        Self {
            payload,
            replaced_by: ImHashSet::new(),
            result: None,
            id: None,
        }
    }

    /// The event's name.
    #[must_use]
    pub fn name(&self) -> EventName {
        P::name()
    }

    /// The event's payload.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consume the event, keeping only its payload.
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// The result of resolution, if the event has been resolved and produced one.
    #[must_use]
    pub fn result(&self) -> Option<&P::Output> {
        self.result.as_ref()
    }

    /// History-tree id, once base resolution has recorded the event.
    #[must_use]
    pub fn id(&self) -> Option<EventId> {
        self.id
    }

    /// Check whether a replacement effect already acted on this lineage.
    #[must_use]
    pub fn was_replaced_by(&self, effect: EffectId) -> bool {
        self.replaced_by.contains(&effect)
    }

    /// Iterate the replacement effects that already acted on this lineage.
    pub fn replaced_by(&self) -> impl Iterator<Item = EffectId> + '_ {
        self.replaced_by.iter().copied()
    }

    /// Produce a modified copy of this event.
    ///
    /// The copy keeps the applied-replacement set, so a replacement that
    /// produced this branch will not act on it again. Result and history
    /// id are not carried over.
    #[must_use]
    pub fn branch(&self, modify: impl FnOnce(&mut P)) -> Self {
        let mut payload = self.payload.clone();
        modify(&mut payload);
        Self {
            payload,
            replaced_by: self.replaced_by.clone(),
            result: None,
            id: None,
        }
    }

    /// Produce an event of a different kind in this event's lineage.
    #[must_use]
    pub fn branch_into<Q: EventKind>(&self, payload: Q) -> Event<Q> {
        Event {
            payload,
            replaced_by: self.replaced_by.clone(),
            result: None,
            id: None,
        }
    }

    pub(crate) fn mark_replaced(&mut self, effect: EffectId) {
        self.replaced_by.insert(effect);
    }

    pub(crate) fn set_result(&mut self, result: Option<P::Output>) {
        self.result = result;
    }

    pub(crate) fn set_id(&mut self, id: EventId) {
        self.id = Some(id);
    }
}

impl<P: EventKind> From<P> for Event<P> {
    fn from(payload: P) -> Self {
        Self::new(payload)
    }
}

impl<P: EventKind> Deref for Event<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.payload
    }
}

impl<P: EventKind> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &P::name())
            .field("payload", &self.payload)
            .field("result", &self.result)
            .field("id", &self.id)
            .field("replaced_by", &self.replaced_by.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Hit {
        value: i64,
    }

    impl EventKind for Hit {
        type Output = i64;

        fn resolve(&self, _system: &EventSystem) -> i64 {
            self.value
        }
    }

    #[derive(Clone, Debug)]
    struct Miss;

    impl EventKind for Miss {
        type Output = ();

        fn name() -> EventName {
            EventName::new("attack_missed")
        }

        fn resolve(&self, _system: &EventSystem) {}
    }

    #[test]
    fn test_default_name() {
        let event = Event::new(Hit { value: 1 });
        assert_eq!(event.name(), EventName::new("Hit"));
    }

    #[test]
    fn test_overridden_name() {
        assert_eq!(Event::new(Miss).name().as_str(), "attack_missed");
    }

    #[test]
    fn test_new_event_is_unresolved() {
        let event = Event::new(Hit { value: 4 });
        assert!(event.result().is_none());
        assert!(event.id().is_none());
        assert_eq!(event.replaced_by().count(), 0);
        assert_eq!(event.value, 4);
    }

    #[test]
    fn test_branch_preserves_applied_set() {
        let mut event = Event::new(Hit { value: 2 });
        event.mark_replaced(EffectId::new(9));
        event.set_result(Some(2));

        let branched = event.branch(|hit| hit.value *= 2);

        assert_eq!(branched.payload(), &Hit { value: 4 });
        assert!(branched.was_replaced_by(EffectId::new(9)));
        assert!(branched.result().is_none());
        // Original is untouched
        assert_eq!(event.value, 2);
    }

    #[test]
    fn test_branch_into_other_kind() {
        let mut event = Event::new(Hit { value: 2 });
        event.mark_replaced(EffectId::new(3));

        let miss = event.branch_into(Miss);
        assert!(miss.was_replaced_by(EffectId::new(3)));
        assert_eq!(miss.name().as_str(), "attack_missed");
    }

    #[test]
    fn test_branch_does_not_leak_back() {
        let event = Event::new(Hit { value: 2 });
        let mut branched = event.branch(|_| {});
        branched.mark_replaced(EffectId::new(1));

        assert!(!event.was_replaced_by(EffectId::new(1)));
    }

    mod combat {
        use super::*;

        #[derive(Clone, Debug)]
        pub struct Strike;

        impl EventKind for Strike {
            type Output = ();
            fn resolve(&self, _system: &EventSystem) {}
        }
    }

    mod spells {
        use super::*;

        #[derive(Clone, Debug)]
        pub struct Strike;

        impl EventKind for Strike {
            type Output = ();

            fn name() -> EventName {
                EventName::new("spells.Strike")
            }

            fn resolve(&self, _system: &EventSystem) {}
        }
    }

    #[test]
    fn test_override_separates_same_type_names() {
        assert_eq!(combat::Strike::name().as_str(), "Strike");
        assert_eq!(spells::Strike::name().as_str(), "spells.Strike");
        assert_ne!(combat::Strike::name(), spells::Strike::name());
    }
}
