//! Effect definitions.
//!
//! An effect is a registered behaviour that intercepts or observes events
//! and values. There are exactly four kinds, each with its own trait:
//!
//! | Kind            | Binds to     | Trait                 |
//! |-----------------|--------------|-----------------------|
//! | Replacement     | event name   | [`Replacement`]       |
//! | Trigger         | event name   | [`Trigger`]           |
//! | Hook            | event name   | [`Hook`]              |
//! | StateModifier   | state key    | [`StateModifier`]     |
//!
//! Domain types implement one of the traits and are wrapped in an
//! [`Effect`] for registration. `Rc<T>` implements each trait whenever `T`
//! does, so an owner can keep a handle to a stateful effect it registered.

use std::any::Any;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{EventName, Priority, SourceId, StateKey};
use crate::engine::EventSystem;
use crate::events::{Event, EventKind};
use crate::triggers::TriggerAction;

/// The closed set of effect kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Supersedes an event's own resolution.
    Replacement,
    /// Schedules a deferred reaction to an event.
    Trigger,
    /// Layers a transformation over an attribute or method value.
    StateModifier,
    /// Observes completed events without influencing them.
    Hook,
}

impl EffectKind {
    /// Human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EffectKind::Replacement => "replacement",
            EffectKind::Trigger => "trigger",
            EffectKind::StateModifier => "state_modifier",
            EffectKind::Hook => "hook",
        }
    }

    /// Whether effects of this kind bind to event names (as opposed to state keys).
    #[must_use]
    pub const fn binds_events(self) -> bool {
        match self {
            EffectKind::Replacement | EffectKind::Trigger | EffectKind::Hook => true,
            EffectKind::StateModifier => false,
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supersedes an event with an alternate outcome.
///
/// When a replacement applies, the original event's triggers and base
/// resolution never run. The replacement usually resolves a branched
/// event in its place, or returns `None` to suppress it.
pub trait Replacement<P: EventKind>: 'static {
    /// Lower priorities are selected first.
    fn priority(&self) -> Priority {
        0
    }

    /// Whether this replacement wants to act on `event`.
    fn can_replace(&self, _system: &EventSystem, _event: &Event<P>) -> bool {
        true
    }

    /// Produce the outcome that stands in for `event`.
    fn resolve(&self, system: &EventSystem, event: &Event<P>) -> Option<P::Output>;
}

/// Schedules a deferred action in response to an event.
///
/// Actions never run during the event's resolution. They are queued and
/// executed on the next pending-trigger flush.
pub trait Trigger<P: EventKind>: 'static {
    /// Lower priorities run first within a flush batch.
    fn priority(&self) -> Priority {
        0
    }

    /// Return the action to queue, or `None` to not fire.
    fn should_trigger(&self, system: &EventSystem, event: &Event<P>) -> Option<TriggerAction>;
}

/// Passive observer of completed events.
///
/// Hooks see an event after its base resolution and cannot change it.
pub trait Hook<P: EventKind>: 'static {
    /// Lower priorities observe first.
    fn priority(&self) -> Priority {
        0
    }

    /// Called once per completed event of kind `P`.
    fn on_event(&self, system: &EventSystem, event: &Event<P>);
}

/// Layered transformation of a modifiable attribute or method.
///
/// `O` is the owning object, `R` the request argument (`()` for plain
/// attributes) and `V` the value being computed.
pub trait StateModifier<O: ?Sized, R, V>: 'static {
    /// Lower priorities fold first.
    fn priority(&self) -> Priority {
        0
    }

    /// Whether to apply to the value computed so far.
    fn should_modify(&self, _system: &EventSystem, _owner: &O, _request: &R, _value: &V) -> bool {
        true
    }

    /// Transform the value.
    fn modify(&self, system: &EventSystem, owner: &O, request: &R, value: V) -> V;
}

impl<P: EventKind, T: Replacement<P> + ?Sized> Replacement<P> for Rc<T> {
    fn priority(&self) -> Priority {
        (**self).priority()
    }

    fn can_replace(&self, system: &EventSystem, event: &Event<P>) -> bool {
        (**self).can_replace(system, event)
    }

    fn resolve(&self, system: &EventSystem, event: &Event<P>) -> Option<P::Output> {
        (**self).resolve(system, event)
    }
}

impl<P: EventKind, T: Trigger<P> + ?Sized> Trigger<P> for Rc<T> {
    fn priority(&self) -> Priority {
        (**self).priority()
    }

    fn should_trigger(&self, system: &EventSystem, event: &Event<P>) -> Option<TriggerAction> {
        (**self).should_trigger(system, event)
    }
}

impl<P: EventKind, T: Hook<P> + ?Sized> Hook<P> for Rc<T> {
    fn priority(&self) -> Priority {
        (**self).priority()
    }

    fn on_event(&self, system: &EventSystem, event: &Event<P>) {
        (**self).on_event(system, event);
    }
}

impl<O, R, V, T> StateModifier<O, R, V> for Rc<T>
where
    O: ?Sized,
    T: StateModifier<O, R, V> + ?Sized,
{
    fn priority(&self) -> Priority {
        (**self).priority()
    }

    fn should_modify(&self, system: &EventSystem, owner: &O, request: &R, value: &V) -> bool {
        (**self).should_modify(system, owner, request, value)
    }

    fn modify(&self, system: &EventSystem, owner: &O, request: &R, value: V) -> V {
        (**self).modify(system, owner, request, value)
    }
}

/// One (target key, handler) pair of an effect.
///
/// The handler is type-erased; the registry hands it back only to callers
/// asking for the matching trait object type.
#[derive(Clone)]
pub struct EffectBinding {
    pub(crate) target: &'static str,
    pub(crate) priority: Priority,
    pub(crate) handler: Rc<dyn Any>,
}

impl EffectBinding {
    fn new<T: ?Sized + 'static>(target: &'static str, priority: Priority, handler: Rc<T>) -> Self {
        Self {
            target,
            priority,
            handler: Rc::new(handler),
        }
    }

    /// Target key this binding is registered under.
    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Priority of this binding.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl std::fmt::Debug for EffectBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectBinding")
            .field("target", &self.target)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// A set of hook bindings sharing one effect identity.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use effect_engine::{Event, EventKind, EventSystem, Hook, HookSet, Effect};
///
/// #[derive(Clone, Debug)]
/// struct Moved;
/// impl EventKind for Moved {
///     type Output = ();
///     fn resolve(&self, _: &EventSystem) {}
/// }
///
/// #[derive(Clone, Debug)]
/// struct TurnStarted;
/// impl EventKind for TurnStarted {
///     type Output = ();
///     fn resolve(&self, _: &EventSystem) {}
/// }
///
/// #[derive(Default)]
/// struct Counter(Cell<u32>);
/// impl Hook<Moved> for Counter {
///     fn on_event(&self, _: &EventSystem, _: &Event<Moved>) { self.0.set(self.0.get() + 1); }
/// }
/// impl Hook<TurnStarted> for Counter {
///     fn on_event(&self, _: &EventSystem, _: &Event<TurnStarted>) { self.0.set(0); }
/// }
///
/// let system = EventSystem::new();
/// let counter = Rc::new(Counter::default());
/// system.register(Effect::hooks(
///     HookSet::new()
///         .on::<Moved, _>(Rc::clone(&counter))
///         .on::<TurnStarted, _>(Rc::clone(&counter)),
/// ));
///
/// system.resolve_payload(Moved);
/// system.resolve_payload(Moved);
/// assert_eq!(counter.0.get(), 2);
/// system.resolve_payload(TurnStarted);
/// assert_eq!(counter.0.get(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct HookSet {
    bindings: SmallVec<[EffectBinding; 2]>,
}

impl HookSet {
    /// Create an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe events of kind `P` (builder pattern).
    #[must_use]
    pub fn on<P: EventKind, H: Hook<P>>(mut self, hook: H) -> Self {
        let priority = hook.priority();
        let handler: Rc<dyn Hook<P>> = Rc::new(hook);
        self.bindings
            .push(EffectBinding::new(P::name().as_str(), priority, handler));
        self
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the set has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// A registrable effect.
///
/// Built with one of the per-kind constructors. Registering an `Effect`
/// yields a fresh [`EffectId`](crate::core::EffectId); registering the same
/// behaviour twice yields two independent effects.
#[derive(Clone, Debug)]
pub struct Effect {
    kind: EffectKind,
    bindings: SmallVec<[EffectBinding; 1]>,
    source: Option<SourceId>,
}

impl Effect {
    fn single(kind: EffectKind, binding: EffectBinding) -> Self {
        let mut bindings = SmallVec::new();
        bindings.push(binding);
        Self {
            kind,
            bindings,
            source: None,
        }
    }

    /// A replacement effect on events of kind `P`.
    pub fn replacement<P: EventKind, T: Replacement<P>>(effect: T) -> Self {
        let priority = effect.priority();
        let handler: Rc<dyn Replacement<P>> = Rc::new(effect);
        Self::single(
            EffectKind::Replacement,
            EffectBinding::new(P::name().as_str(), priority, handler),
        )
    }

    /// A trigger effect on events of kind `P`.
    pub fn trigger<P: EventKind, T: Trigger<P>>(effect: T) -> Self {
        let priority = effect.priority();
        let handler: Rc<dyn Trigger<P>> = Rc::new(effect);
        Self::single(
            EffectKind::Trigger,
            EffectBinding::new(P::name().as_str(), priority, handler),
        )
    }

    /// A hook on events of kind `P`.
    pub fn hook<P: EventKind, T: Hook<P>>(effect: T) -> Self {
        Self::hooks(HookSet::new().on::<P, T>(effect))
    }

    /// A hook effect with several bindings.
    pub fn hooks(set: HookSet) -> Self {
        Self {
            kind: EffectKind::Hook,
            bindings: set.bindings.into_iter().collect(),
            source: None,
        }
    }

    /// A state modifier on the attribute or method identified by `key`.
    pub fn modifier<O, R, V, T>(key: StateKey, effect: T) -> Self
    where
        O: ?Sized + 'static,
        R: 'static,
        V: 'static,
        T: StateModifier<O, R, V>,
    {
        let priority = effect.priority();
        let handler: Rc<dyn StateModifier<O, R, V>> = Rc::new(effect);
        Self::single(
            EffectKind::StateModifier,
            EffectBinding::new(key.as_str(), priority, handler),
        )
    }

    /// Override the priority reported by the effect definition (builder pattern).
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        for binding in &mut self.bindings {
            binding.priority = priority;
        }
        self
    }

    /// Tag the effect with its owning domain object (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    /// The effect's kind.
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// The owning domain object, if tagged.
    #[must_use]
    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    /// The effect's bindings.
    #[must_use]
    pub fn bindings(&self) -> &[EffectBinding] {
        &self.bindings
    }

    /// Check whether the effect binds to an event name.
    #[must_use]
    pub fn targets_event(&self, name: EventName) -> bool {
        self.kind.binds_events() && self.bindings.iter().any(|b| b.target == name.as_str())
    }

    pub(crate) fn into_parts(self) -> (EffectKind, SmallVec<[EffectBinding; 1]>, Option<SourceId>) {
        (self.kind, self.bindings, self.source)
    }
}
