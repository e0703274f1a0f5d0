//! Identifier types.
//!
//! Every registered effect, every recorded event and every effect owner
//! has an opaque identifier. Event names and state keys are the *target
//! keys* effects bind to.
//!
//! ## Identity, not equality
//!
//! Two effects built from identical values are still distinct once
//! registered: each `register` call allocates a fresh [`EffectId`]. Ids are
//! allocated monotonically per session, so comparing ids also compares
//! registration order.
//!
//! ```
//! use effect_engine::core::{EventName, StateKey};
//!
//! struct UnitMoved;
//!
//! assert_eq!(EventName::of::<UnitMoved>(), EventName::new("UnitMoved"));
//! assert_eq!(StateKey::new("Unit.power").as_str(), "Unit.power");
//! ```

use serde::{Deserialize, Serialize};

/// Priority of an effect. Lower values are applied first.
pub type Priority = i32;

/// Unique identifier for a registered effect.
///
/// Allocated by the session on registration. Never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u64);

impl EffectId {
    /// Create a new effect ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// Identifier of a resolved event in the session's history tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl EventId {
    /// Create a new event ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// Identifier of the domain object that owns a group of effects.
///
/// The engine never interprets it. Domain code picks whatever numbering
/// it likes (unit ids, status instance ids, terrain ids).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub u64);

impl SourceId {
    /// Create a new source ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Source({})", self.0)
    }
}

/// Stable, human-readable name of an event kind.
///
/// Replacement, trigger and hook effects bind to event names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventName(&'static str);

impl EventName {
    /// Create an event name from an explicit string.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Derive a name from a type's declared name.
    ///
    /// Module path and generic arguments are stripped, so
    /// `game::events::Hit<u8>` becomes `Hit`. Built on
    /// [`std::any::type_name`], whose output may change between compiler
    /// versions: the result is only stable within one build.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self(short_type_name(std::any::type_name::<T>()))
    }

    /// Get the name as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Identifier of a modifiable attribute or method.
///
/// State modifier effects bind to state keys. By convention keys are
/// written `Type.member`, e.g. `Unit.power` or `Unit.can_enter`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateKey(&'static str);

impl StateKey {
    /// Create a new state key.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self(key)
    }

    /// Get the key as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    };
    match base.rfind("::") {
        Some(idx) => &base[idx + 2..],
        None => base,
    }
}
