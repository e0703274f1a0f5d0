//! Modifiable attributes and methods.
//!
//! A modifiable value is read through the session: the stored base value
//! (or the default method body's result) is folded through every state
//! modifier registered under the value's key. Reads always recompute;
//! writes only replace the base value.
//!
//! ```
//! use effect_engine::{Effect, EventSystem, Modifiable, StateKey, StateModifier};
//!
//! const POWER: StateKey = StateKey::new("Unit.power");
//!
//! struct Unit {
//!     power: Modifiable<i64>,
//! }
//!
//! impl Unit {
//!     fn power(&self, system: &EventSystem) -> i64 {
//!         self.power.read(system, self)
//!     }
//! }
//!
//! struct Rage;
//!
//! impl StateModifier<Unit, (), i64> for Rage {
//!     fn modify(&self, _: &EventSystem, _: &Unit, _: &(), value: i64) -> i64 {
//!         value + 2
//!     }
//! }
//!
//! let system = EventSystem::new();
//! let mut unit = Unit { power: Modifiable::new(POWER, 3) };
//! let rage = system.register(Effect::modifier(POWER, Rage));
//!
//! assert_eq!(unit.power(&system), 5);
//! unit.power.write(4);
//! assert_eq!(unit.power(&system), 6);
//!
//! system.deregister(rage);
//! assert_eq!(unit.power(&system), 4);
//! ```

use crate::core::StateKey;
use crate::engine::EventSystem;

/// A stored base value whose effective value is computed on read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Modifiable<V> {
    key: StateKey,
    base: V,
}

impl<V> Modifiable<V> {
    /// Create a modifiable value with an initial base.
    pub const fn new(key: StateKey, base: V) -> Self {
        Self { key, base }
    }

    /// Key modifiers bind to.
    #[must_use]
    pub fn key(&self) -> StateKey {
        self.key
    }

    /// The stored, unmodified value.
    #[must_use]
    pub fn base(&self) -> &V {
        &self.base
    }

    /// Replace the stored base value.
    ///
    /// Nothing is recomputed; the next read sees the new base.
    pub fn write(&mut self, value: V) {
        self.base = value;
    }

    /// Consume the wrapper, keeping the base value.
    pub fn into_base(self) -> V {
        self.base
    }
}

impl<V: Clone + 'static> Modifiable<V> {
    /// The effective value for `owner`, with every applicable modifier folded in.
    pub fn read<O: ?Sized + 'static>(&self, system: &EventSystem, owner: &O) -> V {
        system.state_value(self.key, owner, &(), self.base.clone())
    }
}

/// A method whose result can be intercepted by state modifiers.
///
/// The default body computes the base value from the owner and the
/// request argument; modifiers registered under the key then fold over it
/// exactly as for attributes.
pub struct ModifiableMethod<O: ?Sized, R, V> {
    key: StateKey,
    body: fn(&EventSystem, &O, &R) -> V,
}

impl<O: ?Sized, R, V> ModifiableMethod<O, R, V> {
    /// Create a modifiable method from its key and default body.
    pub const fn new(key: StateKey, body: fn(&EventSystem, &O, &R) -> V) -> Self {
        Self { key, body }
    }

    /// Key modifiers bind to.
    #[must_use]
    pub fn key(&self) -> StateKey {
        self.key
    }

    /// Run only the default body, ignoring modifiers.
    pub fn call_default(&self, system: &EventSystem, owner: &O, request: &R) -> V {
        (self.body)(system, owner, request)
    }
}

impl<O, R, V> ModifiableMethod<O, R, V>
where
    O: ?Sized + 'static,
    R: 'static,
    V: 'static,
{
    /// Call the method: default body, then every applicable modifier.
    pub fn call(&self, system: &EventSystem, owner: &O, request: &R) -> V {
        let base = self.call_default(system, owner, request);
        system.state_value(self.key, owner, request, base)
    }
}

impl<O: ?Sized, R, V> Clone for ModifiableMethod<O, R, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O: ?Sized, R, V> Copy for ModifiableMethod<O, R, V> {}

impl<O: ?Sized, R, V> std::fmt::Debug for ModifiableMethod<O, R, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModifiableMethod")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Effect, StateModifier};

    const HEALTH: StateKey = StateKey::new("Unit.health");
    const CAN_ENTER: StateKey = StateKey::new("Tile.can_enter");

    struct Tile {
        blocked: bool,
    }

    struct Walker {
        flying: bool,
    }

    fn tile_can_enter(_system: &EventSystem, tile: &Tile, _walker: &Walker) -> bool {
        !tile.blocked
    }

    const TILE_CAN_ENTER: ModifiableMethod<Tile, Walker, bool> =
        ModifiableMethod::new(CAN_ENTER, tile_can_enter);

    struct Flight;

    impl StateModifier<Tile, Walker, bool> for Flight {
        fn should_modify(&self, _system: &EventSystem, _tile: &Tile, walker: &Walker, _value: &bool) -> bool {
            walker.flying
        }

        fn modify(&self, _system: &EventSystem, _tile: &Tile, _walker: &Walker, _value: bool) -> bool {
            true
        }
    }

    struct Fortify;

    impl StateModifier<(), (), i64> for Fortify {
        fn modify(&self, _system: &EventSystem, _owner: &(), _request: &(), value: i64) -> i64 {
            value * 2
        }
    }

    #[test]
    fn test_write_stores_base_only() {
        let system = EventSystem::new();
        system.register(Effect::modifier(HEALTH, Fortify));

        let mut health = Modifiable::new(HEALTH, 5i64);
        assert_eq!(health.read(&system, &()), 10);

        health.write(7);
        assert_eq!(health.base(), &7);
        assert_eq!(health.read(&system, &()), 14);
        assert_eq!(health.key(), HEALTH);
        assert_eq!(health.into_base(), 7);
    }

    #[test]
    fn test_read_is_pull_based() {
        let system = EventSystem::new();
        let health = Modifiable::new(HEALTH, 5i64);
        assert_eq!(health.read(&system, &()), 5);

        let id = system.register(Effect::modifier(HEALTH, Fortify));
        assert_eq!(health.read(&system, &()), 10);

        system.deregister(id);
        assert_eq!(health.read(&system, &()), 5);
    }

    #[test]
    fn test_method_default_body() {
        let system = EventSystem::new();
        let open = Tile { blocked: false };
        let wall = Tile { blocked: true };
        let walker = Walker { flying: false };

        assert!(TILE_CAN_ENTER.call(&system, &open, &walker));
        assert!(!TILE_CAN_ENTER.call(&system, &wall, &walker));
    }

    #[test]
    fn test_method_modified_by_request() {
        let system = EventSystem::new();
        system.register(Effect::modifier(CAN_ENTER, Flight));

        let wall = Tile { blocked: true };
        let walker = Walker { flying: false };
        let bird = Walker { flying: true };

        assert!(!TILE_CAN_ENTER.call(&system, &wall, &walker));
        assert!(TILE_CAN_ENTER.call(&system, &wall, &bird));
        assert!(!TILE_CAN_ENTER.call_default(&system, &wall, &bird));
    }
}
