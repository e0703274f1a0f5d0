//! Effect registry.
//!
//! The registry stores effects keyed by (kind, target key) and hands them
//! back in registration order. Registration order is observable: it breaks
//! priority ties, so buckets are plain vectors that are only ever appended
//! to or filtered.

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::{EffectId, Priority, SourceId};

use super::effect::{Effect, EffectKind};

/// A stored binding.
#[derive(Clone)]
struct Entry {
    id: EffectId,
    priority: Priority,
    handler: Rc<dyn Any>,
}

/// Bookkeeping for one registered effect.
#[derive(Clone, Debug)]
struct Registration {
    kind: EffectKind,
    targets: SmallVec<[&'static str; 1]>,
    source: Option<SourceId>,
}

/// A registered effect handed out for dispatch.
pub(crate) struct Candidate<T: ?Sized> {
    pub(crate) id: EffectId,
    pub(crate) priority: Priority,
    pub(crate) handler: Rc<T>,
}

impl<T: ?Sized> Candidate<T> {
    /// Total order: priority, then registration order.
    pub(crate) fn order_key(&self) -> (Priority, EffectId) {
        (self.priority, self.id)
    }
}

/// Registry of effects for one session.
///
/// Effects are owned by the domain objects that created them; the registry
/// only holds what it needs to dispatch. Owners deregister their effects
/// before discarding them.
#[derive(Clone, Default)]
pub struct EffectRegistry {
    /// Bindings per (kind, target key), in registration order.
    buckets: FxHashMap<(EffectKind, &'static str), Vec<Entry>>,

    /// Registered effects by ID.
    registrations: FxHashMap<EffectId, Registration>,

    /// Next effect ID to allocate.
    next_id: u64,
}

impl EffectRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an effect, returns its ID.
    ///
    /// Each call allocates a new identity, even for an effect built from
    /// the same values as one already registered.
    pub fn register(&mut self, effect: Effect) -> EffectId {
        let id = EffectId::new(self.next_id);
        self.next_id += 1;

        let (kind, bindings, source) = effect.into_parts();
        let mut targets: SmallVec<[&'static str; 1]> = SmallVec::new();

        for binding in bindings {
            if !targets.contains(&binding.target) {
                targets.push(binding.target);
            }
            self.buckets
                .entry((kind, binding.target))
                .or_default()
                .push(Entry {
                    id,
                    priority: binding.priority,
                    handler: binding.handler,
                });
        }

        self.registrations.insert(id, Registration { kind, targets, source });
        id
    }

    /// Remove an effect by identity.
    ///
    /// Returns `false` if the effect was not registered.
    pub fn deregister(&mut self, id: EffectId) -> bool {
        let Some(registration) = self.registrations.remove(&id) else {
            return false;
        };

        for target in &registration.targets {
            let key = (registration.kind, *target);
            let now_empty = match self.buckets.get_mut(&key) {
                Some(entries) => {
                    entries.retain(|e| e.id != id);
                    entries.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.buckets.remove(&key);
            }
        }
        true
    }

    /// Check whether an effect is currently registered.
    #[must_use]
    pub fn contains(&self, id: EffectId) -> bool {
        self.registrations.contains_key(&id)
    }

    /// Kind of a registered effect.
    #[must_use]
    pub fn kind_of(&self, id: EffectId) -> Option<EffectKind> {
        self.registrations.get(&id).map(|r| r.kind)
    }

    /// Registered effects owned by `source`, in registration order.
    #[must_use]
    pub fn effects_for_source(&self, source: SourceId) -> Vec<EffectId> {
        let mut ids: Vec<EffectId> = self
            .registrations
            .iter()
            .filter(|(_, r)| r.source == Some(source))
            .map(|(&id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// Remove all effects owned by `source`. Returns how many were removed.
    pub fn remove_for_source(&mut self, source: SourceId) -> usize {
        let ids = self.effects_for_source(source);
        for &id in &ids {
            self.deregister(id);
        }
        ids.len()
    }

    /// Number of bindings registered under (kind, target).
    #[must_use]
    pub fn bucket_len(&self, kind: EffectKind, target: &'static str) -> usize {
        self.buckets.get(&(kind, target)).map_or(0, Vec::len)
    }

    /// Total registered effect count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Collect the handlers under (kind, target) whose erased type is `Rc<T>`.
    ///
    /// Returned in registration order. Entries of another handler type
    /// (an unrelated definition sharing the key) are skipped.
    pub(crate) fn candidates<T: ?Sized + 'static>(
        &self,
        kind: EffectKind,
        target: &'static str,
    ) -> Vec<Candidate<T>> {
        let Some(entries) = self.buckets.get(&(kind, target)) else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| match entry.handler.downcast_ref::<Rc<T>>() {
                Some(handler) => Some(Candidate {
                    id: entry.id,
                    priority: entry.priority,
                    handler: Rc::clone(handler),
                }),
                None => {
                    tracing::warn!(
                        effect = %entry.id,
                        kind = %kind,
                        key = target,
                        "effect handler type does not match its key, skipping"
                    );
                    None
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("effects", &self.registrations.len())
            .field("buckets", &self.buckets.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
