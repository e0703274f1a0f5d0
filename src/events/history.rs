//! Resolution history tree.
//!
//! Every event that completes base resolution is recorded as a node. An
//! event resolved while another event's base resolution is on the stack
//! becomes that event's child, which is what "did X happen during Y"
//! queries walk.
//!
//! Nodes are opened when base resolution starts (so children can link to
//! them) and closed with the resolved event once it finishes. Open nodes
//! are invisible to typed queries.

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::{EventId, EventName};

use super::event::{Event, EventKind};

#[derive(Debug)]
struct HistoryNode {
    name: EventName,
    parent: Option<EventId>,
    children: SmallVec<[EventId; 4]>,
    /// The resolved event. `None` while its resolution is in flight.
    event: Option<Rc<dyn Any>>,
}

/// Tree of resolved events for one session.
#[derive(Debug, Default)]
pub struct HistoryTree {
    nodes: FxHashMap<EventId, HistoryNode>,

    /// Closed nodes in completion order.
    completed: Vec<EventId>,

    /// Next event ID to allocate.
    next_id: u64,
}

impl HistoryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a node for an event whose base resolution is starting.
    pub(crate) fn open(&mut self, name: EventName, parent: Option<EventId>) -> EventId {
        let id = EventId::new(self.next_id);
        self.next_id += 1;

        let parent = parent.filter(|p| self.nodes.contains_key(p));
        if let Some(parent_id) = parent {
            if let Some(node) = self.nodes.get_mut(&parent_id) {
                node.children.push(id);
            }
        }

        self.nodes.insert(
            id,
            HistoryNode {
                name,
                parent,
                children: SmallVec::new(),
                event: None,
            },
        );
        id
    }

    /// Close a node with its resolved event.
    pub(crate) fn close<P: EventKind>(&mut self, id: EventId, event: Event<P>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.event = Some(Rc::new(event) as Rc<dyn Any>);
            self.completed.push(id);
        }
    }

    /// Number of recorded (closed) events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Name of a recorded or in-flight event.
    #[must_use]
    pub fn name(&self, id: EventId) -> Option<EventName> {
        self.nodes.get(&id).map(|n| n.name)
    }

    /// Get a recorded event by id, if it is of kind `P`.
    #[must_use]
    pub fn get<P: EventKind>(&self, id: EventId) -> Option<Rc<Event<P>>> {
        self.nodes.get(&id).and_then(downcast_node::<P>)
    }

    /// Most recently completed event of kind `P`.
    #[must_use]
    pub fn last<P: EventKind>(&self) -> Option<Rc<Event<P>>> {
        self.completed
            .iter()
            .rev()
            .filter_map(|id| self.nodes.get(id))
            .find_map(downcast_node::<P>)
    }

    /// Parent of an event, if it was resolved inside another event.
    #[must_use]
    pub fn parent(&self, id: EventId) -> Option<EventId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Direct children of an event, in the order they started resolving.
    #[must_use]
    pub fn children(&self, id: EventId) -> Vec<EventId> {
        self.nodes
            .get(&id)
            .map(|n| n.children.to_vec())
            .unwrap_or_default()
    }

    /// Events recorded with no parent, in the order they started resolving.
    pub fn roots(&self) -> Vec<EventId> {
        let mut roots: Vec<EventId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(&id, _)| id)
            .collect();
        roots.sort();
        roots
    }

    /// All recorded descendants of `id` of kind `P`, depth-first in
    /// resolution-start order. The event itself is not included.
    #[must_use]
    pub fn descendants<P: EventKind>(&self, id: EventId) -> Vec<Rc<Event<P>>> {
        let mut found = Vec::new();
        self.walk(id, &mut |node: &HistoryNode| {
            if let Some(event) = downcast_node::<P>(node) {
                found.push(event);
            }
            true
        });
        found
    }

    /// Check whether any recorded descendant of `id` is of kind `P`.
    #[must_use]
    pub fn any_descendant<P: EventKind>(&self, id: EventId) -> bool {
        let mut found = false;
        self.walk(id, &mut |node: &HistoryNode| {
            found = downcast_node::<P>(node).is_some();
            !found
        });
        found
    }

    /// Drop every node except the listed in-flight ones.
    ///
    /// Kept nodes keep their links to each other and lose every other
    /// child; their ids stay valid so the events still resolving can close
    /// them.
    pub(crate) fn clear_except(&mut self, keep: &[EventId]) {
        self.nodes.retain(|id, _| keep.contains(id));
        for node in self.nodes.values_mut() {
            node.children.retain(|child| keep.contains(child));
        }
        self.completed.clear();
    }

    /// Remove a node whose resolution never finished.
    ///
    /// Its children move up to its parent, in its place, so ancestors still
    /// see them as descendants.
    pub(crate) fn discard(&mut self, id: EventId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };

        for child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = node.parent;
            }
        }

        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            if let Some(pos) = parent.children.iter().position(|&c| c == id) {
                parent.children.remove(pos);
                parent.children.insert_many(pos, node.children.iter().copied());
            }
        }
        self.completed.retain(|&c| c != id);
    }

    /// Pre-order walk over the subtree below `id`. The visitor returns
    /// `false` to stop early.
    fn walk(&self, id: EventId, visit: &mut dyn FnMut(&HistoryNode) -> bool) {
        let Some(root) = self.nodes.get(&id) else {
            return;
        };

        let mut stack: Vec<EventId> = root.children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get(&next) else {
                continue;
            };
            if !visit(node) {
                return;
            }
            stack.extend(node.children.iter().rev().copied());
        }
    }
}

fn downcast_node<P: EventKind>(node: &HistoryNode) -> Option<Rc<Event<P>>> {
    let event = node.event.as_ref()?;
    Rc::clone(event).downcast::<Event<P>>().ok()
}
