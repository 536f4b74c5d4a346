//! Component registry: insertion-ordered list plus a membership set.

use crate::component::{ComponentHandle, ComponentId};
use std::collections::HashSet;

/// Ordered component list with O(1) membership tests.
///
/// The list and the set always hold the same components. Order is
/// registration order, which is both draw order and selection-cycle order.
#[derive(Default)]
pub(crate) struct Registry {
    ordered: Vec<ComponentHandle>,
    members: HashSet<ComponentId>,
}

impl Registry {
    /// Append `component`. Returns `false` if it was already registered.
    pub(crate) fn insert(&mut self, component: &ComponentHandle) -> bool {
        if !self.members.insert(component.id()) {
            return false;
        }
        self.ordered.push(component.clone());
        true
    }

    /// Remove `component`. Returns `false` if it was not registered.
    pub(crate) fn remove(&mut self, component: &ComponentHandle) -> bool {
        if !self.members.remove(&component.id()) {
            return false;
        }
        self.ordered.retain(|c| c.id() != component.id());
        true
    }

    /// Empty the registry, returning what it held in order.
    pub(crate) fn drain(&mut self) -> Vec<ComponentHandle> {
        self.members.clear();
        std::mem::take(&mut self.ordered)
    }

    /// Copy of the ordered list.
    pub(crate) fn snapshot(&self) -> Vec<ComponentHandle> {
        self.ordered.clone()
    }

    pub(crate) fn contains(&self, id: ComponentId) -> bool {
        self.members.contains(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let listed: HashSet<ComponentId> = self.ordered.iter().map(ComponentHandle::id).collect();
        listed.len() == self.ordered.len() && listed == self.members
    }
}
