//! Table-driven key dispatch for components that prefer declaring bindings
//! over matching on keys by hand.

use super::state::ComponentState;
use crate::actor::KeyCode;
use std::collections::HashMap;
use std::fmt;

type Action = Box<dyn Fn(&ComponentState) + Send + Sync>;

/// Which table a key is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    /// The component is selected but not in focus.
    Selected,
    /// The component is in focus.
    Focus,
}

/// Key-to-action tables split by selection scope.
///
/// ```rust,ignore
/// let bindings = KeyBindings::new()
///     .on_selected(KeyCode::Char('r'), |_| reset())
///     .on_focus(KeyCode::Esc, |state| { state.set_in_focus(false); });
/// ```
#[derive(Default)]
pub struct KeyBindings {
    selected: HashMap<KeyCode, Action>,
    focus: HashMap<KeyCode, Action>,
}

impl KeyBindings {
    /// Create empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an action used while the component is selected but not focused.
    #[must_use]
    pub fn on_selected<F>(mut self, code: KeyCode, action: F) -> Self
    where
        F: Fn(&ComponentState) + Send + Sync + 'static,
    {
        self.selected.insert(code, Box::new(action));
        self
    }

    /// Bind an action used while the component is in focus.
    #[must_use]
    pub fn on_focus<F>(mut self, code: KeyCode, action: F) -> Self
    where
        F: Fn(&ComponentState) + Send + Sync + 'static,
    {
        self.focus.insert(code, Box::new(action));
        self
    }

    /// Run the action bound to `code` in `scope`, if any.
    ///
    /// Returns whether an action ran.
    pub fn dispatch(&self, scope: KeyScope, code: KeyCode, state: &ComponentState) -> bool {
        let table = match scope {
            KeyScope::Selected => &self.selected,
            KeyScope::Focus => &self.focus,
        };
        table.get(&code).is_some_and(|action| {
            action(state);
            true
        })
    }
}

impl fmt::Debug for KeyBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBindings")
            .field("selected", &self.selected.keys().collect::<Vec<_>>())
            .field("focus", &self.focus.keys().collect::<Vec<_>>())
            .finish()
    }
}
