//! Mounted components: identity, update thread ownership and teardown.

use super::state::{ComponentState, Position};
use super::Component;
use crate::actor::KeyEvent;
use crate::error::EngineError;
use crate::signal::CancelToken;
use crate::terminal::Surface;
use parking_lot::Mutex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a mounted component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Mounted {
    id: ComponentId,
    name: String,
    component: Arc<dyn Component>,
    state: Arc<ComponentState>,
    cancel: CancelToken,
    update_thread: Mutex<Option<JoinHandle<()>>>,
    children: Mutex<Vec<ComponentHandle>>,
    disposed: AtomicBool,
}

impl Mounted {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Children go first; their own flag stops any cycle back to us.
        let children = std::mem::take(&mut *self.children.lock());
        for child in &children {
            child.dispose();
        }

        self.cancel.cancel();
        let handle = self.update_thread.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                trace!(id = %self.id, "disposed from its own update thread, skipping join");
            } else if handle.join().is_err() {
                error!(id = %self.id, component = %self.name, "update thread panicked");
            }
        }

        self.component.release();
        debug!(id = %self.id, component = %self.name, "component disposed");
    }
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// A mounted component: the unit registered with an engine.
///
/// Handles are cheap to clone; clones share identity, so two handles are
/// equal exactly when they refer to the same mounted component. Dropping
/// the last handle disposes the component.
#[derive(Clone)]
pub struct ComponentHandle {
    inner: Arc<Mounted>,
}

impl ComponentHandle {
    /// Mount `component` at `position` and start its update thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] if the update thread cannot be started.
    pub fn spawn<C: Component>(
        component: C,
        position: Position,
        selectable: bool,
    ) -> Result<Self, EngineError> {
        Self::spawn_shared(Arc::new(component), position, selectable)
    }

    /// Mount a component the caller keeps a reference to.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] if the update thread cannot be started.
    pub fn spawn_shared<C: Component>(
        component: Arc<C>,
        position: Position,
        selectable: bool,
    ) -> Result<Self, EngineError> {
        let component: Arc<dyn Component> = component;
        let id = ComponentId::next();
        let name = component.name().to_string();
        let state = Arc::new(ComponentState::new(position, selectable));
        let cancel = CancelToken::new();

        let thread_name = format!("renderlite-update-{name}");
        let update_component = Arc::clone(&component);
        let update_state = Arc::clone(&state);
        let update_cancel = cancel.clone();
        let update_thread = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                trace!(%id, "update thread started");
                update_component.update(&update_state, &update_cancel);
                trace!(%id, "update thread finished");
            })
            .map_err(|e| EngineError::spawn(thread_name, e))?;

        debug!(%id, component = %name, "component mounted");

        Ok(Self {
            inner: Arc::new(Mounted {
                id,
                name,
                component,
                state,
                cancel,
                update_thread: Mutex::new(Some(update_thread)),
                children: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
            }),
        })
    }

    /// Identity of this component.
    #[inline]
    pub fn id(&self) -> ComponentId {
        self.inner.id
    }

    /// Name reported by the component.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Shared selection, focus and damage state.
    #[inline]
    pub fn state(&self) -> &ComponentState {
        &self.inner.state
    }

    /// The mounted component.
    pub fn component(&self) -> &dyn Component {
        self.inner.component.as_ref()
    }

    /// Draw the component onto `surface`.
    pub fn draw(&self, surface: &mut dyn Surface) {
        self.inner.component.draw(surface, &self.inner.state);
    }

    /// Offer a key to the component.
    ///
    /// Nothing happens unless the component is selected. A focused component
    /// consults its focus handler; a selected-but-unfocused one consults its
    /// selected handler. A handled key marks the component dirty; an
    /// unhandled key leaves it untouched.
    pub fn on_keypress(&self, key: &KeyEvent) -> bool {
        if self.is_disposed() {
            return false;
        }

        let state = &self.inner.state;
        let (selected, in_focus) = state.selection_flags();
        if !selected {
            return false;
        }

        let component = &self.inner.component;
        let handled = if in_focus {
            component.on_focus_key(key, state)
        } else {
            component.on_selected_key(key, state)
        };

        if handled {
            state.mark_dirty();
        }
        handled
    }

    /// Give this component ownership of `child`.
    ///
    /// Owned children are disposed before their parent. A child handed to an
    /// already-disposed parent is disposed immediately.
    pub fn add_child(&self, child: Self) {
        if child == *self {
            return;
        }
        if self.is_disposed() {
            child.dispose();
            return;
        }
        let mut children = self.inner.children.lock();
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Snapshot of the owned children.
    pub fn children(&self) -> Vec<Self> {
        self.inner.children.lock().clone()
    }

    /// Tear the component down: dispose owned children, cancel the update
    /// thread and wait for it to exit, then call
    /// [`Component::release`]. Later calls do nothing.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl PartialEq for ComponentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ComponentHandle {}

impl Hash for ComponentHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
