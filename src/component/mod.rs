//! Components: independently updating visual units.
//!
//! A component implements [`Component`] and is mounted with
//! [`ComponentHandle::spawn`], which immediately starts its update thread.
//! The handle is what gets registered with an [`Engine`](crate::Engine).
//!
//! # Threads
//!
//! ```text
//!   update thread ──▶ Component::update ──▶ ComponentState (dirty flags)
//!                                                   │
//!   render thread ◀── Component::draw ◀─────────────┘
//!
//!   input router  ──▶ ComponentHandle::on_keypress ──▶ on_focus_key / on_selected_key
//! ```
//!
//! `draw` and `update` run on different threads at the same time, so
//! components keep their data behind interior mutability.

mod bindings;
mod handle;
mod state;

pub use bindings::{KeyBindings, KeyScope};
pub use handle::{ComponentHandle, ComponentId};
pub use state::{ComponentState, Position};

use crate::actor::KeyEvent;
use crate::signal::CancelToken;
use crate::terminal::Surface;

/// A visual unit with its own update activity.
pub trait Component: Send + Sync + 'static {
    /// Draw the component at `state.position()`.
    ///
    /// Called on the render thread whenever the component is dirty or the
    /// window is being fully refreshed, so it must be idempotent for
    /// unchanged state.
    fn draw(&self, surface: &mut dyn Surface, state: &ComponentState);

    /// Body of the component's update thread.
    ///
    /// Runs once for the component's whole lifetime and should loop until
    /// `cancel` fires, pacing itself with [`CancelToken::sleep`]. Any change
    /// to visible data must be followed by [`ComponentState::mark_dirty`]
    /// (and [`ComponentState::request_window_refresh`] if the footprint
    /// changed). The default does nothing until cancelled.
    fn update(&self, _state: &ComponentState, cancel: &CancelToken) {
        cancel.wait();
    }

    /// Optional binding tables consulted by the default key handlers.
    fn key_bindings(&self) -> Option<&KeyBindings> {
        None
    }

    /// Handle a key while selected but not in focus. Returns whether the key
    /// was handled.
    fn on_selected_key(&self, key: &KeyEvent, state: &ComponentState) -> bool {
        self.key_bindings()
            .is_some_and(|bindings| bindings.dispatch(KeyScope::Selected, key.code, state))
    }

    /// Handle a key while in focus. Returns whether the key was handled.
    fn on_focus_key(&self, key: &KeyEvent, state: &ComponentState) -> bool {
        self.key_bindings()
            .is_some_and(|bindings| bindings.dispatch(KeyScope::Focus, key.code, state))
    }

    /// Release resources after the update thread has exited.
    fn release(&self) {}

    /// Short name used for thread names and logs.
    ///
    /// Defaults to the type name without its module path or generic
    /// arguments.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// `a::b::Widget<c::D>` becomes `Widget`.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Component for Plain {
        fn draw(&self, _surface: &mut dyn Surface, _state: &ComponentState) {}
    }

    struct Wrapper<T>(std::marker::PhantomData<T>);

    impl<T: Send + Sync + 'static> Component for Wrapper<T> {
        fn draw(&self, _surface: &mut dyn Surface, _state: &ComponentState) {}
    }

    #[test]
    fn test_default_name_strips_module_path() {
        assert_eq!(Plain.name(), "Plain");
        assert_eq!(short_type_name("a::b::Widget"), "Widget");
    }

    #[test]
    fn test_default_name_ignores_generic_arguments() {
        let wrapper = Wrapper::<Position>(std::marker::PhantomData);
        assert_eq!(wrapper.name(), "Wrapper");
        assert_eq!(short_type_name("a::Foo<b::Bar<c::Baz>>"), "Foo");
        assert_eq!(short_type_name("Flat"), "Flat");
    }
}
