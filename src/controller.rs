//! Controller: Base for application-level logic that drives an engine.

use crate::actor::Engine;

/// Holds the [`Engine`] an application controller works against.
///
/// Embed a `Controller` in your own controller types instead of threading
/// the engine through every call. It has no behavior of its own.
///
/// The controller holds a strong [`Engine`] handle, so the engine is not
/// disposed by drop while a controller is alive. Call [`Engine::dispose`]
/// to shut it down explicitly.
///
/// # Example
///
/// ```rust,ignore
/// struct MenuController {
///     base: Controller,
/// }
///
/// impl MenuController {
///     fn next_item(&self) {
///         self.base.engine().select(Selection::Next);
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Controller {
    engine: Engine,
}

impl Controller {
    /// Create a controller bound to `engine`.
    pub fn new(engine: &Engine) -> Self {
        Self {
            engine: engine.clone(),
        }
    }

    /// The engine this controller drives.
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Selection;
    use crate::component::{ComponentHandle, Position};
    use crate::testing::{Probe, RecordingSurface};

    #[test]
    fn test_controller_drives_the_same_engine() {
        let (surface, _ops) = RecordingSurface::new();
        let engine = Engine::new(surface);
        let controller = Controller::new(&engine);

        let x = ComponentHandle::spawn(Probe::new("x"), Position::default(), true).unwrap();
        let y = ComponentHandle::spawn(Probe::new("y"), Position::default(), true).unwrap();
        controller.engine().add_component(&x);
        controller.engine().add_component(&y);
        controller.engine().select(Selection::Next);

        assert_eq!(engine.len(), 2);
        assert_eq!(engine.selected_component(), Some(y));
    }

    #[test]
    fn test_controller_keeps_engine_alive() {
        let (surface, _ops) = RecordingSurface::new();
        let engine = Engine::new(surface);
        let x = ComponentHandle::spawn(Probe::new("x"), Position::default(), true).unwrap();
        engine.add_component(&x);

        let controller = Controller::new(&engine);
        drop(engine);
        assert!(!controller.engine().is_disposed());
        assert!(!x.is_disposed());

        drop(controller);
        assert!(x.is_disposed());
    }

    #[test]
    fn test_controller_sees_disposal() {
        let (surface, _ops) = RecordingSurface::new();
        let engine = Engine::new(surface);
        let controller = Controller::new(&engine);

        engine.dispose();
        assert!(controller.engine().is_disposed());
    }
}
