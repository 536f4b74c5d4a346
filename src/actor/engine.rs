//! Engine: Main coordinator that ties components and actors together.
//!
//! The Engine owns the component registry, runs the render actor, and
//! optionally the input actor. Hosts register [`ComponentHandle`]s, call
//! [`Engine::begin`], and later [`Engine::dispose`].

use super::input::{route_key, CrosstermKeySource, InputActor, KeyMap, KeySource, RouteOutcome};
use super::messages::KeyEvent;
use super::registry::Registry;
use super::renderer::{render_frame, FrameReport, RenderStats, RendererActor};
use crate::component::{ComponentHandle, ComponentId};
use crate::error::EngineError;
use crate::signal::CancelToken;
use crate::terminal::{AnsiSurface, Surface, TerminalGuard};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Where key input comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// The host reads keys and calls [`Engine::route_key`] itself.
    #[default]
    External,
    /// `begin` spawns an input thread reading the terminal via crossterm.
    EngineOwned,
}

/// Configuration for the Engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Target frames per second.
    pub target_fps: u32,
    /// Viewport requested every frame, in cells. `None` leaves it alone.
    pub viewport_size: Option<(u16, u16)>,
    /// Who owns the input loop.
    pub input_mode: InputMode,
    /// Keys the input router interprets.
    pub key_map: KeyMap,
    /// How long the input thread waits for a key before rechecking
    /// cancellation.
    pub input_poll_timeout: Duration,
    /// Whether [`Engine::stdout`] switches to the alternate screen buffer.
    pub alternate_screen: bool,
}

impl EngineConfig {
    /// Time budget for one frame.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 200,
            viewport_size: Some((100, 30)),
            input_mode: InputMode::External,
            key_map: KeyMap::default(),
            input_poll_timeout: Duration::from_millis(10),
            alternate_screen: true,
        }
    }
}

/// A selection-cycling transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    /// Keep the current selection (or default to the first component).
    #[default]
    None,
    /// Move to the next component, wrapping at the end.
    Next,
    /// Move to the previous component, wrapping at the start.
    Previous,
}

impl Selection {
    /// Index reached from `index` in a registry of `len` components.
    const fn apply(self, index: usize, len: usize) -> usize {
        match self {
            Self::None => index,
            Self::Next => (index + 1) % len,
            Self::Previous => (index + len - 1) % len,
        }
    }
}

/// State shared between the engine handle and its actor threads.
pub(crate) struct Shared {
    registry: Mutex<Registry>,
    /// Serializes selection passes so two of them never interleave.
    selection_lock: Mutex<()>,
    window_refresh: AtomicBool,
    cancel: CancelToken,
    stats: Mutex<RenderStats>,
}

impl Shared {
    fn new(cancel: CancelToken) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            selection_lock: Mutex::new(()),
            window_refresh: AtomicBool::new(false),
            cancel,
            stats: Mutex::new(RenderStats::default()),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(CancelToken::new())
    }

    pub(crate) const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Copy of the registry, taken under the lock.
    pub(crate) fn snapshot(&self) -> Vec<ComponentHandle> {
        self.registry.lock().snapshot()
    }

    pub(crate) fn trigger_window_refresh(&self) {
        self.window_refresh.store(true, Ordering::Release);
    }

    pub(crate) fn take_window_refresh(&self) -> bool {
        self.window_refresh.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn record_frame(&self, report: FrameReport, elapsed: Duration, overrun: bool) {
        self.stats.lock().record(report, elapsed, overrun);
    }

    pub(crate) fn render_stats(&self) -> RenderStats {
        self.stats.lock().clone()
    }

    pub(crate) fn add_component(&self, component: &ComponentHandle) {
        if !self.registry.lock().insert(component) {
            return;
        }
        debug!(id = %component.id(), component = component.name(), "component added");

        self.trigger_window_refresh();
        self.select(Selection::None);
    }

    pub(crate) fn remove_component(&self, component: &ComponentHandle) {
        if !self.registry.lock().remove(component) {
            return;
        }
        debug!(id = %component.id(), component = component.name(), "component removed");

        component.state().set_selected(false);
        component.dispose();
        self.trigger_window_refresh();
        self.select(Selection::None);
    }

    pub(crate) fn clear_components(&self) {
        let removed = self.registry.lock().drain();
        debug!(count = removed.len(), "components cleared");

        for component in &removed {
            component.state().set_selected(false);
            component.dispose();
        }

        self.trigger_window_refresh();
        self.select(Selection::None);
    }

    /// Run one pass of the selection state machine.
    ///
    /// With nothing selected the first component is selected. Otherwise the
    /// selection moves by the transition, wrapping around. Landing on the
    /// already selected component keeps its focus and marks it dirty.
    pub(crate) fn select(&self, selection: Selection) {
        let _pass = self.selection_lock.lock();
        let components = self.snapshot();
        if components.is_empty() {
            return;
        }

        let Some(old_index) = components.iter().position(|c| c.state().is_selected()) else {
            components[0].state().set_selected(true);
            debug!(id = %components[0].id(), "selection defaulted to first component");
            return;
        };

        let new_index = selection.apply(old_index, components.len());
        if new_index == old_index {
            // Re-selecting keeps focus and only refreshes the dirty state.
            components[old_index].state().set_selected(true);
        } else {
            components[old_index].state().set_selected(false);
            components[new_index].state().set_selected(true);
            debug!(
                from = %components[old_index].id(),
                to = %components[new_index].id(),
                "selection moved"
            );
        }
    }

    /// The selected component, if any.
    pub(crate) fn selected_component(&self) -> Option<ComponentHandle> {
        self.snapshot()
            .into_iter()
            .find(|c| c.state().is_selected())
    }
}

struct EngineCore {
    config: EngineConfig,
    shared: Arc<Shared>,
    surface: Mutex<Option<Box<dyn Surface>>>,
    key_source: Mutex<Option<Box<dyn KeySource>>>,
    render_actor: Mutex<Option<RendererActor>>,
    input_actor: Mutex<Option<InputActor>>,
    terminal: Mutex<Option<TerminalGuard>>,
    started_at: Mutex<Option<Instant>>,
    uptime: Mutex<Duration>,
    started: AtomicBool,
    disposed: AtomicBool,
    /// Held for the whole teardown so concurrent `dispose` calls all return
    /// after it is complete.
    teardown: Mutex<()>,
}

impl EngineCore {
    /// Tear the engine down, blocking until teardown has finished even when
    /// another thread started it.
    fn dispose(&self) {
        let _teardown = self.teardown.lock();
        self.dispose_locked();
    }

    /// Quit-key teardown, run on the input thread.
    ///
    /// If another thread already holds the teardown lock it will join this
    /// thread, so waiting for it here would deadlock.
    fn dispose_from_input(&self) {
        if let Some(_teardown) = self.teardown.try_lock() {
            self.dispose_locked();
        }
    }

    fn dispose_locked(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.shared.cancel.cancel();

            let render_actor = self.render_actor.lock().take();
            if let Some(actor) = render_actor {
                actor.join();
            }
            self.join_input();

            let started_at = self.started_at.lock().take();
            if let Some(started_at) = started_at {
                *self.uptime.lock() = started_at.elapsed();
            }

            for component in self.shared.snapshot() {
                self.shared.remove_component(&component);
            }

            // Restore the terminal only after the render thread's final clear.
            drop(self.terminal.lock().take());
            let uptime = *self.uptime.lock();
            info!(uptime_ms = u64::try_from(uptime.as_millis()).unwrap_or(u64::MAX), "engine disposed");
        } else {
            // A quit-driven teardown could not join its own thread.
            self.join_input();
        }
    }

    /// Join the input thread, or leave it for a later caller when running on it.
    fn join_input(&self) {
        let input_actor = self.input_actor.lock().take();
        if let Some(actor) = input_actor {
            if actor.is_current() {
                *self.input_actor.lock() = Some(actor);
            } else {
                actor.join();
            }
        }
    }
}

impl Drop for EngineCore {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// The RenderLite engine.
///
/// `Engine` is a cheap, cloneable handle; every clone drives the same
/// registry and render loop. Dropping the last clone disposes the engine.
///
/// # Example
///
/// ```rust,ignore
/// let engine = Engine::stdout(EngineConfig {
///     input_mode: InputMode::EngineOwned,
///     ..EngineConfig::default()
/// })?;
/// engine.add_component(&ComponentHandle::spawn(Clock::new(), Position::new(0, 0), false)?);
/// engine.begin()?;
/// engine.wait();
/// engine.dispose();
/// ```
#[derive(Clone)]
pub struct Engine {
    core: Arc<EngineCore>,
}

impl Engine {
    /// Create an engine drawing onto `surface` with default configuration.
    pub fn new(surface: impl Surface + 'static) -> Self {
        Self::with_config(EngineConfig::default(), surface)
    }

    /// Create an engine drawing onto `surface`.
    pub fn with_config(config: EngineConfig, surface: impl Surface + 'static) -> Self {
        Self::with_cancel_token(config, surface, CancelToken::new())
    }

    /// Create an engine whose lifetime is tied to an external cancel token.
    ///
    /// Cancelling `cancel` stops the render and input loops just as
    /// [`dispose`](Self::dispose) would, but components stay registered
    /// until the engine is disposed.
    pub fn with_cancel_token(
        config: EngineConfig,
        surface: impl Surface + 'static,
        cancel: CancelToken,
    ) -> Self {
        Self {
            core: Arc::new(EngineCore {
                config,
                shared: Arc::new(Shared::new(cancel)),
                surface: Mutex::new(Some(Box::new(surface))),
                key_source: Mutex::new(None),
                render_actor: Mutex::new(None),
                input_actor: Mutex::new(None),
                terminal: Mutex::new(None),
                started_at: Mutex::new(None),
                uptime: Mutex::new(Duration::ZERO),
                started: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
                teardown: Mutex::new(()),
            }),
        }
    }

    /// Create an engine that owns the process terminal.
    ///
    /// Enters raw mode (and the alternate screen if configured) and draws to
    /// stdout. The terminal is restored when the engine is disposed.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal setup fails.
    pub fn stdout(config: EngineConfig) -> Result<Self, EngineError> {
        let guard = TerminalGuard::enter(config.alternate_screen)?;
        let engine = Self::with_config(config, AnsiSurface::stdout());
        *engine.core.terminal.lock() = Some(guard);
        Ok(engine)
    }

    /// Install the key source the engine-owned input thread reads from.
    ///
    /// Installing a source makes `begin` spawn the input thread regardless
    /// of [`EngineConfig::input_mode`].
    pub fn set_key_source(&self, source: impl KeySource + 'static) -> Result<(), EngineError> {
        if self.core.disposed.load(Ordering::Acquire) {
            return Err(EngineError::Disposed);
        }
        if self.core.started.load(Ordering::Acquire) {
            return Err(EngineError::AlreadyStarted);
        }
        *self.core.key_source.lock() = Some(Box::new(source));
        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.core.config
    }

    /// Start the render loop (and the input loop, if configured).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyStarted`] on a second call,
    /// [`EngineError::Disposed`] after disposal, or
    /// [`EngineError::Spawn`] if a thread cannot be started.
    pub fn begin(&self) -> Result<(), EngineError> {
        let core = &self.core;
        if core.disposed.load(Ordering::Acquire) {
            return Err(EngineError::Disposed);
        }
        if core.started.swap(true, Ordering::AcqRel) {
            return Err(EngineError::AlreadyStarted);
        }

        let surface = core
            .surface
            .lock()
            .take()
            .ok_or(EngineError::AlreadyStarted)?;

        *core.started_at.lock() = Some(Instant::now());
        let render_actor = RendererActor::spawn(
            Arc::clone(&core.shared),
            surface,
            core.config.frame_interval(),
            core.config.viewport_size,
        )?;
        *core.render_actor.lock() = Some(render_actor);

        let key_source = core.key_source.lock().take().or_else(|| {
            (core.config.input_mode == InputMode::EngineOwned)
                .then(|| Box::new(CrosstermKeySource::new()) as Box<dyn KeySource>)
        });
        if let Some(source) = key_source {
            let weak: Weak<EngineCore> = Arc::downgrade(&self.core);
            let input_actor = InputActor::spawn(
                Arc::clone(&core.shared),
                source,
                core.config.key_map,
                core.config.input_poll_timeout,
                Box::new(move || {
                    if let Some(core) = weak.upgrade() {
                        core.dispose_from_input();
                    }
                }),
            )?;
            *core.input_actor.lock() = Some(input_actor);
        }

        info!(
            target_fps = core.config.target_fps,
            input = ?core.config.input_mode,
            "engine started"
        );
        Ok(())
    }

    /// Register a component. Registering it again does nothing.
    ///
    /// The component is appended to the draw order, the next frame fully
    /// repaints, and the first component ever added becomes selected.
    pub fn add_component(&self, component: &ComponentHandle) {
        self.core.shared.add_component(component);
    }

    /// Unregister and dispose a component. Unknown components are ignored.
    ///
    /// If it was selected, the selection moves to the first remaining
    /// component.
    pub fn remove_component(&self, component: &ComponentHandle) {
        self.core.shared.remove_component(component);
    }

    /// Unregister and dispose every component.
    ///
    /// The registry is emptied under its lock; disposal runs after the lock
    /// is released.
    pub fn clear_components(&self) {
        self.core.shared.clear_components();
    }

    /// Snapshot of the registered components in draw order.
    pub fn components(&self) -> Vec<ComponentHandle> {
        self.core.shared.snapshot()
    }

    /// Whether `component` is registered.
    pub fn contains(&self, component: &ComponentHandle) -> bool {
        self.contains_id(component.id())
    }

    /// Whether a component with `id` is registered.
    pub fn contains_id(&self, id: ComponentId) -> bool {
        self.core.shared.registry.lock().contains(id)
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.core.shared.registry.lock().len()
    }

    /// Whether no components are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply a selection transition.
    pub fn select(&self, selection: Selection) {
        self.core.shared.select(selection);
    }

    /// The selected component, if any.
    pub fn selected_component(&self) -> Option<ComponentHandle> {
        self.core.shared.selected_component()
    }

    /// Put the selected component in focus if it is selectable.
    ///
    /// Returns whether focus was taken.
    pub fn focus_selected(&self) -> bool {
        self.selected_component()
            .is_some_and(|component| component.state().set_in_focus(true))
    }

    /// Take focus away from the selected component, keeping it selected.
    pub fn unfocus_selected(&self) {
        if let Some(component) = self.selected_component() {
            component.state().set_in_focus(false);
        }
    }

    /// Route a key the way the engine-owned input thread would.
    ///
    /// For hosts running their own input loop. A [`RouteOutcome::Quit`] is
    /// only reported; disposing is left to the caller.
    pub fn route_key(&self, key: &KeyEvent) -> RouteOutcome {
        route_key(&self.core.shared, &self.core.config.key_map, key)
    }

    /// Clear and fully repaint the window on the next frame.
    pub fn trigger_window_refresh(&self) {
        self.core.shared.trigger_window_refresh();
    }

    /// Paint a single frame onto `surface` from the calling thread.
    ///
    /// For hosts that drive frames themselves instead of calling
    /// [`begin`](Self::begin). Refused once the render thread owns output.
    pub fn render_once(&self, surface: &mut dyn Surface) -> Result<FrameReport, EngineError> {
        if self.core.disposed.load(Ordering::Acquire) {
            return Err(EngineError::Disposed);
        }
        if self.core.started.load(Ordering::Acquire) {
            return Err(EngineError::AlreadyStarted);
        }
        Ok(render_frame(
            &self.core.shared,
            surface,
            self.core.config.viewport_size,
        ))
    }

    /// The engine's cancellation token.
    pub fn cancel_token(&self) -> CancelToken {
        self.core.shared.cancel.clone()
    }

    /// Whether the engine has been started and not yet cancelled.
    pub fn is_running(&self) -> bool {
        self.core.started.load(Ordering::Acquire) && !self.core.shared.cancel.is_cancelled()
    }

    /// Block until the engine is cancelled (quit key, dispose, or the
    /// cancel token).
    pub fn wait(&self) {
        self.core.shared.cancel.wait();
    }

    /// Frame statistics collected by the render loop.
    pub fn render_stats(&self) -> RenderStats {
        self.core.shared.render_stats()
    }

    /// Time since `begin`, frozen at disposal.
    pub fn uptime(&self) -> Duration {
        let started_at = *self.core.started_at.lock();
        started_at.map_or_else(|| *self.core.uptime.lock(), |started| started.elapsed())
    }

    /// Stop the render and input loops, wait for them, then remove and
    /// dispose every registered component.
    ///
    /// Returns only once teardown is complete, including when another thread
    /// (such as the input thread handling the quit key) started it. Later
    /// calls do nothing.
    pub fn dispose(&self) {
        self.core.dispose();
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.core.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("components", &self.len())
            .field("running", &self.is_running())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
