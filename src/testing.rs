//! Test doubles shared by the unit tests.

use crate::actor::{KeyCode, KeyEvent, KeySource};
use crate::component::{Component, ComponentHandle, ComponentState, KeyBindings};
use crate::signal::CancelToken;
use crate::terminal::{Rgb, Style, Surface};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SurfaceOp {
    Clear,
    Cursor(u16, u16),
    Reset,
    Viewport(u16, u16),
    Print(String),
    Present,
}

/// Shared view of everything a [`RecordingSurface`] was asked to do.
#[derive(Clone, Default)]
pub(crate) struct OpLog(Arc<Mutex<Vec<SurfaceOp>>>);

impl OpLog {
    pub(crate) fn snapshot(&self) -> Vec<SurfaceOp> {
        self.0.lock().clone()
    }

    pub(crate) fn count(&self, op: &SurfaceOp) -> usize {
        self.0.lock().iter().filter(|o| *o == op).count()
    }

    pub(crate) fn prints_of(&self, text: &str) -> usize {
        self.count(&SurfaceOp::Print(text.to_string()))
    }

    pub(crate) fn printed_at(&self, x: u16, y: u16, text: &str) -> bool {
        self.0.lock().windows(2).any(|pair| {
            pair[0] == SurfaceOp::Cursor(x, y) && pair[1] == SurfaceOp::Print(text.to_string())
        })
    }

    pub(crate) fn wait_for(&self, op: &SurfaceOp, times: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.count(op) >= times {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        self.count(op) >= times
    }
}

pub(crate) struct RecordingSurface {
    log: OpLog,
}

impl RecordingSurface {
    pub(crate) fn new() -> (Self, OpLog) {
        let log = OpLog::default();
        (Self { log: log.clone() }, log)
    }

    fn push(&self, op: SurfaceOp) {
        self.log.0.lock().push(op);
    }
}

impl Surface for RecordingSurface {
    fn clear_all(&mut self) {
        self.push(SurfaceOp::Clear);
    }

    fn set_cursor_position(&mut self, x: u16, y: u16) {
        self.push(SurfaceOp::Cursor(x, y));
    }

    fn reset_style(&mut self) {
        self.push(SurfaceOp::Reset);
    }

    fn set_viewport_size(&mut self, width: u16, height: u16) {
        self.push(SurfaceOp::Viewport(width, height));
    }

    fn print(&mut self, text: &str) {
        self.push(SurfaceOp::Print(text.to_string()));
    }

    fn set_fg(&mut self, _color: Rgb) {}

    fn set_bg(&mut self, _color: Rgb) {}

    fn set_style(&mut self, _style: Style) {}

    fn present(&mut self) -> io::Result<()> {
        self.push(SurfaceOp::Present);
        Ok(())
    }
}

enum Mode {
    Idle,
    Pulsing { count: usize, interval: Duration },
    SelfDisposing,
    Lingering(Duration),
}

/// A component that prints its label and counts what happens to it.
///
/// Binds `s` in selected scope and `f` in focus scope.
pub(crate) struct Probe {
    label: String,
    mode: Mode,
    bindings: KeyBindings,
    key_hits: Arc<AtomicUsize>,
    draws: AtomicUsize,
    pulses: AtomicUsize,
    releases: AtomicUsize,
    exited: AtomicBool,
    handle: Mutex<Option<ComponentHandle>>,
}

impl Probe {
    fn with_mode(label: &str, mode: Mode) -> Self {
        let key_hits = Arc::new(AtomicUsize::new(0));
        let selected_hits = Arc::clone(&key_hits);
        let focus_hits = Arc::clone(&key_hits);
        let bindings = KeyBindings::new()
            .on_selected(KeyCode::Char('s'), move |_| {
                selected_hits.fetch_add(1, Ordering::SeqCst);
            })
            .on_focus(KeyCode::Char('f'), move |_| {
                focus_hits.fetch_add(1, Ordering::SeqCst);
            });

        Self {
            label: label.to_string(),
            mode,
            bindings,
            key_hits,
            draws: AtomicUsize::new(0),
            pulses: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            exited: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    pub(crate) fn new(label: &str) -> Self {
        Self::with_mode(label, Mode::Idle)
    }

    /// Marks itself dirty `count` times, `interval` apart.
    pub(crate) fn pulsing(label: &str, count: usize, interval: Duration) -> Self {
        Self::with_mode(label, Mode::Pulsing { count, interval })
    }

    /// Disposes its own handle from the update thread once installed.
    pub(crate) fn self_disposing(label: &str) -> Self {
        Self::with_mode(label, Mode::SelfDisposing)
    }

    /// Keeps running for `linger` after cancellation, making disposal slow.
    pub(crate) fn lingering(label: &str, linger: Duration) -> Self {
        Self::with_mode(label, Mode::Lingering(linger))
    }

    pub(crate) fn install_handle(&self, handle: ComponentHandle) {
        *self.handle.lock() = Some(handle);
    }

    pub(crate) fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    pub(crate) fn pulses(&self) -> usize {
        self.pulses.load(Ordering::SeqCst)
    }

    pub(crate) fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub(crate) fn key_hits(&self) -> usize {
        self.key_hits.load(Ordering::SeqCst)
    }

    pub(crate) fn update_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    pub(crate) fn wait_for_pulses(&self, n: usize, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while self.pulses() < n {
            assert!(Instant::now() < deadline, "timed out waiting for {n} pulses");
            thread::sleep(Duration::from_millis(1));
        }
    }

    pub(crate) fn wait_for_draws(&self, n: usize, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while self.draws() < n {
            assert!(Instant::now() < deadline, "timed out waiting for {n} draws");
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Component for Probe {
    fn draw(&self, surface: &mut dyn Surface, state: &ComponentState) {
        let position = state.position();
        surface.print_at(position.x, position.y, &self.label);
        self.draws.fetch_add(1, Ordering::SeqCst);
    }

    fn update(&self, state: &ComponentState, cancel: &CancelToken) {
        match self.mode {
            Mode::Idle => cancel.wait(),
            Mode::Pulsing { count, interval } => {
                for _ in 0..count {
                    if !cancel.sleep(interval) {
                        break;
                    }
                    state.mark_dirty();
                    self.pulses.fetch_add(1, Ordering::SeqCst);
                }
                cancel.wait();
            }
            Mode::SelfDisposing => loop {
                let handle = self.handle.lock().take();
                if let Some(handle) = handle {
                    handle.dispose();
                    self.pulses.fetch_add(1, Ordering::SeqCst);
                    break;
                }
                if !cancel.sleep(Duration::from_millis(1)) {
                    break;
                }
            },
            Mode::Lingering(linger) => {
                cancel.wait();
                thread::sleep(linger);
            }
        }
        self.exited.store(true, Ordering::SeqCst);
    }

    fn key_bindings(&self) -> Option<&KeyBindings> {
        Some(&self.bindings)
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Key source replaying a fixed script, then idling.
pub(crate) struct ScriptedKeys {
    keys: VecDeque<KeyEvent>,
    gap: Duration,
}

impl ScriptedKeys {
    pub(crate) fn new(keys: impl IntoIterator<Item = KeyCode>, gap: Duration) -> Self {
        Self {
            keys: keys.into_iter().map(KeyEvent::new).collect(),
            gap,
        }
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if let Some(key) = self.keys.pop_front() {
            thread::sleep(self.gap);
            Ok(Some(key))
        } else {
            thread::sleep(timeout);
            Ok(None)
        }
    }
}

/// Key source whose every read fails.
pub(crate) struct FailingKeys;

impl KeySource for FailingKeys {
    fn next_key(&mut self, _timeout: Duration) -> io::Result<Option<KeyEvent>> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"))
    }
}
