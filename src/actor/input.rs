//! Input Actor: Dedicated thread that reads keys and routes them.
//!
//! Keys come from a [`KeySource`]. Each key is routed through the engine:
//! the quit key shuts the engine down, navigation keys move the selection,
//! everything else goes to the selected component. This thread never draws.

use super::engine::{Selection, Shared};
use super::messages::{KeyCode, KeyEvent, KeyModifiers};
use crate::error::EngineError;
use crossterm::event::{self, Event, KeyEventKind};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A blocking source of key events.
pub trait KeySource: Send {
    /// Wait up to `timeout` for the next key press.
    ///
    /// Returns `Ok(None)` if no key arrived in time.
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

/// Reads key presses from the terminal through crossterm.
#[derive(Debug, Default)]
pub struct CrosstermKeySource;

impl CrosstermKeySource {
    /// Create a key source reading from the process terminal.
    pub const fn new() -> Self {
        Self
    }

    /// Convert a crossterm event to our KeyEvent.
    fn convert_event(event: Event) -> Option<KeyEvent> {
        match event {
            Event::Key(key_event) => {
                // Only process key press events (not release or repeat)
                if key_event.kind != KeyEventKind::Press {
                    return None;
                }

                let code = Self::convert_key_code(key_event.code)?;
                let modifiers = Self::convert_modifiers(key_event.modifiers);

                Some(KeyEvent::with_modifiers(code, modifiers))
            }
            _ => None,
        }
    }

    /// Convert crossterm KeyCode to our KeyCode.
    fn convert_key_code(code: event::KeyCode) -> Option<KeyCode> {
        Some(match code {
            event::KeyCode::Char(c) => KeyCode::Char(c),
            event::KeyCode::F(n) => KeyCode::F(n),
            event::KeyCode::Backspace => KeyCode::Backspace,
            event::KeyCode::Enter => KeyCode::Enter,
            event::KeyCode::Left => KeyCode::Left,
            event::KeyCode::Right => KeyCode::Right,
            event::KeyCode::Up => KeyCode::Up,
            event::KeyCode::Down => KeyCode::Down,
            event::KeyCode::Home => KeyCode::Home,
            event::KeyCode::End => KeyCode::End,
            event::KeyCode::PageUp => KeyCode::PageUp,
            event::KeyCode::PageDown => KeyCode::PageDown,
            event::KeyCode::Tab => KeyCode::Tab,
            event::KeyCode::BackTab => KeyCode::BackTab,
            event::KeyCode::Delete => KeyCode::Delete,
            event::KeyCode::Insert => KeyCode::Insert,
            event::KeyCode::Esc => KeyCode::Esc,
            _ => return None,
        })
    }

    /// Convert crossterm KeyModifiers to our KeyModifiers.
    fn convert_modifiers(mods: event::KeyModifiers) -> KeyModifiers {
        KeyModifiers {
            shift: mods.contains(event::KeyModifiers::SHIFT),
            control: mods.contains(event::KeyModifiers::CONTROL),
            alt: mods.contains(event::KeyModifiers::ALT),
        }
    }
}

impl KeySource for CrosstermKeySource {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if event::poll(timeout)? {
            Ok(Self::convert_event(event::read()?))
        } else {
            Ok(None)
        }
    }
}

/// Keys the router interprets instead of forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    /// Shut the engine down.
    pub quit: KeyCode,
    /// Put the selected component in focus.
    pub focus: KeyCode,
    /// Select the previous component.
    pub previous: KeyCode,
    /// Select the next component.
    pub next: KeyCode,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            quit: KeyCode::Esc,
            focus: KeyCode::Enter,
            previous: KeyCode::Up,
            next: KeyCode::Down,
        }
    }
}

/// What the router did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The quit key was pressed.
    Quit,
    /// The selected component took focus.
    Focused,
    /// The selection moved.
    Navigated(Selection),
    /// The key went to the selected component.
    Forwarded {
        /// Whether the component handled it.
        handled: bool,
    },
    /// Nothing could use the key.
    Ignored,
}

/// Route one key through the engine's selection state.
///
/// The quit key always wins. While the selected component is in focus it
/// receives every other key. Otherwise the focus and navigation keys are
/// interpreted here and anything else is offered to the selected component.
pub(crate) fn route_key(shared: &Shared, key_map: &KeyMap, key: &KeyEvent) -> RouteOutcome {
    if key.code == key_map.quit {
        return RouteOutcome::Quit;
    }

    let selected = shared.selected_component();
    if let Some(component) = &selected {
        if component.state().is_in_focus() {
            return RouteOutcome::Forwarded {
                handled: component.on_keypress(key),
            };
        }
    }

    if key.code == key_map.focus {
        return match selected {
            Some(component) if component.state().set_in_focus(true) => {
                debug!(id = %component.id(), "component focused");
                RouteOutcome::Focused
            }
            _ => RouteOutcome::Ignored,
        };
    }

    let navigation = if key.code == key_map.previous {
        Some(Selection::Previous)
    } else if key.code == key_map.next {
        Some(Selection::Next)
    } else {
        None
    };
    if let Some(selection) = navigation {
        shared.select(selection);
        return RouteOutcome::Navigated(selection);
    }

    selected.map_or(RouteOutcome::Ignored, |component| RouteOutcome::Forwarded {
        handled: component.on_keypress(key),
    })
}

/// Input actor that reads and routes keys.
pub(crate) struct InputActor {
    /// Handle to the input thread.
    handle: Option<JoinHandle<()>>,
}

impl InputActor {
    /// Spawn the input thread.
    ///
    /// `on_quit` runs on the input thread when the quit key is routed.
    pub(crate) fn spawn(
        shared: Arc<Shared>,
        mut source: Box<dyn KeySource>,
        key_map: KeyMap,
        poll_timeout: Duration,
        on_quit: Box<dyn FnOnce() + Send>,
    ) -> Result<Self, EngineError> {
        let name = "renderlite-input";
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                if Self::run_loop(&shared, source.as_mut(), &key_map, poll_timeout) {
                    info!("quit key pressed");
                    on_quit();
                }
            })
            .map_err(|e| EngineError::spawn(name, e))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Whether the caller is running on the input thread.
    pub(crate) fn is_current(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| handle.thread().id() == thread::current().id())
    }

    /// Wait for the input thread to finish.
    ///
    /// Called from the input thread itself (quit-driven disposal), this
    /// returns without joining.
    pub(crate) fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("input thread panicked");
            }
        }
    }

    /// Main input loop. Returns `true` if it stopped because of the quit key.
    ///
    /// A failing key source cancels the engine.
    fn run_loop(
        shared: &Shared,
        source: &mut dyn KeySource,
        key_map: &KeyMap,
        poll_timeout: Duration,
    ) -> bool {
        let cancel = shared.cancel_token();

        while !cancel.is_cancelled() {
            match source.next_key(poll_timeout) {
                Ok(Some(key)) => {
                    if route_key(shared, key_map, &key) == RouteOutcome::Quit {
                        return true;
                    }
                }
                Ok(None) => {
                    // No key, loop again to check cancellation.
                }
                Err(e) => {
                    // Without input nothing can quit, so end the session.
                    warn!(error = %e, "key source failed, cancelling engine");
                    cancel.cancel();
                    break;
                }
            }
        }

        false
    }
}
