//! # RenderLite
//!
//! A retained-mode terminal UI engine with per-component update threads.
//!
//! Every component runs its own update loop on a dedicated thread and marks
//! itself dirty when its visible state changes. A single render thread
//! wakes at a fixed framerate and repaints only what changed.
//!
//! ## Core Concepts
//!
//! - **Damage tracking**: Components flag themselves for redraw or for a full window refresh
//! - **Single writer**: Only the render thread touches the terminal
//! - **Selection cycling**: One selected component at a time, optionally in focus
//! - **Cooperative cancellation**: Every thread watches a [`CancelToken`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use renderlite::{ComponentHandle, Engine, EngineConfig, InputMode, Position};
//!
//! let engine = Engine::stdout(EngineConfig {
//!     input_mode: InputMode::EngineOwned,
//!     ..EngineConfig::default()
//! })?;
//! engine.add_component(&ComponentHandle::spawn(Clock::default(), Position::new(2, 1), false)?);
//! engine.begin()?;
//! engine.wait();
//! engine.dispose();
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod component;
pub mod controller;
pub mod error;
pub mod signal;
pub mod terminal;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use actor::{
    Engine, EngineConfig, FrameReport, InputMode, KeyCode, KeyEvent, KeyMap, KeyModifiers,
    KeySource, RenderStats, RouteOutcome, Selection,
};
pub use component::{
    Component, ComponentHandle, ComponentId, ComponentState, KeyBindings, KeyScope, Position,
};
pub use controller::Controller;
pub use error::EngineError;
pub use signal::CancelToken;
pub use terminal::{AnsiSurface, Rgb, Style, Surface};
