//! Actor Model: The engine and the threads it runs.
//!
//! - **Render Actor**: Paces frames, repaints dirty components, flushes once per frame
//! - **Input Actor**: Reads keys, routes them to the selection or the selected component
//! - **Update threads**: One per component, owned by its [`ComponentHandle`](crate::ComponentHandle)
//! - **Engine**: Owns the registry and coordinates the actors
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   route_key    ┌──────────────┐
//! │ Input Thread │ ─────────────▶ │              │
//! └──────────────┘                │   Registry   │
//!                                 │  (snapshot)  │
//! ┌──────────────┐   draw dirty   │              │
//! │Render Thread │ ◀───────────── │              │
//! └──────────────┘                └──────────────┘
//!                                        ▲
//!                                        │ mark_dirty
//!                                 ┌──────────────┐
//!                                 │Update Threads│
//!                                 └──────────────┘
//! ```

mod engine;
mod input;
mod messages;
mod registry;
mod renderer;

pub use engine::{Engine, EngineConfig, InputMode, Selection};
pub use input::{CrosstermKeySource, KeyMap, KeySource, RouteOutcome};
pub use messages::{KeyCode, KeyEvent, KeyModifiers};
pub use renderer::{FrameReport, RenderStats};
