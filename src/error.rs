//! Error type for engine and component lifecycle operations.
//!
//! Expected edge cases (empty registry, no selection, adding a component
//! twice, disposing twice) are not errors. Only conditions the host must act
//! on surface here.

use std::io;
use thiserror::Error;

/// Errors reported by the engine and component handles.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `begin` was called on an engine that is already running.
    #[error("engine has already been started")]
    AlreadyStarted,

    /// The engine was disposed and cannot be started or reconfigured.
    #[error("engine has been disposed")]
    Disposed,

    /// The OS refused to spawn one of the engine's activity threads.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Name of the thread that could not be spawned.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Terminal mode setup (raw mode, alternate screen) failed.
    #[error("terminal setup failed: {0}")]
    Terminal(#[from] io::Error),
}

impl EngineError {
    pub(crate) fn spawn(name: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            name: name.into(),
            source,
        }
    }
}
