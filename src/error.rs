use std::io;
use thiserror::Error;

/// Reasons a screen couldn’t be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoadError {
    /// `load` was called before `initialize`. Nothing was changed.
    #[error("screen has not been initialized")]
    NotInitialized,
    /// Initialization finished without producing a view graph, e.g. because the markup couldn’t
    /// be parsed.
    #[error("screen has no view")]
    EmptyView,
    /// No layout parameters could be constructed for the parent container.
    #[error("layout parameters unavailable for the parent container")]
    ParamsUnavailable,
    /// Initialization didn’t finish within the configured timeout. `load` may be called again.
    #[error("timed out waiting for initialization")]
    TimedOut,
}

/// Errors that may occur when setting up a loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to spawn worker threads: {0}")]
    Spawn(#[from] io::Error),
}
