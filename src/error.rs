//! Error types for mount, update and render operations.

use thiserror::Error;

/// Errors raised by the reconciler.
///
/// Host failures propagate to whoever triggered the mount or update. When the
/// trigger was a reactive notification there is no caller to return to, so
/// the error is logged and queued on the [`Reconciler`](crate::Reconciler)
/// instead (see [`Reconciler::take_errors`](crate::Reconciler::take_errors)).
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// A host adapter operation failed.
    #[error("host operation '{op}' failed: {reason}")]
    Host { op: &'static str, reason: String },

    /// Attempted to mount a mount point that has already been disposed.
    #[error("mount point has been disposed")]
    Disposed,

    /// Attempted to memoize an action.
    #[error("computed mappers cannot wrap actions")]
    ActionNotMemoizable,
}

impl Error {
    /// Shorthand for building a [`Error::Host`] from inside an adapter.
    pub fn host(op: &'static str, reason: impl Into<String>) -> Self {
        Error::Host {
            op,
            reason: reason.into(),
        }
    }

    /// Check if this error came from the host adapter.
    pub fn is_host_error(&self) -> bool {
        matches!(self, Error::Host { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
