//! Error types for the render adapter.

use soundscape_spec::BackendError;
use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors surfaced by the external render collaborator.
///
/// Render failures are reported unmodified and never retried: the
/// external process invocation is not idempotent. A failed render leaves
/// the generated annotation and mix specification fully valid.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The external audio tool was not found.
    #[error(
        "sox executable not found. Ensure SoX is installed and in PATH, \
         or set SOUNDSCAPE_SOX_PATH"
    )]
    ToolNotFound,

    /// The tool could not be spawned.
    #[error("failed to spawn render process for '{op}': {source}")]
    SpawnFailed {
        /// The render operation being attempted.
        op: &'static str,
        /// The spawn failure.
        #[source]
        source: std::io::Error,
    },

    /// The tool ran past its deadline.
    #[error("render operation '{op}' timed out after {timeout_secs} seconds")]
    Timeout {
        /// The render operation being attempted.
        op: &'static str,
        /// Deadline in seconds.
        timeout_secs: u64,
    },

    /// The tool exited with a non-zero status.
    #[error("render operation '{op}' exited with status {exit_code}: {stderr}")]
    OperationFailed {
        /// The render operation that failed.
        op: &'static str,
        /// Process exit code.
        exit_code: i32,
        /// Captured stderr.
        stderr: String,
    },

    /// I/O error staging intermediates.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError for RenderError {
    fn code(&self) -> &'static str {
        match self {
            RenderError::ToolNotFound => "RENDER_001",
            RenderError::SpawnFailed { .. } => "RENDER_002",
            RenderError::Timeout { .. } => "RENDER_003",
            RenderError::OperationFailed { .. } => "RENDER_004",
            RenderError::Io(_) => "RENDER_005",
        }
    }

    fn category(&self) -> &'static str {
        "render"
    }
}
