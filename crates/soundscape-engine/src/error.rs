//! Error types for the placement engine.

use soundscape_spec::{BackendError, DistributionError};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// The constraint a candidate placement violated.
///
/// Tracked explicitly through the retry loop so an exhausted budget can
/// report the last reason a candidate was rejected, instead of a generic
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Candidate crossed the soundscape boundary or started before 0.
    DurationBound,
    /// Accepting the candidate would exceed `max_polyphony`.
    Polyphony,
    /// Candidate overlaps an accepted instance of the same exclusive
    /// label.
    LabelOverlap,
    /// Candidate would read outside the source file's valid range.
    SourceBounds,
    /// Sampled event duration was zero or negative.
    NonPositiveDuration,
    /// Sampled time-stretch factor was zero or negative.
    NonPositiveStretch,
}

impl Constraint {
    /// Returns the constraint name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Constraint::DurationBound => "duration_bound",
            Constraint::Polyphony => "polyphony",
            Constraint::LabelOverlap => "label_overlap",
            Constraint::SourceBounds => "source_bounds",
            Constraint::NonPositiveDuration => "non_positive_duration",
            Constraint::NonPositiveStretch => "non_positive_stretch",
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during instantiation and assembly.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The scene failed validation before any sampling happened.
    #[error("scene failed validation with {count} error(s): {first}")]
    InvalidScene {
        /// Number of validation errors.
        count: usize,
        /// The first error, rendered.
        first: String,
    },

    /// A foreground event exhausted its trial budget.
    #[error(
        "no placement found for event {spec_index} ('{label}') after {trials} trial(s); \
         last violated constraint: {constraint}"
    )]
    Placement {
        /// Declaration index of the offending template.
        spec_index: usize,
        /// Label sampled in the last trial.
        label: String,
        /// Trials attempted.
        trials: u32,
        /// Constraint violated by the last candidate.
        constraint: Constraint,
    },

    /// A sampled read window falls outside the source file.
    #[error(
        "event {spec_index} ('{label}') cannot read {span:.3}s starting at {source_time:.3}s \
         from '{source_path}' ({source_duration:.3}s long)"
    )]
    SourceBounds {
        /// Declaration index of the offending template.
        spec_index: usize,
        /// Sampled label.
        label: String,
        /// Source file path.
        source_path: String,
        /// Sampled read offset, seconds.
        source_time: f64,
        /// Required source span, seconds.
        span: f64,
        /// Actual source duration, seconds.
        source_duration: f64,
    },

    /// A distribution failed at sample time.
    #[error("cannot sample {field} of event {spec_index}: {source}")]
    Distribution {
        /// Declaration index of the offending template.
        spec_index: usize,
        /// Field whose descriptor failed.
        field: &'static str,
        /// The underlying failure.
        #[source]
        source: DistributionError,
    },

    /// The source catalog could not answer a query.
    #[error("source catalog error for '{path}': {message}")]
    Catalog {
        /// The queried path.
        path: String,
        /// Stringified failure.
        message: String,
    },
}

impl BackendError for EngineError {
    fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidScene { .. } => "PLACE_001",
            EngineError::Placement { .. } => "PLACE_002",
            EngineError::SourceBounds { .. } => "PLACE_003",
            EngineError::Distribution { .. } => "PLACE_004",
            EngineError::Catalog { .. } => "PLACE_005",
        }
    }

    fn category(&self) -> &'static str {
        "placement"
    }
}
