//! Error types for scene validation and processing.

use thiserror::Error;

/// Malformed or inconsistent distribution parameters.
///
/// Detected eagerly at scene construction where possible, otherwise at
/// sample time. Parameters are never silently coerced.
#[derive(Debug, Error)]
pub enum DistributionError {
    /// Lower bound exceeds upper bound.
    #[error("{kind}: min {min} exceeds max {max}")]
    InvalidBounds {
        /// Descriptor kind tag.
        kind: &'static str,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// Standard deviation is zero or negative.
    #[error("{kind}: std must be positive, got {std}")]
    NonPositiveStd {
        /// Descriptor kind tag.
        kind: &'static str,
        /// The offending value.
        std: f64,
    },

    /// A numeric parameter is NaN or infinite.
    #[error("{kind}: parameter '{param}' must be finite, got {value}")]
    NonFiniteParameter {
        /// Descriptor kind tag.
        kind: &'static str,
        /// Parameter name.
        param: &'static str,
        /// The offending value.
        value: f64,
    },

    /// A choice descriptor has no options.
    #[error("{kind}: option list is empty")]
    EmptyOptions {
        /// Descriptor kind tag.
        kind: &'static str,
    },

    /// Option and weight counts differ.
    #[error("choose_weighted: {options} option(s) but {weights} weight(s)")]
    WeightCountMismatch {
        /// Number of options.
        options: usize,
        /// Number of weights.
        weights: usize,
    },

    /// A weight is negative, NaN, or infinite.
    #[error("choose_weighted: weight {weight} is not a finite non-negative number")]
    InvalidWeight {
        /// The offending weight.
        weight: f64,
    },

    /// All weights are zero.
    #[error("choose_weighted: weights sum to zero")]
    ZeroWeightSum,

    /// A `choose_file` descriptor names an empty folder path.
    #[error("choose_file: folder path is empty")]
    EmptyFolderPath,

    /// A `choose_file` folder expanded to no files at sample time.
    #[error("choose_file: folder '{folder}' contains no files")]
    EmptyFolder {
        /// The folder that was listed.
        folder: String,
    },

    /// A `choose_file` folder could not be listed.
    #[error("choose_file: cannot list folder '{folder}': {message}")]
    FolderUnreadable {
        /// The folder that was listed.
        folder: String,
        /// Stringified I/O failure.
        message: String,
    },

    /// A sampled value has the wrong type for its field.
    #[error("expected a {expected} value, sampled {found}")]
    WrongValueType {
        /// Required value type.
        expected: &'static str,
        /// Sampled value type.
        found: &'static str,
    },

    /// Rejection sampling exhausted its draw budget.
    ///
    /// Happens when a `truncnorm` window lies so far in the tail that no
    /// draw lands inside it within the budget.
    #[error("{kind}: no draw landed in range after {attempts} attempt(s)")]
    Unsamplable {
        /// Descriptor kind tag.
        kind: &'static str,
        /// Number of draws made.
        attempts: u32,
    },
}

/// Top-level error type for scene document operations.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Scene validation failed with one or more errors.
    #[error("scene validation failed with {0} error(s)")]
    ValidationFailed(usize),

    /// A distribution attached to an event is inconsistent.
    #[error("invalid {field} distribution for event {index}: {source}")]
    Distribution {
        /// Index of the event in declaration order.
        index: usize,
        /// Field carrying the bad descriptor.
        field: &'static str,
        /// The underlying inconsistency.
        #[source]
        source: DistributionError,
    },

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error codes for scene validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// E001: Unsupported scene_version
    UnsupportedSceneVersion,
    /// E002: Soundscape duration not positive and finite
    InvalidDuration,
    /// E003: Inconsistent distribution parameters
    InvalidDistribution,
    /// E004: Trial budget is zero
    ZeroTrialBudget,
    /// E005: Transform distribution on a background event
    BackgroundTransform,
    /// E006: Reference level not finite
    InvalidRefDb,
    /// E007: Label descriptor cannot produce text
    NonTextLabel,
    /// E008: Constant duration or stretch value out of range
    InvalidConstValue,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedSceneVersion => "E001",
            ErrorCode::InvalidDuration => "E002",
            ErrorCode::InvalidDistribution => "E003",
            ErrorCode::ZeroTrialBudget => "E004",
            ErrorCode::BackgroundTransform => "E005",
            ErrorCode::InvalidRefDb => "E006",
            ErrorCode::NonTextLabel => "E007",
            ErrorCode::InvalidConstValue => "E008",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for scene validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Scene has no background entry
    NoBackground,
    /// W002: Polyphony is unbounded
    UnboundedPolyphony,
    /// W003: Label does not match the recommended format
    NonstandardLabel,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::NoBackground => "W001",
            WarningCode::UnboundedPolyphony => "W002",
            WarningCode::NonstandardLabel => "W003",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the problematic field (e.g., "events[2].event_duration").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a field path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Path to the problematic field.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation warning with a field path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of scene validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates an empty (successful) result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

/// Common trait for generation-stage errors.
///
/// Implemented by the placement engine and render adapter error types so
/// the CLI can report failures uniformly without depending on each stage's
/// concrete error enum.
pub trait BackendError: std::error::Error {
    /// Stable error code for reporting (e.g., "PLACE_001").
    fn code(&self) -> &'static str;

    /// Human-readable message, owned for flexible reporting.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Error category for grouping (e.g., "placement", "render").
    fn category(&self) -> &'static str;
}
