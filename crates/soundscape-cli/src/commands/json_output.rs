//! Machine-readable output envelopes.
//!
//! Every command accepts `--json`; the envelope shape is shared so
//! tooling can parse any command's output the same way.

use serde::Serialize;
use soundscape_spec::{ValidationError, ValidationWarning};

/// A reported error in JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    /// Stable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Field path, when the error points at one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl JsonError {
    /// Creates an error entry.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }
}

/// A reported warning in JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonWarning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Field path, when the warning points at one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Converts a validation error.
pub fn validation_error_to_json(error: &ValidationError) -> JsonError {
    JsonError {
        code: error.code.to_string(),
        message: error.message.clone(),
        path: error.path.clone(),
    }
}

/// Converts a validation warning.
pub fn validation_warning_to_json(warning: &ValidationWarning) -> JsonWarning {
    JsonWarning {
        code: warning.code.to_string(),
        message: warning.message.clone(),
        path: warning.path.clone(),
    }
}

/// The common output envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    /// Whether the command succeeded.
    pub success: bool,
    /// Command-specific payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    /// Errors, when any occurred.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonError>,
    /// Warnings, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<JsonWarning>,
}

impl<T: Serialize> Envelope<T> {
    /// A successful envelope with a payload.
    pub fn success(result: T, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: Vec::new(),
            warnings,
        }
    }

    /// A failed envelope.
    pub fn failure(errors: Vec<JsonError>, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: false,
            result: None,
            errors,
            warnings,
        }
    }

    /// Prints the envelope as pretty JSON.
    pub fn print(&self) {
        let json =
            serde_json::to_string_pretty(self).expect("envelope serialization should not fail");
        println!("{}", json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundscape_spec::ErrorCode;

    #[test]
    fn test_envelope_success_shape() {
        let envelope = Envelope::success(serde_json::json!({"n": 1}), vec![]);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["result"]["n"], 1);
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_validation_error_conversion() {
        let error = ValidationError::with_path(
            ErrorCode::InvalidDuration,
            "duration must be positive",
            "duration",
        );
        let json = validation_error_to_json(&error);
        assert_eq!(json.code, "E002");
        assert_eq!(json.path.as_deref(), Some("duration"));
    }
}
