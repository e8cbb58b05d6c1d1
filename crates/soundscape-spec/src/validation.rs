//! Scene validation.
//!
//! Validation is eager: everything that can be checked without sampling is
//! checked here, so malformed distributions surface at scene construction
//! rather than mid-generation. Constraints that depend on sampled values
//! (source bounds, polyphony) are enforced by the placement engine.

use std::sync::OnceLock;

use regex::Regex;

use crate::distribution::{DistributionSpec, ParamValue};
use crate::error::{
    ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
use crate::event::{EventSpec, Role};
use crate::scene::{Scene, SCENE_VERSION};

/// Recommended label format: lowercase alphanumeric with underscores,
/// matching the folder-name convention of source collections.
pub const LABEL_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

static LABEL_REGEX: OnceLock<Regex> = OnceLock::new();

fn label_regex() -> &'static Regex {
    LABEL_REGEX.get_or_init(|| Regex::new(LABEL_PATTERN).expect("invalid regex pattern"))
}

/// Checks whether a label matches the recommended format.
pub fn is_standard_label(label: &str) -> bool {
    label_regex().is_match(label)
}

/// Validates a scene and returns the collected errors and warnings.
///
/// # Arguments
/// * `scene` - The scene to validate
///
/// # Returns
/// * `ValidationResult`; `is_ok()` when no errors were found.
pub fn validate_scene(scene: &Scene) -> ValidationResult {
    let mut result = ValidationResult::new();

    if scene.scene_version != SCENE_VERSION {
        result.add_error(ValidationError::with_path(
            ErrorCode::UnsupportedSceneVersion,
            format!(
                "scene_version {} is not supported (expected {})",
                scene.scene_version, SCENE_VERSION
            ),
            "scene_version",
        ));
    }

    if !scene.duration.is_finite() || scene.duration <= 0.0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidDuration,
            format!("duration must be positive and finite, got {}", scene.duration),
            "duration",
        ));
    }

    if !scene.ref_db.is_finite() {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidRefDb,
            format!("ref_db must be finite, got {}", scene.ref_db),
            "ref_db",
        ));
    }

    if scene.max_event_trials == 0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::ZeroTrialBudget,
            "max_event_trials must be at least 1",
            "max_event_trials",
        ));
    }

    for (index, event) in scene.events.iter().enumerate() {
        validate_event(index, event, &mut result);
    }

    if scene.backgrounds().next().is_none() {
        result.add_warning(ValidationWarning::new(
            WarningCode::NoBackground,
            "scene has no background entry; the bed will be silence",
        ));
    }

    if scene.max_polyphony.is_none() && scene.foregrounds().next().is_some() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::UnboundedPolyphony,
            "max_polyphony is unset; simultaneous foreground events are unbounded",
            "max_polyphony",
        ));
    }

    result
}

fn validate_event(index: usize, event: &EventSpec, result: &mut ValidationResult) {
    for (field, dist) in event.fields() {
        let path = format!("events[{}].{}", index, field);

        if let Err(err) = dist.validate() {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidDistribution,
                err.to_string(),
                path.clone(),
            ));
            continue;
        }

        match field {
            "label" => validate_text_field(field, dist, false, &path, result),
            "source_file" => validate_text_field(field, dist, true, &path, result),
            "event_duration" => {
                if event.role == Role::Foreground {
                    if let Some(value) = const_number(dist) {
                        if value <= 0.0 {
                            result.add_error(ValidationError::with_path(
                                ErrorCode::InvalidConstValue,
                                format!("event_duration must be positive, got {}", value),
                                path.clone(),
                            ));
                        }
                    }
                }
            }
            "source_time" => {
                if let Some(value) = const_number(dist) {
                    if value < 0.0 {
                        result.add_error(ValidationError::with_path(
                            ErrorCode::InvalidConstValue,
                            format!("source_time must be non-negative, got {}", value),
                            path.clone(),
                        ));
                    }
                }
            }
            "time_stretch" => {
                if let Some(value) = const_number(dist) {
                    if value <= 0.0 {
                        result.add_error(ValidationError::with_path(
                            ErrorCode::InvalidConstValue,
                            format!("time_stretch must be positive, got {}", value),
                            path.clone(),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    if event.role == Role::Background {
        if event.pitch_shift.is_some() {
            result.add_error(ValidationError::with_path(
                ErrorCode::BackgroundTransform,
                "background events do not support pitch_shift",
                format!("events[{}].pitch_shift", index),
            ));
        }
        if event.time_stretch.is_some() {
            result.add_error(ValidationError::with_path(
                ErrorCode::BackgroundTransform,
                "background events do not support time_stretch",
                format!("events[{}].time_stretch", index),
            ));
        }
    }

    // Label-format warnings only apply where the label is statically known.
    if let Some(ParamValue::Text(label)) = event.label.as_const() {
        if !is_standard_label(label) {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::NonstandardLabel,
                format!("label '{}' does not match {}", label, LABEL_PATTERN),
                format!("events[{}].label", index),
            ));
        }
    }
}

/// Checks that a text-valued field uses a descriptor that can only yield
/// text. `choose_file` is allowed where `file_ok` is set.
fn validate_text_field(
    field: &str,
    dist: &DistributionSpec,
    file_ok: bool,
    path: &str,
    result: &mut ValidationResult,
) {
    let ok = match dist {
        DistributionSpec::Const { value } => value.as_text().is_some(),
        DistributionSpec::Choose { options } => options.iter().all(|o| o.as_text().is_some()),
        DistributionSpec::ChooseWeighted { options, .. } => {
            options.iter().all(|o| o.as_text().is_some())
        }
        DistributionSpec::ChooseFile { .. } => file_ok,
        _ => false,
    };

    if !ok {
        result.add_error(ValidationError::with_path(
            ErrorCode::NonTextLabel,
            format!("{} requires a text-valued descriptor, got {}", field, dist.kind()),
            path,
        ));
    }
}

fn const_number(dist: &DistributionSpec) -> Option<f64> {
    dist.as_const().and_then(ParamValue::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionSpec;
    use crate::scene::Scene;

    fn valid_foreground() -> EventSpec {
        EventSpec::foreground(
            DistributionSpec::constant("siren"),
            DistributionSpec::choose_file("fg/siren"),
            DistributionSpec::constant(0.0),
            DistributionSpec::uniform(0.0, 8.0),
            DistributionSpec::constant(2.0),
            DistributionSpec::constant(6.0),
        )
    }

    fn valid_background() -> EventSpec {
        EventSpec::background(
            DistributionSpec::constant("park"),
            DistributionSpec::choose_file("bg/park"),
            DistributionSpec::constant(0.0),
        )
    }

    #[test]
    fn test_valid_scene_passes() {
        let scene = Scene::builder(10.0)
            .max_polyphony(2)
            .event(valid_background())
            .event(valid_foreground())
            .build();
        let result = validate_scene(&scene);
        assert!(result.is_ok(), "errors: {:?}", result.errors);
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    }

    #[test]
    fn test_unsupported_version() {
        let mut scene = Scene::builder(10.0).build();
        scene.scene_version = 99;
        let result = validate_scene(&scene);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::UnsupportedSceneVersion));
    }

    #[test]
    fn test_non_positive_duration() {
        let scene = Scene::builder(0.0).build();
        let result = validate_scene(&scene);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::InvalidDuration));
    }

    #[test]
    fn test_bad_distribution_reported_with_path() {
        let mut event = valid_foreground();
        event.event_time = DistributionSpec::uniform(8.0, 0.0);
        let scene = Scene::builder(10.0)
            .max_polyphony(1)
            .event(event)
            .build();
        let result = validate_scene(&scene);

        let err = result
            .errors
            .iter()
            .find(|e| e.code == ErrorCode::InvalidDistribution)
            .expect("expected a distribution error");
        assert_eq!(err.path.as_deref(), Some("events[0].event_time"));
    }

    #[test]
    fn test_numeric_label_rejected() {
        let mut event = valid_foreground();
        event.label = DistributionSpec::constant(3.0);
        let scene = Scene::builder(10.0)
            .max_polyphony(1)
            .event(event)
            .build();
        let result = validate_scene(&scene);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::NonTextLabel));
    }

    #[test]
    fn test_choose_file_invalid_for_label() {
        let mut event = valid_foreground();
        event.label = DistributionSpec::choose_file("fg");
        let scene = Scene::builder(10.0)
            .max_polyphony(1)
            .event(event)
            .build();
        let result = validate_scene(&scene);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::NonTextLabel));
    }

    #[test]
    fn test_background_transform_rejected() {
        let mut event = valid_background();
        event.pitch_shift = Some(DistributionSpec::constant(1.0));
        let scene = Scene::builder(10.0).event(event).build();
        let result = validate_scene(&scene);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::BackgroundTransform));
    }

    #[test]
    fn test_const_duration_must_be_positive() {
        let mut event = valid_foreground();
        event.event_duration = DistributionSpec::constant(-1.0);
        let scene = Scene::builder(10.0)
            .max_polyphony(1)
            .event(event)
            .build();
        let result = validate_scene(&scene);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::InvalidConstValue));
    }

    #[test]
    fn test_zero_trial_budget() {
        let scene = Scene::builder(10.0).max_event_trials(0).build();
        let result = validate_scene(&scene);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::ZeroTrialBudget));
    }

    #[test]
    fn test_warnings() {
        let scene = Scene::builder(10.0).event(valid_foreground()).build();
        let result = validate_scene(&scene);
        assert!(result.is_ok());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::NoBackground));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::UnboundedPolyphony));
    }

    #[test]
    fn test_nonstandard_label_warning() {
        let mut event = valid_foreground();
        event.label = DistributionSpec::constant("Siren!");
        let scene = Scene::builder(10.0)
            .max_polyphony(1)
            .event(valid_background())
            .event(event)
            .build();
        let result = validate_scene(&scene);
        assert!(result.is_ok());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::NonstandardLabel));
    }

    #[test]
    fn test_is_standard_label() {
        assert!(is_standard_label("dog_bark"));
        assert!(is_standard_label("siren2"));
        assert!(!is_standard_label("DogBark"));
        assert!(!is_standard_label("2siren"));
        assert!(!is_standard_label(""));
    }
}
