//! Soundscape Canonical Scene Library
//!
//! This crate provides the data model, validation, and hashing for
//! declarative soundscape scenes and their generated outputs. A scene is a
//! JSON document describing distributions over event parameters; the
//! placement engine (in `soundscape-engine`) samples it into a concrete
//! soundscape, and this crate's annotation types record the result with
//! full provenance.
//!
//! # Overview
//!
//! - **Distributions**: every tunable event parameter is a
//!   [`DistributionSpec`]: a fixed literal or a declared distribution,
//!   evaluated through a single sampling dispatch.
//! - **Two-phase events**: [`EventSpec`] (declared template) and
//!   [`EventInstance`] (sampled realization) are distinct types linked by
//!   a non-owning index, which is what makes annotations reproducible.
//! - **Determinism**: scenes hash canonically (RFC 8785 + BLAKE3) and
//!   batch seeds derive from the base seed with BLAKE3.
//!
//! # Example
//!
//! ```
//! use soundscape_spec::{DistributionSpec, EventSpec, Scene};
//! use soundscape_spec::validation::validate_scene;
//!
//! let scene = Scene::builder(10.0)
//!     .max_polyphony(2)
//!     .event(EventSpec::background(
//!         DistributionSpec::constant("park"),
//!         DistributionSpec::choose_file("bg/park"),
//!         DistributionSpec::constant(0.0),
//!     ))
//!     .event(EventSpec::foreground(
//!         DistributionSpec::constant("siren"),
//!         DistributionSpec::choose_file("fg/siren"),
//!         DistributionSpec::constant(0.0),
//!         DistributionSpec::uniform(0.0, 8.0),
//!         DistributionSpec::constant(2.0),
//!         DistributionSpec::truncnorm(6.0, 2.0, 0.0, 12.0),
//!     ))
//!     .build();
//!
//! let result = validate_scene(&scene);
//! assert!(result.is_ok());
//! ```
//!
//! # Modules
//!
//! - [`annotation`]: versioned annotations with spec/value provenance
//! - [`distribution`]: the distribution descriptor catalog
//! - [`error`]: error and warning types
//! - [`event`]: event templates and instances
//! - [`hash`]: canonical hashing and seed derivation
//! - [`scene`]: scene documents and soundscapes
//! - [`validation`]: scene validation

pub mod annotation;
pub mod distribution;
pub mod error;
pub mod event;
pub mod hash;
pub mod scene;
pub mod validation;

// Re-export commonly used types at the crate root
pub use annotation::{Annotation, Observation, ObservationValue, ANNOTATION_VERSION};
pub use distribution::{DistributionSpec, ParamValue};
pub use error::{
    BackendError, DistributionError, ErrorCode, SceneError, ValidationError, ValidationResult,
    ValidationWarning, WarningCode,
};
pub use event::{EventInstance, EventSpec, Role};
pub use hash::{
    canonical_scene_hash, canonical_value_hash, derive_variation_seed, derive_variation_seed_str,
};
pub use scene::{
    BoundaryPolicy, ExhaustionPolicy, Scene, SceneBuilder, Soundscape, DEFAULT_MAX_EVENT_TRIALS,
    DEFAULT_REF_DB, SCENE_VERSION,
};
pub use validation::{is_standard_label, validate_scene};

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// A scene document written by hand parses, validates, and hashes.
    #[test]
    fn test_parse_full_scene_document() {
        let json = r#"{
            "scene_version": 1,
            "duration": 10.0,
            "ref_db": -12.0,
            "max_polyphony": 1,
            "allow_overlap": {"siren": false},
            "max_event_trials": 30,
            "boundary": "reject",
            "exhaustion": "fail",
            "events": [
                {
                    "label": {"dist": "const", "value": "park"},
                    "source_file": {"dist": "choose_file", "folder": "bg/park"},
                    "source_time": {"dist": "const", "value": 0.0},
                    "event_time": {"dist": "const", "value": 0.0},
                    "event_duration": {"dist": "const", "value": 0.0},
                    "snr": {"dist": "const", "value": 0.0},
                    "role": "background"
                },
                {
                    "label": {"dist": "const", "value": "siren"},
                    "source_file": {"dist": "choose_file", "folder": "fg/siren"},
                    "source_time": {"dist": "const", "value": 0.0},
                    "event_time": {"dist": "uniform", "min": 0.0, "max": 8.0},
                    "event_duration": {"dist": "const", "value": 2.0},
                    "snr": {"dist": "truncnorm", "mean": 6.0, "std": 2.0, "min": 0.0, "max": 12.0},
                    "pitch_shift": {"dist": "uniform", "min": -2.0, "max": 2.0},
                    "role": "foreground"
                }
            ]
        }"#;

        let scene = Scene::from_json(json).expect("should parse");
        assert_eq!(scene.scene_version, 1);
        assert_eq!(scene.duration, 10.0);
        assert_eq!(scene.events.len(), 2);
        assert!(!scene.allows_overlap("siren"));
        assert!(scene.allows_overlap("dog_bark"));

        let result = validate_scene(&scene);
        assert!(result.is_ok(), "errors: {:?}", result.errors);

        let hash = canonical_scene_hash(&scene).unwrap();
        assert_eq!(hash.len(), 64);
    }

    /// Scene documents round-trip through JSON unchanged.
    #[test]
    fn test_scene_document_round_trip() {
        let scene = Scene::builder(30.0)
            .ref_db(-20.0)
            .reverb(0.2)
            .max_polyphony(4)
            .allow_overlap("dog_bark", false)
            .event(EventSpec::background(
                DistributionSpec::constant("street"),
                DistributionSpec::choose_file("bg/street"),
                DistributionSpec::uniform(0.0, 60.0),
            ))
            .event(
                EventSpec::foreground(
                    DistributionSpec::choose(["dog_bark", "car_horn"]),
                    DistributionSpec::choose_file("fg"),
                    DistributionSpec::constant(0.0),
                    DistributionSpec::uniform(0.0, 28.0),
                    DistributionSpec::truncnorm(2.0, 0.5, 0.5, 4.0),
                    DistributionSpec::normal(6.0, 2.0),
                )
                .with_time_stretch(DistributionSpec::uniform(0.8, 1.2)),
            )
            .build();

        let json = scene.to_json_pretty().unwrap();
        let parsed = Scene::from_json(&json).unwrap();
        assert_eq!(parsed, scene);
        assert_eq!(
            canonical_scene_hash(&parsed).unwrap(),
            canonical_scene_hash(&scene).unwrap()
        );
    }
}
