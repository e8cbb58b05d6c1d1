//! Structured, versioned annotations with full provenance.
//!
//! An annotation records every placed event twice: the concrete sampled
//! values (what ended up in the mix) and the originating distribution
//! descriptors (what the scene declared). The concrete side round-trips
//! exactly; the declarative side makes it possible to re-generate fresh
//! soundscapes from the same template, and [`Annotation::to_scene`]
//! const-wraps the sampled values so the placement engine reproduces the
//! identical mix without re-sampling.

use serde::{Deserialize, Serialize};

use crate::distribution::DistributionSpec;
use crate::event::{EventInstance, EventSpec, Role};
use crate::scene::Scene;
use crate::SceneError;

/// Current annotation format version.
pub const ANNOTATION_VERSION: u32 = 1;

/// Concrete sampled values of one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationValue {
    /// Sampled source file path.
    pub source_file: String,
    /// Read offset into the source file, seconds.
    pub source_time: f64,
    /// Placement time within the soundscape, seconds.
    pub event_time: f64,
    /// Placed duration, seconds.
    pub event_duration: f64,
    /// SNR relative to the scene reference level, dB.
    pub snr: f64,
    /// Sampled pitch shift in semitones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_shift: Option<f64>,
    /// Sampled time stretch factor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_stretch: Option<f64>,
}

/// One annotated event: concrete values plus originating descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Background or foreground.
    pub role: Role,
    /// Sampled label.
    pub label: String,
    /// Index of the originating template in the scene's event list.
    pub spec_index: usize,
    /// The sampled values.
    pub value: ObservationValue,
    /// The original distribution descriptors.
    pub spec: EventSpec,
}

/// A versioned soundscape annotation.
///
/// Stable across the same generation seed and library version. The
/// reference level is carried alongside duration and seed because a
/// reproduction scene built from the annotation needs it to recover the
/// original gain staging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation format version.
    pub version: u32,
    /// Soundscape duration, seconds.
    pub duration: f64,
    /// Generation seed.
    pub seed: u32,
    /// Reference loudness level of the originating scene, dB.
    pub ref_db: f64,
    /// Global reverb amount of the originating scene, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverb: Option<f64>,
    /// Annotated events, in mix order.
    pub observations: Vec<Observation>,
}

impl Annotation {
    /// Builds the annotation for a generated soundscape.
    pub fn from_soundscape(soundscape: &crate::scene::Soundscape) -> Self {
        let observations = soundscape
            .events
            .iter()
            .map(|instance| Observation {
                role: instance.role,
                label: instance.label.clone(),
                spec_index: instance.spec_index,
                value: ObservationValue {
                    source_file: instance.source_file.clone(),
                    source_time: instance.source_time,
                    event_time: instance.event_time,
                    event_duration: instance.event_duration,
                    snr: instance.snr,
                    pitch_shift: instance.pitch_shift,
                    time_stretch: instance.time_stretch,
                },
                spec: soundscape.scene.events[instance.spec_index].clone(),
            })
            .collect();

        Self {
            version: ANNOTATION_VERSION,
            duration: soundscape.duration,
            seed: soundscape.seed,
            ref_db: soundscape.scene.ref_db,
            reverb: soundscape.scene.reverb,
            observations,
        }
    }

    /// Reconstructs the concrete event instances, in mix order.
    ///
    /// Inverse of [`from_soundscape`] for every concrete-value field.
    ///
    /// [`from_soundscape`]: Annotation::from_soundscape
    pub fn to_instances(&self) -> Vec<EventInstance> {
        self.observations
            .iter()
            .map(|obs| EventInstance {
                label: obs.label.clone(),
                source_file: obs.value.source_file.clone(),
                source_time: obs.value.source_time,
                event_time: obs.value.event_time,
                event_duration: obs.value.event_duration,
                snr: obs.value.snr,
                pitch_shift: obs.value.pitch_shift,
                time_stretch: obs.value.time_stretch,
                role: obs.role,
                spec_index: obs.spec_index,
            })
            .collect()
    }

    /// Builds a scene that reproduces this annotation exactly.
    ///
    /// Every observation becomes a template with `const`-wrapped values,
    /// so instantiating the returned scene (with any seed) places the
    /// same events at the same times with the same parameters. The scene
    /// carries no polyphony or overlap constraints: the recorded
    /// placement already satisfied them.
    pub fn to_scene(&self) -> Scene {
        let mut builder = Scene::builder(self.duration).ref_db(self.ref_db);
        if let Some(reverb) = self.reverb {
            builder = builder.reverb(reverb);
        }
        for obs in &self.observations {
            let mut spec = EventSpec {
                label: DistributionSpec::constant(obs.label.as_str()),
                source_file: DistributionSpec::constant(obs.value.source_file.as_str()),
                source_time: DistributionSpec::constant(obs.value.source_time),
                event_time: DistributionSpec::constant(obs.value.event_time),
                event_duration: DistributionSpec::constant(obs.value.event_duration),
                snr: DistributionSpec::constant(obs.value.snr),
                pitch_shift: None,
                time_stretch: None,
                role: obs.role,
            };
            if let Some(shift) = obs.value.pitch_shift {
                spec.pitch_shift = Some(DistributionSpec::constant(shift));
            }
            if let Some(factor) = obs.value.time_stretch {
                spec.time_stretch = Some(DistributionSpec::constant(factor));
            }
            builder = builder.event(spec);
        }
        builder.build()
    }

    /// Parses an annotation from a JSON string.
    ///
    /// # Errors
    /// Fails on malformed JSON or an unsupported format version.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let annotation: Annotation = serde_json::from_str(json)?;
        if annotation.version != ANNOTATION_VERSION {
            return Err(SceneError::ValidationFailed(1));
        }
        Ok(annotation)
    }

    /// Serializes the annotation to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the annotation to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Soundscape;
    use pretty_assertions::assert_eq;

    fn sample_soundscape() -> Soundscape {
        let scene = Scene::builder(10.0)
            .ref_db(-18.0)
            .event(EventSpec::background(
                DistributionSpec::constant("park"),
                DistributionSpec::constant("bg/park/a.wav"),
                DistributionSpec::constant(0.0),
            ))
            .event(
                EventSpec::foreground(
                    DistributionSpec::constant("siren"),
                    DistributionSpec::choose_file("fg/siren"),
                    DistributionSpec::constant(0.0),
                    DistributionSpec::uniform(0.0, 8.0),
                    DistributionSpec::constant(2.0),
                    DistributionSpec::constant(6.0),
                )
                .with_pitch_shift(DistributionSpec::uniform(-1.0, 1.0)),
            )
            .build();

        let events = vec![
            EventInstance {
                label: "park".to_string(),
                source_file: "bg/park/a.wav".to_string(),
                source_time: 0.0,
                event_time: 0.0,
                event_duration: 10.0,
                snr: 0.0,
                pitch_shift: None,
                time_stretch: None,
                role: Role::Background,
                spec_index: 0,
            },
            EventInstance {
                label: "siren".to_string(),
                source_file: "fg/siren/wail.wav".to_string(),
                source_time: 0.0,
                event_time: 3.25,
                event_duration: 2.0,
                snr: 6.0,
                pitch_shift: Some(0.5),
                time_stretch: None,
                role: Role::Foreground,
                spec_index: 1,
            },
        ];

        Soundscape {
            duration: 10.0,
            seed: 42,
            events,
            scene,
        }
    }

    #[test]
    fn test_round_trip_concrete_values() {
        let soundscape = sample_soundscape();
        let annotation = Annotation::from_soundscape(&soundscape);

        let json = annotation.to_json_pretty().unwrap();
        let parsed = Annotation::from_json(&json).unwrap();
        assert_eq!(parsed, annotation);

        // parse(emit(soundscape)) recovers every concrete-value field.
        assert_eq!(parsed.to_instances(), soundscape.events);
        assert_eq!(parsed.duration, soundscape.duration);
        assert_eq!(parsed.seed, soundscape.seed);
    }

    #[test]
    fn test_observation_carries_original_spec() {
        let soundscape = sample_soundscape();
        let annotation = Annotation::from_soundscape(&soundscape);

        let fg = &annotation.observations[1];
        assert_eq!(fg.spec, soundscape.scene.events[1]);
        assert_eq!(fg.spec.event_time, DistributionSpec::uniform(0.0, 8.0));
    }

    #[test]
    fn test_to_scene_const_wraps_values() {
        let soundscape = sample_soundscape();
        let annotation = Annotation::from_soundscape(&soundscape);
        let replay = annotation.to_scene();

        assert_eq!(replay.duration, 10.0);
        assert_eq!(replay.ref_db, -18.0);
        assert_eq!(replay.events.len(), 2);

        let fg = &replay.events[1];
        assert_eq!(fg.event_time, DistributionSpec::constant(3.25));
        assert_eq!(fg.event_duration, DistributionSpec::constant(2.0));
        assert_eq!(fg.pitch_shift, Some(DistributionSpec::constant(0.5)));
        assert!(fg.time_stretch.is_none());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let soundscape = sample_soundscape();
        let mut annotation = Annotation::from_soundscape(&soundscape);
        annotation.version = 99;
        let json = annotation.to_json().unwrap();
        assert!(Annotation::from_json(&json).is_err());
    }
}
