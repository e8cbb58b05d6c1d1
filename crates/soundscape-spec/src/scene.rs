//! Scene documents and generated soundscapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::{EventInstance, EventSpec, Role};

/// Current scene document version.
pub const SCENE_VERSION: u32 = 1;

/// Default per-event trial budget for the placement engine.
pub const DEFAULT_MAX_EVENT_TRIALS: u32 = 30;

/// Default reference loudness level, dB.
pub const DEFAULT_REF_DB: f64 = -12.0;

/// What to do when a sampled foreground event would cross the scene
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Reject the candidate and retry within the trial budget.
    #[default]
    Reject,
    /// Clamp the candidate's duration at the scene boundary.
    Truncate,
}

/// What to do when an event's trial budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Fail the whole generation with a placement error.
    #[default]
    Fail,
    /// Drop the event and record it as skipped.
    Skip,
}

/// A declarative soundscape scene.
///
/// Owns the ordered event templates (backgrounds plus foregrounds, in
/// declaration order) and the global constraints the placement engine
/// enforces. A scene serializes to a versioned JSON document independent
/// of any sampled state, so templates can be shared and versioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    /// Schema version; must be 1 for v1 documents.
    pub scene_version: u32,

    /// Target soundscape duration, seconds.
    pub duration: f64,

    /// Reference loudness level in dB. Backgrounds are mixed at this
    /// level and foreground SNR is expressed relative to it.
    pub ref_db: f64,

    /// Optional global reverb amount, forwarded to the renderer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverb: Option<f64>,

    /// Maximum simultaneous foreground events; `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_polyphony: Option<u32>,

    /// Per-label overlap permission. Labels absent from the map may
    /// overlap themselves.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub allow_overlap: BTreeMap<String, bool>,

    /// Per-event trial budget for constraint-checked placement.
    #[serde(default = "default_trials")]
    pub max_event_trials: u32,

    /// Boundary handling for foreground candidates.
    #[serde(default)]
    pub boundary: BoundaryPolicy,

    /// Behavior when a trial budget is exhausted.
    #[serde(default)]
    pub exhaustion: ExhaustionPolicy,

    /// Event templates, declaration order.
    pub events: Vec<EventSpec>,
}

fn default_trials() -> u32 {
    DEFAULT_MAX_EVENT_TRIALS
}

impl Scene {
    /// Creates a new scene builder for the given duration.
    pub fn builder(duration: f64) -> SceneBuilder {
        SceneBuilder::new(duration)
    }

    /// Parses a scene from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the scene to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the scene to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the scene to a JSON value.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Background templates with their declaration indices.
    pub fn backgrounds(&self) -> impl Iterator<Item = (usize, &EventSpec)> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.role == Role::Background)
    }

    /// Foreground templates with their declaration indices.
    pub fn foregrounds(&self) -> impl Iterator<Item = (usize, &EventSpec)> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.role == Role::Foreground)
    }

    /// Whether instances of `label` may overlap each other.
    pub fn allows_overlap(&self, label: &str) -> bool {
        self.allow_overlap.get(label).copied().unwrap_or(true)
    }
}

/// Builder for constructing [`Scene`] documents incrementally.
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    duration: f64,
    ref_db: f64,
    reverb: Option<f64>,
    max_polyphony: Option<u32>,
    allow_overlap: BTreeMap<String, bool>,
    max_event_trials: u32,
    boundary: BoundaryPolicy,
    exhaustion: ExhaustionPolicy,
    events: Vec<EventSpec>,
}

impl SceneBuilder {
    /// Creates a new builder for the given duration.
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            ref_db: DEFAULT_REF_DB,
            reverb: None,
            max_polyphony: None,
            allow_overlap: BTreeMap::new(),
            max_event_trials: DEFAULT_MAX_EVENT_TRIALS,
            boundary: BoundaryPolicy::default(),
            exhaustion: ExhaustionPolicy::default(),
            events: Vec::new(),
        }
    }

    /// Sets the reference loudness level.
    pub fn ref_db(mut self, ref_db: f64) -> Self {
        self.ref_db = ref_db;
        self
    }

    /// Sets the global reverb amount.
    pub fn reverb(mut self, reverb: f64) -> Self {
        self.reverb = Some(reverb);
        self
    }

    /// Bounds the number of simultaneous foreground events.
    pub fn max_polyphony(mut self, max: u32) -> Self {
        self.max_polyphony = Some(max);
        self
    }

    /// Sets the overlap permission for one label.
    pub fn allow_overlap(mut self, label: impl Into<String>, allowed: bool) -> Self {
        self.allow_overlap.insert(label.into(), allowed);
        self
    }

    /// Sets the per-event trial budget.
    pub fn max_event_trials(mut self, trials: u32) -> Self {
        self.max_event_trials = trials;
        self
    }

    /// Sets the boundary policy.
    pub fn boundary(mut self, policy: BoundaryPolicy) -> Self {
        self.boundary = policy;
        self
    }

    /// Sets the exhaustion policy.
    pub fn exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion = policy;
        self
    }

    /// Appends an event template (background or foreground).
    pub fn event(mut self, event: EventSpec) -> Self {
        self.events.push(event);
        self
    }

    /// Builds the scene.
    pub fn build(self) -> Scene {
        Scene {
            scene_version: SCENE_VERSION,
            duration: self.duration,
            ref_db: self.ref_db,
            reverb: self.reverb,
            max_polyphony: self.max_polyphony,
            allow_overlap: self.allow_overlap,
            max_event_trials: self.max_event_trials,
            boundary: self.boundary,
            exhaustion: self.exhaustion,
            events: self.events,
        }
    }
}

/// A generated soundscape: the concrete output of one instantiation.
///
/// Events are ordered backgrounds-first, then foregrounds sorted by
/// `event_time` (declaration order breaks ties). Immutable once built;
/// safely shared read-only across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Soundscape {
    /// Resolved total duration, seconds.
    pub duration: f64,

    /// Seed the instantiation was driven by.
    pub seed: u32,

    /// Concrete event instances, in mix order.
    pub events: Vec<EventInstance>,

    /// Snapshot of the scene that produced this soundscape.
    pub scene: Scene,
}

impl Soundscape {
    /// Background instances, in mix order.
    pub fn backgrounds(&self) -> impl Iterator<Item = &EventInstance> {
        self.events.iter().filter(|e| e.role == Role::Background)
    }

    /// Foreground instances, in mix order.
    pub fn foregrounds(&self) -> impl Iterator<Item = &EventInstance> {
        self.events.iter().filter(|e| e.role == Role::Foreground)
    }

    /// Maximum number of simultaneous foreground events at any instant.
    ///
    /// Computed with an arrival/departure sweep: each start counts +1,
    /// each end counts -1, and the running sum's peak is the polyphony.
    /// Intervals are half-open, so at equal times departures are
    /// processed before arrivals.
    pub fn max_polyphony(&self) -> u32 {
        let mut bounds: Vec<(f64, i32)> = Vec::new();
        for event in self.foregrounds() {
            bounds.push((event.event_time, 1));
            bounds.push((event.end_time(), -1));
        }
        bounds.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        let mut current = 0i32;
        let mut peak = 0i32;
        for (_, delta) in bounds {
            current += delta;
            peak = peak.max(current);
        }
        peak.max(0) as u32
    }

    /// Serializes the soundscape to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
