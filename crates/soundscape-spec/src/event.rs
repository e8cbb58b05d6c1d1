//! Event templates and their concrete realizations.
//!
//! The two-phase event model keeps the declared template ([`EventSpec`])
//! and the sampled outcome ([`EventInstance`]) as distinct types connected
//! by a non-owning index, rather than mutating one object in place. The
//! template is what a scene persists; the instance is what a soundscape
//! and its annotation carry.

use serde::{Deserialize, Serialize};

use crate::distribution::DistributionSpec;

/// Whether an event tiles the scene passively or is placed on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Background events tile the whole soundscape and are never
    /// polyphony-checked.
    Background,
    /// Foreground events are placed at a sampled time and checked against
    /// the scene's constraints.
    Foreground,
}

impl Role {
    /// Returns the role as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Background => "background",
            Role::Foreground => "foreground",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "background" => Ok(Role::Background),
            "foreground" => Ok(Role::Foreground),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// Declarative template for one sound event.
///
/// Every tunable field is a [`DistributionSpec`]; a fixed parameter is
/// expressed as a `const` descriptor. Templates are immutable once added
/// to a scene.
///
/// Background templates ignore `event_time` and `event_duration` (they
/// tile the full soundscape) and may not carry transforms; the
/// [`background`] constructor pins those fields accordingly.
///
/// [`background`]: EventSpec::background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    /// Event label (e.g. sound class); must sample to text.
    pub label: DistributionSpec,

    /// Source file path; must sample to text. `choose_file` descriptors
    /// are expanded lazily against the source catalog.
    pub source_file: DistributionSpec,

    /// Offset into the source file at which reading starts, in seconds.
    pub source_time: DistributionSpec,

    /// Placement time within the soundscape, in seconds.
    pub event_time: DistributionSpec,

    /// Duration of the placed event, in seconds.
    pub event_duration: DistributionSpec,

    /// Signal-to-noise ratio relative to the scene's reference level,
    /// in dB.
    pub snr: DistributionSpec,

    /// Pitch shift in semitones, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_shift: Option<DistributionSpec>,

    /// Time stretch factor (output duration = source span x factor),
    /// if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_stretch: Option<DistributionSpec>,

    /// Background or foreground.
    pub role: Role,
}

impl EventSpec {
    /// Creates a background template.
    ///
    /// Timing fields are pinned to `const(0)`: backgrounds tile the full
    /// soundscape and take their duration from the scene.
    pub fn background(
        label: DistributionSpec,
        source_file: DistributionSpec,
        source_time: DistributionSpec,
    ) -> Self {
        Self {
            label,
            source_file,
            source_time,
            event_time: DistributionSpec::constant(0.0),
            event_duration: DistributionSpec::constant(0.0),
            snr: DistributionSpec::constant(0.0),
            pitch_shift: None,
            time_stretch: None,
            role: Role::Background,
        }
    }

    /// Creates a foreground template without transforms.
    ///
    /// Use the struct literal (or [`with_pitch_shift`] /
    /// [`with_time_stretch`]) when transforms are wanted.
    ///
    /// [`with_pitch_shift`]: EventSpec::with_pitch_shift
    /// [`with_time_stretch`]: EventSpec::with_time_stretch
    pub fn foreground(
        label: DistributionSpec,
        source_file: DistributionSpec,
        source_time: DistributionSpec,
        event_time: DistributionSpec,
        event_duration: DistributionSpec,
        snr: DistributionSpec,
    ) -> Self {
        Self {
            label,
            source_file,
            source_time,
            event_time,
            event_duration,
            snr,
            pitch_shift: None,
            time_stretch: None,
            role: Role::Foreground,
        }
    }

    /// Attaches a pitch-shift descriptor.
    pub fn with_pitch_shift(mut self, pitch_shift: DistributionSpec) -> Self {
        self.pitch_shift = Some(pitch_shift);
        self
    }

    /// Attaches a time-stretch descriptor.
    pub fn with_time_stretch(mut self, time_stretch: DistributionSpec) -> Self {
        self.time_stretch = Some(time_stretch);
        self
    }

    /// Iterates over the template's distribution fields with their names.
    ///
    /// Used by validation and by the engine's sampling loop so field
    /// names in diagnostics stay consistent.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &DistributionSpec)> {
        [
            ("label", &self.label),
            ("source_file", &self.source_file),
            ("source_time", &self.source_time),
            ("event_time", &self.event_time),
            ("event_duration", &self.event_duration),
            ("snr", &self.snr),
        ]
        .into_iter()
        .chain(self.pitch_shift.as_ref().map(|d| ("pitch_shift", d)))
        .chain(self.time_stretch.as_ref().map(|d| ("time_stretch", d)))
    }
}

/// Fully sampled realization of an [`EventSpec`].
///
/// Every field is a literal. `spec_index` points back at the originating
/// template in the scene's declaration-ordered event list (a read-only
/// relation, not ownership), so annotations can carry full provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInstance {
    /// Sampled label.
    pub label: String,

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

    /// Background or foreground.
    pub role: Role,

    /// Index of the originating template in the scene's event list.
    pub spec_index: usize,
}

impl EventInstance {
    /// End time of the placed event, seconds.
    pub fn end_time(&self) -> f64 {
        self.event_time + self.event_duration
    }

    /// Length of source audio consumed, accounting for time stretch.
    ///
    /// A stretch factor of 2.0 doubles the output duration, so the source
    /// span consumed is `event_duration / 2.0`.
    pub fn source_span(&self) -> f64 {
        match self.time_stretch {
            Some(factor) if factor > 0.0 => self.event_duration / factor,
            _ => self.event_duration,
        }
    }

    /// Returns true if two placed intervals overlap.
    ///
    /// Intervals are half-open: an event ending at `t` does not overlap
    /// one starting at `t`.
    pub fn overlaps(&self, other: &EventInstance) -> bool {
        self.event_time < other.end_time() && other.event_time < self.end_time()
    }
}
