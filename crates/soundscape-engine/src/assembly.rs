//! Mix specification assembly.
//!
//! A mix specification is the sole contract between the core and the
//! render adapter: a sequence of timed, gain-annotated segments. It
//! carries no file-format or DSP detail, only which source region plays
//! when, at what target level, and with which declared transforms.

use serde::{Deserialize, Serialize};

use soundscape_spec::{Role, Soundscape};

use crate::error::{EngineError, EngineResult};
use crate::source::SourceCatalog;

/// Float tolerance for tiling arithmetic.
const TILE_EPSILON: f64 = 1e-9;

/// One timed segment of the mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSegment {
    /// Index of the originating instance in the soundscape's event list.
    pub event_index: usize,
    /// Background or foreground.
    pub role: Role,
    /// Source file path.
    pub source: String,
    /// Read offset into the source, seconds.
    pub source_start: f64,
    /// Segment start in the soundscape, seconds.
    pub start: f64,
    /// Segment end in the soundscape, seconds.
    pub end: f64,
    /// Target level for this segment, dB.
    pub gain_db: f64,
    /// Pitch shift in semitones, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_shift: Option<f64>,
    /// Time stretch factor, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_stretch: Option<f64>,
}

impl MixSegment {
    /// Segment length, seconds.
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// Returns true for zero-length segments.
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }
}

/// The full mix specification handed to the render adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSpec {
    /// Total mix duration, seconds.
    pub duration: f64,
    /// Global reverb amount, if the scene declared one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverb: Option<f64>,
    /// Ordered segments: background tiling first, then foreground
    /// overlays in mix order.
    pub segments: Vec<MixSegment>,
}

impl MixSpec {
    /// Parses a mix spec from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the mix spec to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Background segments only.
    pub fn background_segments(&self) -> impl Iterator<Item = &MixSegment> {
        self.segments.iter().filter(|s| s.role == Role::Background)
    }

    /// Foreground segments only.
    pub fn foreground_segments(&self) -> impl Iterator<Item = &MixSegment> {
        self.segments.iter().filter(|s| s.role == Role::Foreground)
    }
}

/// Builds the mix specification for a generated soundscape.
///
/// Background instances are concatenated in declaration order, cycling
/// the background list and wrapping each source to its start at EOF, so
/// the bed covers exactly `[0, duration]` with no gaps and no overlaps
/// among backgrounds. Each background segment targets the scene's
/// reference level; each foreground overlay targets `ref_db + snr`.
///
/// # Errors
/// * [`EngineError::Catalog`] when a source duration cannot be probed.
pub fn build_mix(soundscape: &Soundscape, catalog: &dyn SourceCatalog) -> EngineResult<MixSpec> {
    let ref_db = soundscape.scene.ref_db;
    let mut segments = Vec::new();

    let backgrounds: Vec<(usize, &soundscape_spec::EventInstance)> = soundscape
        .events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.role == Role::Background)
        .collect();

    if !backgrounds.is_empty() {
        let mut durations = Vec::with_capacity(backgrounds.len());
        let mut offsets = Vec::with_capacity(backgrounds.len());
        for (_, instance) in &backgrounds {
            let duration = probe(catalog, &instance.source_file)?;
            durations.push(duration);
            offsets.push(instance.source_time);
        }

        let mut cursor = 0.0;
        let mut turn = 0usize;
        while soundscape.duration - cursor > TILE_EPSILON {
            let i = turn % backgrounds.len();
            let (event_index, instance) = backgrounds[i];
            let available = durations[i] - offsets[i];
            let chunk = available.min(soundscape.duration - cursor);

            segments.push(MixSegment {
                event_index,
                role: Role::Background,
                source: instance.source_file.clone(),
                source_start: offsets[i],
                start: cursor,
                end: cursor + chunk,
                gain_db: ref_db,
                pitch_shift: None,
                time_stretch: None,
            });

            cursor += chunk;
            offsets[i] = 0.0;
            turn += 1;
        }
    }

    for (event_index, instance) in soundscape.events.iter().enumerate() {
        if instance.role != Role::Foreground {
            continue;
        }
        segments.push(MixSegment {
            event_index,
            role: Role::Foreground,
            source: instance.source_file.clone(),
            source_start: instance.source_time,
            start: instance.event_time,
            end: instance.end_time(),
            gain_db: ref_db + instance.snr,
            pitch_shift: instance.pitch_shift,
            time_stretch: instance.time_stretch,
        });
    }

    Ok(MixSpec {
        duration: soundscape.duration,
        reverb: soundscape.scene.reverb,
        segments,
    })
}

fn probe(catalog: &dyn SourceCatalog, path: &str) -> EngineResult<f64> {
    let duration = catalog
        .duration_of(path)
        .map_err(|e| EngineError::Catalog {
            path: path.to_string(),
            message: e.to_string(),
        })?;
    if duration <= 0.0 {
        return Err(EngineError::Catalog {
            path: path.to_string(),
            message: format!("source has non-positive duration {}", duration),
        });
    }
    Ok(duration)
}
