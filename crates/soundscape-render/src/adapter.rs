//! The render adapter boundary.
//!
//! The core hands a [`MixSpec`](soundscape_engine::MixSpec) across this
//! boundary and gets a rendered file back. The adapter only needs four
//! operations (trim, pitch shift, time stretch, mix), so [`Renderer`] is
//! exactly that surface, and [`render`] composes them. Everything DSP
//! lives behind the trait.

use std::path::{Path, PathBuf};

use soundscape_engine::MixSpec;

use crate::error::RenderResult;

/// An intermediate audio buffer staged by the renderer.
///
/// Implementations back buffers with files in a staging directory; the
/// handle is just the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBuffer {
    /// Location of the staged audio.
    pub path: PathBuf,
}

impl RenderBuffer {
    /// Wraps a staged file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// One input to the final mix.
#[derive(Debug, Clone)]
pub struct MixTrack {
    /// The staged buffer to mix in.
    pub buffer: RenderBuffer,
    /// Target level, dB.
    pub gain_db: f64,
    /// Placement offset from the start of the mix, seconds.
    pub offset: f64,
}

/// The operations the core requires of an external audio collaborator.
pub trait Renderer {
    /// Cuts `duration` seconds from `source` starting at `start`.
    fn trim(&self, source: &Path, start: f64, duration: f64) -> RenderResult<RenderBuffer>;

    /// Shifts a buffer's pitch by `semitones` without changing duration.
    fn pitch_shift(&self, buffer: &RenderBuffer, semitones: f64) -> RenderResult<RenderBuffer>;

    /// Stretches a buffer's duration by `factor` without changing pitch.
    fn time_stretch(&self, buffer: &RenderBuffer, factor: f64) -> RenderResult<RenderBuffer>;

    /// Mixes tracks into a single file of `duration` seconds at `out`.
    fn mix(&self, tracks: &[MixTrack], duration: f64, out: &Path) -> RenderResult<()>;
}

/// Renders a mix specification to `out`.
///
/// Each segment is trimmed from its source, stretched and pitch-shifted
/// as declared, then handed to the final mix at its offset and gain. The
/// call is atomic from the caller's perspective: either `out` holds the
/// full mixture or an error is returned and no retry is attempted.
///
/// # Errors
/// The first failing operation aborts the render; the error names it.
pub fn render(renderer: &dyn Renderer, mix: &MixSpec, out: &Path) -> RenderResult<()> {
    let mut tracks = Vec::with_capacity(mix.segments.len());

    for segment in &mix.segments {
        // Trim the source span that produces this segment. A stretched
        // segment consumes `len / factor` seconds of source.
        let factor = segment.time_stretch.unwrap_or(1.0);
        let source_span = segment.len() / factor;

        let mut buffer = renderer.trim(
            Path::new(&segment.source),
            segment.source_start,
            source_span,
        )?;
        if let Some(factor) = segment.time_stretch {
            buffer = renderer.time_stretch(&buffer, factor)?;
        }
        if let Some(semitones) = segment.pitch_shift {
            buffer = renderer.pitch_shift(&buffer, semitones)?;
        }

        tracks.push(MixTrack {
            buffer,
            gain_db: segment.gain_db,
            offset: segment.start,
        });
    }

    renderer.mix(&tracks, mix.duration, out)
}
