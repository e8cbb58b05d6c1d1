//! Constraint-checked event placement.
//!
//! `instantiate` turns a declarative scene into a concrete soundscape:
//! backgrounds are sampled once and tiled across the full duration,
//! foregrounds are drawn repeatedly under a counted trial budget until a
//! candidate satisfies the scene's constraints. All sampling draws from
//! one seeded generator, so the same scene and seed always produce the
//! same soundscape, bit for bit.

use rand_pcg::Pcg32;

use soundscape_spec::validation::validate_scene;
use soundscape_spec::{
    BoundaryPolicy, DistributionSpec, EventInstance, EventSpec, ExhaustionPolicy, Role, Scene,
    Soundscape,
};

use crate::error::{Constraint, EngineError, EngineResult};
use crate::rng::create_rng;
use crate::sampler::{sample_f64, sample_text};
use crate::source::SourceCatalog;

/// A foreground event dropped under the `skip` exhaustion policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    /// Declaration index of the dropped template.
    pub spec_index: usize,
    /// Label sampled in the last trial.
    pub label: String,
    /// Trials attempted before giving up.
    pub trials: u32,
    /// Constraint violated by the last candidate.
    pub constraint: Constraint,
}

/// Output of one instantiation.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantiateResult {
    /// The generated soundscape.
    pub soundscape: Soundscape,
    /// Events dropped under the `skip` exhaustion policy. Empty under
    /// the default `fail` policy.
    pub skipped: Vec<SkippedEvent>,
}

/// Instantiates a scene into a concrete soundscape.
///
/// Deterministic given `seed`: the retry loop and every sample draw from
/// a single PCG32 generator created from it.
///
/// # Arguments
/// * `scene` - The declarative scene
/// * `seed` - Generation seed
/// * `catalog` - Source folder/duration access
///
/// # Errors
/// * [`EngineError::InvalidScene`] when the scene fails validation
/// * [`EngineError::Placement`] when a trial budget is exhausted under
///   the `fail` policy
/// * [`EngineError::SourceBounds`] when a background offset cannot be
///   placed within its source
/// * [`EngineError::Distribution`] / [`EngineError::Catalog`] for
///   malformed descriptors or unreadable sources
pub fn instantiate(
    scene: &Scene,
    seed: u32,
    catalog: &dyn SourceCatalog,
) -> EngineResult<InstantiateResult> {
    let validation = validate_scene(scene);
    if !validation.is_ok() {
        return Err(EngineError::InvalidScene {
            count: validation.errors.len(),
            first: validation.errors[0].to_string(),
        });
    }

    let mut rng = create_rng(seed);
    let mut backgrounds: Vec<EventInstance> = Vec::new();
    let mut foregrounds: Vec<EventInstance> = Vec::new();
    let mut skipped: Vec<SkippedEvent> = Vec::new();

    for (spec_index, spec) in scene.backgrounds() {
        let instance = place_background(scene, spec_index, spec, &mut rng, catalog)?;
        backgrounds.push(instance);
    }

    for (spec_index, spec) in scene.foregrounds() {
        match place_foreground(
            scene,
            spec_index,
            spec,
            &backgrounds,
            &foregrounds,
            &mut rng,
            catalog,
        )? {
            Placed::Accepted(instance) => foregrounds.push(instance),
            Placed::Exhausted {
                label,
                trials,
                constraint,
            } => match scene.exhaustion {
                ExhaustionPolicy::Fail => {
                    return Err(EngineError::Placement {
                        spec_index,
                        label,
                        trials,
                        constraint,
                    })
                }
                ExhaustionPolicy::Skip => skipped.push(SkippedEvent {
                    spec_index,
                    label,
                    trials,
                    constraint,
                }),
            },
        }
    }

    // Stable sort: equal event times keep declaration order.
    foregrounds.sort_by(|a, b| {
        a.event_time
            .partial_cmp(&b.event_time)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut events = backgrounds;
    events.extend(foregrounds);

    Ok(InstantiateResult {
        soundscape: Soundscape {
            duration: scene.duration,
            seed,
            events,
            scene: scene.clone(),
        },
        skipped,
    })
}

/// Outcome of the foreground trial loop.
enum Placed {
    Accepted(EventInstance),
    Exhausted {
        label: String,
        trials: u32,
        constraint: Constraint,
    },
}

fn place_background(
    scene: &Scene,
    spec_index: usize,
    spec: &EventSpec,
    rng: &mut Pcg32,
    catalog: &dyn SourceCatalog,
) -> EngineResult<EventInstance> {
    let label = text_field(spec_index, "label", &spec.label, rng, catalog)?;
    let source_file = text_field(spec_index, "source_file", &spec.source_file, rng, catalog)?;
    let source_duration = probe_duration(catalog, &source_file)?;
    let snr = number_field(spec_index, "snr", &spec.snr, rng, catalog)?;

    // The tiling in the assembly stage wraps to the file start at EOF, so
    // any offset inside the file is safe; offsets outside it are not.
    let mut source_time = 0.0;
    let mut placed = false;
    for _ in 0..scene.max_event_trials {
        source_time = number_field(spec_index, "source_time", &spec.source_time, rng, catalog)?;
        if source_time >= 0.0 && source_time < source_duration {
            placed = true;
            break;
        }
    }
    if !placed {
        return Err(EngineError::SourceBounds {
            spec_index,
            label,
            source_path: source_file,
            source_time,
            span: scene.duration,
            source_duration,
        });
    }

    Ok(EventInstance {
        label,
        source_file,
        source_time,
        event_time: 0.0,
        event_duration: scene.duration,
        snr,
        pitch_shift: None,
        time_stretch: None,
        role: Role::Background,
        spec_index,
    })
}

#[allow(clippy::too_many_arguments)]
fn place_foreground(
    scene: &Scene,
    spec_index: usize,
    spec: &EventSpec,
    backgrounds: &[EventInstance],
    accepted: &[EventInstance],
    rng: &mut Pcg32,
    catalog: &dyn SourceCatalog,
) -> EngineResult<Placed> {
    let mut last_violation = Constraint::DurationBound;
    let mut last_label = String::new();

    for _ in 0..scene.max_event_trials {
        let label = text_field(spec_index, "label", &spec.label, rng, catalog)?;
        last_label = label.clone();
        let source_file =
            text_field(spec_index, "source_file", &spec.source_file, rng, catalog)?;
        let source_time =
            number_field(spec_index, "source_time", &spec.source_time, rng, catalog)?;
        let event_time = number_field(spec_index, "event_time", &spec.event_time, rng, catalog)?;
        let mut event_duration = number_field(
            spec_index,
            "event_duration",
            &spec.event_duration,
            rng,
            catalog,
        )?;
        let snr = number_field(spec_index, "snr", &spec.snr, rng, catalog)?;
        let pitch_shift = match &spec.pitch_shift {
            Some(dist) => Some(number_field(spec_index, "pitch_shift", dist, rng, catalog)?),
            None => None,
        };
        let time_stretch = match &spec.time_stretch {
            Some(dist) => Some(number_field(spec_index, "time_stretch", dist, rng, catalog)?),
            None => None,
        };

        // A non-positive duration is always rejected and retried, never
        // silently zeroed.
        if event_duration <= 0.0 {
            last_violation = Constraint::NonPositiveDuration;
            continue;
        }
        if let Some(factor) = time_stretch {
            if factor <= 0.0 {
                last_violation = Constraint::NonPositiveStretch;
                continue;
            }
        }

        if event_time < 0.0 {
            last_violation = Constraint::DurationBound;
            continue;
        }
        if event_time + event_duration > scene.duration {
            match scene.boundary {
                BoundaryPolicy::Truncate => {
                    event_duration = scene.duration - event_time;
                    if event_duration <= 0.0 {
                        last_violation = Constraint::DurationBound;
                        continue;
                    }
                }
                BoundaryPolicy::Reject => {
                    last_violation = Constraint::DurationBound;
                    continue;
                }
            }
        }

        let candidate = EventInstance {
            label,
            source_file,
            source_time,
            event_time,
            event_duration,
            snr,
            pitch_shift,
            time_stretch,
            role: Role::Foreground,
            spec_index,
        };

        let source_duration = probe_duration(catalog, &candidate.source_file)?;
        if candidate.source_time < 0.0
            || candidate.source_time + candidate.source_span() > source_duration
        {
            last_violation = Constraint::SourceBounds;
            continue;
        }

        if let Some(max) = scene.max_polyphony {
            let peak = peak_overlap(accepted, candidate.event_time, candidate.end_time());
            if peak + 1 > max {
                last_violation = Constraint::Polyphony;
                continue;
            }
        }

        if !scene.allows_overlap(&candidate.label) {
            let clash = backgrounds
                .iter()
                .chain(accepted.iter())
                .any(|e| e.label == candidate.label && e.overlaps(&candidate));
            if clash {
                last_violation = Constraint::LabelOverlap;
                continue;
            }
        }

        return Ok(Placed::Accepted(candidate));
    }

    Ok(Placed::Exhausted {
        label: last_label,
        trials: scene.max_event_trials,
        constraint: last_violation,
    })
}

/// Peak number of accepted instances simultaneously active anywhere in
/// `[start, end)`.
///
/// Boundary sweep over the overlapping instances; half-open intervals,
/// so a departure at `t` is processed before an arrival at `t`.
fn peak_overlap(accepted: &[EventInstance], start: f64, end: f64) -> u32 {
    let mut bounds: Vec<(f64, i32)> = Vec::new();
    for event in accepted {
        if event.event_time < end && start < event.end_time() {
            bounds.push((event.event_time.max(start), 1));
            bounds.push((event.end_time().min(end), -1));
        }
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

fn text_field(
    spec_index: usize,
    field: &'static str,
    dist: &DistributionSpec,
    rng: &mut Pcg32,
    catalog: &dyn SourceCatalog,
) -> EngineResult<String> {
    sample_text(dist, rng, catalog).map_err(|source| EngineError::Distribution {
        spec_index,
        field,
        source,
    })
}

fn number_field(
    spec_index: usize,
    field: &'static str,
    dist: &DistributionSpec,
    rng: &mut Pcg32,
    catalog: &dyn SourceCatalog,
) -> EngineResult<f64> {
    sample_f64(dist, rng, catalog).map_err(|source| EngineError::Distribution {
        spec_index,
        field,
        source,
    })
}

fn probe_duration(catalog: &dyn SourceCatalog, path: &str) -> EngineResult<f64> {
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
