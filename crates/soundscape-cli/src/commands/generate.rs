//! Generate command implementation
//!
//! Instantiates a scene into one or more soundscapes, writing the
//! annotation and mix specification for each, and optionally rendering
//! audio through the SoX adapter.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use soundscape_engine::{build_mix, instantiate, FsCatalog, InstantiateResult};
use soundscape_render::{render, SoxRenderer};
use soundscape_spec::{derive_variation_seed, Annotation, BackendError, Scene};

use super::json_output::{Envelope, JsonError, JsonWarning};

/// Run the generate command
///
/// # Arguments
/// * `scene_path` - Path to the scene JSON document
/// * `seed` - Base generation seed
/// * `out_dir` - Output directory (default: current directory)
/// * `count` - Number of variations; seeds beyond the first derive from
///   the base seed
/// * `do_render` - Whether to invoke the external SoX renderer
/// * `json_output` - Whether to emit the machine-readable envelope
///
/// # Returns
/// Exit code: 0 on success, 1 on any failure. A render failure still
/// leaves the annotation and mix specification on disk.
pub fn run(
    scene_path: &str,
    seed: u32,
    out_dir: Option<&str>,
    count: u32,
    do_render: bool,
    json_output: bool,
) -> Result<ExitCode> {
    let text = std::fs::read_to_string(scene_path)
        .with_context(|| format!("Failed to read scene file: {}", scene_path))?;
    let scene = Scene::from_json(&text)
        .with_context(|| format!("Failed to parse scene file: {}", scene_path))?;

    let out_dir = PathBuf::from(out_dir.unwrap_or("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let stem = Path::new(scene_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "soundscape".to_string());

    let catalog = FsCatalog::new();
    let mut results = Vec::new();

    for index in 0..count.max(1) {
        let variation_seed = if count <= 1 {
            seed
        } else {
            derive_variation_seed(seed, index)
        };

        let suffix = if count <= 1 {
            String::new()
        } else {
            format!("_{:03}", index)
        };

        let generated = match instantiate(&scene, variation_seed, &catalog) {
            Ok(result) => result,
            Err(e) => {
                return fail(
                    json_output,
                    e.code(),
                    format!("generation failed (seed {}): {}", variation_seed, e),
                );
            }
        };
        let InstantiateResult { soundscape, skipped } = generated;

        let mix = match build_mix(&soundscape, &catalog) {
            Ok(mix) => mix,
            Err(e) => {
                return fail(
                    json_output,
                    e.code(),
                    format!("mix assembly failed (seed {}): {}", variation_seed, e),
                );
            }
        };

        let annotation = Annotation::from_soundscape(&soundscape);
        let annotation_path = out_dir.join(format!("{}{}.annotation.json", stem, suffix));
        let mix_path = out_dir.join(format!("{}{}.mix.json", stem, suffix));

        std::fs::write(&annotation_path, annotation.to_json_pretty()?)
            .with_context(|| format!("Failed to write {}", annotation_path.display()))?;
        std::fs::write(&mix_path, mix.to_json_pretty()?)
            .with_context(|| format!("Failed to write {}", mix_path.display()))?;

        if !json_output {
            println!(
                "{} seed {} -> {} event(s), polyphony {}",
                "Generated:".cyan().bold(),
                variation_seed,
                soundscape.events.len(),
                soundscape.max_polyphony(),
            );
            for skip in &skipped {
                println!(
                    "  {} skipped event {} ('{}'): {} after {} trial(s)",
                    "!".yellow(),
                    skip.spec_index,
                    skip.label,
                    skip.constraint,
                    skip.trials
                );
            }
            println!("  {} {}", "annotation:".dimmed(), annotation_path.display());
            println!("  {} {}", "mix spec:".dimmed(), mix_path.display());
        }

        let mut audio_path = None;
        if do_render {
            let wav_path = out_dir.join(format!("{}{}.wav", stem, suffix));
            let renderer = match SoxRenderer::new() {
                Ok(renderer) => renderer,
                Err(e) => {
                    return fail(json_output, e.code(), format!("render setup failed: {}", e))
                }
            };
            if let Err(e) = render(&renderer, &mix, &wav_path) {
                // The annotation and mix spec stay valid on disk; only
                // the audio is missing.
                return fail(
                    json_output,
                    e.code(),
                    format!(
                        "render failed: {} (annotation and mix spec were written)",
                        e
                    ),
                );
            }
            if !json_output {
                println!("  {} {}", "audio:".dimmed(), wav_path.display());
            }
            audio_path = Some(wav_path.display().to_string());
        }

        results.push(serde_json::json!({
            "seed": variation_seed,
            "events": soundscape.events.len(),
            "skipped": skipped.len(),
            "annotation_path": annotation_path.display().to_string(),
            "mix_path": mix_path.display().to_string(),
            "audio_path": audio_path,
        }));
    }

    if json_output {
        let envelope = Envelope::success(
            serde_json::json!({ "variations": results }),
            Vec::<JsonWarning>::new(),
        );
        envelope.print();
    } else {
        println!("\n{} {} soundscape(s) written", "SUCCESS".green().bold(), results.len());
    }
    Ok(ExitCode::SUCCESS)
}

fn fail(json_output: bool, code: &str, message: String) -> Result<ExitCode> {
    if json_output {
        let envelope: Envelope<serde_json::Value> =
            Envelope::failure(vec![JsonError::new(code, message)], vec![]);
        envelope.print();
    } else {
        eprintln!("{} [{}] {}", "error:".red().bold(), code, message);
    }
    Ok(ExitCode::from(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundscape_spec::{DistributionSpec, EventSpec};

    /// Writes a small silent WAV of the given duration.
    fn write_wav(path: &Path, seconds: f64) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..((seconds * 8000.0) as usize) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    /// Stages wav fixtures and a scene document in a temp directory.
    fn stage_scene(tmp: &tempfile::TempDir) -> PathBuf {
        let bg_dir = tmp.path().join("bg/park");
        let fg_dir = tmp.path().join("fg/siren");
        std::fs::create_dir_all(&bg_dir).unwrap();
        std::fs::create_dir_all(&fg_dir).unwrap();
        write_wav(&bg_dir.join("ambience.wav"), 12.0);
        write_wav(&fg_dir.join("wail.wav"), 5.0);

        let scene = Scene::builder(10.0)
            .max_polyphony(1)
            .event(EventSpec::background(
                DistributionSpec::constant("park"),
                DistributionSpec::choose_file(bg_dir.to_str().unwrap()),
                DistributionSpec::constant(0.0),
            ))
            .event(EventSpec::foreground(
                DistributionSpec::constant("siren"),
                DistributionSpec::choose_file(fg_dir.to_str().unwrap()),
                DistributionSpec::constant(0.0),
                DistributionSpec::uniform(0.0, 8.0),
                DistributionSpec::constant(2.0),
                DistributionSpec::constant(6.0),
            ))
            .build();

        let scene_path = tmp.path().join("scene.json");
        std::fs::write(&scene_path, scene.to_json_pretty().unwrap()).unwrap();
        scene_path
    }

    #[test]
    fn generate_writes_annotation_and_mix_spec() {
        let tmp = tempfile::tempdir().unwrap();
        let scene_path = stage_scene(&tmp);
        let out_dir = tmp.path().join("out");

        let code = run(
            scene_path.to_str().unwrap(),
            42,
            Some(out_dir.to_str().unwrap()),
            1,
            false,
            false,
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let annotation_text =
            std::fs::read_to_string(out_dir.join("scene.annotation.json")).unwrap();
        let annotation = Annotation::from_json(&annotation_text).unwrap();
        assert_eq!(annotation.seed, 42);
        assert_eq!(annotation.observations.len(), 2);

        let mix_text = std::fs::read_to_string(out_dir.join("scene.mix.json")).unwrap();
        let mix = soundscape_engine::MixSpec::from_json(&mix_text).unwrap();
        assert_eq!(mix.duration, 10.0);
    }

    #[test]
    fn generate_is_reproducible_byte_for_byte() {
        let tmp = tempfile::tempdir().unwrap();
        let scene_path = stage_scene(&tmp);
        let out_a = tmp.path().join("a");
        let out_b = tmp.path().join("b");

        for out in [&out_a, &out_b] {
            let code = run(
                scene_path.to_str().unwrap(),
                42,
                Some(out.to_str().unwrap()),
                1,
                false,
                false,
            )
            .unwrap();
            assert_eq!(code, ExitCode::SUCCESS);
        }

        let a = std::fs::read(out_a.join("scene.annotation.json")).unwrap();
        let b = std::fs::read(out_b.join("scene.annotation.json")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn generate_count_writes_numbered_variations() {
        let tmp = tempfile::tempdir().unwrap();
        let scene_path = stage_scene(&tmp);
        let out_dir = tmp.path().join("out");

        let code = run(
            scene_path.to_str().unwrap(),
            42,
            Some(out_dir.to_str().unwrap()),
            3,
            false,
            false,
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        for i in 0..3 {
            assert!(out_dir
                .join(format!("scene_{:03}.annotation.json", i))
                .exists());
        }

        // Variations use derived seeds, so they differ from each other.
        let a = std::fs::read(out_dir.join("scene_000.annotation.json")).unwrap();
        let b = std::fs::read(out_dir.join("scene_001.annotation.json")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn generate_fails_cleanly_on_missing_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = Scene::builder(10.0)
            .event(EventSpec::foreground(
                DistributionSpec::constant("siren"),
                DistributionSpec::constant("/definitely/missing.wav"),
                DistributionSpec::constant(0.0),
                DistributionSpec::constant(1.0),
                DistributionSpec::constant(2.0),
                DistributionSpec::constant(6.0),
            ))
            .build();
        let scene_path = tmp.path().join("scene.json");
        std::fs::write(&scene_path, scene.to_json_pretty().unwrap()).unwrap();

        let code = run(scene_path.to_str().unwrap(), 42, None, 1, false, false).unwrap();
        assert_eq!(code, ExitCode::from(1));
    }
}
