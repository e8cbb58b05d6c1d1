//! Validate command implementation
//!
//! Validates a scene document without generating anything.

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::ExitCode;

use soundscape_spec::{canonical_scene_hash, validate_scene, Scene, ValidationResult};

use super::json_output::{
    validation_error_to_json, validation_warning_to_json, Envelope, JsonError,
};

/// Run the validate command
///
/// # Arguments
/// * `scene_path` - Path to the scene JSON document
/// * `json_output` - Whether to emit the machine-readable envelope
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(scene_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(scene_path)
    } else {
        run_human(scene_path)
    }
}

fn load_scene(scene_path: &str) -> Result<Scene> {
    let text = std::fs::read_to_string(scene_path)
        .with_context(|| format!("Failed to read scene file: {}", scene_path))?;
    Scene::from_json(&text).with_context(|| format!("Failed to parse scene file: {}", scene_path))
}

fn run_human(scene_path: &str) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), scene_path);

    let scene = load_scene(scene_path)?;
    let scene_hash = canonical_scene_hash(&scene).unwrap_or_else(|_| "unknown".to_string());
    println!("{} {}", "Scene hash:".dimmed(), &scene_hash[..16]);

    let result = validate_scene(&scene);
    print_validation_results(&result);

    if result.is_ok() {
        println!(
            "\n{} Scene is valid ({} event(s))",
            "SUCCESS".green().bold(),
            scene.events.len()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "\n{} Scene has {} error(s)",
            "FAILED".red().bold(),
            result.errors.len()
        );
        Ok(ExitCode::from(1))
    }
}

fn run_json(scene_path: &str) -> Result<ExitCode> {
    let scene = match load_scene(scene_path) {
        Ok(scene) => scene,
        Err(e) => {
            let envelope: Envelope<serde_json::Value> =
                Envelope::failure(vec![JsonError::new("LOAD", format!("{:#}", e))], vec![]);
            envelope.print();
            return Ok(ExitCode::from(1));
        }
    };

    let scene_hash = canonical_scene_hash(&scene).unwrap_or_else(|_| "unknown".to_string());
    let result = validate_scene(&scene);
    let warnings = result
        .warnings
        .iter()
        .map(validation_warning_to_json)
        .collect();

    let envelope = if result.is_ok() {
        Envelope::success(
            serde_json::json!({
                "scene_hash": scene_hash,
                "events": scene.events.len(),
                "duration": scene.duration,
            }),
            warnings,
        )
    } else {
        Envelope::failure(
            result.errors.iter().map(validation_error_to_json).collect(),
            warnings,
        )
    };
    envelope.print();

    if envelope.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Print validation errors and warnings to the console
fn print_validation_results(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for error in &result.errors {
            let path_info = error
                .path
                .as_ref()
                .map(|p| format!(" at {}", p))
                .unwrap_or_default();
            println!(
                "  {} [{}]{}: {}",
                "x".red(),
                error.code.to_string().red(),
                path_info.dimmed(),
                error.message
            );
        }
    }

    if !result.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &result.warnings {
            let path_info = warning
                .path
                .as_ref()
                .map(|p| format!(" at {}", p))
                .unwrap_or_default();
            println!(
                "  {} [{}]{}: {}",
                "!".yellow(),
                warning.code.to_string().yellow(),
                path_info.dimmed(),
                warning.message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundscape_spec::{DistributionSpec, EventSpec};

    fn write_scene(dir: &tempfile::TempDir, filename: &str, scene: &Scene) -> std::path::PathBuf {
        let path = dir.path().join(filename);
        std::fs::write(&path, scene.to_json_pretty().unwrap()).unwrap();
        path
    }

    fn valid_scene() -> Scene {
        Scene::builder(10.0)
            .max_polyphony(2)
            .event(EventSpec::background(
                DistributionSpec::constant("park"),
                DistributionSpec::choose_file("bg/park"),
                DistributionSpec::constant(0.0),
            ))
            .event(EventSpec::foreground(
                DistributionSpec::constant("siren"),
                DistributionSpec::choose_file("fg/siren"),
                DistributionSpec::constant(0.0),
                DistributionSpec::uniform(0.0, 8.0),
                DistributionSpec::constant(2.0),
                DistributionSpec::constant(6.0),
            ))
            .build()
    }

    #[test]
    fn validate_accepts_valid_scene() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_scene(&tmp, "scene.json", &valid_scene());

        let code = run(path.to_str().unwrap(), false).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn validate_rejects_invalid_scene() {
        let tmp = tempfile::tempdir().unwrap();
        let mut scene = valid_scene();
        scene.duration = -1.0;
        let path = write_scene(&tmp, "scene.json", &scene);

        let code = run(path.to_str().unwrap(), false).unwrap();
        assert_eq!(code, ExitCode::from(1));
    }

    #[test]
    fn validate_json_mode_handles_missing_file() {
        let code = run("/nonexistent/scene.json", true).unwrap();
        assert_eq!(code, ExitCode::from(1));
    }

    #[test]
    fn validate_json_mode_accepts_valid_scene() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_scene(&tmp, "scene.json", &valid_scene());

        let code = run(path.to_str().unwrap(), true).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }
}
