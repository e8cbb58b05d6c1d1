//! Doctor command implementation
//!
//! Checks that the external render tool is installed and reports what
//! generation can and cannot do on this machine.

use anyhow::Result;
use colored::Colorize;
use std::process::{Command, ExitCode, Stdio};

use soundscape_render::{find_sox, SoxConfig};

/// Run the doctor command
///
/// # Returns
/// Exit code: 0 when the render tool is available, 1 otherwise.
/// Generation without `--render` works either way.
pub fn run() -> Result<ExitCode> {
    println!("{}", "Checking external dependencies".cyan().bold());

    match find_sox(&SoxConfig::default()) {
        Ok(path) => {
            let version = probe_version(&path);
            println!(
                "  {} sox found at {}{}",
                "ok".green(),
                path.display(),
                version
                    .map(|v| format!(" ({})", v))
                    .unwrap_or_default()
            );
            println!("\n{} Rendering is available", "SUCCESS".green().bold());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("  {} {}", "x".red(), e);
            println!(
                "\n{} Generation works, but --render will fail until SoX is installed",
                "WARNING".yellow().bold()
            );
            Ok(ExitCode::from(1))
        }
    }
}

fn probe_version(path: &std::path::Path) -> Option<String> {
    let output = Command::new(path)
        .arg("--version")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    text.lines().next().map(|line| line.trim().to_string())
}
