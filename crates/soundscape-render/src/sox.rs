//! SoX-backed renderer.
//!
//! Spawns the external `sox` tool once per operation, staging
//! intermediates in a temporary directory. Invocations are blocking with
//! a configurable deadline; a killed or failed invocation surfaces the
//! operation name and captured stderr.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::adapter::{MixTrack, RenderBuffer, Renderer};
use crate::error::{RenderError, RenderResult};

/// Default deadline per SoX invocation (2 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the SoX renderer.
#[derive(Debug, Clone)]
pub struct SoxConfig {
    /// Explicit path to the sox executable.
    pub sox_path: Option<PathBuf>,
    /// Deadline per invocation.
    pub timeout: Duration,
}

impl Default for SoxConfig {
    fn default() -> Self {
        Self {
            sox_path: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SoxConfig {
    /// Sets the sox executable path.
    pub fn sox_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sox_path = Some(path.into());
        self
    }

    /// Sets the per-invocation deadline in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

/// Locates the sox executable.
///
/// Resolution order: explicit config path, the `SOUNDSCAPE_SOX_PATH`
/// environment variable, `PATH`, then common installation locations.
pub fn find_sox(config: &SoxConfig) -> RenderResult<PathBuf> {
    if let Some(ref path) = config.sox_path {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    if let Ok(path) = std::env::var("SOUNDSCAPE_SOX_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    let names = if cfg!(windows) {
        vec!["sox.exe", "sox"]
    } else {
        vec!["sox"]
    };
    for name in names {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
    }

    let common_paths = if cfg!(target_os = "macos") {
        vec!["/opt/homebrew/bin/sox", "/usr/local/bin/sox"]
    } else {
        vec!["/usr/bin/sox", "/usr/local/bin/sox"]
    };
    for path_str in common_paths {
        let path = PathBuf::from(path_str);
        if path.exists() {
            return Ok(path);
        }
    }

    Err(RenderError::ToolNotFound)
}

/// Renderer backed by the external `sox` tool.
pub struct SoxRenderer {
    config: SoxConfig,
    sox: PathBuf,
    staging: tempfile::TempDir,
    counter: std::cell::Cell<u64>,
}

impl SoxRenderer {
    /// Creates a renderer with default configuration.
    pub fn new() -> RenderResult<Self> {
        Self::with_config(SoxConfig::default())
    }

    /// Creates a renderer with the given configuration.
    pub fn with_config(config: SoxConfig) -> RenderResult<Self> {
        let sox = find_sox(&config)?;
        let staging = tempfile::Builder::new()
            .prefix("soundscape_render_")
            .tempdir()?;
        Ok(Self {
            config,
            sox,
            staging,
            counter: std::cell::Cell::new(0),
        })
    }

    fn stage_path(&self, tag: &str) -> PathBuf {
        let n = self.counter.get();
        self.counter.set(n + 1);
        self.staging.path().join(format!("{}_{:04}.wav", tag, n))
    }

    fn run(&self, op: &'static str, args: &[String]) -> RenderResult<()> {
        let mut cmd = Command::new(&self.sox);
        cmd.args(args);
        // Only stderr is surfaced; leaving stdout unpiped avoids
        // deadlocks from a filled pipe.
        cmd.stdout(Stdio::null()).stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|source| RenderError::SpawnFailed { op, source })?;

        let (status, stderr) = wait_with_timeout(child, op, self.config.timeout)?;
        if !status.success() {
            return Err(RenderError::OperationFailed {
                op,
                exit_code: status.code().unwrap_or(-1),
                stderr,
            });
        }
        Ok(())
    }
}

impl Renderer for SoxRenderer {
    fn trim(&self, source: &Path, start: f64, duration: f64) -> RenderResult<RenderBuffer> {
        let out = self.stage_path("trim");
        self.run("trim", &trim_args(source, &out, start, duration))?;
        Ok(RenderBuffer::new(out))
    }

    fn pitch_shift(&self, buffer: &RenderBuffer, semitones: f64) -> RenderResult<RenderBuffer> {
        let out = self.stage_path("pitch");
        self.run(
            "pitch_shift",
            &pitch_shift_args(&buffer.path, &out, semitones),
        )?;
        Ok(RenderBuffer::new(out))
    }

    fn time_stretch(&self, buffer: &RenderBuffer, factor: f64) -> RenderResult<RenderBuffer> {
        let out = self.stage_path("stretch");
        self.run(
            "time_stretch",
            &time_stretch_args(&buffer.path, &out, factor),
        )?;
        Ok(RenderBuffer::new(out))
    }

    fn mix(&self, tracks: &[MixTrack], duration: f64, out: &Path) -> RenderResult<()> {
        // Stage each track padded to its offset and leveled to its gain,
        // then sum them in one -m invocation.
        let mut staged = Vec::with_capacity(tracks.len());
        for track in tracks {
            let padded = self.stage_path("track");
            self.run("mix", &track_args(track, &padded))?;
            staged.push(padded);
        }
        self.run("mix", &mix_args(&staged, out, duration))
    }
}

/// `sox <src> <out> trim <start> <duration>`
fn trim_args(source: &Path, out: &Path, start: f64, duration: f64) -> Vec<String> {
    vec![
        source.display().to_string(),
        out.display().to_string(),
        "trim".to_string(),
        format!("{}", start),
        format!("{}", duration),
    ]
}

/// `sox <in> <out> pitch <cents>` - SoX takes cents, not semitones.
fn pitch_shift_args(input: &Path, out: &Path, semitones: f64) -> Vec<String> {
    vec![
        input.display().to_string(),
        out.display().to_string(),
        "pitch".to_string(),
        format!("{}", semitones * 100.0),
    ]
}

/// `sox <in> <out> tempo <speed>` - a stretch factor of 2.0 (twice as
/// long) is a tempo of 0.5.
fn time_stretch_args(input: &Path, out: &Path, factor: f64) -> Vec<String> {
    vec![
        input.display().to_string(),
        out.display().to_string(),
        "tempo".to_string(),
        format!("{}", 1.0 / factor),
    ]
}

/// `sox <in> <out> gain <db> pad <offset>`
fn track_args(track: &MixTrack, out: &Path) -> Vec<String> {
    vec![
        track.buffer.path.display().to_string(),
        out.display().to_string(),
        "gain".to_string(),
        format!("{}", track.gain_db),
        "pad".to_string(),
        format!("{}", track.offset),
    ]
}

/// `sox -m <t1> .. <tn> <out> trim 0 <duration>`
fn mix_args(staged: &[PathBuf], out: &Path, duration: f64) -> Vec<String> {
    let mut args = vec!["-m".to_string()];
    args.extend(staged.iter().map(|p| p.display().to_string()));
    args.push(out.display().to_string());
    args.push("trim".to_string());
    args.push("0".to_string());
    args.push(format!("{}", duration));
    args
}

fn wait_with_timeout(
    mut child: Child,
    op: &'static str,
    timeout: Duration,
) -> RenderResult<(ExitStatus, String)> {
    let start = Instant::now();

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RenderError::Timeout {
                        op,
                        timeout_secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(source) => return Err(RenderError::SpawnFailed { op, source }),
        }
    };

    let mut stderr = String::new();
    if let Some(mut err) = child.stderr.take() {
        let _ = err.read_to_string(&mut stderr);
    }

    Ok((status, stderr))
}
