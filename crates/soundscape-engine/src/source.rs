//! Source file catalogs.
//!
//! The placement engine needs two things from the world of source audio:
//! the files available under a folder (for `choose_file` descriptors) and
//! the duration of a file (for source-bounds checks and background
//! tiling). [`SourceCatalog`] is that seam; production code uses
//! [`FsCatalog`], tests use [`MemoryCatalog`].

use std::collections::BTreeMap;
use std::io;

use walkdir::WalkDir;

/// Access to source folders and file durations.
pub trait SourceCatalog {
    /// Lists the files directly under `folder`, sorted by path.
    ///
    /// Listing happens per call; callers deliberately do not cache, so
    /// files added between independent generation runs are visible.
    fn list(&self, folder: &str) -> io::Result<Vec<String>>;

    /// Duration of the source file at `path`, in seconds.
    fn duration_of(&self, path: &str) -> io::Result<f64>;
}

/// Filesystem-backed catalog.
///
/// Folder listings are sorted to keep `choose_file` sampling stable
/// across operating systems. Hidden files (leading dot) are skipped.
/// Duration probing reads WAV headers only; decoding stays with the
/// external render collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCatalog;

impl FsCatalog {
    /// Creates a filesystem catalog.
    pub fn new() -> Self {
        Self
    }
}

impl SourceCatalog for FsCatalog {
    fn list(&self, folder: &str) -> io::Result<Vec<String>> {
        let meta = std::fs::metadata(folder)?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' is not a folder", folder),
            ));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                io::Error::new(io::ErrorKind::Other, format!("walk error: {}", e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            files.push(entry.path().to_string_lossy().into_owned());
        }
        files.sort();
        Ok(files)
    }

    fn duration_of(&self, path: &str) -> io::Result<f64> {
        let reader = hound::WavReader::open(path).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("cannot read WAV header of '{}': {}", path, e),
            )
        })?;
        let spec = reader.spec();
        Ok(reader.duration() as f64 / spec.sample_rate as f64)
    }
}

/// In-memory catalog for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    folders: BTreeMap<String, Vec<String>>,
    durations: BTreeMap<String, f64>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a folder with no files.
    pub fn add_folder(&mut self, folder: &str) {
        self.folders.entry(folder.to_string()).or_default();
    }

    /// Registers a file under a folder with the given duration.
    pub fn add_file(&mut self, folder: &str, path: &str, duration: f64) {
        let files = self.folders.entry(folder.to_string()).or_default();
        files.push(path.to_string());
        files.sort();
        self.durations.insert(path.to_string(), duration);
    }

    /// Registers a file duration without attaching it to a folder.
    pub fn add_duration(&mut self, path: &str, duration: f64) {
        self.durations.insert(path.to_string(), duration);
    }
}

impl SourceCatalog for MemoryCatalog {
    fn list(&self, folder: &str) -> io::Result<Vec<String>> {
        self.folders.get(folder).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such folder: '{}'", folder),
            )
        })
    }

    fn duration_of(&self, path: &str) -> io::Result<f64> {
        self.durations.get(path).copied().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: '{}'", path))
        })
    }
}
