use crate::config::{OUTPUT_EXTENSION, SOURCE_EXTENSION};
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A Mermaid source file and the SVG it should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSource {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl DiagramSource {
    /// The output keeps the input's file stem and lives directly under `render_dir`,
    /// wherever the input came from.
    pub fn new(input: impl Into<PathBuf>, render_dir: &Path) -> Self {
        let input = input.into();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = render_dir.join(format!("{stem}.{OUTPUT_EXTENSION}"));
        Self { input, output }
    }

    pub fn output_file_name(&self) -> String {
        self.output
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn has_source_extension(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == SOURCE_EXTENSION)
}

/// Checks a single-file argument: extension first, then existence.
pub fn validate_source_path(path: &Path) -> Result<()> {
    if !has_source_extension(path) {
        return Err(Error::InvalidExtension {
            path: path.to_path_buf(),
        });
    }
    if !path.exists() {
        return Err(Error::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Lists `*.mmd` files directly inside `dir`, sorted by file name.
pub fn find_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut out: Vec<PathBuf> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !has_source_extension(&path) {
            continue;
        }
        out.push(path);
    }
    out.sort();
    tracing::debug!(dir = %dir.display(), count = out.len(), "discovered diagram sources");
    Ok(out)
}

/// Fails with [`Error::ReadDir`] unless `dir` is an existing directory.
pub fn require_base_dir(dir: &Path) -> Result<()> {
    let meta = fs::metadata(dir).map_err(|source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(Error::ReadDir {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        });
    }
    Ok(())
}

/// Creates the output directory if needed. Returns `true` when this call created it.
pub fn ensure_render_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(true)
}
