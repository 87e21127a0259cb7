//! Suite discovery and parsing
//!
//! Resolves a path or glob pattern to suite files and decodes each file into
//! a [`TestSuite`].

use globset::GlobBuilder;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::models::TestSuite;

/// Extension of suite files picked up from a directory
pub const SUITE_EXTENSION: &str = "yml";

/// Discovery errors; fatal for a run
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Cannot read directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-file parse errors; the suite is dropped, the run continues
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Error while reading file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error while unmarshal file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Suite files for a path: every `*.yml` directly inside a directory,
/// otherwise the matches of the path taken as a glob pattern.
pub fn discover(path: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let candidate = Path::new(path);
    let files = if candidate.is_dir() {
        debug!("{} is a directory, looking for *.{}", path, SUITE_EXTENSION);
        files_in_dir(candidate, Some(SUITE_EXTENSION))?
    } else {
        expand_pattern(path)?
    };
    debug!("discovered {} suite file(s) for {}", files.len(), path);
    Ok(files)
}

/// Regular files directly inside `dir`, optionally filtered by extension, sorted
pub fn files_in_dir(dir: &Path, extension: Option<&str>) -> Result<Vec<PathBuf>, DiscoveryError> {
    let entries = std::fs::read_dir(dir).map_err(|source| DiscoveryError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| match extension {
            Some(ext) => path.extension() == Some(OsStr::new(ext)),
            None => true,
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Files matching a glob pattern, sorted. A pattern without glob syntax
/// matches itself when the file exists.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| DiscoveryError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    if !has_glob_meta(pattern) {
        let path = PathBuf::from(pattern);
        return Ok(if path.is_file() { vec![path] } else { Vec::new() });
    }

    let root = literal_prefix(pattern);
    let walk_root = if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root.clone()
    };

    let mut walker = WalkDir::new(&walk_root).follow_links(true);
    if !pattern.contains("**") {
        let depth = Path::new(pattern).components().count() - root.components().count();
        walker = walker.max_depth(depth);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let path = entry.into_path();
            if root.as_os_str().is_empty() {
                path.strip_prefix(".").map(Path::to_path_buf).unwrap_or(path)
            } else {
                path
            }
        })
        .filter(|path| matcher.is_match(path))
        .collect();
    files.sort();
    Ok(files)
}

fn has_glob_meta(text: &str) -> bool {
    text.contains(['*', '?', '[', '{'])
}

/// Leading components of a pattern that contain no glob syntax
fn literal_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in Path::new(pattern).components() {
        if let Component::Normal(part) = component {
            if has_glob_meta(&part.to_string_lossy()) {
                break;
            }
        }
        prefix.push(component);
    }
    prefix
}

/// Read and decode one suite file, stamping its source path
pub async fn load_suite(path: &Path) -> Result<TestSuite, ParseError> {
    debug!("read {}", path.display());
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mut suite: TestSuite =
        serde_yaml::from_str(&content).map_err(|source| ParseError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
    suite.prepare(path.display().to_string());
    Ok(suite)
}
