//! Loading declaration sources from disk into a [`SymbolTable`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use super::{kotlin, SourceFile, SymbolTable};
use crate::error::AppError;

/// A JSON dump holds one source file or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonSources {
    Many(Vec<SourceFile>),
    One(SourceFile),
}

/// Reads a JSON symbol dump.
///
/// Files without a `path` are attributed to the dump itself.
pub fn read_json(path: impl Into<PathBuf>, text: &str) -> Result<Vec<SourceFile>, AppError> {
    let path = path.into();
    let files = match serde_json::from_str(text)? {
        JsonSources::Many(files) => files,
        JsonSources::One(file) => vec![file],
    };

    Ok(files
        .into_iter()
        .map(|mut file| {
            if file.path.as_os_str().is_empty() {
                file.path = path.clone();
            }
            file
        })
        .collect())
}

/// Declarations loaded from disk.
#[derive(Debug)]
pub struct LoadedSources {
    pub table: SymbolTable,
    /// Files that could not be read or parsed, in path order.
    pub rejected: Vec<RejectedSource>,
}

/// A source file left out of the table.
#[derive(Debug)]
pub struct RejectedSource {
    pub path: PathBuf,
    pub error: AppError,
}

/// Loads every `.kt` and `.json` source under `paths` into one table.
///
/// Directories are walked recursively. Files are read in sorted path order
/// so the resulting table, and discovery over it, is deterministic. A file
/// that fails to read or parse is rejected on its own; only a path that
/// does not exist fails the whole load.
pub fn load_sources<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
) -> Result<LoadedSources, AppError> {
    let mut files = Vec::new();
    for path in paths {
        collect(path.as_ref(), &mut files)?;
    }
    files.sort();
    files.dedup();

    let mut sources = Vec::new();
    let mut rejected = Vec::new();
    for file in &files {
        match read_file(file) {
            Ok(read) => sources.extend(read),
            Err(error) => {
                tracing::warn!("Skipping {}: {}", file.display(), error);
                rejected.push(RejectedSource {
                    path: file.clone(),
                    error,
                });
            }
        }
    }

    let table = SymbolTable::new(sources);
    tracing::debug!(
        "Loaded {} declarations from {} files",
        table.len(),
        files.len() - rejected.len()
    );
    Ok(LoadedSources { table, rejected })
}

fn read_file(file: &Path) -> Result<Vec<SourceFile>, AppError> {
    let text = fs::read_to_string(file).map_err(|source| AppError::Io {
        path: file.to_path_buf(),
        source,
    })?;

    if is_kind(file, "kt") {
        Ok(vec![kotlin::read_source(file, &text)?])
    } else {
        read_json(file, &text)
    }
}

fn is_kind(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

fn is_source(path: &Path) -> bool {
    is_kind(path, "kt") || is_kind(path, "json")
}

fn collect(path: &Path, files: &mut Vec<PathBuf>) -> Result<(), AppError> {
    if path.is_file() {
        // Explicitly named files are read whatever their extension says,
        // as JSON unless they end in `.kt`.
        files.push(path.to_path_buf());
        return Ok(());
    }

    if !path.is_dir() {
        return Err(AppError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        });
    }

    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry.map_err(|e| AppError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf()),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && is_source(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(())
}
