//! Discovery and loading of collected thread files for `merge`.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::merge::{merge, MergeResult};
use crate::model::Thread;
use crate::{AppError, Result};

pub const DEFAULT_PATTERN: &str = "*.json";

#[derive(Debug, Clone)]
pub struct MergeInput {
    pub dir: PathBuf,
    pub pattern: String,
    pub recursive: bool,
}

impl Default for MergeInput {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            pattern: DEFAULT_PATTERN.to_string(),
            recursive: false,
        }
    }
}

/// Merged threads plus how many input files were used
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub result: MergeResult,
    pub files_read: usize,
    pub files_failed: usize,
}

/// Files under `input.dir` whose name matches `input.pattern`, sorted by path.
pub fn find_files(input: &MergeInput) -> Result<Vec<PathBuf>> {
    let dir = &input.dir;
    if !dir.exists() {
        return Err(AppError::DirectoryNotFound(dir.display().to_string()));
    }
    if !dir.is_dir() {
        return Err(AppError::NotADirectory(dir.display().to_string()));
    }

    let matcher = build_matcher(&input.pattern)?;
    let max_depth = if input.recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| AppError::InvalidPattern(format!("{}: {}", pattern, e)))
}

/// Read one JSON array of threads.
pub fn read_threads(path: &Path) -> Result<Vec<Thread>> {
    let content = fs::read_to_string(path).map_err(|e| AppError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::JsonParse(format!("{}: {}", path.display(), e)))
}

/// Load every matching file and merge their threads.
///
/// Unreadable files are skipped and counted; the run fails only when none
/// could be read.
pub fn merge_files(input: &MergeInput) -> Result<MergeReport> {
    let files = find_files(input)?;
    if files.is_empty() {
        return Err(AppError::NoFilesFound(format!(
            "{} in {}",
            input.pattern,
            input.dir.display()
        )));
    }

    let mut threads = Vec::new();
    let mut files_read = 0;
    let mut files_failed = 0;

    for path in &files {
        match read_threads(path) {
            Ok(loaded) => {
                debug!("{}: {} threads", path.display(), loaded.len());
                threads.extend(loaded);
                files_read += 1;
            }
            Err(e) => {
                warn!("skipping {}", e);
                files_failed += 1;
            }
        }
    }

    if files_read == 0 {
        return Err(AppError::AllFilesFailed(files_failed));
    }

    Ok(MergeReport {
        result: merge(threads),
        files_read,
        files_failed,
    })
}
