//! Directory scanning: walk the configured scan directories and emit a
//! descriptor for every file whose extension the language registry knows.

use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::lang::LanguageRegistry;
use crate::types::{FileDescriptor, ScanConfig};

// ---------------------------------------------------------------------------
// Repository discovery
// ---------------------------------------------------------------------------

/// The nearest ancestor (including `start` itself) containing a `.git` entry.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start.ancestors().find(|dir| dir.join(".git").exists()).map(|dir| dir.to_path_buf())
}

// ---------------------------------------------------------------------------
// File reading
// ---------------------------------------------------------------------------

/// Read a source file as UTF-8, ignoring invalid bytes. Returns `None` on any
/// I/O error; callers degrade to empty content.
pub fn read_source(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!(file = %path.display(), error = %e, "could not read file");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.to_path_buf())
    };
    joined.canonicalize().unwrap_or(joined)
}

/// Walk every scan directory and collect descriptors for registry-known
/// extensions. Non-directories are skipped with a debug warning; unreadable
/// subtrees yield nothing. Output is sorted by path for determinism.
pub fn scan(config: &ScanConfig, registry: &LanguageRegistry) -> Vec<FileDescriptor> {
    let results: Mutex<Vec<FileDescriptor>> = Mutex::new(Vec::new());

    for scan_dir in &config.scan_dirs {
        let abs_root = absolutize(scan_dir);
        if !abs_root.is_dir() {
            debug!(dir = %abs_root.display(), "scan directory does not exist, skipping");
            continue;
        }

        let repo_root = find_repo_root(&abs_root).unwrap_or_default();
        let skip: HashSet<String> = config.skip_dirs.clone();

        WalkBuilder::new(&abs_root)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .threads(rayon::current_num_threads().min(12))
            .filter_entry(move |entry| {
                if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    let name = entry.file_name().to_string_lossy();
                    return !skip.contains(name.as_ref());
                }
                true
            })
            .build_parallel()
            .run(|| {
                Box::new(|entry| {
                    let entry = match entry {
                        Ok(e) => e,
                        Err(_) => return ignore::WalkState::Continue,
                    };
                    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                        return ignore::WalkState::Continue;
                    }

                    let abs_path = entry.path().to_path_buf();
                    let ext = match abs_path.extension().and_then(|e| e.to_str()) {
                        Some(e) => format!(".{e}"),
                        None => return ignore::WalkState::Continue,
                    };
                    if !registry.supports(&ext) {
                        return ignore::WalkState::Continue;
                    }

                    results.lock().unwrap().push(FileDescriptor {
                        path: abs_path,
                        repo_root: repo_root.clone(),
                        scan_root: abs_root.clone(),
                        ext,
                    });
                    ignore::WalkState::Continue
                })
            });
    }

    let mut files = results.into_inner().unwrap();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
