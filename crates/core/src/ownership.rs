//! Ownership mining: per-author share of a file's current lines, derived from
//! a full blame at HEAD. Shares are prebuilt for all files of a repository in
//! parallel and cached, since blame dominates the analysis wall clock.

use dashmap::DashMap;
use git2::Repository;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Blame-derived attribution for one file.
#[derive(Debug, Clone, Default)]
pub struct FileOwnership {
    /// (author, fraction of lines), sorted by descending fraction.
    pub authors: Vec<(String, f64)>,
    pub total_lines: usize,
}

impl FileOwnership {
    /// The author owning the largest share, if any lines are attributed.
    pub fn primary_owner(&self) -> Option<&str> {
        self.authors.first().map(|(name, _)| name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Blame
// ---------------------------------------------------------------------------

/// Full blame for a single file, relative to the repository workdir.
pub fn file_ownership(repo: &Repository, rel_path: &Path) -> Result<FileOwnership, String> {
    let blame = repo
        .blame_file(rel_path, None)
        .map_err(|e| format!("blame failed for {}: {e}", rel_path.display()))?;

    let mut lines_by_author: HashMap<String, usize> = HashMap::new();
    let mut total_lines = 0usize;
    for hunk in blame.iter() {
        let sig = hunk.final_signature();
        let author = sig.name().unwrap_or("unknown").to_string();
        let lines = hunk.lines_in_hunk();
        *lines_by_author.entry(author).or_default() += lines;
        total_lines += lines;
    }

    let mut authors: Vec<(String, f64)> = lines_by_author
        .into_iter()
        .map(|(name, lines)| (name, lines as f64 / total_lines.max(1) as f64))
        .collect();
    // Descending share; ties broken by name for deterministic output.
    authors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));

    Ok(FileOwnership { authors, total_lines })
}

// ---------------------------------------------------------------------------
// Prebuilt cache
// ---------------------------------------------------------------------------

/// Ownership data for all files of one repository, keyed by absolute path.
pub struct OwnershipCache {
    data: DashMap<PathBuf, FileOwnership>,
}

impl OwnershipCache {
    /// Blame every file in parallel. Files that cannot be blamed (untracked,
    /// outside the repo, binary) are simply absent from the cache.
    pub fn prebuild(repo_root: &Path, files: &[PathBuf]) -> Self {
        let data = DashMap::new();

        files.par_iter().for_each_init(
            || Repository::open(repo_root),
            |repo, abs_path| {
                let repo = match repo {
                    Ok(r) => r,
                    Err(_) => return,
                };
                let rel_path = match abs_path.strip_prefix(repo_root) {
                    Ok(p) => p,
                    Err(_) => return,
                };
                match file_ownership(repo, rel_path) {
                    Ok(ownership) => {
                        data.insert(abs_path.clone(), ownership);
                    }
                    Err(e) => {
                        debug!(file = %abs_path.display(), error = %e, "blame skipped");
                    }
                }
            },
        );

        OwnershipCache { data }
    }

    /// An empty cache, used for files outside any repository.
    pub fn empty() -> Self {
        OwnershipCache { data: DashMap::new() }
    }

    pub fn get(&self, abs_path: &Path) -> Option<FileOwnership> {
        self.data.get(abs_path).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_owner_empty() {
        let ownership = FileOwnership::default();
        assert!(ownership.primary_owner().is_none());
    }

    #[test]
    fn test_primary_owner_is_largest_share() {
        let ownership = FileOwnership {
            authors: vec![("alice".to_string(), 0.7), ("bob".to_string(), 0.3)],
            total_lines: 10,
        };
        assert_eq!(ownership.primary_owner(), Some("alice"));
    }

    #[test]
    fn test_empty_cache() {
        let cache = OwnershipCache::empty();
        assert!(cache.is_empty());
        assert!(cache.get(Path::new("/nope")).is_none());
    }

    #[test]
    fn test_prebuild_without_repo_yields_empty_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("a.py");
        std::fs::write(&file, "x = 1\n").expect("write");
        let cache = OwnershipCache::prebuild(dir.path(), &[file]);
        assert!(cache.is_empty());
    }
}
