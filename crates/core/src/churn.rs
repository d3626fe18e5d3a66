//! Code churn mining: per-file added+removed line totals across the commit
//! history of a repository.
//!
//! Each commit is diffed against its first parent, so a file is counted once
//! per commit that touches it (merges and cherry-picks included). Renames are
//! followed: history accumulated under an old path is merged into the file's
//! most recent path.

use git2::{Delta, DiffFindOptions, Patch, Repository, Sort};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::recover;

// ---------------------------------------------------------------------------
// Mining state
// ---------------------------------------------------------------------------

/// Traversal state of the miner for its current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningState {
    Idle,
    Traversing,
    Done,
    /// Traversal hit an error; whatever churn accumulated so far was returned.
    Failed,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Mines per-file churn for one or more (repo root, scan dir) pairs.
pub struct CodeChurnAnalyzer {
    repo_scan_pairs: Vec<(PathBuf, PathBuf)>,
    state: MiningState,
}

impl CodeChurnAnalyzer {
    pub fn new(repo_scan_pairs: Vec<(PathBuf, PathBuf)>) -> Self {
        CodeChurnAnalyzer { repo_scan_pairs, state: MiningState::Idle }
    }

    pub fn state(&self) -> MiningState {
        self.state
    }

    /// Traverse each repository's history once and return churn keyed by
    /// absolute post-rename path. On failure the map holds whatever
    /// accumulated before the error and the state transitions to `Failed`.
    pub fn analyze(&mut self) -> BTreeMap<PathBuf, u64> {
        self.state = MiningState::Traversing;

        let roots: BTreeSet<&PathBuf> = self
            .repo_scan_pairs
            .iter()
            .map(|(root, _)| root)
            .filter(|root| !root.as_os_str().is_empty())
            .collect();

        let mut churn = BTreeMap::new();
        let mut failed = false;
        for root in roots {
            let outcome = recover::git_operation("churn analysis", || repo_churn(root, &mut churn));
            if outcome.is_none() {
                failed = true;
            }
        }

        self.state = if failed { MiningState::Failed } else { MiningState::Done };
        churn
    }
}

// ---------------------------------------------------------------------------
// Per-repository traversal
// ---------------------------------------------------------------------------

fn repo_churn(repo_root: &Path, churn: &mut BTreeMap<PathBuf, u64>) -> Result<(), String> {
    let repo = Repository::open(repo_root).map_err(|e| format!("failed to open repo: {e}"))?;

    // A repository with no commits yields an empty churn map.
    if repo.head().is_err() {
        return Ok(());
    }

    let mut revwalk = repo.revwalk().map_err(|e| format!("revwalk failed: {e}"))?;
    revwalk.push_head().map_err(|e| format!("push_head failed: {e}"))?;
    revwalk.set_sorting(Sort::TIME).map_err(|e| format!("set_sorting failed: {e}"))?;

    // Maps historical relative paths to the file's most recent relative path.
    // The walk runs newest-first, so the first name seen for a file wins.
    let mut renames: HashMap<PathBuf, PathBuf> = HashMap::new();

    for oid in revwalk {
        let oid = match oid {
            Ok(o) => o,
            Err(_) => continue,
        };
        let commit = match repo.find_commit(oid) {
            Ok(c) => c,
            Err(_) => continue,
        };

        let tree = match commit.tree() {
            Ok(t) => t,
            Err(_) => continue,
        };
        let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());

        let mut diff = match repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None) {
            Ok(d) => d,
            Err(_) => continue,
        };

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts)).ok();

        let delta_count = diff.deltas().len();
        for idx in 0..delta_count {
            let delta = match diff.get_delta(idx) {
                Some(d) => d,
                None => continue,
            };
            let new_path = match delta.new_file().path().or_else(|| delta.old_file().path()) {
                Some(p) => p.to_path_buf(),
                None => continue,
            };

            // Resolve through renames recorded by newer commits.
            let current = renames.get(&new_path).cloned().unwrap_or_else(|| new_path.clone());

            if delta.status() == Delta::Renamed {
                if let Some(old_path) = delta.old_file().path() {
                    if old_path != new_path {
                        renames.insert(old_path.to_path_buf(), current.clone());
                    }
                }
            }

            let (additions, deletions) = match Patch::from_diff(&diff, idx) {
                Ok(Some(patch)) => match patch.line_stats() {
                    Ok((_context, adds, dels)) => (adds, dels),
                    Err(_) => continue,
                },
                _ => continue,
            };

            *churn.entry(repo_root.join(&current)).or_default() += (additions + deletions) as u64;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_starts_idle() {
        let analyzer = CodeChurnAnalyzer::new(vec![]);
        assert_eq!(analyzer.state(), MiningState::Idle);
    }

    #[test]
    fn test_empty_pairs_complete_without_churn() {
        let mut analyzer = CodeChurnAnalyzer::new(vec![]);
        let churn = analyzer.analyze();
        assert!(churn.is_empty());
        assert_eq!(analyzer.state(), MiningState::Done);
    }

    #[test]
    fn test_missing_repo_transitions_to_failed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().to_path_buf();
        let mut analyzer = CodeChurnAnalyzer::new(vec![(root.clone(), root)]);
        let churn = analyzer.analyze();
        assert!(churn.is_empty());
        assert_eq!(analyzer.state(), MiningState::Failed);
    }

    #[test]
    fn test_empty_root_is_skipped() {
        // Files outside any repository land in the "" bucket; no traversal runs.
        let mut analyzer =
            CodeChurnAnalyzer::new(vec![(PathBuf::new(), PathBuf::from("/somewhere"))]);
        let churn = analyzer.analyze();
        assert!(churn.is_empty());
        assert_eq!(analyzer.state(), MiningState::Done);
    }
}
