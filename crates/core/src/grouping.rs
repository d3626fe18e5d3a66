//! Groups scanned files by their repository root. Pure: same input, same
//! output, no I/O.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::types::FileDescriptor;

/// Partition a flat descriptor list by repository root.
///
/// Returns `(files_by_root, scan_dirs_by_root)`: insertion-ordered file lists
/// per root, and the set of originating scan directories per root. Files with
/// no repository root land in the empty-path bucket.
pub fn group_by_repository(
    files: &[FileDescriptor],
) -> (BTreeMap<PathBuf, Vec<FileDescriptor>>, BTreeMap<PathBuf, BTreeSet<PathBuf>>) {
    let mut files_by_root: BTreeMap<PathBuf, Vec<FileDescriptor>> = BTreeMap::new();
    let mut scan_dirs_by_root: BTreeMap<PathBuf, BTreeSet<PathBuf>> = BTreeMap::new();

    for file in files {
        files_by_root.entry(file.repo_root.clone()).or_default().push(file.clone());
        scan_dirs_by_root.entry(file.repo_root.clone()).or_default().insert(file.scan_root.clone());
    }

    (files_by_root, scan_dirs_by_root)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(path: &str, root: &str, scan: &str) -> FileDescriptor {
        FileDescriptor {
            path: PathBuf::from(path),
            repo_root: PathBuf::from(root),
            scan_root: PathBuf::from(scan),
            ext: ".py".to_string(),
        }
    }

    #[test]
    fn test_groups_by_root() {
        let files = vec![
            descriptor("/repo1/src/a.py", "/repo1", "/repo1/src"),
            descriptor("/repo1/src/b.py", "/repo1", "/repo1/src"),
            descriptor("/repo2/src/c.py", "/repo2", "/repo2/src"),
        ];
        let (by_root, scan_dirs) = group_by_repository(&files);

        assert_eq!(by_root.len(), 2);
        assert_eq!(by_root[&PathBuf::from("/repo1")].len(), 2);
        assert_eq!(by_root[&PathBuf::from("/repo2")].len(), 1);
        assert_eq!(scan_dirs[&PathBuf::from("/repo1")].len(), 1);
    }

    #[test]
    fn test_preserves_insertion_order_within_root() {
        let files = vec![
            descriptor("/repo/z.py", "/repo", "/repo"),
            descriptor("/repo/a.py", "/repo", "/repo"),
            descriptor("/repo/m.py", "/repo", "/repo"),
        ];
        let (by_root, _) = group_by_repository(&files);
        let paths: Vec<&PathBuf> = by_root[&PathBuf::from("/repo")].iter().map(|f| &f.path).collect();
        assert_eq!(
            paths,
            vec![&PathBuf::from("/repo/z.py"), &PathBuf::from("/repo/a.py"), &PathBuf::from("/repo/m.py")]
        );
    }

    #[test]
    fn test_missing_root_goes_to_empty_bucket() {
        let files = vec![descriptor("/loose/a.py", "", "/loose")];
        let (by_root, scan_dirs) = group_by_repository(&files);
        assert_eq!(by_root.len(), 1);
        assert!(by_root.contains_key(&PathBuf::new()));
        assert!(scan_dirs[&PathBuf::new()].contains(&PathBuf::from("/loose")));
    }

    #[test]
    fn test_multiple_scan_dirs_per_root() {
        let files = vec![
            descriptor("/repo/src/a.py", "/repo", "/repo/src"),
            descriptor("/repo/tests/b.py", "/repo", "/repo/tests"),
        ];
        let (_, scan_dirs) = group_by_repository(&files);
        assert_eq!(scan_dirs[&PathBuf::from("/repo")].len(), 2);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let files = vec![
            descriptor("/repo2/a.py", "/repo2", "/repo2"),
            descriptor("/repo1/b.py", "/repo1", "/repo1"),
        ];
        let first = group_by_repository(&files);
        let second = group_by_repository(&files);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);

        // Re-flattening the grouped files and regrouping reproduces the result.
        let flattened: Vec<FileDescriptor> =
            first.0.values().flat_map(|v| v.iter().cloned()).collect();
        let regrouped = group_by_repository(&flattened);
        assert_eq!(regrouped.0, first.0);
    }
}
