//! Core types shared across the MetricScope engine: scan configuration, file
//! descriptors, KPI values, and the hierarchical analysis model
//! (RepoInfo → ScanDir → FileNode).

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Scan configuration — defaults plus .metricscope.toml overrides
// ---------------------------------------------------------------------------

/// Runtime configuration for an analysis run. Loaded from .metricscope.toml or defaults.
#[derive(Clone)]
pub struct ScanConfig {
    /// Directories to scan. Relative paths are resolved against the working directory.
    pub scan_dirs: Vec<PathBuf>,
    /// Directory names to skip during walk.
    pub skip_dirs: HashSet<String>,
    /// Hotspot score above which a file is flagged as a hotspot.
    pub hotspot_threshold: f64,
    /// Line share above which a file is classified as single-owner.
    pub single_owner_threshold: f64,
    /// Line share below which an author is not counted as a shared owner.
    pub shared_owner_threshold: f64,
}

impl ScanConfig {
    pub fn new(scan_dirs: Vec<PathBuf>) -> Self {
        Self {
            scan_dirs,
            skip_dirs: [
                ".git",
                "node_modules",
                "__pycache__",
                "target",
                "dist",
                "build",
                ".next",
                "vendor",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            hotspot_threshold: 300.0,
            single_owner_threshold: 0.8,
            shared_owner_threshold: 0.2,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(".")])
    }
}

// ---------------------------------------------------------------------------
// Scanner output
// ---------------------------------------------------------------------------

/// Metadata for a file discovered during the directory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Root of the enclosing git repository (nearest `.git` ancestor).
    /// Empty when the file lies outside any repository.
    pub repo_root: PathBuf,
    /// Absolutized scan directory that produced this descriptor.
    pub scan_root: PathBuf,
    /// File extension including the leading dot (e.g. `.py`).
    pub ext: String,
}

// ---------------------------------------------------------------------------
// KPI values
// ---------------------------------------------------------------------------

/// One author's share of a file's current lines, rounded to whole percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorShare {
    pub name: String,
    pub share: u32,
}

/// A KPI measurement. Numeric values aggregate up the directory tree;
/// ownership structures and classifications stay file-local.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KpiValue {
    Numeric(f64),
    Ownership {
        authors: Vec<AuthorShare>,
        primary_owner: Option<String>,
    },
    Classification(String),
}

impl KpiValue {
    /// The numeric payload, or `None` for structured variants.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            KpiValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }
}

/// A named measurement attached to files and propagated to directories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub name: String,
    pub value: KpiValue,
    /// Calculator-specific extras (e.g. hotspot threshold classification).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Kpi {
    pub fn numeric(name: &str, value: f64) -> Self {
        Kpi { name: name.to_string(), value: KpiValue::Numeric(value), metadata: None }
    }
}

/// Per-function Cognitive Complexity, attached to files with CST support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionComplexity {
    pub function_name: String,
    pub cognitive_complexity: u32,
}

// ---------------------------------------------------------------------------
// Hierarchical analysis model
// ---------------------------------------------------------------------------

/// One analyzed source file. Built during KPI assembly, read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct FileNode {
    pub filename: String,
    pub absolute_path: PathBuf,
    pub language: String,
    pub kpis: BTreeMap<String, Kpi>,
    /// Per-function Cognitive Complexity; empty unless a CST parser covered the file.
    pub functions: Vec<FunctionComplexity>,
}

/// A directory node. Owns its files and child directories exclusively;
/// the model is a strict tree with no back-references.
#[derive(Debug, Clone, Serialize)]
pub struct ScanDir {
    pub dir_name: String,
    pub path: PathBuf,
    /// Basename → file node.
    pub files: BTreeMap<String, FileNode>,
    /// Basename → child directory node.
    pub scan_dirs: BTreeMap<String, ScanDir>,
    /// Aggregated KPI values over all descendant files.
    pub kpis: BTreeMap<String, Kpi>,
}

impl ScanDir {
    pub fn new(dir_name: &str, path: PathBuf) -> Self {
        ScanDir {
            dir_name: dir_name.to_string(),
            path,
            files: BTreeMap::new(),
            scan_dirs: BTreeMap::new(),
            kpis: BTreeMap::new(),
        }
    }

    /// Insert a file node at the position given by `rel_path` (relative to
    /// this directory), creating intermediate directories as needed.
    pub fn insert_file(&mut self, rel_path: &Path, file: FileNode) {
        let mut components: Vec<String> = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if components.is_empty() {
            return;
        }
        let basename = components.pop().expect("non-empty components");

        let mut node = self;
        for comp in components {
            let child_path = node.path.join(&comp);
            node = node
                .scan_dirs
                .entry(comp.clone())
                .or_insert_with(|| ScanDir::new(&comp, child_path));
        }
        node.files.insert(basename, file);
    }

    /// Total number of files in this subtree.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.scan_dirs.values().map(|d| d.file_count()).sum::<usize>()
    }
}

/// Per-repository root node: raw mining output plus the analyzed tree.
/// Frozen once the pipeline has built it.
#[derive(Debug, Clone, Serialize)]
pub struct RepoInfo {
    /// Absolute repository root; empty for files outside any repository.
    pub repo_root: PathBuf,
    /// Basename of the directory containing `.git`.
    pub repo_name: String,
    /// Scan directories that contributed files to this repository.
    pub scan_dirs: BTreeSet<PathBuf>,
    /// Raw churn per absolute file path, filtered to analyzed files.
    pub churn_data: BTreeMap<PathBuf, u64>,
    /// The analyzed directory tree with KPIs attached and aggregated.
    pub results: ScanDir,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_file_creates_intermediate_dirs() {
        let mut root = ScanDir::new("repo", PathBuf::from("/repo"));
        let file = FileNode {
            filename: "a.py".to_string(),
            absolute_path: PathBuf::from("/repo/src/deep/a.py"),
            language: "Python".to_string(),
            kpis: BTreeMap::new(),
            functions: Vec::new(),
        };
        root.insert_file(Path::new("src/deep/a.py"), file);

        let src = root.scan_dirs.get("src").expect("src dir");
        assert_eq!(src.path, PathBuf::from("/repo/src"));
        let deep = src.scan_dirs.get("deep").expect("deep dir");
        assert_eq!(deep.path, PathBuf::from("/repo/src/deep"));
        assert!(deep.files.contains_key("a.py"));
        assert_eq!(root.file_count(), 1);
    }

    #[test]
    fn test_insert_file_at_top_level() {
        let mut root = ScanDir::new("repo", PathBuf::from("/repo"));
        let file = FileNode {
            filename: "main.c".to_string(),
            absolute_path: PathBuf::from("/repo/main.c"),
            language: "C".to_string(),
            kpis: BTreeMap::new(),
            functions: Vec::new(),
        };
        root.insert_file(Path::new("main.c"), file);
        assert!(root.files.contains_key("main.c"));
        assert!(root.scan_dirs.is_empty());
    }

    #[test]
    fn test_kpi_value_as_numeric() {
        assert_eq!(KpiValue::Numeric(2.5).as_numeric(), Some(2.5));
        assert_eq!(KpiValue::Classification("3 authors".to_string()).as_numeric(), None);
    }

    #[test]
    fn test_kpi_value_serializes_untagged() {
        // Reporters consume the serialized tree; the variants must stay flat.
        let numeric = serde_json::to_value(KpiValue::Numeric(600.0)).expect("json");
        assert_eq!(numeric, serde_json::json!(600.0));

        let classification =
            serde_json::to_value(KpiValue::Classification("2 authors".to_string())).expect("json");
        assert_eq!(classification, serde_json::json!("2 authors"));

        let ownership = serde_json::to_value(KpiValue::Ownership {
            authors: vec![AuthorShare { name: "alice".to_string(), share: 80 }],
            primary_owner: Some("alice".to_string()),
        })
        .expect("json");
        assert_eq!(ownership["authors"][0]["share"], 80);
        assert_eq!(ownership["primary_owner"], "alice");
    }

    #[test]
    fn test_kpi_metadata_skipped_when_absent() {
        let kpi = Kpi::numeric("churn", 12.0);
        let json = serde_json::to_value(&kpi).expect("json");
        assert!(json.get("metadata").is_none());
        assert_eq!(json["value"], serde_json::json!(12.0));
    }
}
