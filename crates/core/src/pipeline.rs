//! The analysis pipeline: scan → group → mine → parse → orchestrate →
//! aggregate. Stages run strictly in order; within the parse stage files are
//! independent and processed in parallel.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::aggregate::{AggKind, AggregationConfig, KpiAggregator};
use crate::churn::CodeChurnAnalyzer;
use crate::cognitive;
use crate::grouping::group_by_repository;
use crate::kpis::{
    ChurnKpi, CognitiveComplexityKpi, ComplexityKpi, FileContext, FunctionCountKpi, HotspotKpi,
    KpiOrchestrator, OwnershipKpi, SharedOwnershipKpi,
};
use crate::lang::LanguageRegistry;
use crate::ownership::OwnershipCache;
use crate::scan;
use crate::timing::TimingTracker;
use crate::types::{FileDescriptor, FileNode, FunctionComplexity, RepoInfo, ScanConfig, ScanDir};

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the full pipeline over the configured scan directories.
pub fn analyze(config: &ScanConfig) -> Vec<RepoInfo> {
    let mut tracker = TimingTracker::new();
    analyze_with_tracker(config, &mut tracker)
}

/// Like [`analyze`], accumulating per-operation timings into `tracker`.
pub fn analyze_with_tracker(config: &ScanConfig, tracker: &mut TimingTracker) -> Vec<RepoInfo> {
    let registry = LanguageRegistry::new();

    let descriptors = scan::scan(config, &registry);
    debug!(files = descriptors.len(), "scan complete");

    let (files_by_root, scan_dirs_by_root) = group_by_repository(&descriptors);

    files_by_root
        .iter()
        .map(|(repo_root, files)| {
            let scan_roots = scan_dirs_by_root.get(repo_root).cloned().unwrap_or_default();
            analyze_repo(config, &registry, tracker, repo_root, files, scan_roots)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-repository analysis
// ---------------------------------------------------------------------------

struct ParsedFile {
    content: String,
    language: String,
    complexity: u32,
    function_count: u32,
    functions: Vec<FunctionComplexity>,
}

fn parse_file(registry: &LanguageRegistry, descriptor: &FileDescriptor) -> ParsedFile {
    // Unreadable files degrade to empty content: complexity 1, zero functions.
    let content = scan::read_source(&descriptor.path).unwrap_or_default();

    let (language, complexity, function_count) = match registry.get(&descriptor.ext) {
        Some(parser) => (
            parser.name().to_string(),
            parser.compute_complexity(&content),
            parser.count_functions(&content),
        ),
        None => ("Unknown".to_string(), 1, 0),
    };

    let functions = cognitive::function_complexities(&content, &descriptor.ext);

    ParsedFile { content, language, complexity, function_count, functions }
}

fn analyze_repo(
    config: &ScanConfig,
    registry: &LanguageRegistry,
    tracker: &mut TimingTracker,
    repo_root: &Path,
    files: &[FileDescriptor],
    scan_roots: BTreeSet<PathBuf>,
) -> RepoInfo {
    let in_repo = !repo_root.as_os_str().is_empty();

    // Churn and ownership are mined once per repository before KPI assembly.
    let churn = {
        let _scope = tracker.track("filechurn");
        if in_repo {
            let pairs = scan_roots
                .iter()
                .map(|scan_dir| (repo_root.to_path_buf(), scan_dir.clone()))
                .collect();
            CodeChurnAnalyzer::new(pairs).analyze()
        } else {
            BTreeMap::new()
        }
    };

    let ownership = {
        let _scope = tracker.track("cache_prebuild");
        if in_repo {
            let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
            OwnershipCache::prebuild(repo_root, &paths)
        } else {
            OwnershipCache::empty()
        }
    };

    // Lexical and CST metrics: files are independent here.
    let parsed: Vec<ParsedFile> = {
        let _scope = tracker.track("complexity");
        files.par_iter().map(|fd| parse_file(registry, fd)).collect()
    };

    let orchestrator = default_orchestrator(config);

    let repo_name = repo_root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();
    let mut results = ScanDir::new(&repo_name, repo_root.to_path_buf());

    for (descriptor, metrics) in files.iter().zip(&parsed) {
        let filename = descriptor
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        let file_churn = churn.get(&descriptor.path).copied().unwrap_or(0);
        let file_ownership = ownership.get(&descriptor.path);

        let ctx = FileContext {
            file_path: &descriptor.path,
            repo_root,
            complexity: metrics.complexity,
            function_count: metrics.function_count,
            content: &metrics.content,
            churn: file_churn,
            ownership: file_ownership.as_ref(),
            functions: &metrics.functions,
        };
        let kpis = orchestrator.calculate_file_kpis_timed(&ctx, tracker);

        let node = FileNode {
            filename: filename.clone(),
            absolute_path: descriptor.path.clone(),
            language: metrics.language.clone(),
            kpis,
            functions: metrics.functions.clone(),
        };

        // Inside a repository files nest under the repo root; loose files nest
        // under their scan directory.
        let base = if in_repo { repo_root } else { descriptor.scan_root.as_path() };
        let rel = descriptor
            .path
            .strip_prefix(base)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| PathBuf::from(&filename));
        results.insert_file(&rel, node);
    }

    KpiAggregator::new(default_aggregation()).aggregate_tree(&mut results);

    let analyzed: HashSet<&PathBuf> = files.iter().map(|f| &f.path).collect();
    let churn_data: BTreeMap<PathBuf, u64> =
        churn.into_iter().filter(|(path, _)| analyzed.contains(path)).collect();

    RepoInfo {
        repo_root: repo_root.to_path_buf(),
        repo_name,
        scan_dirs: scan_roots,
        churn_data,
        results,
    }
}

// ---------------------------------------------------------------------------
// Default registrations
// ---------------------------------------------------------------------------

/// The standard calculator set, registered under their timing-operation keys.
/// Result maps are keyed by KPI name, which differs for churn ("filechurn" →
/// "churn") and the ownership pair.
fn default_orchestrator(config: &ScanConfig) -> KpiOrchestrator {
    let mut orchestrator = KpiOrchestrator::new();
    orchestrator.register("complexity", Box::new(ComplexityKpi));
    orchestrator.register("function_count", Box::new(FunctionCountKpi));
    orchestrator.register("cognitive", Box::new(CognitiveComplexityKpi));
    orchestrator.register("filechurn", Box::new(ChurnKpi));
    orchestrator.register("hotspot", Box::new(HotspotKpi { threshold: config.hotspot_threshold }));
    orchestrator.register("ownership", Box::new(OwnershipKpi));
    orchestrator.register(
        "sharedownership",
        Box::new(SharedOwnershipKpi {
            single_owner_threshold: config.single_owner_threshold,
            shared_owner_threshold: config.shared_owner_threshold,
        }),
    );
    orchestrator
}

/// Additive metrics sum, hotspot takes the worst file, everything else means.
fn default_aggregation() -> AggregationConfig {
    AggregationConfig::new()
        .with_strategy("churn", AggKind::Sum)
        .and_then(|c| c.with_strategy("function_count", AggKind::Sum))
        .and_then(|c| c.with_strategy("hotspot", AggKind::Max))
        .expect("numeric KPI strategies")
}
