//! MetricScope CLI — analyze repositories from the terminal and print the
//! KPI tree.
//!
//! Calls `metricscope-core` directly with no server overhead.

use clap::Parser;
use std::path::PathBuf;

use metricscope_core::types::{FileNode, KpiValue, RepoInfo, ScanDir};
use metricscope_core::{analyze_with_tracker, load_config, TimingTracker};

/// MetricScope CLI — per-file and per-directory code quality KPIs.
#[derive(Parser)]
#[command(name = "ms", version, about)]
struct Cli {
    /// Directories to analyze (default: .metricscope.toml scan_dirs, else ".")
    dirs: Vec<PathBuf>,

    /// Output as JSON instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Print per-operation timing totals after the run
    #[arg(long)]
    timings: bool,

    /// Enable debug-level diagnostics
    #[arg(long)]
    debug: bool,

    /// Hotspot score above which a file is flagged (default 300)
    #[arg(long)]
    hotspot_threshold: Option<f64>,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "metricscope_core=debug" } else { "metricscope_core=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_filter.parse().expect("valid directive")),
        )
        .with_target(false)
        .init();

    let cwd = std::env::current_dir().expect("Could not determine current directory");
    let mut config = load_config(&cwd);
    if !cli.dirs.is_empty() {
        config.scan_dirs = cli.dirs.clone();
    }
    if let Some(threshold) = cli.hotspot_threshold {
        config.hotspot_threshold = threshold;
    }

    let mut tracker = TimingTracker::new();
    let repos = analyze_with_tracker(&config, &mut tracker);

    if cli.json {
        let rendered = metricscope_core::recover::report_generation("JSON export", || {
            serde_json::to_string_pretty(&repos)
        });
        if let Some(json) = rendered {
            println!("{json}");
        }
    } else {
        if repos.is_empty() {
            eprintln!("No source files found.");
            std::process::exit(1);
        }
        for repo in &repos {
            print_repo(repo);
        }
    }

    if cli.timings {
        eprintln!("\nTimings:");
        for (operation, seconds) in tracker.get_timings() {
            eprintln!("  {operation:<16} {seconds:.3}s");
        }
    }
}

// ---------------------------------------------------------------------------
// Tree rendering
// ---------------------------------------------------------------------------

fn print_repo(repo: &RepoInfo) {
    if repo.repo_name.is_empty() {
        println!("(no repository)");
    } else {
        println!("{} ({})", repo.repo_name, repo.repo_root.display());
    }
    print_dir(&repo.results, "");
    println!();
}

fn print_dir(dir: &ScanDir, prefix: &str) {
    let total = dir.scan_dirs.len() + dir.files.len();
    let mut index = 0;

    for (name, child) in &dir.scan_dirs {
        index += 1;
        let last = index == total;
        let branch = if last { "└── " } else { "├── " };
        println!("{prefix}{branch}{name}/ {}", dir_summary(child));
        let child_prefix = if last { format!("{prefix}    ") } else { format!("{prefix}│   ") };
        print_dir(child, &child_prefix);
    }

    for (name, file) in &dir.files {
        index += 1;
        let branch = if index == total { "└── " } else { "├── " };
        println!("{prefix}{branch}{name} {}", file_summary(file));
    }
}

fn numeric(kpis: &std::collections::BTreeMap<String, metricscope_core::Kpi>, name: &str) -> Option<f64> {
    kpis.get(name).and_then(|kpi| kpi.value.as_numeric())
}

fn dir_summary(dir: &ScanDir) -> String {
    let mut parts = Vec::new();
    if let Some(v) = numeric(&dir.kpis, "complexity") {
        parts.push(format!("C: {v}"));
    }
    if let Some(v) = numeric(&dir.kpis, "churn") {
        parts.push(format!("Churn: {v}"));
    }
    if let Some(v) = numeric(&dir.kpis, "hotspot") {
        parts.push(format!("Hotspot: {v}"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("[{}]", parts.join(", "))
    }
}

fn file_summary(file: &FileNode) -> String {
    let mut parts = Vec::new();
    if let Some(v) = numeric(&file.kpis, "complexity") {
        parts.push(format!("C: {v}"));
    }
    if let Some(v) = numeric(&file.kpis, "churn") {
        parts.push(format!("Churn: {v}"));
    }
    if let Some(v) = numeric(&file.kpis, "hotspot") {
        let flagged = file
            .kpis
            .get("hotspot")
            .and_then(|kpi| kpi.metadata.as_ref())
            .and_then(|meta| meta.get("is_hotspot"))
            .and_then(|flag| flag.as_bool())
            .unwrap_or(false);
        if flagged {
            parts.push(format!("Hotspot: {v} ⚠️"));
        } else {
            parts.push(format!("Hotspot: {v}"));
        }
    }
    if let Some(kpi) = file.kpis.get("shared_ownership") {
        if let KpiValue::Classification(label) = &kpi.value {
            parts.push(format!("Shared: {label}"));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("[{}]", parts.join(", "))
    }
}
