//! MetricScope core — a multi-language source-code metrics engine.
//!
//! Given one or more scan directories, the engine computes per-file quality
//! KPIs (cyclomatic complexity, Cognitive Complexity, churn, hotspot score,
//! ownership) and aggregates them into a hierarchical model of repositories,
//! directories, and files that reporters walk or serialize.
//!
//! Failures never abort a run: unreadable files, missing repositories, and
//! broken calculators each degrade to partial results with a one-line
//! warning.

pub mod aggregate;
pub mod churn;
pub mod cognitive;
pub mod config;
pub mod grouping;
pub mod kpis;
pub mod lang;
pub mod ownership;
pub mod pipeline;
pub mod recover;
pub mod scan;
pub mod timing;
pub mod types;

pub use config::load_config;
pub use pipeline::{analyze, analyze_with_tracker};
pub use timing::TimingTracker;
pub use types::{FileDescriptor, FileNode, Kpi, KpiValue, RepoInfo, ScanConfig, ScanDir};
