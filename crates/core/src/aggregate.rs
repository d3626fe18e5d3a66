//! KPI aggregation up the ScanDir tree.
//!
//! Every directory's KPI values are a pure function of its descendant files'
//! values under the strategy registered for that KPI name, so re-running the
//! aggregator always reproduces the same results.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::types::{Kpi, KpiValue, ScanDir};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// How a list of per-file values collapses into one directory value.
pub enum AggKind {
    Sum,
    Max,
    Min,
    Mean,
    Custom(Box<dyn Fn(&[f64]) -> f64 + Send + Sync>),
}

/// KPI names carrying structured values; strategies on these are rejected at
/// configuration time, not at aggregation time.
pub const STRUCTURED_KPIS: &[&str] = &["ownership", "shared_ownership"];

/// Per-KPI aggregation strategies. KPIs without an entry use the mean.
pub struct AggregationConfig {
    strategies: HashMap<String, AggKind>,
}

impl AggregationConfig {
    pub fn new() -> Self {
        AggregationConfig { strategies: HashMap::new() }
    }

    /// Register a strategy for a KPI name. Structured KPIs are rejected here.
    pub fn with_strategy(mut self, kpi_name: &str, kind: AggKind) -> Result<Self, String> {
        if STRUCTURED_KPIS.contains(&kpi_name) {
            return Err(format!("KPI '{kpi_name}' carries structured values and cannot be aggregated"));
        }
        self.strategies.insert(kpi_name.to_string(), kind);
        Ok(self)
    }

    fn apply(&self, kpi_name: &str, values: &[f64]) -> f64 {
        match self.strategies.get(kpi_name) {
            Some(AggKind::Sum) => values.iter().sum(),
            Some(AggKind::Max) => values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
            Some(AggKind::Min) => values.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
            Some(AggKind::Custom(f)) => f(values),
            Some(AggKind::Mean) | None => values.iter().sum::<f64>() / values.len() as f64,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Recursively attaches aggregated KPI values to every directory in a tree.
pub struct KpiAggregator {
    config: AggregationConfig,
}

impl KpiAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        KpiAggregator { config }
    }

    /// Aggregate `dir` and every directory below it. Numeric results are
    /// rounded to one decimal; KPIs with any non-numeric value in the
    /// collection yield no entry; empty collections yield no entry.
    pub fn aggregate_tree(&self, dir: &mut ScanDir) {
        let mut collected: BTreeMap<String, Vec<KpiValue>> = BTreeMap::new();
        collect_file_kpis(dir, &mut collected);

        dir.kpis.clear();
        for (name, values) in collected {
            if values.is_empty() {
                continue;
            }
            let numerics: Option<Vec<f64>> = values.iter().map(|v| v.as_numeric()).collect();
            match numerics {
                Some(nums) => {
                    let aggregated = round_one_decimal(self.config.apply(&name, &nums));
                    dir.kpis.insert(name.clone(), Kpi::numeric(&name, aggregated));
                }
                None => {
                    debug!(kpi = name.as_str(), dir = dir.dir_name.as_str(), "non-numeric KPI not aggregated");
                }
            }
        }

        for child in dir.scan_dirs.values_mut() {
            self.aggregate_tree(child);
        }
    }
}

/// Gather KPI values from every file in the subtree, keyed by KPI name.
fn collect_file_kpis(dir: &ScanDir, out: &mut BTreeMap<String, Vec<KpiValue>>) {
    for file in dir.files.values() {
        for kpi in file.kpis.values() {
            out.entry(kpi.name.clone()).or_default().push(kpi.value.clone());
        }
    }
    for child in dir.scan_dirs.values() {
        collect_file_kpis(child, out);
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
