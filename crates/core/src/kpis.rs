//! KPI calculators and the orchestrator that runs them per file.
//!
//! Each calculator is an interchangeable strategy over the same file context.
//! The orchestrator keys results by the KPI's own `name`, not the registry
//! key, and elides calculators that fail so one bad metric never poisons the
//! rest of a file's KPIs.

use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::ownership::FileOwnership;
use crate::timing::TimingTracker;
use crate::types::{AuthorShare, FunctionComplexity, Kpi, KpiValue};

// ---------------------------------------------------------------------------
// File context
// ---------------------------------------------------------------------------

/// Everything a calculator may need for one file. Data only; thresholds live
/// on the calculators themselves.
pub struct FileContext<'a> {
    pub file_path: &'a Path,
    pub repo_root: &'a Path,
    pub complexity: u32,
    pub function_count: u32,
    pub content: &'a str,
    pub churn: u64,
    pub ownership: Option<&'a FileOwnership>,
    pub functions: &'a [FunctionComplexity],
}

/// A KPI calculator turns a file context into one named measurement.
pub trait KpiCalculator: Send + Sync {
    fn calculate(&self, ctx: &FileContext) -> Result<Kpi, String>;
}

// ---------------------------------------------------------------------------
// Hotspot scoring
// ---------------------------------------------------------------------------

/// Hotspot score: complexity × churn. Defined only for non-negative finite
/// inputs; anything else scores 0.
pub fn hotspot_score(complexity: f64, churn: f64) -> f64 {
    if complexity.is_finite() && churn.is_finite() && complexity >= 0.0 && churn >= 0.0 {
        complexity * churn
    } else {
        0.0
    }
}

/// A file is a hotspot when its score exceeds the threshold.
pub fn is_hotspot(score: f64, threshold: f64) -> bool {
    score > threshold
}

// ---------------------------------------------------------------------------
// Calculators
// ---------------------------------------------------------------------------

/// Cyclomatic complexity as computed by the lexical parsers.
pub struct ComplexityKpi;

impl KpiCalculator for ComplexityKpi {
    fn calculate(&self, ctx: &FileContext) -> Result<Kpi, String> {
        Ok(Kpi::numeric("complexity", ctx.complexity as f64))
    }
}

/// Number of function definitions matched by the language's pattern.
pub struct FunctionCountKpi;

impl KpiCalculator for FunctionCountKpi {
    fn calculate(&self, ctx: &FileContext) -> Result<Kpi, String> {
        Ok(Kpi::numeric("function_count", ctx.function_count as f64))
    }
}

/// Average Cognitive Complexity over the file's functions. Absent (not zero)
/// for files without CST support.
pub struct CognitiveComplexityKpi;

impl KpiCalculator for CognitiveComplexityKpi {
    fn calculate(&self, ctx: &FileContext) -> Result<Kpi, String> {
        if ctx.functions.is_empty() {
            return Err("no function-level complexity data".to_string());
        }
        let total: u32 = ctx.functions.iter().map(|f| f.cognitive_complexity).sum();
        let mean = total as f64 / ctx.functions.len() as f64;
        Ok(Kpi::numeric("cognitive_complexity", mean))
    }
}

/// Total added+removed lines across the repository history.
pub struct ChurnKpi;

impl KpiCalculator for ChurnKpi {
    fn calculate(&self, ctx: &FileContext) -> Result<Kpi, String> {
        Ok(Kpi::numeric("churn", ctx.churn as f64))
    }
}

/// Complexity × churn, flagged against a threshold.
pub struct HotspotKpi {
    pub threshold: f64,
}

impl KpiCalculator for HotspotKpi {
    fn calculate(&self, ctx: &FileContext) -> Result<Kpi, String> {
        let score = hotspot_score(ctx.complexity as f64, ctx.churn as f64);
        Ok(Kpi {
            name: "hotspot".to_string(),
            value: KpiValue::Numeric(score),
            metadata: Some(json!({
                "is_hotspot": is_hotspot(score, self.threshold),
                "threshold": self.threshold,
            })),
        })
    }
}

/// Per-author line shares at HEAD, rounded to whole percent.
pub struct OwnershipKpi;

impl KpiCalculator for OwnershipKpi {
    fn calculate(&self, ctx: &FileContext) -> Result<Kpi, String> {
        let (authors, primary_owner) = match ctx.ownership {
            Some(ownership) => {
                let authors: Vec<AuthorShare> = ownership
                    .authors
                    .iter()
                    .map(|(name, share)| AuthorShare {
                        name: name.clone(),
                        share: (share * 100.0).round() as u32,
                    })
                    .collect();
                (authors, ownership.primary_owner().map(|s| s.to_string()))
            }
            None => (Vec::new(), None),
        };
        Ok(Kpi {
            name: "ownership".to_string(),
            value: KpiValue::Ownership { authors, primary_owner },
            metadata: None,
        })
    }
}

/// Classification of how concentrated a file's ownership is.
pub struct SharedOwnershipKpi {
    /// A share above this makes the file single-owner.
    pub single_owner_threshold: f64,
    /// Authors at or below this share are not counted as owners.
    pub shared_owner_threshold: f64,
}

impl KpiCalculator for SharedOwnershipKpi {
    fn calculate(&self, ctx: &FileContext) -> Result<Kpi, String> {
        let authors: &[(String, f64)] = ctx.ownership.map(|o| o.authors.as_slice()).unwrap_or(&[]);

        let classification =
            match authors.iter().find(|(_, share)| *share > self.single_owner_threshold) {
                Some((name, _)) => format!("Single owner: {name}"),
                None => {
                    let owners =
                        authors.iter().filter(|(_, share)| *share > self.shared_owner_threshold).count();
                    if owners == 0 {
                        format!("None (threshold: {})", self.shared_owner_threshold)
                    } else {
                        format!("{owners} authors")
                    }
                }
            };

        Ok(Kpi {
            name: "shared_ownership".to_string(),
            value: KpiValue::Classification(classification),
            metadata: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs registered calculators in registration order and collects their KPIs.
pub struct KpiOrchestrator {
    calculators: Vec<(String, Box<dyn KpiCalculator>)>,
}

impl KpiOrchestrator {
    pub fn new() -> Self {
        KpiOrchestrator { calculators: Vec::new() }
    }

    /// Register a calculator under a key. The key names the timing operation;
    /// the result map is keyed by the KPI's own name.
    pub fn register(&mut self, key: &str, calculator: Box<dyn KpiCalculator>) {
        self.calculators.push((key.to_string(), calculator));
    }

    /// Calculate all KPIs for one file. A failing calculator is logged at
    /// debug level and elided; the rest proceed.
    pub fn calculate_file_kpis(&self, ctx: &FileContext) -> BTreeMap<String, Kpi> {
        let mut kpis = BTreeMap::new();
        for (key, calculator) in &self.calculators {
            match calculator.calculate(ctx) {
                Ok(kpi) => {
                    kpis.insert(kpi.name.clone(), kpi);
                }
                Err(e) => {
                    debug!(calculator = key.as_str(), file = %ctx.file_path.display(), error = %e, "KPI elided");
                }
            }
        }
        kpis
    }

    /// Like [`calculate_file_kpis`](Self::calculate_file_kpis), accumulating
    /// each calculator's runtime under its registry key.
    pub fn calculate_file_kpis_timed(
        &self,
        ctx: &FileContext,
        tracker: &mut TimingTracker,
    ) -> BTreeMap<String, Kpi> {
        let mut kpis = BTreeMap::new();
        for (key, calculator) in &self.calculators {
            let _scope = tracker.track(key);
            match calculator.calculate(ctx) {
                Ok(kpi) => {
                    kpis.insert(kpi.name.clone(), kpi);
                }
                Err(e) => {
                    debug!(calculator = key.as_str(), file = %ctx.file_path.display(), error = %e, "KPI elided");
                }
            }
        }
        kpis
    }
}

impl Default for KpiOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
