//! Optional `.metricscope.toml` configuration loading.
//!
//! ```toml
//! scan_dirs = ["src", "lib"]
//! skip_dirs = ["third_party"]
//!
//! [thresholds]
//! hotspot = 300.0
//! single_owner = 0.8
//! shared_owner = 0.2
//! ```

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::ScanConfig;

/// Load configuration from `<root>/.metricscope.toml`, falling back to
/// defaults for anything missing. A malformed file is ignored with a debug
/// diagnostic rather than aborting the run.
pub fn load_config(root: &Path) -> ScanConfig {
    let mut config = ScanConfig::default();

    let config_path = root.join(".metricscope.toml");
    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(_) => return config,
    };

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(e) => {
            debug!(file = %config_path.display(), error = %e, "malformed config ignored");
            return config;
        }
    };

    if let Some(dirs) = table.get("scan_dirs").and_then(|v| v.as_array()) {
        let parsed: Vec<PathBuf> = dirs
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| root.join(s))
            .collect();
        if !parsed.is_empty() {
            config.scan_dirs = parsed;
        }
    }

    if let Some(dirs) = table.get("skip_dirs").and_then(|v| v.as_array()) {
        for name in dirs.iter().filter_map(|v| v.as_str()) {
            config.skip_dirs.insert(name.to_string());
        }
    }

    if let Some(thresholds) = table.get("thresholds").and_then(|v| v.as_table()) {
        if let Some(v) = thresholds.get("hotspot").and_then(toml_number) {
            config.hotspot_threshold = v;
        }
        if let Some(v) = thresholds.get("single_owner").and_then(toml_number) {
            config.single_owner_threshold = v;
        }
        if let Some(v) = thresholds.get("shared_owner").and_then(toml_number) {
            config.shared_owner_threshold = v;
        }
    }

    config
}

fn toml_number(value: &toml::Value) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|i| i as f64))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(dir.path());
        assert_eq!(config.hotspot_threshold, 300.0);
        assert!(config.skip_dirs.contains(".git"));
    }

    #[test]
    fn test_full_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(".metricscope.toml"),
            "scan_dirs = [\"src\"]\nskip_dirs = [\"third_party\"]\n\n[thresholds]\nhotspot = 500\nsingle_owner = 0.9\n",
        )
        .expect("write");

        let config = load_config(dir.path());
        assert_eq!(config.scan_dirs, vec![dir.path().join("src")]);
        assert!(config.skip_dirs.contains("third_party"));
        assert!(config.skip_dirs.contains(".git"), "defaults are kept");
        assert_eq!(config.hotspot_threshold, 500.0);
        assert_eq!(config.single_owner_threshold, 0.9);
        assert_eq!(config.shared_owner_threshold, 0.2, "untouched threshold keeps default");
    }

    #[test]
    fn test_malformed_config_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(".metricscope.toml"), "scan_dirs = [unclosed").expect("write");
        let config = load_config(dir.path());
        assert_eq!(config.hotspot_threshold, 300.0);
    }
}
