//! Uniform recovery wrappers: failures are reduced to a one-line user message
//! plus a debug diagnostic, and the pipeline continues with partial results.

use std::fmt::{Debug, Display};
use tracing::debug;

/// Run a git operation, converting failure into `None` with a one-line warning.
pub fn git_operation<T, E: Display>(
    operation_name: &str,
    op: impl FnOnce() -> Result<T, E>,
) -> Option<T> {
    match op() {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("   ⚠️  {operation_name} failed: {e}");
            debug!(operation = operation_name, error = %e, "git operation failed");
            None
        }
    }
}

/// Run a report-generation step, converting failure into `None` with an error
/// line and a full diagnostic dump. Other reports proceed.
pub fn report_generation<T, E: Display + Debug>(
    operation_name: &str,
    op: impl FnOnce() -> Result<T, E>,
) -> Option<T> {
    match op() {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("\n❌ Error in {operation_name}: {e}");
            debug!(operation = operation_name, error = ?e, "report generation failed");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_operation_success() {
        let result = git_operation("fetch churn", || Ok::<_, String>(42));
        assert_eq!(result, Some(42));
    }

    #[test]
    fn test_git_operation_failure_returns_none() {
        let result = git_operation::<u32, _>("fetch churn", || Err("no repo".to_string()));
        assert_eq!(result, None);
    }

    #[test]
    fn test_report_generation_failure_returns_none() {
        let result = report_generation::<(), _>("hotspot report", || Err("boom".to_string()));
        assert_eq!(result, None);
    }

    #[test]
    fn test_report_generation_passes_value_through() {
        let result = report_generation("summary", || Ok::<_, String>("ok"));
        assert_eq!(result, Some("ok"));
    }
}
