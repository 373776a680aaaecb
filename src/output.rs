//! Output file writer.

use anyhow::Context;
use std::path::Path;

use crate::analyze::NamespaceReport;

/// Write all reports as one pretty-printed JSON array, replacing any
/// existing file at `path`.
pub fn write_report(path: &Path, reports: &[NamespaceReport]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(reports).context("Failed to serialize report")?;

    if path.exists() {
        tracing::warn!("Overwriting existing file {}", path.display());
    }
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    tracing::info!(
        "Wrote {} namespace reports to {}",
        reports.len(),
        path.display()
    );
    Ok(())
}
