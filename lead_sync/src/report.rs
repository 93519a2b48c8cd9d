//! Human-readable run reports.
//!
//! The jobs print to stdout; these types own the formatting so the binary
//! stays a thin wrapper.

use std::fmt;

use diesel::SqliteConnection;
use indexmap::IndexMap;

use crate::reconcile::RunSummary;
use crate::repo;

/// The full-sync report: run counters plus a funnel overview of the whole
/// lead table.
#[derive(Debug, Clone)]
pub struct FullReport {
    /// Counters from the reconciliation pass.
    pub summary: RunSummary,
    /// Status label -> live lead count.
    pub breakdown: IndexMap<String, i64>,
    /// Total conversions on record.
    pub total_conversions: i64,
}

/// Builds the full report after a reconciliation pass.
pub fn full_report(conn: &mut SqliteConnection, summary: RunSummary) -> anyhow::Result<FullReport> {
    let breakdown = repo::status_breakdown(conn)?;
    let total_conversions = repo::conversion_total(conn)?;
    Ok(FullReport {
        summary,
        breakdown,
        total_conversions,
    })
}

impl fmt::Display for FullReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        writeln!(f)?;
        writeln!(f, "lifecycle breakdown (all live leads)")?;
        if self.breakdown.is_empty() {
            writeln!(f, "  (no leads)")?;
        }
        for (label, count) in &self.breakdown {
            writeln!(f, "  {label}: {count}")?;
        }
        write!(f, "total conversions: {}", self.total_conversions)
    }
}
