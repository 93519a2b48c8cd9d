//! Monthly snapshot archiving.
//!
//! After a full reconcile, the funnel state for the current month is frozen
//! into one `monthly_snapshots` row per ambassador: total live leads, total
//! conversions, and a status breakdown. The `(month, ambassador_id)` upsert
//! overwrites any earlier row for the same month, so re-running within a
//! month converges on the latest full-sync state instead of accumulating.

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use diesel::SqliteConnection;

use crate::models::referral::NewMonthlySnapshot;
use crate::repo;

/// What one archive pass wrote.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// The month key the snapshots were stored under.
    pub month: String,
    /// Number of ambassador rows written.
    pub ambassadors: usize,
}

/// The `YYYY-MM` key for the current month (UTC).
pub fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

/// Upserts one snapshot row per ambassador for the given month.
pub fn archive_month(conn: &mut SqliteConnection, month: &str) -> anyhow::Result<ArchiveSummary> {
    let rollups = repo::ambassador_rollups(conn).context("compute ambassador rollups")?;
    let stamped_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    for rollup in &rollups {
        let breakdown_json = serde_json::to_string(&rollup.breakdown)
            .context("serialize lifecycle breakdown")?;
        let row = NewMonthlySnapshot {
            month,
            ambassador_id: rollup.ambassador_id,
            ambassador_name: &rollup.ambassador_name,
            total_leads: rollup.total_leads as i32,
            total_conversions: rollup.total_conversions as i32,
            lifecycle_breakdown: &breakdown_json,
            created_at: &stamped_at,
        };
        repo::upsert_snapshot(conn, &row)
            .with_context(|| format!("archive snapshot for {}", rollup.ambassador_name))?;
    }

    tracing::info!(month, ambassadors = rollups.len(), "monthly snapshots archived");
    Ok(ArchiveSummary {
        month: month.to_string(),
        ambassadors: rollups.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_shape() {
        let month = current_month();
        assert_eq!(month.len(), 7);
        assert_eq!(&month[4..5], "-");
    }
}
