//! Queries and upserts over the referral tables.

use diesel::prelude::*;
use diesel::{ExpressionMethods, RunQueryDsl, SqliteConnection, insert_into};
use indexmap::IndexMap;

use crate::models::referral::{Ambassador, Lead, NewConversion, NewMonthlySnapshot};
use crate::schema::{ambassadors, conversions, monthly_snapshots as snapshots};

/// Loads reconciliation candidates, newest first.
///
/// Soft-deleted leads never qualify. When `status_filter` is given, only
/// leads whose status matches one of the entries (case-insensitively) are
/// returned; `None` selects every live lead. Phone presence is judged later,
/// per lead, so that phoneless leads are still counted by the run.
pub fn candidate_leads(
    conn: &mut SqliteConnection,
    status_filter: Option<&[&str]>,
) -> QueryResult<Vec<Lead>> {
    use crate::schema::leads::dsl as l;

    let rows: Vec<Lead> = l::leads
        .filter(l::deleted_at.is_null())
        .order((l::created_at.desc(), l::id.desc()))
        .select(Lead::as_select())
        .load(conn)?;

    let Some(wanted) = status_filter else {
        return Ok(rows);
    };
    Ok(rows
        .into_iter()
        .filter(|lead| {
            lead.status
                .as_deref()
                .is_some_and(|s| wanted.iter().any(|w| w.eq_ignore_ascii_case(s.trim())))
        })
        .collect())
}

/// Overwrites a lead's stored status with the CRM's latest label.
pub fn update_lead_status(
    conn: &mut SqliteConnection,
    lead_id: i32,
    status: &str,
) -> QueryResult<usize> {
    use crate::schema::leads::dsl as l;

    diesel::update(l::leads.filter(l::id.eq(lead_id)))
        .set(l::status.eq(status))
        .execute(conn)
}

/// Whether a conversion has already been recorded for this lead.
pub fn conversion_exists(conn: &mut SqliteConnection, lead_id: i32) -> QueryResult<bool> {
    use crate::schema::conversions::dsl as c;

    let n: i64 = c::conversions
        .filter(c::lead_id.eq(lead_id))
        .count()
        .get_result(conn)?;
    Ok(n > 0)
}

/// Records a conversion unless the lead already has one.
///
/// Returns the number of rows inserted: 1 for a fresh conversion, 0 when
/// the `lead_id` UNIQUE constraint suppressed a duplicate. This makes
/// repeated reconciliation runs convergent without a read-before-write.
pub fn record_conversion_once(
    conn: &mut SqliteConnection,
    row: &NewConversion<'_>,
) -> QueryResult<usize> {
    use crate::schema::conversions::dsl as c;

    insert_into(conversions::table)
        .values(row)
        .on_conflict(c::lead_id)
        .do_nothing()
        .execute(conn)
}

/// Counts live leads per status label, first-seen order.
///
/// Leads with a missing or blank status are bucketed under `"Unknown"`.
pub fn status_breakdown(conn: &mut SqliteConnection) -> QueryResult<IndexMap<String, i64>> {
    use crate::schema::leads::dsl as l;

    let statuses: Vec<Option<String>> = l::leads
        .filter(l::deleted_at.is_null())
        .order((l::created_at.desc(), l::id.desc()))
        .select(l::status)
        .load(conn)?;

    let mut breakdown: IndexMap<String, i64> = IndexMap::new();
    for status in statuses {
        let label = match status.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => "Unknown".to_string(),
        };
        *breakdown.entry(label).or_insert(0) += 1;
    }
    Ok(breakdown)
}

/// Total recorded conversions.
pub fn conversion_total(conn: &mut SqliteConnection) -> QueryResult<i64> {
    use crate::schema::conversions::dsl as c;

    c::conversions.count().get_result(conn)
}

/// Per-ambassador funnel totals, ready to archive.
#[derive(Debug, Clone)]
pub struct SnapshotRollup {
    pub ambassador_id: i32,
    pub ambassador_name: String,
    pub total_leads: i64,
    pub total_conversions: i64,
    /// Status label -> live lead count; blank statuses under `"Unknown"`.
    pub breakdown: IndexMap<String, i64>,
}

/// Computes one [`SnapshotRollup`] per ambassador over live leads and
/// recorded conversions. Ambassadors without activity still get a rollup
/// (all zeros) so the archive stays complete.
pub fn ambassador_rollups(conn: &mut SqliteConnection) -> QueryResult<Vec<SnapshotRollup>> {
    use crate::schema::conversions::dsl as c;
    use crate::schema::leads::dsl as l;

    let owners: Vec<Ambassador> = ambassadors::table
        .order(ambassadors::id.asc())
        .select(Ambassador::as_select())
        .load(conn)?;

    let lead_rows: Vec<(Option<i32>, Option<String>)> = l::leads
        .filter(l::deleted_at.is_null())
        .select((l::ambassador_id, l::status))
        .load(conn)?;

    let conversion_owners: Vec<Option<i32>> =
        c::conversions.select(c::ambassador_id).load(conn)?;

    let mut rollups: Vec<SnapshotRollup> = owners
        .into_iter()
        .map(|a| SnapshotRollup {
            ambassador_id: a.id,
            ambassador_name: a.full_name,
            total_leads: 0,
            total_conversions: 0,
            breakdown: IndexMap::new(),
        })
        .collect();

    for (owner, status) in lead_rows {
        let Some(owner) = owner else { continue };
        let Some(rollup) = rollups.iter_mut().find(|r| r.ambassador_id == owner) else {
            continue;
        };
        rollup.total_leads += 1;
        let label = match status.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => "Unknown".to_string(),
        };
        *rollup.breakdown.entry(label).or_insert(0) += 1;
    }

    for owner in conversion_owners.into_iter().flatten() {
        if let Some(rollup) = rollups.iter_mut().find(|r| r.ambassador_id == owner) {
            rollup.total_conversions += 1;
        }
    }

    Ok(rollups)
}

/// Inserts or overwrites the snapshot row for `(month, ambassador)`.
pub fn upsert_snapshot(
    conn: &mut SqliteConnection,
    row: &NewMonthlySnapshot<'_>,
) -> QueryResult<usize> {
    use crate::schema::monthly_snapshots::dsl as ms;

    insert_into(snapshots::table)
        .values(row)
        .on_conflict((ms::month, ms::ambassador_id))
        .do_update()
        .set(row)
        .execute(conn)
}
