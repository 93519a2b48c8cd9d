//! Diesel models for the referral core tables.
//!
//! These mirror the tables in [`crate::schema`]:
//! - [`crate::schema::ambassadors`] — referral-program participants
//! - [`crate::schema::leads`] — captured prospect contacts (soft-deletable)
//! - [`crate::schema::conversions`] — at most one per lead (UNIQUE lead_id)
//! - [`crate::schema::monthly_snapshots`] — per-(month, ambassador) archive
//!
//! Timestamps are stored as RFC3339-style text, written by SQLite defaults
//! or by the archiver.

use diesel::prelude::*;

// ----------------------- ambassadors -----------------------

/// A referral-program participant, identified by a unique referral code.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::ambassadors)]
pub struct Ambassador {
    /// Row id.
    pub id: i32,
    /// Display name, denormalized into snapshots.
    pub full_name: String,
    /// The unique code embedded in this ambassador's referral links.
    pub referral_code: String,
    /// Creation timestamp (RFC3339 text).
    pub created_at: String,
}

/// Insertable form of [`Ambassador`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::ambassadors)]
pub struct NewAmbassador<'a> {
    pub full_name: &'a str,
    pub referral_code: &'a str,
}

// ----------------------- leads ------------------------------

/// A captured prospect contact.
///
/// `status` holds the CRM's last-observed lifecycle label verbatim; the
/// reconciler is the only writer on the sync path. Rows with `deleted_at`
/// set are soft-deleted and invisible to every job query.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::leads)]
pub struct Lead {
    /// Row id.
    pub id: i32,
    /// Owning ambassador, if the lead came in through a referral link.
    pub ambassador_id: Option<i32>,
    /// Name as submitted on the lead form.
    pub full_name: String,
    /// Phone number as submitted (arbitrary format).
    pub phone: Option<String>,
    /// WhatsApp number as submitted; preferred over `phone` when present.
    pub whatsapp_number: Option<String>,
    /// Last-observed CRM lifecycle label ("new" at submission time).
    pub status: Option<String>,
    /// Creation timestamp (RFC3339 text).
    pub created_at: String,
    /// Soft-delete marker.
    pub deleted_at: Option<String>,
}

impl Lead {
    /// The raw number to look this lead up by: WhatsApp first, then phone,
    /// skipping blank values.
    pub fn raw_phone(&self) -> Option<&str> {
        self.whatsapp_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or_else(|| {
                self.phone
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
            })
    }
}

/// Insertable form of [`Lead`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::leads)]
pub struct NewLead<'a> {
    pub ambassador_id: Option<i32>,
    pub full_name: &'a str,
    pub phone: Option<&'a str>,
    pub whatsapp_number: Option<&'a str>,
    pub status: Option<&'a str>,
}

// ----------------------- conversions ------------------------

/// A recorded "became a student" outcome for a lead.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::conversions)]
pub struct Conversion {
    pub id: i32,
    pub ambassador_id: Option<i32>,
    pub lead_id: i32,
    pub amount: f64,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Insertable form of [`Conversion`]. The `lead_id` UNIQUE constraint makes
/// the insert a no-op when the lead already converted.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::conversions)]
pub struct NewConversion<'a> {
    pub ambassador_id: Option<i32>,
    pub lead_id: i32,
    pub amount: f64,
    pub notes: Option<&'a str>,
}

// ----------------------- monthly_snapshots ------------------

/// One archived month of per-ambassador funnel totals.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::monthly_snapshots)]
pub struct MonthlySnapshot {
    pub id: i32,
    /// Month key, `YYYY-MM`.
    pub month: String,
    pub ambassador_id: i32,
    /// Ambassador name at archive time.
    pub ambassador_name: String,
    pub total_leads: i32,
    pub total_conversions: i32,
    /// JSON object mapping status label to lead count.
    pub lifecycle_breakdown: String,
    pub created_at: String,
}

/// Insertable/changeset form for the `(month, ambassador_id)` upsert.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::monthly_snapshots)]
pub struct NewMonthlySnapshot<'a> {
    pub month: &'a str,
    pub ambassador_id: i32,
    pub ambassador_name: &'a str,
    pub total_leads: i32,
    pub total_conversions: i32,
    pub lifecycle_breakdown: &'a str,
    pub created_at: &'a str,
}
