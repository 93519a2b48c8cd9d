//! Lead reconciliation against the CRM.
//!
//! ## What this does
//! - Selects candidate leads (every live lead in [`SyncMode::Full`], only
//!   those still marked new/pending in [`SyncMode::Incremental`]).
//! - For each candidate: canonicalize the phone, look the contact up in the
//!   CRM, overwrite the stored status when the CRM's label moved, and record
//!   a conversion when the label is on the configured allow-list.
//!
//! ## Failure containment
//! A single lead must never sink the batch. Per-lead errors are counted,
//! logged with the lead's name, and the loop moves on; a lead that errored
//! is simply reconsidered on the next scheduled run. Only setup-time
//! failures (opening the store, loading candidates) abort the job.
//!
//! ## Pacing & cancellation
//! Lookups run strictly one at a time; the CRM client paces every outgoing
//! request, so this loop needs no sleeps of its own. A shared cancel flag
//! (wired to Ctrl-C by the binary) and an optional deadline are checked
//! between leads: the in-flight lead finishes, and whatever counts have
//! accumulated are still reported.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crm_client::contact::Lifecycle;
use crm_client::directory::{ContactDirectory, errors::DirectoryError};
use crm_client::phone;
use diesel::SqliteConnection;

use crate::config::ConversionSet;
use crate::models::referral::{Lead, NewConversion};
use crate::repo;

/// Statuses that mark a lead as still awaiting a CRM verdict.
pub const PENDING_STATUSES: &[&str] = &["new", "pending"];

/// Shortest normalized phone worth sending to the CRM. Anything shorter
/// cannot be a complete number in `+212...` form.
const MIN_PHONE_LEN: usize = 10;

/// Which slice of the lead table a run reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Only leads whose status is still in [`PENDING_STATUSES`].
    Incremental,
    /// Every live lead, regardless of status.
    Full,
}

impl SyncMode {
    fn status_filter(self) -> Option<&'static [&'static str]> {
        match self {
            SyncMode::Incremental => Some(PENDING_STATUSES),
            SyncMode::Full => None,
        }
    }
}

/// Settings for one reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Candidate selection mode.
    pub mode: SyncMode,
    /// Lifecycle labels that record a conversion.
    pub conversions: ConversionSet,
    /// Optional overall deadline, checked between leads.
    pub deadline: Option<Duration>,
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidates the loop reached before finishing or stopping.
    pub considered: u32,
    /// Lookups that returned a contact.
    pub found: u32,
    /// Leads whose stored status was overwritten.
    pub updated: u32,
    /// Conversions recorded this run (duplicates suppressed by the store).
    pub new_conversions: u32,
    /// Lookups the CRM had no record for.
    pub not_found: u32,
    /// Leads skipped for having no usable phone number.
    pub no_phone: u32,
    /// Lookups abandoned after exhausting the 429 retry budget.
    pub gave_up: u32,
    /// Leads that failed with a transport or storage error.
    pub errors: u32,
    /// Whether the run stopped before the candidate list was exhausted.
    pub cancelled: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "lead reconciliation summary")?;
        writeln!(f, "  considered:       {}", self.considered)?;
        writeln!(f, "  found in CRM:     {}", self.found)?;
        writeln!(f, "  status updated:   {}", self.updated)?;
        writeln!(f, "  new conversions:  {}", self.new_conversions)?;
        writeln!(f, "  not found:        {}", self.not_found)?;
        writeln!(f, "  no usable phone:  {}", self.no_phone)?;
        writeln!(f, "  rate-limit stops: {}", self.gave_up)?;
        write!(f, "  errors:           {}", self.errors)?;
        if self.cancelled {
            write!(f, "\n  (stopped before the candidate list was exhausted)")?;
        }
        Ok(())
    }
}

enum LeadOutcome {
    NoPhone,
    NotFound,
    GaveUp,
    Synced { updated: bool, converted: bool },
}

/// Reconciles every candidate lead against the CRM, one at a time.
pub async fn reconcile_leads<D>(
    conn: &mut SqliteConnection,
    directory: &D,
    opt: &ReconcileOptions,
    cancel: &AtomicBool,
) -> anyhow::Result<RunSummary>
where
    D: ContactDirectory + ?Sized,
{
    let leads = repo::candidate_leads(conn, opt.mode.status_filter())?;
    tracing::info!(candidates = leads.len(), mode = ?opt.mode, "starting lead reconciliation");

    let started = Instant::now();
    let mut summary = RunSummary::default();

    for lead in &leads {
        if cancel.load(Ordering::Relaxed) {
            tracing::warn!("cancellation requested, stopping after in-flight lead");
            summary.cancelled = true;
            break;
        }
        if opt.deadline.is_some_and(|d| started.elapsed() >= d) {
            tracing::warn!("run deadline reached, stopping early");
            summary.cancelled = true;
            break;
        }

        summary.considered += 1;
        match reconcile_one(conn, directory, lead, &opt.conversions).await {
            Ok(LeadOutcome::NoPhone) => {
                summary.no_phone += 1;
                tracing::debug!(lead = %lead.full_name, "no usable phone, skipped");
            }
            Ok(LeadOutcome::NotFound) => summary.not_found += 1,
            Ok(LeadOutcome::GaveUp) => {
                summary.gave_up += 1;
                tracing::warn!(lead = %lead.full_name, "CRM rate limit exhausted, moving on");
            }
            Ok(LeadOutcome::Synced { updated, converted }) => {
                summary.found += 1;
                if updated {
                    summary.updated += 1;
                }
                if converted {
                    summary.new_conversions += 1;
                }
            }
            Err(error) => {
                summary.errors += 1;
                tracing::warn!(lead = %lead.full_name, %error, "lead reconciliation failed");
            }
        }
    }

    Ok(summary)
}

async fn reconcile_one<D>(
    conn: &mut SqliteConnection,
    directory: &D,
    lead: &Lead,
    conversions: &ConversionSet,
) -> anyhow::Result<LeadOutcome>
where
    D: ContactDirectory + ?Sized,
{
    let Some(raw) = lead.raw_phone() else {
        return Ok(LeadOutcome::NoPhone);
    };
    let normalized = phone::normalize(raw).unwrap_or_default();
    if normalized.len() < MIN_PHONE_LEN {
        return Ok(LeadOutcome::NoPhone);
    }

    let contact = match directory.contact_by_phone(&normalized).await {
        Ok(contact) => contact,
        Err(DirectoryError::RateLimitExhausted { .. }) => return Ok(LeadOutcome::GaveUp),
        Err(err) => return Err(err.into()),
    };
    let Some(contact) = contact else {
        return Ok(LeadOutcome::NotFound);
    };

    // A blank lifecycle or the CRM's "Unknown" placeholder carries no
    // information; the stored status stays as it is.
    let Some(label) = contact.lifecycle_label() else {
        return Ok(LeadOutcome::Synced { updated: false, converted: false });
    };
    let lifecycle = Lifecycle::parse(label);
    if lifecycle.is_unknown() {
        return Ok(LeadOutcome::Synced { updated: false, converted: false });
    }

    let mut updated = false;
    if lead.status.as_deref() != Some(label) {
        repo::update_lead_status(conn, lead.id, label)?;
        updated = true;
        tracing::info!(lead = %lead.full_name, status = label, "lead status updated");
    }

    let mut converted = false;
    if conversions.contains(&lifecycle) {
        let note = format!("Recorded from CRM lifecycle \"{label}\"");
        let row = NewConversion {
            ambassador_id: lead.ambassador_id,
            lead_id: lead.id,
            amount: 0.0,
            notes: Some(&note),
        };
        if repo::record_conversion_once(conn, &row)? > 0 {
            converted = true;
            tracing::info!(lead = %lead.full_name, lifecycle = label, "conversion recorded");
        }
    }

    Ok(LeadOutcome::Synced { updated, converted })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_mode_filters_on_pending_statuses() {
        assert_eq!(SyncMode::Incremental.status_filter(), Some(PENDING_STATUSES));
        assert_eq!(SyncMode::Full.status_filter(), None);
    }

    #[test]
    fn summary_renders_every_counter() {
        let summary = RunSummary {
            considered: 7,
            found: 4,
            updated: 2,
            new_conversions: 1,
            not_found: 2,
            no_phone: 1,
            gave_up: 0,
            errors: 0,
            cancelled: true,
        };
        let text = summary.to_string();
        assert!(text.contains("considered:       7"));
        assert!(text.contains("new conversions:  1"));
        assert!(text.contains("stopped before"));
    }
}
