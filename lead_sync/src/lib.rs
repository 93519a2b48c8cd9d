//! Referral lead synchronization: reconcile locally captured leads against
//! the external CRM and archive monthly per-ambassador funnel snapshots.
//!
//! The two jobs built on this library share one pipeline
//! ([`reconcile::reconcile_leads`]) and differ only in candidate selection
//! and whether the archive/report step runs afterwards. See the `lead-sync`
//! binary for the invocation surface.

pub mod archive;
pub mod config;
pub mod db;
pub mod models;
pub mod reconcile;
pub mod report;
pub mod repo;
pub mod schema;
