//! Job configuration: parsing, normalization, and loading.
//!
//! Sync jobs are tuned by a small TOML file:
//!
//! ```toml
//! pace_ms = 100
//! max_run_seconds = 1800
//! conversion_lifecycles = ["Our Student", "Our Student (March)", "New Old applicant"]
//!
//! [retry]
//! max_attempts = 5
//! base_delay_ms = 5000
//! ```
//!
//! Every field has a default, so an absent file or an empty table is valid.
//! Secrets never live here: the database URL and CRM credentials come from
//! the environment (`DATABASE_URL`, `CRM_BASE_URL`, `CRM_ACCESS_TOKEN`).
//!
//! Normalization trims the conversion allow-list, drops duplicates
//! case-insensitively while preserving order, and rejects configurations
//! that would leave the job unable to run (empty allow-list, zero pacing,
//! zero retry attempts).

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, bail};
use crm_client::contact::Lifecycle;
use crm_client::directory::rest::{DirectoryOptions, RetryPolicy};
use serde::{Deserialize, Serialize};
use toml::from_str;

/// Tunables for one sync run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct JobConfig {
    /// Minimum spacing between CRM lookups, in milliseconds.
    pub pace_ms: u64,
    /// Optional overall run deadline; the in-flight lead finishes and the
    /// summary still prints.
    pub max_run_seconds: Option<u64>,
    /// 429 retry schedule for the CRM client.
    pub retry: RetryCfg,
    /// Lifecycle labels that count as a conversion.
    pub conversion_lifecycles: Vec<String>,
}

/// Retry schedule section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetryCfg {
    /// Total request attempts before a lookup gives up.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds; doubles per retry.
    pub base_delay_ms: u64,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 5000,
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            pace_ms: 100,
            max_run_seconds: None,
            retry: RetryCfg::default(),
            conversion_lifecycles: vec![
                "Our Student".to_string(),
                "Our Student (March)".to_string(),
                "New Old applicant".to_string(),
            ],
        }
    }
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default)]
pub struct NormalizationReport {
    /// Count of removed duplicate conversion labels.
    pub lifecycles_deduped: usize,
}

impl JobConfig {
    /// Normalize the configuration in place.
    ///
    /// - Trims conversion labels and drops empties.
    /// - Deduplicates labels case-insensitively, preserving first-seen order.
    ///
    /// Errors when the allow-list ends up empty, pacing is zero, or the
    /// retry budget is zero attempts.
    pub fn normalize(&mut self) -> anyhow::Result<NormalizationReport> {
        let mut report = NormalizationReport::default();

        let before = self.conversion_lifecycles.len();
        let mut seen = BTreeSet::new();
        let mut labels = Vec::with_capacity(before);
        for label in std::mem::take(&mut self.conversion_lifecycles) {
            let trimmed = label.trim().to_string();
            if trimmed.is_empty() {
                continue;
            }
            if seen.insert(trimmed.to_lowercase()) {
                labels.push(trimmed);
            }
        }
        report.lifecycles_deduped = before.saturating_sub(labels.len());

        if labels.is_empty() {
            bail!("conversion_lifecycles must name at least one label");
        }
        if self.pace_ms == 0 {
            bail!("pace_ms must be non-zero");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }

        self.conversion_lifecycles = labels;
        Ok(report)
    }

    /// The allow-list as a membership set over parsed lifecycles.
    pub fn conversion_set(&self) -> ConversionSet {
        ConversionSet::from_labels(&self.conversion_lifecycles)
    }

    /// Client tunables derived from this configuration.
    pub fn directory_options(&self) -> DirectoryOptions {
        DirectoryOptions {
            pace: Duration::from_millis(self.pace_ms),
            retry: RetryPolicy {
                max_attempts: self.retry.max_attempts,
                base_delay: Duration::from_millis(self.retry.base_delay_ms),
            },
        }
    }

    /// The run deadline, if one is configured.
    pub fn deadline(&self) -> Option<Duration> {
        self.max_run_seconds.map(Duration::from_secs)
    }
}

/// The set of lifecycle labels that record a conversion.
///
/// Membership is tested over [`Lifecycle::key`], so configured labels match
/// CRM labels regardless of capitalization.
#[derive(Debug, Clone)]
pub struct ConversionSet {
    keys: BTreeSet<String>,
}

impl ConversionSet {
    /// Builds the set from configured labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = labels
            .into_iter()
            .map(|l| Lifecycle::parse(l.as_ref()).key())
            .collect();
        Self { keys }
    }

    /// Whether the given lifecycle counts as a conversion.
    pub fn contains(&self, lifecycle: &Lifecycle) -> bool {
        self.keys.contains(&lifecycle.key())
    }
}

/// Parse and normalize a job configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<JobConfig> {
    let mut cfg: JobConfig = from_str(toml_str).context("failed to parse job config TOML")?;
    let _report = cfg.normalize().context("job config rejected")?;
    Ok(cfg)
}

/// Read a job configuration TOML file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<JobConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read job config {}", path.as_ref().display()))?;
    load_config_str(&text)
}
