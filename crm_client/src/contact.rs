//! Contact payloads and lifecycle labels returned by the CRM.

use std::fmt;

use serde::Deserialize;

/// The slice of a CRM contact record this system consumes.
///
/// The CRM returns a much larger document; only the phone and the free-text
/// `lifecycle` label matter here, so everything else is ignored during
/// deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Contact {
    /// The phone number the CRM has on file, if any.
    #[serde(default)]
    pub phone: Option<String>,
    /// The contact's lifecycle label (e.g. "New", "Our Student").
    #[serde(default)]
    pub lifecycle: Option<String>,
}

impl Contact {
    /// The trimmed lifecycle label, or `None` when absent or blank.
    pub fn lifecycle_label(&self) -> Option<&str> {
        self.lifecycle
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// A CRM lifecycle label, parsed into a closed set of known states.
///
/// The CRM stores lifecycles as free text, which in practice acts as an
/// implicit state machine. Parsing into this enum makes the known states
/// explicit while still carrying anything unrecognized verbatim in
/// [`Lifecycle::Other`], since the CRM can grow new labels at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Freshly captured, not yet contacted.
    New,
    /// Contacted, outcome still open.
    Pending,
    /// Enrolled as a student.
    OurStudent,
    /// Enrolled in the March intake.
    OurStudentMarch,
    /// A returning applicant from an earlier cycle who enrolled.
    NewOldApplicant,
    /// The CRM's explicit placeholder for "no information".
    Unknown,
    /// Any label outside the known set, kept verbatim (trimmed).
    Other(String),
}

impl Lifecycle {
    /// Parses a label case-insensitively against the known states.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "new" => Lifecycle::New,
            "pending" => Lifecycle::Pending,
            "our student" => Lifecycle::OurStudent,
            "our student (march)" => Lifecycle::OurStudentMarch,
            "new old applicant" => Lifecycle::NewOldApplicant,
            "unknown" => Lifecycle::Unknown,
            _ => Lifecycle::Other(trimmed.to_string()),
        }
    }

    /// The canonical display label for this lifecycle.
    pub fn label(&self) -> &str {
        match self {
            Lifecycle::New => "New",
            Lifecycle::Pending => "Pending",
            Lifecycle::OurStudent => "Our Student",
            Lifecycle::OurStudentMarch => "Our Student (March)",
            Lifecycle::NewOldApplicant => "New Old applicant",
            Lifecycle::Unknown => "Unknown",
            Lifecycle::Other(s) => s,
        }
    }

    /// A lowercase membership key, used for allow-list tests so that
    /// configured labels match regardless of capitalization.
    pub fn key(&self) -> String {
        self.label().to_lowercase()
    }

    /// Whether this is the CRM's "no information" placeholder.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Lifecycle::Unknown)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_parse_case_insensitively() {
        assert_eq!(Lifecycle::parse("our student"), Lifecycle::OurStudent);
        assert_eq!(Lifecycle::parse("OUR STUDENT (MARCH)"), Lifecycle::OurStudentMarch);
        assert_eq!(Lifecycle::parse(" New Old applicant "), Lifecycle::NewOldApplicant);
        assert_eq!(Lifecycle::parse("unknown"), Lifecycle::Unknown);
    }

    #[test]
    fn unrecognized_labels_are_kept_verbatim() {
        let lc = Lifecycle::parse("  Visited Campus ");
        assert_eq!(lc, Lifecycle::Other("Visited Campus".into()));
        assert_eq!(lc.label(), "Visited Campus");
        assert_eq!(lc.key(), "visited campus");
    }

    #[test]
    fn contact_deserializes_with_missing_fields() {
        let c: Contact = serde_json::from_str(r#"{"phone": "+212612345678"}"#).unwrap();
        assert_eq!(c.phone.as_deref(), Some("+212612345678"));
        assert_eq!(c.lifecycle, None);
        assert_eq!(c.lifecycle_label(), None);
    }

    #[test]
    fn contact_ignores_extra_fields() {
        let c: Contact = serde_json::from_str(
            r#"{"phone": "x", "lifecycle": " Our Student ", "owner": {"id": 3}}"#,
        )
        .unwrap();
        assert_eq!(c.lifecycle_label(), Some("Our Student"));
    }

    #[test]
    fn blank_lifecycle_reads_as_absent() {
        let c: Contact = serde_json::from_str(r#"{"lifecycle": "   "}"#).unwrap();
        assert_eq!(c.lifecycle_label(), None);
    }
}
