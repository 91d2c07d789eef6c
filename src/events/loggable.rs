use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity levels for audit events.
/// Controls retention policies and log filtering downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Critical events: long-term retention, never auto-delete.
    /// Every permission and role change falls here.
    Critical,
    /// Important events: medium-term retention (default)
    Important,
    /// Noise events: aggressively trimmed
    Noise,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Important => "important",
            Severity::Noise => "noise",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Important
    }
}

/// Trait for entities that show up in the audit stream. Event names, subject
/// ids and severities are derived from the subject entity rather than spelled
/// out at each publish site.
pub trait Loggable: Serialize + Send + Sync {
    /// The entity type name (e.g. "permission", "issue").
    /// This becomes the prefix in event names like "permission.granted".
    fn entity_type(&self) -> &'static str;

    /// The subject ID (usually the entity's primary key)
    fn subject_id(&self) -> Uuid;

    /// Severity level for audit events (defaults to Important)
    fn severity(&self) -> Severity {
        Severity::Important
    }
}
