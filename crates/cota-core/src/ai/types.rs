//! Narrative backend response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated recommendation narrative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    /// Free-text summary walking the buyer through the ranked plans
    pub summary: String,
    /// Short label characterizing the buyer ("Primeira conquista", ...)
    pub profile_label: String,
    /// Which model (or fallback) produced the text
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

/// Raw payload extracted from a model response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NarrativePayload {
    pub summary: String,
    pub profile_label: String,
}
