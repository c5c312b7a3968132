//! Feedback classification and the response routing table.
//!
//! [`Classification`] is the four-way tag produced by the classification
//! stage.  [`ResponseRoute`] maps each tag to exactly one response stage and
//! adds a fifth entry, [`ResponseRoute::Fallback`], for tags outside the set.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Positive,
    Negative,
    Neutral,
    Escalate,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Positive,
        Classification::Negative,
        Classification::Neutral,
        Classification::Escalate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Positive => "positive",
            Classification::Negative => "negative",
            Classification::Neutral => "neutral",
            Classification::Escalate => "escalate",
        }
    }

    /// Parse a model reply; surrounding whitespace and case are ignored.
    pub fn from_tag(raw: &str) -> Option<Self> {
        let tag = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == tag)
    }

    /// Like [`from_tag`](Self::from_tag) but anything unrecognised becomes
    /// [`Classification::Escalate`].
    pub fn coerce(raw: &str) -> Self {
        Self::from_tag(raw).unwrap_or_else(|| {
            log::warn!(
                "Invalid classification result: {:?}. Defaulting to escalate.",
                raw.trim()
            );
            Classification::Escalate
        })
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResponseRoute
// ---------------------------------------------------------------------------

/// Which response-generation stage handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseRoute {
    Positive,
    Negative,
    Neutral,
    Escalate,
    /// Tag outside the known set.
    Fallback,
}

impl ResponseRoute {
    /// Route a raw tag without coercion.
    pub fn for_tag(tag: &str) -> Self {
        Classification::from_tag(tag)
            .map(Self::from)
            .unwrap_or(ResponseRoute::Fallback)
    }

    pub fn stage_name(&self) -> &'static str {
        match self {
            ResponseRoute::Positive => "positive_response",
            ResponseRoute::Negative => "negative_response",
            ResponseRoute::Neutral => "neutral_response",
            ResponseRoute::Escalate => "escalation_response",
            ResponseRoute::Fallback => "fallback_response",
        }
    }
}

impl From<Classification> for ResponseRoute {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Positive => ResponseRoute::Positive,
            Classification::Negative => ResponseRoute::Negative,
            Classification::Neutral => ResponseRoute::Neutral,
            Classification::Escalate => ResponseRoute::Escalate,
        }
    }
}
