//! Shared check-in types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emotional tier assigned to a check-in message.
///
/// Variants are ordered by severity so `max` picks the most urgent tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// System-generated nudge, not a user message.
    Auto,
    #[default]
    Stable,
    Stirred,
    #[serde(rename = "At-Risk")]
    AtRisk,
    Critical,
}

impl Tier {
    /// All tiers, in severity order.
    pub const ALL: [Tier; 5] = [
        Tier::Auto,
        Tier::Stable,
        Tier::Stirred,
        Tier::AtRisk,
        Tier::Critical,
    ];

    /// Display label, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Auto => "Auto",
            Tier::Stable => "Stable",
            Tier::Stirred => "Stirred",
            Tier::AtRisk => "At-Risk",
            Tier::Critical => "Critical",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tier: {s}"))
    }
}

/// A persisted check-in exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    /// User the check-in belongs to.
    pub owner_id: String,

    /// When the exchange happened.
    pub timestamp: DateTime<Utc>,

    /// The user's message.
    pub message: String,

    /// Classified tier.
    pub tier: Tier,

    /// Generated reply.
    pub response: String,

    /// Tone tag of the reply.
    #[serde(default = "default_tone")]
    pub tone: String,

    /// Which component produced the reply.
    #[serde(default)]
    pub source: String,

    /// Whether this check-in was generated by the nudge runner.
    #[serde(default)]
    pub is_auto: bool,
}

/// Tone used when a reply carries none.
pub fn default_tone() -> String {
    "gentle".to_string()
}

impl CheckIn {
    /// Create a check-in stamped with the current time.
    pub fn new(
        owner_id: impl Into<String>,
        message: impl Into<String>,
        tier: Tier,
        response: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            timestamp: Utc::now(),
            message: message.into(),
            tier,
            response: response.into(),
            tone: default_tone(),
            source: String::new(),
            is_auto: false,
        }
    }

    /// Set the tone tag.
    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    /// Set the source tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Mark as an automatic nudge.
    pub fn auto(mut self) -> Self {
        self.is_auto = true;
        self
    }
}
