//! Per-user check-in summaries.

use chrono::{DateTime, Utc};
use saini_core::{CheckIn, Tier};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of one user's check-in history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAnalytics {
    /// User the summary describes.
    pub owner_id: String,

    /// Number of check-ins, nudges included.
    pub total_reflections: usize,

    /// Check-ins per tier.
    pub tier_distribution: BTreeMap<Tier, usize>,

    /// Check-ins per reply tone.
    pub tone_distribution: BTreeMap<String, usize>,

    /// Tier of the newest check-in.
    pub latest_tier: Tier,

    /// Tone of the newest check-in.
    pub latest_tone: String,

    /// Timestamp of the newest check-in.
    pub last_checkin: DateTime<Utc>,
}

impl UserAnalytics {
    /// Summarize the check-ins of `owner_id` found in `checkins`.
    ///
    /// Check-ins of other users are ignored. Returns `None` when the user has
    /// none.
    pub fn compute(owner_id: &str, checkins: &[CheckIn]) -> Option<Self> {
        let mine: Vec<&CheckIn> = checkins.iter().filter(|c| c.owner_id == owner_id).collect();
        // Last of the newest timestamps, so later inserts win ties.
        let latest = mine
            .iter()
            .copied()
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp))?;

        let mut tier_distribution = BTreeMap::new();
        let mut tone_distribution = BTreeMap::new();
        for checkin in &mine {
            *tier_distribution.entry(checkin.tier).or_insert(0) += 1;
            *tone_distribution.entry(checkin.tone.clone()).or_insert(0) += 1;
        }

        Some(Self {
            owner_id: owner_id.to_string(),
            total_reflections: mine.len(),
            tier_distribution,
            tone_distribution,
            latest_tier: latest.tier,
            latest_tone: latest.tone.clone(),
            last_checkin: latest.timestamp,
        })
    }

    /// Share of check-ins in `tier`, between 0 and 1.
    pub fn tier_share(&self, tier: Tier) -> f64 {
        let count = self.tier_distribution.get(&tier).copied().unwrap_or(0);
        count as f64 / self.total_reflections as f64
    }
}
