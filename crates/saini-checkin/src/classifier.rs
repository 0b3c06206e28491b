//! Keyword tier classifier.

use aho_corasick::{AhoCorasick, MatchKind};
use saini_core::Tier;

/// Default keywords per tier. Matching is substring based and case-insensitive.
const DEFAULT_KEYWORDS: &[(Tier, &[&str])] = &[
    (Tier::Critical, &["panic", "can't", "cant", "hurt", "suicidal"]),
    (Tier::AtRisk, &["missed", "late", "tired", "stressed"]),
    (Tier::Stirred, &["okay", "fine", "meh"]),
];

/// Assigns a [`Tier`] to a message. The most severe matching tier wins;
/// messages with no keyword are [`Tier::Stable`].
pub struct TierClassifier {
    matcher: AhoCorasick,
    tiers: Vec<Tier>,
}

impl TierClassifier {
    /// Build a classifier from `(tier, keywords)` groups.
    pub fn new(groups: &[(Tier, &[&str])]) -> Result<Self, aho_corasick::BuildError> {
        let mut patterns = Vec::new();
        let mut tiers = Vec::new();
        for (tier, keywords) in groups {
            for keyword in keywords.iter() {
                patterns.push(*keyword);
                tiers.push(*tier);
            }
        }

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&patterns)?;

        Ok(Self { matcher, tiers })
    }

    /// Classify a message.
    pub fn classify(&self, message: &str) -> Tier {
        self.matcher
            .find_overlapping_iter(message)
            .map(|m| self.tiers[m.pattern().as_usize()])
            .max()
            .unwrap_or(Tier::Stable)
    }
}

impl Default for TierClassifier {
    fn default() -> Self {
        match Self::new(DEFAULT_KEYWORDS) {
            Ok(classifier) => classifier,
            Err(e) => unreachable!("default keywords failed to compile: {e}"),
        }
    }
}
