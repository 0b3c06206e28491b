//! CLI command implementations.

pub mod checkin;
pub mod config;
pub mod doctor;
pub mod history;
pub mod memory;
pub mod nudge;

use console::style;
use saini_core::Tier;

/// Tier label colored by severity.
pub(crate) fn styled_tier(tier: Tier) -> console::StyledObject<&'static str> {
    let label = tier.as_str();
    match tier {
        Tier::Critical => style(label).red().bold(),
        Tier::AtRisk => style(label).yellow(),
        Tier::Stirred => style(label).cyan(),
        Tier::Stable => style(label).green(),
        Tier::Auto => style(label).dim(),
    }
}
