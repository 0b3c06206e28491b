//! Check-in flow for Saini.
//!
//! This crate provides:
//! - Keyword tier classification
//! - Reply generation with a deterministic fallback
//! - Check-in history storage and per-user analytics
//! - Inactivity nudges
//! - The [`CheckInService`] that ties these to semantic memory

pub mod analytics;
pub mod classifier;
pub mod error;
pub mod nudge;
pub mod reply;
pub mod service;
pub mod store;

pub use analytics::UserAnalytics;
pub use classifier::TierClassifier;
pub use error::CheckinError;
pub use nudge::NudgeRunner;
pub use reply::{
    ChatReplyGenerator, ContextTurn, FallbackReplies, Reply, ReplyGenerator, ReplyRequest,
    WithFallback,
};
pub use service::{CheckInOutcome, CheckInService};
pub use store::{CheckinStore, FileCheckinStore, InMemoryCheckinStore};

/// Result type for check-in operations.
pub type Result<T> = std::result::Result<T, CheckinError>;
