//! Inactivity nudges.

use crate::reply::{FallbackReplies, ReplyGenerator, ReplyRequest};
use crate::store::CheckinStore;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use saini_core::{CheckIn, Tier};
use std::sync::Arc;
use tracing::{info, warn};

/// Message recorded for an automatic nudge.
pub const NUDGE_MESSAGE: &str = "[AUTO] Daily nudge";

/// Sends a gentle check-in to users who have gone quiet.
pub struct NudgeRunner {
    store: Arc<dyn CheckinStore>,
    generator: Arc<dyn ReplyGenerator>,
    inactive_days: u32,
}

impl NudgeRunner {
    pub fn new(
        store: Arc<dyn CheckinStore>,
        generator: Arc<dyn ReplyGenerator>,
        inactive_days: u32,
    ) -> Self {
        Self {
            store,
            generator,
            inactive_days,
        }
    }

    /// Nudge every user whose latest check-in is older than the threshold.
    ///
    /// A nudge is itself a check-in, so a nudged user is not nudged again
    /// until another full threshold passes. Returns the nudged users.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let cutoff = now - Duration::days(i64::from(self.inactive_days));
        let mut nudged = Vec::new();

        for user in self.store.users().await? {
            let history = self.store.list(Some(&user)).await?;
            let Some(latest) = history.first() else {
                continue;
            };
            if latest.timestamp >= cutoff {
                continue;
            }

            let request = ReplyRequest::new(&user, NUDGE_MESSAGE, Tier::Auto);
            let reply = match self.generator.generate(&request).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(user = %user, error = %e, "Nudge generation failed, using fallback");
                    FallbackReplies::reply(Tier::Auto)
                }
            };

            let checkin = CheckIn::new(&user, NUDGE_MESSAGE, Tier::Auto, reply.text)
                .with_tone(reply.tone)
                .with_source(reply.source)
                .at(now)
                .auto();
            self.store.put(checkin).await?;
            nudged.push(user);
        }

        info!(count = nudged.len(), users = ?nudged, "Sent inactivity nudges");
        Ok(nudged)
    }
}
