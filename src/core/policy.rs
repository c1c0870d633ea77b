use chrono::{DateTime, Duration, Utc};

use crate::core::completion::READY_THRESHOLD;
use crate::error::{ConflictReason, EngineError, EngineResult};
use crate::models::{Actor, Profile, UserRole};
use crate::ports::{InterestStore, MatchStore, MessageStore};

/// Quotas enforced by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyLimits {
    pub interests_per_day: u32,
    pub messages_per_hour: u32,
    pub messages_per_day: u32,
}

impl Default for PolicyLimits {
    fn default() -> Self {
        Self {
            interests_per_day: 5,
            messages_per_hour: 50,
            messages_per_day: 500,
        }
    }
}

/// Cross-cutting checks shared by the interest, proposal and message flows
///
/// Quotas are counted from stored timestamps on every call, so they hold
/// across restarts and between instances.
#[derive(Debug, Clone, Default)]
pub struct PolicyGuard {
    limits: PolicyLimits,
}

impl PolicyGuard {
    pub fn new(limits: PolicyLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> PolicyLimits {
        self.limits
    }

    /// Guardians manage a profile but never start contact
    pub fn ensure_can_initiate(&self, actor: &Actor) -> EngineResult<()> {
        if actor.role == UserRole::Guardian {
            return Err(EngineError::Forbidden(
                "guardian accounts cannot initiate contact".into(),
            ));
        }
        Ok(())
    }

    pub fn ensure_ready(&self, profile: &Profile) -> EngineResult<()> {
        let completion = profile.completion_percentage();
        if completion < READY_THRESHOLD {
            return Err(EngineError::ProfileIncomplete {
                completion,
                required: READY_THRESHOLD,
            });
        }
        Ok(())
    }

    /// At most one match and one interest per unordered pair
    pub async fn ensure_not_paired(
        &self,
        matches: &dyn MatchStore,
        interests: &dyn InterestStore,
        a: &str,
        b: &str,
    ) -> EngineResult<()> {
        if matches.find_by_user_pair(a, b).await?.is_some() {
            return Err(EngineError::Conflict(ConflictReason::AlreadyMatched));
        }
        if interests.find_by_user_pair(a, b).await?.is_some() {
            return Err(EngineError::Conflict(ConflictReason::DuplicateInterest));
        }
        Ok(())
    }

    pub async fn ensure_interest_quota(
        &self,
        interests: &dyn InterestStore,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let sent_today = interests
            .count_created_since(user_id, start_of_day(now))
            .await?;

        if sent_today >= self.limits.interests_per_day {
            tracing::info!("Interest quota reached for {} ({} today)", user_id, sent_today);
            return Err(EngineError::RateLimited {
                action: "interests",
                limit: self.limits.interests_per_day,
                window: "day",
            });
        }
        Ok(())
    }

    pub async fn ensure_message_quota(
        &self,
        messages: &dyn MessageStore,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let last_hour = messages
            .count_sent_since(user_id, now - Duration::hours(1))
            .await?;
        if last_hour >= self.limits.messages_per_hour {
            return Err(EngineError::RateLimited {
                action: "messages",
                limit: self.limits.messages_per_hour,
                window: "hour",
            });
        }

        let today = messages.count_sent_since(user_id, start_of_day(now)).await?;
        if today >= self.limits.messages_per_day {
            return Err(EngineError::RateLimited {
                action: "messages",
                limit: self.limits.messages_per_day,
                window: "day",
            });
        }
        Ok(())
    }
}

/// Midnight UTC of the calendar day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}
