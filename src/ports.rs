//! Contracts between the engine and its collaborators.
//!
//! Stores own all mutable shared state. Uniqueness of interests and matches
//! per unordered pair is enforced here, not by the callers' pre-checks.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AuditEntry, Candidate, Interest, Match, Message, Notification, Profile,
    ProfileCriteria, Proposal, User,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<Profile>>;

    /// Candidate page plus the total number of rows matching the criteria
    async fn find_filtered(&self, criteria: &ProfileCriteria) -> StoreResult<(Vec<Candidate>, usize)>;

    /// Insert or replace the profile for its user
    async fn save(&self, profile: &Profile) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait InterestStore: Send + Sync {
    /// Insert a new interest. Fails with `StoreError::UniqueViolation` when
    /// an interest already exists for the pair in either direction.
    async fn save(&self, interest: &Interest) -> StoreResult<()>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Interest>>;

    /// Interest between the two users in either direction
    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Option<Interest>>;

    /// Persist a transition out of PENDING. Returns false when the stored
    /// interest is missing or no longer pending, so concurrent responses
    /// cannot both succeed.
    async fn update_status(&self, interest: &Interest) -> StoreResult<bool>;

    /// Persist an accepted interest together with its match, all or nothing.
    /// Returns the stored match, or `None` without writing anything when the
    /// interest is no longer pending.
    async fn accept(&self, interest: &Interest, candidate: &Match) -> StoreResult<Option<Match>>;

    /// Persist an engaged interest and mark both users ENGAGED, all or
    /// nothing. False when the interest is no longer pending.
    async fn engage(&self, interest: &Interest) -> StoreResult<bool>;

    async fn count_created_since(&self, sender_id: &str, since: DateTime<Utc>) -> StoreResult<u32>;

    async fn find_sent_by(&self, user_id: &str) -> StoreResult<Vec<Interest>>;

    async fn find_received_by(&self, user_id: &str) -> StoreResult<Vec<Interest>>;
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Idempotent upsert on the canonical pair; returns the stored match,
    /// which is the pre-existing one if another request created it first.
    async fn save(&self, candidate: &Match) -> StoreResult<Match>;

    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Option<Match>>;

    async fn find_all_for_user(&self, user_id: &str) -> StoreResult<Vec<Match>>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Insert a new proposal. Fails with `StoreError::UniqueViolation` when a
    /// pending proposal already exists for the pair in either direction.
    async fn save(&self, proposal: &Proposal) -> StoreResult<()>;

    /// Persist an answer; false when the stored proposal is no longer pending
    async fn update(&self, proposal: &Proposal) -> StoreResult<bool>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Proposal>>;

    /// Most recent proposal the user sent or received
    async fn find_latest(&self, user_id: &str) -> StoreResult<Option<Proposal>>;

    async fn find_by_proposer_id(&self, user_id: &str) -> StoreResult<Vec<Proposal>>;

    async fn find_by_recipient_id(&self, user_id: &str) -> StoreResult<Vec<Proposal>>;

    /// Proposals between the two users in either direction, newest first
    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Vec<Proposal>>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn blocked_by_user(&self, user_id: &str) -> StoreResult<HashSet<String>>;

    async fn who_blocked_user(&self, user_id: &str) -> StoreResult<HashSet<String>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn save(&self, message: &Message) -> StoreResult<()>;

    async fn count_sent_since(&self, sender_id: &str, since: DateTime<Utc>) -> StoreResult<u32>;

    /// Messages exchanged between the two users, oldest first
    async fn find_conversation(&self, a: &str, b: &str) -> StoreResult<Vec<Message>>;
}

/// Durable append-only audit log
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> StoreResult<()>;
}

/// Delivery of user-facing notifications; transport is the sink's concern
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, notification: &Notification) -> StoreResult<()>;
}
