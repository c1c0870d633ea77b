//! In-memory implementation of every store contract.
//!
//! Enforces the same uniqueness rules as the PostgreSQL schema: one interest
//! and one match per unordered pair, checked and written under a single lock.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::canonical_pair;
use crate::error::StoreError;
use crate::models::{
    AccountStatus, AuditEntry, Candidate, Interest, Match, Message, Profile, ProfileCriteria,
    Proposal, User,
};
use crate::ports::{
    AuditSink, BlockStore, InterestStore, MatchStore, MessageStore, ProfileStore, ProposalStore,
    StoreResult, UserStore,
};

type PairKey = (String, String);

fn pair_key(a: &str, b: &str) -> PairKey {
    let (a, b) = canonical_pair(a, b);
    (a.to_string(), b.to_string())
}

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    profiles: RwLock<BTreeMap<String, Profile>>,
    interests: RwLock<HashMap<Uuid, Interest>>,
    matches: RwLock<HashMap<PairKey, Match>>,
    proposals: RwLock<HashMap<Uuid, Proposal>>,
    blocks: RwLock<HashSet<(String, String)>>,
    messages: RwLock<Vec<Message>>,
    audit: RwLock<Vec<AuditEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id().to_string(), user);
    }

    /// Record that `blocker` blocked `blocked`
    pub async fn block(&self, blocker: &str, blocked: &str) {
        self.blocks
            .write()
            .await
            .insert((blocker.to_string(), blocked.to_string()));
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.read().await.clone()
    }

    pub async fn match_count(&self) -> usize {
        self.matches.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn find_filtered(&self, criteria: &ProfileCriteria) -> StoreResult<(Vec<Candidate>, usize)> {
        let profiles = self.profiles.read().await;
        let users = self.users.read().await;

        let matching: Vec<Candidate> = profiles
            .values()
            .filter(|p| !criteria.exclude_user_ids.iter().any(|id| id == p.user_id()))
            .filter(|p| !criteria.public_only || p.visibility() == crate::models::Visibility::Public)
            .map(|p| Candidate {
                profile: p.clone(),
                account_status: users
                    .get(p.user_id())
                    .map(|u| u.status())
                    .unwrap_or(AccountStatus::Active),
            })
            .filter(|c| !criteria.exclude_engaged || c.account_status != AccountStatus::Engaged)
            .collect();

        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(criteria.offset)
            .take(criteria.limit)
            .collect();

        Ok((page, total))
    }

    async fn save(&self, profile: &Profile) -> StoreResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id().to_string(), profile.clone());
        Ok(())
    }
}

#[async_trait]
impl InterestStore for InMemoryStore {
    async fn save(&self, interest: &Interest) -> StoreResult<()> {
        let mut interests = self.interests.write().await;
        let key = pair_key(interest.sender_id(), interest.receiver_id());
        let duplicate = interests
            .values()
            .any(|i| pair_key(i.sender_id(), i.receiver_id()) == key);
        if duplicate {
            return Err(StoreError::UniqueViolation("interests_pair_key".into()));
        }
        interests.insert(interest.id(), interest.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Interest>> {
        Ok(self.interests.read().await.get(&id).cloned())
    }

    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Option<Interest>> {
        let key = pair_key(a, b);
        Ok(self
            .interests
            .read()
            .await
            .values()
            .find(|i| pair_key(i.sender_id(), i.receiver_id()) == key)
            .cloned())
    }

    async fn update_status(&self, interest: &Interest) -> StoreResult<bool> {
        let mut interests = self.interests.write().await;
        match interests.get_mut(&interest.id()) {
            Some(stored) if stored.is_pending() => {
                *stored = interest.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn accept(&self, interest: &Interest, candidate: &Match) -> StoreResult<Option<Match>> {
        let mut interests = self.interests.write().await;
        let mut matches = self.matches.write().await;

        match interests.get_mut(&interest.id()) {
            Some(stored) if stored.is_pending() => {
                let key = pair_key(candidate.user_a_id(), candidate.user_b_id());
                let kept = matches.entry(key).or_insert_with(|| candidate.clone()).clone();
                *stored = interest.clone();
                Ok(Some(kept))
            }
            _ => Ok(None),
        }
    }

    async fn engage(&self, interest: &Interest) -> StoreResult<bool> {
        let mut interests = self.interests.write().await;
        let mut users = self.users.write().await;

        let Some(stored) = interests.get_mut(&interest.id()) else {
            return Ok(false);
        };
        if !stored.is_pending() {
            return Ok(false);
        }

        let pair = [interest.sender_id(), interest.receiver_id()];
        if let Some(missing) = pair.iter().find(|id| !users.contains_key(**id)) {
            return Err(StoreError::NotFound(format!("user {}", missing)));
        }
        for id in pair {
            if let Some(user) = users.get_mut(id) {
                *user = user.with_status(AccountStatus::Engaged);
            }
        }
        *stored = interest.clone();
        Ok(true)
    }

    async fn count_created_since(&self, sender_id: &str, since: DateTime<Utc>) -> StoreResult<u32> {
        Ok(self
            .interests
            .read()
            .await
            .values()
            .filter(|i| i.sender_id() == sender_id && i.created_at() >= since)
            .count() as u32)
    }

    async fn find_sent_by(&self, user_id: &str) -> StoreResult<Vec<Interest>> {
        let mut sent: Vec<Interest> = self
            .interests
            .read()
            .await
            .values()
            .filter(|i| i.sender_id() == user_id)
            .cloned()
            .collect();
        sent.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(sent)
    }

    async fn find_received_by(&self, user_id: &str) -> StoreResult<Vec<Interest>> {
        let mut received: Vec<Interest> = self
            .interests
            .read()
            .await
            .values()
            .filter(|i| i.receiver_id() == user_id)
            .cloned()
            .collect();
        received.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(received)
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn save(&self, candidate: &Match) -> StoreResult<Match> {
        let mut matches = self.matches.write().await;
        let key = pair_key(candidate.user_a_id(), candidate.user_b_id());
        let stored = matches.entry(key).or_insert_with(|| candidate.clone());
        Ok(stored.clone())
    }

    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Option<Match>> {
        Ok(self.matches.read().await.get(&pair_key(a, b)).cloned())
    }

    async fn find_all_for_user(&self, user_id: &str) -> StoreResult<Vec<Match>> {
        let mut found: Vec<Match> = self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.other_user(user_id).is_some())
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(found)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut matches = self.matches.write().await;
        let before = matches.len();
        matches.retain(|_, m| m.id() != id);
        Ok(matches.len() < before)
    }
}

#[async_trait]
impl ProposalStore for InMemoryStore {
    async fn save(&self, proposal: &Proposal) -> StoreResult<()> {
        let mut proposals = self.proposals.write().await;
        if proposal.is_pending() {
            let key = pair_key(proposal.proposer_id(), proposal.recipient_id());
            let open = proposals
                .values()
                .any(|p| p.is_pending() && pair_key(p.proposer_id(), p.recipient_id()) == key);
            if open {
                return Err(StoreError::UniqueViolation("proposals_pending_pair_key".into()));
            }
        }
        proposals.insert(proposal.id(), proposal.clone());
        Ok(())
    }

    async fn update(&self, proposal: &Proposal) -> StoreResult<bool> {
        let mut proposals = self.proposals.write().await;
        match proposals.get_mut(&proposal.id()) {
            Some(stored) if stored.is_pending() => {
                *stored = proposal.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Proposal>> {
        Ok(self.proposals.read().await.get(&id).cloned())
    }

    async fn find_latest(&self, user_id: &str) -> StoreResult<Option<Proposal>> {
        Ok(self
            .proposals
            .read()
            .await
            .values()
            .filter(|p| p.proposer_id() == user_id || p.recipient_id() == user_id)
            .max_by_key(|p| p.created_at())
            .cloned())
    }

    async fn find_by_proposer_id(&self, user_id: &str) -> StoreResult<Vec<Proposal>> {
        Ok(newest_first(self.proposals.read().await.values().filter(|p| p.proposer_id() == user_id)))
    }

    async fn find_by_recipient_id(&self, user_id: &str) -> StoreResult<Vec<Proposal>> {
        Ok(newest_first(self.proposals.read().await.values().filter(|p| p.recipient_id() == user_id)))
    }

    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Vec<Proposal>> {
        let key = pair_key(a, b);
        Ok(newest_first(
            self.proposals
                .read()
                .await
                .values()
                .filter(|p| pair_key(p.proposer_id(), p.recipient_id()) == key),
        ))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.proposals.write().await.remove(&id).is_some())
    }
}

fn newest_first<'a>(proposals: impl Iterator<Item = &'a Proposal>) -> Vec<Proposal> {
    let mut found: Vec<Proposal> = proposals.cloned().collect();
    found.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    found
}

#[async_trait]
impl BlockStore for InMemoryStore {
    async fn blocked_by_user(&self, user_id: &str) -> StoreResult<HashSet<String>> {
        Ok(self
            .blocks
            .read()
            .await
            .iter()
            .filter(|(blocker, _)| blocker == user_id)
            .map(|(_, blocked)| blocked.clone())
            .collect())
    }

    async fn who_blocked_user(&self, user_id: &str) -> StoreResult<HashSet<String>> {
        Ok(self
            .blocks
            .read()
            .await
            .iter()
            .filter(|(_, blocked)| blocked == user_id)
            .map(|(blocker, _)| blocker.clone())
            .collect())
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn save(&self, message: &Message) -> StoreResult<()> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn count_sent_since(&self, sender_id: &str, since: DateTime<Utc>) -> StoreResult<u32> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.sender_id() == sender_id && m.created_at() >= since)
            .count() as u32)
    }

    async fn find_conversation(&self, a: &str, b: &str) -> StoreResult<Vec<Message>> {
        let key = pair_key(a, b);
        let mut found: Vec<Message> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| pair_key(m.sender_id(), m.receiver_id()) == key)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at());
        Ok(found)
    }
}

#[async_trait]
impl AuditSink for InMemoryStore {
    async fn record(&self, entry: &AuditEntry) -> StoreResult<()> {
        self.audit.write().await.push(entry.clone());
        Ok(())
    }
}
