use chrono::Utc;
use uuid::Uuid;

use crate::error::{ConflictReason, EngineError, EngineResult, StoreError};
use crate::models::{
    Actor, AuditAction, Interest, InterestResponse, Match, Notification,
    NotificationKind, RespondOutcome, RespondToInterestRequest, SendInterestOutcome,
};
use crate::services::Engine;

impl Engine {
    /// Send an interest from the actor to `receiver_id`
    ///
    /// Checks run in a fixed order: guardian role, self-addressing, profile
    /// readiness, receiver existence, existing match or interest, daily quota.
    pub async fn send_interest(
        &self,
        actor: &Actor,
        receiver_id: &str,
    ) -> EngineResult<SendInterestOutcome> {
        self.policy.ensure_can_initiate(actor)?;

        let sender_id = actor.user_id.as_str();
        if sender_id == receiver_id {
            return Err(EngineError::Validation(
                "cannot send an interest to yourself".into(),
            ));
        }

        let sender_profile = self
            .stores
            .profiles
            .find_by_user_id(sender_id)
            .await?
            .ok_or(EngineError::ProfileRequired)?;
        self.policy.ensure_ready(&sender_profile)?;

        if self.stores.users.find_by_id(receiver_id).await?.is_none() {
            return Err(EngineError::not_found("User", receiver_id));
        }

        self.policy
            .ensure_not_paired(
                self.stores.matches.as_ref(),
                self.stores.interests.as_ref(),
                sender_id,
                receiver_id,
            )
            .await?;

        let now = Utc::now();
        self.policy
            .ensure_interest_quota(self.stores.interests.as_ref(), sender_id, now)
            .await?;

        let interest = Interest::new(sender_id, receiver_id, now)?;
        match self.stores.interests.save(&interest).await {
            Ok(()) => {}
            // Lost a race against a concurrent send for the same pair
            Err(StoreError::UniqueViolation(_)) => {
                return Err(EngineError::Conflict(ConflictReason::DuplicateInterest));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Interest {} sent: {} -> {}", interest.id(), sender_id, receiver_id);

        let delivered = self
            .notifier
            .dispatch(
                Notification::new(
                    receiver_id,
                    NotificationKind::InterestReceived,
                    "New interest",
                    "Someone has expressed interest in your profile",
                )
                .with_link(format!("/interests/{}", interest.id())),
            )
            .await;

        self.audit
            .record(
                sender_id,
                AuditAction::InterestSent,
                Some(format!("interest:{}", interest.id())),
                Some(serde_json::json!({ "receiverId": receiver_id })),
            )
            .await;

        Ok(SendInterestOutcome {
            interest,
            delivered,
        })
    }

    /// Receiver accepts, declines or marks the interest as engaged
    pub async fn respond_to_interest(
        &self,
        actor: &Actor,
        request: &RespondToInterestRequest,
    ) -> EngineResult<RespondOutcome> {
        let interest = self.find_interest(request.interest_id).await?;
        let now = Utc::now();
        let updated = interest.respond(&actor.user_id, request.action, now)?;

        let sender_id = updated.sender_id();
        let receiver_id = updated.receiver_id();

        // The status change and its consequences are written as one unit
        let (matched, notification, action) = match request.action {
            InterestResponse::Accepted => {
                let stored = self
                    .stores
                    .interests
                    .accept(&updated, &Match::new(sender_id, receiver_id, now)?)
                    .await?
                    .ok_or(EngineError::Conflict(ConflictReason::AlreadyResponded))?;
                tracing::info!("Match {} between {} and {}", stored.id(), sender_id, receiver_id);
                (
                    Some(stored),
                    Notification::new(
                        sender_id,
                        NotificationKind::InterestAccepted,
                        "Interest accepted",
                        "Your interest was accepted. You can now message each other.",
                    )
                    .with_link(format!("/messages/{}", receiver_id)),
                    AuditAction::InterestAccepted,
                )
            }
            InterestResponse::Rejected => {
                if !self.stores.interests.update_status(&updated).await? {
                    return Err(EngineError::Conflict(ConflictReason::AlreadyResponded));
                }
                (
                    None,
                    Notification::new(
                        sender_id,
                        NotificationKind::InterestDeclined,
                        "Interest declined",
                        "Your interest was declined.",
                    ),
                    AuditAction::InterestRejected,
                )
            }
            InterestResponse::Engaged => {
                if !self.stores.interests.engage(&updated).await? {
                    return Err(EngineError::Conflict(ConflictReason::AlreadyResponded));
                }
                tracing::info!("{} and {} are now engaged", sender_id, receiver_id);
                (
                    None,
                    Notification::new(
                        sender_id,
                        NotificationKind::Engaged,
                        "Congratulations!",
                        "You are now engaged.",
                    ),
                    AuditAction::InterestEngaged,
                )
            }
        };

        let delivered = self.notifier.dispatch(notification).await;

        self.audit
            .record(
                receiver_id,
                action,
                Some(format!("interest:{}", updated.id())),
                Some(serde_json::json!({ "senderId": sender_id })),
            )
            .await;

        Ok(RespondOutcome {
            interest: updated,
            matched,
            delivered,
        })
    }

    /// Sender retracts a pending interest
    pub async fn withdraw_interest(&self, actor: &Actor, interest_id: Uuid) -> EngineResult<Interest> {
        let interest = self.find_interest(interest_id).await?;
        let withdrawn = interest.withdraw(&actor.user_id, Utc::now())?;

        if !self.stores.interests.update_status(&withdrawn).await? {
            return Err(EngineError::Conflict(ConflictReason::AlreadyResponded));
        }

        self.audit
            .record(
                &actor.user_id,
                AuditAction::InterestWithdrawn,
                Some(format!("interest:{}", interest_id)),
                None,
            )
            .await;

        Ok(withdrawn)
    }

    /// Fetch an interest visible to the actor (sender or receiver only)
    pub async fn get_interest(&self, actor: &Actor, interest_id: Uuid) -> EngineResult<Interest> {
        let interest = self.find_interest(interest_id).await?;
        if !interest.involves(&actor.user_id) {
            return Err(EngineError::Unauthorized(
                "interest belongs to other users".into(),
            ));
        }
        Ok(interest)
    }

    pub async fn sent_interests(&self, user_id: &str) -> EngineResult<Vec<Interest>> {
        Ok(self.stores.interests.find_sent_by(user_id).await?)
    }

    pub async fn received_interests(&self, user_id: &str) -> EngineResult<Vec<Interest>> {
        Ok(self.stores.interests.find_received_by(user_id).await?)
    }

    pub async fn matches_for(&self, user_id: &str) -> EngineResult<Vec<Match>> {
        Ok(self.stores.matches.find_all_for_user(user_id).await?)
    }

    async fn find_interest(&self, interest_id: Uuid) -> EngineResult<Interest> {
        self.stores
            .interests
            .find_by_id(interest_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Interest", interest_id))
    }
}
