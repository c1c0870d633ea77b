use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ConflictReason, EngineError, EngineResult, StoreError};
use crate::models::{
    Actor, AnswerOutcome, AnswerProposalRequest, AuditAction, CreateProposalRequest, Notification,
    NotificationKind, Proposal, ProposalOutcome, ProposalStatus,
};
use crate::services::Engine;

impl Engine {
    pub async fn create_proposal(
        &self,
        actor: &Actor,
        request: &CreateProposalRequest,
    ) -> EngineResult<ProposalOutcome> {
        request.validate()?;
        let proposal = Proposal::new(
            actor.user_id.as_str(),
            request.recipient_id.as_str(),
            request.message.as_str(),
            Utc::now(),
        )?;

        if self
            .stores
            .profiles
            .find_by_user_id(&actor.user_id)
            .await?
            .is_none()
        {
            return Err(EngineError::ProfileRequired);
        }

        if self.stores.users.find_by_id(&request.recipient_id).await?.is_none() {
            return Err(EngineError::not_found("User", &request.recipient_id));
        }

        let open = self
            .stores
            .proposals
            .find_by_user_pair(&actor.user_id, &request.recipient_id)
            .await?;
        if open.iter().any(|p| p.is_pending()) {
            return Err(EngineError::Conflict(ConflictReason::ProposalPending));
        }

        match self.stores.proposals.save(&proposal).await {
            Ok(()) => {}
            // A concurrent request opened one for the same pair
            Err(StoreError::UniqueViolation(_)) => {
                return Err(EngineError::Conflict(ConflictReason::ProposalPending));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(
            "Proposal {} sent: {} -> {}",
            proposal.id(),
            proposal.proposer_id(),
            proposal.recipient_id()
        );

        let delivered = self
            .notifier
            .dispatch(
                Notification::new(
                    proposal.recipient_id(),
                    NotificationKind::ProposalReceived,
                    "New proposal",
                    "You have received a marriage proposal",
                )
                .with_link(format!("/proposals/{}", proposal.id())),
            )
            .await;

        self.audit
            .record(
                &actor.user_id,
                AuditAction::ProposalSent,
                Some(format!("proposal:{}", proposal.id())),
                Some(serde_json::json!({ "recipientId": proposal.recipient_id() })),
            )
            .await;

        Ok(ProposalOutcome {
            proposal,
            delivered,
        })
    }

    /// Recipient answers YES or NO; a YES also emails the proposer when an
    /// email sender is configured
    pub async fn answer_proposal(
        &self,
        actor: &Actor,
        request: &AnswerProposalRequest,
    ) -> EngineResult<AnswerOutcome> {
        let proposal = self.find_proposal(request.proposal_id).await?;
        let answered = proposal.answer(&actor.user_id, request.answer, Utc::now())?;

        if !self.stores.proposals.update(&answered).await? {
            return Err(EngineError::Conflict(ConflictReason::AlreadyAnswered));
        }

        let proposer_id = answered.proposer_id();
        let recipient_id = answered.recipient_id();

        let (delivered, email_sent, action) = if answered.status() == ProposalStatus::Yes {
            let to_proposer = self
                .notifier
                .dispatch(
                    Notification::new(
                        proposer_id,
                        NotificationKind::ProposalAccepted,
                        "Proposal accepted",
                        "Your proposal has been accepted!",
                    )
                    .with_link(format!("/proposals/{}", answered.id())),
                )
                .await;
            let to_recipient = self
                .notifier
                .dispatch(Notification::new(
                    recipient_id,
                    NotificationKind::ProposalConfirmed,
                    "Proposal confirmed",
                    "You have accepted the proposal",
                ))
                .await;
            let email_sent = self.email_proposal_accepted(proposer_id, recipient_id).await;

            (to_proposer && to_recipient, email_sent, AuditAction::ProposalAccepted)
        } else {
            let delivered = self
                .notifier
                .dispatch(Notification::new(
                    proposer_id,
                    NotificationKind::ProposalDeclined,
                    "Proposal declined",
                    "Your proposal was declined",
                ))
                .await;
            (delivered, false, AuditAction::ProposalDeclined)
        };

        self.audit
            .record(
                recipient_id,
                action,
                Some(format!("proposal:{}", answered.id())),
                Some(serde_json::json!({ "emailSent": email_sent })),
            )
            .await;

        Ok(AnswerOutcome {
            proposal: answered,
            delivered,
            email_sent,
        })
    }

    /// Proposer retracts an unanswered proposal
    pub async fn withdraw_proposal(&self, actor: &Actor, proposal_id: Uuid) -> EngineResult<()> {
        let proposal = self.find_proposal(proposal_id).await?;
        if proposal.proposer_id() != actor.user_id {
            return Err(EngineError::Unauthorized(
                "only the proposer may withdraw a proposal".into(),
            ));
        }
        if !proposal.is_pending() {
            return Err(EngineError::Conflict(ConflictReason::AlreadyAnswered));
        }

        if !self.stores.proposals.delete(proposal_id).await? {
            return Err(EngineError::not_found("Proposal", proposal_id));
        }

        self.audit
            .record(
                &actor.user_id,
                AuditAction::ProposalWithdrawn,
                Some(format!("proposal:{}", proposal_id)),
                None,
            )
            .await;
        Ok(())
    }

    pub async fn get_proposal(&self, actor: &Actor, proposal_id: Uuid) -> EngineResult<Proposal> {
        let proposal = self.find_proposal(proposal_id).await?;
        if proposal.proposer_id() != actor.user_id && proposal.recipient_id() != actor.user_id {
            return Err(EngineError::Unauthorized(
                "proposal belongs to other users".into(),
            ));
        }
        Ok(proposal)
    }

    pub async fn latest_proposal(&self, user_id: &str) -> EngineResult<Option<Proposal>> {
        Ok(self.stores.proposals.find_latest(user_id).await?)
    }

    pub async fn sent_proposals(&self, user_id: &str) -> EngineResult<Vec<Proposal>> {
        Ok(self.stores.proposals.find_by_proposer_id(user_id).await?)
    }

    pub async fn received_proposals(&self, user_id: &str) -> EngineResult<Vec<Proposal>> {
        Ok(self.stores.proposals.find_by_recipient_id(user_id).await?)
    }

    pub async fn proposals_between(&self, a: &str, b: &str) -> EngineResult<Vec<Proposal>> {
        Ok(self.stores.proposals.find_by_user_pair(a, b).await?)
    }

    async fn find_proposal(&self, proposal_id: Uuid) -> EngineResult<Proposal> {
        self.stores
            .proposals
            .find_by_id(proposal_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Proposal", proposal_id))
    }

    /// Best-effort; any failure is logged and reported as `false`
    async fn email_proposal_accepted(&self, proposer_id: &str, recipient_id: &str) -> bool {
        let Some(email) = &self.email else {
            return false;
        };

        let users = match (
            self.stores.users.find_by_id(proposer_id).await,
            self.stores.users.find_by_id(recipient_id).await,
        ) {
            (Ok(Some(proposer)), Ok(Some(recipient))) => (proposer, recipient),
            _ => {
                tracing::warn!("Skipping proposal email: users {} / {} unavailable", proposer_id, recipient_id);
                return false;
            }
        };
        let (proposer, recipient) = users;

        match email
            .send_proposal_accepted(proposer.email(), proposer.name(), recipient.name())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to email {} about accepted proposal: {}", proposer_id, e);
                false
            }
        }
    }
}
