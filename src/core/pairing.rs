//! Pairing state machine.
//!
//! Entities are immutable values; every transition takes `&self` and returns
//! a new value or the error that forbids it.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ConflictReason, EngineError, EngineResult};
use crate::models::{
    Interest, InterestResponse, InterestStatus, Match, Message, Proposal, ProposalStatus,
};

pub const MAX_PROPOSAL_MESSAGE_CHARS: usize = 1000;
pub const MAX_CHAT_MESSAGE_CHARS: usize = 2000;

/// Lexicographically ordered pair; the storage key for undirected relations
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn ensure_distinct(a: &str, b: &str, what: &str) -> EngineResult<()> {
    if a == b {
        return Err(EngineError::Validation(format!(
            "{} cannot be addressed to yourself",
            what
        )));
    }
    Ok(())
}

impl Interest {
    pub fn new(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        let sender_id = sender_id.into();
        let receiver_id = receiver_id.into();
        ensure_distinct(&sender_id, &receiver_id, "interest")?;

        Ok(Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            status: InterestStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == InterestStatus::Pending
    }

    /// Receiver's decision; only a pending interest can be answered
    pub fn respond(
        &self,
        actor_id: &str,
        response: InterestResponse,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        if actor_id != self.receiver_id {
            return Err(EngineError::Unauthorized(
                "only the receiver may respond to an interest".into(),
            ));
        }
        if !self.is_pending() {
            return Err(EngineError::Conflict(ConflictReason::AlreadyResponded));
        }
        Ok(self.with_status(response.into(), now))
    }

    /// Sender retracts a pending interest
    pub fn withdraw(&self, actor_id: &str, now: DateTime<Utc>) -> EngineResult<Self> {
        if actor_id != self.sender_id {
            return Err(EngineError::Unauthorized(
                "only the sender may withdraw an interest".into(),
            ));
        }
        if !self.is_pending() {
            return Err(EngineError::Conflict(ConflictReason::AlreadyResponded));
        }
        Ok(self.with_status(InterestStatus::Withdrawn, now))
    }

    fn with_status(&self, status: InterestStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: now,
            ..self.clone()
        }
    }
}

impl Match {
    /// Build a match with the pair in canonical order, whatever the argument order
    pub fn new(user_a: &str, user_b: &str, now: DateTime<Utc>) -> EngineResult<Self> {
        ensure_distinct(user_a, user_b, "match")?;
        let (a, b) = canonical_pair(user_a, user_b);

        Ok(Self {
            id: Uuid::new_v4(),
            user_a_id: a.to_string(),
            user_b_id: b.to_string(),
            created_at: now,
        })
    }
}

impl Proposal {
    pub fn new(
        proposer_id: impl Into<String>,
        recipient_id: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        let proposer_id = proposer_id.into();
        let recipient_id = recipient_id.into();
        let message = message.into();
        ensure_distinct(&proposer_id, &recipient_id, "proposal")?;

        if message.chars().count() > MAX_PROPOSAL_MESSAGE_CHARS {
            return Err(EngineError::Validation(format!(
                "proposal message exceeds {} characters",
                MAX_PROPOSAL_MESSAGE_CHARS
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            proposer_id,
            recipient_id,
            message,
            status: ProposalStatus::Pending,
            created_at: now,
            answered_at: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == ProposalStatus::Pending
    }

    /// Recipient's YES or NO; a proposal is answered at most once
    pub fn answer(
        &self,
        actor_id: &str,
        answer: ProposalStatus,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        if answer == ProposalStatus::Pending {
            return Err(EngineError::Validation(
                "answer must be YES or NO".into(),
            ));
        }
        if actor_id != self.recipient_id {
            return Err(EngineError::Unauthorized(
                "only the recipient may answer a proposal".into(),
            ));
        }
        if !self.is_pending() {
            return Err(EngineError::Conflict(ConflictReason::AlreadyAnswered));
        }

        Ok(Self {
            status: answer,
            answered_at: Some(now),
            ..self.clone()
        })
    }
}

impl Message {
    pub fn new(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        let sender_id = sender_id.into();
        let receiver_id = receiver_id.into();
        let content = content.into();
        ensure_distinct(&sender_id, &receiver_id, "message")?;

        if content.trim().is_empty() {
            return Err(EngineError::Validation("message must not be empty".into()));
        }
        if content.chars().count() > MAX_CHAT_MESSAGE_CHARS {
            return Err(EngineError::Validation(format!(
                "message exceeds {} characters",
                MAX_CHAT_MESSAGE_CHARS
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content,
            created_at: now,
        })
    }
}
