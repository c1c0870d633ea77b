use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::domain::{InterestResponse, ProposalStatus};

/// Request for a page of compatible candidates
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiscoveryRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Receiver's answer to an interest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondToInterestRequest {
    #[serde(alias = "interest_id", rename = "interestId")]
    pub interest_id: Uuid,
    pub action: InterestResponse,
}

/// Request to send a formal proposal
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProposalRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "recipient_id", rename = "recipientId")]
    pub recipient_id: String,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub message: String,
}

/// Recipient's answer to a proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerProposalRequest {
    #[serde(alias = "proposal_id", rename = "proposalId")]
    pub proposal_id: Uuid,
    pub answer: ProposalStatus,
}

/// Request to send a chat message to a matched user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "receiver_id", rename = "receiverId")]
    pub receiver_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}
