use serde::Serialize;

use crate::core::completion::CompletionTip;
use crate::models::domain::{Interest, Match, Message, Proposal};

/// Candidate that passed filtering and the score threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub user_id: String,
    pub age: u32,
    pub location: String,
    pub religion: Option<String>,
    pub completion: u8,
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Page of discovery results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    pub matches: Vec<ScoredCandidate>,
    /// Profiles passing the store-side filters (visibility, engagement,
    /// blocks), before scoring and independent of the pool size
    pub total_candidates: usize,
}

/// Completion percentage with readiness and nudges for missing fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub percentage: u8,
    pub ready_for_interactions: bool,
    pub tips: Vec<CompletionTip>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInterestOutcome {
    pub interest: Interest,
    pub delivered: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondOutcome {
    pub interest: Interest,
    #[serde(rename = "match")]
    pub matched: Option<Match>,
    pub delivered: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalOutcome {
    pub proposal: Proposal,
    pub delivered: bool,
}

/// Result of answering a proposal; email is best-effort
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub proposal: Proposal,
    pub delivered: bool,
    pub email_sent: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageOutcome {
    pub message: Message,
    pub delivered: bool,
}
