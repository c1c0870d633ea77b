// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Actor, AccountStatus, AuditAction, AuditEntry, Candidate, Interest, InterestResponse,
    InterestStatus, Match, Message, Notification, NotificationKind, PartnerPreferences, Profile,
    ProfileCriteria, ProfileDetails, Proposal, ProposalStatus, User, UserRole, Visibility,
};
pub use requests::{
    AnswerProposalRequest, CreateProposalRequest, DiscoveryRequest, RespondToInterestRequest,
    SendMessageRequest,
};
pub use responses::{
    AnswerOutcome, CompletionReport, DiscoveryResponse, MessageOutcome, ProposalOutcome,
    RespondOutcome, ScoredCandidate, SendInterestOutcome,
};
