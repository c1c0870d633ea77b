use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{EngineError, EngineResult};

/// Who may see a profile in discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

/// Role of the account acting on the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Member,
    /// Manages a profile on someone's behalf; may never initiate contact.
    Guardian,
    Admin,
}

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Engaged,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
    Engaged,
}

/// Receiver's answer to an interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestResponse {
    Accepted,
    #[serde(alias = "DECLINED")]
    Rejected,
    Engaged,
}

impl From<InterestResponse> for InterestStatus {
    fn from(value: InterestResponse) -> Self {
        match value {
            InterestResponse::Accepted => InterestStatus::Accepted,
            InterestResponse::Rejected => InterestStatus::Rejected,
            InterestResponse::Engaged => InterestStatus::Engaged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Pending,
    Yes,
    No,
}

/// Text encoding of the enums above as stored in the database
macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!("unknown {} value: {}", stringify!($ty), other)),
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(Visibility { Public => "PUBLIC", Private => "PRIVATE", Protected => "PROTECTED" });
text_enum!(UserRole { Member => "MEMBER", Guardian => "GUARDIAN", Admin => "ADMIN" });
text_enum!(AccountStatus { Active => "ACTIVE", Engaged => "ENGAGED", Suspended => "SUSPENDED" });
text_enum!(InterestStatus {
    Pending => "PENDING",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
    Withdrawn => "WITHDRAWN",
    Engaged => "ENGAGED",
});
text_enum!(ProposalStatus { Pending => "PENDING", Yes => "YES", No => "NO" });

/// Partner preference fields; six of them count towards completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPreferences {
    #[validate(range(min = 18, max = 99))]
    pub min_age: Option<u8>,
    #[validate(range(min = 18, max = 99))]
    pub max_age: Option<u8>,
    pub religion: Option<String>,
    pub location: Option<String>,
    pub education: Option<String>,
    pub marital_status: Option<String>,
}

impl PartnerPreferences {
    /// Number of preference fields that carry a value
    pub fn filled_count(&self) -> usize {
        [
            self.min_age.is_some(),
            self.max_age.is_some(),
            is_filled(&self.religion),
            is_filled(&self.location),
            is_filled(&self.education),
            is_filled(&self.marital_status),
        ]
        .iter()
        .filter(|filled| **filled)
        .count()
    }
}

/// Editable profile content, validated on every create/update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub gender: Option<String>,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, max = 2000))]
    pub bio: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub photo_url: Option<String>,
    pub religion: Option<String>,
    pub mother_tongue: Option<String>,

    #[validate(range(min = 90, max = 250))]
    pub height_cm: Option<u16>,
    pub caste: Option<String>,

    pub job_status: Option<String>,
    pub marital_status: Option<String>,
    pub diet: Option<String>,
    pub smoking: Option<String>,
    pub drinking: Option<String>,

    pub father_occupation: Option<String>,
    pub mother_occupation: Option<String>,
    pub siblings: Option<String>,
    pub family_type: Option<String>,

    pub education: Option<String>,
    pub profession: Option<String>,
    pub income_range: Option<String>,
    pub job_category: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub partner: PartnerPreferences,
}

/// A validated profile; construct with `Profile::new`, change with `Profile::update`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub(crate) user_id: String,
    pub(crate) details: ProfileDetails,
    pub(crate) visibility: Visibility,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Youngest age at which a profile may be created
pub const MINIMUM_AGE: u32 = 18;

impl Profile {
    pub fn new(
        user_id: impl Into<String>,
        details: ProfileDetails,
        visibility: Visibility,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(EngineError::Validation("userId must not be empty".into()));
        }
        validate_details(&details, now.date_naive())?;

        Ok(Self {
            user_id,
            details,
            visibility,
            created_at: now,
            updated_at: now,
        })
    }

    /// New value carrying the edited details; invariants are re-checked
    pub fn update(
        &self,
        details: ProfileDetails,
        visibility: Visibility,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        validate_details(&details, now.date_naive())?;

        Ok(Self {
            user_id: self.user_id.clone(),
            details,
            visibility,
            created_at: self.created_at,
            updated_at: now,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn details(&self) -> &ProfileDetails {
        &self.details
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Age in whole years on the given date
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        age_between(self.details.date_of_birth, date)
    }
}

fn validate_details(details: &ProfileDetails, today: NaiveDate) -> EngineResult<()> {
    if details.bio.trim().is_empty() {
        return Err(EngineError::Validation("bio is required".into()));
    }
    if details.location.trim().is_empty() {
        return Err(EngineError::Validation("location is required".into()));
    }
    details.validate()?;

    if age_between(details.date_of_birth, today) < MINIMUM_AGE {
        return Err(EngineError::Validation(format!(
            "must be at least {} years old",
            MINIMUM_AGE
        )));
    }

    if let (Some(min), Some(max)) = (details.partner.min_age, details.partner.max_age) {
        if min > max {
            return Err(EngineError::Validation(
                "partner minimum age exceeds maximum age".into(),
            ));
        }
    }

    Ok(())
}

/// Whole years elapsed from `birth` to `on`, zero if `on` precedes `birth`
pub fn age_between(birth: NaiveDate, on: NaiveDate) -> u32 {
    let mut years = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

pub(crate) fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Profile as returned by discovery queries, joined with the owner's status
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub profile: Profile,
    pub account_status: AccountStatus,
}

/// Store-side pre-filter for candidate pools
#[derive(Debug, Clone)]
pub struct ProfileCriteria {
    pub exclude_user_ids: Vec<String>,
    pub public_only: bool,
    pub exclude_engaged: bool,
    pub limit: usize,
    pub offset: usize,
}

/// Directed expression of interest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub(crate) id: Uuid,
    pub(crate) sender_id: String,
    pub(crate) receiver_id: String,
    pub(crate) status: InterestStatus,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Interest {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn receiver_id(&self) -> &str {
        &self.receiver_id
    }

    pub fn status(&self) -> InterestStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

/// Confirmed, undirected pairing; `user_a_id < user_b_id` always holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub(crate) id: Uuid,
    pub(crate) user_a_id: String,
    pub(crate) user_b_id: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl Match {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_a_id(&self) -> &str {
        &self.user_a_id
    }

    pub fn user_b_id(&self) -> &str {
        &self.user_b_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn other_user(&self, user_id: &str) -> Option<&str> {
        if self.user_a_id == user_id {
            Some(&self.user_b_id)
        } else if self.user_b_id == user_id {
            Some(&self.user_a_id)
        } else {
            None
        }
    }
}

/// Formal engagement request, answered YES or NO
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub(crate) id: Uuid,
    pub(crate) proposer_id: String,
    pub(crate) recipient_id: String,
    pub(crate) message: String,
    pub(crate) status: ProposalStatus,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) answered_at: Option<DateTime<Utc>>,
}

impl Proposal {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn proposer_id(&self) -> &str {
        &self.proposer_id
    }

    pub fn recipient_id(&self) -> &str {
        &self.recipient_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ProposalStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn answered_at(&self) -> Option<DateTime<Utc>> {
        self.answered_at
    }
}

/// Account record as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) status: AccountStatus,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            status: AccountStatus::Active,
        }
    }

    pub fn with_status(&self, status: AccountStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }
}

/// Caller identity resolved by the outer session layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn member(user_id: impl Into<String>) -> Self {
        Self::new(user_id, UserRole::Member)
    }
}

/// Chat message between matched users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub(crate) id: Uuid,
    pub(crate) sender_id: String,
    pub(crate) receiver_id: String,
    pub(crate) content: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl Message {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn receiver_id(&self) -> &str {
        &self.receiver_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ProfileCreated,
    ProfileUpdated,
    InterestSent,
    InterestAccepted,
    InterestRejected,
    InterestEngaged,
    InterestWithdrawn,
    ProposalSent,
    ProposalAccepted,
    ProposalDeclined,
    ProposalWithdrawn,
    MessageSent,
}

text_enum!(AuditAction {
    ProfileCreated => "PROFILE_CREATED",
    ProfileUpdated => "PROFILE_UPDATED",
    InterestSent => "INTEREST_SENT",
    InterestAccepted => "INTEREST_ACCEPTED",
    InterestRejected => "INTEREST_REJECTED",
    InterestEngaged => "INTEREST_ENGAGED",
    InterestWithdrawn => "INTEREST_WITHDRAWN",
    ProposalSent => "PROPOSAL_SENT",
    ProposalAccepted => "PROPOSAL_ACCEPTED",
    ProposalDeclined => "PROPOSAL_DECLINED",
    ProposalWithdrawn => "PROPOSAL_WITHDRAWN",
    MessageSent => "MESSAGE_SENT",
});

/// Append-only audit record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub user_id: String,
    pub action: AuditAction,
    pub resource: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    InterestReceived,
    InterestAccepted,
    InterestDeclined,
    Engaged,
    ProposalReceived,
    ProposalAccepted,
    ProposalConfirmed,
    ProposalDeclined,
    MessageReceived,
}

/// User-facing event handed to a notification sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_between_respects_birthday() {
        let birth = NaiveDate::from_ymd_opt(1995, 6, 15).unwrap();
        assert_eq!(age_between(birth, NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()), 29);
        assert_eq!(age_between(birth, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 30);
        assert_eq!(age_between(birth, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()), 0);
    }

    #[test]
    fn test_text_enum_round_trip() {
        assert_eq!("ENGAGED".parse::<InterestStatus>().unwrap(), InterestStatus::Engaged);
        assert_eq!(Visibility::Protected.as_str(), "PROTECTED");
        assert!("MAYBE".parse::<ProposalStatus>().is_err());
    }

    #[test]
    fn test_declined_alias_maps_to_rejected() {
        let response: InterestResponse = serde_json::from_str("\"DECLINED\"").unwrap();
        assert_eq!(response, InterestResponse::Rejected);
        assert_eq!(InterestStatus::from(response), InterestStatus::Rejected);
    }

    #[test]
    fn test_user_with_status_keeps_identity() {
        let user = User::new("u1", "Asha", "asha@example.com", UserRole::Member);
        let engaged = user.with_status(AccountStatus::Engaged);
        assert_eq!(engaged.id(), "u1");
        assert_eq!(engaged.status(), AccountStatus::Engaged);
        assert_eq!(user.status(), AccountStatus::Active);
    }

    fn details(born: NaiveDate) -> ProfileDetails {
        ProfileDetails {
            date_of_birth: born,
            bio: "Loves music".to_string(),
            location: "Chennai".to_string(),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 5, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_profile_requires_adult() {
        let seventeen = NaiveDate::from_ymd_opt(2007, 5, 11).unwrap();
        let eighteen = NaiveDate::from_ymd_opt(2007, 5, 10).unwrap();

        let err = Profile::new("u1", details(seventeen), Visibility::Public, now()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(Profile::new("u1", details(eighteen), Visibility::Public, now()).is_ok());
    }

    #[test]
    fn test_profile_requires_bio_and_location() {
        let born = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();

        let mut blank_bio = details(born);
        blank_bio.bio = "   ".to_string();
        assert!(Profile::new("u1", blank_bio, Visibility::Public, now()).is_err());

        let mut no_location = details(born);
        no_location.location = String::new();
        assert!(Profile::new("u1", no_location, Visibility::Public, now()).is_err());
    }

    #[test]
    fn test_update_revalidates_and_keeps_created_at() {
        let born = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let profile = Profile::new("u1", details(born), Visibility::Public, now()).unwrap();

        let mut invalid = details(born);
        invalid.partner.min_age = Some(35);
        invalid.partner.max_age = Some(30);
        assert!(profile.update(invalid, Visibility::Public, now()).is_err());

        let later = now() + chrono::Duration::days(1);
        let mut edited = details(born);
        edited.religion = Some("Christian".to_string());
        let updated = profile.update(edited, Visibility::Private, later).unwrap();

        assert_eq!(updated.created_at(), profile.created_at());
        assert_eq!(updated.updated_at(), later);
        assert_eq!(updated.visibility(), Visibility::Private);
        assert_eq!(profile.details().religion, None);
    }

    #[test]
    fn test_profile_rejects_out_of_range_height() {
        let mut d = details(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        d.height_cm = Some(40);
        assert!(Profile::new("u1", d, Visibility::Public, now()).is_err());
    }

    #[test]
    fn test_partner_preferences_filled_count() {
        let prefs = PartnerPreferences {
            min_age: Some(25),
            religion: Some("Hindu".into()),
            location: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(prefs.filled_count(), 2);
    }
}
