use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::DatabaseSettings;
use crate::core::canonical_pair;
use crate::error::StoreError;
use crate::models::{
    AccountStatus, AuditEntry, Candidate, Interest, InterestStatus, Match, Message, Profile,
    ProfileCriteria, ProfileDetails, Proposal, ProposalStatus, User, UserRole, Visibility,
};
use crate::ports::{
    AuditSink, BlockStore, InterestStore, MatchStore, MessageStore, ProfileStore, ProposalStore,
    StoreResult, UserStore,
};

/// PostgreSQL-backed implementation of every store port
///
/// Pair uniqueness for interests and matches is enforced by indexes created
/// in `migrations/`; state transitions use conditional updates so that only
/// one writer can move a record out of PENDING.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

fn parse<T: FromStr<Err = String>>(value: &str) -> StoreResult<T> {
    value.parse().map_err(StoreError::Corrupt)
}

fn count(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    role: String,
    status: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: parse::<UserRole>(&row.role)?,
            status: parse::<AccountStatus>(&row.status)?,
        })
    }
}

#[derive(FromRow)]
struct ProfileRow {
    user_id: String,
    details: Json<ProfileDetails>,
    visibility: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> StoreResult<Self> {
        Ok(Profile {
            user_id: row.user_id,
            details: row.details.0,
            visibility: parse::<Visibility>(&row.visibility)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CandidateRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    account_status: String,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = StoreError;

    fn try_from(row: CandidateRow) -> StoreResult<Self> {
        Ok(Candidate {
            account_status: parse::<AccountStatus>(&row.account_status)?,
            profile: row.profile.try_into()?,
        })
    }
}

#[derive(FromRow)]
struct InterestRow {
    id: Uuid,
    sender_id: String,
    receiver_id: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InterestRow> for Interest {
    type Error = StoreError;

    fn try_from(row: InterestRow) -> StoreResult<Self> {
        Ok(Interest {
            id: row.id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            status: parse::<InterestStatus>(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MatchRow {
    id: Uuid,
    user_a_id: String,
    user_b_id: String,
    created_at: DateTime<Utc>,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        Match {
            id: row.id,
            user_a_id: row.user_a_id,
            user_b_id: row.user_b_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProposalRow {
    id: Uuid,
    proposer_id: String,
    recipient_id: String,
    message: String,
    status: String,
    created_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProposalRow> for Proposal {
    type Error = StoreError;

    fn try_from(row: ProposalRow) -> StoreResult<Self> {
        Ok(Proposal {
            id: row.id,
            proposer_id: row.proposer_id,
            recipient_id: row.recipient_id,
            message: row.message,
            status: parse::<ProposalStatus>(&row.status)?,
            created_at: row.created_at,
            answered_at: row.answered_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    sender_id: String,
    receiver_id: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Move an interest out of PENDING; matches no row once it has left
const INTEREST_TRANSITION: &str =
    "UPDATE interests SET status = $2, updated_at = $3 WHERE id = $1 AND status = 'PENDING'";

const PROPOSAL_COLUMNS: &str =
    "id, proposer_id, recipient_id, message, status, created_at, answered_at";

impl PostgresStore {
    /// Connect, then bring the schema up to date
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await
            .map_err(StoreError::from_sqlx)?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Wrap an existing pool; the caller is responsible for migrations
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh a user record mirrored from the identity provider
    pub async fn upsert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                role = EXCLUDED.role,
                status = EXCLUDED.status
            "#,
        )
        .bind(user.id())
        .bind(user.name())
        .bind(user.email())
        .bind(user.role().as_str())
        .bind(user.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    pub async fn block(&self, blocker_id: &str, blocked_id: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO blocks (blocker_id, blocked_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    pub async fn health_check(&self) -> StoreResult<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(StoreError::from_sqlx)
    }

    async fn fetch_proposals(&self, filter: &str, user_id: &str) -> StoreResult<Vec<Proposal>> {
        let query = format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE {filter} ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ProposalRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        convert_all(rows)
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, details, visibility, created_at, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?
        .map(Profile::try_from)
        .transpose()
    }

    async fn find_filtered(&self, criteria: &ProfileCriteria) -> StoreResult<(Vec<Candidate>, usize)> {
        const FILTER: &str = r#"
            FROM profiles p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE NOT (p.user_id = ANY($1))
              AND ($2 = FALSE OR p.visibility = 'PUBLIC')
              AND ($3 = FALSE OR COALESCE(u.status, 'ACTIVE') <> 'ENGAGED')
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FILTER}"))
            .bind(&criteria.exclude_user_ids)
            .bind(criteria.public_only)
            .bind(criteria.exclude_engaged)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        let page = format!(
            r#"
            SELECT p.user_id, p.details, p.visibility, p.created_at, p.updated_at,
                   COALESCE(u.status, 'ACTIVE') AS account_status
            {FILTER}
            ORDER BY p.updated_at DESC, p.user_id
            LIMIT $4 OFFSET $5
            "#
        );
        let rows = sqlx::query_as::<_, CandidateRow>(&page)
            .bind(&criteria.exclude_user_ids)
            .bind(criteria.public_only)
            .bind(criteria.exclude_engaged)
            .bind(criteria.limit as i64)
            .bind(criteria.offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        let candidates = convert_all(rows)?;
        tracing::debug!("Fetched {} of {} candidate profiles", candidates.len(), total);

        Ok((candidates, usize::try_from(total).unwrap_or(0)))
    }

    async fn save(&self, profile: &Profile) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, details, visibility, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                details = EXCLUDED.details,
                visibility = EXCLUDED.visibility,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.user_id())
        .bind(Json(profile.details()))
        .bind(profile.visibility().as_str())
        .bind(profile.created_at())
        .bind(profile.updated_at())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT id, name, email, role, status FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl InterestStore for PostgresStore {
    async fn save(&self, interest: &Interest) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO interests (id, sender_id, receiver_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(interest.id())
        .bind(interest.sender_id())
        .bind(interest.receiver_id())
        .bind(interest.status().as_str())
        .bind(interest.created_at())
        .bind(interest.updated_at())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Interest>> {
        sqlx::query_as::<_, InterestRow>(
            "SELECT id, sender_id, receiver_id, status, created_at, updated_at FROM interests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?
        .map(Interest::try_from)
        .transpose()
    }

    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Option<Interest>> {
        sqlx::query_as::<_, InterestRow>(
            r#"
            SELECT id, sender_id, receiver_id, status, created_at, updated_at
            FROM interests
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?
        .map(Interest::try_from)
        .transpose()
    }

    async fn update_status(&self, interest: &Interest) -> StoreResult<bool> {
        let result = sqlx::query(INTEREST_TRANSITION)
            .bind(interest.id())
            .bind(interest.status().as_str())
            .bind(interest.updated_at())
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn accept(&self, interest: &Interest, candidate: &Match) -> StoreResult<Option<Match>> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from_sqlx)?;

        let updated = sqlx::query(INTEREST_TRANSITION)
            .bind(interest.id())
            .bind(interest.status().as_str())
            .bind(interest.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;
        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(StoreError::from_sqlx)?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO matches (id, user_a_id, user_b_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_a_id, user_b_id) DO NOTHING
            "#,
        )
        .bind(candidate.id())
        .bind(candidate.user_a_id())
        .bind(candidate.user_b_id())
        .bind(candidate.created_at())
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        let row = sqlx::query_as::<_, MatchRow>(
            "SELECT id, user_a_id, user_b_id, created_at FROM matches WHERE user_a_id = $1 AND user_b_id = $2",
        )
        .bind(candidate.user_a_id())
        .bind(candidate.user_b_id())
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        tx.commit().await.map_err(StoreError::from_sqlx)?;
        Ok(Some(Match::from(row)))
    }

    async fn engage(&self, interest: &Interest) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from_sqlx)?;

        let updated = sqlx::query(INTEREST_TRANSITION)
            .bind(interest.id())
            .bind(interest.status().as_str())
            .bind(interest.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;
        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(StoreError::from_sqlx)?;
            return Ok(false);
        }

        let users = sqlx::query("UPDATE users SET status = $3 WHERE id = $1 OR id = $2")
            .bind(interest.sender_id())
            .bind(interest.receiver_id())
            .bind(AccountStatus::Engaged.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;
        if users.rows_affected() != 2 {
            tx.rollback().await.map_err(StoreError::from_sqlx)?;
            return Err(StoreError::NotFound(format!(
                "users {} / {}",
                interest.sender_id(),
                interest.receiver_id()
            )));
        }

        tx.commit().await.map_err(StoreError::from_sqlx)?;
        Ok(true)
    }

    async fn count_created_since(&self, sender_id: &str, since: DateTime<Utc>) -> StoreResult<u32> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM interests WHERE sender_id = $1 AND created_at >= $2",
        )
        .bind(sender_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(count(total))
    }

    async fn find_sent_by(&self, user_id: &str) -> StoreResult<Vec<Interest>> {
        let rows = sqlx::query_as::<_, InterestRow>(
            r#"
            SELECT id, sender_id, receiver_id, status, created_at, updated_at
            FROM interests WHERE sender_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        convert_all(rows)
    }

    async fn find_received_by(&self, user_id: &str) -> StoreResult<Vec<Interest>> {
        let rows = sqlx::query_as::<_, InterestRow>(
            r#"
            SELECT id, sender_id, receiver_id, status, created_at, updated_at
            FROM interests WHERE receiver_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        convert_all(rows)
    }
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn save(&self, candidate: &Match) -> StoreResult<Match> {
        sqlx::query(
            r#"
            INSERT INTO matches (id, user_a_id, user_b_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_a_id, user_b_id) DO NOTHING
            "#,
        )
        .bind(candidate.id())
        .bind(candidate.user_a_id())
        .bind(candidate.user_b_id())
        .bind(candidate.created_at())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        MatchStore::find_by_user_pair(self, candidate.user_a_id(), candidate.user_b_id())
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "match {}/{}",
                    candidate.user_a_id(),
                    candidate.user_b_id()
                ))
            })
    }

    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Option<Match>> {
        let (low, high) = canonical_pair(a, b);
        let row = sqlx::query_as::<_, MatchRow>(
            "SELECT id, user_a_id, user_b_id, created_at FROM matches WHERE user_a_id = $1 AND user_b_id = $2",
        )
        .bind(low)
        .bind(high)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(row.map(Match::from))
    }

    async fn find_all_for_user(&self, user_id: &str) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, user_a_id, user_b_id, created_at
            FROM matches
            WHERE user_a_id = $1 OR user_b_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(rows.into_iter().map(Match::from).collect())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProposalStore for PostgresStore {
    async fn save(&self, proposal: &Proposal) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO proposals ({PROPOSAL_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(proposal.id())
        .bind(proposal.proposer_id())
        .bind(proposal.recipient_id())
        .bind(proposal.message())
        .bind(proposal.status().as_str())
        .bind(proposal.created_at())
        .bind(proposal.answered_at())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn update(&self, proposal: &Proposal) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE proposals
            SET status = $2, answered_at = $3
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(proposal.id())
        .bind(proposal.status().as_str())
        .bind(proposal.answered_at())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Proposal>> {
        sqlx::query_as::<_, ProposalRow>(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?
        .map(Proposal::try_from)
        .transpose()
    }

    async fn find_latest(&self, user_id: &str) -> StoreResult<Option<Proposal>> {
        sqlx::query_as::<_, ProposalRow>(&format!(
            r#"
            SELECT {PROPOSAL_COLUMNS}
            FROM proposals
            WHERE proposer_id = $1 OR recipient_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?
        .map(Proposal::try_from)
        .transpose()
    }

    async fn find_by_proposer_id(&self, user_id: &str) -> StoreResult<Vec<Proposal>> {
        self.fetch_proposals("proposer_id = $1", user_id).await
    }

    async fn find_by_recipient_id(&self, user_id: &str) -> StoreResult<Vec<Proposal>> {
        self.fetch_proposals("recipient_id = $1", user_id).await
    }

    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Vec<Proposal>> {
        let rows = sqlx::query_as::<_, ProposalRow>(&format!(
            r#"
            SELECT {PROPOSAL_COLUMNS}
            FROM proposals
            WHERE (proposer_id = $1 AND recipient_id = $2)
               OR (proposer_id = $2 AND recipient_id = $1)
            ORDER BY created_at DESC
            "#
        ))
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        convert_all(rows)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM proposals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BlockStore for PostgresStore {
    async fn blocked_by_user(&self, user_id: &str) -> StoreResult<HashSet<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT blocked_id FROM blocks WHERE blocker_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::from_sqlx)?;
        Ok(ids.into_iter().collect())
    }

    async fn who_blocked_user(&self, user_id: &str) -> StoreResult<HashSet<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT blocker_id FROM blocks WHERE blocked_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::from_sqlx)?;
        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl MessageStore for PostgresStore {
    async fn save(&self, message: &Message) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id())
        .bind(message.sender_id())
        .bind(message.receiver_id())
        .bind(message.content())
        .bind(message.created_at())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn count_sent_since(&self, sender_id: &str, since: DateTime<Utc>) -> StoreResult<u32> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE sender_id = $1 AND created_at >= $2",
        )
        .bind(sender_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(count(total))
    }

    async fn find_conversation(&self, a: &str, b: &str) -> StoreResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, sender_id, receiver_id, content, created_at
            FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }
}

#[async_trait]
impl AuditSink for PostgresStore {
    async fn record(&self, entry: &AuditEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, resource, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&entry.user_id)
        .bind(entry.action.as_str())
        .bind(entry.resource.as_deref())
        .bind(entry.metadata.as_ref().map(Json))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }
}
