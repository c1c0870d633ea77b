use serde::Serialize;
use thiserror::Error;

/// Errors raised by the persistence and delivery adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Map a sqlx error, turning Postgres unique violations (23505) into
    /// `UniqueViolation` so callers can treat them as business conflicts.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::SqlxError(err)
    }
}

/// Failures while wiring the engine from configuration
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Email client: {0}")]
    Email(#[from] crate::services::EmailError),
}

/// Why a request conflicts with the current state of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    AlreadyMatched,
    DuplicateInterest,
    AlreadyResponded,
    AlreadyAnswered,
    ProposalPending,
    ProfileExists,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ConflictReason::AlreadyMatched => "users are already matched",
            ConflictReason::DuplicateInterest => "an interest already exists between these users",
            ConflictReason::AlreadyResponded => "interest has already been responded to",
            ConflictReason::AlreadyAnswered => "proposal has already been answered",
            ConflictReason::ProposalPending => "a pending proposal already exists between these users",
            ConflictReason::ProfileExists => "profile already exists",
        };
        f.write_str(text)
    }
}

/// Machine-readable error kind for the outer API layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    ProfileIncomplete,
    ProfileRequired,
    Conflict,
    RateLimited,
    Internal,
}

/// Errors raised synchronously by the engine's use cases
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Profile is {completion}% complete; at least {required}% is required to interact")]
    ProfileIncomplete { completion: u8, required: u8 },

    #[error("A profile is required for this action")]
    ProfileRequired,

    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    #[error("Rate limit exceeded: at most {limit} {action} per {window}")]
    RateLimited {
        action: &'static str,
        limit: u32,
        window: &'static str,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::ValidationError,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::Unauthorized(_) => ErrorKind::Unauthorized,
            EngineError::Forbidden(_) => ErrorKind::Forbidden,
            EngineError::ProfileIncomplete { .. } => ErrorKind::ProfileIncomplete,
            EngineError::ProfileRequired => ErrorKind::ProfileRequired,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::RateLimited { .. } => ErrorKind::RateLimited,
            EngineError::Storage(_) => ErrorKind::Internal,
        }
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EngineError::Validation(errors.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
