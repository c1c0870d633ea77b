// Service exports
pub mod audit;
pub mod discovery;
pub mod email;
pub mod interests;
pub mod memory;
pub mod messaging;
pub mod notifications;
pub mod postgres;
pub mod profiles;
pub mod proposals;

pub use audit::AuditRecorder;
pub use email::{EmailError, EmailSender, HttpEmailClient};
pub use memory::InMemoryStore;
pub use notifications::{
    ChannelNotificationSink, NotificationChannel, NotificationDispatcher, RedisNotificationSink,
};
pub use postgres::PostgresStore;

use std::sync::Arc;

use crate::config::{DiscoverySettings, Settings};
use crate::core::{PolicyGuard, PolicyLimits};
use crate::error::StartupError;
use crate::ports::{
    AuditSink, BlockStore, InterestStore, MatchStore, MessageStore, NotificationSink,
    ProfileStore, ProposalStore, UserStore,
};

/// Store handles consumed by the engine
#[derive(Clone)]
pub struct Stores {
    pub profiles: Arc<dyn ProfileStore>,
    pub users: Arc<dyn UserStore>,
    pub interests: Arc<dyn InterestStore>,
    pub matches: Arc<dyn MatchStore>,
    pub proposals: Arc<dyn ProposalStore>,
    pub blocks: Arc<dyn BlockStore>,
    pub messages: Arc<dyn MessageStore>,
    pub audit: Arc<dyn AuditSink>,
}

impl Stores {
    /// Use one backend for every contract
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: ProfileStore
            + UserStore
            + InterestStore
            + MatchStore
            + ProposalStore
            + BlockStore
            + MessageStore
            + AuditSink
            + 'static,
    {
        Self {
            profiles: backend.clone(),
            users: backend.clone(),
            interests: backend.clone(),
            matches: backend.clone(),
            proposals: backend.clone(),
            blocks: backend.clone(),
            messages: backend.clone(),
            audit: backend,
        }
    }
}

/// Entry point for every use case
///
/// Stateless between calls: all shared state lives behind the stores, so one
/// engine can be cloned into every request handler.
#[derive(Clone)]
pub struct Engine {
    pub(crate) stores: Stores,
    pub(crate) policy: PolicyGuard,
    pub(crate) discovery: DiscoverySettings,
    pub(crate) audit: AuditRecorder,
    pub(crate) notifier: NotificationDispatcher,
    pub(crate) email: Option<Arc<dyn EmailSender>>,
}

impl Engine {
    pub fn new(stores: Stores, notifications: Arc<dyn NotificationSink>) -> Self {
        let audit = AuditRecorder::new(stores.audit.clone());
        Self {
            stores,
            policy: PolicyGuard::default(),
            discovery: DiscoverySettings::default(),
            audit,
            notifier: NotificationDispatcher::new(notifications),
            email: None,
        }
    }

    /// Production wiring: PostgreSQL stores, Redis notifications when
    /// configured (in-process channels otherwise), optional HTTP email
    pub async fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        let store = Arc::new(PostgresStore::from_settings(&settings.database).await?);

        let notifications: Arc<dyn NotificationSink> = match &settings.redis {
            Some(redis) => Arc::new(RedisNotificationSink::new(&redis.url).await?),
            None => {
                tracing::info!("Redis not configured, using in-process notification channels");
                Arc::new(ChannelNotificationSink::new(
                    settings.notifications.channel_capacity,
                ))
            }
        };

        let mut engine = Self::new(Stores::from_backend(store), notifications)
            .with_policy(settings.policy_limits())
            .with_discovery(settings.discovery.clone());

        if let Some(email) = &settings.email {
            engine = engine.with_email(Arc::new(HttpEmailClient::from_settings(email)?));
        }

        tracing::info!("Matchmaking engine ready");
        Ok(engine)
    }

    pub fn with_policy(mut self, limits: PolicyLimits) -> Self {
        self.policy = PolicyGuard::new(limits);
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoverySettings) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_email(mut self, email: Arc<dyn EmailSender>) -> Self {
        self.email = Some(email);
        self
    }

    pub fn policy(&self) -> &PolicyGuard {
        &self.policy
    }
}
