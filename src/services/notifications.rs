use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::models::Notification;
use crate::ports::{NotificationSink, StoreResult};

/// Best-effort notification delivery for the use cases
///
/// Sink failures are logged and reported as `false`; they never fail the
/// transition that triggered them.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub async fn dispatch(&self, notification: Notification) -> bool {
        match self.sink.publish(&notification).await {
            Ok(()) => {
                tracing::debug!("Notified {} ({:?})", notification.user_id, notification.kind);
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to notify {} ({:?}): {}",
                    notification.user_id,
                    notification.kind,
                    e
                );
                false
            }
        }
    }
}

/// Channel name builder for per-user topics
pub struct NotificationChannel;

impl NotificationChannel {
    pub fn for_user(user_id: &str) -> String {
        format!("notifications:{}", user_id)
    }
}

/// In-process sink with one bounded broadcast channel per user
///
/// Channels are created on first subscription. A channel with no receivers
/// left is dropped on the next publish to that user or the next subscribe.
/// Lagging receivers lose the oldest notifications.
pub struct ChannelNotificationSink {
    channels: RwLock<HashMap<String, broadcast::Sender<Notification>>>,
    capacity: usize,
}

impl ChannelNotificationSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscribe(&self, user_id: &str) -> broadcast::Receiver<Notification> {
        let mut channels = self.channels.write().await;
        // Sweep users whose receivers have all been dropped
        channels.retain(|_, sender| sender.receiver_count() > 0);
        channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[async_trait]
impl NotificationSink for ChannelNotificationSink {
    async fn publish(&self, notification: &Notification) -> StoreResult<()> {
        let mut channels = self.channels.write().await;
        let Some(sender) = channels.get(&notification.user_id) else {
            tracing::trace!("No live subscribers for {}", notification.user_id);
            return Ok(());
        };

        if sender.send(notification.clone()).is_err() {
            // Every receiver is gone
            channels.remove(&notification.user_id);
        }
        Ok(())
    }
}

/// Sink publishing JSON notifications to a Redis topic per user
pub struct RedisNotificationSink {
    // Store ConnectionManager in a Mutex for interior mutability
    redis: Arc<Mutex<ConnectionManager>>,
}

impl RedisNotificationSink {
    pub async fn new(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Arc::new(Mutex::new(redis)),
        })
    }
}

#[async_trait]
impl NotificationSink for RedisNotificationSink {
    async fn publish(&self, notification: &Notification) -> StoreResult<()> {
        let payload = serde_json::to_string(notification)?;
        let channel = NotificationChannel::for_user(&notification.user_id);

        let mut conn = self.redis.lock().await;
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(&channel)
            .arg(payload)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        tracing::trace!("Published to {} ({} receivers)", channel, receivers);
        Ok(())
    }
}
