use std::sync::Arc;

use chrono::Utc;

use crate::models::{AuditAction, AuditEntry};
use crate::ports::AuditSink;

/// Writes audit entries for state-changing actions
///
/// Called synchronously after the primary write. A sink failure is logged and
/// swallowed; the transition it describes has already been persisted.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub async fn record(
        &self,
        user_id: &str,
        action: AuditAction,
        resource: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> bool {
        let entry = AuditEntry {
            user_id: user_id.to_string(),
            action,
            resource,
            metadata,
            created_at: Utc::now(),
        };

        match self.sink.record(&entry).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to record audit entry {} for {}: {}", action, user_id, e);
                false
            }
        }
    }
}
