use chrono::Utc;
use validator::Validate;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Actor, AuditAction, Message, MessageOutcome, Notification, NotificationKind,
    SendMessageRequest,
};
use crate::services::Engine;

impl Engine {
    /// Send a chat message; only matched users may talk to each other
    pub async fn send_message(
        &self,
        actor: &Actor,
        request: &SendMessageRequest,
    ) -> EngineResult<MessageOutcome> {
        self.policy.ensure_can_initiate(actor)?;
        request.validate()?;

        let now = Utc::now();
        let message = Message::new(
            actor.user_id.as_str(),
            request.receiver_id.as_str(),
            request.content.as_str(),
            now,
        )?;

        self.ensure_matched(&actor.user_id, &request.receiver_id).await?;
        self.policy
            .ensure_message_quota(self.stores.messages.as_ref(), &actor.user_id, now)
            .await?;

        self.stores.messages.save(&message).await?;
        tracing::debug!("Message {} sent: {} -> {}", message.id(), actor.user_id, request.receiver_id);

        let delivered = self
            .notifier
            .dispatch(
                Notification::new(
                    request.receiver_id.as_str(),
                    NotificationKind::MessageReceived,
                    "New message",
                    "You have a new message",
                )
                .with_link(format!("/messages/{}", actor.user_id)),
            )
            .await;

        self.audit
            .record(
                &actor.user_id,
                AuditAction::MessageSent,
                Some(format!("message:{}", message.id())),
                Some(serde_json::json!({ "receiverId": request.receiver_id })),
            )
            .await;

        Ok(MessageOutcome { message, delivered })
    }

    /// Messages between the actor and a matched user, oldest first
    pub async fn conversation(&self, actor: &Actor, other_id: &str) -> EngineResult<Vec<Message>> {
        self.ensure_matched(&actor.user_id, other_id).await?;
        Ok(self
            .stores
            .messages
            .find_conversation(&actor.user_id, other_id)
            .await?)
    }

    async fn ensure_matched(&self, a: &str, b: &str) -> EngineResult<()> {
        if self.stores.matches.find_by_user_pair(a, b).await?.is_none() {
            return Err(EngineError::Unauthorized(
                "messaging requires a match".into(),
            ));
        }
        Ok(())
    }
}
