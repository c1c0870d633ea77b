use chrono::Utc;

use crate::error::{ConflictReason, EngineError, EngineResult};
use crate::models::{AuditAction, CompletionReport, Profile, ProfileDetails, Visibility};
use crate::services::Engine;

impl Engine {
    pub async fn create_profile(
        &self,
        user_id: &str,
        details: ProfileDetails,
        visibility: Visibility,
    ) -> EngineResult<Profile> {
        if self.stores.users.find_by_id(user_id).await?.is_none() {
            return Err(EngineError::not_found("User", user_id));
        }
        if self.stores.profiles.find_by_user_id(user_id).await?.is_some() {
            return Err(EngineError::Conflict(ConflictReason::ProfileExists));
        }

        let profile = Profile::new(user_id, details, visibility, Utc::now())?;
        self.stores.profiles.save(&profile).await?;

        let completion = profile.completion_percentage();
        tracing::info!("Profile created for {} ({}% complete)", user_id, completion);
        self.audit
            .record(
                user_id,
                AuditAction::ProfileCreated,
                Some(format!("profile:{}", user_id)),
                Some(serde_json::json!({ "completion": completion })),
            )
            .await;

        Ok(profile)
    }

    /// Replace the editable details; every invariant is checked again
    pub async fn update_profile(
        &self,
        user_id: &str,
        details: ProfileDetails,
        visibility: Visibility,
    ) -> EngineResult<Profile> {
        let current = self.get_profile(user_id).await?;
        let updated = current.update(details, visibility, Utc::now())?;
        self.stores.profiles.save(&updated).await?;

        self.audit
            .record(
                user_id,
                AuditAction::ProfileUpdated,
                Some(format!("profile:{}", user_id)),
                Some(serde_json::json!({ "completion": updated.completion_percentage() })),
            )
            .await;

        Ok(updated)
    }

    pub async fn get_profile(&self, user_id: &str) -> EngineResult<Profile> {
        self.stores
            .profiles
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Profile", user_id))
    }

    pub async fn completion_report(&self, user_id: &str) -> EngineResult<CompletionReport> {
        let profile = self.get_profile(user_id).await?;
        Ok(CompletionReport {
            percentage: profile.completion_percentage(),
            ready_for_interactions: profile.is_ready_for_interactions(),
            tips: profile.missing_tips(),
        })
    }
}
