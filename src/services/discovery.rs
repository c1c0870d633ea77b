use validator::Validate;

use crate::core::{mutual_block_set, CompatibilityScorer, Matcher};
use crate::error::{EngineError, EngineResult};
use crate::models::{DiscoveryRequest, DiscoveryResponse, ProfileCriteria};
use crate::services::Engine;

impl Engine {
    /// Ranked page of compatible candidates for the requester
    pub async fn discover(&self, request: &DiscoveryRequest) -> EngineResult<DiscoveryResponse> {
        request.validate()?;

        let user_id = &request.user_id;
        let limit = request
            .limit
            .unwrap_or(self.discovery.default_limit)
            .min(self.discovery.max_limit)
            .max(1) as usize;

        tracing::info!("Finding candidates for user: {}, limit: {}", user_id, limit);

        let requester = self
            .stores
            .profiles
            .find_by_user_id(user_id)
            .await?
            .ok_or(EngineError::ProfileRequired)?;

        let blocked = mutual_block_set(
            self.stores.blocks.blocked_by_user(user_id).await?,
            self.stores.blocks.who_blocked_user(user_id).await?,
        );

        // Blocked users never take a slot in the scoring pool
        let mut exclude_user_ids: Vec<String> = blocked.iter().cloned().collect();
        exclude_user_ids.push(user_id.clone());

        let criteria = ProfileCriteria {
            exclude_user_ids,
            public_only: true,
            exclude_engaged: true,
            limit: self.discovery.pool_size,
            offset: 0,
        };
        let (pool, total) = self.stores.profiles.find_filtered(&criteria).await?;

        tracing::debug!(
            "Scoring {} of {} candidates for {} ({} blocked)",
            pool.len(),
            total,
            user_id,
            blocked.len()
        );

        let matcher = Matcher::new(CompatibilityScorer::today(), self.discovery.threshold);
        let result = matcher.find_matches(&requester, pool, &blocked, limit);

        // Report the whole eligible population, not just the scored page
        Ok(DiscoveryResponse {
            matches: result.matches,
            total_candidates: total,
        })
    }
}
