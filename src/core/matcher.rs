use std::collections::HashSet;

use crate::core::{filters::is_eligible, scoring::CompatibilityScorer};
use crate::models::{Candidate, Profile, ScoredCandidate};

/// Minimum compatibility score for a candidate to be shown
pub const DEFAULT_THRESHOLD: u8 = 50;

/// Result of the discovery pipeline
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<ScoredCandidate>,
    pub total_candidates: usize,
}

/// Discovery orchestrator
///
/// # Pipeline Stages
/// 1. Eligibility filtering (self, blocks, visibility, engaged)
/// 2. Compatibility scoring
/// 3. Threshold cut
/// 4. Ranking by score, then truncation to the page size
#[derive(Debug, Clone)]
pub struct Matcher {
    scorer: CompatibilityScorer,
    threshold: u8,
}

impl Matcher {
    pub fn new(scorer: CompatibilityScorer, threshold: u8) -> Self {
        Self { scorer, threshold }
    }

    pub fn with_default_threshold() -> Self {
        Self::new(CompatibilityScorer::today(), DEFAULT_THRESHOLD)
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Find compatible candidates for the requester
    ///
    /// # Arguments
    /// * `requester` - The requester's profile
    /// * `candidates` - Candidate pool from the profile store
    /// * `blocked` - User IDs blocked in either direction
    /// * `limit` - Maximum number of results to return
    pub fn find_matches(
        &self,
        requester: &Profile,
        candidates: Vec<Candidate>,
        blocked: &HashSet<String>,
        limit: usize,
    ) -> MatchResult {
        let total_candidates = candidates.len();
        let as_of = self.scorer.as_of();

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter(|c| is_eligible(c, requester.user_id(), blocked))
            .filter_map(|c| {
                let compatibility = self.scorer.score(requester, &c.profile);
                if compatibility.score < self.threshold {
                    return None;
                }

                let profile = c.profile;
                Some(ScoredCandidate {
                    age: profile.age_on(as_of),
                    completion: profile.completion_percentage(),
                    location: profile.details.location.clone(),
                    religion: profile.details.religion.clone(),
                    user_id: profile.user_id,
                    score: compatibility.score,
                    reasons: compatibility.reasons,
                })
            })
            .collect();

        // Stable: equal scores keep pool order
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(limit);

        MatchResult {
            matches: scored,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_threshold()
    }
}
