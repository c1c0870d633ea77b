use std::collections::HashSet;

use crate::models::{AccountStatus, Candidate, Visibility};

/// Check whether a candidate may appear in the requester's discovery feed
///
/// Excludes the requester, anyone in the mutual block set, profiles that are
/// not public, and owners who are already engaged.
#[inline]
pub fn is_eligible(candidate: &Candidate, requester_id: &str, blocked: &HashSet<String>) -> bool {
    let user_id = candidate.profile.user_id();

    if user_id == requester_id {
        return false;
    }

    if blocked.contains(user_id) {
        return false;
    }

    if candidate.profile.visibility() != Visibility::Public {
        return false;
    }

    candidate.account_status != AccountStatus::Engaged
}

/// Merge both block directions into one exclusion set
pub fn mutual_block_set(blocked_by_user: HashSet<String>, who_blocked_user: HashSet<String>) -> HashSet<String> {
    let mut set = blocked_by_user;
    set.extend(who_blocked_user);
    set
}
