// Core algorithm exports
pub mod completion;
pub mod filters;
pub mod matcher;
pub mod pairing;
pub mod policy;
pub mod scoring;

pub use completion::{calculate_completion, missing_tips, CompletionTip, READY_THRESHOLD};
pub use filters::{is_eligible, mutual_block_set};
pub use matcher::{MatchResult, Matcher, DEFAULT_THRESHOLD};
pub use pairing::canonical_pair;
pub use policy::{start_of_day, PolicyGuard, PolicyLimits};
pub use scoring::{Compatibility, CompatibilityScorer};
