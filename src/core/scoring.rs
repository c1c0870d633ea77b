use chrono::{NaiveDate, Utc};

use crate::models::Profile;

const AGE_CLOSE_POINTS: u32 = 20;
const AGE_NEAR_POINTS: u32 = 10;
const RELIGION_POINTS: u32 = 25;
const DIET_POINTS: u32 = 10;
const SMOKING_POINTS: u32 = 5;
const DRINKING_POINTS: u32 = 5;
const EDUCATION_POINTS: u32 = 15;
const JOB_CATEGORY_POINTS: u32 = 10;
const VERY_COMPLETE_POINTS: u32 = 20;
const COMPLETE_POINTS: u32 = 10;

/// Explainable compatibility score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compatibility {
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Scores a (requester, candidate) pair on a fixed rubric
///
/// Scoring rubric (summed, capped at 100):
///     age gap <= 3 years        20   (<= 7 years: 10)
///     same religion             25
///     same diet                 10
///     same smoking habit         5
///     same drinking habit        5
///     same education            15   (else same job category: 10)
///     candidate completion >=95 20   (>= 85: 10)
///
/// Ages are taken on `as_of`, so identical inputs always score identically.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityScorer {
    as_of: NaiveDate,
}

impl CompatibilityScorer {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    pub fn today() -> Self {
        Self::new(Utc::now().date_naive())
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn score(&self, requester: &Profile, candidate: &Profile) -> Compatibility {
        let mut total = 0u32;
        let mut reasons = Vec::new();

        let age_gap = requester
            .age_on(self.as_of)
            .abs_diff(candidate.age_on(self.as_of));
        if age_gap <= 3 {
            total += AGE_CLOSE_POINTS;
            reasons.push("Very close in age".to_string());
        } else if age_gap <= 7 {
            total += AGE_NEAR_POINTS;
            reasons.push("Compatible age gap".to_string());
        }

        let mine = requester.details();
        let theirs = candidate.details();

        if same(&mine.religion, &theirs.religion) {
            total += RELIGION_POINTS;
            reasons.push(format!(
                "Both follow {}",
                theirs.religion.as_deref().unwrap_or_default()
            ));
        }

        if same(&mine.diet, &theirs.diet) {
            total += DIET_POINTS;
            reasons.push("Same diet preference".to_string());
        }
        if same(&mine.smoking, &theirs.smoking) {
            total += SMOKING_POINTS;
            reasons.push("Same smoking habits".to_string());
        }
        if same(&mine.drinking, &theirs.drinking) {
            total += DRINKING_POINTS;
            reasons.push("Same drinking habits".to_string());
        }

        if same(&mine.education, &theirs.education) {
            total += EDUCATION_POINTS;
            reasons.push("Similar education background".to_string());
        } else if same(&mine.job_category, &theirs.job_category) {
            total += JOB_CATEGORY_POINTS;
            reasons.push("Work in the same field".to_string());
        }

        let completion = candidate.completion_percentage();
        if completion >= 95 {
            total += VERY_COMPLETE_POINTS;
            reasons.push("Highly detailed profile".to_string());
        } else if completion >= 85 {
            total += COMPLETE_POINTS;
            reasons.push("Well-completed profile".to_string());
        }

        Compatibility {
            score: total.min(100) as u8,
            reasons,
        }
    }
}

/// Exact equality on fields present on both sides
#[inline]
fn same(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}
