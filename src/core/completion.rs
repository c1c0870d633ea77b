use serde::Serialize;

use crate::models::domain::{is_filled, Profile, ProfileDetails};

/// Completion percentage at which a profile may send interests
pub const READY_THRESHOLD: u8 = 80;

/// Bio must be longer than this to earn its points
const MIN_BIO_CHARS: usize = 20;

const PARTNER_PREFERENCE_FIELDS: f64 = 6.0;

/// A nudge for one missing field, tagged with an opaque UI anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionTip {
    pub field: &'static str,
    pub message: &'static str,
    pub anchor: &'static str,
}

/// One scored field: weight, fill check, and the tip shown when it is empty
struct ScoredField {
    field: &'static str,
    points: f64,
    filled: fn(&ProfileDetails) -> bool,
    message: &'static str,
    anchor: &'static str,
}

const FIELDS: &[ScoredField] = &[
    // Core identity: 45
    ScoredField { field: "gender", points: 5.0, filled: |d| is_filled(&d.gender), message: "Tell others your gender", anchor: "basic-info" },
    // Always present once the profile validates, kept so the weights sum to 100.
    ScoredField { field: "dateOfBirth", points: 5.0, filled: |_| true, message: "Add your date of birth", anchor: "basic-info" },
    ScoredField { field: "bio", points: 10.0, filled: |d| d.bio.trim().chars().count() > MIN_BIO_CHARS, message: "Write a bio of more than 20 characters", anchor: "about-me" },
    ScoredField { field: "location", points: 5.0, filled: |d| !d.location.trim().is_empty(), message: "Add where you live", anchor: "basic-info" },
    ScoredField { field: "photo", points: 10.0, filled: |d| is_filled(&d.photo_url), message: "Upload a profile photo", anchor: "photos" },
    ScoredField { field: "religion", points: 5.0, filled: |d| is_filled(&d.religion), message: "Add your religion", anchor: "background" },
    ScoredField { field: "motherTongue", points: 5.0, filled: |d| is_filled(&d.mother_tongue), message: "Add your mother tongue", anchor: "background" },
    // Vitals: 10
    ScoredField { field: "height", points: 5.0, filled: |d| d.height_cm.is_some(), message: "Add your height", anchor: "vitals" },
    ScoredField { field: "caste", points: 5.0, filled: |d| is_filled(&d.caste), message: "Add your caste or community", anchor: "vitals" },
    // Lifestyle: 15
    ScoredField { field: "jobStatus", points: 3.0, filled: |d| is_filled(&d.job_status), message: "Add your job status", anchor: "lifestyle" },
    ScoredField { field: "maritalStatus", points: 3.0, filled: |d| is_filled(&d.marital_status), message: "Add your marital status", anchor: "lifestyle" },
    ScoredField { field: "diet", points: 3.0, filled: |d| is_filled(&d.diet), message: "Share your diet preference", anchor: "lifestyle" },
    ScoredField { field: "smoking", points: 3.0, filled: |d| is_filled(&d.smoking), message: "Share your smoking habits", anchor: "lifestyle" },
    ScoredField { field: "drinking", points: 3.0, filled: |d| is_filled(&d.drinking), message: "Share your drinking habits", anchor: "lifestyle" },
    // Family: 20
    ScoredField { field: "fatherOccupation", points: 5.0, filled: |d| is_filled(&d.father_occupation), message: "Add your father's occupation", anchor: "family" },
    ScoredField { field: "motherOccupation", points: 5.0, filled: |d| is_filled(&d.mother_occupation), message: "Add your mother's occupation", anchor: "family" },
    ScoredField { field: "siblings", points: 5.0, filled: |d| is_filled(&d.siblings), message: "Tell us about your siblings", anchor: "family" },
    ScoredField { field: "familyType", points: 5.0, filled: |d| is_filled(&d.family_type), message: "Add your family type", anchor: "family" },
    // Career: 5
    ScoredField { field: "education", points: 1.25, filled: |d| is_filled(&d.education), message: "Add your education", anchor: "career" },
    ScoredField { field: "profession", points: 1.25, filled: |d| is_filled(&d.profession), message: "Add your profession", anchor: "career" },
    ScoredField { field: "incomeRange", points: 1.25, filled: |d| is_filled(&d.income_range), message: "Add your income range", anchor: "career" },
    ScoredField { field: "jobCategory", points: 1.25, filled: |d| is_filled(&d.job_category), message: "Add your job category", anchor: "career" },
];

/// Partner preferences are worth 5 points, pro rata over six fields
const PARTNER_POINTS: f64 = 5.0;

/// Weighted completion percentage (0-100) of the profile's details
pub fn calculate_completion(details: &ProfileDetails) -> u8 {
    let fields: f64 = FIELDS
        .iter()
        .filter(|f| (f.filled)(details))
        .map(|f| f.points)
        .sum();

    let preferences =
        details.partner.filled_count() as f64 / PARTNER_PREFERENCE_FIELDS * PARTNER_POINTS;

    (fields + preferences).round().min(100.0) as u8
}

/// Nudges for every scored field that is still empty
pub fn missing_tips(details: &ProfileDetails) -> Vec<CompletionTip> {
    let mut tips: Vec<CompletionTip> = FIELDS
        .iter()
        .filter(|f| !(f.filled)(details))
        .map(|f| CompletionTip {
            field: f.field,
            message: f.message,
            anchor: f.anchor,
        })
        .collect();

    if details.partner.filled_count() < PARTNER_PREFERENCE_FIELDS as usize {
        tips.push(CompletionTip {
            field: "partnerPreferences",
            message: "Describe what you are looking for in a partner",
            anchor: "partner-preferences",
        });
    }

    tips
}

impl Profile {
    pub fn completion_percentage(&self) -> u8 {
        calculate_completion(&self.details)
    }

    pub fn is_ready_for_interactions(&self) -> bool {
        self.completion_percentage() >= READY_THRESHOLD
    }

    pub fn missing_tips(&self) -> Vec<CompletionTip> {
        missing_tips(&self.details)
    }
}
