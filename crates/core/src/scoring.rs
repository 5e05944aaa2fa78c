//! Tag-overlap scoring.
//!
//! Each activity starts at zero and gains [`TAG_MATCH_WEIGHT`] when its tags
//! contain the student's learning style, and again when they contain the
//! student's disability. Zero-score activities are dropped; the rest are
//! sorted by descending score with ties left in catalog order.

use edumatch_db::entities::{activity, student};
use serde::Serialize;

use crate::tags::{normalize_tag, TagSet};

/// Weight added per matching student attribute.
pub const TAG_MATCH_WEIGHT: f64 = 0.5;

/// The student attributes that take part in matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerProfile {
    /// Normalized disability tag.
    pub disability: Option<String>,
    /// Normalized learning style tag.
    pub learning_style: Option<String>,
}

impl LearnerProfile {
    /// Build a profile, normalizing both attributes.
    #[must_use]
    pub fn new(disability: Option<&str>, learning_style: Option<&str>) -> Self {
        Self {
            disability: disability.and_then(normalize_tag),
            learning_style: learning_style.and_then(normalize_tag),
        }
    }
}

impl From<&student::Model> for LearnerProfile {
    fn from(student: &student::Model) -> Self {
        Self::new(student.disability.as_deref(), student.learning_style.as_deref())
    }
}

/// An activity as seen by the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Activity id.
    pub activity_id: String,
    /// Tags matched against learner profiles.
    pub tags: TagSet,
}

impl From<&activity::Model> for CatalogEntry {
    fn from(activity: &activity::Model) -> Self {
        Self {
            activity_id: activity.id.clone(),
            tags: TagSet::from_json(&activity.tags),
        }
    }
}

/// One ranked (activity, score) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMatch {
    /// Activity id.
    pub activity_id: String,
    /// Sum of matched attribute weights.
    pub score: f64,
}

fn tag_score(profile: &LearnerProfile, tags: &TagSet) -> f64 {
    [profile.learning_style.as_deref(), profile.disability.as_deref()]
        .into_iter()
        .flatten()
        .filter(|tag| tags.contains(tag))
        .map(|_| TAG_MATCH_WEIGHT)
        .sum()
}

/// Rank the catalog for one student.
///
/// Recomputed on every call; nothing is persisted.
#[must_use]
pub fn rank(profile: &LearnerProfile, catalog: &[CatalogEntry]) -> Vec<ActivityMatch> {
    let mut matches: Vec<ActivityMatch> = catalog
        .iter()
        .filter_map(|entry| {
            let score = tag_score(profile, &entry.tags);
            (score > 0.0).then(|| ActivityMatch {
                activity_id: entry.activity_id.clone(),
                score,
            })
        })
        .collect();

    // stable: equal scores keep catalog order
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}
