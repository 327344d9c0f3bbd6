use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Number of entries a leaderboard returns when the caller does not ask
pub const DEFAULT_TOP_K: usize = 5;

/// Smallest age (in hours) any item can have: one minute
pub const DEFAULT_AGE_FLOOR_HOURS: f64 = 1.0 / 60.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Engagement signals the builders feed into the ranker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Votes,
    Comments,
    Likes,
    Posts,
}

/// Raw engagement counts of a single candidate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounts(BTreeMap<Feature, u64>);

impl FeatureCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, feature: Feature, count: u64) -> Self {
        self.0.insert(feature, count);
        self
    }

    /// Count for a feature, zero when it was never recorded
    pub fn get(&self, feature: Feature) -> u64 {
        self.0.get(&feature).copied().unwrap_or(0)
    }
}

/// Weight per feature; only weighted features contribute to engagement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable(BTreeMap<Feature, f64>);

impl WeightTable {
    /// Builds a table, rejecting negative or non-finite weights
    pub fn new(weights: impl IntoIterator<Item = (Feature, f64)>) -> AppResult<Self> {
        let mut table = BTreeMap::new();
        for (feature, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::InvalidInput(format!(
                    "Weight for {:?} must be a non-negative number, got {}",
                    feature, weight
                )));
            }
            table.insert(feature, weight);
        }
        Ok(Self(table))
    }

    pub fn weight(&self, feature: Feature) -> f64 {
        self.0.get(&feature).copied().unwrap_or(0.0)
    }
}

/// An item waiting to be scored
#[derive(Debug, Clone)]
pub struct RankCandidate<T> {
    pub id: Uuid,
    /// Creation time for posts, last activity for circles
    pub reference_at: DateTime<Utc>,
    pub features: FeatureCounts,
    pub payload: T,
}

/// A scored candidate
#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub id: Uuid,
    pub reference_at: DateTime<Utc>,
    pub features: FeatureCounts,
    pub hot_score: f64,
    pub payload: T,
}

/// Hours between `reference_at` and `now`, never below `floor_hours`
///
/// Timestamps in the future (clock skew) clamp to the floor as well.
pub fn age_hours(reference_at: DateTime<Utc>, now: DateTime<Utc>, floor_hours: f64) -> f64 {
    let raw = (now - reference_at).num_milliseconds() as f64 / MILLIS_PER_HOUR;
    raw.max(floor_hours)
}

/// Weighted sum of the counts over every weighted feature
pub fn engagement(features: &FeatureCounts, weights: &WeightTable) -> f64 {
    weights
        .0
        .iter()
        .map(|(feature, weight)| weight * features.get(*feature) as f64)
        .sum()
}

/// Engagement divided by clamped age
pub fn hot_score(
    features: &FeatureCounts,
    weights: &WeightTable,
    reference_at: DateTime<Utc>,
    now: DateTime<Utc>,
    floor_hours: f64,
) -> f64 {
    engagement(features, weights) / age_hours(reference_at, now, floor_hours)
}

/// Scores every candidate and returns the best `k`
///
/// Ordering is by score descending, then by the more recent reference time,
/// then by id ascending, so equal inputs always produce the same list.
pub fn rank<T>(
    candidates: Vec<RankCandidate<T>>,
    weights: &WeightTable,
    now: DateTime<Utc>,
    k: usize,
    floor_hours: f64,
) -> Vec<Ranked<T>> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    // A non-positive floor would allow division by zero
    let floor_hours = if floor_hours > 0.0 {
        floor_hours
    } else {
        DEFAULT_AGE_FLOOR_HOURS
    };

    let mut scored: Vec<Ranked<T>> = candidates
        .into_iter()
        .map(|candidate| Ranked {
            hot_score: hot_score(
                &candidate.features,
                weights,
                candidate.reference_at,
                now,
                floor_hours,
            ),
            id: candidate.id,
            reference_at: candidate.reference_at,
            features: candidate.features,
            payload: candidate.payload,
        })
        .collect();

    scored.sort_by(compare_ranked);
    scored.truncate(k);
    scored
}

fn compare_ranked<T>(a: &Ranked<T>, b: &Ranked<T>) -> Ordering {
    b.hot_score
        .total_cmp(&a.hot_score)
        .then_with(|| b.reference_at.cmp(&a.reference_at))
        .then_with(|| a.id.cmp(&b.id))
}
