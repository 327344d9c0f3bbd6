use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    models::{ContentItem, ContentPayload, DiscussionLeaderboardEntry},
    services::ranking::{self, Feature, FeatureCounts, RankCandidate, WeightTable},
};

/// Title reported for discussions posted without one
pub const UNTITLED_DISCUSSION: &str = "Untitled Discussion";

struct DiscussionDisplay {
    circle_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    title: String,
}

fn display_title(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNTITLED_DISCUSSION.to_string(),
    }
}

/// Ranks discussions by hotness
///
/// Comments and likes are the engagement features, creation time is the
/// decay reference.
pub fn build_discussion_leaderboard(
    items: &[ContentItem],
    weights: &WeightTable,
    now: DateTime<Utc>,
    k: usize,
    age_floor_hours: f64,
) -> Vec<DiscussionLeaderboardEntry> {
    let candidates: Vec<RankCandidate<DiscussionDisplay>> = items
        .iter()
        .filter_map(|item| match &item.payload {
            ContentPayload::Discussion { title } => Some(RankCandidate {
                id: item.id,
                reference_at: item.created_at,
                features: FeatureCounts::new()
                    .with(Feature::Comments, item.comments.len() as u64)
                    .with(Feature::Likes, item.likes.len() as u64),
                payload: DiscussionDisplay {
                    circle_id: item.circle_id,
                    created_by: item.created_by,
                    created_at: item.created_at,
                    title: display_title(title.as_deref()),
                },
            }),
            _ => None,
        })
        .collect();

    tracing::debug!(candidates = candidates.len(), "Ranking discussions");

    ranking::rank(candidates, weights, now, k, age_floor_hours)
        .into_iter()
        .map(|ranked| DiscussionLeaderboardEntry {
            id: ranked.id,
            circle_id: ranked.payload.circle_id,
            created_by: ranked.payload.created_by,
            created_at: ranked.payload.created_at,
            title: ranked.payload.title,
            comments: ranked.features.get(Feature::Comments),
            likes: ranked.features.get(Feature::Likes),
            hot_score: ranked.hot_score,
        })
        .collect()
}
