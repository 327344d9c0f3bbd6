use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    models::{ContentItem, ContentPayload, PollLeaderboardEntry},
    services::ranking::{self, Feature, FeatureCounts, RankCandidate, WeightTable},
};

struct PollDisplay {
    circle_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    question: String,
}

/// Ranks polls by hotness
///
/// Votes and comments are the engagement features, creation time is the
/// decay reference. Non-poll items in `items` are skipped.
pub fn build_poll_leaderboard(
    items: &[ContentItem],
    weights: &WeightTable,
    now: DateTime<Utc>,
    k: usize,
    age_floor_hours: f64,
) -> Vec<PollLeaderboardEntry> {
    let candidates: Vec<RankCandidate<PollDisplay>> = items
        .iter()
        .filter_map(|item| match &item.payload {
            ContentPayload::Poll {
                question,
                voted_users,
            } => Some(RankCandidate {
                id: item.id,
                reference_at: item.created_at,
                features: FeatureCounts::new()
                    .with(Feature::Votes, voted_users.len() as u64)
                    .with(Feature::Comments, item.comments.len() as u64),
                payload: PollDisplay {
                    circle_id: item.circle_id,
                    created_by: item.created_by,
                    created_at: item.created_at,
                    question: question.clone(),
                },
            }),
            _ => None,
        })
        .collect();

    tracing::debug!(candidates = candidates.len(), "Ranking polls");

    ranking::rank(candidates, weights, now, k, age_floor_hours)
        .into_iter()
        .map(|ranked| PollLeaderboardEntry {
            id: ranked.id,
            circle_id: ranked.payload.circle_id,
            created_by: ranked.payload.created_by,
            created_at: ranked.payload.created_at,
            question: ranked.payload.question,
            votes: ranked.features.get(Feature::Votes),
            comments: ranked.features.get(Feature::Comments),
            hot_score: ranked.hot_score,
        })
        .collect()
}
