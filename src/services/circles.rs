use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::{
    models::{CircleInfo, CircleLeaderboardEntry, ContentItem, ContentKind},
    services::ranking::{self, Feature, FeatureCounts, RankCandidate, Ranked, WeightTable},
};

/// Name reported for circles the directory does not know about
pub const UNKNOWN_CIRCLE: &str = "Unknown Circle";

/// Activity summary of one circle over the lookback window
#[derive(Debug, Clone, PartialEq)]
pub struct CircleRollup {
    pub circle_id: Uuid,
    pub total_posts: u64,
    pub total_polls: u64,
    pub total_discussions: u64,
    pub total_recommendations: u64,
    pub total_comments: u64,
    pub total_likes: u64,
    /// Latest post creation or comment upload anywhere in the circle
    pub last_activity: DateTime<Utc>,
}

impl CircleRollup {
    fn seed(item: &ContentItem) -> Self {
        Self {
            circle_id: item.circle_id,
            total_posts: 0,
            total_polls: 0,
            total_discussions: 0,
            total_recommendations: 0,
            total_comments: 0,
            total_likes: 0,
            last_activity: item.latest_activity(),
        }
    }

    fn absorb(&mut self, item: &ContentItem) {
        self.total_posts += 1;
        match item.kind() {
            ContentKind::Poll => self.total_polls += 1,
            ContentKind::Discussion => self.total_discussions += 1,
            ContentKind::Recommendation => self.total_recommendations += 1,
        }
        self.total_comments += item.comments.len() as u64;
        self.total_likes += item.likes.len() as u64;
        self.last_activity = self.last_activity.max(item.latest_activity());
    }

    fn features(&self) -> FeatureCounts {
        FeatureCounts::new()
            .with(Feature::Posts, self.total_posts)
            .with(Feature::Comments, self.total_comments)
            .with(Feature::Likes, self.total_likes)
    }
}

/// Groups posts of every kind by circle
///
/// Output is ordered by circle id.
pub fn rollup_circles(items: &[ContentItem]) -> Vec<CircleRollup> {
    let mut groups: BTreeMap<Uuid, CircleRollup> = BTreeMap::new();
    for item in items {
        groups
            .entry(item.circle_id)
            .or_insert_with(|| CircleRollup::seed(item))
            .absorb(item);
    }
    groups.into_values().collect()
}

/// Scores the circle rollups and keeps the best `k`
///
/// Posts, comments and likes are the engagement features; time since last
/// activity is the decay reference.
pub fn rank_circles(
    items: &[ContentItem],
    weights: &WeightTable,
    now: DateTime<Utc>,
    k: usize,
    age_floor_hours: f64,
) -> Vec<Ranked<CircleRollup>> {
    let rollups = rollup_circles(items);
    tracing::debug!(
        item_count = items.len(),
        circle_count = rollups.len(),
        "Rolled up circle activity"
    );

    let candidates = rollups
        .into_iter()
        .map(|rollup| RankCandidate {
            id: rollup.circle_id,
            reference_at: rollup.last_activity,
            features: rollup.features(),
            payload: rollup,
        })
        .collect();

    ranking::rank(candidates, weights, now, k, age_floor_hours)
}

/// Attaches display metadata to ranked circles
pub fn decorate_circles(
    ranked: Vec<Ranked<CircleRollup>>,
    details: &HashMap<Uuid, CircleInfo>,
) -> Vec<CircleLeaderboardEntry> {
    ranked
        .into_iter()
        .map(|ranked| {
            let rollup = ranked.payload;
            let (name, description) = match details.get(&rollup.circle_id) {
                Some(info) => (info.name.clone(), info.description.clone()),
                None => {
                    tracing::warn!(circle_id = %rollup.circle_id, "Circle metadata missing");
                    (UNKNOWN_CIRCLE.to_string(), None)
                }
            };

            CircleLeaderboardEntry {
                circle_id: rollup.circle_id,
                name,
                description,
                total_posts: rollup.total_posts,
                total_polls: rollup.total_polls,
                total_discussions: rollup.total_discussions,
                total_recommendations: rollup.total_recommendations,
                total_comments: rollup.total_comments,
                total_likes: rollup.total_likes,
                last_activity: rollup.last_activity,
                hot_score: ranked.hot_score,
            }
        })
        .collect()
}

/// Full circle leaderboard over an in-memory snapshot
pub fn build_circle_leaderboard(
    items: &[ContentItem],
    details: &HashMap<Uuid, CircleInfo>,
    weights: &WeightTable,
    now: DateTime<Utc>,
    k: usize,
    age_floor_hours: f64,
) -> Vec<CircleLeaderboardEntry> {
    decorate_circles(
        rank_circles(items, weights, now, k, age_floor_hours),
        details,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comment, ContentPayload};
    use crate::services::ranking::DEFAULT_AGE_FLOOR_HOURS;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
    }

    fn weights() -> WeightTable {
        WeightTable::new([
            (Feature::Posts, 5.0),
            (Feature::Comments, 2.0),
            (Feature::Likes, 1.0),
        ])
        .unwrap()
    }

    fn comments_at(times: &[DateTime<Utc>]) -> Vec<Comment> {
        times
            .iter()
            .map(|t| Comment {
                id: Uuid::new_v4(),
                author: Uuid::new_v4(),
                content: "Adding this to my watchlist".to_string(),
                uploaded_at: *t,
            })
            .collect()
    }

    fn item(
        circle_id: Uuid,
        created_at: DateTime<Utc>,
        payload: ContentPayload,
        likes: usize,
        comments: Vec<Comment>,
    ) -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            circle_id,
            created_by: Uuid::new_v4(),
            created_at,
            payload,
            likes: (0..likes).map(|_| Uuid::new_v4()).collect(),
            comments,
        }
    }

    fn poll_payload(votes: usize) -> ContentPayload {
        ContentPayload::Poll {
            question: "Which Bond?".to_string(),
            voted_users: (0..votes).map(|_| Uuid::new_v4()).collect(),
        }
    }

    #[test]
    fn test_rollup_counts_and_last_activity() {
        let circle = Uuid::new_v4();
        let poll_one_at = now() - Duration::hours(30);
        let poll_two_at = now() - Duration::hours(28);
        let discussion_at = now() - Duration::hours(26);
        let latest_comment = now() - Duration::hours(2);

        let items = vec![
            item(
                circle,
                poll_one_at,
                poll_payload(3),
                0,
                comments_at(&[poll_one_at + Duration::hours(1)]),
            ),
            item(circle, poll_two_at, poll_payload(0), 0, vec![]),
            item(
                circle,
                discussion_at,
                ContentPayload::Discussion {
                    title: Some("Villains ranked".to_string()),
                },
                2,
                comments_at(&[
                    now() - Duration::hours(10),
                    latest_comment,
                    now() - Duration::hours(6),
                    now() - Duration::hours(20),
                ]),
            ),
        ];

        let rollups = rollup_circles(&items);
        assert_eq!(rollups.len(), 1);
        let rollup = &rollups[0];
        assert_eq!(rollup.total_posts, 3);
        assert_eq!(rollup.total_polls, 2);
        assert_eq!(rollup.total_discussions, 1);
        assert_eq!(rollup.total_recommendations, 0);
        assert_eq!(rollup.total_comments, 5);
        assert_eq!(rollup.total_likes, 2);
        assert_eq!(rollup.last_activity, latest_comment);
    }

    #[test]
    fn test_last_activity_without_comments_uses_newest_post() {
        let circle = Uuid::new_v4();
        let newest = now() - Duration::hours(1);
        let items = vec![
            item(circle, now() - Duration::hours(9), ContentPayload::Recommendation, 0, vec![]),
            item(circle, newest, ContentPayload::Recommendation, 1, vec![]),
            item(circle, now() - Duration::hours(5), poll_payload(1), 0, vec![]),
        ];

        let rollups = rollup_circles(&items);
        assert_eq!(rollups[0].last_activity, newest);
        assert_eq!(rollups[0].total_recommendations, 2);
    }

    #[test]
    fn test_circles_are_grouped_separately() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let items = vec![
            item(first, now() - Duration::hours(1), poll_payload(0), 0, vec![]),
            item(second, now() - Duration::hours(1), poll_payload(0), 0, vec![]),
            item(first, now() - Duration::hours(2), ContentPayload::Recommendation, 0, vec![]),
        ];

        let rollups = rollup_circles(&items);
        assert_eq!(rollups.len(), 2);
        let first_rollup = rollups.iter().find(|r| r.circle_id == first).unwrap();
        assert_eq!(first_rollup.total_posts, 2);
    }

    #[test]
    fn test_active_circle_ranks_first_and_gets_metadata() {
        let busy = Uuid::new_v4();
        let quiet = Uuid::new_v4();
        let items = vec![
            item(
                busy,
                now() - Duration::hours(3),
                poll_payload(5),
                4,
                comments_at(&[now() - Duration::hours(1)]),
            ),
            item(busy, now() - Duration::hours(2), ContentPayload::Recommendation, 0, vec![]),
            item(quiet, now() - Duration::hours(48), ContentPayload::Recommendation, 1, vec![]),
        ];

        let mut details = HashMap::new();
        details.insert(
            busy,
            CircleInfo {
                id: busy,
                name: "Criterion Club".to_string(),
                description: Some("Arthouse picks".to_string()),
            },
        );

        let board = build_circle_leaderboard(
            &items,
            &details,
            &weights(),
            now(),
            5,
            DEFAULT_AGE_FLOOR_HOURS,
        );

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].circle_id, busy);
        assert_eq!(board[0].name, "Criterion Club");
        assert_eq!(board[0].description.as_deref(), Some("Arthouse picks"));
        // (2*5 + 1*2 + 4*1) / 1h
        assert!((board[0].hot_score - 16.0).abs() < 1e-9);
        assert_eq!(board[1].circle_id, quiet);
        assert_eq!(board[1].name, UNKNOWN_CIRCLE);
        assert_eq!(board[1].description, None);
    }

    #[test]
    fn test_empty_snapshot_yields_empty_board() {
        let board = build_circle_leaderboard(
            &[],
            &HashMap::new(),
            &weights(),
            now(),
            5,
            DEFAULT_AGE_FLOOR_HOURS,
        );
        assert!(board.is_empty());
    }
}
