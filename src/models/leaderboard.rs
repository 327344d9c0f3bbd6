use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ranked list with the instant it was computed for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Leaderboard<T> {
    pub generated_at: DateTime<Utc>,
    /// Oldest creation time eligible for this board
    pub window_start: DateTime<Utc>,
    pub entries: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollLeaderboardEntry {
    pub id: Uuid,
    pub circle_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub question: String,
    pub votes: u64,
    pub comments: u64,
    pub hot_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscussionLeaderboardEntry {
    pub id: Uuid,
    pub circle_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub comments: u64,
    pub likes: u64,
    pub hot_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircleLeaderboardEntry {
    pub circle_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub total_posts: u64,
    pub total_polls: u64,
    pub total_discussions: u64,
    pub total_recommendations: u64,
    pub total_comments: u64,
    pub total_likes: u64,
    pub last_activity: DateTime<Utc>,
    pub hot_score: f64,
}
