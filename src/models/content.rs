use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use crate::error::AppError;

/// Discriminator of a circle post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Poll,
    Discussion,
    Recommendation,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Poll => "poll",
            ContentKind::Discussion => "discussion",
            ContentKind::Recommendation => "recommendation",
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "poll" => Ok(ContentKind::Poll),
            "discussion" => Ok(ContentKind::Discussion),
            "recommendation" => Ok(ContentKind::Recommendation),
            other => Err(AppError::Internal(format!("Unknown content kind: {}", other))),
        }
    }
}

/// Kind-specific fields of a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentPayload {
    Poll {
        question: String,
        /// Users who cast a vote, one entry per vote
        voted_users: Vec<Uuid>,
    },
    Discussion {
        title: Option<String>,
    },
    Recommendation,
}

/// A comment attached to a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author: Uuid,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A post inside a circle
///
/// Created and mutated by the rest of the application; the ranking engine
/// only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub circle_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: ContentPayload,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self.payload {
            ContentPayload::Poll { .. } => ContentKind::Poll,
            ContentPayload::Discussion { .. } => ContentKind::Discussion,
            ContentPayload::Recommendation => ContentKind::Recommendation,
        }
    }

    /// Most recent event on this post: its creation or any of its comments
    pub fn latest_activity(&self) -> DateTime<Utc> {
        self.comments
            .iter()
            .map(|c| c.uploaded_at)
            .fold(self.created_at, |latest, ts| latest.max(ts))
    }
}

/// Display metadata for a circle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleInfo {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}
