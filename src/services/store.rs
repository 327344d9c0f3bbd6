//! Read-only access to circle content for the ranking engine
//!
//! The engine never writes through these traits. Failures are returned to the
//! caller unchanged; retry policy, if any, belongs to the implementation.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CircleInfo, ContentItem, ContentKind},
};

/// Filter for a content snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentQuery {
    /// `None` fetches every kind
    pub kind: Option<ContentKind>,
    /// Inclusive lower bound on `created_at`
    pub since: DateTime<Utc>,
}

impl ContentQuery {
    pub fn of_kind(kind: ContentKind, since: DateTime<Utc>) -> Self {
        Self {
            kind: Some(kind),
            since,
        }
    }

    pub fn any_kind(since: DateTime<Utc>) -> Self {
        Self { kind: None, since }
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        item.created_at >= self.since && self.kind.map_or(true, |kind| item.kind() == kind)
    }
}

/// Source of posts with their likes, votes and comments populated
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch_content(&self, query: ContentQuery) -> AppResult<Vec<ContentItem>>;
}

/// Lookup of circle names and descriptions
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CircleDirectory: Send + Sync {
    /// Circles missing from the result are simply absent from the map
    async fn circle_details(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, CircleInfo>>;
}
