use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::{
    cached,
    config::{BoardSettings, LeaderboardSettings},
    db::{CacheKey, LeaderboardCache},
    error::AppResult,
    models::{
        CircleLeaderboardEntry, ContentKind, DiscussionLeaderboardEntry, Leaderboard,
        PollLeaderboardEntry,
    },
    services::{
        circles, discussions, polls,
        store::{CircleDirectory, ContentQuery, ContentStore},
    },
};

/// Entry point for the three trending leaderboards
///
/// Each call takes one snapshot from the content store, ranks it in memory
/// and returns at most `limit` entries. Nothing is retried: store failures
/// reach the caller unchanged.
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn ContentStore>,
    circles: Arc<dyn CircleDirectory>,
    settings: LeaderboardSettings,
    cache: Option<LeaderboardCache>,
}

impl LeaderboardService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        circles: Arc<dyn CircleDirectory>,
        settings: LeaderboardSettings,
    ) -> Self {
        Self {
            store,
            circles,
            settings,
            cache: None,
        }
    }

    /// Serves repeated requests from Redis for `cache_ttl_secs`
    pub fn with_cache(mut self, cache: LeaderboardCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(&self) -> &LeaderboardSettings {
        &self.settings
    }

    pub async fn polls(&self, limit: Option<usize>) -> AppResult<Leaderboard<PollLeaderboardEntry>> {
        let limit = self.settings.effective_limit(limit);
        if limit == 0 {
            return Ok(empty_board(&self.settings.polls, Utc::now()));
        }
        match &self.cache {
            Some(cache) => Ok(cached!(
                cache,
                CacheKey::PollLeaderboard { limit },
                self.settings.cache_ttl_secs,
                self.polls_at(Utc::now(), limit)
            )),
            None => self.polls_at(Utc::now(), limit).await,
        }
    }

    pub async fn discussions(
        &self,
        limit: Option<usize>,
    ) -> AppResult<Leaderboard<DiscussionLeaderboardEntry>> {
        let limit = self.settings.effective_limit(limit);
        if limit == 0 {
            return Ok(empty_board(&self.settings.discussions, Utc::now()));
        }
        match &self.cache {
            Some(cache) => Ok(cached!(
                cache,
                CacheKey::DiscussionLeaderboard { limit },
                self.settings.cache_ttl_secs,
                self.discussions_at(Utc::now(), limit)
            )),
            None => self.discussions_at(Utc::now(), limit).await,
        }
    }

    pub async fn circles(
        &self,
        limit: Option<usize>,
    ) -> AppResult<Leaderboard<CircleLeaderboardEntry>> {
        let limit = self.settings.effective_limit(limit);
        if limit == 0 {
            return Ok(empty_board(&self.settings.circles, Utc::now()));
        }
        match &self.cache {
            Some(cache) => Ok(cached!(
                cache,
                CacheKey::CircleLeaderboard { limit },
                self.settings.cache_ttl_secs,
                self.circles_at(Utc::now(), limit)
            )),
            None => self.circles_at(Utc::now(), limit).await,
        }
    }

    /// Poll leaderboard as of `now`, bypassing the cache
    pub async fn polls_at(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Leaderboard<PollLeaderboardEntry>> {
        let start = Instant::now();
        let board = &self.settings.polls;
        let window_start = board.lookback.window_start(now);

        let items = self
            .store
            .fetch_content(ContentQuery::of_kind(ContentKind::Poll, window_start))
            .await?;

        let entries = polls::build_poll_leaderboard(
            &items,
            &board.weights,
            now,
            limit,
            self.settings.age_floor_hours,
        );

        tracing::info!(
            item_count = items.len(),
            entry_count = entries.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Built poll leaderboard"
        );

        Ok(Leaderboard {
            generated_at: now,
            window_start,
            entries,
        })
    }

    /// Discussion leaderboard as of `now`, bypassing the cache
    pub async fn discussions_at(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Leaderboard<DiscussionLeaderboardEntry>> {
        let start = Instant::now();
        let board = &self.settings.discussions;
        let window_start = board.lookback.window_start(now);

        let items = self
            .store
            .fetch_content(ContentQuery::of_kind(ContentKind::Discussion, window_start))
            .await?;

        let entries = discussions::build_discussion_leaderboard(
            &items,
            &board.weights,
            now,
            limit,
            self.settings.age_floor_hours,
        );

        tracing::info!(
            item_count = items.len(),
            entry_count = entries.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Built discussion leaderboard"
        );

        Ok(Leaderboard {
            generated_at: now,
            window_start,
            entries,
        })
    }

    /// Circle leaderboard as of `now`, bypassing the cache
    ///
    /// Metadata is looked up only for the circles that made the cut.
    pub async fn circles_at(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Leaderboard<CircleLeaderboardEntry>> {
        let start = Instant::now();
        let board = &self.settings.circles;
        let window_start = board.lookback.window_start(now);

        let items = self
            .store
            .fetch_content(ContentQuery::any_kind(window_start))
            .await?;

        let ranked = circles::rank_circles(
            &items,
            &board.weights,
            now,
            limit,
            self.settings.age_floor_hours,
        );

        let entries = if ranked.is_empty() {
            Vec::new()
        } else {
            let ids: Vec<Uuid> = ranked.iter().map(|r| r.id).collect();
            let details = self.circles.circle_details(&ids).await?;
            circles::decorate_circles(ranked, &details)
        };

        tracing::info!(
            item_count = items.len(),
            entry_count = entries.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Built circle leaderboard"
        );

        Ok(Leaderboard {
            generated_at: now,
            window_start,
            entries,
        })
    }
}

/// A board with no entries; a zero limit never touches the store or cache
fn empty_board<T>(board: &BoardSettings, now: DateTime<Utc>) -> Leaderboard<T> {
    Leaderboard {
        generated_at: now,
        window_start: board.lookback.window_start(now),
        entries: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::AppError;
    use crate::models::{CircleInfo, Comment, ContentItem, ContentPayload};
    use crate::services::store::{MockCircleDirectory, MockContentStore};
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
    }

    fn settings() -> LeaderboardSettings {
        Config::default().leaderboard_settings().unwrap()
    }

    fn service(store: MockContentStore, directory: MockCircleDirectory) -> LeaderboardService {
        LeaderboardService::new(Arc::new(store), Arc::new(directory), settings())
    }

    fn poll(circle_id: Uuid, hours_ago: i64, votes: usize, comments: usize) -> ContentItem {
        let created_at = now() - Duration::hours(hours_ago);
        ContentItem {
            id: Uuid::new_v4(),
            circle_id,
            created_by: Uuid::new_v4(),
            created_at,
            payload: ContentPayload::Poll {
                question: "Best heist movie?".to_string(),
                voted_users: (0..votes).map(|_| Uuid::new_v4()).collect(),
            },
            likes: vec![],
            comments: (0..comments)
                .map(|_| Comment {
                    id: Uuid::new_v4(),
                    author: Uuid::new_v4(),
                    content: "Ocean's Eleven, easily".to_string(),
                    uploaded_at: created_at,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_polls_query_uses_kind_and_thirty_day_window() {
        let circle = Uuid::new_v4();
        let items = vec![poll(circle, 2, 10, 2), poll(circle, 20, 40, 0)];
        let expected_first = items[0].id;

        let mut store = MockContentStore::new();
        store
            .expect_fetch_content()
            .withf(|q| {
                q.kind == Some(ContentKind::Poll) && q.since == now() - Duration::days(30)
            })
            .times(1)
            .returning(move |_| Ok(items.clone()));

        let board = service(store, MockCircleDirectory::new())
            .polls_at(now(), 5)
            .await
            .unwrap();

        assert_eq!(board.generated_at, now());
        assert_eq!(board.window_start, now() - Duration::days(30));
        assert_eq!(board.entries.len(), 2);
        assert_eq!(board.entries[0].id, expected_first);
        assert!((board.entries[0].hot_score - 10.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_discussions_query_filters_kind() {
        let mut store = MockContentStore::new();
        store
            .expect_fetch_content()
            .withf(|q| q.kind == Some(ContentKind::Discussion))
            .times(1)
            .returning(|_| Ok(vec![]));

        let board = service(store, MockCircleDirectory::new())
            .discussions_at(now(), 5)
            .await
            .unwrap();
        assert!(board.entries.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockContentStore::new();
        store
            .expect_fetch_content()
            .times(1)
            .returning(|_| Err(AppError::StoreUnavailable("connection reset".to_string())));

        let result = service(store, MockCircleDirectory::new())
            .polls_at(now(), 5)
            .await;
        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_circles_fetch_every_kind_and_join_metadata() {
        let circle = Uuid::new_v4();
        let items = vec![poll(circle, 3, 1, 1)];

        let mut store = MockContentStore::new();
        store
            .expect_fetch_content()
            .withf(|q| {
                q.kind.is_none() && q.since == Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()
            })
            .times(1)
            .returning(move |_| Ok(items.clone()));

        let mut directory = MockCircleDirectory::new();
        directory
            .expect_circle_details()
            .withf(move |ids| ids.len() == 1 && ids[0] == circle)
            .times(1)
            .returning(move |_| {
                let mut details = HashMap::new();
                details.insert(
                    circle,
                    CircleInfo {
                        id: circle,
                        name: "Film Noir Society".to_string(),
                        description: None,
                    },
                );
                Ok(details)
            });

        let board = service(store, directory).circles_at(now(), 5).await.unwrap();

        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].name, "Film Noir Society");
        assert_eq!(board.entries[0].total_polls, 1);
        assert_eq!(board.entries[0].total_comments, 1);
    }

    #[tokio::test]
    async fn test_empty_circle_window_skips_directory() {
        let mut store = MockContentStore::new();
        store.expect_fetch_content().returning(|_| Ok(vec![]));

        let mut directory = MockCircleDirectory::new();
        directory.expect_circle_details().times(0);

        let board = service(store, directory).circles_at(now(), 5).await.unwrap();
        assert!(board.entries.is_empty());
    }

    #[test]
    fn test_limit_is_capped_without_cache() {
        let circle = Uuid::new_v4();
        let items: Vec<ContentItem> = (0..60).map(|i| poll(circle, 1 + i, 1, 0)).collect();

        let mut store = MockContentStore::new();
        store
            .expect_fetch_content()
            .returning(move |_| Ok(items.clone()));

        let service = service(store, MockCircleDirectory::new());
        let board = tokio_test::block_on(service.polls(Some(500))).unwrap();
        assert_eq!(board.entries.len(), 50);

        let board = tokio_test::block_on(service.polls(Some(0))).unwrap();
        assert!(board.entries.is_empty());
    }

    #[tokio::test]
    async fn test_zero_limit_skips_store() {
        let mut store = MockContentStore::new();
        store.expect_fetch_content().times(0);
        let mut directory = MockCircleDirectory::new();
        directory.expect_circle_details().times(0);

        let service = service(store, directory);
        assert!(service.polls(Some(0)).await.unwrap().entries.is_empty());
        assert!(service.discussions(Some(0)).await.unwrap().entries.is_empty());
        assert!(service.circles(Some(0)).await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_cache_falls_back_to_store() {
        let circle = Uuid::new_v4();
        let items = vec![poll(circle, 2, 10, 2), poll(circle, 20, 40, 0)];

        let mut store = MockContentStore::new();
        store
            .expect_fetch_content()
            .withf(|q| q.kind == Some(ContentKind::Poll))
            .times(1)
            .returning(move |_| Ok(items.clone()));

        // Nothing listens on port 1
        let client = crate::db::create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = LeaderboardCache::spawn(client);

        let service = service(store, MockCircleDirectory::new()).with_cache(cache);
        let board = service.polls(None).await.unwrap();
        assert_eq!(board.entries.len(), 2);

        handle.shutdown().await;
    }
}
