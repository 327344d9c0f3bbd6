use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CircleInfo, Comment, ContentItem, ContentKind, ContentPayload},
    services::store::{CircleDirectory, ContentQuery, ContentStore},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(Debug, FromRow)]
struct ContentRow {
    id: Uuid,
    circle_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    kind: String,
    question: Option<String>,
    title: Option<String>,
    voted_users: Vec<Uuid>,
    likes: Vec<Uuid>,
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    item_id: Uuid,
    author_id: Uuid,
    body: String,
    uploaded_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CircleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl ContentRow {
    fn into_item(self, comments: Vec<Comment>) -> AppResult<ContentItem> {
        let payload = match self.kind.parse::<ContentKind>()? {
            ContentKind::Poll => ContentPayload::Poll {
                question: self.question.unwrap_or_default(),
                voted_users: self.voted_users,
            },
            ContentKind::Discussion => ContentPayload::Discussion { title: self.title },
            ContentKind::Recommendation => ContentPayload::Recommendation,
        };

        Ok(ContentItem {
            id: self.id,
            circle_id: self.circle_id,
            created_by: self.created_by,
            created_at: self.created_at,
            payload,
            likes: self.likes,
            comments,
        })
    }
}

/// Content store backed by the application's PostgreSQL schema
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_comments(&self, item_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<Comment>>> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<CommentRow> = sqlx::query_as(
            r#"
            SELECT id, item_id, author_id, body, uploaded_at
            FROM comments
            WHERE item_id = ANY($1)
            ORDER BY uploaded_at
            "#,
        )
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_item: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in rows {
            by_item.entry(row.item_id).or_default().push(Comment {
                id: row.id,
                author: row.author_id,
                content: row.body,
                uploaded_at: row.uploaded_at,
            });
        }

        Ok(by_item)
    }
}

#[async_trait::async_trait]
impl ContentStore for PgContentStore {
    async fn fetch_content(&self, query: ContentQuery) -> AppResult<Vec<ContentItem>> {
        let rows: Vec<ContentRow> = sqlx::query_as(
            r#"
            SELECT
                i.id,
                i.circle_id,
                i.created_by,
                i.created_at,
                i.kind,
                i.question,
                i.title,
                ARRAY(SELECT v.user_id FROM poll_votes v WHERE v.item_id = i.id) AS voted_users,
                ARRAY(SELECT l.user_id FROM content_likes l WHERE l.item_id = i.id) AS likes
            FROM content_items i
            WHERE i.created_at >= $1
              AND ($2::TEXT IS NULL OR i.kind = $2)
            "#,
        )
        .bind(query.since)
        .bind(query.kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;

        let item_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut comments = self.fetch_comments(&item_ids).await?;

        tracing::debug!(
            kind = ?query.kind,
            since = %query.since,
            item_count = rows.len(),
            "Fetched content snapshot"
        );

        rows.into_iter()
            .map(|row| {
                let item_comments = comments.remove(&row.id).unwrap_or_default();
                row.into_item(item_comments)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl CircleDirectory for PgContentStore {
    async fn circle_details(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, CircleInfo>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<CircleRow> = sqlx::query_as(
            r#"
            SELECT id, name, description
            FROM circles
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    CircleInfo {
                        id: row.id,
                        name: row.name,
                        description: row.description,
                    },
                )
            })
            .collect())
    }
}
