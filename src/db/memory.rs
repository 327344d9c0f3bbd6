use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CircleInfo, ContentItem},
    services::store::{CircleDirectory, ContentQuery, ContentStore},
};

/// Content store kept entirely in memory
///
/// Used by the integration tests and for running the service without a
/// database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    items: Vec<ContentItem>,
    circles: HashMap<Uuid, CircleInfo>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_item(&self, item: ContentItem) {
        self.inner.write().await.items.push(item);
    }

    pub async fn insert_circle(&self, circle: CircleInfo) {
        self.inner.write().await.circles.insert(circle.id, circle);
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_content(&self, query: ContentQuery) -> AppResult<Vec<ContentItem>> {
        let inner = self.inner.read().await;
        Ok(inner
            .items
            .iter()
            .filter(|item| query.matches(item))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl CircleDirectory for MemoryStore {
    async fn circle_details(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, CircleInfo>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.circles.get(id).map(|c| (*id, c.clone())))
            .collect())
    }
}
