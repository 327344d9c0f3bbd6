use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

/// Redis key of a cached leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    PollLeaderboard { limit: usize },
    DiscussionLeaderboard { limit: usize },
    CircleLeaderboard { limit: usize },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::PollLeaderboard { limit } => write!(f, "trending:polls:{}", limit),
            CacheKey::DiscussionLeaderboard { limit } => {
                write!(f, "trending:discussions:{}", limit)
            }
            CacheKey::CircleLeaderboard { limit } => write!(f, "trending:circles:{}", limit),
        }
    }
}

/// Opens a Redis client; no connection is made until first use
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

struct PendingWrite {
    key: String,
    json: String,
    ttl_secs: u64,
}

/// Leaderboard cache with write-behind stores
///
/// Reads go straight to Redis. Writes are queued and applied by a background
/// task so a slow Redis never delays a response.
#[derive(Clone)]
pub struct LeaderboardCache {
    client: Client,
    writes: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer after draining queued writes
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Leaderboard cache writer asked to stop");
    }
}

impl LeaderboardCache {
    /// Spawns the writer task; must be called inside a tokio runtime
    pub fn spawn(client: Client) -> (Self, CacheWriterHandle) {
        let (writes, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(Self::run_writer(client.clone(), write_rx, shutdown_rx));

        (Self { client, writes }, CacheWriterHandle { shutdown_tx })
    }

    async fn run_writer(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Leaderboard cache writer started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    Self::apply(&client, write).await;
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut drained = 0usize;
                    while let Some(write) = write_rx.recv().await {
                        Self::apply(&client, write).await;
                        drained += 1;
                    }
                    tracing::info!(drained, "Leaderboard cache writer stopped");
                    break;
                }
            }
        }
    }

    async fn apply(client: &Client, write: PendingWrite) {
        let result = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(&write.key, write.json, write.ttl_secs).await?;
            Ok::<(), AppError>(())
        }
        .await;

        if let Err(e) = result {
            tracing::error!(error = %e, key = %write.key, "Failed to store leaderboard in cache");
        }
    }

    /// Reads and deserializes a cached value, `None` on a miss
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    /// Queues a value for storage and returns immediately
    pub fn put_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl_secs: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            json,
            ttl_secs,
        };

        if self.writes.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer is gone, skipping write");
        }
    }
}
