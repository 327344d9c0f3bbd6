pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgContentStore};
pub use redis::create_redis_client;
pub use redis::{CacheKey, CacheWriterHandle, LeaderboardCache};
