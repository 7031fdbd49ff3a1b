pub mod memory;
pub mod postgres;
pub mod redis;
mod store;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use store::{tie_break, ContentStore, Counter, ItemOrder, ItemQuery};

#[cfg(test)]
pub use store::MockContentStore;
