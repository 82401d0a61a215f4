pub mod cache;
pub mod database;

pub use cache::{CacheKey, ResultCache, SharedCache, content_hash};
pub use database::{Database, PoolConfig, SharedDatabase};
