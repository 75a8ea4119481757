use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cache::engine::LruCache;

use super::cli::parser::MemcliteConfig;
use super::stats::Stats;

/// Shared server state: the cache engine, the counters and the shutdown
/// token, bundled so binaries and tests construct the same world.
pub struct ServerContext {
    shutdown: CancellationToken,
    store: Arc<LruCache>,
    stats: Arc<Stats>,
}

impl ServerContext {
    pub fn get_default_server_context(config: &MemcliteConfig) -> Self {
        Self {
            shutdown: CancellationToken::new(),
            store: Arc::new(LruCache::new(config.memory_limit, config.shards)),
            stats: Arc::new(Stats::new()),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn store(&self) -> Arc<LruCache> {
        self.store.clone()
    }

    pub fn stats(&self) -> Arc<Stats> {
        self.stats.clone()
    }
}
