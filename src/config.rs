//! Configuration Module
//!
//! Construction options for the in-memory caches, built explicitly or loaded
//! from environment variables.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CacheError, Result};
use crate::hooks::{CacheLogger, CacheTracer, Hooks};

/// Shard count used when none is configured
pub const DEFAULT_SHARD_COUNT: usize = 16;

/// Cache configuration parameters.
#[derive(Clone)]
pub struct CacheConfig {
    /// Lifetime applied when a value is stored with `Expiration::Default`, None = never expire
    pub default_expiration: Option<Duration>,
    /// Janitor sweep period, None = no janitor
    pub cleanup_interval: Option<Duration>,
    /// Number of shards, used by `ShardedCache` only
    pub shard_count: usize,
    /// Peer names attached to every traced operation
    pub attributes: Vec<String>,
    /// Receives save/load failures
    pub logger: Option<Arc<dyn CacheLogger>>,
    /// Brackets every operation with a span
    pub tracer: Option<Arc<dyn CacheTracer>>,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_EXPIRATION_MS` - Default lifetime in milliseconds, `<= 0` never expires (default: never)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Janitor interval in milliseconds, `0` disables it (default: disabled)
    /// - `CACHE_SHARD_COUNT` - Number of shards (default: 16)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let default_expiration = env::var("CACHE_DEFAULT_EXPIRATION_MS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms.unsigned_abs()));
        let cleanup_interval = env::var("CACHE_CLEANUP_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        let shard_count = env::var("CACHE_SHARD_COUNT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SHARD_COUNT);

        Self {
            default_expiration,
            cleanup_interval,
            shard_count,
            ..Self::default()
        }
    }

    // == Builder ==
    /// Sets the default lifetime. A zero duration means "never expire".
    pub fn with_default_expiration(mut self, expiration: Duration) -> Self {
        self.default_expiration = Some(expiration).filter(|d| !d.is_zero());
        self
    }

    /// Sets the janitor interval. A zero duration disables the janitor.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval).filter(|d| !d.is_zero());
        self
    }

    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn CacheLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn CacheTracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Checks the values a sharded cache depends on.
    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(CacheError::InvalidConfig(
                "shard_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn hooks(&self) -> Hooks {
        Hooks::new(
            self.logger.clone(),
            self.tracer.clone(),
            self.attributes.clone(),
        )
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_expiration: None,
            cleanup_interval: None,
            shard_count: DEFAULT_SHARD_COUNT,
            attributes: Vec::new(),
            logger: None,
            tracer: None,
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("default_expiration", &self.default_expiration)
            .field("cleanup_interval", &self.cleanup_interval)
            .field("shard_count", &self.shard_count)
            .field("attributes", &self.attributes)
            .field("logger", &self.logger.is_some())
            .field("tracer", &self.tracer.is_some())
            .finish()
    }
}
