//! Executor configuration.

/// Largest number of subrequests in one Composite Batch call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

/// Configuration for the [`Executor`](crate::Executor).
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Upper bound on requests per transport call. The transport's own limit
    /// applies too; the smaller wins.
    pub max_batch_size: usize,
    /// Number of chunks allowed in flight at once.
    pub max_concurrent_batches: usize,
    /// Follow `nextRecordsUrl` until a query is done.
    pub follow_query_pages: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_concurrent_batches: 1,
            follow_query_pages: true,
        }
    }
}

impl ExecutorConfig {
    /// Create a new executor config builder.
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }
}

/// Builder for ExecutorConfig.
#[derive(Debug, Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Set the maximum number of requests per transport call. Zero is treated as one.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.config.max_batch_size = size.max(1);
        self
    }

    /// Set how many chunks may be dispatched concurrently. Zero is treated as one.
    pub fn with_max_concurrent_batches(mut self, limit: usize) -> Self {
        self.config.max_concurrent_batches = limit.max(1);
        self
    }

    /// Enable or disable fetching further query pages.
    pub fn with_query_paging(mut self, enabled: bool) -> Self {
        self.config.follow_query_pages = enabled;
        self
    }

    /// Build the executor configuration.
    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}
