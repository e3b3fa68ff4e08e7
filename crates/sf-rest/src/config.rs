//! Transport configuration.

use std::time::Duration;

/// Configuration for the [`CompositeBatchTransport`](crate::CompositeBatchTransport).
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// API version, e.g. "62.0".
    pub api_version: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Pool idle timeout.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// User-Agent header value.
    pub user_agent: String,
    /// Accept gzip/deflate responses.
    pub accept_compressed: bool,
    /// Whether to enable request/response tracing.
    pub enable_tracing: bool,
    /// Ask the service to stop at the first failing subrequest.
    pub halt_on_error: bool,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            api_version: crate::DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: crate::USER_AGENT.to_string(),
            accept_compressed: true,
            enable_tracing: true,
            halt_on_error: false,
        }
    }
}

impl RestConfig {
    /// Create a new REST config builder.
    pub fn builder() -> RestConfigBuilder {
        RestConfigBuilder::default()
    }
}

/// Builder for RestConfig.
#[derive(Debug, Default)]
pub struct RestConfigBuilder {
    config: RestConfig,
}

impl RestConfigBuilder {
    /// Set the API version (e.g., "62.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set pool idle timeout.
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    pub fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Set custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Accept compressed responses.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.accept_compressed = enabled;
        self
    }

    /// Enable or disable request/response tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    /// Stop processing a batch at its first failing subrequest.
    pub fn with_halt_on_error(mut self, halt: bool) -> Self {
        self.config.halt_on_error = halt;
        self
    }

    /// Build the REST configuration.
    pub fn build(self) -> RestConfig {
        self.config
    }
}
