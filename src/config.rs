use crate::error::ConfigError;
use clap::Parser;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Parser, Debug, Clone)]
#[command(name = "http-benchmark")]
#[command(about = "HTTP GET load-testing harness", long_about = None)]
pub struct Config {
    /// Target URL (http:// is assumed when no scheme is given)
    #[arg(short = 's', long = "url", env = "TARGET_URL")]
    pub url: String,

    /// Number of concurrent workers
    #[arg(short = 'c', long, env = "CONCURRENCY", default_value = "10")]
    pub concurrency: usize,

    /// Total number of requests
    #[arg(short = 'n', long, env = "REQUESTS", default_value = "100")]
    pub requests: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub timeout_secs: u64,

    /// Redirect hops to follow (0 disables redirects)
    #[arg(long, env = "MAX_REDIRECTS", default_value = "10")]
    pub max_redirects: usize,

    /// Also print the report as JSON
    #[arg(long, env = "JSON_OUTPUT")]
    pub json: bool,

    /// Also print the latency distribution
    #[arg(long, env = "SHOW_HISTOGRAM")]
    pub histogram: bool,
}

/// Validated parameters consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub target: String,
    pub concurrency: usize,
    pub requests: usize,
    pub request_timeout: Duration,
    pub max_redirects: usize,
}

impl Config {
    pub fn validate(&self) -> Result<RunConfig, ConfigError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.requests == 0 {
            return Err(ConfigError::ZeroRequests);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(RunConfig {
            target: normalize_url(url),
            concurrency: self.concurrency,
            requests: self.requests,
            request_timeout: Duration::from_secs(self.timeout_secs),
            max_redirects: self.max_redirects,
        })
    }
}

/// Prepends `http://` unless the target already names a scheme.
pub fn normalize_url(target: &str) -> String {
    if target.contains("://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    }
}
