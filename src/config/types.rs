use serde::Deserialize;

/// Main configuration structure for Catalog-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    pub storage: StorageConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub api: Option<ApiConfig>,
}

/// Scheduler (dispatch loop) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Spacing between scheduler ticks (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Global cap on concurrently running site workers
    #[serde(rename = "max-concurrent-workers")]
    pub max_concurrent_workers: u32,
}

/// Per-site crawl behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of pagination pages fetched concurrently per batch
    #[serde(rename = "page-batch-size")]
    pub page_batch_size: u32,

    /// Settle delay after a page is rendered, before links are read (milliseconds)
    #[serde(rename = "inter-page-delay-ms")]
    pub inter_page_delay_ms: u64,

    /// Navigation timeout per page (milliseconds)
    #[serde(rename = "page-timeout-ms", default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Query parameter carrying the page number
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,

    /// How long a worker waits before re-reading a missing or unpopulated job (milliseconds)
    #[serde(rename = "job-retry-interval-ms", default = "default_job_retry_interval_ms")]
    pub job_retry_interval_ms: u64,

    /// How many times a worker waits for its job before giving up its slot
    #[serde(rename = "job-wait-attempts", default = "default_job_wait_attempts")]
    pub job_wait_attempts: u32,

    /// Upper bound on categories crawled per job; all categories when absent
    #[serde(rename = "max-categories-per-job", default)]
    pub max_categories_per_job: Option<u32>,

    /// Path fragments that mark an anchor as a product link
    #[serde(
        rename = "product-path-markers",
        default = "default_product_path_markers"
    )]
    pub product_path_markers: Vec<String>,
}

/// Category discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Whether the in-process discovery loop runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Spacing between discovery passes (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_discovery_interval_ms")]
    pub poll_interval_ms: u64,

    /// Substrings that disqualify a candidate category link
    #[serde(rename = "words-to-ignore", default)]
    pub words_to_ignore: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: default_discovery_interval_ms(),
            words_to_ignore: Vec::new(),
        }
    }
}

/// Backing store selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per domain in separate directories
    Filesystem,
    /// Embedded SQLite database
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Root directory for the filesystem backend
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Path to the SQLite database file (sqlite backend only)
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Producer API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_page_timeout_ms() -> u64 {
    120_000
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_job_retry_interval_ms() -> u64 {
    10_000
}

fn default_job_wait_attempts() -> u32 {
    30
}

fn default_product_path_markers() -> Vec<String> {
    vec![
        "/products/".to_string(),
        "/items/".to_string(),
        "/p/".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

fn default_discovery_interval_ms() -> u64 {
    10_000
}

fn default_backend() -> StorageBackend {
    StorageBackend::Filesystem
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    5001
}
