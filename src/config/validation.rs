use crate::config::types::{
    ApiConfig, Config, CrawlerConfig, DiscoveryConfig, SchedulerConfig, StorageBackend,
    StorageConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_crawler_config(&config.crawler)?;
    validate_discovery_config(&config.discovery)?;
    validate_storage_config(&config.storage)?;
    validate_user_agent_config(&config.user_agent)?;
    if let Some(api) = &config.api {
        validate_api_config(api)?;
    }
    Ok(())
}

fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.poll_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "scheduler poll_interval_ms must be >= 100ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    if config.max_concurrent_workers < 1 || config.max_concurrent_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_workers must be between 1 and 64, got {}",
            config.max_concurrent_workers
        )));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.page_batch_size < 1 || config.page_batch_size > 50 {
        return Err(ConfigError::Validation(format!(
            "page_batch_size must be between 1 and 50, got {}",
            config.page_batch_size
        )));
    }

    if config.page_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "page_timeout_ms must be >= 1000ms, got {}ms",
            config.page_timeout_ms
        )));
    }

    if config.page_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    if config.job_wait_attempts < 1 {
        return Err(ConfigError::Validation(
            "job_wait_attempts must be >= 1".to_string(),
        ));
    }

    if config.max_categories_per_job == Some(0) {
        return Err(ConfigError::Validation(
            "max_categories_per_job must be >= 1 when set".to_string(),
        ));
    }

    if config.product_path_markers.is_empty() {
        return Err(ConfigError::Validation(
            "product_path_markers must contain at least one marker".to_string(),
        ));
    }

    if config.product_path_markers.iter().any(|m| m.is_empty()) {
        return Err(ConfigError::Validation(
            "product_path_markers cannot contain empty markers".to_string(),
        ));
    }

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.enabled && config.poll_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "discovery poll_interval_ms must be >= 100ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    if config.words_to_ignore.iter().any(|w| w.is_empty()) {
        // An empty word would disqualify every link
        return Err(ConfigError::Validation(
            "words_to_ignore cannot contain empty words".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    if config.backend == StorageBackend::Sqlite
        && config.database_path.as_deref().map_or(true, str::is_empty)
    {
        return Err(ConfigError::Validation(
            "database_path is required for the sqlite backend".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    if config.host.is_empty() {
        return Err(ConfigError::Validation(
            "api host cannot be empty".to_string(),
        ));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation(
            "api port must be non-zero".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ConfigError::Validation(format!("Invalid email format: '{}'", email)))?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler_config() -> CrawlerConfig {
        CrawlerConfig {
            page_batch_size: 5,
            inter_page_delay_ms: 0,
            page_timeout_ms: 30_000,
            page_param: "page".to_string(),
            job_retry_interval_ms: 1000,
            job_wait_attempts: 3,
            max_categories_per_job: None,
            product_path_markers: vec!["/products/".to_string()],
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_batch_size_bounds() {
        let mut config = crawler_config();
        assert!(validate_crawler_config(&config).is_ok());

        config.page_batch_size = 0;
        assert!(validate_crawler_config(&config).is_err());

        config.page_batch_size = 51;
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_zero_category_bound_rejected() {
        let mut config = crawler_config();
        config.max_categories_per_job = Some(0);
        assert!(validate_crawler_config(&config).is_err());

        config.max_categories_per_job = Some(3);
        assert!(validate_crawler_config(&config).is_ok());
    }

    #[test]
    fn test_empty_marker_rejected() {
        let mut config = crawler_config();
        config.product_path_markers.push(String::new());
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_scheduler_bounds() {
        let config = SchedulerConfig {
            poll_interval_ms: 50,
            max_concurrent_workers: 4,
        };
        assert!(validate_scheduler_config(&config).is_err());

        let config = SchedulerConfig {
            poll_interval_ms: 1000,
            max_concurrent_workers: 0,
        };
        assert!(validate_scheduler_config(&config).is_err());
    }

    #[test]
    fn test_sqlite_requires_database_path() {
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            data_dir: "./data".to_string(),
            database_path: None,
        };
        assert!(validate_storage_config(&config).is_err());

        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            data_dir: "./data".to_string(),
            database_path: Some("./data/crawler.db".to_string()),
        };
        assert!(validate_storage_config(&config).is_ok());
    }

    #[test]
    fn test_empty_ignore_word_rejected() {
        let config = DiscoveryConfig {
            enabled: true,
            poll_interval_ms: 1000,
            words_to_ignore: vec!["faqs".to_string(), String::new()],
        };
        assert!(validate_discovery_config(&config).is_err());
    }
}
