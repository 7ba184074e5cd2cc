//! Orchestrator configuration.

use std::env;

/// Default maximum number of ids per bulk indexing request.
const DEFAULT_MAX_BULK_IDS: usize = 100;

/// Default page size used by the full reindex task.
const DEFAULT_REINDEX_PAGE_SIZE: usize = 100;

/// Default pattern configuration names must match.
const DEFAULT_CONFIG_NAME_PATTERN: &str = "^[a-zA-Z0-9_-]+$";

/// Configuration for the indexing service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum number of ids accepted by a single bulk request.
    pub max_bulk_ids: usize,
    /// Number of documents fetched per page during a full reindex.
    pub reindex_page_size: usize,
    /// Regular expression configuration names must match.
    pub config_name_pattern: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_bulk_ids: DEFAULT_MAX_BULK_IDS,
            reindex_page_size: DEFAULT_REINDEX_PAGE_SIZE,
            config_name_pattern: DEFAULT_CONFIG_NAME_PATTERN.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `INDEXING_MAX_BULK_IDS`: bulk request id limit (default: 100)
    /// - `INDEXING_REINDEX_PAGE_SIZE`: reindex page size (default: 100)
    /// - `INDEXING_CONFIG_NAME_PATTERN`: configuration name pattern
    ///   (default: `^[a-zA-Z0-9_-]+$`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_bulk_ids: env_usize("INDEXING_MAX_BULK_IDS", defaults.max_bulk_ids),
            reindex_page_size: env_usize("INDEXING_REINDEX_PAGE_SIZE", defaults.reindex_page_size),
            config_name_pattern: env::var("INDEXING_CONFIG_NAME_PATTERN")
                .unwrap_or(defaults.config_name_pattern),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_bulk_ids, 100);
        assert_eq!(config.reindex_page_size, 100);
        assert_eq!(config.config_name_pattern, "^[a-zA-Z0-9_-]+$");
    }
}
