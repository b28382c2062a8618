use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

fn default_cache_ttl_minutes() -> i64 {
    60
}

fn default_detail_window_hours() -> i64 {
    48
}

fn default_fetch_page_size() -> usize {
    500
}

fn default_usage_window_days() -> i64 {
    7
}

/// Tuning knobs for the analytics services. Every field has a serving
/// default; a missing file yields `AnalyticsConfig::default()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Cache entry lifetime. One fixed TTL covers the whole store.
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: i64,

    /// Bounded window for full-detail session reconstruction; older
    /// sessions are served from the skeleton scan.
    #[serde(default = "default_detail_window_hours")]
    pub detail_window_hours: i64,

    /// Page size for cursor-paginated repository drains (view builds and
    /// export alike).
    #[serde(default = "default_fetch_page_size")]
    pub fetch_page_size: usize,

    /// Trailing window for the quick usage overview.
    #[serde(default = "default_usage_window_days")]
    pub usage_window_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: default_cache_ttl_minutes(),
            detail_window_hours: default_detail_window_hours(),
            fetch_page_size: default_fetch_page_size(),
            usage_window_days: default_usage_window_days(),
        }
    }
}

impl AnalyticsConfig {
    /// TTL to open the cache store with.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cache_ttl_minutes)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: AnalyticsConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.cache_ttl_minutes, 60);
        assert_eq!(config.detail_window_hours, 48);
        assert_eq!(config.fetch_page_size, 500);
        assert_eq!(config.usage_window_days, 7);
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("beacon.toml");

        let mut config = AnalyticsConfig::default();
        config.cache_ttl_minutes = 15;
        config.fetch_page_size = 100;
        config.save_to(&config_path)?;

        let loaded = AnalyticsConfig::load_from(&config_path)?;
        assert_eq!(loaded.cache_ttl_minutes, 15);
        assert_eq!(loaded.fetch_page_size, 100);
        assert_eq!(loaded.detail_window_hours, 48);

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = AnalyticsConfig::load_from(&temp_dir.path().join("missing.toml"))?;
        assert_eq!(config.fetch_page_size, 500);
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("beacon.toml");
        std::fs::write(&config_path, "cache_ttl_minutes = 5\n")?;

        let loaded = AnalyticsConfig::load_from(&config_path)?;
        assert_eq!(loaded.cache_ttl_minutes, 5);
        assert_eq!(loaded.fetch_page_size, 500);
        Ok(())
    }
}
