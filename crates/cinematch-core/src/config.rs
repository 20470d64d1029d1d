//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Quality score assigned to records whose score column is missing or
/// unparseable. Close to the catalog-wide mean; the ranking step relies
/// on every record carrying a score.
pub const DEFAULT_SCORE: f32 = 6.6;

/// Recommendations retrieved per seed title before merging.
pub const DEFAULT_TOP_K: usize = 50;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the catalog CSV file.
    pub catalog_path: PathBuf,
    /// Score substituted for missing quality scores.
    pub default_score: f32,
    /// Recommendations retrieved per seed title.
    pub top_k: usize,
}

impl EngineConfig {
    /// Create a configuration with defaults for the given catalog file.
    pub fn new(catalog_path: impl AsRef<Path>) -> Self {
        Self {
            catalog_path: catalog_path.as_ref().to_path_buf(),
            default_score: DEFAULT_SCORE,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Create configuration from environment and defaults.
    pub fn from_env(catalog_path: impl AsRef<Path>) -> Self {
        let mut config = Self::new(catalog_path);

        if let Some(k) = std::env::var("CINEMATCH_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.top_k = k;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new("catalog.csv");
        assert_eq!(config.default_score, DEFAULT_SCORE);
        assert_eq!(config.top_k, 50);
        assert_eq!(config.catalog_path, PathBuf::from("catalog.csv"));
    }
}
