//! Catalog record types.

use serde::{Deserialize, Serialize};

/// One catalog title with its content attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Display title, title-cased. Lookups use the normalized key instead.
    pub title: String,
    pub genre: String,
    pub tags: String,
    pub actors: String,
    pub viewer_rating: String,
    /// Comma-delimited language list as it appears in the source.
    pub languages: String,
    /// Quality score; missing values are filled with the configured default.
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Catalog-wide summary counts.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogStats {
    pub titles: usize,
    pub languages: usize,
    pub genres: usize,
}
