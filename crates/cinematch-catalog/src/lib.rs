//! Cinematch Catalog — CSV loading, attribute extraction, feature soup.

pub mod extract;
pub mod loader;
pub mod soup;
pub mod types;

pub use loader::Catalog;
pub use soup::{normalize, soup, title_key};
pub use types::{CatalogRecord, CatalogStats};
