//! Feature soup composition.
//!
//! Each record's genre, tags, actors, and viewer rating are normalized
//! (lowercased, whitespace stripped) and joined into one "soup" document,
//! the unit of vectorization. All four fields contribute equally.

use crate::types::CatalogRecord;

/// Lowercase a field and strip all whitespace.
///
/// Multi-word values collapse into single tokens ("Brad Pitt" →
/// "bradpitt") so that the vectorizer treats them as one term.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Lookup key for a title — same normalization as the soup fields.
pub fn title_key(title: &str) -> String {
    normalize(title)
}

/// Build the combined feature document for one record.
///
/// Field separators are kept even when a field is empty so adjacent
/// fields never merge into a spurious token.
pub fn soup(record: &CatalogRecord) -> String {
    format!(
        "{} {} {} {}",
        normalize(&record.genre),
        normalize(&record.tags),
        normalize(&record.actors),
        normalize(&record.viewer_rating),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(genre: &str, tags: &str, actors: &str, rating: &str) -> CatalogRecord {
        CatalogRecord {
            title: "Test".into(),
            genre: genre.into(),
            tags: tags.into(),
            actors: actors.into(),
            viewer_rating: rating.into(),
            languages: String::new(),
            score: 6.6,
            image_url: None,
        }
    }

    #[test]
    fn test_normalize_strips_whitespace_and_case() {
        assert_eq!(normalize("Brad Pitt"), "bradpitt");
        assert_eq!(normalize("  Action,  Comedy "), "action,comedy");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_title_key_matches_soup_normalization() {
        assert_eq!(title_key("The Dark Knight"), "thedarkknight");
        assert_eq!(title_key("the dark  knight"), "thedarkknight");
    }

    #[test]
    fn test_soup_field_order_and_separators() {
        let r = record("Action", "Heist", "Brad Pitt", "TV-MA");
        assert_eq!(soup(&r), "action heist bradpitt tv-ma");
    }

    #[test]
    fn test_soup_keeps_separators_for_empty_fields() {
        // An empty tags field must not merge genre and actors into one token.
        let r = record("Action", "", "Actor", "R");
        assert_eq!(soup(&r), "action  actor r");
    }
}
