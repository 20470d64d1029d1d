//! Derived catalog attributes — language set and summary counts.

use std::collections::BTreeSet;

use crate::types::{CatalogRecord, CatalogStats};

/// Distinct language tokens across all records.
///
/// Splits each record's comma-delimited language field, trims tokens,
/// and returns the sorted union. Empty fields contribute nothing.
pub fn languages(records: &[CatalogRecord]) -> Vec<String> {
    let mut set = BTreeSet::new();
    for record in records {
        for token in record.languages.split(',') {
            let token = token.trim();
            if !token.is_empty() {
                set.insert(token.to_string());
            }
        }
    }
    set.into_iter().collect()
}

/// Summary counts over the loaded catalog.
pub fn stats(records: &[CatalogRecord]) -> CatalogStats {
    let genres: BTreeSet<&str> = records
        .iter()
        .map(|r| r.genre.as_str())
        .filter(|g| !g.is_empty())
        .collect();

    CatalogStats {
        titles: records.len(),
        languages: languages(records).len(),
        genres: genres.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, genre: &str, languages: &str) -> CatalogRecord {
        CatalogRecord {
            title: title.into(),
            genre: genre.into(),
            tags: String::new(),
            actors: String::new(),
            viewer_rating: String::new(),
            languages: languages.into(),
            score: 6.6,
            image_url: None,
        }
    }

    #[test]
    fn test_languages_sorted_deduped() {
        let records = vec![
            record("A", "Action", "English, Hindi"),
            record("B", "Drama", "Hindi,Spanish"),
            record("C", "Drama", ""),
        ];
        assert_eq!(languages(&records), vec!["English", "Hindi", "Spanish"]);
    }

    #[test]
    fn test_languages_trims_tokens() {
        let records = vec![record("A", "Action", " French ,  German ")];
        assert_eq!(languages(&records), vec!["French", "German"]);
    }

    #[test]
    fn test_stats_counts() {
        let records = vec![
            record("A", "Action", "English"),
            record("B", "Action", "Hindi"),
            record("C", "Drama", "English, Korean"),
        ];
        let s = stats(&records);
        assert_eq!(s.titles, 3);
        assert_eq!(s.languages, 3);
        assert_eq!(s.genres, 2);
    }
}
