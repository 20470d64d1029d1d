//! Catalog loading — CSV parsing, title normalization, deduplication.

use std::collections::HashSet;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info};

use cinematch_core::{EngineConfig, Error, Result};

use crate::extract;
use crate::soup::title_key;
use crate::types::{CatalogRecord, CatalogStats};

/// Headers that must be present in the catalog source.
const REQUIRED_COLUMNS: [&str; 7] = [
    "Title",
    "Languages",
    "Genre",
    "Tags",
    "IMDb Score",
    "Actors",
    "View Rating",
];

/// Positions of the catalog columns in the source file.
///
/// Columns are resolved by header name so the source column order is
/// irrelevant. "View Rating" is surfaced as `viewer_rating` internally.
struct ColumnMap {
    title: usize,
    languages: usize,
    genre: usize,
    tags: usize,
    score: usize,
    actors: usize,
    viewer_rating: usize,
    image: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };

        Ok(Self {
            title: find(REQUIRED_COLUMNS[0])?,
            languages: find(REQUIRED_COLUMNS[1])?,
            genre: find(REQUIRED_COLUMNS[2])?,
            tags: find(REQUIRED_COLUMNS[3])?,
            score: find(REQUIRED_COLUMNS[4])?,
            actors: find(REQUIRED_COLUMNS[5])?,
            viewer_rating: find(REQUIRED_COLUMNS[6])?,
            image: headers.iter().position(|h| h == "Image"),
        })
    }
}

/// The loaded catalog: one record per normalized title plus the sorted
/// display-title list. Read-only after load.
#[derive(Debug)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
    titles: Vec<String>,
}

impl Catalog {
    /// Load the catalog from a CSV file.
    ///
    /// Rows are read as raw bytes and decoded lossily, so non-UTF-8
    /// encodings (the source data is latin-1) load without error.
    /// Duplicate normalized titles keep the first record seen.
    pub fn load(path: &Path, config: &EngineConfig) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| Error::Load(format!("cannot open {}: {}", path.display(), e)))?;

        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(|e| Error::Load(format!("cannot read headers: {}", e)))?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();
        let columns = ColumnMap::resolve(&headers)?;

        let mut records = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut duplicates = 0usize;

        for row in reader.byte_records() {
            let row = row.map_err(|e| Error::Load(format!("malformed row: {}", e)))?;
            let field = |idx: usize| -> String {
                row.get(idx)
                    .map(|b| String::from_utf8_lossy(b).trim().to_string())
                    .unwrap_or_default()
            };

            let raw_title = field(columns.title);
            if raw_title.is_empty() {
                debug!("Skipping row without a title");
                continue;
            }

            let title = title_case(&raw_title);
            if !seen.insert(title_key(&title)) {
                duplicates += 1;
                continue;
            }

            // NaN and unparseable scores both fall back to the default;
            // the ranking step requires a total order.
            let score = field(columns.score)
                .parse::<f32>()
                .ok()
                .filter(|s| s.is_finite())
                .unwrap_or(config.default_score);

            records.push(CatalogRecord {
                title,
                genre: field(columns.genre),
                tags: field(columns.tags),
                actors: field(columns.actors),
                viewer_rating: field(columns.viewer_rating),
                languages: field(columns.languages),
                score,
                image_url: columns.image.map(|i| field(i)).filter(|url| !url.is_empty()),
            });
        }

        let mut titles: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
        titles.sort();

        info!(
            "Loaded {} titles from {} ({} duplicates dropped)",
            records.len(),
            path.display(),
            duplicates
        );

        Ok(Self { records, titles })
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    /// Sorted display titles, one per record.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Sorted distinct language tokens across the catalog.
    pub fn languages(&self) -> Vec<String> {
        extract::languages(&self.records)
    }

    pub fn stats(&self) -> CatalogStats {
        extract::stats(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Title-case a display title: uppercase each letter that follows a
/// non-letter, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Title,Languages,Genre,Tags,IMDb Score,Actors,View Rating,Image\n";

    fn write_csv(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    fn test_config() -> EngineConfig {
        EngineConfig::new("unused.csv")
    }

    #[test]
    fn test_load_basic() {
        let csv = format!(
            "{HEADER}The Matrix,English,Action,Sci-Fi,8.7,Keanu Reeves,R,http://img/matrix.jpg\n"
        );
        let file = write_csv(csv.as_bytes());
        let catalog = Catalog::load(file.path(), &test_config()).unwrap();

        assert_eq!(catalog.len(), 1);
        let record = &catalog.records()[0];
        assert_eq!(record.title, "The Matrix");
        assert_eq!(record.genre, "Action");
        assert_eq!(record.viewer_rating, "R");
        assert_eq!(record.score, 8.7);
        assert_eq!(record.image_url.as_deref(), Some("http://img/matrix.jpg"));
    }

    #[test]
    fn test_title_cased_and_sorted() {
        let csv = format!(
            "{HEADER}the dark knight,English,Action,,9.0,Christian Bale,PG-13,\n\
             ALPHA,English,Drama,,7.0,Someone,PG,\n"
        );
        let file = write_csv(csv.as_bytes());
        let catalog = Catalog::load(file.path(), &test_config()).unwrap();

        assert_eq!(catalog.titles(), ["Alpha", "The Dark Knight"]);
    }

    #[test]
    fn test_duplicate_titles_keep_first() {
        let csv = format!(
            "{HEADER}Inception,English,Action,,8.8,Leonardo DiCaprio,PG-13,\n\
             INCEPTION,French,Drama,,5.0,Nobody,R,\n"
        );
        let file = write_csv(csv.as_bytes());
        let catalog = Catalog::load(file.path(), &test_config()).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.records()[0].genre, "Action");
        assert_eq!(catalog.records()[0].score, 8.8);
    }

    #[test]
    fn test_missing_score_gets_default() {
        let csv = format!(
            "{HEADER}Alpha,English,Action,,,Someone,PG,\n\
             Beta,English,Action,,NaN,Someone,PG,\n"
        );
        let file = write_csv(csv.as_bytes());
        let catalog = Catalog::load(file.path(), &test_config()).unwrap();

        assert_eq!(catalog.records()[0].score, 6.6);
        assert_eq!(catalog.records()[1].score, 6.6);
    }

    #[test]
    fn test_missing_column_fails() {
        let csv = "Title,Languages,Genre,Tags,Actors,View Rating\nAlpha,English,Action,,Someone,PG\n";
        let file = write_csv(csv.as_bytes());
        let err = Catalog::load(file.path(), &test_config()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "IMDb Score"));
    }

    #[test]
    fn test_unreadable_file_fails() {
        let err = Catalog::load(Path::new("/does/not/exist.csv"), &test_config()).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn test_non_utf8_bytes_load_lossily() {
        // "Amélie" with latin-1 0xE9 — invalid UTF-8, must not abort the load.
        let mut csv = Vec::new();
        csv.extend_from_slice(HEADER.as_bytes());
        csv.extend_from_slice(b"Am\xE9lie,French,Comedy,,8.3,Audrey Tautou,R,\n");
        let file = write_csv(&csv);
        let catalog = Catalog::load(file.path(), &test_config()).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.records()[0].languages, "French");
    }

    #[test]
    fn test_missing_image_is_none() {
        let csv = format!("{HEADER}Alpha,English,Action,,7.0,Someone,PG,\n");
        let file = write_csv(csv.as_bytes());
        let catalog = Catalog::load(file.path(), &test_config()).unwrap();
        assert!(catalog.records()[0].image_url.is_none());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("the dark knight"), "The Dark Knight");
        assert_eq!(title_case("OCEAN'S ELEVEN"), "Ocean'S Eleven");
        assert_eq!(title_case("3 idiots"), "3 Idiots");
    }
}
