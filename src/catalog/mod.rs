//! Song catalog loading and identifier-keyed lookup.
//!
//! The catalog is the JSON array written by the playlist fetcher:
//!
//! ```json
//! [
//!   { "id": 1, "title": "Intro", "artist": "Band", "timestamps": { "main": [12.5] } },
//!   { "id": 2, "title": "Outro", "artist": "Band" }
//! ]
//! ```
//!
//! Only the first element of `timestamps.main` matters: it is the crop start
//! offset in seconds. Everything else in a record is informational.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// One raw record as it appears in the catalog file.
///
/// `id` is optional here so that a missing identifier can be reported as an
/// [`Error::InvalidCatalog`] instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub timestamps: Option<Timestamps>,
}

/// Timestamp lists attached to a record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Timestamps {
    #[serde(default)]
    pub main: Option<Vec<TimestampValue>>,
}

/// A timestamp may be written as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimestampValue {
    Seconds(f64),
    Text(String),
}

impl TimestampValue {
    /// Seconds as a finite, non-negative value, if it is one.
    pub fn as_seconds(&self) -> Option<f64> {
        let secs = match self {
            TimestampValue::Seconds(s) => *s,
            TimestampValue::Text(t) => t.trim().parse::<f64>().ok()?,
        };
        (secs.is_finite() && secs >= 0.0).then_some(secs)
    }
}

impl CatalogEntry {
    /// Convenience constructor, mostly for tests and fixtures.
    pub fn new(id: u64, start_offset_secs: Option<f64>) -> Self {
        Self {
            id: Some(id),
            timestamps: start_offset_secs.map(|s| Timestamps {
                main: Some(vec![TimestampValue::Seconds(s)]),
            }),
            ..Default::default()
        }
    }

    /// Resolve the crop start offset from the first `main` timestamp.
    ///
    /// An unusable first value (negative, NaN, garbage text) counts as
    /// "no timestamp" and is logged.
    fn start_offset_secs(&self) -> Option<f64> {
        let first = self.timestamps.as_ref()?.main.as_ref()?.first()?;
        let secs = first.as_seconds();
        if secs.is_none() {
            tracing::warn!(
                "Ignoring unusable timestamp {:?} for song {:?}",
                first,
                self.id
            );
        }
        secs
    }
}

/// A validated catalog record.
#[derive(Debug, Clone, PartialEq)]
pub struct SongRecord {
    pub id: u64,
    /// Crop start in seconds; `None` when no crop point is known.
    pub start_offset_secs: Option<f64>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl SongRecord {
    /// `Artist - Title` for log lines, with placeholders for missing fields.
    pub fn describe(&self) -> String {
        format!(
            "{} - {}",
            self.artist.as_deref().unwrap_or("unknown artist"),
            self.title.as_deref().unwrap_or("untitled")
        )
    }
}

/// Identifier-keyed lookup over the catalog. Read-only after [`CatalogIndex::build`].
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    records: HashMap<u64, SongRecord>,
    duplicates: usize,
}

impl CatalogIndex {
    /// Build the index from raw entries in catalog order.
    ///
    /// When an identifier repeats, the later record replaces the earlier one
    /// and a warning is logged for every collision.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCatalog`] if any entry has no `id`.
    pub fn build(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self> {
        let mut index = CatalogIndex::default();

        for (position, entry) in entries.into_iter().enumerate() {
            let id = entry.id.ok_or_else(|| {
                Error::invalid_catalog(format!("record at position {} has no id", position))
            })?;

            let record = SongRecord {
                id,
                start_offset_secs: entry.start_offset_secs(),
                title: entry.title,
                artist: entry.artist,
            };

            if let Some(previous) = index.records.insert(id, record) {
                tracing::warn!(
                    "Duplicate catalog id {} at position {}: replacing earlier record ({})",
                    id,
                    position,
                    previous.describe()
                );
                index.duplicates += 1;
            }
        }

        Ok(index)
    }

    /// Look up a record by identifier.
    pub fn lookup(&self, id: u64) -> Option<&SongRecord> {
        self.records.get(&id)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// How many records were replaced by a later record with the same id.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of records that carry a crop offset.
    pub fn timestamped(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.start_offset_secs.is_some())
            .count()
    }
}

/// Parse catalog JSON into an index.
pub fn parse(json: &str) -> Result<CatalogIndex> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json)
        .map_err(|e| Error::invalid_catalog(format!("malformed JSON: {}", e)))?;
    CatalogIndex::build(entries)
}

/// Read and parse the catalog file at `path`.
pub fn load(path: &Path) -> Result<CatalogIndex> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        Error::invalid_catalog(format!("failed to read {}: {}", path.display(), e))
    })?;
    let index = parse(&json)?;

    tracing::info!(
        "Loaded catalog {:?}: {} songs, {} with timestamps",
        path,
        index.len(),
        index.timestamped()
    );

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_fetcher_output() {
        let json = r#"[
            {"id": 1, "title": "Intro", "artist": "Band", "timestamps": {"main": [12.5, 40.0]}},
            {"id": 2, "title": "Outro", "artist": "Band"}
        ]"#;

        let index = parse(json).unwrap();

        assert_eq!(index.len(), 2);
        let intro = index.lookup(1).unwrap();
        assert_eq!(intro.start_offset_secs, Some(12.5));
        assert_eq!(intro.title.as_deref(), Some("Intro"));
        assert_eq!(index.lookup(2).unwrap().start_offset_secs, None);
        assert!(index.lookup(3).is_none());
    }

    #[test]
    fn test_missing_id_is_invalid_catalog() {
        let json = r#"[{"id": 1}, {"title": "No id"}]"#;

        let err = parse(json).unwrap_err();

        assert!(matches!(err, Error::InvalidCatalog(_)));
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn test_malformed_json_is_invalid_catalog() {
        assert!(matches!(
            parse("{not json").unwrap_err(),
            Error::InvalidCatalog(_)
        ));
        assert!(matches!(
            parse(r#"[{"id": -4}]"#).unwrap_err(),
            Error::InvalidCatalog(_)
        ));
    }

    #[test]
    fn test_string_and_null_timestamps() {
        let json = r#"[
            {"id": 1, "timestamps": {"main": ["7.25"]}},
            {"id": 2, "timestamps": {"main": []}},
            {"id": 3, "timestamps": null},
            {"id": 4, "timestamps": {"main": null}},
            {"id": 5, "timestamps": {"main": ["soon"]}},
            {"id": 6, "timestamps": {"main": [-3.0]}}
        ]"#;

        let index = parse(json).unwrap();

        assert_eq!(index.lookup(1).unwrap().start_offset_secs, Some(7.25));
        for id in 2..=6 {
            assert_eq!(index.lookup(id).unwrap().start_offset_secs, None, "id {}", id);
        }
        assert_eq!(index.timestamped(), 1);
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let index = CatalogIndex::build(vec![
            CatalogEntry::new(9, Some(1.0)),
            CatalogEntry::new(9, Some(2.0)),
            CatalogEntry::new(10, None),
        ])
        .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.duplicates(), 1);
        assert_eq!(index.lookup(9).unwrap().start_offset_secs, Some(2.0));
    }

    #[test]
    fn test_describe_uses_artist_and_title() {
        let json = r#"[
            {"id": 1, "title": "Intro", "artist": "Band"},
            {"id": 2, "artist": "Band"},
            {"id": 3}
        ]"#;

        let index = parse(json).unwrap();

        assert_eq!(index.lookup(1).unwrap().describe(), "Band - Intro");
        assert_eq!(index.lookup(2).unwrap().describe(), "Band - untitled");
        assert_eq!(
            index.lookup(3).unwrap().describe(),
            "unknown artist - untitled"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("songs.json");
        std::fs::write(&path, r#"[{"id": 3, "timestamps": {"main": [1.5]}}]"#).unwrap();

        let index = load(&path).unwrap();
        assert_eq!(index.lookup(3).unwrap().start_offset_secs, Some(1.5));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/nonexistent/songs.json")).unwrap_err();
        assert!(matches!(err, Error::InvalidCatalog(_)));
    }
}
