//! Core data models for the liked-songs cleaning pipeline.
//!
//! This module contains the raw and normalized table types, the artist
//! frequency entry, and the run statistics shared by the pipeline stages.

use serde::Serialize;
use std::collections::BTreeSet;

// ============================================================================
// Column Names
// ============================================================================

pub const SONG: &str = "Song";
pub const ARTIST: &str = "Artist";
pub const ALBUM: &str = "Album";
pub const GENRES: &str = "Genres";
pub const PARENT_GENRES: &str = "Parent Genres";

/// Columns with dedicated fields on `Record`. Everything else is passthrough.
pub const KNOWN_COLUMNS: [&str; 5] = [SONG, ARTIST, ALBUM, GENRES, PARENT_GENRES];

/// Leading columns of the cleaned table; remaining input columns follow in header order.
pub const NORMALIZED_LEADING_COLUMNS: [&str; 4] = [SONG, ARTIST, GENRES, PARENT_GENRES];

// ============================================================================
// Type Aliases
// ============================================================================

/// A cell that may be missing. Empty CSV cells load as `None`.
pub type Field = Option<String>;

/// Deduplicated genre names. Ordered so serialization is canonical.
pub type GenreSet = BTreeSet<String>;

// ============================================================================
// Raw Input
// ============================================================================

/// One raw liked-song row as loaded from an export file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    pub song: Field,
    pub artist: Field, // may hold several co-artists, comma-separated
    pub album: Field,
    pub genres: Field,
    pub parent_genres: Field,
    /// Passthrough values, positionally aligned with the owning table's `passthrough`.
    pub extra: Vec<Field>,
}

/// Concatenated raw records plus the column layout they were read with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Full header order (union of all input headers, first-seen order).
    pub columns: Vec<String>,
    /// Columns not in `KNOWN_COLUMNS`, in header order.
    pub passthrough: Vec<String>,
    pub records: Vec<Record>,
}

impl RawTable {
    /// Build an empty table for the given header, splitting out passthrough columns.
    pub fn with_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let passthrough = columns
            .iter()
            .filter(|c| !KNOWN_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();
        Self {
            columns,
            passthrough,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Normalized Output
// ============================================================================

/// A cleaned record, unique by (song, artist) within its table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub song: String,
    pub artist: String, // un-split; co-artists are only separated by the aggregator
    pub album: String,
    pub genres: GenreSet,
    pub parent_genres: GenreSet,
    pub extra: Vec<Field>,
}

/// Output of the normalizer. Ordered by (song, artist).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub passthrough: Vec<String>,
    pub records: Vec<NormalizedRecord>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column layout of the cleaned table:
    /// `Song, Artist, Genres, Parent Genres`, then all other input columns in header order.
    pub fn output_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = NORMALIZED_LEADING_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect();
        out.extend(
            self.columns
                .iter()
                .filter(|c| !NORMALIZED_LEADING_COLUMNS.contains(&c.as_str()))
                .cloned(),
        );
        // Album is required, so it is always emitted even if no header named it.
        if !out.iter().any(|c| c == ALBUM) {
            out.insert(NORMALIZED_LEADING_COLUMNS.len(), ALBUM.to_string());
        }
        out
    }

    /// Turn the table back into raw records so it can be fed through the
    /// normalizer again. Empty genre sets become missing cells, matching what a
    /// write + reload round trip produces.
    pub fn to_raw(&self) -> RawTable {
        let records = self
            .records
            .iter()
            .map(|r| Record {
                song: Some(r.song.clone()),
                artist: Some(r.artist.clone()),
                album: Some(r.album.clone()),
                genres: genre_field(&r.genres),
                parent_genres: genre_field(&r.parent_genres),
                extra: r.extra.clone(),
            })
            .collect();
        RawTable {
            columns: self.columns.clone(),
            passthrough: self.passthrough.clone(),
            records,
        }
    }
}

/// Canonical text form of a genre set: members sorted and joined with `,`.
pub fn format_genres(genres: &GenreSet) -> String {
    genres.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

fn genre_field(genres: &GenreSet) -> Field {
    if genres.is_empty() {
        None
    } else {
        Some(format_genres(genres))
    }
}

// ============================================================================
// Artist Frequency
// ============================================================================

/// Number of liked songs credited to one individual artist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtistCount {
    #[serde(rename = "Artist")]
    pub artist: String,
    #[serde(rename = "Song Count")]
    pub song_count: usize,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run counters, printed after each phase and optionally written as JSON.
#[derive(Default, Debug, Clone, Serialize)]
pub struct PipelineStats {
    // Loading
    pub files_loaded: usize,
    pub rows_loaded: usize,

    // Normalization
    pub rows_dropped_incomplete: usize,
    pub rows_merged: usize, // duplicates folded into an earlier (song, artist) row
    pub normalized_rows: usize,

    // Aggregation
    pub artist_occurrences: usize,
    pub distinct_artists: usize,
    pub multi_song_artists: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl PipelineStats {
    /// Share of loaded rows that survived cleaning, as a percentage.
    pub fn retention_rate(&self) -> f64 {
        if self.rows_loaded == 0 {
            0.0
        } else {
            100.0 * self.normalized_rows as f64 / self.rows_loaded as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_columns_splits_passthrough() {
        let table = RawTable::with_columns(&[
            "Song",
            "Artist",
            "Album",
            "Added At",
            "Genres",
            "Popularity",
        ]);
        assert_eq!(table.passthrough, vec!["Added At", "Popularity"]);
        assert_eq!(table.columns.len(), 6);
        assert!(table.is_empty());
    }

    #[test]
    fn test_output_columns_layout() {
        let table = NormalizedTable {
            columns: ["Song", "Artist", "Album", "Genres", "Parent Genres", "Added At"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            passthrough: vec!["Added At".to_string()],
            records: vec![],
        };
        assert_eq!(
            table.output_columns(),
            vec!["Song", "Artist", "Genres", "Parent Genres", "Album", "Added At"]
        );
    }

    #[test]
    fn test_output_columns_without_genre_headers() {
        let table = NormalizedTable {
            columns: vec![
                "Added At".to_string(),
                "Album".to_string(),
                "Song".to_string(),
                "Artist".to_string(),
            ],
            passthrough: vec!["Added At".to_string()],
            records: vec![],
        };
        assert_eq!(
            table.output_columns(),
            vec!["Song", "Artist", "Genres", "Parent Genres", "Added At", "Album"]
        );
    }

    #[test]
    fn test_format_genres_is_sorted() {
        let genres: GenreSet = ["rock", "pop", "indie"].iter().map(|s| s.to_string()).collect();
        assert_eq!(format_genres(&genres), "indie,pop,rock");
        assert_eq!(format_genres(&GenreSet::new()), "");
    }

    #[test]
    fn test_to_raw_empty_genres_become_missing() {
        let table = NormalizedTable {
            columns: vec![],
            passthrough: vec![],
            records: vec![NormalizedRecord {
                song: "A".to_string(),
                artist: "X".to_string(),
                album: "M".to_string(),
                genres: GenreSet::new(),
                parent_genres: ["rock".to_string()].into_iter().collect(),
                extra: vec![],
            }],
        };
        let raw = table.to_raw();
        assert_eq!(raw.records[0].genres, None);
        assert_eq!(raw.records[0].parent_genres, Some("rock".to_string()));
    }

    #[test]
    fn test_retention_rate() {
        let mut stats = PipelineStats::default();
        assert_eq!(stats.retention_rate(), 0.0);
        stats.rows_loaded = 4;
        stats.normalized_rows = 3;
        assert_eq!(stats.retention_rate(), 75.0);
    }
}
