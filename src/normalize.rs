//! Normalization of raw liked-song rows into a deduplicated table.
//!
//! Steps run in a fixed order: trim, drop incomplete rows, parse genres,
//! sort by (artist, album, song), then merge rows sharing (song, artist).
//! The sort must happen before the merge since it decides which row's
//! passthrough values win.

use rustc_hash::FxHashMap;

use crate::models::{Field, GenreSet, NormalizedRecord, NormalizedTable, RawTable, Record};

// ============================================================================
// FIELD CLEANUP
// ============================================================================

/// Strip surrounding whitespace from a present value. Missing stays missing.
pub fn trim_field(field: &Field) -> Field {
    field.as_ref().map(|s| s.trim().to_string())
}

/// Trim every field of a record, passthrough columns included.
pub fn trim_record(record: &Record) -> Record {
    Record {
        song: trim_field(&record.song),
        artist: trim_field(&record.artist),
        album: trim_field(&record.album),
        genres: trim_field(&record.genres),
        parent_genres: trim_field(&record.parent_genres),
        extra: record.extra.iter().map(trim_field).collect(),
    }
}

/// Parse comma-separated genre text into a set of trimmed names.
/// e.g., "pop, rock ,pop" → {"pop", "rock"}; missing → {}
///
/// Empty pieces are kept as-is ("rock," → {"", "rock"}).
pub fn parse_genres(field: &Field) -> GenreSet {
    match field {
        Some(text) => text.split(',').map(|g| g.trim().to_string()).collect(),
        None => GenreSet::new(),
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Result of a normalization pass with the counters the pipeline reports.
#[derive(Clone, Debug, Default)]
pub struct NormalizeOutcome {
    pub table: NormalizedTable,
    pub dropped_incomplete: usize,
    pub merged: usize,
}

/// Convert a trimmed record into a normalized one.
/// Returns None when song, artist or album is missing. An empty string is
/// still a value and passes.
fn complete_record(record: Record) -> Option<NormalizedRecord> {
    let Record {
        song,
        artist,
        album,
        genres,
        parent_genres,
        extra,
    } = record;

    Some(NormalizedRecord {
        song: song?,
        artist: artist?,
        album: album?,
        genres: parse_genres(&genres),
        parent_genres: parse_genres(&parent_genres),
        extra,
    })
}

/// Fold `next` into `first`: genre sets are unioned, and each passthrough
/// field missing on `first` takes `next`'s value.
fn merge_into(first: &mut NormalizedRecord, next: NormalizedRecord) {
    first.genres.extend(next.genres);
    first.parent_genres.extend(next.parent_genres);
    for (slot, value) in first.extra.iter_mut().zip(next.extra) {
        if slot.is_none() {
            *slot = value;
        }
    }
}

/// Normalize a raw table, returning the cleaned table plus drop/merge counts.
pub fn normalize_with_outcome(table: &RawTable) -> NormalizeOutcome {
    let mut dropped_incomplete = 0;

    let mut records: Vec<NormalizedRecord> = table
        .records
        .iter()
        .map(trim_record)
        .filter_map(|r| {
            let complete = complete_record(r);
            if complete.is_none() {
                dropped_incomplete += 1;
            }
            complete
        })
        .collect();

    // Stable, so equal keys keep load order
    records.sort_by(|a, b| {
        a.artist
            .cmp(&b.artist)
            .then_with(|| a.album.cmp(&b.album))
            .then_with(|| a.song.cmp(&b.song))
    });

    // Map: (song, artist) -> index into merged
    let mut index: FxHashMap<(String, String), usize> = FxHashMap::default();
    let mut merged: Vec<NormalizedRecord> = Vec::with_capacity(records.len());
    let mut merged_count = 0;

    for record in records {
        let key = (record.song.clone(), record.artist.clone());
        match index.get(&key) {
            Some(&i) => {
                merge_into(&mut merged[i], record);
                merged_count += 1;
            }
            None => {
                index.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    merged.sort_by(|a, b| a.song.cmp(&b.song).then_with(|| a.artist.cmp(&b.artist)));

    NormalizeOutcome {
        table: NormalizedTable {
            columns: table.columns.clone(),
            passthrough: table.passthrough.clone(),
            records: merged,
        },
        dropped_incomplete,
        merged: merged_count,
    }
}

/// Normalize a raw table into one row per (song, artist).
pub fn normalize(table: &RawTable) -> NormalizedTable {
    normalize_with_outcome(table).table
}

// ============================================================================
// TESTS
// ============================================================================
