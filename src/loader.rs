//! Discovery and loading of liked-songs export files.
//!
//! Every export is a CSV file with a header row. Files are concatenated into
//! a single `RawTable` whose header is the union of all headers.

use anyhow::{bail, Context, Result};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use crate::models::{Field, RawTable, Record, ALBUM, ARTIST, GENRES, PARENT_GENRES, SONG};
use crate::progress::{create_progress_bar, finish, log_progress};

/// Default file name pattern for liked-songs exports.
pub const DEFAULT_PATTERN: &str = "likes-*.csv";

// ============================================================================
// FILE DISCOVERY
// ============================================================================

/// Compile a shell-style wildcard into an anchored regex.
/// `*` matches any run of characters, `?` exactly one; everything else is literal.
pub fn wildcard_to_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                re.push_str(&regex::escape(&literal));
                literal.clear();
                re.push_str(if c == '*' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    re.push_str(&regex::escape(&literal));
    re.push('$');
    Regex::new(&re).with_context(|| format!("Invalid file pattern '{}'", pattern))
}

/// List files in `dir` whose names match `pattern`, sorted by path.
pub fn discover_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = wildcard_to_regex(pattern)?;
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory {:?}", dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {:?}", dir))?;
        let path = entry.path();
        let name_matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| matcher.is_match(n));
        if name_matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ============================================================================
// CSV LOADING
// ============================================================================

/// Empty cells are missing; anything else, whitespace included, is a value.
fn cell(value: Option<&str>) -> Field {
    match value {
        None | Some("") => None,
        Some(v) => Some(v.to_string()),
    }
}

/// Give repeated header names a numeric suffix so every column keeps its own values.
/// e.g., ["Tag", "Tag", "Tag"] → ["Tag", "Tag.1", "Tag.2"]
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut out: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{}.{}", header, count);
        }
        seen.insert(name.clone(), 0);
        out.push(name);
    }
    out
}

/// Read one CSV file into a table. Short rows are padded with missing cells.
pub fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {:?}", path))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let headers = dedupe_headers(headers);

    let mut table = RawTable::with_columns(&headers);
    let position: FxHashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();
    let known = |name: &str| position.get(name).copied();
    let (song_idx, artist_idx, album_idx) = (known(SONG), known(ARTIST), known(ALBUM));
    let (genres_idx, parent_idx) = (known(GENRES), known(PARENT_GENRES));
    let extra_idx: Vec<usize> = table
        .passthrough
        .iter()
        .filter_map(|c| known(c.as_str()))
        .collect();

    for (line, row) in reader.records().enumerate() {
        let row = row
            .with_context(|| format!("Failed to parse {:?} at record {}", path, line + 1))?;
        let get = |idx: Option<usize>| cell(idx.and_then(|i| row.get(i)));
        table.records.push(Record {
            song: get(song_idx),
            artist: get(artist_idx),
            album: get(album_idx),
            genres: get(genres_idx),
            parent_genres: get(parent_idx),
            extra: extra_idx.iter().map(|&i| get(Some(i))).collect(),
        });
    }

    Ok(table)
}

/// Concatenate tables. The header is the union of all headers in first-seen
/// order; cells for columns a table lacks are missing.
pub fn concat(tables: Vec<RawTable>) -> RawTable {
    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for column in &table.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }

    let mut combined = RawTable::with_columns(&columns);
    let slot: FxHashMap<&str, usize> = combined
        .passthrough
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut records = Vec::with_capacity(tables.iter().map(RawTable::len).sum());
    for table in tables {
        // Position of each of this table's passthrough columns in the combined layout
        let remap: Vec<usize> = table
            .passthrough
            .iter()
            .filter_map(|c| slot.get(c.as_str()).copied())
            .collect();
        for mut record in table.records {
            let mut extra: Vec<Field> = vec![None; slot.len()];
            for (value, &target) in record.extra.drain(..).zip(&remap) {
                extra[target] = value;
            }
            record.extra = extra;
            records.push(record);
        }
    }
    combined.records = records;
    combined
}

/// Discover, load and concatenate every matching export in `dir`.
/// Returns the combined table and the files it was read from.
pub fn load_all(dir: &Path, pattern: &str) -> Result<(RawTable, Vec<PathBuf>)> {
    let files = discover_files(dir, pattern)?;
    if files.is_empty() {
        bail!(
            "No input files matching '{}' in {}",
            pattern,
            dir.display()
        );
    }

    let total = files.len() as u64;
    let pb = create_progress_bar(total, "Loading exports");
    let mut tables = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        tables.push(load_csv(file)?);
        pb.inc(1);
        log_progress("LOAD", i as u64 + 1, total, &file.display().to_string());
    }
    let combined = concat(tables);
    finish(
        &pb,
        "LOAD",
        format!("Loaded {} rows from {} files", combined.len(), files.len()),
    );

    Ok((combined, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn s(v: &str) -> Field {
        Some(v.to_string())
    }

    #[test]
    fn test_wildcard_to_regex() {
        let re = wildcard_to_regex("likes-*.csv").unwrap();
        assert!(re.is_match("likes-2023.csv"));
        assert!(re.is_match("likes-.csv"));
        assert!(!re.is_match("likes-2023.csvx"));
        assert!(!re.is_match("likes-2023xcsv"));
        assert!(!re.is_match("old-likes-2023.csv"));

        let re = wildcard_to_regex("part?.csv").unwrap();
        assert!(re.is_match("part1.csv"));
        assert!(!re.is_match("part12.csv"));
    }

    #[test]
    fn test_discover_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("likes-b.csv"), "Song\n").unwrap();
        fs::write(dir.path().join("likes-a.csv"), "Song\n").unwrap();
        fs::write(dir.path().join("cleaned_likes.csv"), "Song\n").unwrap();
        fs::create_dir(dir.path().join("likes-dir.csv")).unwrap();

        let files = discover_files(dir.path(), DEFAULT_PATTERN).unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["likes-a.csv", "likes-b.csv"]);
    }

    #[test]
    fn test_load_csv_empty_vs_whitespace_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("likes-1.csv");
        fs::write(
            &path,
            "Song,Artist,Album,Genres,Added At\nA,X,,rock,2020\nB,Y,\"  \",,\nC,Z\n",
        )
        .unwrap();

        let table = load_csv(&path).unwrap();
        assert_eq!(table.passthrough, vec!["Added At"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.records[0].album, None);
        assert_eq!(table.records[0].genres, s("rock"));
        assert_eq!(table.records[0].extra, vec![s("2020")]);
        assert_eq!(table.records[1].album, s("  "));
        assert_eq!(table.records[1].genres, None);
        assert_eq!(table.records[2].album, None);
        assert_eq!(table.records[2].extra, vec![None]);
        assert_eq!(table.records[0].parent_genres, None);
    }

    #[test]
    fn test_dedupe_headers() {
        let headers = ["Tag", "Song", "Tag", "Tag.1", "Tag"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        assert_eq!(
            dedupe_headers(headers),
            vec!["Tag", "Song", "Tag.1", "Tag.1.1", "Tag.2"]
        );
    }

    #[test]
    fn test_load_csv_repeated_header_keeps_both_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("likes-1.csv");
        fs::write(&path, "Song,Artist,Album,Tag,Tag
A,X,M,first,second
").unwrap();

        let table = load_csv(&path).unwrap();
        assert_eq!(table.passthrough, vec!["Tag", "Tag.1"]);
        assert_eq!(table.records[0].extra, vec![s("first"), s("second")]);

        let combined = concat(vec![table]);
        assert_eq!(combined.passthrough, vec!["Tag", "Tag.1"]);
        assert_eq!(combined.records[0].extra, vec![s("first"), s("second")]);
    }

    #[test]
    fn test_concat_unions_headers() {
        let mut a = RawTable::with_columns(&["Song", "Artist", "Album", "Added At"]);
        a.records.push(Record {
            song: s("A"),
            extra: vec![s("2020")],
            ..Record::default()
        });
        let mut b = RawTable::with_columns(&["Song", "Popularity", "Artist", "Added At"]);
        b.records.push(Record {
            song: s("B"),
            extra: vec![s("55"), s("2021")],
            ..Record::default()
        });

        let combined = concat(vec![a, b]);
        assert_eq!(
            combined.columns,
            vec!["Song", "Artist", "Album", "Added At", "Popularity"]
        );
        assert_eq!(combined.passthrough, vec!["Added At", "Popularity"]);
        assert_eq!(combined.records[0].extra, vec![s("2020"), None]);
        assert_eq!(combined.records[1].extra, vec![s("2021"), s("55")]);
    }

    #[test]
    fn test_load_all_requires_input() {
        let dir = TempDir::new().unwrap();
        let err = load_all(dir.path(), DEFAULT_PATTERN).unwrap_err();
        assert!(err.to_string().contains("No input files matching"));
    }
}
