//! CSV output for the cleaned table and the artist counts.
//!
//! Files get a header row and no index column. Missing cells are written empty.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

use crate::models::{
    format_genres, ArtistCount, NormalizedRecord, NormalizedTable, ALBUM, ARTIST, GENRES,
    PARENT_GENRES, SONG,
};

/// Where a cleaned-table column's value comes from.
enum Source {
    Song,
    Artist,
    Album,
    Genres,
    ParentGenres,
    Extra(usize),
    Missing,
}

impl Source {
    fn resolve(column: &str, passthrough: &[String]) -> Self {
        match column {
            SONG => Source::Song,
            ARTIST => Source::Artist,
            ALBUM => Source::Album,
            GENRES => Source::Genres,
            PARENT_GENRES => Source::ParentGenres,
            other => passthrough
                .iter()
                .position(|c| c == other)
                .map_or(Source::Missing, Source::Extra),
        }
    }

    fn value(&self, record: &NormalizedRecord) -> String {
        match self {
            Source::Song => record.song.clone(),
            Source::Artist => record.artist.clone(),
            Source::Album => record.album.clone(),
            Source::Genres => format_genres(&record.genres),
            Source::ParentGenres => format_genres(&record.parent_genres),
            Source::Extra(i) => record.extra.get(*i).cloned().flatten().unwrap_or_default(),
            Source::Missing => String::new(),
        }
    }
}

fn create(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))
}

/// Write the cleaned table in its output layout (see `NormalizedTable::output_columns`).
pub fn write_normalized(table: &NormalizedTable, path: &Path) -> Result<()> {
    let columns = table.output_columns();
    let sources: Vec<Source> = columns
        .iter()
        .map(|c| Source::resolve(c, &table.passthrough))
        .collect();

    let mut writer = create(path)?;
    writer
        .write_record(&columns)
        .with_context(|| format!("Failed to write header to {:?}", path))?;
    for record in &table.records {
        let row: Vec<String> = sources.iter().map(|s| s.value(record)).collect();
        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write row to {:?}", path))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {:?}", path))?;
    Ok(())
}

/// Write artist counts with an `Artist,Song Count` header.
pub fn write_artist_counts(counts: &[ArtistCount], path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    if counts.is_empty() {
        // serde only emits the header alongside the first row
        writer.write_record([ARTIST, "Song Count"])?;
    }
    for count in counts {
        writer
            .serialize(count)
            .with_context(|| format!("Failed to write row to {:?}", path))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenreSet;
    use std::fs;
    use tempfile::TempDir;

    fn table() -> NormalizedTable {
        NormalizedTable {
            columns: ["Song", "Artist", "Album", "Genres", "Parent Genres", "Added At"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            passthrough: vec!["Added At".to_string()],
            records: vec![
                NormalizedRecord {
                    song: "A".to_string(),
                    artist: "X, Y".to_string(),
                    album: "M1".to_string(),
                    genres: ["rock", "pop"].iter().map(|s| s.to_string()).collect(),
                    parent_genres: GenreSet::new(),
                    extra: vec![Some("2020".to_string())],
                },
                NormalizedRecord {
                    song: "B".to_string(),
                    artist: "Z".to_string(),
                    album: "M2".to_string(),
                    genres: GenreSet::new(),
                    parent_genres: ["Rock".to_string()].into_iter().collect(),
                    extra: vec![None],
                },
            ],
        }
    }

    #[test]
    fn test_write_normalized_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cleaned_likes.csv");
        write_normalized(&table(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Song,Artist,Genres,Parent Genres,Album,Added At\n\
             A,\"X, Y\",\"pop,rock\",,M1,2020\n\
             B,Z,,Rock,M2,\n"
        );
    }

    #[test]
    fn test_write_artist_counts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artist_counts.csv");
        let counts = vec![
            ArtistCount {
                artist: "Drake".to_string(),
                song_count: 3,
            },
            ArtistCount {
                artist: "X".to_string(),
                song_count: 1,
            },
        ];
        write_artist_counts(&counts, &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Artist,Song Count\nDrake,3\nX,1\n"
        );
    }

    #[test]
    fn test_write_empty_artist_counts_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artist_counts_multi.csv");
        write_artist_counts(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Artist,Song Count\n");
    }
}
