//! Artist frequency counts over the cleaned table.
//!
//! Co-artists packed into one `Artist` field ("X, Y") are split here, not
//! during normalization, so each credited artist gets one count per song.

use rustc_hash::FxHashMap;

use crate::models::{ArtistCount, NormalizedRecord};

/// Artists need more than this many songs to appear in the multi-song view.
pub const MULTI_SONG_THRESHOLD: usize = 1;

/// Split a multi-artist field into trimmed names.
/// e.g., "Mustard, Migos" → ["Mustard", "Migos"]
pub fn split_artists(artist: &str) -> impl Iterator<Item = &str> {
    artist.split(',').map(str::trim)
}

/// Count songs per individual artist.
/// Sorted by song count descending, ties broken by name ascending.
pub fn count_artists(records: &[NormalizedRecord]) -> Vec<ArtistCount> {
    let mut tally: FxHashMap<&str, usize> = FxHashMap::default();

    for record in records {
        for name in split_artists(&record.artist) {
            *tally.entry(name).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<ArtistCount> = tally
        .into_iter()
        .map(|(artist, song_count)| ArtistCount {
            artist: artist.to_string(),
            song_count,
        })
        .collect();

    counts.sort_by(|a, b| {
        b.song_count
            .cmp(&a.song_count)
            .then_with(|| a.artist.cmp(&b.artist))
    });
    counts
}

/// Keep only artists with more than one song, preserving order.
pub fn filter_multi(counts: &[ArtistCount]) -> Vec<ArtistCount> {
    counts
        .iter()
        .filter(|c| c.song_count > MULTI_SONG_THRESHOLD)
        .cloned()
        .collect()
}
