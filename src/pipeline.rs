//! End-to-end cleaning run: load exports, normalize, count artists, write outputs.
//!
//! ## Outputs
//!
//! Written into the output directory with fixed names:
//!
//! - `cleaned_likes.csv`: one row per (Song, Artist), genres unioned
//! - `artist_counts.csv`: `Artist,Song Count`, count descending then name
//! - `artist_counts_multi.csv`: same, restricted to artists with more than one song

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::artists::{count_artists, filter_multi};
use crate::loader::{load_all, wildcard_to_regex};
use crate::log_only;
use crate::models::PipelineStats;
use crate::normalize::normalize_with_outcome;
use crate::progress::{create_spinner, finish, format_duration};
use crate::safety::validate_output_path;
use crate::writer::{write_artist_counts, write_normalized};

pub const CLEANED_FILE: &str = "cleaned_likes.csv";
pub const COUNTS_FILE: &str = "artist_counts.csv";
pub const COUNTS_MULTI_FILE: &str = "artist_counts_multi.csv";

/// Arguments for a cleaning run
#[derive(Clone, Debug)]
pub struct PipelineArgs {
    pub input_dir: PathBuf,
    pub pattern: String,
    pub output_dir: PathBuf,
    pub stats_path: Option<PathBuf>,
}

impl PipelineArgs {
    pub fn cleaned_path(&self) -> PathBuf {
        self.output_dir.join(CLEANED_FILE)
    }

    pub fn counts_path(&self) -> PathBuf {
        self.output_dir.join(COUNTS_FILE)
    }

    pub fn counts_multi_path(&self) -> PathBuf {
        self.output_dir.join(COUNTS_MULTI_FILE)
    }
}

/// Run the cleaning pipeline
pub fn run(args: &PipelineArgs) -> Result<PipelineStats> {
    let start = Instant::now();
    let mut stats = PipelineStats::default();

    // Phase 1: load
    log_only!("[LOAD] Reading {} from {}", args.pattern, args.input_dir.display());
    let (raw, files) = load_all(&args.input_dir, &args.pattern)?;
    stats.files_loaded = files.len();
    stats.rows_loaded = raw.len();

    // Safety check: refuse to overwrite or feed back into the inputs
    let input_pattern = wildcard_to_regex(&args.pattern)?;
    let sources: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
    let mut outputs = vec![args.cleaned_path(), args.counts_path(), args.counts_multi_path()];
    outputs.extend(args.stats_path.clone());
    for output in &outputs {
        validate_output_path(output, &args.input_dir, &input_pattern, &sources)?;
    }

    // Phase 2: normalize
    let spinner = create_spinner("Normalizing records");
    let outcome = normalize_with_outcome(&raw);
    stats.rows_dropped_incomplete = outcome.dropped_incomplete;
    stats.rows_merged = outcome.merged;
    stats.normalized_rows = outcome.table.len();
    finish(
        &spinner,
        "NORMALIZE",
        format!(
            "Normalized {} rows into {} unique songs ({} incomplete dropped)",
            stats.rows_loaded, stats.normalized_rows, stats.rows_dropped_incomplete
        ),
    );
    stats.log_phase("normalize");

    write_normalized(&outcome.table, &args.cleaned_path())?;
    log_only!("[WRITE] {}", args.cleaned_path().display());

    // Phase 3: artist counts
    let counts = count_artists(&outcome.table.records);
    let multi = filter_multi(&counts);
    stats.artist_occurrences = counts.iter().map(|c| c.song_count).sum();
    stats.distinct_artists = counts.len();
    stats.multi_song_artists = multi.len();

    write_artist_counts(&counts, &args.counts_path())?;
    log_only!("[WRITE] {}", args.counts_path().display());
    write_artist_counts(&multi, &args.counts_multi_path())?;
    log_only!("[WRITE] {}", args.counts_multi_path().display());

    let elapsed = start.elapsed();
    stats.elapsed_seconds = elapsed.as_secs_f64();
    stats.log_phase("final");
    log_only!("[DONE] {}", format_duration(elapsed));

    if let Some(path) = &args.stats_path {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {:?}", path))?;
    }

    Ok(stats)
}
