use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use liked_songs_clean::loader::DEFAULT_PATTERN;
use liked_songs_clean::pipeline::{run, PipelineArgs};
use liked_songs_clean::progress::set_log_only;

#[derive(Parser)]
#[command(name = "liked-songs-clean")]
#[command(about = "Clean and deduplicate liked-songs exports and count songs per artist")]
struct Args {
    /// Directory containing the raw exports
    #[arg(long, default_value = "../data/raw")]
    input_dir: PathBuf,

    /// File name pattern for exports (`*` and `?` wildcards)
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pattern: String,

    /// Directory for cleaned_likes.csv, artist_counts.csv and artist_counts_multi.csv
    #[arg(long, default_value = "../data/interim")]
    output_dir: PathBuf,

    /// Also write run statistics as JSON to this path
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Hide progress bars and print tail-friendly lines to stderr
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    let pipeline_args = PipelineArgs {
        input_dir: args.input_dir,
        pattern: args.pattern,
        output_dir: args.output_dir,
        stats_path: args.stats,
    };

    let stats = run(&pipeline_args)?;

    println!("\n{:=<60}", "");
    println!("Cleaning complete!");
    println!("  Files: {}", stats.files_loaded);
    println!(
        "  Songs: {} of {} rows kept ({:.1}%)",
        stats.normalized_rows,
        stats.rows_loaded,
        stats.retention_rate()
    );
    println!(
        "  Artists: {} ({} with more than one song)",
        stats.distinct_artists, stats.multi_song_artists
    );
    println!("  Output: {}", pipeline_args.output_dir.display());
    println!("  Elapsed: {:.2}s", stats.elapsed_seconds);
    println!("{:=<60}", "");

    Ok(())
}
