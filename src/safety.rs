//! Safety utilities to prevent clobbering or re-ingesting input exports.
//!
//! Outputs are written next to (or into) the export directory, so each
//! output path is checked against the inputs before anything is written.

use anyhow::{bail, Result};
use regex::Regex;
use std::path::Path;

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output cannot be the same as any of the provided source paths
/// - An output inside the input directory must not match the input pattern,
///   or the next run would load it back in as an export
///
/// # Arguments
/// * `output` - The output path that will be created/overwritten
/// * `input_dir` - Directory the exports are discovered in
/// * `input_pattern` - Compiled input file name pattern
/// * `source_paths` - Slice of source paths that must not match the output
///
/// # Returns
/// * `Ok(())` if the output path is safe
/// * `Err` with a descriptive message if the check fails
pub fn validate_output_path(
    output: &Path,
    input_dir: &Path,
    input_pattern: &Regex,
    source_paths: &[&Path],
) -> Result<()> {
    let output_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");

    // Check that output is not the same as any source
    for source in source_paths {
        if same_path(output, source) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    let in_input_dir = output.parent().map_or(false, |parent| same_path(parent, input_dir));
    if in_input_dir && input_pattern.is_match(output_name) {
        bail!(
            "Safety check failed: output file '{}' matches the input pattern and would be re-read as an export",
            output.display()
        );
    }

    Ok(())
}

/// Compare paths literally, then by canonical form when both exist on disk.
fn same_path(a: &Path, b: &Path) -> bool {
    a == b
        || matches!(
            (a.canonicalize(), b.canonicalize()),
            (Ok(x), Ok(y)) if x == y
        )
}
