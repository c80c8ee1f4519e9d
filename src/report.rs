// =============================================================================
// Candidate Report — dated CSV sink
// =============================================================================
//
// One file per run: `<output_dir>/<base_name>_YYYYMMDD.csv`, UTF-8 with a
// BOM so spreadsheet tools pick the encoding up for Korean ticker names.
// The write goes through a tmp + rename so a crash mid-run never leaves a
// truncated report behind.
// =============================================================================

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::types::Candidate;

/// UTF-8 byte-order mark, prepended for Excel compatibility.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write `candidates` to a dated CSV under `output_dir`.
///
/// Returns the final path, or `None` when there was nothing to save — an
/// empty run produces no file, matching the "ticker skipped, loop
/// continues" posture of the rest of the pipeline.
pub fn save_candidates(
    candidates: &[Candidate],
    output_dir: &Path,
    base_name: &str,
    date: NaiveDate,
) -> Result<Option<PathBuf>> {
    if candidates.is_empty() {
        info!("no candidates to save — skipping report");
        return Ok(None);
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create report dir {}", output_dir.display()))?;

    let file_name = format!("{}_{}.csv", base_name, date.format("%Y%m%d"));
    let path = output_dir.join(&file_name);
    let tmp_path = output_dir.join(format!("{file_name}.tmp"));

    let mut file = std::fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    file.write_all(UTF8_BOM)
        .with_context(|| format!("failed to write BOM to {}", tmp_path.display()))?;

    let mut writer = csv::Writer::from_writer(file);
    for candidate in candidates {
        writer
            .serialize(candidate)
            .with_context(|| format!("failed to serialise candidate {}", candidate.code))?;
    }
    writer.flush().context("failed to flush report")?;
    drop(writer);

    std::fs::rename(&tmp_path, &path)
        .with_context(|| format!("failed to rename tmp report to {}", path.display()))?;

    info!(path = %path.display(), count = candidates.len(), "candidate report saved");
    Ok(Some(path))
}
