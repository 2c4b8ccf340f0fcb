use std::path::Path;

use anyhow::Context;

use crate::models::ScoreRow;

pub const DEFAULT_FILE_NAME: &str = "scores.csv";
pub const MEDIA_TYPE: &str = "text/csv";

/// Writes score rows as CSV with a header row and no index column.
pub fn write_scores<W: std::io::Write>(output: W, scores: &[ScoreRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    if scores.is_empty() {
        writer.write_record([
            "user_id",
            "interaction_score",
            "offline_score",
            "session_score",
            "total_score",
        ])?;
    }
    for score in scores {
        writer.serialize(score)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_scores(path: &Path, scores: &[ScoreRow]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_scores(file, scores).with_context(|| format!("failed to write {}", path.display()))
}
