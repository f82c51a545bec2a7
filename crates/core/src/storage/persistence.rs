//! CSV snapshot of the review collection.
//!
//! The snapshot is the durable record operators see: one row per review with
//! the header `ReviewId,Location,ReviewBody,Timestamp`. Column order is part
//! of the on-disk contract. Writes use atomic temp-file + fsync + rename so a
//! crash never leaves a half-written snapshot behind.

use crate::config::{SNAPSHOT_FILE, SNAPSHOT_HEADER};
use crate::error::{Result, StoreError};
use crate::review::{is_valid_timestamp, Review};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Save all reviews to `reviews.csv` in `dir` with an atomic write.
pub fn save_snapshot(reviews: &[Review], dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(SNAPSHOT_FILE);
    let tmp_path = dir.join(format!("{SNAPSHOT_FILE}.tmp"));

    let mut writer = csv::Writer::from_writer(File::create(&tmp_path)?);
    writer.write_record(SNAPSHOT_HEADER)?;
    for review in reviews {
        writer.write_record([
            review.id.as_str(),
            review.location.as_str(),
            review.body.as_str(),
            review.timestamp.as_str(),
        ])?;
    }
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| io::Error::other(e.to_string()))?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, &path)?;
    sync_dir(dir);

    tracing::info!(path = %path.display(), reviews = reviews.len(), "Saved review snapshot");
    Ok(())
}

/// Load reviews from `reviews.csv` in `dir`.
///
/// A missing or zero-length file is an empty collection. A file with the
/// wrong header, a malformed row, an invalid timestamp, or a duplicate ID is
/// rejected as a whole.
pub fn load_snapshot(dir: &Path) -> Result<Vec<Review>> {
    let path = dir.join(SNAPSHOT_FILE);
    let meta = match fs::metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No review snapshot, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    if meta.len() == 0 {
        tracing::warn!(path = %path.display(), "Review snapshot is empty, starting empty");
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)?;

    let headers = reader.headers()?;
    if !headers.iter().eq(SNAPSHOT_HEADER.iter().copied()) {
        return Err(StoreError::Corrupt(format!(
            "{}: expected header {:?}, found {:?}",
            path.display(),
            SNAPSHOT_HEADER.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut reviews = Vec::new();
    let mut seen = HashSet::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        let review = Review::with_id(field(0), field(1), field(2), field(3));

        if review.id.is_empty() {
            return Err(StoreError::Corrupt(format!("line {line}: empty ReviewId")));
        }
        if !is_valid_timestamp(&review.timestamp) {
            return Err(StoreError::Corrupt(format!(
                "line {line}: invalid timestamp {:?}",
                review.timestamp
            )));
        }
        if !seen.insert(review.id.clone()) {
            return Err(StoreError::Corrupt(format!(
                "line {line}: duplicate ReviewId {}",
                review.id
            )));
        }
        reviews.push(review);
    }

    tracing::info!(path = %path.display(), reviews = reviews.len(), "Loaded review snapshot");
    Ok(reviews)
}

/// Best-effort fsync of the directory so the rename itself is durable.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    {
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            tracing::warn!("Failed to fsync {:?}: {}", dir, e);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }
}
