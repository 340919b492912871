//! CSV persistence for ranked tables.
//!
//! The writer refuses to clobber an existing file: a ranking run is a
//! point-in-time artifact and silently overwriting one loses it.

use csv::{ReaderBuilder, WriterBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::models::RankedMovie;

/// Column separator of the output files.
pub const DELIMITER: u8 = b';';

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("refusing to overwrite existing file {0}")]
    DestinationExists(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Write a ranked table with the column order
/// `rank;name;release_date;rating;votes;oscars;adjusted_rating`.
pub fn write_ranked_csv(path: &Path, rows: &[RankedMovie]) -> Result<(), StorageError> {
    if path.exists() {
        return Err(StorageError::DestinationExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = WriterBuilder::new().delimiter(DELIMITER).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

/// Read a previously written ranking back, field for field.
pub fn read_ranked_csv(path: &Path) -> Result<Vec<RankedMovie>, StorageError> {
    let mut reader = ReaderBuilder::new().delimiter(DELIMITER).from_path(path)?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tmp_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("imdb_etl_storage_{name}"));
        let _ = fs::remove_dir_all(&p);
        fs::create_dir_all(&p).unwrap();
        p
    }

    fn sample_rows() -> Vec<RankedMovie> {
        vec![
            RankedMovie {
                rank: 1,
                name: "Dust & Echoes".into(),
                release_date: "1994-10-14".into(),
                rating: 9.3,
                votes: 2_800_000,
                oscars: 7,
                adjusted_rating: 10.3,
            },
            RankedMovie {
                rank: 2,
                name: "The Silent Engine".into(),
                release_date: "N/A".into(),
                rating: 8.2,
                votes: 91_609,
                oscars: 0,
                adjusted_rating: 5.5,
            },
        ]
    }

    #[test]
    fn test_round_trip() {
        let dir = tmp_dir("round_trip");
        let path = dir.join("ranking.csv");

        let rows = sample_rows();
        write_ranked_csv(&path, &rows).unwrap();
        let read_back = read_ranked_csv(&path).unwrap();

        assert_eq!(rows, read_back);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tmp_dir("no_overwrite");
        let path = dir.join("ranking.csv");

        write_ranked_csv(&path, &sample_rows()).unwrap();
        let err = write_ranked_csv(&path, &sample_rows()).unwrap_err();
        assert!(matches!(err, StorageError::DestinationExists(_)));
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = tmp_dir("parents");
        let path = dir.join("nested/out/ranking.csv");

        write_ranked_csv(&path, &sample_rows()).unwrap();
        assert!(path.exists());
    }
}
