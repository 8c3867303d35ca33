//! Versioned on-disk layout for value tables.
//!
//! A snapshot stores the level vector, the action count, the initial value and
//! the flat value array in [`StateSpace`] enumeration order, encoded with
//! MessagePack. Files are written to a sibling temporary path and renamed into
//! place, so a reader never observes a half-written table.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Error, Result, state_space::StateSpace, value_table::ValueTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub format: String,
    pub version: u32,
    pub levels: Vec<usize>,
    pub num_actions: usize,
    pub initial_value: f64,
    pub values: Vec<f64>,
}

impl TableSnapshot {
    pub const FORMAT: &'static str = "qracer-value-table";
    pub const VERSION: u32 = 1;

    pub fn from_table(table: &ValueTable) -> Self {
        Self {
            format: Self::FORMAT.to_string(),
            version: Self::VERSION,
            levels: table.levels().to_vec(),
            num_actions: table.num_actions(),
            initial_value: table.initial_value(),
            values: table.values().to_vec(),
        }
    }

    fn check_header(&self) -> Result<()> {
        if self.format != Self::FORMAT {
            return Err(Error::UnknownSnapshotFormat {
                found: self.format.clone(),
            });
        }
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedSnapshotVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        Ok(())
    }

    /// Rebuild the dense table described by this snapshot.
    pub fn into_table(self) -> Result<ValueTable> {
        self.check_header()?;
        let space = StateSpace::new(self.levels).map_err(|err| Error::CorruptSnapshot {
            reason: err.to_string(),
        })?;
        ValueTable::from_parts(space, self.num_actions, self.initial_value, self.values)
    }

    /// Like [`TableSnapshot::into_table`], but fail fast when the snapshot was
    /// built for a different discretization.
    pub fn into_table_matching(self, levels: &[usize]) -> Result<ValueTable> {
        self.check_header()?;
        if self.levels != levels {
            return Err(Error::LevelMismatch {
                expected: levels.to_vec(),
                found: self.levels,
            });
        }
        self.into_table()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| Error::SerializationContext {
            operation: "serialize value table to MessagePack".to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize value table from MessagePack".to_string(),
            message: e.to_string(),
        })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let staging = staging_path(path);

        let file = File::create(&staging).map_err(|source| Error::Io {
            operation: format!("create file {}", staging.display()),
            source,
        })?;
        let written = self.write_synced(file, &staging).and_then(|()| {
            fs::rename(&staging, path).map_err(|source| Error::Io {
                operation: format!("move {} into place", staging.display()),
                source,
            })
        });
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&staging) {
                warn!(path = %staging.display(), %cleanup, "could not remove staging file");
            }
            return Err(err);
        }

        info!(
            path = %path.display(),
            states = self.values.len() / self.num_actions.max(1),
            "saved value table"
        );
        Ok(())
    }

    /// Encode into `file` and force it to disk before it is renamed.
    fn write_synced(&self, file: File, staging: &Path) -> Result<()> {
        let mut writer = BufWriter::new(file);
        rmp_serde::encode::write_named(&mut writer, self).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize value table to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;
        let file = writer.into_inner().map_err(|e| Error::Io {
            operation: format!("flush {}", staging.display()),
            source: e.into_error(),
        })?;
        file.sync_all().map_err(|source| Error::Io {
            operation: format!("sync {}", staging.display()),
            source,
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {}", path.display()),
            source,
        })?;
        let reader = BufReader::new(file);

        let snapshot: Self =
            rmp_serde::decode::from_read(reader).map_err(|e| Error::SerializationContext {
                operation: format!("deserialize value table from {}", path.display()),
                message: e.to_string(),
            })?;
        info!(path = %path.display(), levels = ?snapshot.levels, "loaded value table");
        Ok(snapshot)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::state_space::DiscreteState;

    fn trained_table() -> ValueTable {
        let mut table = ValueTable::new(StateSpace::new(vec![2, 3]).unwrap(), 5, 0.0).unwrap();
        table.set(&DiscreteState::from([1, 2]), 3, 4.25).unwrap();
        table.set(&DiscreteState::from([0, 1]), 0, -1.5).unwrap();
        table
    }

    #[test]
    fn test_bytes_roundtrip() -> Result<()> {
        let table = trained_table();
        let bytes = table.to_snapshot().to_bytes()?;
        let restored = TableSnapshot::from_bytes(&bytes)?.into_table()?;
        assert_eq!(restored, table);
        Ok(())
    }

    #[test]
    fn test_file_roundtrip_leaves_no_staging_file() -> Result<()> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("table.qtable");
        let table = trained_table();

        table.save(&path)?;
        assert!(path.exists());
        assert!(!staging_path(&path).exists());

        let restored = ValueTable::load_matching(&path, &[2, 3])?;
        assert_eq!(restored.get(&DiscreteState::from([1, 2]), 3)?, 4.25);
        assert_eq!(restored, table);
        Ok(())
    }

    #[test]
    fn test_failed_rename_removes_staging_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        // A non-empty directory cannot be replaced by a file.
        let path = temp_dir.path().join("table.qtable");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), b"x").unwrap();

        let err = trained_table().save(&path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(!staging_path(&path).exists());
        assert!(path.join("occupied").exists());
    }

    #[test]
    fn test_level_mismatch_fails_fast() {
        let snapshot = trained_table().to_snapshot();
        let err = snapshot.into_table_matching(&[3, 2]).unwrap_err();
        assert!(matches!(err, Error::LevelMismatch { .. }));
        assert!(err.is_persistence());
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let mut snapshot = trained_table().to_snapshot();
        snapshot.version = 99;
        assert!(matches!(
            snapshot.into_table(),
            Err(Error::UnsupportedSnapshotVersion {
                found: 99,
                expected: 1
            })
        ));
    }

    #[test]
    fn test_wrong_format_is_rejected() {
        let mut snapshot = trained_table().to_snapshot();
        snapshot.format = "pickle".to_string();
        assert!(matches!(
            snapshot.into_table(),
            Err(Error::UnknownSnapshotFormat { .. })
        ));
    }

    #[test]
    fn test_truncated_values_are_rejected() {
        let mut snapshot = trained_table().to_snapshot();
        snapshot.values.pop();
        assert!(matches!(
            snapshot.into_table(),
            Err(Error::CorruptSnapshot { .. })
        ));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut snapshot = trained_table().to_snapshot();
        snapshot.values[4] = f64::NAN;
        assert!(matches!(
            snapshot.into_table(),
            Err(Error::CorruptSnapshot { .. })
        ));
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("garbage.qtable");
        fs::write(&path, b"not a table").unwrap();
        let err = ValueTable::load(&path).unwrap_err();
        assert!(matches!(err, Error::SerializationContext { .. }));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = ValueTable::load("/tmp/nonexistent_qracer_12345.qtable").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
