//! MessagePack implementation of the table repository.
//!
//! Stores [`TableSnapshot`]s on disk; see [`crate::snapshot`] for the layout.

use std::path::Path;

use crate::{Result, ports::TableRepository, snapshot::TableSnapshot, value_table::ValueTable};

/// File-backed table repository.
///
/// # Examples
///
/// ```no_run
/// use qracer::adapters::MsgPackRepository;
/// use qracer::ports::TableRepository;
/// use qracer::state_space::StateSpace;
/// use qracer::value_table::ValueTable;
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let table = ValueTable::new(StateSpace::new(vec![2, 3])?, 5, 0.0)?;
///
/// repo.save(&table, Path::new("trained.qtable"))?;
/// let loaded = repo.load_matching(Path::new("trained.qtable"), &[2, 3])?;
/// # Ok::<(), qracer::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl TableRepository for MsgPackRepository {
    fn save(&self, table: &ValueTable, path: &Path) -> Result<()> {
        TableSnapshot::from_table(table).save_to_file(path)
    }

    fn load(&self, path: &Path) -> Result<ValueTable> {
        TableSnapshot::load_from_file(path)?.into_table()
    }

    fn load_matching(&self, path: &Path, levels: &[usize]) -> Result<ValueTable> {
        TableSnapshot::load_from_file(path)?.into_table_matching(levels)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{Error, state_space::StateSpace};

    fn table() -> ValueTable {
        let mut table = ValueTable::new(StateSpace::new(vec![3, 2]).unwrap(), 4, 0.0).unwrap();
        table.set(&[2, 1].into(), 3, 7.5).unwrap();
        table
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("table.qtable");

        let repo = MsgPackRepository::new();
        repo.save(&table(), &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");

        assert_eq!(loaded, table());
    }

    #[test]
    fn test_overwrite_replaces_previous_table() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("table.qtable");
        let repo = MsgPackRepository::new();

        repo.save(&table(), &file_path).unwrap();
        let mut newer = table();
        newer.set(&[0, 0].into(), 0, -2.0).unwrap();
        repo.save(&newer, &file_path).unwrap();

        assert_eq!(repo.load(&file_path).unwrap(), newer);
    }

    #[test]
    fn test_load_matching_rejects_other_levels() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("table.qtable");
        let repo = MsgPackRepository::new();
        repo.save(&table(), &file_path).unwrap();

        let result = repo.load_matching(&file_path, &[2, 3]);
        assert!(matches!(result, Err(Error::LevelMismatch { .. })));
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.load(Path::new("/tmp/nonexistent_qracer_12345.qtable"));
        assert!(result.is_err());
    }

    #[test]
    fn test_save_to_invalid_path_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.save(&table(), Path::new("/invalid_dir_12345/table.qtable"));
        assert!(result.is_err());
    }
}
