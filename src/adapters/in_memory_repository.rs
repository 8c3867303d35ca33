//! In-memory table repository for testing.
//!
//! Keeps encoded snapshots in a shared map so tests exercise the same
//! encoding as the file-backed repository without touching the disk.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    Result, error::Error, ports::TableRepository, snapshot::TableSnapshot,
    value_table::ValueTable,
};

/// In-memory repository for testing.
///
/// All clones share the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map still holds whole snapshots; keep using it.
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of tables currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(&key(path))
    }

    fn snapshot(&self, path: &Path) -> Result<TableSnapshot> {
        let storage = self.storage();
        let bytes = storage.get(&key(path)).ok_or_else(|| Error::Io {
            operation: format!("load table from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;
        TableSnapshot::from_bytes(bytes)
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl TableRepository for InMemoryRepository {
    fn save(&self, table: &ValueTable, path: &Path) -> Result<()> {
        let bytes = TableSnapshot::from_table(table).to_bytes()?;
        self.storage().insert(key(path), bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<ValueTable> {
        self.snapshot(path)?.into_table()
    }

    fn load_matching(&self, path: &Path, levels: &[usize]) -> Result<ValueTable> {
        self.snapshot(path)?.into_table_matching(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_space::StateSpace;

    fn table() -> ValueTable {
        ValueTable::new(StateSpace::new(vec![2, 2]).unwrap(), 3, 0.0).unwrap()
    }

    #[test]
    fn test_in_memory_save_and_load() {
        let repo = InMemoryRepository::new();
        let path = Path::new("agent_one");

        assert_eq!(repo.count(), 0);
        assert!(!repo.contains(path));

        let mut table = table();
        table.set(&[1, 0].into(), 2, 3.0).unwrap();
        repo.save(&table, path).unwrap();
        assert_eq!(repo.count(), 1);
        assert!(repo.contains(path));

        assert_eq!(repo.load(path).unwrap(), table);
        assert_eq!(repo.load_matching(path, &[2, 2]).unwrap(), table);
        assert!(repo.load_matching(path, &[2, 3]).is_err());
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = InMemoryRepository::new();
        assert!(repo.load(Path::new("nonexistent")).is_err());
    }

    #[test]
    fn test_clone_shares_storage() {
        let repo1 = InMemoryRepository::new();
        let repo2 = repo1.clone();
        repo1.save(&table(), Path::new("shared")).unwrap();

        assert!(repo2.load(Path::new("shared")).is_ok());
        assert_eq!(repo2.count(), 1);

        repo2.clear();
        assert_eq!(repo1.count(), 0);
    }
}
