//! Repository port for value table persistence.

use std::path::Path;

use crate::{Result, value_table::ValueTable};

/// Port for persisting and loading value tables.
///
/// Saving and loading are whole-table operations: a failed save leaves any
/// previous table at `path` intact, and a failed load yields no table at all.
/// Callers decide whether to fall back to a fresh table.
///
/// # Examples
///
/// ```no_run
/// use qracer::ports::TableRepository;
/// use qracer::value_table::ValueTable;
/// use std::path::Path;
///
/// fn checkpoint<R: TableRepository>(
///     repo: &R,
///     table: &ValueTable,
///     path: &Path,
/// ) -> qracer::Result<()> {
///     repo.save(table, path)
/// }
/// ```
pub trait TableRepository {
    /// Save a table to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be written or encoding fails.
    fn save(&self, table: &ValueTable, path: &Path) -> Result<()>;

    /// Load a table, trusting the level vector stored with it.
    fn load(&self, path: &Path) -> Result<ValueTable>;

    /// Load a table and fail unless it was built for `levels`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::LevelMismatch`] when the stored level vector
    /// differs from `levels`, besides the errors of [`TableRepository::load`].
    fn load_matching(&self, path: &Path, levels: &[usize]) -> Result<ValueTable>;
}
