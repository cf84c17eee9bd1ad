//! Blocking-pool helper shared by the SQLite stores
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tara_core::TaraError;
use tokio::task;

pub(crate) fn store_error(err: impl std::fmt::Display) -> TaraError {
    TaraError::StoreError(err.to_string())
}

/// Runs `f` against a fresh read-write connection on the blocking pool.
pub(crate) async fn with_connection<T, F>(path: &Path, f: F) -> Result<T, TaraError>
where
    F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let path: PathBuf = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut conn = Connection::open(&path)?;
        f(&mut conn)
    })
    .await
    .map_err(store_error)?
    .map_err(store_error)
}

/// Same as [`with_connection`] but never creates the database file.
pub(crate) async fn with_read_only<T, F>(path: &Path, f: F) -> Result<T, TaraError>
where
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let path: PathBuf = path.to_path_buf();
    task::spawn_blocking(move || {
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        f(&conn)
    })
    .await
    .map_err(store_error)?
    .map_err(store_error)
}
