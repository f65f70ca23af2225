// app/src/store/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("invoice '{0}' already has a live order")]
  DuplicateInvoice(String),

  #[error("order store unavailable: {0}")]
  Unavailable(#[from] sqlx::Error),

  #[error("migration failed: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("corrupt row: {0}")]
  Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
  match err {
    sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
    _ => false,
  }
}
