//! Error type for `paperrank-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] paperrank_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("paper already stored: {0}")]
  DuplicatePaper(String),

  #[error("paper not found: {0}")]
  PaperNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
