use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomusError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Resident {0} already has an active room assignment")]
    AlreadyAssigned(i64),
    #[error("Resident {0} has no active room assignment")]
    NotAssigned(i64),
    #[error("Room {0} is at capacity")]
    RoomFull(i64),
    #[error("Unknown request type id {0} (expected 1, 2, or 3)")]
    InvalidRequestType(i64),
}
