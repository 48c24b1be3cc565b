//! Version tracking for the store directory.
//!
//! The binary's version is written to `.domus/domus.version` at init.
//! On every later command the stored version is compared against the
//! running binary; a mismatch re-runs `ensure_schema` so the database
//! picks up any new schema steps, then the file is rewritten.

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error;
use std::fs;
use std::path::Path;

pub const DOMUS_VERSION: &str = env!("CARGO_PKG_VERSION");

const VERSION_FILE: &str = "domus.version";

pub fn write_version(root: &Path) -> Result<(), error::DomusError> {
    fs::write(root.join(VERSION_FILE), DOMUS_VERSION).map_err(error::DomusError::IoError)
}

pub fn check_and_migrate(root: &Path) -> Result<(), error::DomusError> {
    let version_path = root.join(VERSION_FILE);

    let stored_version = if version_path.exists() {
        fs::read_to_string(&version_path)
            .map_err(error::DomusError::IoError)?
            .trim()
            .to_string()
    } else {
        String::new()
    };

    if stored_version == DOMUS_VERSION {
        return Ok(());
    }

    let broker = DbBroker::new(root);
    let db_path = db::domus_db_path(root);
    broker.with_txn(&db_path, "domus", "store.migrate", |conn| {
        db::ensure_schema(conn)
    })?;

    write_version(root)
}
