//! Store handle for the dormitory database workspace.
//!
//! A `Store` points at a `.domus/` directory holding the SQLite database,
//! the broker audit log, and the version file. All subsystem state
//! (directory, occupancy, requests) is scoped to a store.

use std::path::PathBuf;

/// Handle to a dormitory state workspace.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the `.domus/` directory.
    pub root: PathBuf,
}

impl Store {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}
