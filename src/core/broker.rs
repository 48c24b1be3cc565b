use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use ulid::Ulid;

/// The DB Broker is the thin waist for state access: every read and
/// every mutation of the store routes through it, serialized by an
/// in-process lock and recorded in an append-only audit log.
pub struct DbBroker {
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

static DB_LOCK: Mutex<()> = Mutex::new(());

impl DbBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            audit_log_path: root.join(schemas::BROKER_EVENTS_NAME),
        }
    }

    /// Execute a read-only closure with a serialized connection.
    pub fn with_conn<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::DomusError>
    where
        F: FnOnce(&Connection) -> Result<R, error::DomusError>,
    {
        let _lock = DB_LOCK.lock().unwrap();

        let conn = db::db_connect(&db_path.to_string_lossy())?;
        let result = f(&conn);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(actor, op_name, db_path, status)?;

        result
    }

    /// Execute a mutating closure inside a single SQLite transaction.
    ///
    /// The closure's checks and writes commit together on `Ok` and roll
    /// back together on `Err`, so a capacity check and the insert it
    /// guards are never observably separated.
    pub fn with_txn<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::DomusError>
    where
        F: FnOnce(&Connection) -> Result<R, error::DomusError>,
    {
        let _lock = DB_LOCK.lock().unwrap();

        let conn = db::db_connect(&db_path.to_string_lossy())?;
        let txn = conn.unchecked_transaction()?;
        let result = f(&txn);

        match result {
            Ok(value) => {
                txn.commit()?;
                self.log_event(actor, op_name, db_path, "success")?;
                Ok(value)
            }
            Err(e) => {
                let _ = txn.rollback();
                self.log_event(actor, op_name, db_path, "error")?;
                Err(e)
            }
        }
    }

    fn log_event(
        &self,
        actor: &str,
        op: &str,
        db_path: &Path,
        status: &str,
    ) -> Result<(), error::DomusError> {
        use std::fs::OpenOptions;
        use std::io::Write;
        use std::time::{SystemTime, UNIX_EPOCH};

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let ts = format!("{}Z", secs);

        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let ev = BrokerEvent {
            ts,
            event_id: Ulid::new().to_string(),
            actor: actor.to_string(),
            op: op.to_string(),
            db_id,
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(error::DomusError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev)?).map_err(error::DomusError::IoError)?;
        Ok(())
    }
}
