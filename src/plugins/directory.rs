//! Resident and administrator directory: listings, lookups, and the
//! identity collaborator (exact-match credential checks).
//!
//! Credentials never leave this module: the entity structs carry no
//! credential field, so listings and exports cannot leak one.

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error::DomusError;
use crate::core::store::Store;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    pub id: i64,
    pub given_name: String,
    pub family_name: String,
    pub ticket: i64,
}

impl Resident {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Administrator {
    pub id: i64,
    pub given_name: String,
    pub family_name: String,
}

pub(crate) fn map_resident(row: &Row) -> Result<Resident, rusqlite::Error> {
    Ok(Resident {
        id: row.get(0)?,
        given_name: row.get(1)?,
        family_name: row.get(2)?,
        ticket: row.get(3)?,
    })
}

pub(crate) fn fetch_resident(
    conn: &Connection,
    resident_id: i64,
) -> Result<Option<Resident>, DomusError> {
    conn.query_row(
        "SELECT id, given_name, family_name, ticket FROM residents WHERE id = ?1",
        [resident_id],
        |row| map_resident(row),
    )
    .optional()
    .map_err(DomusError::RusqliteError)
}

/// Fetch a resident or fail with `NotFound`.
pub(crate) fn require_resident(
    conn: &Connection,
    resident_id: i64,
) -> Result<Resident, DomusError> {
    fetch_resident(conn, resident_id)?
        .ok_or_else(|| DomusError::NotFound(format!("resident {}", resident_id)))
}

pub fn get_resident(store: &Store, resident_id: i64) -> Result<Resident, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "directory.get_resident", |conn| {
        db::ensure_schema(conn)?;
        require_resident(conn, resident_id)
    })
}

pub fn list_residents(store: &Store) -> Result<Vec<Resident>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "directory.list_residents", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt =
            conn.prepare("SELECT id, given_name, family_name, ticket FROM residents ORDER BY id")?;
        let rows = stmt.query_map([], |row| map_resident(row))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub fn list_administrators(store: &Store) -> Result<Vec<Administrator>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "directory.list_administrators", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt =
            conn.prepare("SELECT id, given_name, family_name FROM administrators ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Administrator {
                id: row.get(0)?,
                given_name: row.get(1)?,
                family_name: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub fn add_resident(
    store: &Store,
    given_name: &str,
    family_name: &str,
    ticket: i64,
    credential: &str,
) -> Result<i64, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "directory.add_resident", |conn| {
        db::ensure_schema(conn)?;
        conn.execute(
            "INSERT INTO residents(given_name, family_name, ticket, credential) VALUES(?1, ?2, ?3, ?4)",
            params![given_name, family_name, ticket, credential],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn add_administrator(
    store: &Store,
    given_name: &str,
    family_name: &str,
    credential: &str,
) -> Result<i64, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "directory.add_administrator", |conn| {
        db::ensure_schema(conn)?;
        conn.execute(
            "INSERT INTO administrators(given_name, family_name, credential) VALUES(?1, ?2, ?3)",
            params![given_name, family_name, credential],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Exact-match lookup, case-sensitive, plaintext compare. `None` means
/// the pair did not match; the caller decides how to re-prompt.
pub fn authenticate_resident(
    store: &Store,
    family_name: &str,
    credential: &str,
) -> Result<Option<Resident>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "directory.auth_resident", |conn| {
        db::ensure_schema(conn)?;
        conn.query_row(
            "SELECT id, given_name, family_name, ticket FROM residents
             WHERE family_name = ?1 AND credential = ?2",
            params![family_name, credential],
            |row| map_resident(row),
        )
        .optional()
        .map_err(DomusError::RusqliteError)
    })
}

pub fn authenticate_administrator(
    store: &Store,
    family_name: &str,
    credential: &str,
) -> Result<Option<Administrator>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "directory.auth_administrator", |conn| {
        db::ensure_schema(conn)?;
        conn.query_row(
            "SELECT id, given_name, family_name FROM administrators
             WHERE family_name = ?1 AND credential = ?2",
            params![family_name, credential],
            |row| {
                Ok(Administrator {
                    id: row.get(0)?,
                    given_name: row.get(1)?,
                    family_name: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(DomusError::RusqliteError)
    })
}
