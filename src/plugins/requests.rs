//! Request lifecycle: submission, listing, and resolution.
//!
//! A request is pending from submission until an administrator resolves
//! it. Resolution marks the row (status, note, resolved_at) rather than
//! deleting it, so the ledger keeps an audit trail; pending listings
//! exclude resolved rows, which preserves the observable behavior that a
//! resolved request disappears. Approval dispatches into the allocation
//! engine inside the same transaction that marks the request resolved.

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error::DomusError;
use crate::core::store::Store;
use crate::core::time;
use crate::plugins::directory::{self, Resident};
use crate::plugins::occupancy;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

/// The closed set of request kinds. The catalog table mirrors this; the
/// engine dispatches on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Settle,
    Evict,
    Transfer,
}

impl RequestKind {
    pub fn from_id(id: i64) -> Result<Self, DomusError> {
        match id {
            1 => Ok(Self::Settle),
            2 => Ok(Self::Evict),
            3 => Ok(Self::Transfer),
            other => Err(DomusError::InvalidRequestType(other)),
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::Settle => 1,
            Self::Evict => 2,
            Self::Transfer => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Settle => "settle",
            Self::Evict => "evict",
            Self::Transfer => "transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: i64,
    pub kind_id: i64,
    pub name: String,
    pub date: String,
    pub resident_id: i64,
    pub body: String,
    pub status: String,
    pub note: Option<String>,
    pub resolved_at: Option<String>,
}

impl RequestRecord {
    pub fn kind(&self) -> Result<RequestKind, DomusError> {
        RequestKind::from_id(self.kind_id)
    }
}

/// Everything the presentation layer needs to compose a resolution
/// message to the resident. Produced by `resolve`; never fed back in.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub resident: Resident,
    pub request_id: i64,
    pub request_name: String,
    pub request_date: String,
    pub decision: Decision,
    pub note: String,
}

const SELECT_REQUEST: &str =
    "SELECT id, kind_id, name, date, resident_id, body, status, note, resolved_at FROM requests";

fn map_request(row: &Row) -> Result<RequestRecord, rusqlite::Error> {
    Ok(RequestRecord {
        id: row.get(0)?,
        kind_id: row.get(1)?,
        name: row.get(2)?,
        date: row.get(3)?,
        resident_id: row.get(4)?,
        body: row.get(5)?,
        status: row.get(6)?,
        note: row.get(7)?,
        resolved_at: row.get(8)?,
    })
}

fn validate_date(date: &str) -> Result<(), DomusError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        DomusError::ValidationError(format!("date '{}' is not ISO 8601 (YYYY-MM-DD)", date))
    })?;
    Ok(())
}

/// Submit a new request. No business-rule pre-check beyond kind, date,
/// and resident existence; whether the request can actually be honored
/// is decided at resolution time.
pub fn submit(
    store: &Store,
    kind_id: i64,
    name: &str,
    date: &str,
    resident_id: i64,
    body: &str,
) -> Result<i64, DomusError> {
    let kind = RequestKind::from_id(kind_id)?;
    validate_date(date)?;

    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "requests.submit", |conn| {
        db::ensure_schema(conn)?;
        directory::require_resident(conn, resident_id)?;
        conn.execute(
            "INSERT INTO requests(kind_id, name, date, resident_id, body) VALUES(?1, ?2, ?3, ?4, ?5)",
            params![kind.id(), name, date, resident_id, body],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

fn list_where(
    store: &Store,
    op_name: &str,
    where_clause: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<RequestRecord>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    let query = format!("{} {} ORDER BY id", SELECT_REQUEST, where_clause);
    broker.with_conn(&db_path, "domus", op_name, |conn| {
        db::ensure_schema(conn)?;
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(params, |row| map_request(row))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

/// All live requests. Resolved requests have left every listing, so this
/// equals `list_pending`.
pub fn list_all(store: &Store) -> Result<Vec<RequestRecord>, DomusError> {
    list_where(store, "requests.list_all", "WHERE status = 'pending'", &[])
}

pub fn list_pending(store: &Store) -> Result<Vec<RequestRecord>, DomusError> {
    list_where(
        store,
        "requests.list_pending",
        "WHERE status = 'pending'",
        &[],
    )
}

/// A resident's own pending requests.
pub fn list_for_resident(
    store: &Store,
    resident_id: i64,
) -> Result<Vec<RequestRecord>, DomusError> {
    list_where(
        store,
        "requests.list_for_resident",
        "WHERE status = 'pending' AND resident_id = ?1",
        &[&resident_id],
    )
}

/// Resolved requests, oldest first. The audit trail surface.
pub fn list_history(store: &Store) -> Result<Vec<RequestRecord>, DomusError> {
    list_where(
        store,
        "requests.list_history",
        "WHERE status != 'pending'",
        &[],
    )
}

pub fn get_request(store: &Store, request_id: i64) -> Result<RequestRecord, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "requests.get", |conn| {
        db::ensure_schema(conn)?;
        fetch_request(conn, request_id)?
            .ok_or_else(|| DomusError::NotFound(format!("request {}", request_id)))
    })
}

fn fetch_request(
    conn: &Connection,
    request_id: i64,
) -> Result<Option<RequestRecord>, DomusError> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_REQUEST),
        [request_id],
        |row| map_request(row),
    )
    .optional()
    .map_err(DomusError::RusqliteError)
}

/// Resolve a pending request.
///
/// Approval dispatches on the request kind: settle and transfer need a
/// caller-chosen target room, evict needs the resident to hold one. Any
/// engine failure rolls the whole transaction back and the request stays
/// pending. On success (approve or reject) the row is marked resolved in
/// the same commit, and the data for a notification to the resident is
/// returned.
pub fn resolve(
    store: &Store,
    request_id: i64,
    decision: Decision,
    target_room: Option<i64>,
    note: &str,
) -> Result<Notification, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "requests.resolve", |conn| {
        db::ensure_schema(conn)?;

        let request = fetch_request(conn, request_id)?
            .filter(|r| r.status == "pending")
            .ok_or_else(|| DomusError::NotFound(format!("pending request {}", request_id)))?;
        let resident = directory::require_resident(conn, request.resident_id)?;

        if decision == Decision::Approve {
            match request.kind()? {
                RequestKind::Settle => {
                    let room_id = target_room.ok_or_else(|| {
                        DomusError::ValidationError(
                            "approving a settle request requires a target room id".to_string(),
                        )
                    })?;
                    occupancy::settle_on(conn, resident.id, room_id)?;
                }
                RequestKind::Evict => {
                    if occupancy::held_room_id(conn, resident.id)?.is_none() {
                        return Err(DomusError::NotAssigned(resident.id));
                    }
                    occupancy::evict_on(conn, resident.id)?;
                }
                RequestKind::Transfer => {
                    let room_id = target_room.ok_or_else(|| {
                        DomusError::ValidationError(
                            "approving a transfer request requires a target room id".to_string(),
                        )
                    })?;
                    occupancy::transfer_on(conn, resident.id, room_id)?;
                }
            }
        }

        conn.execute(
            "UPDATE requests SET status = ?1, note = ?2, resolved_at = ?3 WHERE id = ?4",
            params![decision.status(), note, time::now_epoch_z(), request_id],
        )?;

        Ok(Notification {
            resident,
            request_id: request.id,
            request_name: request.name,
            request_date: request.date,
            decision,
            note: note.to_string(),
        })
    })
}
