//! Occupancy queries and the allocation engine.
//!
//! The query half derives free/occupied status live from the assignment
//! relation; nothing is cached. The engine half mutates the relation
//! under two invariants: a resident holds at most one active assignment,
//! and a room never holds more residents than its capacity. Every
//! mutation runs inside a single broker transaction so the check and the
//! write land together or not at all.

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error::DomusError;
use crate::core::store::Store;
use crate::plugins::directory::{self, Resident};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub number: i64,
    pub room_count: i64,
    pub admin_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub number: i64,
    pub capacity: i64,
    pub building_id: i64,
}

/// A room together with its live occupant count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomOccupancy {
    pub room: Room,
    pub occupied: i64,
}

fn map_room(row: &Row) -> Result<Room, rusqlite::Error> {
    Ok(Room {
        id: row.get(0)?,
        number: row.get(1)?,
        capacity: row.get(2)?,
        building_id: row.get(3)?,
    })
}

fn map_building(row: &Row) -> Result<Building, rusqlite::Error> {
    Ok(Building {
        id: row.get(0)?,
        number: row.get(1)?,
        room_count: row.get(2)?,
        admin_id: row.get(3)?,
    })
}

pub(crate) fn fetch_room(conn: &Connection, room_id: i64) -> Result<Option<Room>, DomusError> {
    conn.query_row(
        "SELECT id, number, capacity, building_id FROM rooms WHERE id = ?1",
        [room_id],
        |row| map_room(row),
    )
    .optional()
    .map_err(DomusError::RusqliteError)
}

pub(crate) fn require_room(conn: &Connection, room_id: i64) -> Result<Room, DomusError> {
    fetch_room(conn, room_id)?.ok_or_else(|| DomusError::NotFound(format!("room {}", room_id)))
}

/// Room currently held by a resident, if any. The engine keeps this at
/// most one row.
pub(crate) fn held_room_id(conn: &Connection, resident_id: i64) -> Result<Option<i64>, DomusError> {
    conn.query_row(
        "SELECT room_id FROM assignments WHERE resident_id = ?1 LIMIT 1",
        [resident_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(DomusError::RusqliteError)
}

fn occupied_count(conn: &Connection, room_id: i64) -> Result<i64, DomusError> {
    conn.query_row(
        "SELECT COUNT(*) FROM assignments WHERE room_id = ?1",
        [room_id],
        |row| row.get(0),
    )
    .map_err(DomusError::RusqliteError)
}

// --- allocation engine, connection level ---
//
// These run inside the caller's transaction. The request lifecycle
// composes them with its own status updates in one commit.

pub(crate) fn settle_on(
    conn: &Connection,
    resident_id: i64,
    room_id: i64,
) -> Result<(), DomusError> {
    directory::require_resident(conn, resident_id)?;
    let room = require_room(conn, room_id)?;

    if held_room_id(conn, resident_id)?.is_some() {
        return Err(DomusError::AlreadyAssigned(resident_id));
    }
    if occupied_count(conn, room_id)? >= room.capacity {
        return Err(DomusError::RoomFull(room_id));
    }

    conn.execute(
        "INSERT INTO assignments(resident_id, room_id) VALUES(?1, ?2)",
        params![resident_id, room_id],
    )?;
    Ok(())
}

pub(crate) fn evict_on(conn: &Connection, resident_id: i64) -> Result<(), DomusError> {
    directory::require_resident(conn, resident_id)?;
    // Idempotent: deleting zero rows is a valid outcome.
    conn.execute(
        "DELETE FROM assignments WHERE resident_id = ?1",
        [resident_id],
    )?;
    Ok(())
}

pub(crate) fn transfer_on(
    conn: &Connection,
    resident_id: i64,
    new_room_id: i64,
) -> Result<(), DomusError> {
    directory::require_resident(conn, resident_id)?;
    let new_room = require_room(conn, new_room_id)?;

    if held_room_id(conn, resident_id)?.is_none() {
        return Err(DomusError::NotAssigned(resident_id));
    }

    // Capacity is checked before anything is vacated, counting every
    // occupant except the transferring resident, so a failed transfer
    // leaves the resident exactly where they were.
    let occupied_by_others: i64 = conn.query_row(
        "SELECT COUNT(*) FROM assignments WHERE room_id = ?1 AND resident_id != ?2",
        params![new_room_id, resident_id],
        |row| row.get(0),
    )?;
    if occupied_by_others >= new_room.capacity {
        return Err(DomusError::RoomFull(new_room_id));
    }

    conn.execute(
        "DELETE FROM assignments WHERE resident_id = ?1",
        [resident_id],
    )?;
    conn.execute(
        "INSERT INTO assignments(resident_id, room_id) VALUES(?1, ?2)",
        params![resident_id, new_room_id],
    )?;
    Ok(())
}

// --- allocation engine, store level ---

/// Assign an unassigned resident to a room with free capacity.
pub fn settle(store: &Store, resident_id: i64, room_id: i64) -> Result<(), DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "occupancy.settle", |conn| {
        db::ensure_schema(conn)?;
        settle_on(conn, resident_id, room_id)
    })
}

/// Remove a resident's current assignment. A no-op when unassigned.
pub fn evict(store: &Store, resident_id: i64) -> Result<(), DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "occupancy.evict", |conn| {
        db::ensure_schema(conn)?;
        evict_on(conn, resident_id)
    })
}

/// Move a resident from their current room to another.
pub fn transfer(store: &Store, resident_id: i64, new_room_id: i64) -> Result<(), DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "occupancy.transfer", |conn| {
        db::ensure_schema(conn)?;
        transfer_on(conn, resident_id, new_room_id)
    })
}

/// Evict a resident, but only when they are housed in the building owned
/// by the given administrator.
pub fn evict_from_building(
    store: &Store,
    admin_id: i64,
    resident_id: i64,
) -> Result<(), DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "occupancy.evict_from_building", |conn| {
        db::ensure_schema(conn)?;
        directory::require_resident(conn, resident_id)?;

        let housed_here: Option<i64> = conn
            .query_row(
                "SELECT a.id FROM assignments a
                 JOIN rooms r ON a.room_id = r.id
                 JOIN buildings b ON r.building_id = b.id
                 WHERE b.admin_id = ?1 AND a.resident_id = ?2",
                params![admin_id, resident_id],
                |row| row.get(0),
            )
            .optional()?;
        if housed_here.is_none() {
            return Err(DomusError::NotFound(format!(
                "resident {} in a building of administrator {}",
                resident_id, admin_id
            )));
        }

        conn.execute(
            "DELETE FROM assignments WHERE resident_id = ?1",
            [resident_id],
        )?;
        Ok(())
    })
}

// --- occupancy queries ---
//
// Read-only; "found nothing" is an empty sequence or None, never an error.

pub fn room_occupants(store: &Store, room_id: i64) -> Result<Vec<Resident>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "occupancy.room_occupants", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt = conn.prepare(
            "SELECT s.id, s.given_name, s.family_name, s.ticket FROM residents s
             JOIN assignments a ON s.id = a.resident_id
             WHERE a.room_id = ?1",
        )?;
        let rows = stmt.query_map([room_id], |row| directory::map_resident(row))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

/// Rooms with spare capacity, recomputed from the assignment relation on
/// every call.
pub fn free_rooms(store: &Store) -> Result<Vec<RoomOccupancy>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "occupancy.free_rooms", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.number, r.capacity, r.building_id, COUNT(a.id) AS occupied
             FROM rooms r
             LEFT JOIN assignments a ON r.id = a.room_id
             GROUP BY r.id
             HAVING occupied < r.capacity
             ORDER BY r.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RoomOccupancy {
                room: map_room(row)?,
                occupied: row.get(4)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub fn resident_room(store: &Store, resident_id: i64) -> Result<Option<Room>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "occupancy.resident_room", |conn| {
        db::ensure_schema(conn)?;
        conn.query_row(
            "SELECT r.id, r.number, r.capacity, r.building_id FROM rooms r
             JOIN assignments a ON r.id = a.room_id
             WHERE a.resident_id = ?1",
            [resident_id],
            |row| map_room(row),
        )
        .optional()
        .map_err(DomusError::RusqliteError)
    })
}

/// Every resident housed somewhere in the building.
pub fn building_roster(store: &Store, building_id: i64) -> Result<Vec<Resident>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "occupancy.building_roster", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt = conn.prepare(
            "SELECT s.id, s.given_name, s.family_name, s.ticket FROM residents s
             JOIN assignments a ON s.id = a.resident_id
             JOIN rooms r ON a.room_id = r.id
             WHERE r.building_id = ?1",
        )?;
        let rows = stmt.query_map([building_id], |row| directory::map_resident(row))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub fn rooms_in_building(
    store: &Store,
    building_id: i64,
) -> Result<Vec<RoomOccupancy>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "occupancy.rooms_in_building", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.number, r.capacity, r.building_id, COUNT(a.id) AS occupied
             FROM rooms r
             LEFT JOIN assignments a ON r.id = a.room_id
             WHERE r.building_id = ?1
             GROUP BY r.id
             ORDER BY r.number",
        )?;
        let rows = stmt.query_map([building_id], |row| {
            Ok(RoomOccupancy {
                room: map_room(row)?,
                occupied: row.get(4)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub fn list_buildings(store: &Store) -> Result<Vec<Building>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "occupancy.list_buildings", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt =
            conn.prepare("SELECT id, number, room_count, admin_id FROM buildings ORDER BY id")?;
        let rows = stmt.query_map([], |row| map_building(row))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub fn building_of_admin(store: &Store, admin_id: i64) -> Result<Option<Building>, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_conn(&db_path, "domus", "occupancy.building_of_admin", |conn| {
        db::ensure_schema(conn)?;
        conn.query_row(
            "SELECT id, number, room_count, admin_id FROM buildings WHERE admin_id = ?1",
            [admin_id],
            |row| map_building(row),
        )
        .optional()
        .map_err(DomusError::RusqliteError)
    })
}

pub fn add_building(
    store: &Store,
    number: i64,
    room_count: i64,
    admin_id: i64,
) -> Result<i64, DomusError> {
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "occupancy.add_building", |conn| {
        db::ensure_schema(conn)?;
        let admin_exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM administrators WHERE id = ?1",
                [admin_id],
                |row| row.get(0),
            )
            .optional()?;
        if admin_exists.is_none() {
            return Err(DomusError::NotFound(format!("administrator {}", admin_id)));
        }
        conn.execute(
            "INSERT INTO buildings(number, room_count, admin_id) VALUES(?1, ?2, ?3)",
            params![number, room_count, admin_id],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn add_room(
    store: &Store,
    number: i64,
    capacity: i64,
    building_id: i64,
) -> Result<i64, DomusError> {
    if capacity < 1 {
        return Err(DomusError::ValidationError(format!(
            "room capacity must be at least 1, got {}",
            capacity
        )));
    }
    let broker = DbBroker::new(&store.root);
    let db_path = db::domus_db_path(&store.root);
    broker.with_txn(&db_path, "domus", "occupancy.add_room", |conn| {
        db::ensure_schema(conn)?;
        let building_exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM buildings WHERE id = ?1",
                [building_id],
                |row| row.get(0),
            )
            .optional()?;
        if building_exists.is_none() {
            return Err(DomusError::NotFound(format!("building {}", building_id)));
        }
        conn.execute(
            "INSERT INTO rooms(number, capacity, building_id) VALUES(?1, ?2, ?3)",
            params![number, capacity, building_id],
        )?;
        Ok(conn.last_insert_rowid())
    })
}
