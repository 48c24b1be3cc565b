use crate::core::error;
use crate::core::schemas;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &str) -> Result<Connection, error::DomusError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::DomusError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::DomusError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::DomusError::RusqliteError)?;
    Ok(conn)
}

pub fn domus_db_path(root: &Path) -> PathBuf {
    root.join(schemas::DOMUS_DB_NAME)
}

/// Bring the database up to `schemas::SCHEMA_VERSION`.
///
/// Idempotent: each step runs at most once, gated by the `meta` table.
/// Version 1 is the base layout; version 2 adds the request resolution
/// columns (status, note, resolved_at) that turn deletion-as-terminal
/// into an auditable ledger.
pub fn ensure_schema(conn: &Connection) -> Result<(), error::DomusError> {
    conn.execute(schemas::DB_SCHEMA_META, [])?;

    let current: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(error::DomusError::RusqliteError)?;

    let current_version: u32 = current
        .as_deref()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0);

    if current_version >= schemas::SCHEMA_VERSION {
        return Ok(());
    }

    if current_version < 1 {
        conn.execute(schemas::DB_SCHEMA_ADMINISTRATORS, [])?;
        conn.execute(schemas::DB_SCHEMA_BUILDINGS, [])?;
        conn.execute(schemas::DB_SCHEMA_ROOMS, [])?;
        conn.execute(schemas::DB_SCHEMA_RESIDENTS, [])?;
        conn.execute(schemas::DB_SCHEMA_ASSIGNMENTS, [])?;
        conn.execute(schemas::DB_SCHEMA_REQUEST_KINDS, [])?;
        conn.execute(schemas::DB_SCHEMA_REQUESTS, [])?;
        conn.execute(schemas::DB_SCHEMA_INDEX_ASSIGNMENTS_RESIDENT, [])?;
        conn.execute(schemas::DB_SCHEMA_INDEX_ASSIGNMENTS_ROOM, [])?;
        conn.execute(schemas::DB_SCHEMA_INDEX_REQUESTS_RESIDENT, [])?;
        seed_request_kinds(conn)?;
    }

    if current_version < 2 {
        let _ = conn.execute(
            "ALTER TABLE requests ADD COLUMN status TEXT NOT NULL DEFAULT 'pending'",
            [],
        );
        let _ = conn.execute("ALTER TABLE requests ADD COLUMN note TEXT", []);
        let _ = conn.execute("ALTER TABLE requests ADD COLUMN resolved_at TEXT", []);
        conn.execute(schemas::DB_SCHEMA_INDEX_REQUESTS_STATUS, [])?;
    }

    conn.execute(
        "INSERT INTO meta(key, value) VALUES('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [schemas::SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

fn seed_request_kinds(conn: &Connection) -> Result<(), error::DomusError> {
    for (id, name, comment) in schemas::REQUEST_KIND_ROWS {
        conn.execute(
            "INSERT OR IGNORE INTO request_kinds(id, name, comment) VALUES(?1, ?2, ?3)",
            params![id, name, comment],
        )?;
    }
    Ok(())
}

/// Populate a fresh store with a small demo campus: two buildings, a
/// dozen rooms, housed and unhoused residents, and a request backlog.
/// Skipped entirely when the store already holds residents.
pub fn seed_demo_data(conn: &Connection) -> Result<(), error::DomusError> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM residents", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(());
    }

    conn.execute(
        "INSERT INTO administrators(given_name, family_name, credential) VALUES('Margaret', 'Holt', 'north-key')",
        [],
    )?;
    conn.execute(
        "INSERT INTO administrators(given_name, family_name, credential) VALUES('Samuel', 'Reyes', 'south-key')",
        [],
    )?;

    conn.execute(
        "INSERT INTO buildings(number, room_count, admin_id) VALUES(1, 6, 1)",
        [],
    )?;
    conn.execute(
        "INSERT INTO buildings(number, room_count, admin_id) VALUES(2, 6, 2)",
        [],
    )?;

    let rooms: [(i64, i64, i64); 12] = [
        (101, 4, 1),
        (102, 3, 1),
        (103, 4, 1),
        (201, 4, 1),
        (202, 3, 1),
        (203, 4, 1),
        (301, 3, 2),
        (302, 4, 2),
        (303, 3, 2),
        (401, 3, 2),
        (402, 4, 2),
        (403, 3, 2),
    ];
    for (number, capacity, building_id) in rooms {
        conn.execute(
            "INSERT INTO rooms(number, capacity, building_id) VALUES(?1, ?2, ?3)",
            params![number, capacity, building_id],
        )?;
    }

    let residents: [(&str, &str, i64); 16] = [
        ("Alice", "Ward", 123456),
        ("Ben", "Carver", 222333),
        ("Clara", "Osei", 333444),
        ("Daniel", "Frost", 444555),
        ("Edith", "Marsh", 555666),
        ("Felix", "Nowak", 666777),
        ("Grace", "Lindqvist", 777888),
        ("Henry", "Abara", 888999),
        ("Ingrid", "Falk", 999000),
        ("Jonas", "Berg", 100101),
        ("Katya", "Ilves", 101102),
        ("Leo", "Tanaka", 102103),
        ("Mira", "Sandoval", 200001),
        ("Noah", "Pike", 200002),
        ("Olga", "Vasquez", 200003),
        ("Peter", "Quill", 300001),
    ];
    for (idx, (given, family, ticket)) in residents.iter().enumerate() {
        conn.execute(
            "INSERT INTO residents(given_name, family_name, ticket, credential) VALUES(?1, ?2, ?3, ?4)",
            params![given, family, ticket, format!("pass{}", idx + 1)],
        )?;
    }

    // House the first twelve residents, first-fit into whatever room
    // still has capacity. The remaining four stay unassigned so the
    // seeded requests below have something to do.
    let resident_ids: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT id FROM residents ORDER BY id LIMIT 12")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        out
    };
    for resident_id in resident_ids {
        let room_id: Option<i64> = conn
            .query_row(
                "SELECT r.id FROM rooms r
                 LEFT JOIN assignments a ON r.id = a.room_id
                 GROUP BY r.id
                 HAVING COUNT(a.id) < r.capacity
                 ORDER BY r.id
                 LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(room_id) = room_id {
            conn.execute(
                "INSERT INTO assignments(resident_id, room_id) VALUES(?1, ?2)",
                params![resident_id, room_id],
            )?;
        }
    }

    let requests: [(i64, &str, &str, i64, &str); 6] = [
        (1, "Move-in application", "2026-01-15", 13, "Requesting a place in any building"),
        (1, "Move-in application", "2026-01-16", 14, "Requesting a place near campus"),
        (1, "Move-in application", "2026-01-17", 15, "Requesting a shared room"),
        (2, "Move-out notice", "2026-01-25", 1, "Leaving at the end of term"),
        (3, "Room change", "2026-01-30", 2, "Requesting a quieter room"),
        (3, "Room change", "2026-01-31", 3, "Requesting a room with free desk space"),
    ];
    for (kind_id, name, date, resident_id, body) in requests {
        conn.execute(
            "INSERT INTO requests(kind_id, name, date, resident_id, body) VALUES(?1, ?2, ?3, ?4, ?5)",
            params![kind_id, name, date, resident_id, body],
        )?;
    }

    Ok(())
}
