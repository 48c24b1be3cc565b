//! Centralized database schema definitions for the domus store.
//!
//! One consolidated SQLite database holds all dormitory state:
//! administrators, buildings, rooms, residents, the resident-room
//! assignment relation, and the request ledger. Schema evolution is
//! versioned through the `meta` table and applied by
//! `db::ensure_schema`; readers never branch on row shape.

pub const DOMUS_DB_NAME: &str = "domus.db";
pub const BROKER_EVENTS_NAME: &str = "broker.events.jsonl";
pub const SCHEMA_VERSION: u32 = 2;

pub const DB_SCHEMA_META: &str = "
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
";

pub const DB_SCHEMA_ADMINISTRATORS: &str = "
    CREATE TABLE IF NOT EXISTS administrators (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        given_name TEXT NOT NULL,
        family_name TEXT NOT NULL,
        credential TEXT NOT NULL
    )
";

pub const DB_SCHEMA_BUILDINGS: &str = "
    CREATE TABLE IF NOT EXISTS buildings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        number INTEGER NOT NULL,
        room_count INTEGER NOT NULL,
        admin_id INTEGER NOT NULL,
        FOREIGN KEY(admin_id) REFERENCES administrators(id)
    )
";

pub const DB_SCHEMA_ROOMS: &str = "
    CREATE TABLE IF NOT EXISTS rooms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        number INTEGER NOT NULL,
        capacity INTEGER NOT NULL,
        building_id INTEGER NOT NULL,
        FOREIGN KEY(building_id) REFERENCES buildings(id)
    )
";

pub const DB_SCHEMA_RESIDENTS: &str = "
    CREATE TABLE IF NOT EXISTS residents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        given_name TEXT NOT NULL,
        family_name TEXT NOT NULL,
        ticket INTEGER NOT NULL UNIQUE,
        credential TEXT NOT NULL
    )
";

// The (resident, room) pair is unique at the schema level. The stronger
// invariant -- at most one active assignment per resident -- is enforced
// by the allocation engine inside its transaction.
pub const DB_SCHEMA_ASSIGNMENTS: &str = "
    CREATE TABLE IF NOT EXISTS assignments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        resident_id INTEGER NOT NULL,
        room_id INTEGER NOT NULL,
        FOREIGN KEY(resident_id) REFERENCES residents(id),
        FOREIGN KEY(room_id) REFERENCES rooms(id),
        UNIQUE(resident_id, room_id)
    )
";

pub const DB_SCHEMA_REQUEST_KINDS: &str = "
    CREATE TABLE IF NOT EXISTS request_kinds (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        comment TEXT
    )
";

pub const DB_SCHEMA_REQUESTS: &str = "
    CREATE TABLE IF NOT EXISTS requests (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        date TEXT NOT NULL,
        resident_id INTEGER NOT NULL,
        body TEXT NOT NULL DEFAULT '',
        FOREIGN KEY(kind_id) REFERENCES request_kinds(id),
        FOREIGN KEY(resident_id) REFERENCES residents(id)
    )
";

pub const DB_SCHEMA_INDEX_ASSIGNMENTS_RESIDENT: &str =
    "CREATE INDEX IF NOT EXISTS idx_assignments_resident ON assignments(resident_id)";
pub const DB_SCHEMA_INDEX_ASSIGNMENTS_ROOM: &str =
    "CREATE INDEX IF NOT EXISTS idx_assignments_room ON assignments(room_id)";
pub const DB_SCHEMA_INDEX_REQUESTS_RESIDENT: &str =
    "CREATE INDEX IF NOT EXISTS idx_requests_resident ON requests(resident_id)";
pub const DB_SCHEMA_INDEX_REQUESTS_STATUS: &str =
    "CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status)";

/// The closed request-kind catalog. Settle=1, Evict=2, Transfer=3.
pub const REQUEST_KIND_ROWS: [(i64, &str, &str); 3] = [
    (1, "settle", "Move into a dormitory room"),
    (2, "evict", "Move out of the current room"),
    (3, "transfer", "Move from the current room to another"),
];
