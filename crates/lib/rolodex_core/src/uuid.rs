// Helper for generating UUIDv7 (timestamp-sortable UUIDs).
//
// Users and contacts are keyed app-side so that ids sort by creation time
// and the in-memory repository can mint the same kind of id as Postgres.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
