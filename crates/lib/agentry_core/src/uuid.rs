// Helper for generating UUIDv7 (timestamp-sortable UUIDs)
//
// Agent ids are generated app-side so that both store backends hand out
// ids with the same shape and ordering.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
