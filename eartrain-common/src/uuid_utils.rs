//! Row identifiers
//!
//! Every entity id is a random UUIDv4 stored as its hyphenated TEXT form.

use uuid::Uuid;

/// Fresh id for a new row
pub fn new_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}
