//! Human-readable reference codes for cases and payment receipts.
//!
//! Codes embed the owning id and a second-resolution timestamp. Two codes for
//! the same owner within the same second collide; the unique constraint on the
//! target column turns that into a conflict the caller can retry.

use chrono::NaiveDateTime;

pub const CASE_PREFIX: &str = "CASO";
pub const RECEIPT_PREFIX: &str = "REC";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

fn reference_code(prefix: &str, owner_id: i32, at: NaiveDateTime) -> String {
    format!("{prefix}-{owner_id}-{}", at.format(TIMESTAMP_FORMAT))
}

pub fn case_reference(client_id: i32, at: NaiveDateTime) -> String {
    reference_code(CASE_PREFIX, client_id, at)
}

pub fn receipt_reference(case_id: i32, at: NaiveDateTime) -> String {
    reference_code(RECEIPT_PREFIX, case_id, at)
}
