//! Correlation ID tracking shared by audit records and log output.

use std::sync::OnceLock;
use uuid::Uuid;

/// Global correlation ID for the current process.
static CORRELATION_ID: OnceLock<Uuid> = OnceLock::new();

/// Get or create a correlation ID for the current process.
///
/// This returns the same ID throughout the lifetime of the process,
/// allowing all records to be correlated together.
#[must_use]
pub fn correlation_id() -> Uuid {
    *CORRELATION_ID.get_or_init(Uuid::new_v4)
}

/// Set the correlation ID for the current process.
///
/// This can only be called once; subsequent calls will be ignored.
/// Returns `true` if the ID was set, `false` if it was already set.
pub fn set_correlation_id(id: Uuid) -> bool {
    CORRELATION_ID.set(id).is_ok()
}
