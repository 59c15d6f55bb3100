//! ULID identifiers for matching runs.
//!
//! The process gets one id at first access; every `rank` call additionally
//! gets its own `match_run_id` so log lines of concurrent requests can be
//! told apart.

use once_cell::sync::Lazy;
use ulid::Ulid;

static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Process-level run id, same value for the whole process lifetime.
#[inline]
pub fn get() -> &'static str {
    &RUN_ID
}

/// Fresh, time-ordered id for a single request.
#[inline]
pub fn generate() -> String {
    Ulid::new().to_string()
}
