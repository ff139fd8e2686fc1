//! Structured logging schema and field name constants for rapport.
//!
//! All crates log with these field names so log aggregation can filter by
//! the same keys across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, best-effort work skipped |
//! | INFO  | Lifecycle events (startup, shutdown), mutations |
//! | DEBUG | Decision points, per-stream hit counts, heuristics |
//! | TRACE | Per-item iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID set by the HTTP layer. Format: UUIDv7.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "search", "database", "contacts", "storage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "unified_search", "pool", "contact_extraction"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "search", "upsert", "suggest", "bulk"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note id being operated on.
pub const NOTE_ID: &str = "note_id";

/// Contact id being operated on.
pub const CONTACT_ID: &str = "contact_id";

/// Account id being operated on.
pub const ACCOUNT_ID: &str = "account_id";

/// Email domain under consideration.
pub const DOMAIN: &str = "domain";

/// Search query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of rows touched by a mutation.
pub const ROWS_AFFECTED: &str = "rows_affected";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_snake_case() {
        for field in [
            REQUEST_ID,
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            NOTE_ID,
            CONTACT_ID,
            ACCOUNT_ID,
            DOMAIN,
            QUERY,
            DURATION_MS,
            RESULT_COUNT,
            ROWS_AFFECTED,
        ] {
            assert!(field
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
