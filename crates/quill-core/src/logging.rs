//! Structured logging field name constants for quill.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values |
//! | TRACE | Per-item iteration (steps, matches) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "doc", "search", "store", "notes"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "apply_edit", "share_note", "search", "ask"
pub const OPERATION: &str = "op";

/// Canonical actor identifier performing the operation.
pub const ACTOR: &str = "actor";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Snapshot version a save was based on.
pub const BASE_VERSION: &str = "base_version";

/// Search query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of steps in a transaction.
pub const STEP_COUNT: &str = "step_count";

/// Number of inserted ranges reported by the step engine.
pub const RANGE_COUNT: &str = "range_count";

/// Number of snippets returned by a search.
pub const MATCH_COUNT: &str = "match_count";

/// Number of documents included in an assembled context.
pub const NOTE_COUNT: &str = "note_count";

/// Character length of a prompt or assembled context.
pub const PROMPT_LEN: &str = "prompt_len";

/// Character length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for completion.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
