//! Global configuration constants for reviewlens.
//!
//! Scoring constants, input validation limits, and server defaults are defined here.
//! These are compile-time constants; runtime configuration is handled via CLI arguments
//! and environment variables in the server's `main.rs`.

/// Empirically derived increment applied by booster words ("very", "extremely").
pub const B_INCR: f64 = 0.293;

/// Empirically derived decrement applied by dampener words ("slightly", "barely").
pub const B_DECR: f64 = -0.293;

/// Extra magnitude for an ALL-CAPS word in otherwise mixed-case text.
pub const C_INCR: f64 = 0.733;

/// Scalar applied to a valence that falls inside a negation window.
pub const N_SCALAR: f64 = -0.74;

/// Smoothing constant for compound normalization: `raw / sqrt(raw^2 + alpha)`.
///
/// Approximates the maximum expected raw valence sum.
pub const NORMALIZE_ALPHA: f64 = 15.0;

/// Number of preceding tokens inspected for boosters and negations.
pub const MODIFIER_WINDOW: usize = 3;

/// Magnitude added per exclamation mark.
pub const EXCLAMATION_BOOST: f64 = 0.292;

/// Exclamation marks beyond this count add nothing.
pub const MAX_EXCLAMATIONS: usize = 4;

/// Magnitude added per question mark when 2 or 3 are present.
pub const QUESTION_BOOST: f64 = 0.18;

/// Flat magnitude added when more than 3 question marks are present.
pub const QUESTION_BOOST_CAP: f64 = 0.96;

/// Multiplier for valences that precede "but".
pub const BUT_BEFORE_SCALAR: f64 = 0.5;

/// Multiplier for valences that follow "but".
pub const BUT_AFTER_SCALAR: f64 = 1.5;

/// Multiplier for "never so ..." / "never this ..." constructions.
pub const NEVER_SO_SCALAR: f64 = 1.25;

/// Fixed lexical timestamp format. Lexical order equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header of the durable review record, in column order.
pub const SNAPSHOT_HEADER: [&str; 4] = ["ReviewId", "Location", "ReviewBody", "Timestamp"];

/// File name of the CSV review snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "reviews.csv";

/// File name of the write-ahead log inside the data directory.
pub const WAL_FILE: &str = "wal.bin";

/// Maximum length of a review location in bytes.
pub const MAX_LOCATION_LEN: usize = 256;

/// Maximum length of a review body in bytes.
pub const MAX_BODY_LEN: usize = 100_000;

/// Largest WAL frame payload replay will accept. A review at the field limits
/// plus its id, timestamp, and bincode length prefixes fits well inside.
pub const MAX_WAL_FRAME_BYTES: usize = MAX_LOCATION_LEN + MAX_BODY_LEN + 4096;

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default directory for the review snapshot and WAL.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default interval (in seconds) between automatic compactions. 0 = disabled.
pub const DEFAULT_COMPACT_INTERVAL_SECS: u64 = 300;

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum HTTP request body size in bytes (1 MB).
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Maximum number of concurrent in-flight requests.
pub const MAX_CONCURRENT_REQUESTS: usize = 512;
