//! Ordering of `log.level` names.
//!
//! ECS does not mandate a set of log level names nor an ordering between
//! them, so this is a best effort built from the conventions of common
//! logging frameworks (zap, bunyan, pino, log4j). Unknown names do not
//! participate in the ordering at all: they compare "not less" in both
//! directions, which means filters never drop records with levels they do
//! not understand.

/// Level names this tool knows how to order, for CLI warnings.
pub const KNOWN_LEVELS: &[&str] = &[
    "trace", "debug", "info", "warn", "warning", "error", "dpanic", "panic", "fatal",
];

fn level_rank(level: &str) -> Option<u8> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some(10),
        "debug" => Some(20),
        "info" => Some(30),
        "warn" | "warning" => Some(40),
        "error" => Some(50),
        "dpanic" => Some(60),
        "panic" => Some(70),
        "fatal" => Some(80),
        _ => None,
    }
}

/// Returns true iff `level1` orders strictly below `level2`.
///
/// Comparison is case-insensitive. If either name is unknown the answer is
/// false, so neither direction is "less".
pub fn log_level_less(level1: &str, level2: &str) -> bool {
    match (level_rank(level1), level_rank(level2)) {
        (Some(rank1), Some(rank2)) => rank1 < rank2,
        _ => false,
    }
}

/// Whether `--level` was given a name the rank table knows.
pub fn is_known_level(level: &str) -> bool {
    level_rank(level).is_some()
}
