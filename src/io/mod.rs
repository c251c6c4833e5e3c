//! FJSPLIB text format.
//!
//! The de-facto exchange format for flexible job shop benchmarks:
//!
//! ```text
//! <num_jobs> <num_machines> <avg_flexibility>
//! <num_ops> <k1> <m> <d> ... <k2> <m> <d> ...
//! ...
//! ```
//!
//! One line per job follows the header. Each operation is written as its
//! number of eligible machines `k` followed by `k` (machine, duration)
//! pairs, with 1-based machines.
//!
//! # Reference
//! Behnke & Geiger (2012), "Test instances for the flexible job shop
//! scheduling problem with work centers"

mod read;
mod write;

pub use read::{parse, read_from, read_path};
pub use write::{format_instance, write_path, write_to};

/// Parses a non-negative integer token.
///
/// Tokens containing `.` are read as floating point and truncated toward
/// zero, so `"7.9"` gives 7. Negative, non-finite, or out-of-range values
/// give `None`.
pub(crate) fn parse_number(token: &str) -> Option<u64> {
    if token.contains('.') {
        let value: f64 = token.parse().ok()?;
        // 2^64 is exactly representable; anything at or above it overflows
        (value.is_finite() && value >= 0.0 && value < 18_446_744_073_709_551_616.0)
            .then(|| value.trunc() as u64)
    } else {
        token.parse().ok()
    }
}
