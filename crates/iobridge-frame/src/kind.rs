//! Well-known stream kinds.
//!
//! A kind is a short string naming the logical stream a request targets.
//! Hosts are free to define their own; these are the ones every host is
//! expected to serve.

use crate::codec::MAX_KIND_UNITS;

/// The host's standard input stream (read requests).
pub const STDIN: &str = "stdin";

/// The host's standard output stream (write requests).
pub const STDOUT: &str = "stdout";

/// Returns true if the kind fits the one-byte length prefix.
pub fn fits_length_prefix(kind: &str) -> bool {
    kind.encode_utf16().count() <= MAX_KIND_UNITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_kinds_fit() {
        assert!(fits_length_prefix(STDIN));
        assert!(fits_length_prefix(STDOUT));
    }

    #[test]
    fn oversized_kind_rejected() {
        assert!(fits_length_prefix(&"k".repeat(255)));
        assert!(!fits_length_prefix(&"k".repeat(256)));
    }
}
