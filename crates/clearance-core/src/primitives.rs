//! # Primitives
//!
//! Hardcoded runtime constants for the clearance CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Storage key of the single student-facing record.
pub const STUDENT_DATA_KEY: &str = "student-data";

/// Storage key of the admin roster (JSON array of records).
pub const ALL_STUDENTS_KEY: &str = "all-students-data";

/// Id given to the record created on first load.
pub const DEFAULT_STUDENT_ID: &str = "STU001";

/// Standard graduation fee in whole KES.
pub const GRADUATION_FEE_KES: u64 = 5500;

/// Magic bytes for the snapshot format header.
///
/// - File Header = Magic Bytes ("GRAD") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"GRAD";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for identity fields, approver names and reference codes.
pub const MAX_FIELD_LENGTH: usize = 256;

/// Maximum length for reviewer notes.
pub const MAX_NOTES_LENGTH: usize = 4096;

/// Maximum size of one stored JSON blob (1 MiB).
///
/// Checked before parsing so a corrupted store cannot exhaust memory.
pub const MAX_BLOB_SIZE: usize = 1024 * 1024;

/// Maximum size of a snapshot file (64 MiB).
pub const MAX_SNAPSHOT_SIZE: usize = 64 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"GRAD");
    }

    #[test]
    fn keys_match_browser_storage() {
        assert_eq!(STUDENT_DATA_KEY, "student-data");
        assert_eq!(ALL_STUDENTS_KEY, "all-students-data");
    }
}
