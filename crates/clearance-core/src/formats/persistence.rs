//! # Persistence Formats
//!
//! Two encodings, both pure transformations with no I/O:
//!
//! - **Blob**: one JSON document per storage key (a record, or an array of
//!   records for the roster). This is the format browser storage holds.
//! - **Snapshot**: the whole store for export/import.
//!   Header (5 bytes) + checksum (8 bytes, little-endian) + postcard body.
//!   - 4 bytes: Magic ("GRAD")
//!   - 1 byte: Version
//!
//! ## Security
//!
//! Size limits are checked BEFORE parsing, and every decoded record is
//! validated, so corrupted data is rejected rather than half-loaded.

use crate::primitives::{self, MAX_BLOB_SIZE, MAX_SNAPSHOT_SIZE};
use crate::{ClearanceError, StudentRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Magic + version.
const HEADER_LEN: usize = 5;
/// Header + checksum length.
const SNAPSHOT_PREFIX_LEN: usize = HEADER_LEN + 8;

// =============================================================================
// JSON BLOBS
// =============================================================================

/// Encode one record as a JSON blob.
pub fn record_to_blob(record: &StudentRecord) -> Result<Vec<u8>, ClearanceError> {
    serde_json::to_vec(record).map_err(|e| ClearanceError::SerializationError(e.to_string()))
}

/// Decode and validate one record.
pub fn record_from_blob(bytes: &[u8]) -> Result<StudentRecord, ClearanceError> {
    check_blob_size(bytes)?;
    let record: StudentRecord = serde_json::from_slice(bytes)
        .map_err(|e| ClearanceError::SerializationError(format!("invalid record: {}", e)))?;
    record.validate()?;
    Ok(record)
}

/// Encode a roster as a JSON array.
pub fn roster_to_blob(records: &[StudentRecord]) -> Result<Vec<u8>, ClearanceError> {
    serde_json::to_vec(records).map_err(|e| ClearanceError::SerializationError(e.to_string()))
}

/// Decode and validate a roster.
pub fn roster_from_blob(bytes: &[u8]) -> Result<Vec<StudentRecord>, ClearanceError> {
    check_blob_size(bytes)?;
    let records: Vec<StudentRecord> = serde_json::from_slice(bytes)
        .map_err(|e| ClearanceError::SerializationError(format!("invalid roster: {}", e)))?;
    validate_roster(&records)?;
    Ok(records)
}

/// Check every roster record, and that no student id appears twice.
pub fn validate_roster(records: &[StudentRecord]) -> Result<(), ClearanceError> {
    let mut seen = BTreeSet::new();
    for record in records {
        record.validate()?;
        if !seen.insert(record.id.as_str()) {
            return Err(ClearanceError::SerializationError(format!(
                "duplicate student id '{}' in roster",
                record.id
            )));
        }
    }
    Ok(())
}

fn check_blob_size(bytes: &[u8]) -> Result<(), ClearanceError> {
    if bytes.len() > MAX_BLOB_SIZE {
        return Err(ClearanceError::SerializationError(format!(
            "blob size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_BLOB_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Everything the store holds, in one value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub student: Option<StudentRecord>,
    pub roster: Vec<StudentRecord>,
}

/// 64-bit FNV-1a over `data`.
#[must_use]
pub fn checksum(data: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    data.iter().fold(OFFSET, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

/// Serialize a snapshot (header + checksum + body).
///
/// Deterministic: the same snapshot always yields the same bytes.
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, ClearanceError> {
    let body = postcard::to_stdvec(snapshot)
        .map_err(|e| ClearanceError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(SNAPSHOT_PREFIX_LEN + body.len());
    result.extend_from_slice(primitives::MAGIC_BYTES);
    result.push(primitives::FORMAT_VERSION);
    result.extend_from_slice(&checksum(&body).to_le_bytes());
    result.extend_from_slice(&body);
    Ok(result)
}

/// Deserialize and validate a snapshot.
///
/// Size, header and checksum are all checked before the body is parsed.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, ClearanceError> {
    if bytes.len() < SNAPSHOT_PREFIX_LEN {
        return Err(ClearanceError::SerializationError(format!(
            "Data too short: minimum {} bytes required",
            SNAPSHOT_PREFIX_LEN
        )));
    }
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(ClearanceError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    if &bytes[..4] != primitives::MAGIC_BYTES {
        return Err(ClearanceError::SerializationError(
            "Invalid magic bytes".to_string(),
        ));
    }
    let version = bytes[4];
    if version != primitives::FORMAT_VERSION {
        return Err(ClearanceError::SerializationError(format!(
            "Unsupported version: {} (expected {})",
            version,
            primitives::FORMAT_VERSION
        )));
    }

    let mut stored = [0u8; 8];
    stored.copy_from_slice(&bytes[HEADER_LEN..SNAPSHOT_PREFIX_LEN]);
    let body = &bytes[SNAPSHOT_PREFIX_LEN..];
    if u64::from_le_bytes(stored) != checksum(body) {
        return Err(ClearanceError::SerializationError(
            "Checksum mismatch".to_string(),
        ));
    }

    let snapshot: Snapshot = postcard::from_bytes(body).map_err(|e| {
        ClearanceError::SerializationError(format!("Failed to deserialize snapshot: {}", e))
    })?;

    if let Some(student) = &snapshot.student {
        student.validate()?;
    }
    validate_roster(&snapshot.roster)?;
    Ok(snapshot)
}

/// BLAKE3 hex digest of a serialized snapshot.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn snapshot_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================
