//! # State Store
//!
//! Typed load/save of records over any [`KeyValueStore`].
//!
//! Errors are reported as-is; the fallback policy (default record, sample
//! roster) lives in [`crate::session`], not here.

use crate::formats::{self, Snapshot};
use crate::primitives::{ALL_STUDENTS_KEY, STUDENT_DATA_KEY};
use crate::progress::normalize;
use crate::storage::KeyValueStore;
use crate::{ClearanceError, StudentRecord};
use serde::{Deserialize, Serialize};

/// Storage keys for the two blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreKeys {
    /// One student's record.
    pub student: String,
    /// The admin roster.
    pub roster: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            student: STUDENT_DATA_KEY.to_string(),
            roster: ALL_STUDENTS_KEY.to_string(),
        }
    }
}

/// JSON-blob persistence for student records.
#[derive(Debug, Default)]
pub struct StateStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> StateStore<S> {
    #[must_use]
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Read the record under `key`.
    ///
    /// `Ok(None)` when nothing is stored. The derived `overallStatus` is
    /// recomputed rather than trusted.
    pub fn load(&self, key: &str) -> Result<Option<StudentRecord>, ClearanceError> {
        match self.backend.get(key)? {
            Some(bytes) => Ok(Some(normalize(formats::record_from_blob(&bytes)?))),
            None => Ok(None),
        }
    }

    /// Write `record` under `key`, replacing whatever was there.
    pub fn save(&mut self, key: &str, record: &StudentRecord) -> Result<(), ClearanceError> {
        let blob = formats::record_to_blob(record)?;
        self.backend.put(key, &blob)
    }

    /// Read the roster array under `key`.
    pub fn load_roster(&self, key: &str) -> Result<Option<Vec<StudentRecord>>, ClearanceError> {
        match self.backend.get(key)? {
            Some(bytes) => {
                let records = formats::roster_from_blob(&bytes)?;
                Ok(Some(records.into_iter().map(normalize).collect()))
            }
            None => Ok(None),
        }
    }

    /// Write the roster array under `key`.
    pub fn save_roster(&mut self, key: &str, records: &[StudentRecord]) -> Result<(), ClearanceError> {
        let blob = formats::roster_to_blob(records)?;
        self.backend.put(key, &blob)
    }

    /// Delete whatever is stored under `key`.
    pub fn remove(&mut self, key: &str) -> Result<bool, ClearanceError> {
        self.backend.remove(key)
    }

    /// Collect both blobs into a snapshot. Unreadable blobs fail the export.
    pub fn export(&self, keys: &StoreKeys) -> Result<Snapshot, ClearanceError> {
        Ok(Snapshot {
            student: self.load(&keys.student)?,
            roster: self.load_roster(&keys.roster)?.unwrap_or_default(),
        })
    }

    /// Replace both blobs with the snapshot's contents.
    ///
    /// A snapshot without a student clears the student key. The roster is
    /// checked before anything is written.
    pub fn import(&mut self, keys: &StoreKeys, snapshot: &Snapshot) -> Result<(), ClearanceError> {
        formats::validate_roster(&snapshot.roster)?;
        match &snapshot.student {
            Some(record) => self.save(&keys.student, record)?,
            None => {
                self.remove(&keys.student)?;
            }
        }
        self.save_roster(&keys.roster, &snapshot.roster)
    }
}

// =============================================================================
// TESTS
// =============================================================================
