//! # Clearance Session
//!
//! One read-compute-write cycle per action: load the record, run the
//! engine transition, save the result.
//!
//! Storage never aborts an action:
//! - a failed or unreadable load falls back to a fresh record (student
//!   flow) or the sample roster (admin flow), logged at `warn`;
//! - a failed save is logged at `warn` and the new record is still
//!   returned.
//!
//! Workflow errors (validation, preconditions) always propagate. Writes are
//! last-write-wins; there is no locking.

use crate::departments::{DepartmentId, DepartmentSet};
use crate::formats::Snapshot;
use crate::primitives::DEFAULT_STUDENT_ID;
use crate::progress::{Clock, ProgressEngine, ProgressSummary, summarize};
use crate::roster::{Roster, RosterStats};
use crate::storage::KeyValueStore;
use crate::store::{StateStore, StoreKeys};
use crate::{ApplicationForm, ClearanceError, Decision, StudentRecord};

/// Student and admin flows over one store.
#[derive(Debug)]
pub struct ClearanceSession<S: KeyValueStore, C: Clock> {
    store: StateStore<S>,
    engine: ProgressEngine<C>,
    keys: StoreKeys,
    departments: DepartmentSet,
}

impl<S: KeyValueStore, C: Clock> ClearanceSession<S, C> {
    #[must_use]
    pub fn new(
        store: StateStore<S>,
        engine: ProgressEngine<C>,
        keys: StoreKeys,
        departments: DepartmentSet,
    ) -> Self {
        Self {
            store,
            engine,
            keys,
            departments,
        }
    }

    #[must_use]
    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore<S> {
        &mut self.store
    }

    /// A fresh record with every department pending.
    #[must_use]
    pub fn default_student(&self) -> StudentRecord {
        StudentRecord::new(DEFAULT_STUDENT_ID, self.departments)
    }

    // =========================================================================
    // STUDENT FLOW
    // =========================================================================

    /// Load the student record, creating it on first use.
    pub fn load_student(&mut self) -> StudentRecord {
        match self.store.load(&self.keys.student) {
            Ok(Some(record)) => record,
            Ok(None) => {
                let record = self.default_student();
                tracing::info!(student = %record.id, "creating student record");
                self.persist_student(&record);
                record
            }
            Err(e) => {
                tracing::warn!(key = %self.keys.student, error = %e, "student record unreadable, using default");
                self.default_student()
            }
        }
    }

    /// Dashboard view of the student record.
    pub fn summary(&mut self) -> (StudentRecord, ProgressSummary) {
        let record = self.load_student();
        let summary = summarize(&record);
        (record, summary)
    }

    /// Record the graduation fee.
    pub fn pay(&mut self, amount: u64, reference_code: &str) -> Result<StudentRecord, ClearanceError> {
        let current = self.load_student();
        let next = self.engine.record_payment(&current, amount, reference_code)?;
        self.persist_student(&next);
        Ok(next)
    }

    /// Submit the graduation application.
    pub fn apply(&mut self, form: &ApplicationForm) -> Result<StudentRecord, ClearanceError> {
        let current = self.load_student();
        let next = self.engine.record_application(&current, form)?;
        self.persist_student(&next);
        Ok(next)
    }

    /// Decide one department on the student record.
    pub fn decide(
        &mut self,
        department: DepartmentId,
        decision: Decision,
        approver: &str,
        notes: Option<&str>,
        revise: bool,
    ) -> Result<StudentRecord, ClearanceError> {
        let current = self.load_student();
        let next = if revise {
            self.engine
                .revise_decision(&current, department, decision, approver, notes)?
        } else {
            self.engine
                .apply_approval(&current, department, decision, approver, notes)?
        };
        self.persist_student(&next);
        Ok(next)
    }

    fn persist_student(&mut self, record: &StudentRecord) {
        if let Err(e) = self.store.save(&self.keys.student, record) {
            tracing::warn!(key = %self.keys.student, error = %e, "failed to save student record");
        }
    }

    // =========================================================================
    // ADMIN FLOW
    // =========================================================================

    /// Load the roster, seeding the sample students on first use.
    pub fn load_roster(&mut self) -> Roster {
        match self.store.load_roster(&self.keys.roster) {
            Ok(Some(records)) => Roster::new(records),
            Ok(None) => {
                let roster = Roster::sample();
                tracing::info!(students = roster.len(), "seeding roster");
                self.persist_roster(&roster);
                roster
            }
            Err(e) => {
                tracing::warn!(key = %self.keys.roster, error = %e, "roster unreadable, using sample data");
                Roster::sample()
            }
        }
    }

    /// Decide one department for the student with `student_id`.
    pub fn admin_decide(
        &mut self,
        student_id: &str,
        department: DepartmentId,
        decision: Decision,
        approver: &str,
        notes: Option<&str>,
        revise: bool,
    ) -> Result<StudentRecord, ClearanceError> {
        let mut roster = self.load_roster();
        let updated = roster
            .decide(&self.engine, student_id, department, decision, approver, notes, revise)?
            .clone();
        self.persist_roster(&roster);
        Ok(updated)
    }

    /// Delete a student from the roster.
    pub fn delete_student(&mut self, student_id: &str) -> Result<StudentRecord, ClearanceError> {
        let mut roster = self.load_roster();
        let removed = roster.remove(student_id)?;
        tracing::info!(student = %removed.id, "student removed from roster");
        self.persist_roster(&roster);
        Ok(removed)
    }

    /// Dashboard counts over the roster.
    pub fn roster_stats(&mut self) -> RosterStats {
        self.load_roster().stats()
    }

    fn persist_roster(&mut self, roster: &Roster) {
        if let Err(e) = self.store.save_roster(&self.keys.roster, roster.records()) {
            tracing::warn!(key = %self.keys.roster, error = %e, "failed to save roster");
        }
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Everything currently stored. Unlike the flows above, unreadable data
    /// fails the export instead of being replaced.
    pub fn export(&self) -> Result<Snapshot, ClearanceError> {
        self.store.export(&self.keys)
    }

    /// Replace the stored data with a validated snapshot.
    pub fn import(&mut self, snapshot: &Snapshot) -> Result<(), ClearanceError> {
        self.store.import(&self.keys, snapshot)?;
        tracing::info!(
            student = snapshot.student.is_some(),
            roster = snapshot.roster.len(),
            "snapshot imported"
        );
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::FixedClock;
    use crate::storage::MemoryStore;
    use crate::{ClearanceStatus, OverallStatus};
    use chrono::NaiveDate;

    /// Store whose writes always fail.
    #[derive(Debug, Default)]
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ClearanceError> {
            self.0.get(key)
        }
        fn put(&mut self, _key: &str, _value: &[u8]) -> Result<(), ClearanceError> {
            Err(ClearanceError::StorageUnavailable("quota exceeded".to_string()))
        }
        fn remove(&mut self, _key: &str) -> Result<bool, ClearanceError> {
            Err(ClearanceError::StorageUnavailable("quota exceeded".to_string()))
        }
        fn keys(&self) -> Result<Vec<String>, ClearanceError> {
            self.0.keys()
        }
    }

    fn session<S: KeyValueStore>(backend: S) -> ClearanceSession<S, FixedClock> {
        let today = NaiveDate::from_ymd_opt(2024, 12, 3).expect("valid date");
        ClearanceSession::new(
            StateStore::new(backend),
            ProgressEngine::new(FixedClock(today)),
            StoreKeys::default(),
            DepartmentSet::Standard,
        )
    }

    fn form() -> ApplicationForm {
        ApplicationForm {
            name: "John Kamau".to_string(),
            reg_no: "CS/2020/001".to_string(),
            course: "BSc Computer Science".to_string(),
            email: "john.kamau@student.mksu.ac.ke".to_string(),
            phone: "+254712345678".to_string(),
        }
    }

    #[test]
    fn first_load_creates_and_saves_record() {
        let mut s = session(MemoryStore::new());
        let record = s.load_student();
        assert_eq!(record.id, DEFAULT_STUDENT_ID);
        assert_eq!(record.clearances.len(), 5);
        assert!(s.store().load(&StoreKeys::default().student).expect("load").is_some());
    }

    #[test]
    fn actions_persist_between_loads() {
        let mut s = session(MemoryStore::new());
        s.pay(5500, "RK45HJ67").expect("pay");
        s.apply(&form()).expect("apply");
        s.decide(DepartmentId::Finance, Decision::Approved, "Jane Mwangi", None, false)
            .expect("approve");

        let (record, summary) = s.summary();
        assert_eq!(record.clearances[&DepartmentId::Finance].status, ClearanceStatus::Approved);
        assert_eq!(summary.percent, 20);
    }

    #[test]
    fn corrupt_blob_falls_back_to_default() {
        let mut backend = MemoryStore::new();
        backend.put("student-data", b"{\"id\":").expect("put");
        let mut s = session(backend);
        let record = s.load_student();
        assert_eq!(record, s.default_student());
    }

    #[test]
    fn save_failure_still_returns_record() {
        let mut s = session(ReadOnlyStore::default());
        let paid = s.pay(5500, "RK45HJ67").expect("pay despite failed save");
        assert!(paid.graduation_fee.paid);
        // nothing was persisted, so the next load starts over
        assert!(!s.load_student().graduation_fee.paid);
    }

    #[test]
    fn roster_is_seeded_once() {
        let mut s = session(MemoryStore::new());
        assert_eq!(s.load_roster().len(), 2);
        s.delete_student("STU001").expect("delete");
        assert_eq!(s.load_roster().len(), 1);
    }

    #[test]
    fn admin_decision_updates_roster() {
        let mut s = session(MemoryStore::new());
        let updated = s
            .admin_decide("STU002", DepartmentId::Hostel, Decision::Rejected, "Hostel Admin", Some("Room damage"), false)
            .expect("reject");
        assert_eq!(updated.overall_status, OverallStatus::Blocked);
        assert_eq!(s.roster_stats().blocked, 1);
    }

    #[test]
    fn deleting_unknown_student_fails() {
        let mut s = session(MemoryStore::new());
        let err = s.delete_student("STU999").expect_err("unknown");
        assert!(matches!(err, ClearanceError::StudentNotFound(_)));
    }

    #[test]
    fn corrupt_roster_falls_back_to_sample() {
        let mut backend = MemoryStore::new();
        backend.put("all-students-data", b"[1,2,3]").expect("put");
        let mut s = session(backend);
        assert_eq!(s.load_roster(), Roster::sample());
    }
}
