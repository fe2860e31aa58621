//! # Admin Roster
//!
//! The collection of student records reviewed from the admin view.
//!
//! Records keep their insertion order (the order the roster was seeded or
//! saved in); lookups are by student `id`.

use crate::departments::DepartmentId;
use crate::progress::{Clock, ProgressEngine, compute_overall_status};
use crate::{
    ApplicationForm, ClearanceEntry, ClearanceError, Decision, DepartmentSet, GraduationFee,
    OverallStatus, StudentRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records under admin review.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Roster {
    records: Vec<StudentRecord>,
}

impl Roster {
    #[must_use]
    pub fn new(records: Vec<StudentRecord>) -> Self {
        Self { records }
    }

    /// The two-student roster used when nothing is stored yet.
    #[must_use]
    pub fn sample() -> Self {
        Self::new(sample_roster())
    }

    #[must_use]
    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a student by id.
    #[must_use]
    pub fn get(&self, student_id: &str) -> Option<&StudentRecord> {
        self.records.iter().find(|r| r.id == student_id)
    }

    fn position(&self, student_id: &str) -> Result<usize, ClearanceError> {
        self.records
            .iter()
            .position(|r| r.id == student_id)
            .ok_or_else(|| ClearanceError::StudentNotFound(student_id.to_string()))
    }

    /// Record a department decision for one student.
    ///
    /// With `revise` the decision may overwrite an earlier one; without it
    /// only pending entries can be decided.
    pub fn decide<C: Clock>(
        &mut self,
        engine: &ProgressEngine<C>,
        student_id: &str,
        department: DepartmentId,
        decision: Decision,
        approver: &str,
        notes: Option<&str>,
        revise: bool,
    ) -> Result<&StudentRecord, ClearanceError> {
        let index = self.position(student_id)?;
        let current = &self.records[index];
        let next = if revise {
            engine.revise_decision(current, department, decision, approver, notes)?
        } else {
            engine.apply_approval(current, department, decision, approver, notes)?
        };
        self.records[index] = next;
        Ok(&self.records[index])
    }

    /// Delete a student outright.
    pub fn remove(&mut self, student_id: &str) -> Result<StudentRecord, ClearanceError> {
        let index = self.position(student_id)?;
        Ok(self.records.remove(index))
    }

    /// Records matching `filter`, in roster order.
    pub fn filter(&self, filter: RosterFilter) -> impl Iterator<Item = &StudentRecord> {
        self.records.iter().filter(move |r| filter.matches(r))
    }

    /// Aggregate counts for the admin dashboard.
    #[must_use]
    pub fn stats(&self) -> RosterStats {
        let mut stats = RosterStats {
            total: self.records.len(),
            ..RosterStats::default()
        };
        for record in &self.records {
            match compute_overall_status(record) {
                OverallStatus::InProgress => stats.in_progress += 1,
                OverallStatus::Completed => stats.completed += 1,
                OverallStatus::Blocked => stats.blocked += 1,
            }
            for (dept, entry) in &record.clearances {
                if entry.is_pending() {
                    *stats.pending_by_department.entry(*dept).or_insert(0) += 1;
                }
            }
        }
        stats
    }
}

/// Which students the admin list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterFilter {
    #[default]
    All,
    /// At least one department still pending.
    Pending,
    /// Every department approved.
    Completed,
}

impl RosterFilter {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn matches(&self, record: &StudentRecord) -> bool {
        match self {
            Self::All => true,
            Self::Pending => record.clearances.values().any(ClearanceEntry::is_pending),
            Self::Completed => compute_overall_status(record) == OverallStatus::Completed,
        }
    }
}

impl std::str::FromStr for RosterFilter {
    type Err = ClearanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(ClearanceError::Validation(format!(
                "unknown roster filter '{}' (expected all, pending or completed)",
                other
            ))),
        }
    }
}

/// Dashboard counts over a roster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterStats {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
    /// Pending entries per department; the largest is the bottleneck.
    pub pending_by_department: BTreeMap<DepartmentId, usize>,
}

impl RosterStats {
    /// Department with the most pending entries (first in approval order on ties).
    #[must_use]
    pub fn bottleneck(&self) -> Option<(DepartmentId, usize)> {
        self.pending_by_department
            .iter()
            .filter(|(_, count)| **count > 0)
            .fold(None, |best: Option<(DepartmentId, usize)>, (&dept, &count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((dept, count)),
            })
    }
}

// =============================================================================
// SAMPLE DATA
// =============================================================================

fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn approved(by: &str, date: Option<NaiveDate>, notes: &str) -> ClearanceEntry {
    ClearanceEntry {
        status: crate::ClearanceStatus::Approved,
        approved_by: Some(by.to_string()),
        date,
        notes: Some(notes.to_string()),
    }
}

fn seeded(
    id: &str,
    identity: ApplicationForm,
    fee_date: Option<NaiveDate>,
    code: &str,
    approvals: Vec<(DepartmentId, ClearanceEntry)>,
) -> StudentRecord {
    let mut record = StudentRecord::new(id, DepartmentSet::Standard).with_identity(&identity);
    record.graduation_fee = GraduationFee {
        paid: true,
        amount: crate::primitives::GRADUATION_FEE_KES,
        date: fee_date,
        reference_code: code.to_string(),
    };
    record.application_submitted = true;
    record.application_date = fee_date;
    record.clearances.extend(approvals);
    record.overall_status = compute_overall_status(&record);
    record
}

/// Two students part-way through clearance.
#[must_use]
pub fn sample_roster() -> Vec<StudentRecord> {
    vec![
        seeded(
            "STU001",
            ApplicationForm {
                name: "John Kamau".to_string(),
                reg_no: "CS/2020/001".to_string(),
                course: "BSc Computer Science".to_string(),
                email: "john.kamau@student.mksu.ac.ke".to_string(),
                phone: "+254712345678".to_string(),
            },
            ymd(2024, 11, 15),
            "RK45HJ67",
            vec![
                (DepartmentId::Finance, approved("Jane Mwangi", ymd(2024, 11, 16), "All fees paid")),
                (DepartmentId::Faculty, approved("Dr. Peter Omondi", ymd(2024, 11, 17), "Cleared")),
            ],
        ),
        seeded(
            "STU002",
            ApplicationForm {
                name: "Mary Wanjiku".to_string(),
                reg_no: "BA/2020/045".to_string(),
                course: "BA Business Administration".to_string(),
                email: "mary.wanjiku@student.mksu.ac.ke".to_string(),
                phone: "+254723456789".to_string(),
            },
            ymd(2024, 11, 14),
            "TY67KL89",
            vec![
                (DepartmentId::Finance, approved("Jane Mwangi", ymd(2024, 11, 15), "All fees paid")),
                (DepartmentId::Faculty, approved("Prof. Sarah Kimani", ymd(2024, 11, 16), "Cleared")),
                (DepartmentId::Library, approved("James Muthoni", ymd(2024, 11, 17), "No pending books")),
                (DepartmentId::Mess, approved("Grace Njeri", ymd(2024, 11, 17), "No dues")),
            ],
        ),
    ]
}

// =============================================================================
// TESTS
// =============================================================================
