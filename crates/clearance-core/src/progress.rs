//! # Progress Engine
//!
//! Pure computation over a [`StudentRecord`].
//!
//! The workflow is four linearly ordered checks:
//!
//! | Step | Gate | Completed when |
//! |------|------|----------------|
//! | Payment | none | `graduationFee.paid` |
//! | Application | payment | `applicationSubmitted` |
//! | Clearance | application | every department approved |
//!
//! `overallStatus` is derived, never set by callers: one rejection blocks
//! the record even if every other department approved.
//!
//! All arithmetic is integer. Transitions never mutate their input; they
//! return a new record. The only ambient input is the injected [`Clock`].

use crate::departments::DepartmentId;
use crate::primitives::{MAX_FIELD_LENGTH, MAX_NOTES_LENGTH};
use crate::{
    ApplicationForm, ClearanceEntry, ClearanceError, ClearanceStatus, Decision, GraduationFee,
    OverallStatus, StudentRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// CLOCK
// =============================================================================

/// Source of "today" for every dated transition.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Reads the local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

// =============================================================================
// DERIVED STATE
// =============================================================================

/// Number of approved departments.
#[must_use]
pub fn approved_count(record: &StudentRecord) -> usize {
    record
        .clearances
        .values()
        .filter(|e| e.status == ClearanceStatus::Approved)
        .count()
}

/// `round(100 * approved / total)`, 0 when the record has no departments.
///
/// Rounds half up, using `(200a + t) / 2t`.
#[must_use]
pub fn compute_progress_percentage(record: &StudentRecord) -> u8 {
    let total = record.clearances.len() as u64;
    if total == 0 {
        return 0;
    }
    let approved = approved_count(record) as u64;
    let percent = (approved.saturating_mul(200).saturating_add(total)) / total.saturating_mul(2);
    percent.min(100) as u8
}

/// Rejection dominates; all-approved completes; anything else is in progress.
#[must_use]
pub fn compute_overall_status(record: &StudentRecord) -> OverallStatus {
    let rejected = record
        .clearances
        .values()
        .any(|e| e.status == ClearanceStatus::Rejected);
    let all_approved = !record.clearances.is_empty()
        && record
            .clearances
            .values()
            .all(|e| e.status == ClearanceStatus::Approved);

    if rejected {
        OverallStatus::Blocked
    } else if all_approved {
        OverallStatus::Completed
    } else {
        OverallStatus::InProgress
    }
}

/// Application is open once the fee is paid.
#[must_use]
pub fn can_submit_application(record: &StudentRecord) -> bool {
    record.graduation_fee.paid
}

/// Clearance review is open once the application is in.
#[must_use]
pub fn can_enter_clearance(record: &StudentRecord) -> bool {
    record.application_submitted
}

/// Return `record` with `overall_status` recomputed.
#[must_use]
pub fn normalize(mut record: StudentRecord) -> StudentRecord {
    record.overall_status = compute_overall_status(&record);
    record
}

// =============================================================================
// SUMMARY
// =============================================================================

/// A dashboard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Payment,
    Application,
    Clearance,
}

impl StepKind {
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Payment => "Payment",
            Self::Application => "Application",
            Self::Clearance => "Clearance",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Payment => "Pay the graduation fee",
            Self::Application => "Submit the graduation application form",
            Self::Clearance => "Get cleared by all departments",
        }
    }
}

/// One step of the checklist with its completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,
    pub completed: bool,
}

/// Everything a dashboard needs to render progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub approved: usize,
    pub total: usize,
    pub percent: u8,
    pub status: OverallStatus,
    pub steps: [Step; 3],
    pub next_step: Option<StepKind>,
    pub ready_for_graduation: bool,
}

/// Build the dashboard summary for `record`.
#[must_use]
pub fn summarize(record: &StudentRecord) -> ProgressSummary {
    let percent = compute_progress_percentage(record);
    let steps = [
        Step {
            kind: StepKind::Payment,
            completed: record.graduation_fee.paid,
        },
        Step {
            kind: StepKind::Application,
            completed: record.application_submitted,
        },
        Step {
            kind: StepKind::Clearance,
            completed: percent == 100,
        },
    ];
    let next_step = steps.iter().find(|s| !s.completed).map(|s| s.kind);

    ProgressSummary {
        approved: approved_count(record),
        total: record.clearances.len(),
        percent,
        status: compute_overall_status(record),
        steps,
        next_step,
        ready_for_graduation: next_step.is_none(),
    }
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Applies workflow transitions, stamping them with the injected clock.
#[derive(Debug, Clone, Default)]
pub struct ProgressEngine<C: Clock> {
    clock: C,
}

impl<C: Clock> ProgressEngine<C> {
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// The date transitions are stamped with.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Record the graduation fee. Re-payment is refused.
    pub fn record_payment(
        &self,
        record: &StudentRecord,
        amount: u64,
        reference_code: &str,
    ) -> Result<StudentRecord, ClearanceError> {
        if record.graduation_fee.paid {
            return Err(ClearanceError::DuplicatePayment);
        }
        if amount == 0 {
            return Err(ClearanceError::Validation(
                "payment amount must be positive".to_string(),
            ));
        }
        let code = normalize_reference_code(reference_code)?;

        let mut next = record.clone();
        next.graduation_fee = GraduationFee {
            paid: true,
            amount,
            date: Some(self.today()),
            reference_code: code,
        };
        tracing::info!(student = %next.id, amount, "graduation fee recorded");
        Ok(next)
    }

    /// Submit the application, merging the form's identity fields.
    pub fn record_application(
        &self,
        record: &StudentRecord,
        form: &ApplicationForm,
    ) -> Result<StudentRecord, ClearanceError> {
        if !can_submit_application(record) {
            return Err(ClearanceError::PaymentRequired);
        }
        if record.application_submitted {
            return Err(ClearanceError::AlreadySubmitted);
        }
        form.validate()?;

        let mut next = record.clone();
        form.merge_into(&mut next);
        next.application_submitted = true;
        next.application_date = Some(self.today());
        tracing::info!(student = %next.id, "application submitted");
        Ok(next)
    }

    /// First decision for a pending department.
    pub fn apply_approval(
        &self,
        record: &StudentRecord,
        department: DepartmentId,
        decision: Decision,
        approver: &str,
        notes: Option<&str>,
    ) -> Result<StudentRecord, ClearanceError> {
        let current = entry_for(record, department)?;
        if !current.is_pending() {
            return Err(ClearanceError::AlreadyDecided {
                department,
                status: current.status,
            });
        }
        self.decide(record, department, decision, approver, notes)
    }

    /// Explicitly overwrite an existing decision.
    pub fn revise_decision(
        &self,
        record: &StudentRecord,
        department: DepartmentId,
        decision: Decision,
        approver: &str,
        notes: Option<&str>,
    ) -> Result<StudentRecord, ClearanceError> {
        let current = entry_for(record, department)?;
        if current.is_pending() {
            return Err(ClearanceError::NotYetDecided(department));
        }
        tracing::info!(
            student = %record.id,
            department = %department,
            from = %current.status,
            to = %decision.status(),
            "revising clearance decision"
        );
        self.decide(record, department, decision, approver, notes)
    }

    fn decide(
        &self,
        record: &StudentRecord,
        department: DepartmentId,
        decision: Decision,
        approver: &str,
        notes: Option<&str>,
    ) -> Result<StudentRecord, ClearanceError> {
        if !can_enter_clearance(record) {
            return Err(ClearanceError::ApplicationRequired);
        }
        let approver = approver.trim();
        if approver.is_empty() {
            return Err(ClearanceError::Validation("approver is required".to_string()));
        }
        if approver.len() > MAX_FIELD_LENGTH {
            return Err(ClearanceError::Validation(format!(
                "approver exceeds {} bytes",
                MAX_FIELD_LENGTH
            )));
        }
        if notes.is_some_and(|n| n.len() > MAX_NOTES_LENGTH) {
            return Err(ClearanceError::Validation(format!(
                "notes exceed {} bytes",
                MAX_NOTES_LENGTH
            )));
        }

        let mut next = record.clone();
        next.clearances.insert(
            department,
            ClearanceEntry::decided(decision, approver, self.today(), notes),
        );
        let next = normalize(next);
        tracing::debug!(
            student = %next.id,
            department = %department,
            status = %decision.status(),
            overall = %next.overall_status,
            "clearance decided"
        );
        Ok(next)
    }
}

fn entry_for(
    record: &StudentRecord,
    department: DepartmentId,
) -> Result<&ClearanceEntry, ClearanceError> {
    record
        .clearances
        .get(&department)
        .ok_or_else(|| ClearanceError::InvalidDepartment(department.to_string()))
}

fn normalize_reference_code(code: &str) -> Result<String, ClearanceError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ClearanceError::Validation(
            "payment reference code is required".to_string(),
        ));
    }
    if code.len() > MAX_FIELD_LENGTH {
        return Err(ClearanceError::Validation(format!(
            "payment reference code exceeds {} bytes",
            MAX_FIELD_LENGTH
        )));
    }
    Ok(code.to_ascii_uppercase())
}

// =============================================================================
// TESTS
// =============================================================================
