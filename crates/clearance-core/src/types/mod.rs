//! # Core Type Definitions
//!
//! This module contains the data model of the clearance workflow:
//! - Student identity and lifecycle (`StudentRecord`, `GraduationFee`)
//! - Per-department sign-off (`ClearanceEntry`, `ClearanceStatus`, `Decision`)
//! - Derived state (`OverallStatus`)
//! - Application input (`ApplicationForm`)
//! - Error types (`ClearanceError`, `ErrorKind`)
//!
//! ## Wire Shape
//!
//! Field names serialize in camelCase so a record written by the browser
//! front end (`regNo`, `graduationFee`, `approvedBy`, ...) decodes as-is.
//! No field uses `skip_serializing_if`: the same types are also encoded
//! with postcard, which needs every field present.

use crate::departments::{DepartmentId, DepartmentSet};
use crate::primitives::MAX_FIELD_LENGTH;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// CLEARANCE STATUS & DECISION
// =============================================================================

/// Status of a single department clearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearanceStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClearanceStatus {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ClearanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer's verdict. `Pending` is not a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// The status an entry takes once this decision is recorded.
    #[must_use]
    pub const fn status(self) -> ClearanceStatus {
        match self {
            Self::Approved => ClearanceStatus::Approved,
            Self::Rejected => ClearanceStatus::Rejected,
        }
    }

    /// Note stored when the reviewer leaves none.
    #[must_use]
    pub const fn default_note(self) -> &'static str {
        match self {
            Self::Approved => "Cleared",
            Self::Rejected => "Rejected",
        }
    }
}

impl std::str::FromStr for Decision {
    type Err = ClearanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" | "approve" => Ok(Self::Approved),
            "rejected" | "reject" => Ok(Self::Rejected),
            other => Err(ClearanceError::Validation(format!(
                "unknown decision '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// OVERALL STATUS
// =============================================================================

/// Aggregate state of a student's clearance process. Always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverallStatus {
    InProgress,
    Completed,
    Blocked,
}

impl OverallStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CLEARANCE ENTRY
// =============================================================================

/// One department's sign-off on a student.
///
/// Invariant: `status == Pending` exactly when `approved_by` and `date`
/// are both absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearanceEntry {
    pub status: ClearanceStatus,
    pub approved_by: Option<String>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ClearanceEntry {
    /// A fresh, undecided entry.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            status: ClearanceStatus::Pending,
            approved_by: None,
            date: None,
            notes: None,
        }
    }

    /// A decided entry. Blank notes fall back to the decision's default note.
    #[must_use]
    pub fn decided(
        decision: Decision,
        approver: impl Into<String>,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Self {
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(decision.default_note());
        Self {
            status: decision.status(),
            approved_by: Some(approver.into()),
            date: Some(date),
            notes: Some(notes.to_string()),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ClearanceStatus::Pending
    }

    /// Check the pending invariant.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let undecided = self.approved_by.is_none() && self.date.is_none();
        self.is_pending() == undecided
    }
}

impl Default for ClearanceEntry {
    fn default() -> Self {
        Self::pending()
    }
}

// =============================================================================
// GRADUATION FEE
// =============================================================================

/// Graduation fee payment. `paid` gates every downstream step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraduationFee {
    pub paid: bool,
    /// Amount in whole KES.
    pub amount: u64,
    pub date: Option<NaiveDate>,
    /// Mobile-money confirmation code. Older blobs call it `mpesaCode`.
    #[serde(alias = "mpesaCode", default)]
    pub reference_code: String,
}

impl GraduationFee {
    #[must_use]
    pub fn unpaid() -> Self {
        Self::default()
    }
}

// =============================================================================
// STUDENT RECORD
// =============================================================================

/// A student's graduation clearance file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reg_no: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub graduation_fee: GraduationFee,
    #[serde(default)]
    pub application_submitted: bool,
    #[serde(default)]
    pub application_date: Option<NaiveDate>,
    pub clearances: BTreeMap<DepartmentId, ClearanceEntry>,
    pub overall_status: OverallStatus,
}

impl StudentRecord {
    /// Create a record with every department of `departments` pending.
    #[must_use]
    pub fn new(id: impl Into<String>, departments: DepartmentSet) -> Self {
        let clearances = departments
            .members()
            .iter()
            .map(|&dept| (dept, ClearanceEntry::pending()))
            .collect();
        Self {
            id: id.into(),
            name: String::new(),
            reg_no: String::new(),
            course: String::new(),
            email: String::new(),
            phone: String::new(),
            graduation_fee: GraduationFee::unpaid(),
            application_submitted: false,
            application_date: None,
            clearances,
            overall_status: OverallStatus::InProgress,
        }
    }

    /// Builder-style identity setter, mostly for seeding and tests.
    #[must_use]
    pub fn with_identity(mut self, form: &ApplicationForm) -> Self {
        form.merge_into(&mut self);
        self
    }

    /// Whether `department` belongs to this record's fixed department set.
    #[must_use]
    pub fn has_department(&self, department: DepartmentId) -> bool {
        self.clearances.contains_key(&department)
    }

    /// Structural checks applied to every record read from storage.
    ///
    /// A record that fails here is treated as shape drift by the store.
    pub fn validate(&self) -> Result<(), ClearanceError> {
        if self.id.trim().is_empty() {
            return Err(ClearanceError::SerializationError(
                "record has an empty id".to_string(),
            ));
        }
        if self.clearances.is_empty() {
            return Err(ClearanceError::SerializationError(format!(
                "record {} has no departments",
                self.id
            )));
        }
        if let Some((dept, _)) = self.clearances.iter().find(|(_, e)| !e.is_consistent()) {
            return Err(ClearanceError::SerializationError(format!(
                "record {}: {} entry violates the pending invariant",
                self.id, dept
            )));
        }
        if self.application_submitted && !self.graduation_fee.paid {
            return Err(ClearanceError::SerializationError(format!(
                "record {}: application submitted without payment",
                self.id
            )));
        }
        Ok(())
    }
}

// =============================================================================
// APPLICATION FORM
// =============================================================================

/// Identity fields submitted with the graduation application.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    pub name: String,
    pub reg_no: String,
    pub course: String,
    pub email: String,
    pub phone: String,
}

impl ApplicationForm {
    /// Check that every field is present and within bounds.
    pub fn validate(&self) -> Result<(), ClearanceError> {
        let fields = [
            ("name", &self.name),
            ("regNo", &self.reg_no),
            ("course", &self.course),
            ("email", &self.email),
            ("phone", &self.phone),
        ];
        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(ClearanceError::Validation(format!("{} is required", label)));
            }
            if value.len() > MAX_FIELD_LENGTH {
                return Err(ClearanceError::Validation(format!(
                    "{} exceeds {} bytes",
                    label, MAX_FIELD_LENGTH
                )));
            }
        }

        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed {
            return Err(ClearanceError::Validation(format!(
                "'{}' is not an email address",
                email
            )));
        }
        Ok(())
    }

    /// Copy the (trimmed) identity fields onto `record`.
    pub fn merge_into(&self, record: &mut StudentRecord) {
        record.name = self.name.trim().to_string();
        record.reg_no = self.reg_no.trim().to_string();
        record.course = self.course.trim().to_string();
        record.email = self.email.trim().to_string();
        record.phone = self.phone.trim().to_string();
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error categories surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or malformed input; blocks the action.
    Validation,
    /// A workflow step was attempted out of order.
    Precondition,
    /// The remote API rejected the credentials.
    Auth,
    /// The remote API could not be reached.
    Connectivity,
    /// Duplicate registration data.
    Conflict,
    /// Any other remote failure.
    Remote,
    /// Persistent storage failed or held unreadable data.
    Storage,
    /// Bad configuration.
    Config,
}

/// Errors that can occur in the clearance system.
///
/// - No silent failures
/// - Use `Result<T, ClearanceError>` for fallible operations
/// - The CORE never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum ClearanceError {
    /// A required field is missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The application was attempted before payment.
    #[error("Graduation fee must be paid before applying")]
    PaymentRequired,

    /// Clearance review was attempted before the application.
    #[error("Application must be submitted before clearance review")]
    ApplicationRequired,

    /// The department is unknown or not part of this record.
    #[error("Invalid department: {0}")]
    InvalidDepartment(String),

    /// The department already decided; use an explicit revision.
    #[error("Department {department} already decided ({status})")]
    AlreadyDecided {
        department: DepartmentId,
        status: ClearanceStatus,
    },

    /// A revision was requested for an entry that is still pending.
    #[error("Department {0} has not decided yet")]
    NotYetDecided(DepartmentId),

    /// The graduation fee was already recorded.
    #[error("Graduation fee already paid")]
    DuplicatePayment,

    /// The application was already submitted.
    #[error("Application already submitted")]
    AlreadySubmitted,

    /// No student with this id in the roster.
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    /// 401 from the remote API.
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// The remote API is unreachable.
    #[error("Cannot reach the server: {0}")]
    Connectivity(String),

    /// Duplicate registration fields.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-success response.
    #[error("Server error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The key-value store cannot be read or written.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClearanceError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidDepartment(_) | Self::StudentNotFound(_) => {
                ErrorKind::Validation
            }
            Self::PaymentRequired
            | Self::ApplicationRequired
            | Self::AlreadyDecided { .. }
            | Self::NotYetDecided(_)
            | Self::DuplicatePayment
            | Self::AlreadySubmitted => ErrorKind::Precondition,
            Self::Unauthorized(_) => ErrorKind::Auth,
            Self::Connectivity(_) => ErrorKind::Connectivity,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::StorageUnavailable(_) | Self::SerializationError(_) | Self::IoError(_) => {
                ErrorKind::Storage
            }
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
