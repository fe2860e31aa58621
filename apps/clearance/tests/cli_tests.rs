//! Integration tests for the clearance CLI commands.
//!
//! Every test runs against its own redb file inside a temporary directory.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use clearance::cli::{Cli, execute, open_session};
use clearance::config::Config;
use clearance_core::{
    ClearanceError, ClearanceStatus, DepartmentId, ErrorKind, OverallStatus, StudentRecord,
};
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clearance.toml"), "departments = \"standard\"\n").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Run one command against `db`.
    fn run_on(&self, db: &str, args: &[&str]) -> Result<(), ClearanceError> {
        let config = self.path("clearance.toml");
        let db = self.path(db);
        let mut argv = vec![
            "clearance".to_string(),
            "-q".to_string(),
            "--config".to_string(),
            config.to_string_lossy().into_owned(),
            "-D".to_string(),
            db.to_string_lossy().into_owned(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        execute(Cli::try_parse_from(argv).unwrap())
    }

    fn run(&self, args: &[&str]) -> Result<(), ClearanceError> {
        self.run_on("clearance.db", args)
    }

    fn config(&self, db: &str) -> Config {
        Config::from_file(&self.path("clearance.toml"))
            .unwrap()
            .with_flags(Some(self.path(db)), None)
            .unwrap()
    }

    /// Reopen the database and read the student record.
    fn student(&self) -> StudentRecord {
        let mut session = open_session(&self.config("clearance.db")).unwrap();
        session.load_student()
    }

    fn roster_student(&self, id: &str) -> StudentRecord {
        let mut session = open_session(&self.config("clearance.db")).unwrap();
        session.load_roster().get(id).cloned().unwrap()
    }
}

fn apply_args() -> Vec<&'static str> {
    vec![
        "apply",
        "--name",
        "John Kamau",
        "--reg-no",
        "CS/2020/001",
        "--course",
        "BSc Computer Science",
        "--email",
        "john.kamau@student.mksu.ac.ke",
        "--phone",
        "+254712345678",
    ]
}

// =============================================================================
// INIT
// =============================================================================

#[test]
fn init_refuses_to_overwrite_without_force() {
    let ws = Workspace::new();
    ws.run(&["init"]).unwrap();
    assert!(ws.path("clearance.db").exists());

    let err = ws.run(&["init"]).unwrap_err();
    assert!(err.to_string().contains("--force"));

    ws.run(&["init", "--force"]).unwrap();
}

#[test]
fn init_force_resets_progress() {
    let ws = Workspace::new();
    ws.run(&["init"]).unwrap();
    ws.run(&["pay", "--code", "RK45HJ67"]).unwrap();
    assert!(ws.student().graduation_fee.paid);

    ws.run(&["init", "--force"]).unwrap();
    assert!(!ws.student().graduation_fee.paid);
}

// =============================================================================
// STUDENT FLOW
// =============================================================================

#[test]
fn full_student_flow_persists() {
    let ws = Workspace::new();
    ws.run(&["init"]).unwrap();
    ws.run(&["pay", "--code", "rk45hj67"]).unwrap();
    ws.run(&apply_args()).unwrap();
    ws.run(&["approve", "--department", "finance", "--by", "Jane Mwangi"]).unwrap();
    ws.run(&["--json-mode", "status"]).unwrap();

    let record = ws.student();
    assert_eq!(record.graduation_fee.amount, 5500);
    assert_eq!(record.graduation_fee.reference_code, "RK45HJ67");
    assert_eq!(record.reg_no, "CS/2020/001");
    let finance = &record.clearances[&DepartmentId::Finance];
    assert_eq!(finance.status, ClearanceStatus::Approved);
    assert_eq!(finance.notes.as_deref(), Some("Cleared"));
}

#[test]
fn status_without_init_creates_record() {
    let ws = Workspace::new();
    ws.run(&[]).unwrap();
    assert_eq!(ws.student().clearances.len(), 5);
}

#[test]
fn apply_before_payment_is_refused() {
    let ws = Workspace::new();
    let err = ws.run(&apply_args()).unwrap_err();
    assert!(matches!(err, ClearanceError::PaymentRequired));
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(!ws.student().application_submitted);
}

#[test]
fn redeciding_needs_revise_flag() {
    let ws = Workspace::new();
    ws.run(&["pay", "--code", "RK45HJ67"]).unwrap();
    ws.run(&apply_args()).unwrap();
    ws.run(&["reject", "-d", "library", "-b", "Librarian", "-n", "Overdue books"]).unwrap();
    assert_eq!(ws.student().overall_status, OverallStatus::Blocked);

    let err = ws.run(&["approve", "-d", "library", "-b", "Librarian"]).unwrap_err();
    assert!(matches!(err, ClearanceError::AlreadyDecided { .. }));

    ws.run(&["approve", "-d", "library", "-b", "Librarian", "--revise"]).unwrap();
    assert_eq!(ws.student().overall_status, OverallStatus::InProgress);
}

#[test]
fn unknown_department_is_rejected() {
    let ws = Workspace::new();
    let err = ws.run(&["approve", "-d", "chapel", "-b", "Chaplain"]).unwrap_err();
    assert!(matches!(err, ClearanceError::InvalidDepartment(_)));
}

#[test]
fn memory_backend_keeps_nothing() {
    let ws = Workspace::new();
    ws.run(&["-B", "memory", "pay", "--code", "RK45HJ67"]).unwrap();
    assert!(!ws.path("clearance.db").exists());
}

// =============================================================================
// ADMIN FLOW
// =============================================================================

#[test]
fn admin_rejection_blocks_roster_student() {
    let ws = Workspace::new();
    ws.run(&["init"]).unwrap();
    ws.run(&[
        "reject",
        "--department",
        "hostel",
        "--by",
        "Hostel Admin",
        "--student",
        "STU002",
        "--notes",
        "Room damage",
    ])
    .unwrap();
    ws.run(&["--json-mode", "roster"]).unwrap();

    let record = ws.roster_student("STU002");
    assert_eq!(record.overall_status, OverallStatus::Blocked);
    assert_eq!(
        record.clearances[&DepartmentId::Hostel].notes.as_deref(),
        Some("Room damage")
    );
    // the local student record is untouched
    assert_eq!(ws.student().overall_status, OverallStatus::InProgress);
}

#[test]
fn roster_filter_accepts_known_names() {
    let ws = Workspace::new();
    ws.run(&["init"]).unwrap();
    ws.run(&["approve", "-d", "hostel", "-b", "Hostel Admin", "--student", "STU002"]).unwrap();

    for filter in ["all", "pending", "completed", "Completed"] {
        ws.run(&["--json-mode", "roster", "--filter", filter]).unwrap();
    }
    ws.run(&["roster", "-f", "pending"]).unwrap();
    assert_eq!(ws.roster_student("STU002").overall_status, OverallStatus::Completed);
}

#[test]
fn roster_filter_rejects_unknown_name() {
    let ws = Workspace::new();
    let err = ws.run(&["roster", "--filter", "blocked"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!ws.path("clearance.db").exists());
}

#[test]
fn remove_deletes_roster_student() {
    let ws = Workspace::new();
    ws.run(&["remove", "--student", "STU001"]).unwrap();

    let err = ws.run(&["remove", "--student", "STU001"]).unwrap_err();
    assert!(matches!(err, ClearanceError::StudentNotFound(ref id) if id == "STU001"));
}

#[test]
fn departments_lists_without_database_writes() {
    let ws = Workspace::new();
    ws.run(&["departments"]).unwrap();
    ws.run(&["--json-mode", "departments"]).unwrap();
    assert!(!ws.path("clearance.db").exists());
}

// =============================================================================
// EXPORT / IMPORT / HASH
// =============================================================================

#[test]
fn export_import_roundtrip() {
    let ws = Workspace::new();
    ws.run(&["init"]).unwrap();
    ws.run(&["pay", "--code", "RK45HJ67", "--amount", "6000"]).unwrap();
    let snapshot = ws.path("backup.grad");
    let snapshot_arg = snapshot.to_string_lossy().into_owned();
    ws.run(&["export", "-o", snapshot_arg.as_str()]).unwrap();

    ws.run_on("restored.db", &["import", "-i", snapshot_arg.as_str()]).unwrap();

    let original = open_session(&ws.config("clearance.db")).unwrap().export().unwrap();
    let restored = open_session(&ws.config("restored.db")).unwrap().export().unwrap();
    assert_eq!(original, restored);
    assert_eq!(
        restored.student.map(|s| s.graduation_fee.amount),
        Some(6000)
    );

    ws.run(&["hash"]).unwrap();
}

#[test]
fn import_rejects_corrupted_snapshot() {
    let ws = Workspace::new();
    ws.run(&["init"]).unwrap();
    let snapshot = ws.path("backup.grad");
    let snapshot_arg = snapshot.to_string_lossy().into_owned();
    ws.run(&["export", "-o", snapshot_arg.as_str()]).unwrap();

    let mut bytes = std::fs::read(&snapshot).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&snapshot, &bytes).unwrap();

    let err = ws.run_on("restored.db", &["import", "-i", snapshot_arg.as_str()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(!ws.path("restored.db").exists());
}

#[test]
fn import_directory_fails() {
    let ws = Workspace::new();
    let dir = ws.path("").to_string_lossy().into_owned();
    let err = ws.run(&["import", "-i", dir.as_str()]).unwrap_err();
    assert!(matches!(err, ClearanceError::IoError(ref m) if m.contains("not a regular file")));
}

#[test]
fn export_into_missing_directory_fails() {
    let ws = Workspace::new();
    let target = ws.path("missing").join("backup.grad");
    let target_arg = target.to_string_lossy().into_owned();
    let err = ws.run(&["export", "-o", target_arg.as_str()]).unwrap_err();
    assert!(matches!(err, ClearanceError::IoError(_)));
}

#[test]
fn import_missing_file_fails() {
    let ws = Workspace::new();
    let missing = ws.path("nope.grad").to_string_lossy().into_owned();
    let err = ws.run(&["import", "-i", missing.as_str()]).unwrap_err();
    assert!(matches!(err, ClearanceError::IoError(_)));
}
