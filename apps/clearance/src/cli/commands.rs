//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command opens its own session, performs one read-compute-write
//! cycle, and prints either a text report or a JSON document.

use super::{ApplicationArgs, DecisionArgs};
use crate::config::{Backend, Config};
use clearance_core::formats::{checksum, snapshot_digest};
use clearance_core::primitives::MAX_SNAPSHOT_SIZE;
use clearance_core::{
    ApplicationForm, ClearanceError, ClearanceSession, Decision, DepartmentId, MemoryStore,
    ProgressEngine, ProgressSummary, RedbStore, RosterFilter, Snapshot, StateStore, StorageBackend,
    StudentRecord, SystemClock, compute_progress_percentage, sample_roster, snapshot_from_bytes,
    snapshot_to_bytes, summarize,
};
use serde::Serialize;
use std::path::Path;

/// Session type every command runs against.
pub type CliSession = ClearanceSession<StorageBackend, SystemClock>;

// =============================================================================
// SNAPSHOT FILES
// =============================================================================

/// Read a snapshot file, refusing anything that is not a regular file or is
/// larger than a snapshot may be.
fn read_snapshot_file(path: &Path) -> Result<Vec<u8>, ClearanceError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        ClearanceError::IoError(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(ClearanceError::IoError(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_SNAPSHOT_SIZE as u64 {
        return Err(ClearanceError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }
    std::fs::read(path).map_err(|e| ClearanceError::IoError(format!("Read file: {}", e)))
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create a fresh student record and seed the roster.
pub fn cmd_init(config: &Config, force: bool) -> Result<(), ClearanceError> {
    if config.backend == Backend::Redb && config.database.exists() && !force {
        return Err(ClearanceError::IoError(
            "Database already exists. Use --force to overwrite.".to_string(),
        ));
    }

    let mut session = open_session(config)?;
    let snapshot = Snapshot {
        student: Some(session.default_student()),
        roster: sample_roster(),
    };
    session.import(&snapshot)?;

    println!(
        "Initialized {} database at {:?} ({} departments, {} roster students)",
        config.backend.as_str(),
        config.database,
        config.departments.members().len(),
        snapshot.roster.len()
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show the student's progress.
pub fn cmd_status(config: &Config, json_mode: bool) -> Result<(), ClearanceError> {
    let mut session = open_session(config)?;
    let (record, summary) = session.summary();

    if json_mode {
        return print_json(&serde_json::json!({
            "database": config.database.to_string_lossy(),
            "backend": config.backend.as_str(),
            "student": record,
            "summary": summary,
        }));
    }

    print_record(&record, &summary);
    println!();
    println!("Steps");
    for step in &summary.steps {
        let mark = if step.completed { "x" } else { " " };
        println!("  [{}] {:<12} {}", mark, step.kind.title(), step.kind.description());
    }
    println!();
    match summary.next_step {
        Some(step) => println!("Next step: {}", step.description()),
        None => println!("All steps complete: ready for graduation"),
    }
    Ok(())
}

// =============================================================================
// STUDENT ACTIONS
// =============================================================================

/// Record the graduation fee.
pub fn cmd_pay(
    config: &Config,
    json_mode: bool,
    code: &str,
    amount: Option<u64>,
) -> Result<(), ClearanceError> {
    let mut session = open_session(config)?;
    let record = session.pay(amount.unwrap_or(config.fee), code)?;

    if json_mode {
        return print_json(&record);
    }
    println!(
        "Payment of KES {} recorded (reference {})",
        record.graduation_fee.amount, record.graduation_fee.reference_code
    );
    Ok(())
}

/// Submit the application form.
pub fn cmd_apply(
    config: &Config,
    json_mode: bool,
    args: ApplicationArgs,
) -> Result<(), ClearanceError> {
    let form = ApplicationForm {
        name: args.name,
        reg_no: args.reg_no,
        course: args.course,
        email: args.email,
        phone: args.phone,
    };

    let mut session = open_session(config)?;
    let record = session.apply(&form)?;

    if json_mode {
        return print_json(&record);
    }
    println!(
        "Application submitted for {} ({})",
        record.name, record.reg_no
    );
    println!("Clearance review is now open for {} departments", record.clearances.len());
    Ok(())
}

/// Approve or reject one department, on the local record or a roster student.
pub fn cmd_decide(
    config: &Config,
    json_mode: bool,
    decision: Decision,
    args: DecisionArgs,
) -> Result<(), ClearanceError> {
    let department: DepartmentId = args.department.parse()?;
    let notes = args.notes.as_deref();

    let mut session = open_session(config)?;
    let record = match args.student.as_deref() {
        Some(student_id) => session.admin_decide(
            student_id,
            department,
            decision,
            &args.by,
            notes,
            args.revise,
        )?,
        None => session.decide(department, decision, &args.by, notes, args.revise)?,
    };

    if json_mode {
        return print_json(&record);
    }
    println!(
        "{} {} for {} by {}",
        department.display_name(),
        decision.status(),
        record.id,
        args.by.trim()
    );
    println!(
        "Progress: {}% ({})",
        compute_progress_percentage(&record),
        record.overall_status
    );
    Ok(())
}

// =============================================================================
// ADMIN COMMANDS
// =============================================================================

/// List the roster with per-student progress and the bottleneck.
///
/// The filter narrows the listed students; the counts always cover the
/// whole roster.
pub fn cmd_roster(config: &Config, json_mode: bool, filter: &str) -> Result<(), ClearanceError> {
    let filter: RosterFilter = filter.parse()?;
    let mut session = open_session(config)?;
    let roster = session.load_roster();
    let stats = roster.stats();

    if json_mode {
        let students: Vec<_> = roster
            .filter(filter)
            .map(|r| serde_json::json!({ "student": r, "summary": summarize(r) }))
            .collect();
        return print_json(&serde_json::json!({
            "filter": filter,
            "students": students,
            "stats": stats,
        }));
    }

    println!("Roster ({})", filter.as_str());
    println!("======");
    for record in roster.filter(filter) {
        println!(
            "{:<8} {:<24} {:<14} {:>3}%  {}",
            record.id,
            record.name,
            record.reg_no,
            compute_progress_percentage(record),
            record.overall_status
        );
    }
    println!();
    println!(
        "Total: {}  In progress: {}  Completed: {}  Blocked: {}",
        stats.total, stats.in_progress, stats.completed, stats.blocked
    );
    if let Some((dept, count)) = stats.bottleneck() {
        println!("Bottleneck: {} ({} pending)", dept.display_name(), count);
    }
    Ok(())
}

/// Delete a student from the roster.
pub fn cmd_remove(config: &Config, json_mode: bool, student: &str) -> Result<(), ClearanceError> {
    let mut session = open_session(config)?;
    let removed = session.delete_student(student)?;

    if json_mode {
        return print_json(&serde_json::json!({ "removed": removed.id }));
    }
    println!("Removed {} ({})", removed.id, removed.name);
    Ok(())
}

/// List departments and which of them new records must clear.
pub fn cmd_departments(config: &Config, json_mode: bool) -> Result<(), ClearanceError> {
    let members = config.departments.members();

    if json_mode {
        let departments: Vec<_> = DepartmentId::ALL
            .iter()
            .map(|d| {
                serde_json::json!({
                    "id": d,
                    "name": d.display_name(),
                    "order": d.approval_order(),
                    "required": members.contains(d),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "set": config.departments,
            "departments": departments,
        }));
    }

    println!("Departments ({} set)", config.departments.as_str());
    for dept in DepartmentId::ALL {
        let mark = if members.contains(&dept) { "*" } else { " " };
        println!("  {} {:<10} {}", mark, dept.as_str(), dept.display_name());
    }
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT / HASH
// =============================================================================

/// Write the store to a snapshot file.
pub fn cmd_export(config: &Config, output: &Path) -> Result<(), ClearanceError> {
    let session = open_session(config)?;
    let data = snapshot_to_bytes(&session.export()?)?;

    std::fs::write(output, &data).map_err(|e| {
        ClearanceError::IoError(format!("Write '{}': {}", output.display(), e))
    })?;

    println!("Checksum: {:016x}", checksum(&data));
    println!("Exported {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Replace the store with a snapshot file.
pub fn cmd_import(config: &Config, input: &Path) -> Result<(), ClearanceError> {
    let data = read_snapshot_file(input)?;
    let snapshot = snapshot_from_bytes(&data)?;

    let mut session = open_session(config)?;
    session.import(&snapshot)?;

    if let StorageBackend::Persistent(store) = session.store_mut().backend_mut() {
        if let Err(e) = store.compact() {
            tracing::warn!(error = %e, "compaction after import failed");
        }
    }

    println!(
        "Imported snapshot: student record {}, {} roster students",
        if snapshot.student.is_some() { "present" } else { "absent" },
        snapshot.roster.len()
    );
    Ok(())
}

/// BLAKE3 digest of the current snapshot.
pub fn cmd_hash(config: &Config, json_mode: bool) -> Result<(), ClearanceError> {
    let session = open_session(config)?;
    let data = snapshot_to_bytes(&session.export()?)?;
    let digest = snapshot_digest(&data);

    if json_mode {
        return print_json(&serde_json::json!({
            "algorithm": "blake3",
            "hash": digest,
            "bytes": data.len(),
        }));
    }
    println!("BLAKE3: {}", digest);
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open a session on the configured backend.
pub fn open_session(config: &Config) -> Result<CliSession, ClearanceError> {
    let backend = match config.backend {
        Backend::Redb => StorageBackend::Persistent(RedbStore::open(&config.database)?),
        Backend::Memory => StorageBackend::InMemory(MemoryStore::new()),
    };
    Ok(ClearanceSession::new(
        StateStore::new(backend),
        ProgressEngine::new(SystemClock),
        config.keys.clone(),
        config.departments,
    ))
}

fn print_json(value: &impl Serialize) -> Result<(), ClearanceError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ClearanceError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn print_record(record: &StudentRecord, summary: &ProgressSummary) {
    println!("Graduation Clearance");
    println!("====================");
    println!("Student:  {} {}", record.id, record.name);
    if !record.reg_no.is_empty() {
        println!("Reg No:   {}", record.reg_no);
        println!("Course:   {}", record.course);
    }
    println!(
        "Fee:      {}",
        if record.graduation_fee.paid {
            format!(
                "paid KES {} ({})",
                record.graduation_fee.amount, record.graduation_fee.reference_code
            )
        } else {
            "unpaid".to_string()
        }
    );
    println!(
        "Progress: {}% ({}/{} approved, {})",
        summary.percent, summary.approved, summary.total, summary.status
    );
    println!();
    println!("Clearances");
    for (dept, entry) in &record.clearances {
        let detail = match (&entry.approved_by, entry.date) {
            (Some(by), Some(date)) => format!("{} on {}", by, date),
            _ => String::new(),
        };
        println!(
            "  {:<16} {:<9} {}",
            dept.display_name(),
            entry.status.as_str(),
            detail
        );
    }
}
