//! # clearance-core
//!
//! The graduation clearance Progress Engine - THE LOGIC.
//!
//! A student pays the graduation fee, submits an application, and then
//! collects sign-off from a fixed set of departments. This crate derives
//! progress and overall status from a [`StudentRecord`], gates each step on
//! the one before it, and persists records through an injected key-value
//! store.
//!
//! ## Layout
//!
//! - `types`, `departments` → the data model and the error enum
//! - `progress` → pure derivations and transitions (`ProgressEngine`)
//! - `storage`, `store`, `formats` → blob persistence and snapshots
//! - `session` → read-compute-write cycles with storage fallbacks
//! - `roster` → the admin view over many students
//! - `remote` → response classification and credentials for the REST API
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Integer arithmetic only; `BTreeMap` for every keyed collection
//! - The current date is injected through [`Clock`], never read globally

// =============================================================================
// MODULES
// =============================================================================

pub mod departments;
pub mod formats;
pub mod primitives;
pub mod progress;
pub mod remote;
pub mod roster;
pub mod session;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use departments::{DepartmentId, DepartmentSet};
pub use types::{
    ApplicationForm, ClearanceEntry, ClearanceError, ClearanceStatus, Decision, ErrorKind,
    GraduationFee, OverallStatus, StudentRecord,
};

// =============================================================================
// RE-EXPORTS: Progress Engine
// =============================================================================

pub use progress::{
    Clock, FixedClock, ProgressEngine, ProgressSummary, Step, StepKind, SystemClock,
    approved_count, can_enter_clearance, can_submit_application, compute_overall_status,
    compute_progress_percentage, normalize, summarize,
};

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use formats::{Snapshot, snapshot_from_bytes, snapshot_to_bytes};
pub use session::ClearanceSession;
pub use storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend};
pub use store::{StateStore, StoreKeys};

// =============================================================================
// RE-EXPORTS: Admin & Remote
// =============================================================================

pub use remote::{AuthOutcome, Credentials, Role, classify_response, handle_status};
pub use roster::{Roster, RosterFilter, RosterStats, sample_roster};
