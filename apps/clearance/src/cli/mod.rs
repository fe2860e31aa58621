//! # Clearance CLI Module
//!
//! This module implements the CLI interface for the clearance tracker.
//!
//! ## Available Commands
//!
//! - `init` - Create the student record and seed the roster
//! - `status` - Show the student's progress (default)
//! - `pay` - Record the graduation fee
//! - `apply` - Submit the graduation application
//! - `approve` / `reject` - Decide a department clearance
//! - `roster` - List students under admin review, optionally filtered
//! - `remove` - Delete a student from the roster
//! - `departments` - List the clearing departments
//! - `export` / `import` - Snapshot the whole store
//! - `hash` - Compute BLAKE3 hash of the snapshot

mod commands;

use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use clearance_core::{ClearanceError, Decision};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Graduation clearance tracker
///
/// Pay the fee, submit the application, then collect sign-off from every
/// department.
#[derive(Parser, Debug)]
#[command(name = "clearance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database) or "memory" (volatile)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the student record and seed the admin roster
    Init {
        /// Overwrite existing data
        #[arg(short, long)]
        force: bool,
    },

    /// Show the student's clearance progress
    Status,

    /// Record the graduation fee payment
    Pay {
        /// Mobile-money confirmation code
        #[arg(short, long)]
        code: String,

        /// Amount in KES (defaults to the configured fee)
        #[arg(short, long)]
        amount: Option<u64>,
    },

    /// Submit the graduation application
    Apply(ApplicationArgs),

    /// Approve a department clearance
    Approve(DecisionArgs),

    /// Reject a department clearance
    Reject(DecisionArgs),

    /// List students under admin review
    Roster {
        /// Which students to list: all, pending or completed
        #[arg(short, long, default_value = "all")]
        filter: String,
    },

    /// Delete a student from the roster
    Remove {
        /// Student id
        #[arg(short, long)]
        student: String,
    },

    /// List clearing departments
    Departments,

    /// Export the store as a snapshot
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Replace the store with a snapshot
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute BLAKE3 cryptographic hash of the snapshot
    Hash,
}

/// Identity fields of the application form.
#[derive(Args, Debug)]
pub struct ApplicationArgs {
    #[arg(long)]
    pub name: String,

    /// Registration number, e.g. CS/2020/001
    #[arg(long)]
    pub reg_no: String,

    #[arg(long)]
    pub course: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,
}

/// Target and reviewer of a clearance decision.
#[derive(Args, Debug)]
pub struct DecisionArgs {
    /// Department id (finance, faculty, library, mess, hostel, ...)
    #[arg(short, long)]
    pub department: String,

    /// Name of the approving officer
    #[arg(short, long)]
    pub by: String,

    /// Reviewer notes
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Decide for this roster student instead of the local record
    #[arg(short, long)]
    pub student: Option<String>,

    /// Overwrite an earlier decision
    #[arg(long)]
    pub revise: bool,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), ClearanceError> {
    let config = Config::load(cli.config.as_deref(), cli.database, cli.backend.as_deref())?;
    let json_mode = cli.json_mode;
    tracing::debug!(
        database = %config.database.display(),
        backend = config.backend.as_str(),
        "configuration resolved"
    );

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::Pay { code, amount }) => cmd_pay(&config, json_mode, &code, amount),
        Some(Commands::Apply(args)) => cmd_apply(&config, json_mode, args),
        Some(Commands::Approve(args)) => cmd_decide(&config, json_mode, Decision::Approved, args),
        Some(Commands::Reject(args)) => cmd_decide(&config, json_mode, Decision::Rejected, args),
        Some(Commands::Roster { filter }) => cmd_roster(&config, json_mode, &filter),
        Some(Commands::Remove { student }) => cmd_remove(&config, json_mode, &student),
        Some(Commands::Departments) => cmd_departments(&config, json_mode),
        Some(Commands::Export { output }) => cmd_export(&config, &output),
        Some(Commands::Import { input }) => cmd_import(&config, &input),
        Some(Commands::Hash) => cmd_hash(&config, json_mode),
    }
}
