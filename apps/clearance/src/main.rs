//! # Clearance - Graduation Clearance Tracker
//!
//! The main binary for the clearance workflow.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │          apps/clearance (THE BINARY)          │
//! │                                               │
//! │   ┌─────────────┐        ┌────────────────┐   │
//! │   │    CLI      │        │    Config      │   │
//! │   │   (clap)    │◄───────┤ (toml + env)   │   │
//! │   └──────┬──────┘        └────────────────┘   │
//! │          ▼                                    │
//! │   ┌──────────────────┐                        │
//! │   │  clearance-core  │                        │
//! │   │   (THE LOGIC)    │                        │
//! │   └──────────────────┘                        │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! clearance init
//! clearance pay --code RK45HJ67
//! clearance apply --name "John Kamau" --reg-no CS/2020/001 \
//!     --course "BSc Computer Science" --email john.kamau@student.mksu.ac.ke \
//!     --phone +254712345678
//! clearance approve --department finance --by "Jane Mwangi"
//! clearance reject --department hostel --by "Hostel Admin" --student STU002
//! clearance status
//! ```

use clap::Parser;
use clearance::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // CLEARANCE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CLEARANCE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clearance=info,clearance_core=info".into());

    // Logs go to stderr so --json-mode output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!(kind = ?e.kind(), "Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!("Graduation Clearance Tracker v{}", env!("CARGO_PKG_VERSION"));
    println!("Payment -> Application -> Department Clearance");
    println!();
}
