//! # Configuration
//!
//! Settings are layered, lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config`, else `clearance.toml` if present)
//! 3. `CLEARANCE_*` environment variables
//! 4. command-line flags
//!
//! ```toml
//! database = "clearance.db"
//! backend = "redb"
//! departments = "extended"
//! fee = 5500
//!
//! [keys]
//! student = "student-data"
//! roster = "all-students-data"
//! ```

use clearance_core::primitives::GRADUATION_FEE_KES;
use clearance_core::{ClearanceError, DepartmentSet, StoreKeys};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "clearance.toml";

/// Default database path.
pub const DEFAULT_DATABASE: &str = "clearance.db";

// =============================================================================
// BACKEND
// =============================================================================

/// Where records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// ACID database file.
    #[default]
    Redb,
    /// Nothing survives the process. Useful for dry runs.
    Memory,
}

impl Backend {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = ClearanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" => Ok(Self::Memory),
            other => Err(ClearanceError::Config(format!(
                "unknown backend '{}' (expected redb or memory)",
                other
            ))),
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: PathBuf,
    pub backend: Backend,
    /// Departments new records must clear.
    pub departments: DepartmentSet,
    /// Amount recorded when `pay` is given no `--amount`.
    pub fee: u64,
    pub keys: StoreKeys,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            backend: Backend::default(),
            departments: DepartmentSet::default(),
            fee: GRADUATION_FEE_KES,
            keys: StoreKeys::default(),
        }
    }
}

impl Config {
    /// Resolve every layer.
    ///
    /// An explicit `config_file` must exist; the implicit
    /// `clearance.toml` is only read when present.
    pub fn load(
        config_file: Option<&Path>,
        database: Option<PathBuf>,
        backend: Option<&str>,
    ) -> Result<Self, ClearanceError> {
        let base = match config_file {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        base.with_env(|key| std::env::var(key).ok())?
            .with_flags(database, backend)
    }

    /// Read a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ClearanceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClearanceError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML. Missing fields keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ClearanceError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ClearanceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CLEARANCE_DB`, `CLEARANCE_BACKEND`, `CLEARANCE_DEPARTMENTS`
    /// and `CLEARANCE_FEE` as returned by `lookup`.
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ClearanceError> {
        if let Some(db) = lookup("CLEARANCE_DB") {
            self.database = PathBuf::from(db);
        }
        if let Some(backend) = lookup("CLEARANCE_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(set) = lookup("CLEARANCE_DEPARTMENTS") {
            self.departments = set.parse()?;
        }
        if let Some(fee) = lookup("CLEARANCE_FEE") {
            self.fee = fee
                .trim()
                .parse()
                .map_err(|_| ClearanceError::Config(format!("Invalid CLEARANCE_FEE '{}'", fee)))?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Apply command-line overrides.
    pub fn with_flags(
        mut self,
        database: Option<PathBuf>,
        backend: Option<&str>,
    ) -> Result<Self, ClearanceError> {
        if let Some(db) = database {
            self.database = db;
        }
        if let Some(backend) = backend {
            self.backend = backend.parse()?;
        }
        Ok(self)
    }

    fn validate(&self) -> Result<(), ClearanceError> {
        if self.fee == 0 {
            return Err(ClearanceError::Config("fee must be positive".to_string()));
        }
        if self.keys.student.is_empty() || self.keys.roster.is_empty() {
            return Err(ClearanceError::Config("storage keys must not be empty".to_string()));
        }
        if self.keys.student == self.keys.roster {
            return Err(ClearanceError::Config(
                "student and roster keys must differ".to_string(),
            ));
        }
        Ok(())
    }
}
