//! # Departments
//!
//! The closed set of offices whose sign-off a student needs.
//!
//! A record's clearance map is created from a [`DepartmentSet`] and its keys
//! never change afterwards: approvals can only target departments the
//! record was created with.

use crate::ClearanceError;
use serde::{Deserialize, Serialize};

/// Identifier of a clearing department.
///
/// Declaration order is the approval order and the `BTreeMap` key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepartmentId {
    Finance,
    Faculty,
    Library,
    Mess,
    Hostel,
    Workshop,
    Sports,
    Other,
}

impl DepartmentId {
    /// Every department, in approval order.
    pub const ALL: [DepartmentId; 8] = [
        Self::Finance,
        Self::Faculty,
        Self::Library,
        Self::Mess,
        Self::Hostel,
        Self::Workshop,
        Self::Sports,
        Self::Other,
    ];

    /// Wire identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finance => "finance",
            Self::Faculty => "faculty",
            Self::Library => "library",
            Self::Mess => "mess",
            Self::Hostel => "hostel",
            Self::Workshop => "workshop",
            Self::Sports => "sports",
            Self::Other => "other",
        }
    }

    /// Human-readable office name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Finance => "Finance Office",
            Self::Faculty => "Faculty Office",
            Self::Library => "Library",
            Self::Mess => "Mess/Cafeteria",
            Self::Hostel => "Hostel",
            Self::Workshop => "Workshop",
            Self::Sports => "Sports & Games",
            Self::Other => "Other",
        }
    }

    /// Position in the approval sequence (0 = first).
    #[must_use]
    pub fn approval_order(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DepartmentId {
    type Err = ClearanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| ClearanceError::InvalidDepartment(s.to_string()))
    }
}

/// Which departments a newly created record must clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepartmentSet {
    /// Finance, faculty, library, mess and hostel.
    #[default]
    Standard,
    /// All eight departments.
    Extended,
}

impl DepartmentSet {
    #[must_use]
    pub fn members(&self) -> &'static [DepartmentId] {
        match self {
            Self::Standard => &DepartmentId::ALL[..5],
            Self::Extended => &DepartmentId::ALL,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }
}

impl std::str::FromStr for DepartmentSet {
    type Err = ClearanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "extended" => Ok(Self::Extended),
            other => Err(ClearanceError::Config(format!(
                "unknown department set '{}' (expected standard or extended)",
                other
            ))),
        }
    }
}
