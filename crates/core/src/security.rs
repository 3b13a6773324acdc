//! Derived security level.

use serde::{Deserialize, Serialize};

use crate::ClaimSet;

/// Ordinal ranking of a principal's overall privilege.
///
/// A level is *derived* from a claim set at evaluation time and never stored
/// on it. Ordering is meaningful: `Basic < MediumLow < Medium < High < Maximum`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Basic = 1,
    MediumLow = 2,
    Medium = 3,
    High = 4,
    Maximum = 5,
}

impl SecurityLevel {
    /// Derive the security level for a claim set.
    ///
    /// The precedence order is significant — first match wins:
    /// SuperAdmin role → Maximum; Admin role or the `admin.access`
    /// permission → High; Manager role → Medium; any permission containing
    /// `"write"` → MediumLow; otherwise Basic.
    pub fn of(claims: &ClaimSet) -> Self {
        if claims.has_role("SuperAdmin") {
            Self::Maximum
        } else if claims.has_role("Admin") || claims.has_permission("admin.access") {
            Self::High
        } else if claims.has_role("Manager") {
            Self::Medium
        } else if claims.permissions().iter().any(|p| p.as_str().contains("write")) {
            Self::MediumLow
        } else {
            Self::Basic
        }
    }
}

impl core::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Basic => "Basic",
            Self::MediumLow => "MediumLow",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Maximum => "Maximum",
        };
        f.write_str(name)
    }
}
