//! Requirement model.
//!
//! A requirement is one declarative access-control condition. The set of
//! kinds is closed: dispatch happens by matching on the enum (see
//! [`crate::evaluate`]), not by open-ended handler registration.
//!
//! Constructors validate eagerly. An empty required set, a blank name, an
//! unknown timezone or an inverted time window is a configuration mistake
//! and fails with [`PolicyError::InvalidRequirement`] at build time.

use std::collections::BTreeSet;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use warden_core::{Permission, PolicyError, PolicyResult, Role, SecurityLevel};

/// One declarative access-control condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    /// Holds iff the claim set carries the named permission.
    Permission { name: Permission },

    /// Holds iff the claim set carries *every* named permission (AND).
    AllPermissions { names: BTreeSet<Permission> },

    /// Holds iff the claim set carries *at least one* named permission (OR).
    AnyPermission { names: BTreeSet<Permission> },

    /// Holds iff the principal has one of the roles (OR) *and* all of the
    /// permissions (AND). The asymmetry is deliberate: role membership is
    /// alternative, permission coverage is cumulative.
    RoleWithPermissions {
        roles: BTreeSet<Role>,
        permissions: BTreeSet<Permission>,
    },

    /// Holds iff the current time of day, in the given timezone, falls
    /// within `[start, end]` — or the principal carries the bypass
    /// permission, if one is configured.
    WorkingHours {
        start: NaiveTime,
        end: NaiveTime,
        timezone: Tz,
        admin_bypass: Option<Permission>,
    },

    /// Holds iff the principal's department is in the allowed set
    /// (case-insensitive), or the principal has no department and
    /// `allow_no_department` is set.
    Department {
        allowed: BTreeSet<String>,
        allow_no_department: bool,
    },

    /// Composite requirement evaluating up to five independent sub-checks;
    /// all applicable sub-checks must pass, and every failing sub-check
    /// contributes its own reason.
    ConditionalAccess(ConditionalAccessParams),
}

/// Parameters for [`Requirement::ConditionalAccess`].
///
/// Each field enables one sub-check; the default enables none. At least one
/// sub-check must be enabled to construct the requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalAccessParams {
    /// Require a verified multi-factor claim.
    pub require_mfa: bool,

    /// Maximum age of the token, from its issued-at claim.
    pub max_token_age_seconds: Option<i64>,

    /// Require the current UTC time of day to fall within 08:00–18:00.
    pub require_working_hours: bool,

    /// Restrict to these departments (case-insensitive).
    pub allowed_departments: Option<BTreeSet<String>>,

    /// Require the derived [`SecurityLevel`] to be at least this.
    pub minimum_security_level: Option<SecurityLevel>,
}

impl ConditionalAccessParams {
    fn enables_any_check(&self) -> bool {
        self.require_mfa
            || self.max_token_age_seconds.is_some()
            || self.require_working_hours
            || self.allowed_departments.is_some()
            || self.minimum_security_level.is_some()
    }
}

impl Requirement {
    /// Single-permission requirement.
    pub fn permission(name: impl Into<Permission>) -> PolicyResult<Self> {
        let name = name.into();
        if name.as_str().trim().is_empty() {
            return Err(PolicyError::invalid_requirement("permission name is blank"));
        }
        Ok(Self::Permission { name })
    }

    /// All-of-permissions requirement (AND).
    pub fn all_permissions<I, P>(names: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        let names = collect_permissions(names, "all-permissions")?;
        Ok(Self::AllPermissions { names })
    }

    /// Any-of-permissions requirement (OR).
    pub fn any_permission<I, P>(names: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        let names = collect_permissions(names, "any-permission")?;
        Ok(Self::AnyPermission { names })
    }

    /// Role-plus-permissions requirement.
    pub fn role_with_permissions<IR, R, IP, P>(roles: IR, permissions: IP) -> PolicyResult<Self>
    where
        IR: IntoIterator<Item = R>,
        R: Into<Role>,
        IP: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        let roles: BTreeSet<Role> = roles.into_iter().map(Into::into).collect();
        if roles.is_empty() {
            return Err(PolicyError::invalid_requirement(
                "role-with-permissions requires at least one role",
            ));
        }
        let permissions = collect_permissions(permissions, "role-with-permissions")?;
        Ok(Self::RoleWithPermissions { roles, permissions })
    }

    /// Working-hours window in a named timezone.
    ///
    /// Overnight windows (`start > end`, e.g. 22:00–06:00) are rejected:
    /// the window is a same-day interval, inclusive at both ends.
    pub fn working_hours(
        start: NaiveTime,
        end: NaiveTime,
        timezone: Tz,
        admin_bypass: Option<Permission>,
    ) -> PolicyResult<Self> {
        if start > end {
            return Err(PolicyError::invalid_requirement(format!(
                "working-hours window is inverted ({start}..{end}); overnight windows are not supported"
            )));
        }
        Ok(Self::WorkingHours {
            start,
            end,
            timezone,
            admin_bypass,
        })
    }

    /// Working-hours window with the timezone given as an IANA id.
    pub fn working_hours_named(
        start: NaiveTime,
        end: NaiveTime,
        timezone: &str,
        admin_bypass: Option<Permission>,
    ) -> PolicyResult<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| PolicyError::invalid_requirement(format!("unknown timezone '{timezone}'")))?;
        Self::working_hours(start, end, tz, admin_bypass)
    }

    /// Department restriction.
    pub fn department<I, S>(allowed: I, allow_no_department: bool) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: BTreeSet<String> = allowed
            .into_iter()
            .map(Into::into)
            .filter(|d| !d.trim().is_empty())
            .collect();
        if allowed.is_empty() {
            return Err(PolicyError::invalid_requirement(
                "department requirement needs at least one allowed department",
            ));
        }
        Ok(Self::Department {
            allowed,
            allow_no_department,
        })
    }

    /// Composite conditional-access requirement.
    pub fn conditional_access(params: ConditionalAccessParams) -> PolicyResult<Self> {
        if !params.enables_any_check() {
            return Err(PolicyError::invalid_requirement(
                "conditional access enables no sub-check",
            ));
        }
        if let Some(max_age) = params.max_token_age_seconds {
            if max_age <= 0 {
                return Err(PolicyError::invalid_requirement(
                    "max token age must be positive",
                ));
            }
        }
        if let Some(departments) = &params.allowed_departments {
            if departments.is_empty() {
                return Err(PolicyError::invalid_requirement(
                    "conditional access allowed-departments set is empty",
                ));
            }
        }
        Ok(Self::ConditionalAccess(params))
    }
}

fn collect_permissions<I, P>(names: I, context: &str) -> PolicyResult<BTreeSet<Permission>>
where
    I: IntoIterator<Item = P>,
    P: Into<Permission>,
{
    let names: BTreeSet<Permission> = names
        .into_iter()
        .map(Into::into)
        .filter(|p| !p.as_str().trim().is_empty())
        .collect();
    if names.is_empty() {
        return Err(PolicyError::invalid_requirement(format!(
            "{context} requires at least one permission"
        )));
    }
    Ok(names)
}
