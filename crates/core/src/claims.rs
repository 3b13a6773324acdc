use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Permission, Role};

/// Immutable snapshot of an authenticated principal's identity facts.
///
/// A `ClaimSet` is produced once per request by whatever token/session layer
/// is in use, then passed by reference into the engine. It is never mutated:
/// construction goes through [`ClaimSetBuilder`] and all fields are read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    subject: Option<String>,
    roles: BTreeSet<Role>,
    permissions: BTreeSet<Permission>,
    department: Option<String>,
    issued_at: Option<DateTime<Utc>>,
    mfa_verified: bool,
}

impl ClaimSet {
    pub fn builder() -> ClaimSetBuilder {
        ClaimSetBuilder::default()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn mfa_verified(&self) -> bool {
        self.mfa_verified
    }

    /// An anonymous claim set carries no principal at all: no subject, no
    /// roles, no permissions. Policies reject these before evaluating any
    /// requirement.
    pub fn is_anonymous(&self) -> bool {
        self.subject.is_none() && self.roles.is_empty() && self.permissions.is_empty()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.as_str() == permission)
    }
}

/// Builder for [`ClaimSet`].
///
/// The token layer maps verified claims onto this builder (`sub` → subject,
/// role claims → roles, the multi-value `permissions` claim → permissions,
/// `iat` → issued_at, an `mfa` claim equal to `"true"` → mfa_verified).
#[derive(Debug, Clone, Default)]
pub struct ClaimSetBuilder {
    subject: Option<String>,
    roles: BTreeSet<Role>,
    permissions: BTreeSet<Permission>,
    department: Option<String>,
    issued_at: Option<DateTime<Utc>>,
    mfa_verified: bool,
}

impl ClaimSetBuilder {
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn role(mut self, role: impl Into<Role>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn permission(mut self, permission: impl Into<Permission>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn mfa_verified(mut self, verified: bool) -> Self {
        self.mfa_verified = verified;
        self
    }

    pub fn build(self) -> ClaimSet {
        ClaimSet {
            subject: self.subject,
            roles: self.roles,
            permissions: self.permissions,
            department: self.department,
            issued_at: self.issued_at,
            mfa_verified: self.mfa_verified,
        }
    }
}
