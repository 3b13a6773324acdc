//! Policy model and fluent builder.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use warden_core::{Permission, PolicyError, PolicyResult, Role};

use crate::requirement::{ConditionalAccessParams, Requirement};

/// An ordered, immutable collection of requirements that must all hold.
///
/// Every policy also carries an implicit "authenticated principal"
/// requirement: an anonymous claim set is rejected before any listed
/// requirement is evaluated (see [`crate::Authorizer`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    name: Option<String>,
    requirements: Vec<Requirement>,
}

impl Policy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

/// Fluent policy construction.
///
/// Arguments are validated eagerly: the first malformed requirement is
/// remembered and surfaced by [`PolicyBuilder::build`], so a misconfigured
/// policy fails at startup/registration rather than at request time.
///
/// ```
/// use warden_policy::Policy;
///
/// let policy = Policy::builder()
///     .name("user-management")
///     .require_permission("users.read")
///     .require_any_permission(["users.write", "users.admin"])
///     .build()
///     .unwrap();
/// assert_eq!(policy.requirements().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    name: Option<String>,
    requirements: Vec<Requirement>,
    error: Option<PolicyError>,
}

impl PolicyBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append an already-constructed requirement.
    pub fn require(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn require_permission(self, name: impl Into<Permission>) -> Self {
        let req = Requirement::permission(name);
        self.push(req)
    }

    pub fn require_all_permissions<I, P>(self, names: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        let req = Requirement::all_permissions(names);
        self.push(req)
    }

    pub fn require_any_permission<I, P>(self, names: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        let req = Requirement::any_permission(names);
        self.push(req)
    }

    pub fn require_role_with_permissions<IR, R, IP, P>(self, roles: IR, permissions: IP) -> Self
    where
        IR: IntoIterator<Item = R>,
        R: Into<Role>,
        IP: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        let req = Requirement::role_with_permissions(roles, permissions);
        self.push(req)
    }

    /// Working-hours gate with the timezone given as an IANA id
    /// (e.g. `"Europe/Berlin"`).
    pub fn require_working_hours(
        self,
        start: NaiveTime,
        end: NaiveTime,
        timezone: &str,
        admin_bypass: Option<&str>,
    ) -> Self {
        let req = Requirement::working_hours_named(
            start,
            end,
            timezone,
            admin_bypass.map(|p| Permission::new(p.to_owned())),
        );
        self.push(req)
    }

    pub fn require_department<I, S>(self, allowed: I, allow_no_department: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = Requirement::department(allowed, allow_no_department);
        self.push(req)
    }

    pub fn require_conditional_access(self, params: ConditionalAccessParams) -> Self {
        let req = Requirement::conditional_access(params);
        self.push(req)
    }

    /// Finish the policy.
    ///
    /// Surfaces the first construction error recorded by any `require_*`
    /// call; a policy with no requirements is also rejected.
    pub fn build(self) -> PolicyResult<Policy> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.requirements.is_empty() {
            return Err(PolicyError::empty_policy(
                self.name.as_deref().unwrap_or("<anonymous>"),
            ));
        }
        Ok(Policy {
            name: self.name,
            requirements: self.requirements,
        })
    }

    fn push(mut self, requirement: PolicyResult<Requirement>) -> Self {
        match requirement {
            Ok(req) => self.requirements.push(req),
            // Keep the first error; later calls cannot un-break the policy.
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
        self
    }
}
