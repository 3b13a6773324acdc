//! Requirement evaluators.
//!
//! One evaluator per requirement kind, dispatched by a single match in
//! [`evaluate`]. Evaluators are pure: no I/O, no side effects, no panics for
//! well-formed requirements. Malformed *claim data* (a missing issued-at
//! where token age is checked, an absent department where one is required)
//! is an evaluation failure with a descriptive reason, never an error.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use warden_core::{ClaimSet, Permission, Role, SecurityLevel};

use crate::requirement::{ConditionalAccessParams, Requirement};

/// Fixed business-hours window used by the conditional-access sub-check.
///
/// Evaluated against the injected clock's UTC time of day; use a
/// [`Requirement::WorkingHours`] requirement when a specific timezone or
/// window is needed.
const CONDITIONAL_HOURS_START: (u32, u32) = (8, 0);
const CONDITIONAL_HOURS_END: (u32, u32) = (18, 0);

/// Outcome of evaluating a single requirement.
///
/// A failed requirement can carry more than one reason (composite kinds
/// report every failed clause).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementOutcome {
    Satisfied,
    Failed(Vec<String>),
}

impl RequirementOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            Self::Satisfied => &[],
            Self::Failed(reasons) => reasons,
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(vec![reason.into()])
    }

    fn from_reasons(reasons: Vec<String>) -> Self {
        if reasons.is_empty() {
            Self::Satisfied
        } else {
            Self::Failed(reasons)
        }
    }
}

/// Evaluate one requirement against a claim set at the given instant.
///
/// Referentially transparent: the same `(claims, requirement, now)` always
/// yields the same outcome.
pub fn evaluate(claims: &ClaimSet, requirement: &Requirement, now: DateTime<Utc>) -> RequirementOutcome {
    match requirement {
        Requirement::Permission { name } => permission(claims, name),
        Requirement::AllPermissions { names } => all_permissions(claims, names),
        Requirement::AnyPermission { names } => any_permission(claims, names),
        Requirement::RoleWithPermissions { roles, permissions } => {
            role_with_permissions(claims, roles, permissions)
        }
        Requirement::WorkingHours {
            start,
            end,
            timezone,
            admin_bypass,
        } => working_hours(claims, *start, *end, *timezone, admin_bypass.as_ref(), now),
        Requirement::Department {
            allowed,
            allow_no_department,
        } => department(claims, allowed, *allow_no_department),
        Requirement::ConditionalAccess(params) => conditional_access(claims, params, now),
    }
}

fn permission(claims: &ClaimSet, name: &Permission) -> RequirementOutcome {
    if claims.has_permission(name.as_str()) {
        RequirementOutcome::Satisfied
    } else {
        RequirementOutcome::failed(format!("missing permission: {name}"))
    }
}

fn all_permissions(claims: &ClaimSet, names: &BTreeSet<Permission>) -> RequirementOutcome {
    // Report the full missing subset, not just the first gap.
    let missing: Vec<&str> = names
        .iter()
        .filter(|p| !claims.has_permission(p.as_str()))
        .map(Permission::as_str)
        .collect();
    if missing.is_empty() {
        RequirementOutcome::Satisfied
    } else {
        RequirementOutcome::failed(format!("missing permissions: {}", missing.join(", ")))
    }
}

fn any_permission(claims: &ClaimSet, names: &BTreeSet<Permission>) -> RequirementOutcome {
    if names.iter().any(|p| claims.has_permission(p.as_str())) {
        RequirementOutcome::Satisfied
    } else {
        let alternatives: Vec<&str> = names.iter().map(Permission::as_str).collect();
        RequirementOutcome::failed(format!(
            "requires one of permissions: {}",
            alternatives.join(", ")
        ))
    }
}

fn role_with_permissions(
    claims: &ClaimSet,
    roles: &BTreeSet<Role>,
    permissions: &BTreeSet<Permission>,
) -> RequirementOutcome {
    // Both clauses are evaluated independently so the reason names every
    // failed clause, not just the first.
    let mut reasons = Vec::new();

    if !roles.iter().any(|r| claims.has_role(r.as_str())) {
        let wanted: Vec<&str> = roles.iter().map(Role::as_str).collect();
        reasons.push(format!("requires one of roles: {}", wanted.join(", ")));
    }

    let missing: Vec<&str> = permissions
        .iter()
        .filter(|p| !claims.has_permission(p.as_str()))
        .map(Permission::as_str)
        .collect();
    if !missing.is_empty() {
        reasons.push(format!("missing permissions: {}", missing.join(", ")));
    }

    RequirementOutcome::from_reasons(reasons)
}

fn working_hours(
    claims: &ClaimSet,
    start: NaiveTime,
    end: NaiveTime,
    timezone: Tz,
    admin_bypass: Option<&Permission>,
    now: DateTime<Utc>,
) -> RequirementOutcome {
    if let Some(bypass) = admin_bypass {
        if claims.has_permission(bypass.as_str()) {
            return RequirementOutcome::Satisfied;
        }
    }

    let local = now.with_timezone(&timezone);
    let time_of_day = local.time();
    if start <= time_of_day && time_of_day <= end {
        RequirementOutcome::Satisfied
    } else {
        RequirementOutcome::failed(format!(
            "outside working hours {}-{} {} (current local time {})",
            start.format("%H:%M"),
            end.format("%H:%M"),
            timezone,
            time_of_day.format("%H:%M:%S"),
        ))
    }
}

fn department(
    claims: &ClaimSet,
    allowed: &BTreeSet<String>,
    allow_no_department: bool,
) -> RequirementOutcome {
    let allowed_list = || allowed.iter().map(String::as_str).collect::<Vec<_>>().join(", ");

    match claims.department() {
        None => {
            if allow_no_department {
                RequirementOutcome::Satisfied
            } else {
                RequirementOutcome::failed(format!(
                    "no department assigned (allowed: {})",
                    allowed_list()
                ))
            }
        }
        Some(dept) => {
            // Department names are compared case-insensitively.
            if allowed.iter().any(|a| a.eq_ignore_ascii_case(dept)) {
                RequirementOutcome::Satisfied
            } else {
                RequirementOutcome::failed(format!(
                    "department '{dept}' not allowed (allowed: {})",
                    allowed_list()
                ))
            }
        }
    }
}

fn conditional_access(
    claims: &ClaimSet,
    params: &ConditionalAccessParams,
    now: DateTime<Utc>,
) -> RequirementOutcome {
    // Every applicable sub-check runs; failures are collected, never
    // short-circuited, so the verdict names all violations at once.
    let mut reasons = Vec::new();

    if params.require_mfa && !claims.mfa_verified() {
        reasons.push("multi-factor authentication required".to_string());
    }

    if let Some(max_age) = params.max_token_age_seconds {
        match claims.issued_at() {
            None => reasons.push("cannot determine token age (missing issued-at claim)".to_string()),
            Some(issued_at) if issued_at > now => {
                reasons.push("token issued in the future".to_string());
            }
            Some(issued_at) => {
                let age = (now - issued_at).num_seconds();
                if age > max_age {
                    reasons.push(format!(
                        "token too old: issued {age}s ago, maximum allowed {max_age}s"
                    ));
                }
            }
        }
    }

    if params.require_working_hours {
        let (sh, sm) = CONDITIONAL_HOURS_START;
        let (eh, em) = CONDITIONAL_HOURS_END;
        let start = NaiveTime::from_hms_opt(sh, sm, 0).unwrap_or(NaiveTime::MIN);
        let end = NaiveTime::from_hms_opt(eh, em, 0).unwrap_or(NaiveTime::MIN);
        let time_of_day = now.time();
        if time_of_day < start || time_of_day > end {
            reasons.push(format!(
                "outside permitted hours {}-{} UTC (current {})",
                start.format("%H:%M"),
                end.format("%H:%M"),
                time_of_day.format("%H:%M:%S"),
            ));
        }
    }

    if let Some(allowed) = &params.allowed_departments {
        let allowed_list = allowed.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        match claims.department() {
            None => reasons.push(format!("no department assigned (allowed: {allowed_list})")),
            Some(dept) => {
                if !allowed.iter().any(|a| a.eq_ignore_ascii_case(dept)) {
                    reasons.push(format!(
                        "department '{dept}' not allowed (allowed: {allowed_list})"
                    ));
                }
            }
        }
    }

    if let Some(minimum) = params.minimum_security_level {
        let level = SecurityLevel::of(claims);
        if level < minimum {
            reasons.push(format!("security level {level} below required {minimum}"));
        }
    }

    RequirementOutcome::from_reasons(reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use warden_core::PolicyResult;

    fn noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
    }

    fn midnight_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 0, 30, 0).unwrap()
    }

    fn reader() -> ClaimSet {
        ClaimSet::builder().subject("alice").permission("users.read").build()
    }

    fn expect_failed(outcome: RequirementOutcome) -> Vec<String> {
        match outcome {
            RequirementOutcome::Failed(reasons) => reasons,
            RequirementOutcome::Satisfied => panic!("expected a failed outcome"),
        }
    }

    #[test]
    fn permission_present_is_satisfied() {
        let req = Requirement::permission("users.read").unwrap();
        assert!(evaluate(&reader(), &req, noon_utc()).is_satisfied());
    }

    #[test]
    fn permission_missing_names_it() {
        let claims = ClaimSet::builder().subject("bob").build();
        let req = Requirement::permission("users.read").unwrap();
        let reasons = expect_failed(evaluate(&claims, &req, noon_utc()));
        assert_eq!(reasons, vec!["missing permission: users.read".to_string()]);
    }

    #[test]
    fn all_permissions_reports_full_missing_subset() {
        let claims = ClaimSet::builder().subject("bob").permission("a.read").build();
        let req = Requirement::all_permissions(["a.read", "b.write", "c.delete"]).unwrap();
        let reasons = expect_failed(evaluate(&claims, &req, noon_utc()));
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("b.write"));
        assert!(reasons[0].contains("c.delete"));
        assert!(!reasons[0].contains("a.read"));
    }

    #[test]
    fn any_permission_lists_all_alternatives_on_failure() {
        let claims = reader();
        let req = Requirement::any_permission(["x.admin", "y.admin"]).unwrap();
        let reasons = expect_failed(evaluate(&claims, &req, noon_utc()));
        assert!(reasons[0].contains("x.admin"));
        assert!(reasons[0].contains("y.admin"));
    }

    #[test]
    fn role_with_permissions_satisfied_by_one_role_and_all_permissions() {
        let claims = ClaimSet::builder()
            .role("Manager")
            .permissions(["users.read", "reports.read"])
            .build();
        let req = Requirement::role_with_permissions(
            ["Manager", "Admin"],
            ["users.read", "reports.read"],
        )
        .unwrap();
        assert!(evaluate(&claims, &req, noon_utc()).is_satisfied());
    }

    #[test]
    fn role_with_permissions_names_each_failed_clause() {
        let claims = ClaimSet::builder().subject("bob").permission("users.read").build();
        let req =
            Requirement::role_with_permissions(["Manager"], ["users.read", "reports.read"]).unwrap();
        let reasons = expect_failed(evaluate(&claims, &req, noon_utc()));
        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].contains("Manager"));
        assert!(reasons[1].contains("reports.read"));
    }

    #[test]
    fn working_hours_inside_window_is_satisfied() {
        let req = Requirement::working_hours_named(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            "UTC",
            None,
        )
        .unwrap();
        assert!(evaluate(&reader(), &req, noon_utc()).is_satisfied());
    }

    #[test]
    fn working_hours_outside_window_reports_window_and_timezone() {
        let req = Requirement::working_hours_named(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            "Europe/Berlin",
            None,
        )
        .unwrap();
        // 23:30 UTC on 2024-06-03 is 01:30 in Berlin (CEST).
        let late = Utc.with_ymd_and_hms(2024, 6, 3, 23, 30, 0).unwrap();
        let reasons = expect_failed(evaluate(&reader(), &req, late));
        assert!(reasons[0].contains("09:00-17:00"));
        assert!(reasons[0].contains("Europe/Berlin"));
        assert!(reasons[0].contains("01:30"));
    }

    #[test]
    fn working_hours_respects_timezone_conversion() {
        let req = Requirement::working_hours_named(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            "Asia/Tokyo",
            None,
        )
        .unwrap();
        // 01:00 UTC is 10:00 in Tokyo: inside the window.
        let early_utc = Utc.with_ymd_and_hms(2024, 6, 3, 1, 0, 0).unwrap();
        assert!(evaluate(&reader(), &req, early_utc).is_satisfied());
    }

    #[test]
    fn admin_bypass_permission_defeats_the_clock() {
        let req = Requirement::working_hours_named(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            "UTC",
            Some(Permission::new("admin.access")),
        )
        .unwrap();
        let admin = ClaimSet::builder().subject("root").permission("admin.access").build();
        assert!(evaluate(&admin, &req, midnight_utc()).is_satisfied());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let req = Requirement::working_hours_named(start, end, "UTC", None).unwrap();

        let at_start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let at_end = Utc.with_ymd_and_hms(2024, 6, 3, 17, 0, 0).unwrap();
        assert!(evaluate(&reader(), &req, at_start).is_satisfied());
        assert!(evaluate(&reader(), &req, at_end).is_satisfied());
    }

    #[test]
    fn missing_department_fails_unless_allowed() {
        let claims = ClaimSet::builder().subject("bob").build();
        let strict = Requirement::department(["IT"], false).unwrap();
        let lenient = Requirement::department(["IT"], true).unwrap();

        let reasons = expect_failed(evaluate(&claims, &strict, noon_utc()));
        assert!(reasons[0].contains("no department assigned"));
        assert!(evaluate(&claims, &lenient, noon_utc()).is_satisfied());
    }

    #[test]
    fn department_comparison_is_case_insensitive() {
        let claims = ClaimSet::builder().subject("bob").department("it").build();
        let req = Requirement::department(["IT", "Engineering"], false).unwrap();
        assert!(evaluate(&claims, &req, noon_utc()).is_satisfied());
    }

    #[test]
    fn wrong_department_names_both_sides() {
        let claims = ClaimSet::builder().subject("bob").department("Sales").build();
        let req = Requirement::department(["IT"], false).unwrap();
        let reasons = expect_failed(evaluate(&claims, &req, noon_utc()));
        assert!(reasons[0].contains("Sales"));
        assert!(reasons[0].contains("IT"));
    }

    #[test]
    fn conditional_access_aggregates_every_violation() {
        let params = ConditionalAccessParams {
            require_mfa: true,
            allowed_departments: Some(["IT".to_string()].into_iter().collect()),
            ..ConditionalAccessParams::default()
        };
        let req = Requirement::conditional_access(params).unwrap();
        let claims = ClaimSet::builder().subject("bob").department("Sales").build();

        let reasons = expect_failed(evaluate(&claims, &req, noon_utc()));
        assert_eq!(reasons.len(), 2);
        assert!(reasons.iter().any(|r| r.contains("multi-factor")));
        assert!(reasons.iter().any(|r| r.contains("Sales")));
    }

    #[test]
    fn stale_token_is_rejected() {
        let now = noon_utc();
        let params = ConditionalAccessParams {
            max_token_age_seconds: Some(1800),
            ..ConditionalAccessParams::default()
        };
        let req = Requirement::conditional_access(params).unwrap();
        let claims = ClaimSet::builder()
            .subject("bob")
            .issued_at(now - Duration::seconds(3600))
            .build();

        let reasons = expect_failed(evaluate(&claims, &req, now));
        assert!(reasons[0].contains("token too old"));
        assert!(reasons[0].contains("3600"));
        assert!(reasons[0].contains("1800"));
    }

    #[test]
    fn missing_issued_at_cannot_determine_token_age() {
        let params = ConditionalAccessParams {
            max_token_age_seconds: Some(1800),
            ..ConditionalAccessParams::default()
        };
        let req = Requirement::conditional_access(params).unwrap();
        let reasons = expect_failed(evaluate(&reader(), &req, noon_utc()));
        assert!(reasons[0].contains("cannot determine token age"));
    }

    #[test]
    fn future_issued_at_is_called_out() {
        let now = noon_utc();
        let params = ConditionalAccessParams {
            max_token_age_seconds: Some(1800),
            ..ConditionalAccessParams::default()
        };
        let req = Requirement::conditional_access(params).unwrap();
        let claims = ClaimSet::builder()
            .subject("bob")
            .issued_at(now + Duration::seconds(60))
            .build();
        let reasons = expect_failed(evaluate(&claims, &req, now));
        assert!(reasons[0].contains("future"));
    }

    #[test]
    fn conditional_working_hours_uses_fixed_window() {
        let params = ConditionalAccessParams {
            require_working_hours: true,
            ..ConditionalAccessParams::default()
        };
        let req = Requirement::conditional_access(params).unwrap();

        assert!(evaluate(&reader(), &req, noon_utc()).is_satisfied());
        let reasons = expect_failed(evaluate(&reader(), &req, midnight_utc()));
        assert!(reasons[0].contains("08:00-18:00"));
    }

    #[test]
    fn minimum_security_level_is_enforced() {
        let params = ConditionalAccessParams {
            minimum_security_level: Some(SecurityLevel::High),
            ..ConditionalAccessParams::default()
        };
        let req = Requirement::conditional_access(params).unwrap();

        let manager = ClaimSet::builder().role("Manager").build();
        let reasons = expect_failed(evaluate(&manager, &req, noon_utc()));
        assert!(reasons[0].contains("Medium"));
        assert!(reasons[0].contains("High"));

        let admin = ClaimSet::builder().role("Admin").build();
        assert!(evaluate(&admin, &req, noon_utc()).is_satisfied());
    }

    #[test]
    fn evaluation_is_idempotent_for_a_fixed_instant() {
        let now = noon_utc();
        let params = ConditionalAccessParams {
            require_mfa: true,
            require_working_hours: true,
            ..ConditionalAccessParams::default()
        };
        let req = Requirement::conditional_access(params).unwrap();
        let claims = reader();

        let first = evaluate(&claims, &req, now);
        let second = evaluate(&claims, &req, now);
        assert_eq!(first, second);
    }

    fn permission_set(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-c]\\.[a-z]{1,6}", 1..=max)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: AllPermissions is satisfied iff the required names are a
        /// subset of the claim set's permissions.
        #[test]
        fn all_permissions_matches_subset_law(
            required in permission_set(6),
            held in permission_set(6),
        ) {
            let req: PolicyResult<Requirement> =
                Requirement::all_permissions(required.clone());
            let req = req.unwrap();
            let claims = ClaimSet::builder().subject("p").permissions(held.clone()).build();

            let expected = required.iter().all(|r| held.contains(r));
            prop_assert_eq!(evaluate(&claims, &req, noon_utc()).is_satisfied(), expected);
        }

        /// Property: AnyPermission is satisfied iff the intersection of the
        /// required names and the held permissions is non-empty.
        #[test]
        fn any_permission_matches_intersection_law(
            required in permission_set(6),
            held in permission_set(6),
        ) {
            let req = Requirement::any_permission(required.clone()).unwrap();
            let claims = ClaimSet::builder().subject("p").permissions(held.clone()).build();

            let expected = required.iter().any(|r| held.contains(r));
            prop_assert_eq!(evaluate(&claims, &req, noon_utc()).is_satisfied(), expected);
        }
    }
}
