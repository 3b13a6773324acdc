//! Authorization service.

use serde::{Deserialize, Serialize};

use warden_core::{ClaimSet, Clock, SystemClock};

use crate::evaluate::{evaluate, RequirementOutcome};
use crate::policy::Policy;

/// Outcome of evaluating a policy against a claim set.
///
/// `Unauthenticated` is distinct from `Failed`: the former means no
/// principal was presented at all (HTTP 401 at the edge), the latter means
/// an authenticated principal did not meet the policy (HTTP 403). Reasons
/// are informational text for operators and audit logs, not codes for
/// programmatic branching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Satisfied,
    Unauthenticated,
    Failed { reasons: Vec<String> },
}

impl Verdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            Self::Failed { reasons } => reasons,
            _ => &[],
        }
    }

    /// The HTTP status an edge layer maps this verdict to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Satisfied => 200,
            Self::Unauthenticated => 401,
            Self::Failed { .. } => 403,
        }
    }
}

/// Evaluates policies against claim sets.
///
/// Holds no mutable state; `authorize` is a pure synchronous computation and
/// is safe to call concurrently. The clock is injected so time-based
/// requirements are deterministic under test.
#[derive(Debug, Clone)]
pub struct Authorizer<C: Clock = SystemClock> {
    clock: C,
}

impl Authorizer<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for Authorizer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Authorizer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Evaluate every requirement of `policy` against `claims`.
    ///
    /// Requirements are evaluated in declaration order against the same
    /// claim set and the same instant; all failure reasons are aggregated
    /// rather than stopping at the first, so a denied caller sees the
    /// complete picture.
    pub fn authorize(&self, claims: &ClaimSet, policy: &Policy) -> Verdict {
        let policy_name = policy.name().unwrap_or("<anonymous>");

        if claims.is_anonymous() {
            tracing::debug!(policy = policy_name, "rejecting anonymous claim set");
            return Verdict::Unauthenticated;
        }

        let now = self.clock.now();
        let mut reasons = Vec::new();
        for requirement in policy.requirements() {
            if let RequirementOutcome::Failed(mut failed) = evaluate(claims, requirement, now) {
                reasons.append(&mut failed);
            }
        }

        if reasons.is_empty() {
            tracing::debug!(
                policy = policy_name,
                subject = claims.subject().unwrap_or("<none>"),
                "authorization granted"
            );
            Verdict::Satisfied
        } else {
            tracing::warn!(
                policy = policy_name,
                subject = claims.subject().unwrap_or("<none>"),
                reasons = ?reasons,
                "authorization denied"
            );
            Verdict::Failed { reasons }
        }
    }
}
