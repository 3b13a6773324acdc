//! `warden-policy` — declarative access-control policy engine.
//!
//! A [`Policy`] is an ordered set of [`Requirement`]s, all of which must hold
//! for a [`warden_core::ClaimSet`]. The [`Authorizer`] evaluates a policy
//! against a claim set and returns a [`Verdict`] carrying every failure
//! reason, in requirement declaration order.
//!
//! Key properties:
//!
//! 1. **Closed requirement set**: requirements are a tagged enum, so adding a
//!    kind forces every match site to handle it.
//!
//! 2. **Fail-fast construction**: malformed requirements (empty sets, unknown
//!    timezones, inverted windows) are rejected when the policy is built,
//!    never at request time.
//!
//! 3. **Pure evaluation**: no I/O, no shared state; "now" comes from an
//!    injected [`warden_core::Clock`].

pub mod authorize;
pub mod evaluate;
pub mod policy;
pub mod registry;
pub mod requirement;

pub use authorize::{Authorizer, Verdict};
pub use evaluate::{evaluate, RequirementOutcome};
pub use policy::{Policy, PolicyBuilder};
pub use registry::PolicyRegistry;
pub use requirement::{ConditionalAccessParams, Requirement};
