//! `warden-core` — pure domain primitives for the authorization engine.
//!
//! This crate is intentionally decoupled from HTTP, token handling and storage:
//! it models the *facts* authorization decisions are made from (claims, roles,
//! permissions) and the shared error/clock abstractions. No I/O lives here.

pub mod claims;
pub mod clock;
pub mod error;
pub mod permission;
pub mod role;
pub mod security;

pub use claims::{ClaimSet, ClaimSetBuilder};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{PolicyError, PolicyResult};
pub use permission::Permission;
pub use role::Role;
pub use security::SecurityLevel;
