//! Named policy registry.
//!
//! Applications typically build their policies once at startup, register
//! them by name, and resolve them at check time. Missing or duplicated
//! names are configuration errors raised during registration/resolution
//! setup, not at request time.

use std::collections::HashMap;

use warden_core::{PolicyError, PolicyResult};

use crate::policy::Policy;

/// Name → policy map, built at startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, Policy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy under a name. Re-registering a name is rejected.
    pub fn register(&mut self, name: impl Into<String>, policy: Policy) -> PolicyResult<()> {
        let name = name.into();
        if self.policies.contains_key(&name) {
            return Err(PolicyError::DuplicatePolicy(name));
        }
        self.policies.insert(name, policy);
        Ok(())
    }

    /// Resolve a policy by name, failing with `UnknownPolicy` if absent.
    pub fn resolve(&self, name: &str) -> PolicyResult<&Policy> {
        self.policies
            .get(name)
            .ok_or_else(|| PolicyError::UnknownPolicy(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Names of all registered policies (unordered).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}
