//! Cache key generation and management
//!
//! Paginated and parameterized queries are keyed by a fingerprint: a SHA-256
//! over a length-prefixed, type-tagged encoding of the query parameters.
//! Separators inside parameter values can therefore never shift field
//! boundaries, and an absent cursor encodes differently from an empty one.

use sha2::{Digest, Sha256};
use std::fmt;

/// Width of the encoded cursor slot
const CURSOR_WIDTH: usize = 32;

/// A single normalized parameter of a cached query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart<'a> {
    Uint(u64),
    /// Expected lowercased
    Address(&'a str),
    Text(&'a str),
    Cursor(Option<&'a str>),
}

impl KeyPart<'_> {
    fn tag(&self) -> u8 {
        match self {
            KeyPart::Uint(_) => 1,
            KeyPart::Address(_) => 2,
            KeyPart::Text(_) => 3,
            KeyPart::Cursor(None) => 4,
            KeyPart::Cursor(Some(_)) => 5,
        }
    }

    fn encode_into(&self, hasher: &mut Sha256) {
        hasher.update([self.tag()]);
        match self {
            KeyPart::Uint(v) => hasher.update(v.to_be_bytes()),
            KeyPart::Address(s) | KeyPart::Text(s) => {
                hasher.update((s.len() as u32).to_be_bytes());
                hasher.update(s.as_bytes());
            }
            // Zero sentinel for "no cursor"
            KeyPart::Cursor(None) => hasher.update([0u8; CURSOR_WIDTH]),
            KeyPart::Cursor(Some(c)) => hasher.update(Sha256::digest(c.as_bytes())),
        }
    }
}

/// Derive a stable cache key for a query family and its parameters
pub fn fingerprint(scope: &str, parts: &[KeyPart<'_>]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((scope.len() as u32).to_be_bytes());
    hasher.update(scope.as_bytes());
    hasher.update((parts.len() as u32).to_be_bytes());
    for part in parts {
        part.encode_into(&mut hasher);
    }
    format!("fp:{}:{}", scope, hex::encode(hasher.finalize()))
}

/// What a page set groups pages for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Income,
    Users,
    Purchases,
    Favorites,
    OwnedProjects,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Income => "income",
            Purpose::Users => "users",
            Purpose::Purchases => "purchases",
            Purpose::Favorites => "favorites",
            Purpose::OwnedProjects => "owned-projects",
        }
    }
}

/// Identifies the family of cached pages derived from one resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub chain_id: u64,
    /// Project id or lowercased user address
    pub entity: String,
    pub purpose: Purpose,
}

impl ScopeKey {
    pub fn project(chain_id: u64, project_id: u64, purpose: Purpose) -> Self {
        Self {
            chain_id,
            entity: project_id.to_string(),
            purpose,
        }
    }

    pub fn user(chain_id: u64, user: &str, purpose: Purpose) -> Self {
        Self {
            chain_id,
            entity: user.to_lowercase(),
            purpose,
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pages:{}-{}-{}", self.chain_id, self.entity, self.purpose.as_str())
    }
}

/// Keys for single-entry (non paginated) cache values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Reconciled project detail view
    ProjectDetail { chain_id: u64, project_id: u64 },
    /// Last observed owner of a project, kept until overwritten
    ProjectOwner { chain_id: u64, project_id: u64 },
}

impl CacheKey {
    pub fn project_detail(chain_id: u64, project_id: u64) -> Self {
        Self::ProjectDetail { chain_id, project_id }
    }

    pub fn project_owner(chain_id: u64, project_id: u64) -> Self {
        Self::ProjectOwner { chain_id, project_id }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectDetail { chain_id, project_id } => {
                write!(f, "project:{}:{}", chain_id, project_id)
            }
            Self::ProjectOwner { chain_id, project_id } => {
                write!(f, "owner:{}:{}", chain_id, project_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let parts = [KeyPart::Uint(8453), KeyPart::Uint(42), KeyPart::Cursor(Some("abc"))];
        assert_eq!(fingerprint("project-income", &parts), fingerprint("project-income", &parts));
    }

    #[test]
    fn test_absent_and_empty_cursor_differ() {
        let absent = fingerprint("project-income", &[KeyPart::Uint(8453), KeyPart::Uint(42), KeyPart::Cursor(None)]);
        let empty = fingerprint("project-income", &[KeyPart::Uint(8453), KeyPart::Uint(42), KeyPart::Cursor(Some(""))]);
        assert_ne!(absent, empty);
    }

    #[test]
    fn test_separator_in_value_does_not_collide() {
        let a = fingerprint("s", &[KeyPart::Text("a:b"), KeyPart::Text("c")]);
        let b = fingerprint("s", &[KeyPart::Text("a"), KeyPart::Text("b:c")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_scope_and_type_are_part_of_key() {
        let a = fingerprint("project-income", &[KeyPart::Uint(1)]);
        let b = fingerprint("project-user", &[KeyPart::Uint(1)]);
        let c = fingerprint("project-income", &[KeyPart::Text("1")]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fingerprint_is_prefixed_with_scope() {
        let key = fingerprint("project-user", &[KeyPart::Uint(7)]);
        assert!(key.starts_with("fp:project-user:"));
        assert_eq!(key.len(), "fp:project-user:".len() + 64);
    }

    #[test]
    fn test_scope_key_display() {
        let scope = ScopeKey::project(8453, 42, Purpose::Income);
        assert_eq!(scope.to_string(), "pages:8453-42-income");

        let scope = ScopeKey::user(8453, "0xABC", Purpose::Favorites);
        assert_eq!(scope.to_string(), "pages:8453-0xabc-favorites");
    }

    #[test]
    fn test_cache_key_display() {
        assert_eq!(CacheKey::project_detail(8453, 42).to_string(), "project:8453:42");
        assert_eq!(CacheKey::project_owner(8453, 42).to_string(), "owner:8453:42");
    }
}
