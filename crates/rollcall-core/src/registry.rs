//! Known-identity registry: one reference descriptor per registered face,
//! kept in insertion order.

use crate::descriptor::Descriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier assigned when a face is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(Uuid);

impl IdentityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered face. Names are not unique: two entries may share a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownIdentity {
    pub id: IdentityId,
    pub name: String,
    pub descriptor: Descriptor,
}

/// Ordered, append-only collection of known identities.
///
/// Scan order is insertion order; the first-qualifying matcher depends on it.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    identities: Vec<KnownIdentity>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from a previously persisted sequence, preserving order.
    pub fn from_identities(identities: Vec<KnownIdentity>) -> Self {
        Self { identities }
    }

    /// Append a new identity. Duplicate names are accepted as distinct entries.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: Descriptor) -> IdentityId {
        let id = IdentityId::new();
        let name = name.into();
        tracing::debug!(%id, name = %name, total = self.identities.len() + 1, "identity registered");
        self.identities.push(KnownIdentity {
            id,
            name,
            descriptor,
        });
        id
    }

    /// Read-only view in insertion order.
    pub fn all(&self) -> &[KnownIdentity] {
        &self.identities
    }

    pub fn get(&self, id: IdentityId) -> Option<&KnownIdentity> {
        self.identities.iter().find(|identity| identity.id == id)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DESCRIPTOR_DIM;

    fn descriptor(value: f32) -> Descriptor {
        Descriptor::new(vec![value; DESCRIPTOR_DIM]).unwrap()
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut registry = IdentityRegistry::new();
        registry.insert("alice", descriptor(0.1));
        registry.insert("bob", descriptor(0.2));
        registry.insert("carol", descriptor(0.3));

        let names: Vec<&str> = registry.all().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[test]
    fn test_duplicate_names_are_distinct_entries() {
        let mut registry = IdentityRegistry::new();
        let first = registry.insert("sam", descriptor(0.1));
        let second = registry.insert("sam", descriptor(0.9));

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(first).unwrap().descriptor, descriptor(0.1));
        assert_eq!(registry.get(second).unwrap().descriptor, descriptor(0.9));
    }

    #[test]
    fn test_from_identities_keeps_ids() {
        let mut original = IdentityRegistry::new();
        let id = original.insert("dana", descriptor(0.4));

        let rebuilt = IdentityRegistry::from_identities(original.all().to_vec());
        assert_eq!(rebuilt.all(), original.all());
        assert!(rebuilt.get(id).is_some());
    }

    #[test]
    fn test_empty() {
        let registry = IdentityRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.all().is_empty());
    }
}
