//! Read-only property access shared by nodes and relationships.

use super::{Node, Relationship, Value};

/// Anything that carries named properties: a node or a relationship.
///
/// Type collection only ever reads through this trait, so any entity
/// source can feed it without handing over ownership.
pub trait Entity {
    /// Iterate the property keys present on this entity.
    fn property_keys(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    /// Value stored under `key`, if present.
    fn property(&self, key: &str) -> Option<&Value>;
}

impl Entity for Node {
    fn property_keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.properties.keys().map(String::as_str))
    }

    fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl Entity for Relationship {
    fn property_keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.properties.keys().map(String::as_str))
    }

    fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
