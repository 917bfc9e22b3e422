//! Ordered dependency maps.
//!
//! `package.json` dependency objects are maps, but the walker visits them in
//! declaration order so logs and reports are reproducible. `serde_json`'s
//! default map sorts keys, so the list is deserialized by hand.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Dependency name → version constraint, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList(Vec<(String, String)>);

impl DependencyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dependency. A repeated name replaces the earlier constraint
    /// but keeps its original position.
    pub fn push(&mut self, name: impl Into<String>, constraint: impl Into<String>) {
        let name = name.into();
        let constraint = constraint.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = constraint,
            None => self.0.push((name, constraint)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, C: Into<String>> FromIterator<(N, C)> for DependencyList {
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (name, constraint) in iter {
            list.push(name, constraint);
        }
        list
    }
}

impl Serialize for DependencyList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, constraint) in &self.0 {
            map.serialize_entry(name, constraint)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DependencyList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListVisitor;

        impl<'de> Visitor<'de> for ListVisitor {
            type Value = DependencyList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of dependency names to version constraints")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut list = DependencyList::new();
                while let Some((name, constraint)) = access.next_entry::<String, String>()? {
                    list.push(name, constraint);
                }
                Ok(list)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(DependencyList::new())
            }
        }

        deserializer.deserialize_any(ListVisitor)
    }
}
