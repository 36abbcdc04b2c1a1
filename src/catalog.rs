//! Named entities and the ordered catalog that feeds clustering.
//!
//! An [`Entity`] is an identifier plus the set of sub-entities it references
//! (for procedures: the fields it touches and the methods it invokes). The
//! [`EntityCatalog`] fixes an order over entities; that order is the index
//! space of the distance matrix and the basis of the merge tie-break, so it is
//! always insertion order.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::{Error, Result};

/// A named entity and the identifiers it references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    id: String,
    references: BTreeSet<String>,
}

impl Entity {
    /// Create an entity from an identifier and any collection of references.
    ///
    /// Duplicate references collapse; empty strings are kept verbatim, callers
    /// that ingest raw text are expected to drop them first.
    pub fn new<I, S>(id: impl Into<String>, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            references: references.into_iter().map(Into::into).collect(),
        }
    }

    /// The entity identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The referenced identifiers.
    pub fn references(&self) -> &BTreeSet<String> {
        &self.references
    }
}

/// Insertion-ordered collection of entities with unique identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityCatalog {
    entities: Vec<Entity>,
    ids: HashSet<String>,
}

impl EntityCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity, rejecting a repeated identifier.
    pub fn push(&mut self, entity: Entity) -> Result<()> {
        if !self.ids.insert(entity.id.clone()) {
            return Err(Error::DuplicateEntity(entity.id));
        }
        self.entities.push(entity);
        Ok(())
    }

    /// Build a catalog from entities in order.
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Result<Self> {
        let mut catalog = Self::new();
        for entity in entities {
            catalog.push(entity)?;
        }
        Ok(catalog)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the catalog holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity at a catalog index.
    pub fn get(&self, idx: usize) -> Option<&Entity> {
        self.entities.get(idx)
    }

    /// All entities in catalog order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Identifiers in catalog order.
    pub fn identifiers(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.id.clone()).collect()
    }

    /// Iterate over entities in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }
}

impl<'a> IntoIterator for &'a EntityCatalog {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One line per entity: `id: ref, ref, ...`, or `id: (none)` for an empty set.
impl fmt::Display for EntityCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entity in &self.entities {
            write!(f, "{}:", entity.id)?;
            if entity.references.is_empty() {
                write!(f, " (none)")?;
            }
            for (k, reference) in entity.references.iter().enumerate() {
                let sep = if k == 0 { " " } else { ", " };
                write!(f, "{sep}{reference}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_keeps_insertion_order() {
        let catalog = EntityCatalog::from_entities([
            Entity::new("b", ["x"]),
            Entity::new("a", ["y"]),
            Entity::new("c", Vec::<String>::new()),
        ])
        .unwrap();

        assert_eq!(catalog.identifiers(), vec!["b", "a", "c"]);
        assert_eq!(catalog.get(1).unwrap().id(), "a");
        assert!(catalog.get(2).unwrap().references().is_empty());
    }

    #[test]
    fn test_catalog_rejects_duplicate_identifier() {
        let mut catalog = EntityCatalog::new();
        catalog.push(Entity::new("p", ["a"])).unwrap();
        let err = catalog.push(Entity::new("p", ["b"])).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntity(ref id) if id == "p"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_entity_references_collapse_duplicates() {
        let e = Entity::new("p", ["a", "b", "a"]);
        assert_eq!(e.references().len(), 2);
    }

    #[test]
    fn test_display_lists_entity_sets() {
        let catalog = EntityCatalog::from_entities([
            Entity::new("p2", ["b", "a"]),
            Entity::new("p1", Vec::<String>::new()),
        ])
        .unwrap();
        assert_eq!(catalog.to_string(), "p2: a, b\np1: (none)\n");
    }
}
