//! Entity schema description.
//!
//! Entities describe themselves through [`Entity::descriptor`], usually
//! generated by `#[derive(Entity)]`. A [`MetaSchema`] turns the registered
//! descriptors into [`MetaTable`]s once and answers every later question
//! about columns, primary keys and reference keys from that snapshot.

mod meta;
mod relation;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

pub use meta::{MetaColumn, MetaSchema, MetaTable, ReferenceKey};
pub use relation::{BelongsTo, HasMany, Relation};

use crate::builder::SqlValue;

/// How a cache slot or relation relates rows to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cardinality {
    /// A row identified by its own primary key.
    Singular,
    /// A growing list of rows sharing a foreign key value.
    OneToMany,
    /// A single row referenced by a foreign key value.
    ManyToOne,
}

impl Cardinality {
    /// Every cardinality, in cache-key order.
    pub const ALL: [Self; 3] = [Self::Singular, Self::OneToMany, Self::ManyToOne];

    /// Tags a row-key string so that slots of different cardinalities never
    /// collide.
    #[must_use]
    pub fn cache_key(self, key: &str) -> String {
        match self {
            Self::Singular => key.to_string(),
            Self::OneToMany => format!("{key}#cardinality=OneToMany"),
            Self::ManyToOne => format!("{key}#cardinality=ManyToOne"),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Singular => "Singular",
            Self::OneToMany => "OneToMany",
            Self::ManyToOne => "ManyToOne",
        })
    }
}

/// Upcasting to [`Any`], implemented for every sized entity.
pub trait AsAny: Any + Send + Sync {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared entity into a shared `Any`.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A type mapped to a table.
///
/// Usually derived:
///
/// ```rust
/// use sqlpatch_core::schema::{BelongsTo, Entity};
/// use sqlpatch_derive::Entity;
///
/// #[derive(Entity)]
/// #[entity(table = "posts")]
/// struct Post {
///     #[column(primary_key)]
///     id: i64,
///     blog_id: i64,
///     #[column(omit_empty)]
///     title: String,
///     #[relation(foreign_key = "blog_id:id")]
///     blog: BelongsTo<Blog>,
/// }
///
/// #[derive(Entity)]
/// struct Blog {
///     #[column(primary_key)]
///     id: i64,
/// }
///
/// let desc = Post::descriptor();
/// assert_eq!(desc.table_name, "posts");
/// assert_eq!(desc.fields.len(), 3);
/// assert_eq!(desc.relations.len(), 1);
/// ```
pub trait Entity: AsAny {
    /// Describes the table this type is mapped to.
    fn descriptor() -> EntityDescriptor
    where
        Self: Sized;

    /// Returns the current value of `column`, or `None` if this type has no
    /// such column.
    fn column_value(&self, column: &str) -> Option<SqlValue>;

    /// Returns the Rust type name, for diagnostics.
    fn entity_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn Entity {
    /// Returns true if the entity is a `T`.
    #[must_use]
    pub fn is<T: Entity>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcasts to a concrete entity type.
    #[must_use]
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Downcasts a shared entity to a concrete type.
#[must_use]
pub fn downcast_arc<T: Entity>(entity: Arc<dyn Entity>) -> Option<Arc<T>> {
    AsAny::into_any(entity).downcast::<T>().ok()
}

/// Static description of an entity type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// The entity type.
    pub type_id: TypeId,
    /// Rust type name, for diagnostics.
    pub type_name: &'static str,
    /// SQL table name.
    pub table_name: &'static str,
    /// Mapped columns in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Relationship fields.
    pub relations: Vec<RelationDescriptor>,
}

impl EntityDescriptor {
    /// Starts a descriptor for `T`.
    #[must_use]
    pub fn of<T: Entity>(table_name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            table_name,
            fields: vec![],
            relations: vec![],
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a relationship.
    #[must_use]
    pub fn relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }
}

/// A mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust field name.
    pub field_name: &'static str,
    /// SQL column name.
    pub column_name: &'static str,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Whether a zero value is left out of inserts and updates.
    pub omit_empty: bool,
}

impl FieldDescriptor {
    /// A plain column.
    #[must_use]
    pub const fn new(field_name: &'static str, column_name: &'static str) -> Self {
        Self {
            field_name,
            column_name,
            primary_key: false,
            omit_empty: false,
        }
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Leaves the column out of writes while it holds a zero value.
    #[must_use]
    pub const fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }
}

/// A relationship field pointing at another entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Rust field name.
    pub field_name: &'static str,
    /// The related entity type.
    pub target: TypeId,
    /// Rust name of the related type.
    pub target_name: &'static str,
    /// One-to-many for collections, many-to-one for single references.
    pub cardinality: Cardinality,
    /// Column pairing between this table and the target table.
    pub foreign_key: ForeignKeySpec,
}

impl RelationDescriptor {
    /// Describes a relation field of type `R`.
    #[must_use]
    pub fn of<R: Relation>(field_name: &'static str, foreign_key: &str) -> Self {
        Self {
            field_name,
            target: TypeId::of::<R::Target>(),
            target_name: std::any::type_name::<R::Target>(),
            cardinality: R::CARDINALITY,
            foreign_key: ForeignKeySpec::parse(foreign_key),
        }
    }
}

/// A pair of columns joined by a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Column on the declaring table.
    pub parent: String,
    /// Column on the target table.
    pub child: String,
}

/// Parsed `foreign_key` declaration: `parent[:child],...`.
///
/// When `child` is omitted it equals `parent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignKeySpec {
    pairs: Vec<KeyPair>,
}

impl ForeignKeySpec {
    /// Parses a declaration. Blank entries are skipped.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let pairs = spec
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (parent, child) = entry.split_once(':').unwrap_or((entry, entry));
                KeyPair {
                    parent: parent.trim().to_string(),
                    child: child.trim().to_string(),
                }
            })
            .collect();
        Self { pairs }
    }

    /// The column pairs, in declaration order.
    #[must_use]
    pub fn pairs(&self) -> &[KeyPair] {
        &self.pairs
    }

    /// Columns on the declaring table.
    pub fn parent_keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|pair| pair.parent.as_str())
    }

    /// Columns on the target table.
    pub fn child_keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|pair| pair.child.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_tagged_per_cardinality() {
        assert_eq!(Cardinality::Singular.cache_key("t;id=1"), "t;id=1");
        assert_eq!(
            Cardinality::OneToMany.cache_key("t;id=1"),
            "t;id=1#cardinality=OneToMany"
        );
        assert_eq!(
            Cardinality::ManyToOne.cache_key("t;id=1"),
            "t;id=1#cardinality=ManyToOne"
        );
    }

    #[test]
    fn test_foreign_key_spec() {
        let spec = ForeignKeySpec::parse("blog_id:id, tenant");
        let parents: Vec<_> = spec.parent_keys().collect();
        let children: Vec<_> = spec.child_keys().collect();
        assert_eq!(parents, vec!["blog_id", "tenant"]);
        assert_eq!(children, vec!["id", "tenant"]);

        assert!(ForeignKeySpec::parse(" , ").pairs().is_empty());
    }
}
