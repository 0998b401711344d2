//! Relationship fields.
//!
//! Entities are shared as `Arc`s once loaded, so association loaders wire
//! relationships through interior mutability.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::{Cardinality, Entity};

/// A relationship field type.
pub trait Relation {
    /// The related entity type.
    type Target: Entity;

    /// How many targets the field holds.
    const CARDINALITY: Cardinality;
}

/// A one-to-many relationship: the related rows carry this row's key.
pub struct HasMany<T> {
    items: RwLock<Vec<Arc<T>>>,
}

impl<T: Entity> Relation for HasMany<T> {
    type Target = T;
    const CARDINALITY: Cardinality = Cardinality::OneToMany;
}

impl<T> HasMany<T> {
    /// Creates an empty relation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Returns the related rows.
    #[must_use]
    pub fn get(&self) -> Vec<Arc<T>> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the related rows.
    pub fn set(&self, items: Vec<Arc<T>>) {
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items;
    }

    /// Appends a related row.
    pub fn push(&self, item: Arc<T>) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }

    /// Returns the number of related rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when no row is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HasMany<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for HasMany<T> {
    fn clone(&self) -> Self {
        Self {
            items: RwLock::new(
                self.items
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone(),
            ),
        }
    }
}

impl<T> fmt::Debug for HasMany<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasMany")
            .field("len", &self.len())
            .finish()
    }
}

/// A many-to-one relationship: this row carries the related row's key.
pub struct BelongsTo<T> {
    item: RwLock<Option<Arc<T>>>,
}

impl<T: Entity> Relation for BelongsTo<T> {
    type Target = T;
    const CARDINALITY: Cardinality = Cardinality::ManyToOne;
}

impl<T> BelongsTo<T> {
    /// Creates an unset relation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            item: RwLock::new(None),
        }
    }

    /// Returns the related row, if attached.
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.item
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Attaches the related row.
    pub fn set(&self, item: Arc<T>) {
        *self.item.write().unwrap_or_else(PoisonError::into_inner) = Some(item);
    }

    /// Detaches the related row.
    pub fn clear(&self) {
        *self.item.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns true when a row is attached.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.item
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl<T> Default for BelongsTo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BelongsTo<T> {
    fn clone(&self) -> Self {
        Self {
            item: RwLock::new(self.get()),
        }
    }
}

impl<T> fmt::Debug for BelongsTo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BelongsTo")
            .field("set", &self.is_set())
            .finish()
    }
}
