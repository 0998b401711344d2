//! Request-scoped identity cache.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::row_key::RowKey;
use crate::schema::{Cardinality, Entity, MetaSchema};

/// A cached value: one entity or, for one-to-many slots, a list of them.
#[derive(Clone)]
pub enum Slot {
    /// A single entity.
    One(Arc<dyn Entity>),
    /// Entities sharing a one-to-many key, in insertion order.
    Many(Vec<Arc<dyn Entity>>),
}

impl Slot {
    /// Returns the single entity, if this is a singular slot.
    #[must_use]
    pub fn one(&self) -> Option<&Arc<dyn Entity>> {
        match self {
            Self::One(entity) => Some(entity),
            Self::Many(_) => None,
        }
    }

    /// Returns every entity in the slot.
    #[must_use]
    pub fn entities(&self) -> &[Arc<dyn Entity>] {
        match self {
            Self::One(entity) => std::slice::from_ref(entity),
            Self::Many(entities) => entities,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(entity) => write!(f, "{}", entity.entity_name()),
            Self::Many(entities) => write!(f, "[..] (len={})", entities.len()),
        }
    }
}

/// Identity map for one include traversal or unit of work.
///
/// Every entity is stored under its primary key and under each of its
/// reference keys, tagged with the reference's cardinality: one-to-many
/// keys accumulate entities, many-to-one keys keep the latest one.
pub struct ScopeCache {
    meta: Arc<MetaSchema>,
    data: RwLock<HashMap<String, Slot>>,
}

impl ScopeCache {
    /// Creates an empty cache over `meta`.
    #[must_use]
    pub fn new(meta: Arc<MetaSchema>) -> Self {
        Self {
            meta,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the schema the cache derives keys from.
    #[must_use]
    pub fn meta(&self) -> &Arc<MetaSchema> {
        &self.meta
    }

    /// Returns the slot stored for `row_key` under `cardinality`.
    #[must_use]
    pub fn get_object(&self, cardinality: Cardinality, row_key: &RowKey) -> Option<Slot> {
        let key = cardinality.cache_key(&row_key.key_string());
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Returns true if a slot is stored for `row_key` under `cardinality`.
    #[must_use]
    pub fn has_object(&self, cardinality: Cardinality, row_key: &RowKey) -> bool {
        let key = cardinality.cache_key(&row_key.key_string());
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
    }

    /// Stores `entity` under its primary key and every reference key.
    ///
    /// # Panics
    ///
    /// Panics if the entity's type is not registered with the schema.
    pub fn add_object(&self, entity: Arc<dyn Entity>) {
        let (primary, refes) = self.meta.row_keys_of(entity.as_ref());
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);

        let key = Cardinality::Singular.cache_key(&primary.key_string());
        trace!(key = %key, "caching entity");
        data.insert(key, Slot::One(Arc::clone(&entity)));

        for (cardinality, refe) in refes {
            let key = cardinality.cache_key(&refe.key_string());
            match cardinality {
                Cardinality::OneToMany => match data.get_mut(&key) {
                    Some(Slot::Many(entities)) => entities.push(Arc::clone(&entity)),
                    _ => {
                        data.insert(key, Slot::Many(vec![Arc::clone(&entity)]));
                    }
                },
                Cardinality::ManyToOne | Cardinality::Singular => {
                    data.insert(key, Slot::One(Arc::clone(&entity)));
                }
            }
        }
    }

    /// Removes every slot keyed by `entity`'s primary or reference keys, under
    /// every cardinality.
    ///
    /// # Panics
    ///
    /// Panics if the entity's type is not registered with the schema.
    pub fn remove_object(&self, entity: &dyn Entity) {
        let (primary, refes) = self.meta.row_keys_of(entity);
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);

        let keys = refes
            .into_iter()
            .map(|(_, refe)| refe)
            .chain(std::iter::once(primary));
        for row_key in keys {
            let key = row_key.key_string();
            for cardinality in Cardinality::ALL {
                data.remove(&cardinality.cache_key(&key));
            }
        }
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes every slot, sorted by key, for debugging.
    ///
    /// # Errors
    ///
    /// Returns any error raised by `w`.
    pub fn dump<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<&String> = data.keys().collect();
        keys.sort();

        writeln!(w, "> --- ScopeCache begin ---")?;
        for (i, key) in keys.into_iter().enumerate() {
            writeln!(w, "> {i:03} | {key} = {:?}", data[key])?;
        }
        writeln!(w, "> --- ScopeCache end ---")
    }
}

impl fmt::Debug for ScopeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeCache")
            .field("slots", &self.len())
            .finish_non_exhaustive()
    }
}
