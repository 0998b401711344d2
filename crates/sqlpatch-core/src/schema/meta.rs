//! Computed table metadata.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, warn};

use super::{Cardinality, Entity, EntityDescriptor, FieldDescriptor};
use crate::builder::SqlValue;
use crate::patch::Patch;
use crate::row_key::RowKey;

/// A mapped column of a [`MetaTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaColumn {
    /// Rust field name.
    pub field_name: &'static str,
    /// SQL column name.
    pub column_name: &'static str,
    /// Whether a zero value is left out of inserts and updates.
    pub omit_empty: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

impl From<&FieldDescriptor> for MetaColumn {
    fn from(field: &FieldDescriptor) -> Self {
        Self {
            field_name: field.field_name,
            column_name: field.column_name,
            omit_empty: field.omit_empty,
            primary_key: field.primary_key,
        }
    }
}

/// Columns of a table that some relationship filters by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceKey {
    /// Cardinality of the relationship that uses these columns.
    pub cardinality: Cardinality,
    /// The columns, in foreign-key declaration order.
    pub columns: Vec<MetaColumn>,
}

/// Everything known about one entity type's table.
#[derive(Debug, Clone)]
pub struct MetaTable {
    /// The entity type.
    pub type_id: TypeId,
    /// Rust type name.
    pub type_name: &'static str,
    /// SQL table name.
    pub table_name: &'static str,
    /// Primary-key columns, in declaration order.
    pub primary_key: Vec<MetaColumn>,
    /// All mapped columns, in declaration order.
    pub columns: Vec<MetaColumn>,
    /// Column groups other entities (or this one) use to find rows of this
    /// table.
    pub reference_keys: Vec<ReferenceKey>,
}

impl MetaTable {
    fn value_of(&self, entity: &dyn Entity, column: &MetaColumn) -> SqlValue {
        entity.column_value(column.column_name).unwrap_or_else(|| {
            panic!(
                "sqlpatch: {} reports no value for column {}",
                self.type_name, column.column_name
            )
        })
    }

    fn row_key_of<'c>(
        &self,
        entity: &dyn Entity,
        columns: impl IntoIterator<Item = &'c MetaColumn>,
    ) -> RowKey {
        let mut key = RowKey::new(self.table_name);
        for column in columns {
            key.insert(column.column_name, self.value_of(entity, column));
        }
        key
    }

    /// Columns and values written for `entity`, skipping omitted zero
    /// values and, when `skip_primary_key` is set, the primary key.
    fn payload_of(
        &self,
        entity: &dyn Entity,
        skip_primary_key: bool,
    ) -> (Vec<String>, Vec<SqlValue>) {
        self.columns
            .iter()
            .filter(|column| !(skip_primary_key && column.primary_key))
            .filter_map(|column| {
                let value = self.value_of(entity, column);
                if column.omit_empty && value.is_zero() {
                    None
                } else {
                    Some((column.column_name.to_string(), value))
                }
            })
            .unzip()
    }
}

/// Registry of entity types and their computed [`MetaTable`]s.
///
/// Types are registered first; the first lookup computes every table at
/// once and later registrations panic.
pub struct MetaSchema {
    pending: Mutex<Option<Vec<EntityDescriptor>>>,
    built: OnceLock<HashMap<TypeId, Arc<MetaTable>>>,
}

impl MetaSchema {
    /// Creates an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Some(Vec::new())),
            built: OnceLock::new(),
        }
    }

    /// Registers an entity type.
    ///
    /// # Panics
    ///
    /// Panics if the tables were already computed.
    pub fn register<T: Entity>(&self) {
        self.register_descriptor(T::descriptor());
    }

    /// Registers an entity type by its descriptor. Registering the same type
    /// twice is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the tables were already computed.
    pub fn register_descriptor(&self, descriptor: EntityDescriptor) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(pending) = pending.as_mut() else {
            panic!(
                "sqlpatch: already computed meta tables, cannot register {}",
                descriptor.type_name
            );
        };
        if pending.iter().all(|d| d.type_id != descriptor.type_id) {
            pending.push(descriptor);
        }
    }

    /// Computes the tables of every registered type. Later calls are no-ops.
    pub fn compute(&self) {
        self.tables();
    }

    fn tables(&self) -> &HashMap<TypeId, Arc<MetaTable>> {
        self.built.get_or_init(|| {
            let descriptors = self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .unwrap_or_default();
            let tables: HashMap<_, _> = descriptors
                .iter()
                .map(|descriptor| {
                    let table = compute_table(descriptor, &descriptors);
                    (descriptor.type_id, Arc::new(table))
                })
                .collect();
            debug!(tables = tables.len(), "computed meta tables");
            tables
        })
    }

    /// Returns the table of a type, if registered.
    #[must_use]
    pub fn get(&self, type_id: TypeId) -> Option<Arc<MetaTable>> {
        self.tables().get(&type_id).cloned()
    }

    /// Returns the table of `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    #[must_use]
    pub fn table_of<T: Entity>(&self) -> Arc<MetaTable> {
        self.get(TypeId::of::<T>()).unwrap_or_else(|| {
            panic!(
                "sqlpatch: not registered type of {}",
                std::any::type_name::<T>()
            )
        })
    }

    /// Returns the table of `entity`'s type.
    ///
    /// # Panics
    ///
    /// Panics if the type was never registered.
    #[must_use]
    pub fn load_of(&self, entity: &dyn Entity) -> Arc<MetaTable> {
        self.get(entity.as_any().type_id()).unwrap_or_else(|| {
            panic!("sqlpatch: not registered type of {}", entity.entity_name())
        })
    }

    /// Derives the patch inserting `entity`.
    #[must_use]
    pub fn insert_patch_of(&self, entity: &dyn Entity) -> Patch {
        let table = self.load_of(entity);
        let (columns, values) = table.payload_of(entity, false);
        Patch::insert(table.table_name, columns, values)
    }

    /// Derives the patch updating `entity`'s row by primary key.
    #[must_use]
    pub fn update_patch_of(&self, entity: &dyn Entity) -> Patch {
        let table = self.load_of(entity);
        let (columns, values) = table.payload_of(entity, true);
        let key = table.row_key_of(entity, &table.primary_key);
        Patch::update(table.table_name, Some(key), columns, values)
    }

    /// Derives the patch deleting `entity`'s row by primary key.
    #[must_use]
    pub fn delete_patch_of(&self, entity: &dyn Entity) -> Patch {
        let table = self.load_of(entity);
        let key = table.row_key_of(entity, &table.primary_key);
        Patch::delete(table.table_name, Some(key))
    }

    /// Returns `entity`'s primary row key.
    #[must_use]
    pub fn primary_key_of(&self, entity: &dyn Entity) -> RowKey {
        let table = self.load_of(entity);
        table.row_key_of(entity, &table.primary_key)
    }

    /// Returns `entity`'s reference row keys, tagged with the cardinality of
    /// the relationship that uses each one.
    #[must_use]
    pub fn reference_keys_of(&self, entity: &dyn Entity) -> Vec<(Cardinality, RowKey)> {
        let table = self.load_of(entity);
        table
            .reference_keys
            .iter()
            .map(|refe| (refe.cardinality, table.row_key_of(entity, &refe.columns)))
            .collect()
    }

    /// Returns the primary row key and every reference row key of `entity`.
    #[must_use]
    pub fn row_keys_of(&self, entity: &dyn Entity) -> (RowKey, Vec<(Cardinality, RowKey)>) {
        (self.primary_key_of(entity), self.reference_keys_of(entity))
    }
}

impl Default for MetaSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MetaSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaSchema")
            .field("computed", &self.built.get().map(HashMap::len))
            .finish_non_exhaustive()
    }
}

fn compute_table(descriptor: &EntityDescriptor, registered: &[EntityDescriptor]) -> MetaTable {
    let columns: Vec<MetaColumn> = descriptor.fields.iter().map(MetaColumn::from).collect();
    let primary_key = columns.iter().filter(|c| c.primary_key).cloned().collect();
    let reference_keys = reference_keys_of(descriptor, &columns, registered);

    MetaTable {
        type_id: descriptor.type_id,
        type_name: descriptor.type_name,
        table_name: descriptor.table_name,
        primary_key,
        columns,
        reference_keys,
    }
}

/// Collects the column groups that relationships targeting `descriptor`
/// filter by, including relationships declared on `descriptor` itself.
fn reference_keys_of(
    descriptor: &EntityDescriptor,
    columns: &[MetaColumn],
    registered: &[EntityDescriptor],
) -> Vec<ReferenceKey> {
    let mut keys: Vec<ReferenceKey> = vec![];
    let relations = registered
        .iter()
        .flat_map(|owner| owner.relations.iter().map(move |rel| (owner, rel)))
        .filter(|(_, rel)| rel.target == descriptor.type_id);

    for (owner, rel) in relations {
        let mut key_columns = vec![];
        for child in rel.foreign_key.child_keys() {
            match columns.iter().find(|c| c.column_name == child) {
                Some(column) => key_columns.push(column.clone()),
                None => warn!(
                    owner = owner.type_name,
                    field = rel.field_name,
                    column = child,
                    table = descriptor.table_name,
                    "foreign key refers to an unknown column"
                ),
            }
        }
        if key_columns.is_empty() {
            continue;
        }
        let key = ReferenceKey {
            cardinality: rel.cardinality,
            columns: key_columns,
        };
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
