//! The schema registry entry for one entity.
//!
//! [`Schema::build`] runs an entity's [`Entity::configure`] hook, reconciles
//! the declarative overrides against the derived field layout and resolves
//! every relationship descriptor, filling in conventional defaults for
//! whatever the entity left unset. The resulting [`Schema`] is immutable and
//! shared behind an `Arc` for the life of the connection.

use std::collections::HashMap;

use heck::ToSnakeCase;

use crate::configurator::{DeferredRelation, Entity, EntityConfigurator, FieldOverride};
use crate::dialect::Dialect;
use crate::error::{LoamError, Result};
use crate::model::{Model, Slots};
use crate::value::Value;

/// One-to-many: the configured entity's primary key appears as a foreign
/// key on the property table.
#[derive(Debug, Clone, Default)]
pub struct HasManyConfig {
    /// Target table. Defaults to the property entity's table.
    pub property_table: String,
    /// Foreign key column on the property table. Defaults to the singular
    /// of the configured entity's table plus `_id`.
    pub property_foreign_key: String,
}

/// One-to-one, owned by the configured entity. Same shape as
/// [`HasManyConfig`] with an implicit row limit of one.
#[derive(Debug, Clone, Default)]
pub struct HasOneConfig {
    pub property_table: String,
    pub property_foreign_key: String,
}

/// Inverse side: the configured entity carries the foreign key.
#[derive(Debug, Clone, Default)]
pub struct BelongsToConfig {
    /// Owner's table. Defaults to the owner entity's table.
    pub owner_table: String,
    /// Foreign key column on the configured entity. Defaults to the
    /// singular of the owner's table plus `_id`.
    pub local_foreign_key: String,
    /// Column on the owner the foreign key points at. Defaults to `id`.
    pub foreign_column_name: String,
}

/// Many-to-many through an intermediate table.
#[derive(Debug, Clone, Default)]
pub struct BelongsToManyConfig {
    /// The join table. No derivable default; always required.
    pub intermediate_table: String,
    /// Column on the join table pointing at the configured entity.
    /// Defaults to the singular of its table plus `_id`.
    pub intermediate_local_column: String,
    /// Column on the join table pointing at the target entity. Defaults to
    /// the singular of the target's table plus `_id`.
    pub intermediate_foreign_column: String,
    /// Target table. Defaults to the target entity's table.
    pub foreign_table: String,
    /// Column on the target matched against the join table. Defaults to
    /// the target's primary key column.
    pub foreign_lookup_column: String,
}

/// A fully resolved relationship, keyed in the schema by its target table.
#[derive(Debug, Clone)]
pub enum Relation {
    HasMany(HasManyConfig),
    HasOne(HasOneConfig),
    BelongsTo(BelongsToConfig),
    BelongsToMany(BelongsToManyConfig),
}

/// Field metadata after configurator overrides were applied.
#[derive(Debug, Clone)]
pub struct FieldMetadata {
    pub ident: &'static str,
    pub column: String,
    pub primary_key: bool,
    pub is_virtual: bool,
    pub type_name: &'static str,
}

/// The minimal identity of an entity, resolved by [`probe`] without
/// touching its relationships. Used when one entity's configuration needs
/// another entity's table or primary key.
#[derive(Debug, Clone)]
pub struct EntityRef {
    pub table: String,
    pub connection: Option<String>,
    pub pk_column: String,
}

/// Everything the runtime knows about one registered entity.
#[derive(Debug)]
pub struct Schema {
    pub table: String,
    /// Connection name; stamped during `initialize` when the entity did not
    /// name one itself.
    pub connection: String,
    pub dialect: &'static Dialect,
    pub fields: Vec<FieldMetadata>,
    relations: HashMap<String, Relation>,
}

fn singular(table: &str) -> String {
    pluralizer::pluralize(table, 1, false)
}

fn default_table<E>() -> String {
    let name = std::any::type_name::<E>()
        .rsplit("::")
        .next()
        .unwrap_or_default();
    pluralizer::pluralize(&name.to_snake_case(), 2, false)
}

fn foreign_key_for(table: &str) -> String {
    format!("{}_id", singular(table))
}

fn resolve_fields<E: Model>(overrides: &[FieldOverride]) -> Result<Vec<FieldMetadata>> {
    let mut specs = Vec::new();
    E::fields(&mut specs);

    let mut fields: Vec<FieldMetadata> = specs
        .iter()
        .map(|spec| FieldMetadata {
            ident: spec.ident,
            column: spec.column.to_string(),
            primary_key: spec.primary_key,
            is_virtual: spec.is_virtual,
            type_name: spec.type_name,
        })
        .collect();

    for over in overrides {
        let idx = fields
            .iter()
            .position(|f| f.ident == over.ident)
            .ok_or_else(|| {
                LoamError::Configuration(format!("field override names unknown field {}", over.ident))
            })?;
        if let Some(column) = &over.column {
            fields[idx].column = column.clone();
        }
        if let Some(pk) = over.primary_key {
            fields[idx].primary_key = pk;
            // An explicit primary key demotes the `id` convention elsewhere.
            if pk {
                for (i, other) in fields.iter_mut().enumerate() {
                    if i != idx {
                        other.primary_key = false;
                    }
                }
            }
        }
        if let Some(v) = over.is_virtual {
            fields[idx].is_virtual = v;
        }
    }

    let pk_count = fields.iter().filter(|f| f.primary_key && !f.is_virtual).count();
    if pk_count > 1 {
        return Err(LoamError::Configuration(
            "more than one primary key declared".into(),
        ));
    }
    for (i, field) in fields.iter().enumerate().filter(|(_, f)| !f.is_virtual) {
        if fields
            .iter()
            .take(i)
            .any(|f| !f.is_virtual && f.column == field.column)
        {
            return Err(LoamError::Configuration(format!(
                "duplicate column {}",
                field.column
            )));
        }
    }
    Ok(fields)
}

fn configure<E: Entity>() -> EntityConfigurator {
    let mut c = EntityConfigurator::new();
    E::configure(&mut c);
    c
}

/// Resolves an entity's table, connection and primary key without touching
/// its relationships, so mutually referencing entities never recurse.
pub fn probe<E: Entity>() -> Result<EntityRef> {
    let c = configure::<E>();
    let fields = resolve_fields::<E>(&c.overrides)?;
    let table = c.table.unwrap_or_else(default_table::<E>);
    let pk_column = fields
        .iter()
        .find(|f| f.primary_key && !f.is_virtual)
        .map(|f| f.column.clone())
        .unwrap_or_default();
    Ok(EntityRef {
        table,
        connection: c.connection,
        pk_column,
    })
}

impl Schema {
    /// Builds the full schema for `E`, resolving relationship defaults.
    pub fn build<E: Entity>(dialect: &'static Dialect) -> Result<Schema> {
        let c = configure::<E>();
        let fields = resolve_fields::<E>(&c.overrides)?;
        let table = c.table.unwrap_or_else(default_table::<E>);

        let mut relations = HashMap::new();
        for deferred in &c.relations {
            let (target, relation) = resolve_relation(&table, &fields, deferred)?;
            relations.insert(target, relation);
        }

        Ok(Schema {
            table,
            connection: c.connection.unwrap_or_default(),
            dialect,
            fields,
            relations,
        })
    }

    /// Non-virtual column names, optionally including the primary key.
    pub fn columns(&self, include_pk: bool) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.is_virtual && (include_pk || !f.primary_key))
            .map(|f| f.column.as_str())
            .collect()
    }

    pub fn pk_field(&self) -> Result<&FieldMetadata> {
        self.fields
            .iter()
            .find(|f| f.primary_key && !f.is_virtual)
            .ok_or_else(|| {
                LoamError::Operation(format!("entity {} has no primary key", self.table))
            })
    }

    pub fn pk_column(&self) -> Result<&str> {
        self.pk_field().map(|f| f.column.as_str())
    }

    pub fn field_by_column(&self, column: &str) -> Option<&FieldMetadata> {
        self.fields
            .iter()
            .find(|f| !f.is_virtual && f.column == column)
    }

    pub fn field_by_ident(&self, ident: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.ident == ident)
    }

    /// Reads the entity's primary key value.
    pub fn pk_value<E: Model>(&self, entity: &E) -> Result<Value> {
        let pk = self.pk_field()?;
        let mut values = Vec::new();
        entity.values(&mut values);
        values
            .into_iter()
            .find(|(ident, _)| *ident == pk.ident)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                LoamError::Operation(format!(
                    "primary key field {} is not scannable",
                    pk.ident
                ))
            })
    }

    /// Writes the entity's primary key, e.g. after an insert reported the
    /// generated id.
    pub fn set_pk<E: Model>(&self, entity: &mut E, value: Value) -> Result<()> {
        let pk = self.pk_field()?;
        let mut slots = Slots::new();
        entity.collect(&mut slots);
        let slot = slots
            .into_iter()
            .find(|s| s.ident == pk.ident)
            .ok_or_else(|| {
                LoamError::Operation(format!(
                    "primary key field {} is not scannable",
                    pk.ident
                ))
            })?;
        slot.sink.set_value(value)
    }

    /// `(column, value)` pairs for every non-virtual field, in schema order.
    pub fn values_of<E: Model>(&self, entity: &E, include_pk: bool) -> Result<Vec<(String, Value)>> {
        let mut raw = Vec::new();
        entity.values(&mut raw);
        let mut out = Vec::new();
        for field in &self.fields {
            if field.is_virtual || (!include_pk && field.primary_key) {
                continue;
            }
            let value = raw
                .iter()
                .find(|(ident, _)| *ident == field.ident)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| {
                    LoamError::Operation(format!("field {} is not scannable", field.ident))
                })?;
            out.push((field.column.clone(), value));
        }
        Ok(out)
    }

    /// Looks up the relationship whose target is `table`.
    pub fn relation(&self, table: &str) -> Result<&Relation> {
        self.relations.get(table).ok_or_else(|| {
            LoamError::Configuration(format!("no relationship configured for {table}"))
        })
    }
}

fn resolve_relation(
    own_table: &str,
    own_fields: &[FieldMetadata],
    deferred: &DeferredRelation,
) -> Result<(String, Relation)> {
    match deferred {
        DeferredRelation::HasMany { probe, config } => {
            let target = probe()?;
            let mut config = config.clone();
            if config.property_table.is_empty() {
                config.property_table = target.table.clone();
            }
            if config.property_foreign_key.is_empty() {
                config.property_foreign_key = foreign_key_for(own_table);
            }
            Ok((target.table, Relation::HasMany(config)))
        }
        DeferredRelation::HasOne { probe, config } => {
            let target = probe()?;
            let mut config = config.clone();
            if config.property_table.is_empty() {
                config.property_table = target.table.clone();
            }
            if config.property_foreign_key.is_empty() {
                config.property_foreign_key = foreign_key_for(own_table);
            }
            Ok((target.table, Relation::HasOne(config)))
        }
        DeferredRelation::BelongsTo { probe, config } => {
            let target = probe()?;
            let mut config = config.clone();
            if config.owner_table.is_empty() {
                config.owner_table = target.table.clone();
            }
            if config.local_foreign_key.is_empty() {
                config.local_foreign_key = foreign_key_for(&config.owner_table);
            }
            if config.foreign_column_name.is_empty() {
                config.foreign_column_name = "id".into();
            }
            // The foreign key must exist on this entity's column set.
            if !own_fields
                .iter()
                .any(|f| !f.is_virtual && f.column == config.local_foreign_key)
            {
                return Err(LoamError::Configuration(format!(
                    "belongs-to foreign key {} is not a column of {own_table}",
                    config.local_foreign_key
                )));
            }
            Ok((target.table, Relation::BelongsTo(config)))
        }
        DeferredRelation::BelongsToMany { probe, config } => {
            let target = probe()?;
            let mut config = config.clone();
            if config.intermediate_table.is_empty() {
                return Err(LoamError::Configuration(format!(
                    "belongs-to-many between {own_table} and {} needs an intermediate table",
                    target.table
                )));
            }
            if config.intermediate_local_column.is_empty() {
                config.intermediate_local_column = foreign_key_for(own_table);
            }
            if config.intermediate_foreign_column.is_empty() {
                config.intermediate_foreign_column = foreign_key_for(&target.table);
            }
            if config.foreign_table.is_empty() {
                config.foreign_table = target.table.clone();
            }
            if config.foreign_lookup_column.is_empty() {
                if target.pk_column.is_empty() {
                    return Err(LoamError::Configuration(format!(
                        "belongs-to-many target {} has no primary key to look up by",
                        target.table
                    )));
                }
                config.foreign_lookup_column = target.pk_column.clone();
            }
            Ok((target.table, Relation::BelongsToMany(config)))
        }
    }
}
