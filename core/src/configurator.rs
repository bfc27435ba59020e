//! Entity configuration.
//!
//! Every entity implements [`Entity::configure`], a declarative hook run
//! once while the schema registry is built. The configurator records table
//! and connection overrides, field-level overrides and relationship
//! descriptors; [`crate::schema::Schema::build`] consumes the recorded state
//! afterwards.
//!
//! Relationship targets are captured as deferred probe functions rather than
//! resolved inline. Two entities may reference each other; probing lazily
//! means configuration never recurses.

use crate::error::Result;
use crate::model::Model;
use crate::schema::{
    probe, BelongsToConfig, BelongsToManyConfig, EntityRef, HasManyConfig, HasOneConfig,
};

/// A record type that can be registered with a connection.
pub trait Entity: Model + Default {
    /// Declares table, connection, field and relationship configuration.
    /// An empty body accepts every default.
    fn configure(c: &mut EntityConfigurator);
}

/// Pending override for one field, keyed by its Rust identifier.
#[derive(Debug, Clone, Default)]
pub struct FieldOverride {
    pub ident: String,
    pub column: Option<String>,
    pub primary_key: Option<bool>,
    pub is_virtual: Option<bool>,
}

/// A relationship recorded during configuration. The `probe` resolves the
/// target entity's table and primary key once registration reaches it.
pub enum DeferredRelation {
    HasMany {
        probe: fn() -> Result<EntityRef>,
        config: HasManyConfig,
    },
    HasOne {
        probe: fn() -> Result<EntityRef>,
        config: HasOneConfig,
    },
    BelongsTo {
        probe: fn() -> Result<EntityRef>,
        config: BelongsToConfig,
    },
    BelongsToMany {
        probe: fn() -> Result<EntityRef>,
        config: BelongsToManyConfig,
    },
}

/// Collects one entity's declarative configuration.
#[derive(Default)]
pub struct EntityConfigurator {
    pub(crate) table: Option<String>,
    pub(crate) connection: Option<String>,
    pub(crate) overrides: Vec<FieldOverride>,
    pub(crate) relations: Vec<DeferredRelation>,
}

impl EntityConfigurator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the table name. Defaults to the pluralized, snake-case
    /// type name.
    pub fn table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Names the connection this entity belongs to. Defaults to `"default"`
    /// when exactly one connection is registered, otherwise required.
    pub fn connection(&mut self, connection: impl Into<String>) -> &mut Self {
        self.connection = Some(connection.into());
        self
    }

    /// Opens the field override sub-configurator.
    pub fn fields(&mut self) -> FieldsConfigurator<'_> {
        FieldsConfigurator {
            parent: self,
            current: None,
        }
    }

    /// Declares a one-to-many relationship to `P`.
    pub fn has_many<P: Entity>(&mut self, config: HasManyConfig) -> &mut Self {
        self.relations.push(DeferredRelation::HasMany {
            probe: probe::<P>,
            config,
        });
        self
    }

    /// Declares a one-to-one relationship to `P`, owned by this side.
    pub fn has_one<P: Entity>(&mut self, config: HasOneConfig) -> &mut Self {
        self.relations.push(DeferredRelation::HasOne {
            probe: probe::<P>,
            config,
        });
        self
    }

    /// Declares the inverse side: this entity carries a foreign key to `P`.
    pub fn belongs_to<P: Entity>(&mut self, config: BelongsToConfig) -> &mut Self {
        self.relations.push(DeferredRelation::BelongsTo {
            probe: probe::<P>,
            config,
        });
        self
    }

    /// Declares a many-to-many relationship to `P` through an intermediate
    /// table. The intermediate table name has no derivable default and must
    /// be set on the config.
    pub fn belongs_to_many<P: Entity>(&mut self, config: BelongsToManyConfig) -> &mut Self {
        self.relations.push(DeferredRelation::BelongsToMany {
            probe: probe::<P>,
            config,
        });
        self
    }
}

/// Fluent per-field override builder. Each [`FieldsConfigurator::field`]
/// call starts a new override; the pending one is flushed on the next
/// `field` call or on drop.
pub struct FieldsConfigurator<'a> {
    parent: &'a mut EntityConfigurator,
    current: Option<FieldOverride>,
}

impl<'a> FieldsConfigurator<'a> {
    /// Selects the field with the given Rust identifier.
    pub fn field(mut self, ident: impl Into<String>) -> Self {
        self.flush();
        self.current = Some(FieldOverride {
            ident: ident.into(),
            ..FieldOverride::default()
        });
        self
    }

    /// Renames the selected field's column.
    pub fn column_name(mut self, column: impl Into<String>) -> Self {
        if let Some(current) = self.current.as_mut() {
            current.column = Some(column.into());
        }
        self
    }

    /// Marks the selected field as the primary key.
    pub fn is_primary_key(mut self) -> Self {
        if let Some(current) = self.current.as_mut() {
            current.primary_key = Some(true);
        }
        self
    }

    /// Excludes the selected field from the column set.
    pub fn is_virtual(mut self) -> Self {
        if let Some(current) = self.current.as_mut() {
            current.is_virtual = Some(true);
        }
        self
    }

    /// Flushes the selected field and returns to no selection, allowing
    /// another `field` call in the same chain.
    pub fn also(mut self) -> Self {
        self.flush();
        self
    }

    fn flush(&mut self) {
        if let Some(current) = self.current.take() {
            self.parent.overrides.push(current);
        }
    }
}

impl Drop for FieldsConfigurator<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}
