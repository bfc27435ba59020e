//! Core building blocks shared by the loam runtime and derive macro.
//!
//! Everything here is database-agnostic apart from the optional bundled
//! rusqlite adapter: the dialect table, the driver-level [`Value`] and its
//! scalar protocol, the fluent [`QueryBuilder`], the [`Model`] accessor
//! contract, the entity configurator and schema registry entry, and the row
//! [`Binder`].

pub mod bind;
pub mod builder;
pub mod configurator;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod model;
pub mod schema;
pub mod tracing;
pub mod value;

pub use bind::Binder;
pub use builder::{ops, Order, QueryBuilder, QueryKind, Raw};
pub use configurator::{Entity, EntityConfigurator, FieldsConfigurator};
pub use dialect::{Dialect, MYSQL, POSTGRES, SQLITE};
pub use driver::{CancelToken, Driver, ExecResult, ResultSet};
pub use error::{LoamError, Result};
pub use model::{FieldSpec, Model, SlotEntry, Slots};
pub use schema::{
    probe, BelongsToConfig, BelongsToManyConfig, EntityRef, FieldMetadata, HasManyConfig,
    HasOneConfig, Relation, Schema,
};
pub use value::{FromValue, Sink, ToValue, Value};
