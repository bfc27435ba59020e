//! An object-relational mapper with a derived accessor table in place of
//! runtime reflection.
//!
//! Entities are plain structs deriving [`Model`] and implementing
//! [`Entity::configure`]. [`initialize`] opens the configured connections
//! and builds every entity's schema once; after that the free functions
//! ([`find`], [`save`], [`insert`], the [`query`] builder and the
//! relationship helpers) resolve everything from the registry.
//!
//! ```ignore
//! #[derive(Model, Default)]
//! struct Post {
//!     id: i64,
//!     body: String,
//! }
//!
//! impl Entity for Post {
//!     fn configure(c: &mut EntityConfigurator) {
//!         c.has_many::<Comment>(HasManyConfig::default());
//!     }
//! }
//!
//! loam::initialize(vec![
//!     ConnectionConfig::new("default")
//!         .driver("sqlite", ":memory:")
//!         .entity::<Post>()
//!         .entity::<Comment>(),
//! ])?;
//!
//! let mut post = Post { body: "hello".into(), ..Post::default() };
//! loam::save(&mut post)?;
//! let comments = loam::has_many::<Comment, _>(&post)?;
//! ```

mod connection;
mod crud;
mod query;
mod relations;

pub use connection::{connection, initialize, Connection, ConnectionConfig};
pub use crud::{delete, exec_raw, fill, find, insert, insert_all, query_raw, save, update};
pub use query::{query, Query};
pub use relations::{add, belongs_to, belongs_to_many, has_many, has_one};

pub use loam_core::{
    ops, BelongsToConfig, BelongsToManyConfig, Binder, CancelToken, Dialect, Driver, Entity,
    EntityConfigurator, EntityRef, ExecResult, FieldMetadata, FieldSpec, FieldsConfigurator,
    FromValue, HasManyConfig, HasOneConfig, LoamError, Model, Order, QueryBuilder, Raw, Relation,
    Result, ResultSet, Schema, Sink, SlotEntry, Slots, ToValue, Value, MYSQL, POSTGRES, SQLITE,
};

/// Derives the [`Model`] accessor table for a struct.
pub use loam_macros::Model;
