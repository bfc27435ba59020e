//! Relationship traversal and cascade insert.
//!
//! Each function starts from a live entity, looks up the relationship its
//! schema declared for the target's table and builds the corresponding
//! query. The target type comes first in the generic parameter list, so
//! call sites read as `has_many::<Comment, _>(&post)`.

use loam_core::{Binder, Entity, LoamError, QueryBuilder, Raw, Relation, Value};

use crate::connection::schema_for;
use crate::Result;

/// Fetches every `P` whose foreign key points at `owner`.
pub fn has_many<P: Entity, O: Entity>(owner: &O) -> Result<Vec<P>> {
    let (_, owner_schema) = schema_for::<O>()?;
    let (conn, property_schema) = schema_for::<P>()?;
    let Relation::HasMany(config) = owner_schema.relation(&property_schema.table)? else {
        return Err(LoamError::Configuration(format!(
            "relationship to {} is not has-many",
            property_schema.table
        )));
    };
    let pk = owner_schema.pk_value(owner)?;
    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(config.property_table.as_str())
        .set_select()
        .where_eq(config.property_foreign_key.as_str(), pk);
    let (sql, args) = qb.to_sql()?;
    let rows = conn.query(&sql, &args)?;
    Binder::new(&property_schema).bind_many(&rows)
}

/// Fetches the single `P` whose foreign key points at `owner`. Errors with
/// [`LoamError::NotFound`] when no row matches.
pub fn has_one<P: Entity, O: Entity>(owner: &O) -> Result<P> {
    let (_, owner_schema) = schema_for::<O>()?;
    let (conn, property_schema) = schema_for::<P>()?;
    let Relation::HasOne(config) = owner_schema.relation(&property_schema.table)? else {
        return Err(LoamError::Configuration(format!(
            "relationship to {} is not has-one",
            property_schema.table
        )));
    };
    let pk = owner_schema.pk_value(owner)?;
    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(config.property_table.as_str())
        .set_select()
        .where_eq(config.property_foreign_key.as_str(), pk)
        .limit(1);
    let (sql, args) = qb.to_sql()?;
    let rows = conn.query(&sql, &args)?;
    let mut property = P::default();
    Binder::new(&property_schema).bind_one(&rows, &mut property)?;
    Ok(property)
}

/// Fetches the `O` that `property`'s foreign key points at.
pub fn belongs_to<O: Entity, P: Entity>(property: &P) -> Result<O> {
    let (_, property_schema) = schema_for::<P>()?;
    let (conn, owner_schema) = schema_for::<O>()?;
    let Relation::BelongsTo(config) = property_schema.relation(&owner_schema.table)? else {
        return Err(LoamError::Configuration(format!(
            "relationship to {} is not belongs-to",
            owner_schema.table
        )));
    };
    let fk_value = property_schema
        .values_of(property, true)?
        .into_iter()
        .find(|(column, _)| *column == config.local_foreign_key)
        .map(|(_, value)| value)
        .ok_or_else(|| {
            LoamError::Configuration(format!(
                "foreign key {} is not a column of {}",
                config.local_foreign_key, property_schema.table
            ))
        })?;
    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(config.owner_table.as_str())
        .set_select()
        .where_eq(config.foreign_column_name.as_str(), fk_value)
        .limit(1);
    let (sql, args) = qb.to_sql()?;
    let rows = conn.query(&sql, &args)?;
    let mut owner = O::default();
    Binder::new(&owner_schema).bind_one(&rows, &mut owner)?;
    Ok(owner)
}

/// Fetches every `P` related to `owner` through the intermediate table.
/// Runs as one statement with the join-table lookup inlined as a sub-query.
pub fn belongs_to_many<P: Entity, O: Entity>(owner: &O) -> Result<Vec<P>> {
    let (_, owner_schema) = schema_for::<O>()?;
    let (conn, property_schema) = schema_for::<P>()?;
    let Relation::BelongsToMany(config) = owner_schema.relation(&property_schema.table)? else {
        return Err(LoamError::Configuration(format!(
            "relationship to {} is not belongs-to-many",
            property_schema.table
        )));
    };
    let pk = owner_schema.pk_value(owner)?;

    let mut inner = QueryBuilder::new(conn.dialect());
    inner
        .table(config.intermediate_table.as_str())
        .set_select()
        .columns([config.intermediate_foreign_column.clone()])
        .where_eq(config.intermediate_local_column.as_str(), pk);
    let (inner_sql, inner_args) = inner.to_sql()?;

    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(config.foreign_table.as_str())
        .set_select()
        .where_in_fragment(
            config.foreign_lookup_column.as_str(),
            Raw::new(inner_sql, inner_args),
        );
    let (sql, args) = qb.to_sql()?;
    let rows = conn.query(&sql, &args)?;
    Binder::new(&property_schema).bind_many(&rows)
}

/// Inserts `items` as children of `owner` in one multi-row statement,
/// overriding each item's foreign key column with the owner's primary key.
/// Only has-many and has-one relationships support this.
pub fn add<P: Entity, O: Entity>(owner: &O, items: &[P]) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let (_, owner_schema) = schema_for::<O>()?;
    let (conn, property_schema) = schema_for::<P>()?;
    let foreign_key = match owner_schema.relation(&property_schema.table)? {
        Relation::HasMany(config) => config.property_foreign_key.clone(),
        Relation::HasOne(config) => config.property_foreign_key.clone(),
        Relation::BelongsTo(_) | Relation::BelongsToMany(_) => {
            return Err(LoamError::Operation(
                "adding children is only supported for has-many and has-one".into(),
            ));
        }
    };
    let pk = owner_schema.pk_value(owner)?;

    let columns: Vec<String> = property_schema
        .columns(false)
        .iter()
        .map(|c| c.to_string())
        .collect();
    if !columns.iter().any(|c| *c == foreign_key) {
        return Err(LoamError::Configuration(format!(
            "foreign key {} is not a column of {}",
            foreign_key, property_schema.table
        )));
    }

    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(property_schema.table.as_str()).into_columns(columns);
    for item in items {
        let row: Vec<Value> = property_schema
            .values_of(item, false)?
            .into_iter()
            .map(|(column, value)| {
                if column == foreign_key {
                    pk.clone()
                } else {
                    value
                }
            })
            .collect();
        qb.values(row);
    }
    let (sql, args) = qb.to_sql()?;
    conn.execute(&sql, &args)?;
    Ok(())
}
