//! Entity-level CRUD operations.
//!
//! Free functions mirroring the classic active-record verbs. Each resolves
//! the entity's connection and schema from the registry, builds the
//! statement with [`QueryBuilder`] and binds the result back onto the
//! entity where applicable.

use loam_core::{Binder, Entity, LoamError, QueryBuilder, Raw, ToValue, Value};

use crate::connection::schema_for;
use crate::Result;

/// Fetches the row whose primary key equals `id`.
pub fn find<E: Entity, K: ToValue>(id: K) -> Result<E> {
    let (conn, schema) = schema_for::<E>()?;
    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(schema.table.as_str())
        .set_select()
        .columns(schema.columns(true))
        .where_eq(schema.pk_column()?, id);
    let (sql, args) = qb.to_sql()?;
    let rows = conn.query(&sql, &args)?;
    let mut entity = E::default();
    Binder::new(&schema).bind_one(&rows, &mut entity)?;
    Ok(entity)
}

/// Re-fetches the entity's row by its current primary key, overwriting the
/// entity in place.
pub fn fill<E: Entity>(entity: &mut E) -> Result<()> {
    let (conn, schema) = schema_for::<E>()?;
    let pk = schema.pk_value(entity)?;
    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(schema.table.as_str())
        .set_select()
        .columns(schema.columns(true))
        .where_eq(schema.pk_column()?, pk);
    let (sql, args) = qb.to_sql()?;
    let rows = conn.query(&sql, &args)?;
    Binder::new(&schema).bind_one(&rows, entity)
}

/// Inserts the entity and writes the generated id back onto it.
pub fn insert<E: Entity>(entity: &mut E) -> Result<()> {
    let (conn, schema) = schema_for::<E>()?;
    let values = schema.values_of(entity, false)?;
    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(schema.table.as_str())
        .into_columns(values.iter().map(|(c, _)| c.clone()))
        .values(values.iter().map(|(_, v)| v.clone()));
    let (sql, args) = qb.to_sql()?;
    let result = conn.execute(&sql, &args)?;
    if result.last_insert_id != 0 {
        schema.set_pk(entity, Value::Int(result.last_insert_id))?;
    }
    Ok(())
}

/// Inserts several entities in one multi-row statement. Generated ids are
/// not written back; drivers only report the last one.
pub fn insert_all<E: Entity>(entities: &[E]) -> Result<()> {
    let Some(first) = entities.first() else {
        return Ok(());
    };
    let (conn, schema) = schema_for::<E>()?;
    let columns: Vec<String> = schema
        .values_of(first, false)?
        .into_iter()
        .map(|(c, _)| c)
        .collect();
    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(schema.table.as_str()).into_columns(columns);
    for entity in entities {
        let values = schema.values_of(entity, false)?;
        qb.values(values.into_iter().map(|(_, v)| v));
    }
    let (sql, args) = qb.to_sql()?;
    conn.execute(&sql, &args)?;
    Ok(())
}

/// Inserts when the primary key still holds its zero value, updates
/// otherwise.
pub fn save<E: Entity>(entity: &mut E) -> Result<()> {
    let (_, schema) = schema_for::<E>()?;
    if schema.pk_value(entity)?.is_zero() {
        insert(entity)
    } else {
        update(entity)
    }
}

/// Writes every non-key column back, keyed on the primary key.
pub fn update<E: Entity>(entity: &E) -> Result<()> {
    let (conn, schema) = schema_for::<E>()?;
    let pk = schema.pk_value(entity)?;
    if pk.is_zero() {
        return Err(LoamError::Operation(
            "cannot update an entity with a zero primary key".into(),
        ));
    }
    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(schema.table.as_str());
    for (column, value) in schema.values_of(entity, false)? {
        qb.set(column, value);
    }
    qb.where_eq(schema.pk_column()?, pk);
    let (sql, args) = qb.to_sql()?;
    conn.execute(&sql, &args)?;
    Ok(())
}

/// Deletes the entity's row, keyed on the primary key.
pub fn delete<E: Entity>(entity: &E) -> Result<()> {
    let (conn, schema) = schema_for::<E>()?;
    let pk = schema.pk_value(entity)?;
    if pk.is_zero() {
        return Err(LoamError::Operation(
            "cannot delete an entity with a zero primary key".into(),
        ));
    }
    let mut qb = QueryBuilder::new(conn.dialect());
    qb.table(schema.table.as_str())
        .set_delete()
        .where_eq(schema.pk_column()?, pk);
    let (sql, args) = qb.to_sql()?;
    conn.execute(&sql, &args)?;
    Ok(())
}

/// Runs a raw query on the entity's connection and binds the rows as `E`.
pub fn query_raw<E: Entity>(raw: Raw) -> Result<Vec<E>> {
    let (conn, schema) = schema_for::<E>()?;
    let rows = conn.query(&raw.fragment, &raw.args)?;
    Binder::new(&schema).bind_many(&rows)
}

/// Runs a raw statement on the entity's connection.
pub fn exec_raw<E: Entity>(raw: Raw) -> Result<u64> {
    let (conn, _) = schema_for::<E>()?;
    let result = conn.execute(&raw.fragment, &raw.args)?;
    Ok(result.rows_affected)
}
