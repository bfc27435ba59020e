//! The typed query interface.
//!
//! [`query`] opens a builder already scoped to an entity's table and
//! connection. Chained refinements feed the underlying [`QueryBuilder`];
//! terminal methods emit the SQL, run it and bind the rows back as the
//! entity type.

use std::marker::PhantomData;
use std::sync::Arc;

use loam_core::{
    Binder, CancelToken, Entity, LoamError, Order, QueryBuilder, Raw, Schema, ToValue, Value,
};

use crate::connection::{schema_for, Connection};
use crate::Result;

/// Opens a typed query over `E`'s table.
pub fn query<E: Entity>() -> Result<Query<E>> {
    let (conn, schema) = schema_for::<E>()?;
    let mut builder = QueryBuilder::new(conn.dialect());
    builder.table(schema.table.as_str());
    Ok(Query {
        conn,
        schema,
        builder,
        cancel: CancelToken::new(),
        _marker: PhantomData,
    })
}

pub struct Query<E> {
    conn: Arc<Connection>,
    schema: Arc<Schema>,
    builder: QueryBuilder,
    cancel: CancelToken,
    _marker: PhantomData<E>,
}

impl<E: Entity> Query<E> {
    pub fn where_eq(mut self, column: impl Into<String>, value: impl ToValue) -> Self {
        self.builder.where_eq(column, value);
        self
    }

    pub fn and_where(
        mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl ToValue,
    ) -> Self {
        self.builder.and_where(column, operator, value);
        self
    }

    pub fn or_where(
        mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl ToValue,
    ) -> Self {
        self.builder.or_where(column, operator, value);
        self
    }

    pub fn where_in<V: ToValue>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.builder.where_in(column, values);
        self
    }

    pub fn and_where_raw(mut self, raw: Raw) -> Self {
        self.builder.and_where_raw(raw);
        self
    }

    /// Filters on the primary key.
    pub fn where_pk(self, value: impl ToValue) -> Result<Self> {
        let pk = self.schema.pk_column()?.to_string();
        Ok(self.where_eq(pk, value))
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.builder.order_by(column, order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.builder.limit(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.builder.offset(offset);
        self
    }

    /// Records an assignment for a terminal [`Query::update`].
    pub fn set(mut self, column: impl Into<String>, value: impl ToValue) -> Self {
        self.builder.set(column, value);
        self
    }

    /// Attaches a cancellation token, honored between rows while binding.
    /// Any clone of the token can cancel.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the query and binds every row.
    pub fn all(mut self) -> Result<Vec<E>> {
        self.builder
            .set_select()
            .columns(self.schema.columns(true).iter().map(|c| c.to_string()));
        let (sql, args) = self.builder.to_sql()?;
        let rows = self.conn.query(&sql, &args)?;
        Binder::new(&self.schema)
            .with_cancel(self.cancel.clone())
            .bind_many(&rows)
    }

    /// The row with the smallest primary key matching the query.
    pub fn first(self) -> Result<E> {
        let pk = self.schema.pk_column()?.to_string();
        self.order_by(pk, Order::Asc).limit(1).one()
    }

    /// The row with the largest primary key matching the query.
    pub fn latest(self) -> Result<E> {
        let pk = self.schema.pk_column()?.to_string();
        self.order_by(pk, Order::Desc).limit(1).one()
    }

    /// Runs the query and binds the first row, erroring with
    /// [`LoamError::NotFound`] when nothing matched.
    pub fn one(mut self) -> Result<E> {
        self.builder
            .set_select()
            .columns(self.schema.columns(true).iter().map(|c| c.to_string()));
        let (sql, args) = self.builder.to_sql()?;
        let rows = self.conn.query(&sql, &args)?;
        let mut entity = E::default();
        Binder::new(&self.schema).bind_one(&rows, &mut entity)?;
        Ok(entity)
    }

    /// Counts matching rows by primary key.
    pub fn count(mut self) -> Result<i64> {
        let pk = self.schema.pk_column()?.to_string();
        self.builder
            .set_select()
            .columns([format!("COUNT({pk})")]);
        let (sql, args) = self.builder.to_sql()?;
        let rows = self.conn.query(&sql, &args)?;
        match rows.rows.first().and_then(|r| r.first()) {
            Some(Value::Int(n)) => Ok(*n),
            Some(other) => Err(LoamError::Bind(format!(
                "count returned a {} value",
                other.type_name()
            ))),
            None => Ok(0),
        }
    }

    /// Applies the recorded [`Query::set`] assignments to matching rows.
    pub fn update(self) -> Result<u64> {
        let (sql, args) = self.builder.to_sql()?;
        let result = self.conn.execute(&sql, &args)?;
        Ok(result.rows_affected)
    }

    /// Deletes matching rows.
    pub fn delete(mut self) -> Result<u64> {
        self.builder.set_delete();
        let (sql, args) = self.builder.to_sql()?;
        let result = self.conn.execute(&sql, &args)?;
        Ok(result.rows_affected)
    }
}
