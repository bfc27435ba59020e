//! Dialect-aware SQL assembly.
//!
//! One mutable [`QueryBuilder`] covers all four statement kinds. Callers
//! chain fluent mutators and finish with [`QueryBuilder::to_sql`], which is
//! idempotent: it walks the recorded state, numbers placeholders
//! sequentially in emission order and returns the SQL string together with
//! the bound arguments in exactly that order.

use crate::dialect::Dialect;
use crate::error::{LoamError, Result};
use crate::value::{ToValue, Value};

/// Comparison operators accepted by the `where` family.
pub mod ops {
    pub const EQ: &str = "=";
    pub const NE: &str = "!=";
    pub const GT: &str = ">";
    pub const GE: &str = ">=";
    pub const LT: &str = "<";
    pub const LE: &str = "<=";
    pub const LIKE: &str = "LIKE";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// A verbatim SQL fragment with its own bound arguments.
///
/// The fragment is emitted untouched, so the caller writes placeholders in
/// the target dialect's own syntax. The arguments are merged into the outer
/// argument list in order.
#[derive(Debug, Clone)]
pub struct Raw {
    pub fragment: String,
    pub args: Vec<Value>,
}

impl Raw {
    pub fn new<V: ToValue>(
        fragment: impl Into<String>,
        args: impl IntoIterator<Item = V>,
    ) -> Self {
        Raw {
            fragment: fragment.into(),
            args: args.into_iter().map(|v| v.to_value()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

impl Connective {
    fn as_str(self) -> &'static str {
        match self {
            Connective::And => " AND ",
            Connective::Or => " OR ",
        }
    }
}

#[derive(Debug, Clone)]
enum WhereExpr {
    /// `col op ph`
    Condition {
        column: String,
        operator: String,
        value: Value,
    },
    /// `col IN (ph, ph, ...)`
    In { column: String, values: Vec<Value> },
    /// `col IN (<fragment>)`
    InFragment { column: String, raw: Raw },
    /// The fragment verbatim.
    Fragment(Raw),
}

#[derive(Debug, Clone)]
struct WhereNode {
    /// Connective to the previous node; ignored on the first node.
    connective: Connective,
    expr: WhereExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinKind {
    Inner,
    Left,
    Right,
    FullOuter,
}

impl JoinKind {
    fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
        }
    }
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: String,
    left: String,
    right: String,
}

/// A mutable, fluent builder for `SELECT`/`INSERT`/`UPDATE`/`DELETE`.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    dialect: &'static Dialect,
    kind: Option<QueryKind>,
    table: Option<String>,
    sub_query: Option<Box<QueryBuilder>>,
    projection: Vec<String>,
    wheres: Vec<WhereNode>,
    orders: Vec<(String, Order)>,
    groups: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    joins: Vec<Join>,
    sets: Vec<(String, Value)>,
    insert_columns: Vec<String>,
    insert_values: Vec<Vec<Value>>,
}

impl QueryBuilder {
    pub fn new(dialect: &'static Dialect) -> Self {
        QueryBuilder {
            dialect,
            kind: None,
            table: None,
            sub_query: None,
            projection: Vec::new(),
            wheres: Vec::new(),
            orders: Vec::new(),
            groups: Vec::new(),
            limit: None,
            offset: None,
            joins: Vec::new(),
            sets: Vec::new(),
            insert_columns: Vec::new(),
            insert_values: Vec::new(),
        }
    }

    pub fn dialect(&self) -> &'static Dialect {
        self.dialect
    }

    pub fn table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    pub fn set_select(&mut self) -> &mut Self {
        self.kind = Some(QueryKind::Select);
        self
    }

    pub fn set_delete(&mut self) -> &mut Self {
        self.kind = Some(QueryKind::Delete);
        self
    }

    /// Sets the projection list. Empty means `*`.
    pub fn columns<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.projection.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Uses another SELECT as the `FROM` source. Its arguments are merged
    /// before any of this builder's WHERE arguments, matching their textual
    /// position.
    pub fn from_query(&mut self, sub: QueryBuilder) -> &mut Self {
        self.sub_query = Some(Box::new(sub));
        self
    }

    /// Shorthand for `and_where(column, "=", value)`.
    pub fn where_eq(&mut self, column: impl Into<String>, value: impl ToValue) -> &mut Self {
        self.and_where(column, ops::EQ, value)
    }

    pub fn and_where(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl ToValue,
    ) -> &mut Self {
        self.push_where(Connective::And, WhereExpr::Condition {
            column: column.into(),
            operator: operator.into(),
            value: value.to_value(),
        })
    }

    pub fn or_where(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl ToValue,
    ) -> &mut Self {
        self.push_where(Connective::Or, WhereExpr::Condition {
            column: column.into(),
            operator: operator.into(),
            value: value.to_value(),
        })
    }

    pub fn where_in<V: ToValue>(
        &mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push_where(Connective::And, WhereExpr::In {
            column: column.into(),
            values: values.into_iter().map(|v| v.to_value()).collect(),
        })
    }

    /// `col IN (<fragment>)`, with the fragment's arguments merged in place.
    pub fn where_in_fragment(&mut self, column: impl Into<String>, raw: Raw) -> &mut Self {
        self.push_where(Connective::And, WhereExpr::InFragment {
            column: column.into(),
            raw,
        })
    }

    pub fn and_where_raw(&mut self, raw: Raw) -> &mut Self {
        self.push_where(Connective::And, WhereExpr::Fragment(raw))
    }

    pub fn or_where_raw(&mut self, raw: Raw) -> &mut Self {
        self.push_where(Connective::Or, WhereExpr::Fragment(raw))
    }

    fn push_where(&mut self, connective: Connective, expr: WhereExpr) -> &mut Self {
        self.wheres.push(WhereNode { connective, expr });
        self
    }

    pub fn order_by(&mut self, column: impl Into<String>, order: Order) -> &mut Self {
        self.orders.push((column.into(), order));
        self
    }

    pub fn group_by<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: usize) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn join(
        &mut self,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> &mut Self {
        self.push_join(JoinKind::Inner, table, left, right)
    }

    pub fn inner_join(
        &mut self,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> &mut Self {
        self.push_join(JoinKind::Inner, table, left, right)
    }

    pub fn left_join(
        &mut self,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> &mut Self {
        self.push_join(JoinKind::Left, table, left, right)
    }

    pub fn right_join(
        &mut self,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> &mut Self {
        self.push_join(JoinKind::Right, table, left, right)
    }

    pub fn full_outer_join(
        &mut self,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> &mut Self {
        self.push_join(JoinKind::FullOuter, table, left, right)
    }

    fn push_join(
        &mut self,
        kind: JoinKind,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> &mut Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            left: left.into(),
            right: right.into(),
        });
        self
    }

    /// Records a `SET` assignment; implies an UPDATE when no kind was set.
    pub fn set(&mut self, column: impl Into<String>, value: impl ToValue) -> &mut Self {
        if self.kind.is_none() {
            self.kind = Some(QueryKind::Update);
        }
        self.sets.push((column.into(), value.to_value()));
        self
    }

    /// Records the INSERT column list; implies an INSERT when no kind was set.
    pub fn into_columns<S: Into<String>>(
        &mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        if self.kind.is_none() {
            self.kind = Some(QueryKind::Insert);
        }
        self.insert_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Records one INSERT value tuple; implies an INSERT when no kind was set.
    pub fn values<V: ToValue>(&mut self, row: impl IntoIterator<Item = V>) -> &mut Self {
        if self.kind.is_none() {
            self.kind = Some(QueryKind::Insert);
        }
        self.insert_values
            .push(row.into_iter().map(|v| v.to_value()).collect());
        self
    }

    /// Emits the SQL string and its bound arguments. Callable repeatedly.
    pub fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        let kind = self.resolved_kind()?;
        self.check_kind_coherence(kind)?;

        let mut em = Emitter::new(self.dialect);
        self.emit(kind, &mut em)?;
        Ok((em.sql, em.args))
    }

    fn resolved_kind(&self) -> Result<QueryKind> {
        if let Some(kind) = self.kind {
            return Ok(kind);
        }
        // A builder with a source but no explicit kind reads as a SELECT.
        if self.table.is_some() || self.sub_query.is_some() {
            return Ok(QueryKind::Select);
        }
        Err(LoamError::Builder("no query kind set".into()))
    }

    fn check_kind_coherence(&self, kind: QueryKind) -> Result<()> {
        if !self.sets.is_empty() && kind != QueryKind::Update {
            return Err(LoamError::Builder(
                "kind mismatch: SET on a non-update query".into(),
            ));
        }
        if (!self.insert_columns.is_empty() || !self.insert_values.is_empty())
            && kind != QueryKind::Insert
        {
            return Err(LoamError::Builder(
                "kind mismatch: INSERT values on a non-insert query".into(),
            ));
        }
        if self.sub_query.is_some() && kind != QueryKind::Select {
            return Err(LoamError::Builder(
                "sub-query sources are supported on SELECT only".into(),
            ));
        }
        Ok(())
    }

    fn require_table(&self) -> Result<&str> {
        self.table
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LoamError::Builder("no table specified".into()))
    }

    fn emit(&self, kind: QueryKind, em: &mut Emitter) -> Result<()> {
        match kind {
            QueryKind::Select => self.emit_select(em),
            QueryKind::Insert => self.emit_insert(em),
            QueryKind::Update => self.emit_update(em),
            QueryKind::Delete => self.emit_delete(em),
        }
    }

    fn emit_select(&self, em: &mut Emitter) -> Result<()> {
        em.push("SELECT ");
        if self.projection.is_empty() {
            em.push("*");
        } else {
            em.push(&self.projection.join(","));
        }
        em.push(" FROM ");
        match &self.sub_query {
            Some(sub) => {
                em.push("(");
                let sub_kind = sub.resolved_kind()?;
                sub.check_kind_coherence(sub_kind)?;
                sub.emit(sub_kind, em)?;
                em.push(" )");
            }
            None => em.push(self.require_table()?),
        }
        for join in &self.joins {
            em.push(" ");
            em.push(join.kind.as_str());
            em.push(" ");
            em.push(&join.table);
            em.push(" ON ");
            em.push(&join.left);
            em.push(" = ");
            em.push(&join.right);
        }
        self.emit_where(em)?;
        if !self.groups.is_empty() {
            em.push(" GROUP BY ");
            em.push(&self.groups.join(","));
        }
        if !self.orders.is_empty() {
            em.push(" ORDER BY ");
            let rendered: Vec<String> = self
                .orders
                .iter()
                .map(|(col, order)| format!("{col} {}", order.as_str()))
                .collect();
            em.push(&rendered.join(","));
        }
        if let Some(limit) = self.limit {
            em.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            em.push(&format!(" OFFSET {offset}"));
        }
        Ok(())
    }

    fn emit_insert(&self, em: &mut Emitter) -> Result<()> {
        if self.insert_columns.is_empty() {
            return Err(LoamError::Builder("no insert columns".into()));
        }
        if self.insert_values.is_empty() {
            return Err(LoamError::Builder("no insert values".into()));
        }
        em.push("INSERT INTO ");
        em.push(self.require_table()?);
        em.push(" (");
        em.push(&self.insert_columns.join(","));
        em.push(") VALUES ");
        for (i, row) in self.insert_values.iter().enumerate() {
            if row.len() != self.insert_columns.len() {
                return Err(LoamError::Builder(format!(
                    "value tuple {} has {} values for {} columns",
                    i,
                    row.len(),
                    self.insert_columns.len()
                )));
            }
            if i > 0 {
                em.push(",");
            }
            em.push("(");
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    em.push(",");
                }
                em.bind(value.clone());
            }
            em.push(")");
        }
        Ok(())
    }

    fn emit_update(&self, em: &mut Emitter) -> Result<()> {
        if self.sets.is_empty() {
            return Err(LoamError::Builder("update with no assignments".into()));
        }
        em.push("UPDATE ");
        em.push(self.require_table()?);
        em.push(" SET ");
        for (i, (column, value)) in self.sets.iter().enumerate() {
            if i > 0 {
                em.push(",");
            }
            em.push(column);
            em.push("=");
            em.bind(value.clone());
        }
        self.emit_where(em)
    }

    fn emit_delete(&self, em: &mut Emitter) -> Result<()> {
        em.push("DELETE FROM ");
        em.push(self.require_table()?);
        self.emit_where(em)
    }

    fn emit_where(&self, em: &mut Emitter) -> Result<()> {
        if self.wheres.is_empty() {
            return Ok(());
        }
        em.push(" WHERE ");
        for (i, node) in self.wheres.iter().enumerate() {
            if i > 0 {
                em.push(node.connective.as_str());
            }
            match &node.expr {
                WhereExpr::Condition {
                    column,
                    operator,
                    value,
                } => {
                    em.push(column);
                    em.push(" ");
                    em.push(operator);
                    em.push(" ");
                    em.bind(value.clone());
                }
                WhereExpr::In { column, values } => {
                    if values.is_empty() {
                        return Err(LoamError::Builder("empty IN list".into()));
                    }
                    em.push(column);
                    em.push(" IN (");
                    for (j, value) in values.iter().enumerate() {
                        if j > 0 {
                            em.push(",");
                        }
                        em.bind(value.clone());
                    }
                    em.push(")");
                }
                WhereExpr::InFragment { column, raw } => {
                    em.push(column);
                    em.push(" IN (");
                    em.raw(raw);
                    em.push(")");
                }
                WhereExpr::Fragment(raw) => em.raw(raw),
            }
        }
        Ok(())
    }
}

/// Accumulates SQL text and arguments, numbering placeholders sequentially
/// across the whole statement in emission order.
struct Emitter {
    dialect: &'static Dialect,
    sql: String,
    args: Vec<Value>,
    index: usize,
}

impl Emitter {
    fn new(dialect: &'static Dialect) -> Self {
        Emitter {
            dialect,
            sql: String::new(),
            args: Vec::new(),
            index: 0,
        }
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    /// Emits the next placeholder and appends its argument.
    fn bind(&mut self, value: Value) {
        self.index += 1;
        let ph = self.dialect.placeholder(self.index);
        self.sql.push_str(&ph);
        self.args.push(value);
    }

    /// Emits a raw fragment verbatim, advancing the placeholder counter by
    /// the fragment's own argument count so later placeholders stay aligned.
    fn raw(&mut self, raw: &Raw) {
        self.sql.push_str(&raw.fragment);
        self.index += raw.args.len();
        self.args.extend(raw.args.iter().cloned());
    }
}
