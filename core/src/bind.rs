//! Row binding: copying a result set into entity values.
//!
//! The binder walks each row column by column and resolves every result
//! column to a write slot on the target. With a schema attached, the
//! schema's (possibly renamed) column names take priority; without one, the
//! derived column names on the slots are matched directly. Columns nothing
//! claims are discarded without error, so `SELECT *` over a wider table than
//! the target type is fine.

use crate::driver::{CancelToken, ResultSet};
use crate::error::{LoamError, Result};
use crate::model::{Model, SlotEntry, Slots};
use crate::schema::Schema;
use crate::value::Value;

pub struct Binder<'s> {
    schema: Option<&'s Schema>,
    cancel: CancelToken,
}

impl<'s> Binder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Binder {
            schema: Some(schema),
            cancel: CancelToken::new(),
        }
    }

    /// A binder that matches result columns against the derived column
    /// names only. Used for raw queries with no registered schema.
    pub fn schemaless() -> Self {
        Binder {
            schema: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Binds the first row into `target`. Errors with
    /// [`LoamError::NotFound`] on an empty result set.
    pub fn bind_one<T: Model>(&self, rows: &ResultSet, target: &mut T) -> Result<()> {
        let row = rows.rows.first().ok_or(LoamError::NotFound)?;
        self.apply_row(&rows.columns, row, target)
    }

    /// Binds every row, producing one freshly defaulted `T` per row.
    pub fn bind_many<T: Model + Default>(&self, rows: &ResultSet) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(rows.rows.len());
        for row in &rows.rows {
            self.cancel.check()?;
            let mut target = T::default();
            self.apply_row(&rows.columns, row, &mut target)?;
            out.push(target);
        }
        Ok(out)
    }

    fn apply_row<T: Model>(&self, columns: &[String], row: &[Value], target: &mut T) -> Result<()> {
        if row.len() != columns.len() {
            return Err(LoamError::Bind(format!(
                "row has {} values for {} columns",
                row.len(),
                columns.len()
            )));
        }
        let mut slots = Slots::new();
        target.collect(&mut slots);
        for (column, value) in columns.iter().zip(row) {
            let Some(slot) = self.resolve(column, &mut slots) else {
                continue;
            };
            slot.sink.set_value(value.clone()).map_err(|e| match e {
                // Attach the column the scan was filling.
                LoamError::Scan { message, .. } => LoamError::Scan {
                    column: column.clone(),
                    message,
                },
                other => other,
            })?;
        }
        Ok(())
    }

    /// Schema first: a schema column name maps to its field's identifier,
    /// then to the slot with that identifier. Falling back to the derived
    /// slot column covers embedded fields and schemaless binding.
    fn resolve<'a, 'b>(
        &self,
        column: &str,
        slots: &'a mut Slots<'b>,
    ) -> Option<&'a mut SlotEntry<'b>> {
        if let Some(schema) = self.schema {
            if let Some(field) = schema.field_by_column(column) {
                if let Some(i) = slots.iter().position(|s| s.ident == field.ident) {
                    return Some(&mut slots[i]);
                }
            }
        }
        let i = slots.iter().position(|s| s.column == column)?;
        Some(&mut slots[i])
    }
}
