//! The driver contract.
//!
//! A [`Driver`] executes one statement at a time against a live database
//! handle, exchanging [`Value`] scalars in both directions. Result sets are
//! fully materialized; streaming is a driver-internal concern.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{LoamError, Result};
use crate::value::Value;

#[cfg(feature = "rusqlite")]
mod rusqlite;

/// Outcome of a statement that modifies rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecResult {
    /// Driver-reported id of the last inserted row. Zero when the driver
    /// has nothing to report.
    pub last_insert_id: i64,
    pub rows_affected: u64,
}

/// A fully materialized query result.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A live database handle.
pub trait Driver: Send {
    fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult>;
    fn query(&self, sql: &str, args: &[Value]) -> Result<ResultSet>;
}

/// Cooperative cancellation for multi-row operations. Cloning shares the
/// flag; any clone can cancel.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Errors with [`LoamError::Canceled`] once the flag is set. Checked
    /// between rows, so an in-flight row still completes.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(LoamError::Canceled)
        } else {
            Ok(())
        }
    }
}
