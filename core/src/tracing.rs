//! Tracing utilities for query observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]`
//! boilerplate at every call site.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// loam_trace_query!(&sql, args.len());
/// ```
#[macro_export]
macro_rules! loam_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "loam.query");
    };
}

/// Emit a debug-level tracing event when an entity schema is registered.
///
/// ```ignore
/// loam_trace_schema!(&schema.table, &schema.connection);
/// ```
#[macro_export]
macro_rules! loam_trace_schema {
    ($table:expr, $connection:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(table = %$table, connection = %$connection, "loam.schema");
    };
}
