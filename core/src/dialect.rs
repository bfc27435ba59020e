//! Per-backend SQL syntactic policy.
//!
//! A [`Dialect`] only captures the choices that differ between the supported
//! backends: how bound parameters are marked and whether the marker carries a
//! 1-based position. Everything else the query builder emits is common SQL.

use crate::error::{LoamError, Result};

/// Syntactic choices for one database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Driver name this dialect is selected by.
    pub driver: &'static str,
    /// The character used to mark a bound parameter (`?` or `$`).
    pub placeholder_char: char,
    /// If true, the i-th placeholder renders as `<char><i>`, 1-based.
    pub include_index_in_placeholder: bool,
}

/// MySQL: `?`, unnumbered.
pub static MYSQL: Dialect = Dialect {
    driver: "mysql",
    placeholder_char: '?',
    include_index_in_placeholder: false,
};

/// PostgreSQL: `$1`, `$2`, ... in strict left-to-right order.
pub static POSTGRES: Dialect = Dialect {
    driver: "postgres",
    placeholder_char: '$',
    include_index_in_placeholder: true,
};

/// SQLite: `?`, unnumbered.
pub static SQLITE: Dialect = Dialect {
    driver: "sqlite",
    placeholder_char: '?',
    include_index_in_placeholder: false,
};

impl Dialect {
    /// Looks up the dialect for a driver name.
    pub fn for_driver(driver: &str) -> Result<&'static Dialect> {
        match driver {
            "mysql" => Ok(&MYSQL),
            "sqlite" | "sqlite3" => Ok(&SQLITE),
            "postgres" => Ok(&POSTGRES),
            other => Err(LoamError::Configuration(format!(
                "no dialect matched with driver {other}"
            ))),
        }
    }

    /// Renders the placeholder at `index` (1-based).
    pub fn placeholder(&self, index: usize) -> String {
        if self.include_index_in_placeholder {
            format!("{}{}", self.placeholder_char, index)
        } else {
            self.placeholder_char.to_string()
        }
    }

    /// Produces `count` placeholder tokens, numbered consistently with the
    /// bound-argument order.
    pub fn placeholders(&self, count: usize) -> Vec<String> {
        (1..=count).map(|i| self.placeholder(i)).collect()
    }
}
