//! Connection registry and startup configuration.
//!
//! [`initialize`] consumes a list of [`ConnectionConfig`]s, opens (or
//! accepts) one driver per connection, builds the schema for every entity
//! registered on it and publishes the result in a process-wide registry.
//! Entities find their connection by the name their configurator declared,
//! falling back to the sole connection when only one exists.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, RwLock};

use loam_core::{
    loam_trace_query, loam_trace_schema, Dialect, Driver, Entity, ExecResult, LoamError, ResultSet,
    Schema, Value,
};

use crate::Result;

static CONNECTIONS: LazyLock<RwLock<HashMap<String, Arc<Connection>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A named connection: one driver handle plus the schemas of every entity
/// registered on it.
pub struct Connection {
    name: String,
    dialect: &'static Dialect,
    driver: Mutex<Box<dyn Driver>>,
    schemas: HashMap<String, Arc<Schema>>,
}

impl Connection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> &'static Dialect {
        self.dialect
    }

    /// The schema registered for `table`.
    pub fn schema(&self, table: &str) -> Result<Arc<Schema>> {
        self.schemas.get(table).cloned().ok_or_else(|| {
            LoamError::Configuration(format!(
                "no entity registered for table {table} on connection {}",
                self.name
            ))
        })
    }

    fn driver(&self) -> MutexGuard<'_, Box<dyn Driver>> {
        self.driver.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        loam_trace_query!(sql, args.len());
        self.driver().execute(sql, args)
    }

    pub fn query(&self, sql: &str, args: &[Value]) -> Result<ResultSet> {
        loam_trace_query!(sql, args.len());
        self.driver().query(sql, args)
    }
}

/// Startup description of one connection.
pub struct ConnectionConfig {
    name: String,
    driver_name: Option<String>,
    dsn: Option<String>,
    database: Option<(Box<dyn Driver>, &'static Dialect)>,
    registrars: Vec<fn(&'static Dialect) -> loam_core::Result<Schema>>,
}

impl ConnectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        ConnectionConfig {
            name: name.into(),
            driver_name: None,
            dsn: None,
            database: None,
            registrars: Vec::new(),
        }
    }

    /// Opens the connection from a driver name and source string. Only the
    /// bundled `sqlite` adapter can be opened this way; other backends take
    /// a preconfigured handle via [`ConnectionConfig::database`].
    pub fn driver(mut self, driver: impl Into<String>, dsn: impl Into<String>) -> Self {
        self.driver_name = Some(driver.into());
        self.dsn = Some(dsn.into());
        self
    }

    /// Uses an already opened driver handle.
    pub fn database(mut self, driver: Box<dyn Driver>, dialect: &'static Dialect) -> Self {
        self.database = Some((driver, dialect));
        self
    }

    /// Registers an entity on this connection.
    pub fn entity<E: Entity>(mut self) -> Self {
        self.registrars.push(Schema::build::<E>);
        self
    }
}

fn open_driver(name: &str, dsn: &str) -> Result<(Box<dyn Driver>, &'static Dialect)> {
    match name {
        #[cfg(feature = "rusqlite")]
        "sqlite" | "sqlite3" => {
            let conn = rusqlite::Connection::open(dsn)?;
            Ok((Box::new(conn), &loam_core::SQLITE))
        }
        #[cfg(not(feature = "rusqlite"))]
        "sqlite" | "sqlite3" => Err(LoamError::Configuration(
            "sqlite support requires the rusqlite feature".into(),
        )),
        "postgres" | "mysql" => Err(LoamError::Configuration(format!(
            "no bundled adapter for {name}; pass a preconfigured database"
        ))),
        other => {
            Dialect::for_driver(other)?;
            Err(LoamError::Configuration(format!(
                "no bundled adapter for {other}"
            )))
        }
    }
}

/// Opens every configured connection, builds its entity schemas and
/// publishes them. Replaces any previously registered connection of the
/// same name.
pub fn initialize(configs: Vec<ConnectionConfig>) -> Result<()> {
    let mut opened = Vec::with_capacity(configs.len());
    for config in configs {
        let (driver, dialect) = match config.database {
            Some(pair) => pair,
            None => {
                let name = config.driver_name.as_deref().ok_or_else(|| {
                    LoamError::Configuration(format!(
                        "connection {} has neither a driver nor a database",
                        config.name
                    ))
                })?;
                open_driver(name, config.dsn.as_deref().unwrap_or_default())?
            }
        };

        let mut schemas = HashMap::new();
        for registrar in &config.registrars {
            let mut schema = registrar(dialect)?;
            if schema.connection.is_empty() {
                schema.connection = config.name.clone();
            } else if schema.connection != config.name {
                return Err(LoamError::Configuration(format!(
                    "entity for table {} declares connection {} but was registered on {}",
                    schema.table, schema.connection, config.name
                )));
            }
            loam_trace_schema!(&schema.table, &schema.connection);
            schemas.insert(schema.table.clone(), Arc::new(schema));
        }

        opened.push(Arc::new(Connection {
            name: config.name,
            dialect,
            driver: Mutex::new(driver),
            schemas,
        }));
    }

    let mut registry = CONNECTIONS.write().unwrap_or_else(|e| e.into_inner());
    for conn in opened {
        registry.insert(conn.name.clone(), conn);
    }
    Ok(())
}

/// Looks up a registered connection by name.
pub fn connection(name: &str) -> Result<Arc<Connection>> {
    let registry = CONNECTIONS.read().unwrap_or_else(|e| e.into_inner());
    registry
        .get(name)
        .cloned()
        .ok_or_else(|| LoamError::Configuration(format!("no connection named {name}")))
}

/// Resolves the connection and schema for an entity type. An entity that
/// names no connection binds to the sole registered one, or to `default`
/// when several exist.
pub(crate) fn schema_for<E: Entity>() -> Result<(Arc<Connection>, Arc<Schema>)> {
    let entity = loam_core::probe::<E>()?;
    let conn = match &entity.connection {
        Some(name) => connection(name)?,
        None => {
            let registry = CONNECTIONS.read().unwrap_or_else(|e| e.into_inner());
            if registry.len() == 1 {
                registry.values().next().cloned().ok_or(LoamError::Configuration(
                    "no connections registered".into(),
                ))?
            } else {
                registry.get("default").cloned().ok_or_else(|| {
                    LoamError::Configuration(format!(
                        "entity for table {} names no connection and no default exists",
                        entity.table
                    ))
                })?
            }
        }
    };
    let schema = conn.schema(&entity.table)?;
    Ok((conn, schema))
}
