//! SQLite statement preparation and execution.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use rusqlite::Connection;
use tracing::{debug, instrument};

use quarry_query::{
    coerce_record, compile, from_clause, order_by_clause, select_columns, Coercer, CompiledCondition,
    Condition, HandlerRegistry, OrderByField, Record, Value,
};
use quarry_schema::{DialectConfig, EntityDescriptor, FieldDescriptor, QuarryConfig, ViewDescriptor};

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};
use crate::row::RowReader;
use crate::types::StatementBinder;

/// A fetched row keyed by logical field name.
pub type SqliteRow = IndexMap<String, Value>;

/// SQLite query engine.
///
/// Conditions are compiled with the SQLite dialect, literals are bound
/// through each field's value handler and columns are extracted the same
/// way, so fetched rows carry the declared field types.
pub struct SqliteEngine {
    conn: Connection,
    config: SqliteConfig,
    dialect: DialectConfig,
    coercer: Coercer,
}

impl std::fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEngine")
            .field("path", &self.config.path_str())
            .field("dialect", &self.dialect)
            .finish()
    }
}

impl SqliteEngine {
    /// Open a database and apply the configured pragmas.
    #[instrument(skip(config), fields(path = config.path_str()))]
    pub fn open(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = if config.path.is_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(config.path_str())?
        };

        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        conn.pragma_update(None, "case_sensitive_like", config.case_sensitive_like)?;
        if let Some(ms) = config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(u64::from(ms)))?;
        }
        if let Some(mode) = config.journal_mode {
            let applied: String =
                conn.pragma_update_and_check(None, "journal_mode", mode.as_pragma(), |row| row.get(0))?;
            debug!(requested = mode.as_pragma(), applied = %applied, "Set journal mode");
        }
        if let Some(mode) = config.synchronous {
            conn.pragma_update(None, "synchronous", mode.as_pragma())?;
        }

        debug!("Opened SQLite database");
        Ok(Self {
            conn,
            config,
            dialect: DialectConfig::sqlite(),
            coercer: Coercer::new(),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> SqliteResult<Self> {
        Self::open(SqliteConfig::memory())
    }

    /// Take the dialect policies and coercion defaults from a configuration.
    ///
    /// Placeholder style, null-safe equality and nulls ordering stay fixed
    /// to what SQLite supports.
    pub fn configure(mut self, config: &QuarryConfig) -> SqliteResult<Self> {
        self.dialect.type_mismatch = config.dialect.type_mismatch;
        self.dialect.null_safe_negation = config.dialect.null_safe_negation;
        self.dialect.alias_view_columns = config.dialect.alias_view_columns;
        self.dialect.join_style = config.dialect.join_style;
        if self.dialect.join_style.is_theta() {
            return Err(SqliteError::config("SQLite supports only ANSI join styles"));
        }
        self.coercer = Coercer::from_config(&config.coercion)?;
        Ok(self)
    }

    /// The connection configuration.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// The dialect conditions are compiled with.
    pub fn dialect(&self) -> &DialectConfig {
        &self.dialect
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run one or more statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> SqliteResult<()> {
        debug!(sql = %sql, "Executing batch");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Create the entity's table if it does not exist.
    #[instrument(skip(self, entity), fields(entity = entity.name()))]
    pub fn create_table(&self, entity: &EntityDescriptor) -> SqliteResult<()> {
        self.execute_batch(&create_table_sql(entity))
    }

    /// Insert one record, coercing its fields to their declared types.
    ///
    /// Returns the number of rows inserted.
    #[instrument(skip(self, entity, record), fields(entity = entity.name()))]
    pub fn insert(&self, entity: &EntityDescriptor, record: &dyn Record) -> SqliteResult<usize> {
        insert_into(&self.conn, entity, record, &self.coercer)
    }

    /// Insert many records in one transaction.
    #[instrument(skip(self, entity, records), fields(entity = entity.name(), count = records.len()))]
    pub fn insert_all<R: Record>(&self, entity: &EntityDescriptor, records: &[R]) -> SqliteResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        for record in records {
            inserted += insert_into(&tx, entity, record, &self.coercer)?;
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Fetch the entity's rows matching `condition`.
    #[instrument(skip(self, entity, condition, order_by), fields(entity = entity.name()))]
    pub fn find(
        &self,
        entity: &EntityDescriptor,
        condition: &Condition,
        order_by: &[OrderByField],
    ) -> SqliteResult<Vec<SqliteRow>> {
        let compiled = compile(condition, entity, &self.dialect)?;
        let columns = entity.fields().map(|f| f.column()).collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT {} FROM {}{}{}",
            columns,
            entity.table_name(),
            compiled.where_clause(),
            order_by_clause(order_by, entity, &self.dialect)?
        );
        let fields: Vec<(String, Arc<FieldDescriptor>)> = entity
            .fields()
            .map(|f| (f.name().to_string(), Arc::clone(f)))
            .collect();
        self.query(&sql, &compiled, &fields)
    }

    /// Fetch the first matching row.
    pub fn find_first(
        &self,
        entity: &EntityDescriptor,
        condition: &Condition,
        order_by: &[OrderByField],
    ) -> SqliteResult<Option<SqliteRow>> {
        Ok(self.find(entity, condition, order_by)?.into_iter().next())
    }

    /// Count the entity's rows matching `condition`.
    #[instrument(skip(self, entity, condition), fields(entity = entity.name()))]
    pub fn count(&self, entity: &EntityDescriptor, condition: &Condition) -> SqliteResult<u64> {
        let compiled = compile(condition, entity, &self.dialect)?;
        let sql = format!("SELECT COUNT(*) FROM {}{}", entity.table_name(), compiled.where_clause());
        debug!(sql = %sql, params = compiled.params.len(), "Executing count");

        let mut stmt = self.conn.prepare(&sql)?;
        compiled.bind_all(&mut StatementBinder::new(&mut stmt))?;
        let mut rows = stmt.raw_query();
        let count: i64 = match rows.next()? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Fetch rows of a view; keys are the view's field aliases.
    #[instrument(skip(self, view, condition, order_by), fields(view = view.name()))]
    pub fn find_view(
        &self,
        view: &ViewDescriptor,
        condition: &Condition,
        order_by: &[OrderByField],
    ) -> SqliteResult<Vec<SqliteRow>> {
        let from = from_clause(view, &self.dialect)?;
        let compiled = compile(condition, view, &self.dialect)?;
        let predicate = from.combine_where(&compiled.sql);

        let mut sql = format!("SELECT {} FROM {}", select_columns(view, &self.dialect), from.sql);
        if !predicate.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }
        sql.push_str(&order_by_clause(order_by, view, &self.dialect)?);

        let fields: Vec<(String, Arc<FieldDescriptor>)> = view
            .aliases()
            .map(|alias| (alias.name.to_string(), Arc::clone(&alias.field)))
            .collect();
        self.query(&sql, &compiled, &fields)
    }

    fn query(
        &self,
        sql: &str,
        compiled: &CompiledCondition,
        fields: &[(String, Arc<FieldDescriptor>)],
    ) -> SqliteResult<Vec<SqliteRow>> {
        debug!(sql = %sql, params = compiled.params.len(), "Executing query");

        let mut stmt = self.conn.prepare(sql)?;
        compiled.bind_all(&mut StatementBinder::new(&mut stmt))?;

        let registry = HandlerRegistry::global();
        let handlers: Vec<_> = fields.iter().map(|(_, field)| registry.for_field(field)).collect();

        let mut results = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let reader = RowReader::new(row);
            let mut record = IndexMap::with_capacity(fields.len());
            for (index, ((name, field), handler)) in fields.iter().zip(&handlers).enumerate() {
                let value = handler
                    .extract(&reader, index)
                    .map_err(|e| e.with_field(field.name()))?;
                record.insert(name.clone(), value);
            }
            results.push(record);
        }
        debug!(rows = results.len(), "Query complete");
        Ok(results)
    }
}

fn create_table_sql(entity: &EntityDescriptor) -> String {
    let mut columns: Vec<String> = entity
        .fields()
        .map(|field| {
            let mut column = format!("{} {}", field.column(), field.sql_type());
            if field.not_null || field.is_pk {
                column.push_str(" NOT NULL");
            }
            column
        })
        .collect();

    let pk: Vec<&str> = entity.pk_fields().into_iter().map(|f| f.column()).collect();
    if !pk.is_empty() {
        columns.push(format!("PRIMARY KEY ({})", pk.join(", ")));
    }

    format!("CREATE TABLE IF NOT EXISTS {} ({})", entity.table_name(), columns.join(", "))
}

fn insert_into(
    conn: &Connection,
    entity: &EntityDescriptor,
    record: &dyn Record,
    coercer: &Coercer,
) -> SqliteResult<usize> {
    let typed = coerce_record(entity, record, coercer)?;

    let mut columns = Vec::with_capacity(typed.len());
    let mut bound = Vec::with_capacity(typed.len());
    for (name, value) in &typed {
        let Some(field) = entity.field(name) else {
            continue;
        };
        columns.push(field.column());
        bound.push((field, value));
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", entity.table_name())
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            entity.table_name(),
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        )
    };
    debug!(sql = %sql, params = bound.len(), "Executing insert");

    let mut stmt = conn.prepare_cached(&sql)?;
    {
        let mut binder = StatementBinder::new(&mut stmt);
        let registry = HandlerRegistry::global();
        for (offset, (field, value)) in bound.iter().enumerate() {
            registry
                .for_field(field)
                .bind(&mut binder, offset + 1, value)
                .map_err(|e| e.with_entity(entity.name()).with_field(field.name()))?;
        }
    }
    Ok(stmt.raw_execute()?)
}
