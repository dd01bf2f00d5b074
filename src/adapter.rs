//! The adapter itself: single-rule mutations and the filtered loader.
//!
//! [`SqliteAdapter`] owns the backing connection behind a `Mutex` and the
//! filtered flag behind a `RwLock`. Batch and update operations live in the
//! [`crate::batch`] and [`crate::updatable`] modules; everything shares the
//! predicate builders in [`crate::filter`] and the row codec in
//! [`crate::rule`].

use std::sync::{Mutex, MutexGuard, RwLock};

use rusqlite::{Connection, params_from_iter};
use rusqlite::types::Value;
use tracing::debug;

use crate::context::OpContext;
use crate::error::{AdapterError, Result, is_unique_violation};
use crate::filter::{self, LoadFilter};
use crate::model::PolicyModel;
use crate::rule::{self, MAX_VALUES, PolicyLine};
use crate::schema;
use crate::settings::Settings;

/// SQLite-backed persistence adapter for policy rules.
pub struct SqliteAdapter {
    connection: Mutex<Connection>,
    /// Quoted table identifier, safe to interpolate into statements.
    table: String,
    table_name: String,
    /// True when the most recent load used a filter, so the in-memory
    /// policy set is a partial view.
    filtered: RwLock<bool>,
}

impl SqliteAdapter {
    /// Opens the database named by the settings and bootstraps the schema.
    pub fn new(settings: &Settings) -> Result<Self> {
        let connection = Connection::open(&settings.database)?;
        Self::with_connection(connection, &settings.table_name)
    }

    /// Wraps an existing connection, bootstrapping the schema in it.
    pub fn with_connection(connection: Connection, table_name: &str) -> Result<Self> {
        schema::bootstrap(&connection, table_name)?;
        Ok(Self {
            connection: Mutex::new(connection),
            table: schema::quote_identifier(table_name),
            table_name: table_name.to_string(),
            filtered: RwLock::new(false),
        })
    }

    /// An adapter over an in-memory database, for tests and scratch use.
    pub fn open_in_memory(table_name: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub(crate) fn table(&self) -> &str {
        &self.table
    }

    pub(crate) fn guard(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| AdapterError::Lock(e.to_string()))
    }

    /// True when the in-memory policy set came from a filtered load.
    pub fn is_filtered(&self) -> bool {
        self.filtered.read().map(|f| *f).unwrap_or_else(|e| *e.into_inner())
    }

    /// Contract parity for the context-accepting surface; reading the flag
    /// never blocks on the backing store.
    pub fn is_filtered_ctx(&self, _ctx: &OpContext) -> bool {
        self.is_filtered()
    }

    fn set_filtered(&self, value: bool) {
        // Exclusive lock only around the flag write, never around a scan.
        match self.filtered.write() {
            Ok(mut f) => *f = value,
            Err(e) => *e.into_inner() = value,
        }
    }

    /// Loads every policy rule into the model, in row order.
    pub fn load_policy(&self, model: &mut dyn PolicyModel) -> Result<()> {
        self.load_policy_ctx(&OpContext::background(), model)
    }

    pub fn load_policy_ctx(&self, ctx: &OpContext, model: &mut dyn PolicyModel) -> Result<()> {
        self.load_filtered_policy_ctx(ctx, model, &LoadFilter::All)
    }

    /// Loads only the policy rules matching the filter into the model.
    pub fn load_filtered_policy(
        &self,
        model: &mut dyn PolicyModel,
        load_filter: &LoadFilter,
    ) -> Result<()> {
        self.load_filtered_policy_ctx(&OpContext::background(), model, load_filter)
    }

    pub fn load_filtered_policy_ctx(
        &self,
        ctx: &OpContext,
        model: &mut dyn PolicyModel,
        load_filter: &LoadFilter,
    ) -> Result<()> {
        ctx.check()?;
        let predicate = filter::for_load(load_filter)?;
        self.set_filtered(!matches!(load_filter, LoadFilter::All));

        let (where_clause, params) = match predicate {
            Some(p) => (p.where_clause(), p.params),
            None => (String::new(), Vec::new()),
        };
        let sql = format!(
            "select ptype, v0, v1, v2, v3, v4, v5 from {}{} order by id",
            self.table, where_clause,
        );

        let connection = self.guard()?;
        let mut statement = connection.prepare(&sql)?;
        let mut rows = statement.query(params_from_iter(params))?;
        let mut loaded = 0usize;
        while let Some(row) = rows.next()? {
            let ptype: String = row.get(0)?;
            let mut columns: [Option<String>; MAX_VALUES] = Default::default();
            for (i, column) in columns.iter_mut().enumerate() {
                *column = row.get(1 + i)?;
            }
            model.add_line(PolicyLine::new(ptype, rule::from_row(columns)));
            loaded += 1;
        }
        debug!(table = %self.table_name, rows = loaded, "loaded policy rules");
        Ok(())
    }

    /// Replaces the entire stored policy set with the model's lines, in one
    /// transaction. A failed insert rolls the clearing back too.
    pub fn save_policy(&self, model: &dyn PolicyModel) -> Result<()> {
        self.save_policy_ctx(&OpContext::background(), model)
    }

    pub fn save_policy_ctx(&self, ctx: &OpContext, model: &dyn PolicyModel) -> Result<()> {
        ctx.check()?;
        let lines = model.lines();
        let mut connection = self.guard()?;
        let tx = connection
            .transaction()
            .map_err(|e| AdapterError::Transaction(e.to_string()))?;
        tx.execute(&format!("delete from {}", self.table), [])?;
        ctx.check()?;
        if !lines.is_empty() {
            Self::multi_insert(&tx, &self.table, &lines)?;
        }
        tx.commit()
            .map_err(|e| AdapterError::Transaction(e.to_string()))?;
        debug!(table = %self.table_name, rows = lines.len(), "saved policy set");
        Ok(())
    }

    /// Inserts one policy rule.
    pub fn add_policy(&self, ptype: &str, policy_rule: &[String]) -> Result<()> {
        self.add_policy_ctx(&OpContext::background(), ptype, policy_rule)
    }

    pub fn add_policy_ctx(
        &self,
        ctx: &OpContext,
        ptype: &str,
        policy_rule: &[String],
    ) -> Result<()> {
        ctx.check()?;
        require_ptype(ptype)?;
        let mut params: Vec<Value> = Vec::with_capacity(1 + MAX_VALUES);
        params.push(Value::Text(ptype.to_string()));
        params.extend(rule::to_row(policy_rule));
        let sql = format!(
            "insert into {} (ptype, v0, v1, v2, v3, v4, v5) values (?, ?, ?, ?, ?, ?, ?)",
            self.table,
        );
        let connection = self.guard()?;
        match connection.execute(&sql, params_from_iter(params)) {
            Ok(0) => Err(AdapterError::NoEffect("insert affected no rows".into())),
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AdapterError::AlreadyExists(
                PolicyLine::new(ptype, policy_rule.to_vec()).to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the rows matching one rule exactly, absent fields included.
    pub fn remove_policy(&self, ptype: &str, policy_rule: &[String]) -> Result<()> {
        self.remove_policy_ctx(&OpContext::background(), ptype, policy_rule)
    }

    pub fn remove_policy_ctx(
        &self,
        ctx: &OpContext,
        ptype: &str,
        policy_rule: &[String],
    ) -> Result<()> {
        ctx.check()?;
        let predicate = filter::exact_match(ptype, policy_rule);
        let sql = format!("delete from {}{}", self.table, predicate.where_clause());
        let connection = self.guard()?;
        let affected = connection.execute(&sql, params_from_iter(predicate.params))?;
        if affected == 0 {
            return Err(AdapterError::NotFound(
                PolicyLine::new(ptype, policy_rule.to_vec()).to_string(),
            ));
        }
        Ok(())
    }

    /// Removes the rows matching a field-indexed filter.
    pub fn remove_filtered_policy(
        &self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<()> {
        self.remove_filtered_policy_ctx(
            &OpContext::background(),
            ptype,
            field_index,
            field_values,
        )
    }

    pub fn remove_filtered_policy_ctx(
        &self,
        ctx: &OpContext,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<()> {
        ctx.check()?;
        let predicate = filter::field_indexed(ptype, field_index, field_values)?;
        let sql = format!("delete from {}{}", self.table, predicate.where_clause());
        let connection = self.guard()?;
        let affected = connection.execute(&sql, params_from_iter(predicate.params))?;
        if affected == 0 {
            return Err(AdapterError::NotFound("no matching policies".into()));
        }
        debug!(table = %self.table_name, rows = affected, "removed filtered policies");
        Ok(())
    }

    /// One multi-row insert statement for a set of lines, so a uniqueness
    /// violation on any row leaves none of them persisted.
    pub(crate) fn multi_insert(
        connection: &Connection,
        table: &str,
        lines: &[PolicyLine],
    ) -> Result<usize> {
        let group = "(?, ?, ?, ?, ?, ?, ?)";
        let groups = vec![group; lines.len()].join(", ");
        let sql = format!(
            "insert into {table} (ptype, v0, v1, v2, v3, v4, v5) values {groups}",
        );
        let mut params: Vec<Value> = Vec::with_capacity(lines.len() * (1 + MAX_VALUES));
        for line in lines {
            params.push(Value::Text(line.ptype().to_string()));
            params.extend(rule::to_row(line.values()));
        }
        match connection.execute(&sql, params_from_iter(params)) {
            Ok(affected) => Ok(affected),
            Err(e) if is_unique_violation(&e) => Err(AdapterError::AlreadyExists(
                "one or more policies already exist".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

pub(crate) fn require_ptype(ptype: &str) -> Result<()> {
    if ptype.is_empty() {
        return Err(AdapterError::InvalidArgument("ptype must not be empty".into()));
    }
    Ok(())
}
