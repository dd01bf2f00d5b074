//! Update operations, including the filtered replace used for undo/audit.
//!
//! `update_policies` is strictly all-or-nothing: any pair whose old rule
//! matches no row aborts and rolls back the whole batch.
//! `update_filtered_policies` runs select, delete and insert against the
//! same predicate inside one transaction and hands the replaced rules back
//! to the caller.

use rusqlite::params_from_iter;
use tracing::debug;

use crate::adapter::{SqliteAdapter, require_ptype};
use crate::context::OpContext;
use crate::error::{AdapterError, Result};
use crate::filter::{self, Predicate};
use crate::rule::{self, MAX_VALUES, PolicyLine};

impl SqliteAdapter {
    /// Rewrites one rule in place: matches `old_rule` exactly and sets all
    /// six value columns to `new_rule`'s fields, absent fields to NULL.
    pub fn update_policy(
        &self,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> Result<()> {
        self.update_policy_ctx(&OpContext::background(), ptype, old_rule, new_rule)
    }

    pub fn update_policy_ctx(
        &self,
        ctx: &OpContext,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> Result<()> {
        ctx.check()?;
        require_ptype(ptype)?;
        let connection = self.guard()?;
        let affected = update_one(&connection, self.table(), ptype, old_rule, new_rule)?;
        if affected == 0 {
            return Err(AdapterError::NotFound(
                PolicyLine::new(ptype, old_rule.to_vec()).to_string(),
            ));
        }
        Ok(())
    }

    /// Rewrites a batch of rules pairwise inside one transaction. The input
    /// slices must have equal length; any pair without a match aborts and
    /// rolls back the whole batch.
    pub fn update_policies(
        &self,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> Result<()> {
        self.update_policies_ctx(&OpContext::background(), ptype, old_rules, new_rules)
    }

    pub fn update_policies_ctx(
        &self,
        ctx: &OpContext,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> Result<()> {
        ctx.check()?;
        if old_rules.len() != new_rules.len() {
            return Err(AdapterError::InvalidArgument(format!(
                "old and new rules must have the same length ({} vs {})",
                old_rules.len(),
                new_rules.len(),
            )));
        }
        if old_rules.is_empty() {
            return Ok(());
        }
        require_ptype(ptype)?;
        let mut connection = self.guard()?;
        let tx = connection
            .transaction()
            .map_err(|e| AdapterError::Transaction(e.to_string()))?;
        for (old_rule, new_rule) in old_rules.iter().zip(new_rules) {
            ctx.check()?;
            let affected = update_one(&tx, self.table(), ptype, old_rule, new_rule)?;
            if affected == 0 {
                // Dropping the transaction rolls back the pairs already
                // applied, restoring pre-call state exactly.
                return Err(AdapterError::NotFound(
                    PolicyLine::new(ptype, old_rule.to_vec()).to_string(),
                ));
            }
        }
        tx.commit()
            .map_err(|e| AdapterError::Transaction(e.to_string()))?;
        debug!(table = %self.table_name(), rows = old_rules.len(), "updated policies");
        Ok(())
    }

    /// Replaces every rule matching a field-indexed filter with `new_rules`,
    /// in one transaction, and returns the replaced rules (value fields
    /// only). A filter matching nothing is not an error: the replaced set is
    /// empty and `new_rules` are still inserted.
    pub fn update_filtered_policies(
        &self,
        ptype: &str,
        new_rules: &[Vec<String>],
        field_index: usize,
        field_values: &[String],
    ) -> Result<Vec<Vec<String>>> {
        self.update_filtered_policies_ctx(
            &OpContext::background(),
            ptype,
            new_rules,
            field_index,
            field_values,
        )
    }

    pub fn update_filtered_policies_ctx(
        &self,
        ctx: &OpContext,
        ptype: &str,
        new_rules: &[Vec<String>],
        field_index: usize,
        field_values: &[String],
    ) -> Result<Vec<Vec<String>>> {
        ctx.check()?;
        require_ptype(ptype)?;
        let predicate = filter::field_indexed(ptype, field_index, field_values)?;
        let mut connection = self.guard()?;
        let tx = connection
            .transaction()
            .map_err(|e| AdapterError::Transaction(e.to_string()))?;

        let replaced = select_rules(&tx, self.table(), &predicate)?;
        ctx.check()?;

        let sql = format!("delete from {}{}", self.table(), predicate.where_clause());
        tx.execute(&sql, params_from_iter(predicate.params))?;

        if !new_rules.is_empty() {
            let lines: Vec<PolicyLine> = new_rules
                .iter()
                .map(|values| PolicyLine::new(ptype, values.clone()))
                .collect();
            Self::multi_insert(&tx, self.table(), &lines)?;
        }

        tx.commit()
            .map_err(|e| AdapterError::Transaction(e.to_string()))?;
        debug!(
            table = %self.table_name(),
            replaced = replaced.len(),
            inserted = new_rules.len(),
            "replaced filtered policies"
        );
        Ok(replaced)
    }
}

/// One update statement matching `old_rule` exactly and assigning all six
/// value columns from `new_rule`.
fn update_one(
    connection: &rusqlite::Connection,
    table: &str,
    ptype: &str,
    old_rule: &[String],
    new_rule: &[String],
) -> Result<usize> {
    let predicate = filter::exact_match(ptype, old_rule);
    let sql = format!(
        "update {table} {}{}",
        filter::assignment_clause(),
        predicate.where_clause(),
    );
    let mut params = filter::assignment_params(new_rule);
    params.extend(predicate.params);
    Ok(connection.execute(&sql, params_from_iter(params))?)
}

/// Decodes the value fields of every row matching the predicate, in row
/// order.
fn select_rules(
    connection: &rusqlite::Connection,
    table: &str,
    predicate: &Predicate,
) -> Result<Vec<Vec<String>>> {
    let sql = format!(
        "select v0, v1, v2, v3, v4, v5 from {table}{} order by id",
        predicate.where_clause(),
    );
    let mut statement = connection.prepare(&sql)?;
    let mut rows = statement.query(params_from_iter(predicate.params.clone()))?;
    let mut rules = Vec::new();
    while let Some(row) = rows.next()? {
        let mut columns: [Option<String>; MAX_VALUES] = Default::default();
        for (i, column) in columns.iter_mut().enumerate() {
            *column = row.get(i)?;
        }
        rules.push(rule::from_row(columns));
    }
    Ok(rules)
}
