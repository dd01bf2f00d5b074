//! Batch add/remove operations.
//!
//! `add_policies` is atomic by construction: it issues one multi-row insert
//! statement, so a duplicate anywhere aborts the whole call. `remove_policies`
//! runs one exact-match delete per rule inside a transaction and only fails
//! when the transaction-wide affected total is zero, so a partial match still
//! commits. That asymmetry is deliberate and documented in DESIGN.md.

use rusqlite::params_from_iter;
use tracing::debug;

use crate::adapter::{SqliteAdapter, require_ptype};
use crate::context::OpContext;
use crate::error::{AdapterError, Result};
use crate::filter;
use crate::rule::PolicyLine;

impl SqliteAdapter {
    /// Inserts a batch of rules in a single statement; all or nothing.
    pub fn add_policies(&self, ptype: &str, policy_rules: &[Vec<String>]) -> Result<()> {
        self.add_policies_ctx(&OpContext::background(), ptype, policy_rules)
    }

    pub fn add_policies_ctx(
        &self,
        ctx: &OpContext,
        ptype: &str,
        policy_rules: &[Vec<String>],
    ) -> Result<()> {
        ctx.check()?;
        if policy_rules.is_empty() {
            return Ok(());
        }
        require_ptype(ptype)?;
        let lines: Vec<PolicyLine> = policy_rules
            .iter()
            .map(|values| PolicyLine::new(ptype, values.clone()))
            .collect();
        let connection = self.guard()?;
        let inserted = Self::multi_insert(&connection, self.table(), &lines)?;
        debug!(table = %self.table_name(), rows = inserted, "added policies");
        Ok(())
    }

    /// Deletes a batch of rules inside one transaction. Rules with no match
    /// are skipped; only a transaction-wide total of zero is an error, and
    /// then the transaction is rolled back.
    pub fn remove_policies(&self, ptype: &str, policy_rules: &[Vec<String>]) -> Result<()> {
        self.remove_policies_ctx(&OpContext::background(), ptype, policy_rules)
    }

    pub fn remove_policies_ctx(
        &self,
        ctx: &OpContext,
        ptype: &str,
        policy_rules: &[Vec<String>],
    ) -> Result<()> {
        ctx.check()?;
        if policy_rules.is_empty() {
            return Ok(());
        }
        let mut connection = self.guard()?;
        let tx = connection
            .transaction()
            .map_err(|e| AdapterError::Transaction(e.to_string()))?;
        let mut total = 0usize;
        for policy_rule in policy_rules {
            // A cancelled context returns early here and drops the
            // transaction, rolling back what was deleted so far.
            ctx.check()?;
            let predicate = filter::exact_match(ptype, policy_rule);
            let sql = format!("delete from {}{}", self.table(), predicate.where_clause());
            total += tx.execute(&sql, params_from_iter(predicate.params))?;
        }
        if total == 0 {
            tx.rollback()
                .map_err(|e| AdapterError::Transaction(e.to_string()))?;
            return Err(AdapterError::NotFound("no policies matched the batch".into()));
        }
        tx.commit()
            .map_err(|e| AdapterError::Transaction(e.to_string()))?;
        debug!(table = %self.table_name(), rows = total, "removed policies");
        Ok(())
    }
}
