//! Selection predicates over stored policy rows.
//!
//! Three predicate kinds are built here, all as a SQL fragment plus a
//! positional parameter list:
//!
//! * exact match — one rule, all six value columns constrained (absent or
//!   empty fields become `IS NULL`), used by single-rule remove/update;
//! * field indexed — equality on a contiguous run of columns starting at a
//!   given index, used by filtered remove/update;
//! * multi value — per-column candidate sets, OR within a column and AND
//!   across columns, used by filtered loads.
//!
//! Logical columns 0..5 map to storage columns through [`VALUE_COLUMNS`],
//! consumed uniformly by every predicate kind.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};
use crate::rule::{self, MAX_VALUES};

/// Storage column names for logical columns 0..5.
pub(crate) const VALUE_COLUMNS: [&str; MAX_VALUES] = ["v0", "v1", "v2", "v3", "v4", "v5"];

/// A multi-valued, per-column selection constraint for partial loads.
///
/// Each non-empty set restricts its column to one of the candidate values;
/// empty sets impose no restriction. Constructed fresh per load call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub ptype: Vec<String>,
    pub v0: Vec<String>,
    pub v1: Vec<String>,
    pub v2: Vec<String>,
    pub v3: Vec<String>,
    pub v4: Vec<String>,
    pub v5: Vec<String>,
}

impl Filter {
    fn columns(&self) -> [(&'static str, &[String]); 1 + MAX_VALUES] {
        [
            ("ptype", &self.ptype),
            (VALUE_COLUMNS[0], &self.v0),
            (VALUE_COLUMNS[1], &self.v1),
            (VALUE_COLUMNS[2], &self.v2),
            (VALUE_COLUMNS[3], &self.v3),
            (VALUE_COLUMNS[4], &self.v4),
            (VALUE_COLUMNS[5], &self.v5),
        ]
    }
}

/// Positional equality constraints bound to consecutive columns starting at
/// `field_index`, used by filtered remove/update. An index outside 0..=5 is
/// rejected at build time; values running past column 5 are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIndexFilter {
    pub ptype: String,
    pub field_index: usize,
    pub values: Vec<String>,
}

/// The filter shapes a load accepts, resolved at the call boundary.
#[derive(Debug, Clone)]
pub enum LoadFilter {
    /// Unconstrained scan; leaves the loaded policy set complete.
    All,
    /// Multi-valued per-column constraints.
    Values(Filter),
    /// Positional equality starting at a column index.
    FieldIndex(FieldIndexFilter),
}

/// A parameterized selection predicate: a SQL condition over the row columns
/// plus the values bound to its placeholders, in order.
#[derive(Debug)]
pub(crate) struct Predicate {
    conditions: Vec<String>,
    pub params: Vec<Value>,
}

impl Predicate {
    fn new() -> Self {
        Self {
            conditions: Vec::new(),
            params: Vec::new(),
        }
    }

    fn equals(&mut self, column: &str, value: &str) {
        self.conditions.push(format!("{column} = ?"));
        self.params.push(Value::Text(value.to_string()));
    }

    fn is_null(&mut self, column: &str) {
        self.conditions.push(format!("{column} is null"));
    }

    fn one_of(&mut self, column: &str, values: &[String]) {
        let placeholders = vec!["?"; values.len()].join(", ");
        self.conditions.push(format!("{column} in ({placeholders})"));
        self.params
            .extend(values.iter().map(|v| Value::Text(v.clone())));
    }

    /// The predicate as a `where` clause, or an empty string when nothing
    /// is constrained.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" where {}", self.conditions.join(" and "))
        }
    }
}

/// Exact-match predicate for one rule: equality on `ptype` plus, for each of
/// the six value columns, equality to the corresponding field or `IS NULL`
/// when that field is absent or empty. Positional and exhaustive.
pub(crate) fn exact_match(ptype: &str, policy_rule: &[String]) -> Predicate {
    let mut predicate = Predicate::new();
    predicate.equals("ptype", ptype);
    for (i, column) in VALUE_COLUMNS.iter().enumerate() {
        match policy_rule.get(i) {
            Some(v) if !v.is_empty() => predicate.equals(column, v),
            _ => predicate.is_null(column),
        }
    }
    predicate
}

/// Field-indexed predicate: equality on `ptype` plus one equality per
/// supplied value on consecutive columns from `field_index`. Empty-string
/// values leave their column unconstrained; values beyond column 5 are
/// silently dropped.
pub(crate) fn field_indexed(
    ptype: &str,
    field_index: usize,
    field_values: &[String],
) -> Result<Predicate> {
    if field_index >= MAX_VALUES {
        return Err(AdapterError::InvalidArgument(format!(
            "field index {field_index} out of range 0..=5"
        )));
    }
    let mut predicate = Predicate::new();
    predicate.equals("ptype", ptype);
    for (i, value) in field_values.iter().enumerate() {
        let Some(column) = VALUE_COLUMNS.get(field_index + i) else {
            break;
        };
        if !value.is_empty() {
            predicate.equals(column, value);
        }
    }
    Ok(predicate)
}

/// Multi-value predicate for a [`Filter`]: membership on every column whose
/// candidate set is non-empty.
pub(crate) fn multi_value(filter: &Filter) -> Predicate {
    let mut predicate = Predicate::new();
    for (column, values) in filter.columns() {
        if !values.is_empty() {
            predicate.one_of(column, values);
        }
    }
    predicate
}

/// Resolves a [`LoadFilter`] into the predicate constraining a load scan,
/// or `None` for an unconstrained scan.
pub(crate) fn for_load(filter: &LoadFilter) -> Result<Option<Predicate>> {
    match filter {
        LoadFilter::All => Ok(None),
        LoadFilter::Values(f) => Ok(Some(multi_value(f))),
        LoadFilter::FieldIndex(f) => {
            Ok(Some(field_indexed(&f.ptype, f.field_index, &f.values)?))
        }
    }
}

/// Parameters setting all six value columns to a rule's fields, absent
/// fields becoming NULL. Used by the update statements ahead of their
/// predicate parameters.
pub(crate) fn assignment_params(policy_rule: &[String]) -> Vec<Value> {
    rule::to_row(policy_rule).into_iter().collect()
}

/// The `set v0 = ?, .., v5 = ?` fragment matching [`assignment_params`].
pub(crate) fn assignment_clause() -> String {
    let assignments: Vec<String> = VALUE_COLUMNS.iter().map(|c| format!("{c} = ?")).collect();
    format!("set {}", assignments.join(", "))
}
