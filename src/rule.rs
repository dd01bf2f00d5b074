//! Conversion between in-memory policy lines and the fixed-width row shape
//! `(ptype, v0..v5)` used by the storage layer.

use rusqlite::types::Value;

/// Number of value columns in a stored row (`v0` through `v5`).
pub const MAX_VALUES: usize = 6;

/// One policy statement: a type tag plus its ordered value fields.
///
/// `ptype` is mandatory and non-empty (e.g. `"p"` for a permission rule,
/// `"g"` for a role-grouping rule). Up to [`MAX_VALUES`] values follow.
/// An empty-string value is treated the same as an absent value when the
/// line is persisted, so a round trip through storage collapses `""` into
/// absence. Reads only ever reconstruct present values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyLine {
    ptype: String,
    values: Vec<String>,
}

impl PolicyLine {
    pub fn new<P: Into<String>>(ptype: P, values: Vec<String>) -> Self {
        Self {
            ptype: ptype.into(),
            values,
        }
    }

    pub fn ptype(&self) -> &str {
        &self.ptype
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The full line as the policy engine sees it: `[ptype, f0, f1, ..]`.
    pub fn to_vec(&self) -> Vec<String> {
        let mut line = Vec::with_capacity(1 + self.values.len());
        line.push(self.ptype.clone());
        line.extend(self.values.iter().cloned());
        line
    }
}

impl std::fmt::Display for PolicyLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_vec().join(", "))
    }
}

/// Maps rule fields 0..5 to the six value columns, writing NULL for indices
/// beyond the rule's length and for empty-string fields.
pub fn to_row(rule: &[String]) -> [Value; MAX_VALUES] {
    std::array::from_fn(|i| match rule.get(i) {
        Some(v) if !v.is_empty() => Value::Text(v.clone()),
        _ => Value::Null,
    })
}

/// Reconstructs the value fields from a stored row, emitting only the
/// columns that are present. Absent columns are omitted, never turned back
/// into empty strings.
pub fn from_row(columns: [Option<String>; MAX_VALUES]) -> Vec<String> {
    columns.into_iter().flatten().collect()
}
