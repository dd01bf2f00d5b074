//! The in-memory policy model boundary.
//!
//! The policy engine owns the real model; the adapter only needs to feed
//! loaded lines into it and enumerate its lines on a bulk save. That seam
//! is the [`PolicyModel`] trait. [`MemoryModel`] is a plain implementation
//! used by tests and by callers without an engine of their own.

use crate::rule::PolicyLine;

/// What the adapter requires of the policy model it loads into and saves
/// from.
pub trait PolicyModel {
    /// Receives one decoded line during a load, in row order.
    fn add_line(&mut self, line: PolicyLine);
    /// Enumerates every line to persist on a bulk save.
    fn lines(&self) -> Vec<PolicyLine>;
}

/// A policy model that is nothing but the list of its lines.
#[derive(Debug, Clone, Default)]
pub struct MemoryModel {
    lines: Vec<PolicyLine>,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn contains(&self, ptype: &str, values: &[&str]) -> bool {
        self.lines
            .iter()
            .any(|line| line.ptype() == ptype && line.values() == values)
    }

    /// The value fields of every line with the given type tag.
    pub fn policies(&self, ptype: &str) -> Vec<Vec<String>> {
        self.lines
            .iter()
            .filter(|line| line.ptype() == ptype)
            .map(|line| line.values().to_vec())
            .collect()
    }
}

impl PolicyModel for MemoryModel {
    fn add_line(&mut self, line: PolicyLine) {
        self.lines.push(line);
    }

    fn lines(&self) -> Vec<PolicyLine> {
        self.lines.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_keeps_lines_in_order() {
        let mut model = MemoryModel::new();
        model.add_line(PolicyLine::new("p", vec!["alice".into(), "data1".into()]));
        model.add_line(PolicyLine::new("g", vec!["alice".into(), "admin".into()]));
        assert_eq!(model.len(), 2);
        assert!(model.contains("p", &["alice", "data1"]));
        assert!(model.contains("g", &["alice", "admin"]));
        assert_eq!(model.policies("p"), vec![vec!["alice", "data1"]]);
    }
}
