//! Polistore – a SQLite persistence adapter for policy-enforcement engines.
//!
//! The adapter is the engine's sole source of truth for policy rules
//! (ACL/RBAC/ABAC statements). The engine bulk-loads rules at startup,
//! bulk-saves them on demand, and applies incremental add/remove/update
//! operations as policies change at runtime. Rules are stored one per row
//! in a table `(id, ptype, v0..v5)` with a uniqueness constraint over
//! `(ptype, coalesce(v0,'')..coalesce(v5,''))`.
//!
//! ## Modules
//! * [`rule`] – [`rule::PolicyLine`] and the row codec. Empty-string fields
//!   collapse into NULL on write; reads reconstruct only present values.
//! * [`filter`] – predicate builders: exact match, field indexed, and the
//!   multi-valued [`filter::Filter`] where values OR within a column and
//!   columns AND together; [`filter::LoadFilter`] picks the shape per load.
//! * [`adapter`] – [`adapter::SqliteAdapter`], the adapter contract itself:
//!   load, filtered load, save, add, remove, filtered remove.
//! * [`batch`] / [`updatable`] – the multi-row operations, one transaction
//!   per call. `add_policies` and `update_policies` are all-or-nothing;
//!   `remove_policies` commits on any match.
//! * [`model`] – the [`model::PolicyModel`] seam the engine's in-memory
//!   model sits behind, plus [`model::MemoryModel`].
//! * [`context`] – [`context::OpContext`], cooperative cancellation and
//!   deadlines for every operation's `_ctx` variant.
//! * [`schema`] – table and unique-index bootstrap, identifier quoting.
//! * [`settings`] – database path and table name from config file or
//!   environment.
//!
//! ## Quick Start
//! ```
//! use polistore::adapter::SqliteAdapter;
//! use polistore::model::MemoryModel;
//!
//! let adapter = SqliteAdapter::open_in_memory("policy_rule").unwrap();
//! adapter
//!     .add_policy("p", &["alice".into(), "data1".into(), "read".into()])
//!     .unwrap();
//! let mut model = MemoryModel::new();
//! adapter.load_policy(&mut model).unwrap();
//! assert!(model.contains("p", &["alice", "data1", "read"]));
//! assert!(!adapter.is_filtered());
//! ```

pub mod adapter;
pub mod batch;
pub mod context;
pub mod error;
pub mod filter;
pub mod model;
pub mod rule;
pub mod schema;
pub mod settings;
pub mod updatable;

pub use adapter::SqliteAdapter;
pub use context::{CancelToken, OpContext};
pub use error::{AdapterError, Result};
pub use filter::{FieldIndexFilter, Filter, LoadFilter};
pub use model::{MemoryModel, PolicyModel};
pub use rule::PolicyLine;
pub use settings::Settings;
