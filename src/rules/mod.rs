//! Rule Model and Store
//!
//! The rule schema, the validator applied to externally supplied rule
//! documents, and the store that owns the canonical rule list and its
//! on-disk file.

pub mod model;
pub mod store;
pub mod validate;

pub use model::{Rule, RuleIdentity};
pub use store::{merge_rules, MergeOutcome, Notifier, RuleStore, StoreError};
pub use validate::{validate_rules, RuleError};
