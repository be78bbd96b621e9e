//! Domain models for genealogy records.
//!
//! This module contains the record types, the in-memory record set that links
//! them, and the relationship queries and trees derived from it.

mod config;
pub use config::Config;

/// Cross-reference identifiers.
pub mod xref;
pub use xref::{Xref, XrefError};

mod individual;
pub use individual::{Individual, Sex};

mod family;
pub use family::FamilyUnit;

mod record_set;
pub use record_set::{FamilyError, RecordError, RecordSet, UpsertOutcome};

mod relations;

/// Descendant and ancestor tree construction.
pub mod tree;
pub use tree::{AncestorNode, DescendantNode, TreeOptions, Truncation};

mod diagnostics;
pub use diagnostics::{DanglingReference, Diagnostics, LinkField};
