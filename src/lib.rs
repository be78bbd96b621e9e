//! Plain-text genealogy records
//!
//! Individuals and family units are imported from and exported to a
//! GEDCOM-style interchange format, linked to each other, and queried for
//! spouses, children, parents, and descendant and ancestor trees.

pub mod domain;
pub use domain::{
    Config, FamilyError, FamilyUnit, Individual, RecordError, RecordSet, Sex, TreeOptions, Xref,
};

/// Interchange codec and persistent storage for record sets.
pub mod storage;
pub use storage::{Archive, ArchiveError, DirectoryStore};
