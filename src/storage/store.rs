use std::{convert::Infallible, fmt};

use crate::domain::{FamilyUnit, Individual};

/// The kinds of record a [`RecordStore`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// [`Individual`] records.
    Individual,
    /// [`FamilyUnit`] records.
    FamilyUnit,
}

impl RecordKind {
    /// Every kind, in the order they are persisted.
    pub const ALL: [Self; 2] = [Self::Individual, Self::FamilyUnit];
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Individual => "individuals",
            Self::FamilyUnit => "family units",
        })
    }
}

/// The full collection of one kind of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Records {
    /// Every individual.
    Individuals(Vec<Individual>),
    /// Every family unit.
    Families(Vec<FamilyUnit>),
}

impl Records {
    /// The kind of record held.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Individuals(_) => RecordKind::Individual,
            Self::Families(_) => RecordKind::FamilyUnit,
        }
    }

    /// An empty collection of the given kind.
    #[must_use]
    pub const fn empty(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Individual => Self::Individuals(Vec::new()),
            RecordKind::FamilyUnit => Self::Families(Vec::new()),
        }
    }

    /// The number of records held.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Individuals(records) => records.len(),
            Self::Families(records) => records.len(),
        }
    }

    /// Whether no records are held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Persistence for record collections.
///
/// Stores deal in whole collections: every save replaces everything of that
/// kind. Retrying a failed save is the store's business, not the caller's.
pub trait RecordStore {
    /// The error raised when loading or saving fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Loads every record of the given kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    fn load_all(&self, kind: RecordKind) -> Result<Records, Self::Error>;

    /// Replaces every record of the kind held by `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be written.
    fn replace_all(&mut self, records: Records) -> Result<(), Self::Error>;
}

/// A store that keeps records in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    individuals: Vec<Individual>,
    families: Vec<FamilyUnit>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored individuals.
    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// The stored family units.
    #[must_use]
    pub fn families(&self) -> &[FamilyUnit] {
        &self.families
    }
}

impl RecordStore for MemoryStore {
    type Error = Infallible;

    fn load_all(&self, kind: RecordKind) -> Result<Records, Self::Error> {
        Ok(match kind {
            RecordKind::Individual => Records::Individuals(self.individuals.clone()),
            RecordKind::FamilyUnit => Records::Families(self.families.clone()),
        })
    }

    fn replace_all(&mut self, records: Records) -> Result<(), Self::Error> {
        match records {
            Records::Individuals(individuals) => self.individuals = individuals,
            Records::Families(families) => self.families = families,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_replaces_by_kind() {
        let mut store = MemoryStore::new();
        let individual = Individual::new("@I1@".parse().unwrap());

        store
            .replace_all(Records::Individuals(vec![individual.clone()]))
            .unwrap();
        store.replace_all(Records::empty(RecordKind::FamilyUnit)).unwrap();

        assert_eq!(
            store.load_all(RecordKind::Individual).unwrap(),
            Records::Individuals(vec![individual])
        );
        let families = store.load_all(RecordKind::FamilyUnit).unwrap();
        assert_eq!(families.kind(), RecordKind::FamilyUnit);
        assert!(families.is_empty());
    }
}
