//! A record set mirrored to a store.
//!
//! The [`Archive`] applies every mutation to its in-memory [`RecordSet`]
//! first and then saves both collections through its [`RecordStore`]. A
//! failed save is reported but does not undo the mutation; call
//! [`Archive::save`] to retry it.

use std::{error::Error, fmt};

use nonempty::NonEmpty;
use tracing::instrument;

use crate::{
    domain::{FamilyError, FamilyUnit, Individual, RecordError, RecordSet, UpsertOutcome, Xref},
    storage::{
        RecordKind, RecordStore, Records,
        gedcom::{DecodeReport, Decoded},
    },
};

type BoxError = Box<dyn Error + Send + Sync>;

/// A record set kept in sync with a store.
#[derive(Debug)]
pub struct Archive<S> {
    records: RecordSet,
    store: S,
}

impl<S: RecordStore> Archive<S> {
    /// Loads every record from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if either collection cannot be loaded, or if the
    /// store returns the wrong kind of record.
    #[instrument(level = "debug", skip_all)]
    pub fn open(store: S) -> Result<Self, ArchiveError> {
        let individuals = match load(&store, RecordKind::Individual)? {
            Records::Individuals(individuals) => individuals,
            other => return Err(unexpected(RecordKind::Individual, &other)),
        };
        let families = match load(&store, RecordKind::FamilyUnit)? {
            Records::Families(families) => families,
            other => return Err(unexpected(RecordKind::FamilyUnit, &other)),
        };

        tracing::debug!(
            individuals = individuals.len(),
            families = families.len(),
            "opened archive"
        );
        Ok(Self {
            records: RecordSet::from_records(individuals, families),
            store,
        })
    }

    /// The current snapshot.
    #[must_use]
    pub const fn records(&self) -> &RecordSet {
        &self.records
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Replaces every record with a decoded interchange file and returns its
    /// report.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::ImportNotSaved`], carrying the report, if the
    /// new records cannot be saved. The snapshot is replaced regardless.
    #[instrument(skip_all)]
    pub fn import(&mut self, decoded: Decoded) -> Result<DecodeReport, ArchiveError> {
        let Decoded {
            individuals,
            families,
            report,
        } = decoded;
        tracing::info!(
            individuals = individuals.len(),
            families = families.len(),
            skipped = report.skipped.len(),
            "imported records"
        );
        self.records.replace_all(individuals, families);
        match self.save() {
            Ok(()) => Ok(report),
            Err(source) => Err(ArchiveError::ImportNotSaved { report, source }),
        }
    }

    /// Creates an individual with a fresh id and returns a copy of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be saved. The individual is
    /// created regardless.
    #[instrument(skip_all)]
    pub fn add_individual(&mut self) -> Result<Individual, ArchiveError> {
        let individual = self.records.add_individual().clone();
        self.save()?;
        Ok(individual)
    }

    /// Replaces an existing individual.
    ///
    /// # Errors
    ///
    /// Returns an error if no individual has the same id, or if the records
    /// cannot be saved.
    #[instrument(skip_all, fields(individual = %individual.id))]
    pub fn update_individual(&mut self, individual: Individual) -> Result<(), ArchiveError> {
        self.records.update_individual(individual)?;
        self.save()?;
        Ok(())
    }

    /// Removes an individual. References to it are left in place.
    ///
    /// Nothing is saved when no individual has the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be saved.
    #[instrument(skip(self))]
    pub fn remove_individual(&mut self, id: &Xref) -> Result<Option<Individual>, ArchiveError> {
        let Some(removed) = self.records.remove_individual(id) else {
            return Ok(None);
        };
        self.save()?;
        Ok(Some(removed))
    }

    /// Inserts or replaces a family unit and links its members to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the family unit has neither a husband nor a wife,
    /// in which case nothing changes, or if the records cannot be saved.
    #[instrument(skip_all, fields(family = %family.id))]
    pub fn upsert_family(&mut self, family: FamilyUnit) -> Result<UpsertOutcome, ArchiveError> {
        let outcome = self.records.upsert_family(family)?;
        self.save()?;
        Ok(outcome)
    }

    /// Removes every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be saved.
    #[instrument(skip_all)]
    pub fn clear(&mut self) -> Result<(), ArchiveError> {
        self.records.clear();
        self.save()?;
        Ok(())
    }

    /// Saves both collections, replacing whatever the store holds.
    ///
    /// # Errors
    ///
    /// This method does *not* fail fast. Both collections are attempted and
    /// every failure is returned.
    pub fn save(&mut self) -> Result<(), PersistError> {
        let snapshots = [
            Records::Individuals(self.records.individuals().to_vec()),
            Records::Families(self.records.families().to_vec()),
        ];

        let failures: Vec<(RecordKind, BoxError)> = snapshots
            .into_iter()
            .filter_map(|records| {
                let kind = records.kind();
                self.store.replace_all(records).err().map(|e| {
                    tracing::warn!("failed to save {kind}: {e}");
                    (kind, Box::new(e) as BoxError)
                })
            })
            .collect();

        NonEmpty::from_vec(failures).map_or(Ok(()), |failures| Err(PersistError { failures }))
    }
}

fn load<S: RecordStore>(store: &S, kind: RecordKind) -> Result<Records, ArchiveError> {
    store.load_all(kind).map_err(|e| ArchiveError::Load {
        kind,
        source: Box::new(e),
    })
}

const fn unexpected(expected: RecordKind, found: &Records) -> ArchiveError {
    ArchiveError::UnexpectedKind {
        expected,
        found: found.kind(),
    }
}

/// Errors raised by [`Archive`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// A collection could not be loaded.
    #[error("failed to load {kind}")]
    Load {
        /// The collection being loaded.
        kind: RecordKind,
        /// The store's error.
        #[source]
        source: BoxError,
    },

    /// The store returned a different kind of record than was asked for.
    #[error("expected {expected} from the store, found {found}")]
    UnexpectedKind {
        /// The kind asked for.
        expected: RecordKind,
        /// The kind returned.
        found: RecordKind,
    },

    /// An individual edit was rejected.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A family unit was rejected.
    #[error(transparent)]
    Family(#[from] FamilyError),

    /// The change was applied but could not be saved.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// An import was applied but could not be saved.
    #[error("imported records could not be saved")]
    ImportNotSaved {
        /// Lines skipped while decoding the import.
        report: DecodeReport,
        /// The save failures.
        #[source]
        source: PersistError,
    },
}

/// The records could not be saved.
///
/// The in-memory snapshot already reflects the change.
#[derive(Debug, thiserror::Error)]
pub struct PersistError {
    failures: NonEmpty<(RecordKind, BoxError)>,
}

impl PersistError {
    /// The collections that failed to save, with the store's errors.
    pub fn failures(&self) -> impl Iterator<Item = (RecordKind, &(dyn Error + Send + Sync))> {
        self.failures
            .iter()
            .map(|(kind, error)| (*kind, error.as_ref()))
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to save ")?;
        let kinds: Vec<String> = self
            .failures
            .iter()
            .map(|(kind, error)| format!("{kind} ({error})"))
            .collect();
        write!(f, "{}", kinds.join(", "))
    }
}
