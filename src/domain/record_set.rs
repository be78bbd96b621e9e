//! In-memory record set of individuals and family units.
//!
//! The [`RecordSet`] knows nothing about the interchange format or where the
//! records are persisted. It owns both collections in insertion order, keeps
//! id lookup indexes, and is the only writer of the cross-references between
//! individuals and family units.

use std::collections::HashMap;

use thiserror::Error;
use tracing::instrument;

use crate::domain::{FamilyUnit, Individual, Sex, Xref};

/// An owned, versioned snapshot of the genealogy records.
///
/// The version starts at zero and is incremented by every successful
/// mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    /// Individuals in insertion order.
    individuals: Vec<Individual>,

    /// Family units in insertion order.
    families: Vec<FamilyUnit>,

    /// Position of each individual in `individuals`, keyed by id.
    /// When ids are duplicated the first occurrence wins.
    individual_index: HashMap<Xref, usize>,

    /// Position of each family unit in `families`, keyed by id.
    family_index: HashMap<Xref, usize>,

    version: u64,
}

/// Errors raised by edits to existing records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// No individual with this id exists.
    #[error("individual {0} not found")]
    IndividualNotFound(Xref),
}

/// Errors raised when creating or updating a family unit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FamilyError {
    /// Neither a husband nor a wife was given.
    #[error("family {0} must have a husband or a wife")]
    NoSpouse(Xref),
}

/// Result of a successful [`RecordSet::upsert_family`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Whether the family unit was new, as opposed to replacing an existing
    /// unit with the same id.
    pub inserted: bool,
    /// Individuals that gained a spousal or child link.
    pub linked: Vec<Xref>,
}

impl RecordSet {
    /// Creates an empty record set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record set from existing collections, preserving their order.
    ///
    /// Back-references are completed the same way
    /// [`RecordSet::upsert_family`] does it: any member a family unit names
    /// gains the matching link if it lacks it. Links already present are
    /// kept as-is, so records that satisfy the linkage invariants come out
    /// unchanged.
    #[must_use]
    pub fn from_records(individuals: Vec<Individual>, families: Vec<FamilyUnit>) -> Self {
        let mut records = Self {
            individuals,
            families,
            ..Self::default()
        };
        records.reindex();
        records.link_all();
        records
    }

    /// All individuals, in order.
    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// All family units, in order.
    #[must_use]
    pub fn families(&self) -> &[FamilyUnit] {
        &self.families
    }

    /// The snapshot version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Whether the record set holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty() && self.families.is_empty()
    }

    /// Consumes the record set, returning both collections.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Individual>, Vec<FamilyUnit>) {
        (self.individuals, self.families)
    }

    /// Looks up an individual by id.
    #[must_use]
    pub fn individual(&self, id: &Xref) -> Option<&Individual> {
        self.individual_index
            .get(id)
            .and_then(|&index| self.individuals.get(index))
    }

    /// Looks up a family unit by id.
    #[must_use]
    pub fn family(&self, id: &Xref) -> Option<&FamilyUnit> {
        self.family_index
            .get(id)
            .and_then(|&index| self.families.get(index))
    }

    /// Individuals whose name or occupation contains `term`, ignoring case.
    pub fn search<'a>(&'a self, term: &'a str) -> impl Iterator<Item = &'a Individual> + 'a {
        self.individuals
            .iter()
            .filter(move |individual| individual.matches(term))
    }

    /// The id the next created individual will receive.
    #[must_use]
    pub fn next_individual_id(&self) -> Xref {
        next_pointer('I', self.individuals.iter().map(|i| &i.id))
    }

    /// The id the next created family unit will receive.
    #[must_use]
    pub fn next_family_id(&self) -> Xref {
        next_pointer('F', self.families.iter().map(|f| &f.id))
    }

    /// Creates a new individual with a fresh id and sex `M`, and returns it.
    pub fn add_individual(&mut self) -> &Individual {
        let mut individual = Individual::new(self.next_individual_id());
        individual.sex = Some(Sex::Male);

        let index = self.individuals.len();
        self.individual_index.insert(individual.id.clone(), index);
        self.individuals.push(individual);
        self.touch();

        tracing::info!("Added individual {}", self.individuals[index].id);
        &self.individuals[index]
    }

    /// Replaces the individual with the same id.
    ///
    /// This is a full replacement, including the individual's links.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::IndividualNotFound`] if no individual has this
    /// id. The record set is left unchanged.
    pub fn update_individual(&mut self, individual: Individual) -> Result<(), RecordError> {
        let Some(&index) = self.individual_index.get(&individual.id) else {
            return Err(RecordError::IndividualNotFound(individual.id));
        };
        self.individuals[index] = individual;
        self.touch();
        Ok(())
    }

    /// Removes an individual, returning it if it existed.
    ///
    /// Family units that reference the individual are left as they are; the
    /// references become dangling and are ignored by relationship queries.
    pub fn remove_individual(&mut self, id: &Xref) -> Option<Individual> {
        let index = *self.individual_index.get(id)?;
        let removed = self.individuals.remove(index);
        self.reindex();
        self.touch();

        tracing::info!("Removed individual {id}");
        Some(removed)
    }

    /// A new, empty family unit with a fresh id.
    ///
    /// The unit is not part of the record set until it is passed to
    /// [`RecordSet::upsert_family`].
    #[must_use]
    pub fn new_family(&self) -> FamilyUnit {
        FamilyUnit::new(self.next_family_id())
    }

    /// Inserts or replaces a family unit and propagates back-references into
    /// its members.
    ///
    /// Each resolvable husband or wife gains a spousal link to the unit, and
    /// each resolvable child gains a child link, unless the link is already
    /// present. Links are only ever added: members dropped from an existing
    /// unit keep their old link.
    ///
    /// # Errors
    ///
    /// Returns [`FamilyError::NoSpouse`] if neither husband nor wife is set.
    /// Nothing is mutated in that case.
    #[instrument(level = "debug", skip_all, fields(family = %family.id))]
    pub fn upsert_family(&mut self, family: FamilyUnit) -> Result<UpsertOutcome, FamilyError> {
        if !family.has_spouse() {
            return Err(FamilyError::NoSpouse(family.id));
        }

        let linked = propagate_links(&mut self.individuals, &family);

        let inserted = if let Some(&index) = self.family_index.get(&family.id) {
            self.families[index] = family;
            false
        } else {
            self.family_index
                .insert(family.id.clone(), self.families.len());
            self.families.push(family);
            true
        };
        self.touch();

        tracing::debug!(inserted, linked = linked.len(), "Upserted family");
        Ok(UpsertOutcome { inserted, linked })
    }

    /// Replaces every record, e.g. after importing a file.
    ///
    /// Missing back-references are completed as in
    /// [`RecordSet::from_records`].
    pub fn replace_all(&mut self, individuals: Vec<Individual>, families: Vec<FamilyUnit>) {
        self.individuals = individuals;
        self.families = families;
        self.reindex();
        self.link_all();
        self.touch();
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.replace_all(Vec::new(), Vec::new());
    }

    const fn touch(&mut self) {
        self.version += 1;
    }

    fn link_all(&mut self) {
        let mut completed = 0;
        for family in &self.families {
            completed += propagate_links(&mut self.individuals, family).len();
        }
        if completed > 0 {
            tracing::debug!("Completed back-references on {completed} individuals");
        }
    }

    fn reindex(&mut self) {
        self.individual_index.clear();
        for (index, individual) in self.individuals.iter().enumerate() {
            self.individual_index
                .entry(individual.id.clone())
                .or_insert(index);
        }

        self.family_index.clear();
        for (index, family) in self.families.iter().enumerate() {
            self.family_index.entry(family.id.clone()).or_insert(index);
        }
    }
}

/// Adds the links `family` implies to every individual it names, returning
/// the ids of the individuals that changed.
fn propagate_links(individuals: &mut [Individual], family: &FamilyUnit) -> Vec<Xref> {
    let mut linked = Vec::new();
    for individual in individuals {
        let mut changed = false;

        if family.is_spouse(&individual.id) && !individual.spousal_links.contains(&family.id) {
            individual.spousal_links.push(family.id.clone());
            changed = true;
        }

        if family.children.contains(&individual.id) && !individual.child_links.contains(&family.id)
        {
            individual.child_links.push(family.id.clone());
            changed = true;
        }

        if changed {
            linked.push(individual.id.clone());
        }
    }
    linked
}

/// One past the largest index used by pointer tokens with this prefix.
fn next_pointer<'a>(prefix: char, ids: impl Iterator<Item = &'a Xref>) -> Xref {
    let next = ids
        .filter_map(|id| id.pointer_index(prefix))
        .max()
        .map_or(1, |max| max + 1);
    Xref::pointer(prefix, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xref(s: &str) -> Xref {
        s.parse().unwrap()
    }

    fn person(id: &str) -> Individual {
        Individual::new(xref(id))
    }

    fn couple() -> RecordSet {
        RecordSet::from_records(
            vec![person("@I1@"), person("@I2@"), person("@I3@")],
            Vec::new(),
        )
    }

    fn family(id: &str, husband: Option<&str>, wife: Option<&str>, children: &[&str]) -> FamilyUnit {
        FamilyUnit {
            id: xref(id),
            husband: husband.map(xref),
            wife: wife.map(xref),
            children: children.iter().copied().map(xref).collect(),
        }
    }

    #[test]
    fn upsert_rejects_family_without_spouse() {
        let mut records = couple();
        let before = records.clone();

        let err = records
            .upsert_family(family("@F1@", None, None, &["@I3@"]))
            .expect_err("family without spouse should be rejected");

        assert_eq!(err, FamilyError::NoSpouse(xref("@F1@")));
        assert_eq!(records, before);
    }

    #[test]
    fn upsert_propagates_back_references() {
        let mut records = couple();

        let outcome = records
            .upsert_family(family("@F1@", Some("@I1@"), Some("@I2@"), &["@I3@"]))
            .unwrap();

        assert!(outcome.inserted);
        assert_eq!(outcome.linked, vec![xref("@I1@"), xref("@I2@"), xref("@I3@")]);
        assert_eq!(
            records.individual(&xref("@I1@")).unwrap().spousal_links,
            vec![xref("@F1@")]
        );
        assert_eq!(
            records.individual(&xref("@I2@")).unwrap().spousal_links,
            vec![xref("@F1@")]
        );
        assert_eq!(
            records.individual(&xref("@I3@")).unwrap().child_links,
            vec![xref("@F1@")]
        );
    }

    #[test]
    fn upsert_is_idempotent_on_links() {
        let mut records = couple();
        let unit = family("@F1@", Some("@I1@"), Some("@I2@"), &["@I3@"]);

        records.upsert_family(unit.clone()).unwrap();
        let second = records.upsert_family(unit).unwrap();

        assert!(!second.inserted);
        assert!(second.linked.is_empty());
        assert_eq!(records.families().len(), 1);
        for individual in records.individuals() {
            assert!(individual.spousal_links.len() <= 1);
            assert!(individual.child_links.len() <= 1);
        }
    }

    #[test]
    fn upsert_replaces_without_removing_stale_links() {
        let mut records = couple();
        records
            .upsert_family(family("@F1@", Some("@I1@"), Some("@I2@"), &["@I3@"]))
            .unwrap();

        records
            .upsert_family(family("@F1@", Some("@I1@"), None, &[]))
            .unwrap();

        let stored = records.family(&xref("@F1@")).unwrap();
        assert_eq!(stored.wife, None);
        assert!(stored.children.is_empty());
        assert_eq!(
            records.individual(&xref("@I2@")).unwrap().spousal_links,
            vec![xref("@F1@")]
        );
        assert_eq!(
            records.individual(&xref("@I3@")).unwrap().child_links,
            vec![xref("@F1@")]
        );
    }

    #[test]
    fn upsert_ignores_unknown_members() {
        let mut records = couple();
        let outcome = records
            .upsert_family(family("@F1@", Some("@I9@"), None, &["@I8@"]))
            .unwrap();

        assert!(outcome.linked.is_empty());
        assert_eq!(records.families().len(), 1);
    }

    #[test]
    fn add_individual_allocates_fresh_ids() {
        let mut records = RecordSet::new();
        let first = records.add_individual().id.clone();
        let second = records.add_individual().id.clone();
        assert_eq!(first, xref("@I1@"));
        assert_eq!(second, xref("@I2@"));
        assert_eq!(records.individual(&first).unwrap().sex, Some(Sex::Male));

        records.remove_individual(&first);
        assert_eq!(records.add_individual().id, xref("@I3@"));
    }

    #[test]
    fn new_family_is_not_inserted() {
        let records = RecordSet::from_records(Vec::new(), vec![family("@F4@", Some("@I1@"), None, &[])]);
        let draft = records.new_family();
        assert_eq!(draft.id, xref("@F5@"));
        assert!(records.family(&draft.id).is_none());
    }

    #[test]
    fn update_unknown_individual_fails() {
        let mut records = couple();
        let err = records.update_individual(person("@I9@")).unwrap_err();
        assert_eq!(err, RecordError::IndividualNotFound(xref("@I9@")));
        assert_eq!(records.version(), 0);
    }

    #[test]
    fn update_replaces_fields() {
        let mut records = couple();
        let mut updated = person("@I2@");
        updated.name = "Jane Doe".to_string();
        records.update_individual(updated).unwrap();

        assert_eq!(records.individual(&xref("@I2@")).unwrap().name, "Jane Doe");
        assert_eq!(records.version(), 1);
    }

    #[test]
    fn remove_keeps_dangling_family_references() {
        let mut records = couple();
        records
            .upsert_family(family("@F1@", Some("@I1@"), Some("@I2@"), &[]))
            .unwrap();

        let removed = records.remove_individual(&xref("@I2@")).unwrap();
        assert_eq!(removed.id, xref("@I2@"));
        assert!(records.individual(&xref("@I2@")).is_none());
        assert_eq!(
            records.family(&xref("@F1@")).unwrap().wife,
            Some(xref("@I2@"))
        );
        // the index is rebuilt after the removal shifts positions
        assert_eq!(records.individual(&xref("@I3@")).unwrap().id, xref("@I3@"));
    }

    #[test]
    fn search_matches_name_and_occupation() {
        let mut smith = person("@I1@");
        smith.name = "John Smith".to_string();
        let mut baker = person("@I2@");
        baker.name = "Mary Jones".to_string();
        baker.occupation = Some("Baker".to_string());
        let records = RecordSet::from_records(vec![smith, baker], Vec::new());

        let hits: Vec<_> = records.search("bak").map(|i| i.id.clone()).collect();
        assert_eq!(hits, vec![xref("@I2@")]);
        assert_eq!(records.search("").count(), 2);
    }

    #[test]
    fn from_records_completes_missing_back_references() {
        let records = RecordSet::from_records(
            vec![person("@I1@"), person("@I2@"), person("@I3@")],
            vec![family("@F1@", Some("@I1@"), Some("@I2@"), &["@I3@"])],
        );

        assert_eq!(
            records.individual(&xref("@I2@")).unwrap().spousal_links,
            vec![xref("@F1@")]
        );
        assert_eq!(
            records.individual(&xref("@I3@")).unwrap().child_links,
            vec![xref("@F1@")]
        );
        assert_eq!(records.version(), 0);
    }

    #[test]
    fn from_records_keeps_consistent_links_untouched() {
        let mut husband = person("@I1@");
        husband.spousal_links = vec![xref("@F2@"), xref("@F1@")];
        let families = vec![
            family("@F1@", Some("@I1@"), None, &[]),
            family("@F2@", Some("@I1@"), None, &[]),
        ];

        let records = RecordSet::from_records(vec![husband.clone()], families);
        assert_eq!(records.individuals(), &[husband]);
    }

    #[test]
    fn clear_empties_and_bumps_version() {
        let mut records = couple();
        records.clear();
        assert!(records.is_empty());
        assert_eq!(records.version(), 1);
    }
}
