// Relationship queries derived on demand from the record set.
//
// Unresolvable ids are treated as absent. None of these queries fail.

use crate::domain::{FamilyUnit, Individual, RecordSet, Xref};

impl RecordSet {
    /// The spouse of an individual.
    ///
    /// Scans the individual's spousal links in order and stops at the first
    /// family unit in which they are the husband or the wife. The other
    /// occupant of that unit is returned if it is set and resolves; later
    /// links are never consulted, so after a remarriage only the first
    /// partner is reported.
    #[must_use]
    pub fn spouse_of(&self, id: &Xref) -> Option<&Individual> {
        let individual = self.individual(id)?;
        individual
            .spousal_links
            .iter()
            .filter_map(|link| self.family(link))
            .find(|family| family.is_spouse(id))
            .and_then(|family| family.partner_of(id))
            .and_then(|partner| self.individual(partner))
    }

    /// The children of an individual, across every family unit they are a
    /// spouse in.
    ///
    /// Ordered by spousal link, then by each unit's child order. Children
    /// listed more than once are returned more than once.
    #[must_use]
    pub fn children_of(&self, id: &Xref) -> Vec<&Individual> {
        let Some(individual) = self.individual(id) else {
            return Vec::new();
        };

        individual
            .spousal_links
            .iter()
            .filter_map(|link| self.family(link))
            .flat_map(|family| &family.children)
            .filter_map(|child| self.individual(child))
            .collect()
    }

    /// The parents of an individual.
    ///
    /// For each child link in order, the husband then the wife of that unit,
    /// where they resolve.
    #[must_use]
    pub fn parents_of(&self, id: &Xref) -> Vec<&Individual> {
        let Some(individual) = self.individual(id) else {
            return Vec::new();
        };

        individual
            .child_links
            .iter()
            .filter_map(|link| self.family(link))
            .flat_map(FamilyUnit::spouses)
            .filter_map(|parent| self.individual(parent))
            .collect()
    }
}
