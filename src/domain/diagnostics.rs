//! Structural checks over a record set.
//!
//! Dangling references and parentage cycles are tolerated everywhere else in
//! the crate. This module only reports them.

use std::{collections::HashMap, fmt};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};

use crate::domain::{RecordSet, Xref};

/// The field a reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LinkField {
    /// An individual's spousal links.
    SpousalLink,
    /// An individual's child links.
    ChildLink,
    /// A family unit's husband.
    Husband,
    /// A family unit's wife.
    Wife,
    /// A family unit's children.
    Child,
}

impl fmt::Display for LinkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SpousalLink => "FAMS",
            Self::ChildLink => "FAMC",
            Self::Husband => "HUSB",
            Self::Wife => "WIFE",
            Self::Child => "CHIL",
        })
    }
}

/// A reference to an id that does not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// The record holding the reference.
    pub owner: Xref,
    /// Where on the owner the reference is stored.
    pub field: LinkField,
    /// The unresolved id.
    pub target: Xref,
}

/// Findings of [`RecordSet::diagnose`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// References that resolve to nothing, in record order.
    pub dangling: Vec<DanglingReference>,
    /// Groups of individuals that are (transitively) their own ancestors.
    /// Each group is sorted, and the groups are sorted.
    pub cycles: Vec<Vec<Xref>>,
}

impl Diagnostics {
    /// Whether nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.cycles.is_empty()
    }
}

impl RecordSet {
    /// Reports dangling references and parentage cycles.
    #[must_use]
    pub fn diagnose(&self) -> Diagnostics {
        Diagnostics {
            dangling: self.dangling_references(),
            cycles: self.parentage_cycles(),
        }
    }

    fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        let mut check = |owner: &Xref, field: LinkField, target: &Xref, resolves: bool| {
            if !resolves {
                dangling.push(DanglingReference {
                    owner: owner.clone(),
                    field,
                    target: target.clone(),
                });
            }
        };

        for individual in self.individuals() {
            for link in &individual.spousal_links {
                check(&individual.id, LinkField::SpousalLink, link, self.family(link).is_some());
            }
            for link in &individual.child_links {
                check(&individual.id, LinkField::ChildLink, link, self.family(link).is_some());
            }
        }

        for family in self.families() {
            let members = family
                .husband
                .iter()
                .map(|id| (LinkField::Husband, id))
                .chain(family.wife.iter().map(|id| (LinkField::Wife, id)))
                .chain(family.children.iter().map(|id| (LinkField::Child, id)));
            for (field, member) in members {
                check(&family.id, field, member, self.individual(member).is_some());
            }
        }

        dangling
    }

    /// Strongly connected components of the child → parent graph.
    fn parentage_cycles(&self) -> Vec<Vec<Xref>> {
        let individuals = self.individuals();
        let mut graph = DiGraphMap::<usize, ()>::with_capacity(individuals.len(), individuals.len());

        let mut position = HashMap::with_capacity(individuals.len());
        for (index, individual) in individuals.iter().enumerate() {
            position.entry(&individual.id).or_insert(index);
        }

        for (index, individual) in individuals.iter().enumerate() {
            graph.add_node(index);
            for parent in self.parents_of(&individual.id) {
                if let Some(&parent_index) = position.get(&parent.id) {
                    graph.add_edge(index, parent_index, ());
                }
            }
        }

        let mut cycles = Vec::new();
        for component in tarjan_scc(&graph) {
            let is_cycle = match component.as_slice() {
                [node] => graph.contains_edge(*node, *node),
                _ => true,
            };
            if is_cycle {
                let mut ids: Vec<Xref> = component
                    .iter()
                    .map(|&index| individuals[index].id.clone())
                    .collect();
                ids.sort();
                cycles.push(ids);
            }
        }

        cycles.sort();
        cycles
    }
}
