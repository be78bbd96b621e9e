//! Descendant and ancestor trees.
//!
//! Trees are projections of the [`RecordSet`] built on demand from the
//! relationship queries. Nodes borrow from the record set and are never
//! stored.
//!
//! Imported data is not guaranteed to be acyclic, so every traversal tracks
//! the individuals on the current root-to-node path. An individual met again
//! on its own path is emitted as a leaf marked [`Truncation::Cycle`]. An
//! individual whose relatives were already expanded elsewhere in the same
//! tree (a duplicated `CHIL` line, or pedigree collapse) is emitted as a leaf
//! marked [`Truncation::Repeat`], so each tree holds at most one expansion per
//! individual. Depth is also bounded by [`TreeOptions::max_depth`].

use std::collections::HashSet;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;

use crate::domain::{Individual, RecordSet, Xref};

/// Default bound on the number of generations expanded below (or above) the
/// root.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options controlling tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    /// Generations to expand beyond the root. Nodes at this depth are not
    /// expanded further.
    pub max_depth: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Why a node's relatives were not expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// The individual already appears on the path from the root to this
    /// node.
    Cycle,
    /// The individual's relatives were already expanded elsewhere in this
    /// tree.
    Repeat,
    /// The depth bound was reached while relatives remained.
    DepthLimit,
}

/// Individuals seen while building a single tree.
#[derive(Debug, Default)]
struct Visited<'a> {
    /// Ids on the current root-to-node path.
    path: HashSet<&'a Xref>,
    /// Ids whose relatives have been expanded anywhere in the tree.
    expanded: HashSet<&'a Xref>,
}

impl Visited<'_> {
    fn truncation(&self, id: &Xref) -> Option<Truncation> {
        if self.path.contains(id) {
            Some(Truncation::Cycle)
        } else if self.expanded.contains(id) {
            Some(Truncation::Repeat)
        } else {
            None
        }
    }
}

/// A node of a descendant tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescendantNode<'a> {
    /// The individual at this node.
    pub individual: &'a Individual,
    /// Their spouse, as reported by [`RecordSet::spouse_of`].
    pub spouse: Option<&'a Individual>,
    /// Subtrees for each child, as reported by [`RecordSet::children_of`].
    pub children: Vec<DescendantNode<'a>>,
    /// Set when the children were not expanded.
    pub truncated: Option<Truncation>,
}

impl DescendantNode<'_> {
    /// Number of nodes in this subtree, including this one.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(DescendantNode::len).sum::<usize>()
    }

    /// Always `false`; a node contains at least itself.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// A node of an ancestor tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorNode<'a> {
    /// The individual at this node.
    pub individual: &'a Individual,
    /// Their spouse, shown alongside them.
    pub spouse: Option<&'a Individual>,
    /// Generations above the root; the root is level 0.
    pub level: usize,
    /// Subtrees for each parent, as reported by [`RecordSet::parents_of`].
    pub parents: Vec<AncestorNode<'a>>,
    /// Set when the parents were not expanded.
    pub truncated: Option<Truncation>,
}

impl AncestorNode<'_> {
    /// Whether this is the root of the tree.
    ///
    /// The root is highlighted by presentation layers but is otherwise an
    /// ordinary node.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.level == 0
    }
}

impl RecordSet {
    /// Builds the descendant tree rooted at `root`.
    ///
    /// Returns `None` if the root does not resolve.
    #[must_use]
    pub fn descendants(&self, root: &Xref, options: TreeOptions) -> Option<DescendantNode<'_>> {
        let individual = self.individual(root)?;
        Some(self.expand_descendants(individual, 0, &mut Visited::default(), options))
    }

    /// Builds a descendant tree for every founder, in record order.
    ///
    /// Founders are individuals without a parent family. Each tree is built
    /// independently, in parallel.
    #[must_use]
    #[instrument(level = "debug", skip(self))]
    pub fn descendant_forest(&self, options: TreeOptions) -> Vec<DescendantNode<'_>> {
        let founders: Vec<&Individual> = self
            .individuals()
            .iter()
            .filter(|individual| individual.is_founder())
            .collect();

        founders
            .par_iter()
            .map(|&founder| {
                self.expand_descendants(founder, 0, &mut Visited::default(), options)
            })
            .collect()
    }

    /// Builds the ancestor tree rooted at `root`.
    ///
    /// Returns `None` if the root does not resolve.
    #[must_use]
    pub fn ancestors(&self, root: &Xref, options: TreeOptions) -> Option<AncestorNode<'_>> {
        let individual = self.individual(root)?;
        Some(self.expand_ancestors(individual, 0, &mut Visited::default(), options))
    }

    fn expand_descendants<'a>(
        &'a self,
        individual: &'a Individual,
        depth: usize,
        visited: &mut Visited<'a>,
        options: TreeOptions,
    ) -> DescendantNode<'a> {
        let mut node = DescendantNode {
            individual,
            spouse: self.spouse_of(&individual.id),
            children: Vec::new(),
            truncated: None,
        };

        let children = self.children_of(&individual.id);
        if children.is_empty() {
            return node;
        }
        if depth >= options.max_depth {
            node.truncated = Some(Truncation::DepthLimit);
            return node;
        }

        visited.expanded.insert(&individual.id);
        visited.path.insert(&individual.id);
        for child in children {
            let subtree = if let Some(truncation) = visited.truncation(&child.id) {
                tracing::debug!("Descendant {truncation:?} at {}", child.id);
                DescendantNode {
                    individual: child,
                    spouse: self.spouse_of(&child.id),
                    children: Vec::new(),
                    truncated: Some(truncation),
                }
            } else {
                self.expand_descendants(child, depth + 1, visited, options)
            };
            node.children.push(subtree);
        }
        visited.path.remove(&individual.id);

        node
    }

    fn expand_ancestors<'a>(
        &'a self,
        individual: &'a Individual,
        level: usize,
        visited: &mut Visited<'a>,
        options: TreeOptions,
    ) -> AncestorNode<'a> {
        let mut node = AncestorNode {
            individual,
            spouse: self.spouse_of(&individual.id),
            level,
            parents: Vec::new(),
            truncated: None,
        };

        let parents = self.parents_of(&individual.id);
        if parents.is_empty() {
            return node;
        }
        if level >= options.max_depth {
            node.truncated = Some(Truncation::DepthLimit);
            return node;
        }

        visited.expanded.insert(&individual.id);
        visited.path.insert(&individual.id);
        for parent in parents {
            let subtree = if let Some(truncation) = visited.truncation(&parent.id) {
                tracing::debug!("Ancestor {truncation:?} at {}", parent.id);
                AncestorNode {
                    individual: parent,
                    spouse: self.spouse_of(&parent.id),
                    level: level + 1,
                    parents: Vec::new(),
                    truncated: Some(truncation),
                }
            } else {
                self.expand_ancestors(parent, level + 1, visited, options)
            };
            node.parents.push(subtree);
        }
        visited.path.remove(&individual.id);

        node
    }
}
