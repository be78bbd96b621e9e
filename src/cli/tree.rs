use std::{fmt::Write as _, path::Path};

use clap::Parser;
use kindred::{
    Individual, TreeOptions, Xref,
    domain::{AncestorNode, DescendantNode, Truncation},
};
use tracing::instrument;

use super::terminal::{Colorize, label};

fn options(root: &Path, depth: Option<usize>) -> TreeOptions {
    let mut options = super::load_config(root).tree_options();
    if let Some(depth) = depth {
        options.max_depth = depth;
    }
    options
}

fn couple(individual: &Individual, spouse: Option<&Individual>) -> String {
    spouse.map_or_else(
        || label(individual),
        |spouse| format!("{} ⚭ {}", label(individual), label(spouse)),
    )
}

fn marker(truncated: Option<Truncation>) -> String {
    match truncated {
        None => String::new(),
        Some(Truncation::Cycle) => format!(" {}", "↻ (cycle)".warning()),
        Some(Truncation::Repeat) => format!(" {}", "↑ (shown above)".dim()),
        Some(Truncation::DepthLimit) => format!(" {}", "… (depth limit)".dim()),
    }
}

#[derive(Debug, Parser)]
pub struct Descendants {
    /// The individual to start from [default: every individual without
    /// parents]
    #[clap(value_parser = super::parse_xref)]
    id: Option<Xref>,

    /// Generations to show below each root [default: from config]
    #[arg(long)]
    depth: Option<usize>,
}

impl Descendants {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let options = options(root, self.depth);
        let archive = super::open_archive(root)?;
        let records = archive.records();

        let trees = match &self.id {
            Some(id) => {
                let Some(tree) = records.descendants(id, options) else {
                    anyhow::bail!("Individual {id} not found");
                };
                vec![tree]
            }
            None => records.descendant_forest(options),
        };

        if trees.is_empty() {
            println!("{}", "No individuals found.".dim());
        }
        for tree in &trees {
            print!("{}", render_descendants(tree));
        }
        Ok(())
    }
}

fn render_descendants(tree: &DescendantNode<'_>) -> String {
    fn visit(node: &DescendantNode<'_>, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        writeln!(
            out,
            "{indent}{}{}",
            couple(node.individual, node.spouse),
            marker(node.truncated)
        )
        .expect("writing to a String never fails");
        for child in &node.children {
            visit(child, depth + 1, out);
        }
    }

    let mut out = String::new();
    visit(tree, 0, &mut out);
    out
}

#[derive(Debug, Parser)]
pub struct Ancestors {
    /// The individual to start from
    #[clap(value_parser = super::parse_xref)]
    id: Xref,

    /// Generations to show above the individual [default: from config]
    #[arg(long)]
    depth: Option<usize>,
}

impl Ancestors {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let options = options(root, self.depth);
        let archive = super::open_archive(root)?;

        let Some(tree) = archive.records().ancestors(&self.id, options) else {
            anyhow::bail!("Individual {} not found", self.id);
        };
        print!("{}", render_ancestors(&tree));
        Ok(())
    }
}

/// Parents are printed above the individual, one indent per generation.
fn render_ancestors(tree: &AncestorNode<'_>) -> String {
    fn visit(node: &AncestorNode<'_>, out: &mut String) {
        for parent in &node.parents {
            visit(parent, out);
        }
        let indent = "  ".repeat(node.level);
        let line = couple(node.individual, node.spouse);
        let line = if node.is_root() { line.highlight() } else { line };
        writeln!(out, "{indent}{line}{}", marker(node.truncated))
            .expect("writing to a String never fails");
    }

    let mut out = String::new();
    visit(tree, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use kindred::{RecordSet, storage::gedcom};

    use super::*;

    const FAMILY: &str = "\
0 @I1@ INDI
1 NAME Walter /White/
0 @I2@ INDI
1 NAME Skyler /White/
0 @I3@ INDI
1 NAME Junior /White/
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
0 TRLR";

    fn records() -> RecordSet {
        let (individuals, families) = gedcom::decode(FAMILY);
        RecordSet::from_records(individuals, families)
    }

    #[test]
    fn descendants_are_indented_by_generation() {
        let records = records();
        let tree = records
            .descendants(&"@I1@".parse().unwrap(), TreeOptions::default())
            .unwrap();

        let rendered = render_descendants(&tree);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Walter White"));
        assert!(lines[0].contains("Skyler White"));
        assert!(!lines[0].starts_with(' '));
        assert!(lines[1].starts_with("  "));
        assert!(lines[1].contains("Junior White"));
    }

    #[test]
    fn ancestors_list_parents_first() {
        let records = records();
        let tree = records
            .ancestors(&"@I3@".parse().unwrap(), TreeOptions::default())
            .unwrap();

        let rendered = render_ancestors(&tree);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("  ") && lines[0].contains("Walter White"));
        assert!(lines[1].starts_with("  ") && lines[1].contains("Skyler White"));
        assert!(!lines[2].starts_with(' ') && lines[2].contains("Junior White"));
    }

    #[test]
    fn truncated_nodes_are_marked() {
        let records = records();
        let tree = records
            .ancestors(&"@I3@".parse().unwrap(), TreeOptions { max_depth: 0 })
            .unwrap();

        let rendered = render_ancestors(&tree);
        assert_eq!(rendered.lines().count(), 1);
        assert!(rendered.contains("depth limit"));
    }

    #[test]
    fn repeated_children_are_marked() {
        let text = FAMILY
            .replace("1 CHIL @I3@", "1 CHIL @I3@\n1 CHIL @I3@")
            .replace(
                "0 TRLR",
                "0 @I4@ INDI\n1 NAME Holly /White/\n0 @F2@ FAM\n1 HUSB @I3@\n1 CHIL @I4@\n0 TRLR",
            );
        let (individuals, families) = gedcom::decode(&text);
        let records = RecordSet::from_records(individuals, families);
        let tree = records
            .descendants(&"@I1@".parse().unwrap(), TreeOptions::default())
            .unwrap();

        let rendered = render_descendants(&tree);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("    ") && lines[2].contains("Holly White"));
        assert!(lines[3].contains("Junior White") && lines[3].contains("shown above"));
    }
}
