use std::path::Path;

use clap::Parser;
use kindred::{FamilyUnit, RecordSet, Xref};
use tracing::instrument;

use super::terminal::{Colorize, label};

#[derive(Debug, Parser)]
pub struct Family {
    /// The id of the family unit to replace [default: a new family unit]
    #[arg(long, value_parser = super::parse_xref)]
    id: Option<Xref>,

    /// The husband's id
    #[arg(long, value_parser = super::parse_xref)]
    husband: Option<Xref>,

    /// The wife's id
    #[arg(long, value_parser = super::parse_xref)]
    wife: Option<Xref>,

    /// A child's id; may be repeated
    #[arg(long = "child", value_parser = super::parse_xref)]
    children: Vec<Xref>,
}

impl Family {
    fn into_unit(self, records: &RecordSet) -> FamilyUnit {
        let mut family = self
            .id
            .map_or_else(|| records.new_family(), FamilyUnit::new);
        family.husband = self.husband;
        family.wife = self.wife;
        family.children = self.children;
        family
    }

    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut archive = super::open_archive(root)?;
        let family = self.into_unit(archive.records());

        for member in family.spouses().chain(&family.children) {
            if archive.records().individual(member).is_none() {
                eprintln!(
                    "{}",
                    format!("⚠️  {member} does not exist; the reference will dangle").warning()
                );
            }
        }

        let id = family.id.clone();
        let outcome = archive.upsert_family(family)?;

        let verb = if outcome.inserted { "Created" } else { "Replaced" };
        println!("{}", format!("✅ {verb} family unit {id}").success());
        for linked in &outcome.linked {
            if let Some(individual) = archive.records().individual(linked) {
                println!("  linked {}", label(individual));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Wrapper {
        #[command(flatten)]
        family: Family,
    }

    #[test]
    fn new_family_takes_the_next_id() {
        let records = RecordSet::new();
        let args = Wrapper::parse_from(["kin", "--husband", "I1", "--child", "I2", "--child", "@I3@"]);

        let family = args.family.into_unit(&records);

        assert_eq!(family.id, records.next_family_id());
        assert_eq!(family.husband.unwrap().as_str(), "@I1@");
        assert_eq!(family.wife, None);
        assert_eq!(family.children.len(), 2);
    }

    #[test]
    fn explicit_id_is_kept() {
        let args = Wrapper::parse_from(["kin", "--id", "F7", "--wife", "I2"]);
        let family = args.family.into_unit(&RecordSet::new());
        assert_eq!(family.id.as_str(), "@F7@");
    }
}
