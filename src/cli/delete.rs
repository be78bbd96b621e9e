use std::path::Path;

use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use kindred::Xref;
use tracing::instrument;

use super::terminal::{Colorize, label};

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("failed to read confirmation")
}

#[derive(Debug, Parser)]
pub struct Delete {
    /// The id of the individual to delete
    #[clap(value_parser = super::parse_xref)]
    id: Xref,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut archive = super::open_archive(root)?;
        let records = archive.records();

        let Some(individual) = records.individual(&self.id) else {
            anyhow::bail!("Individual {} not found", self.id);
        };

        let linked = individual.spousal_links.len() + individual.child_links.len();
        if linked > 0 {
            eprintln!(
                "{}",
                format!(
                    "⚠️  {} is referenced by {linked} family units; those references will dangle",
                    individual.id
                )
                .warning()
            );
        }

        if !self.yes && !confirm(&format!("Delete {}?", label(individual)))? {
            println!("Cancelled");
            return Ok(());
        }

        archive.remove_individual(&self.id)?;
        println!("{}", format!("✅ Deleted {}", self.id).success());
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Clear {
    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Clear {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut archive = super::open_archive(root)?;
        let records = archive.records();
        let (individuals, families) = (records.individuals().len(), records.families().len());

        if !self.yes
            && !confirm(&format!(
                "Delete all {individuals} individuals and {families} family units?"
            ))?
        {
            println!("Cancelled");
            return Ok(());
        }

        archive.clear()?;
        println!("{}", "✅ Cleared all records".success());
        Ok(())
    }
}
