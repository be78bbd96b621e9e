use std::path::Path;

use clap::Parser;
use kindred::domain::Diagnostics;
use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Diagnose {
    /// Exit with a non-zero status if anything is found
    #[arg(long)]
    strict: bool,
}

impl Diagnose {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let archive = super::open_archive(root)?;
        let diagnostics = archive.records().diagnose();

        if diagnostics.is_clean() {
            println!("{}", "✅ No issues detected.".success());
            return Ok(());
        }

        print_report(&diagnostics);

        if self.strict {
            anyhow::bail!("archive has consistency issues");
        }
        Ok(())
    }
}

fn print_report(diagnostics: &Diagnostics) {
    if !diagnostics.dangling.is_empty() {
        let count = diagnostics.dangling.len();
        println!(
            "{}",
            format!("⚠️  {count} dangling references:").warning()
        );
        for (i, reference) in diagnostics.dangling.iter().enumerate() {
            println!(
                "{}. {} {} {}",
                i + 1,
                reference.owner,
                reference.field,
                reference.target
            );
        }
    }

    if !diagnostics.cycles.is_empty() {
        if !diagnostics.dangling.is_empty() {
            println!();
        }
        let count = diagnostics.cycles.len();
        println!(
            "{}",
            format!("⚠️  {count} parentage cycles:").warning()
        );
        for (i, cycle) in diagnostics.cycles.iter().enumerate() {
            let members: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
            println!("{}. {}", i + 1, members.join(", "));
        }
    }

    println!(
        "\n{}",
        "Dangling references are tolerated; review them before exporting.".dim()
    );
}
