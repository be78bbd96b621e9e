use std::path::Path;

use clap::Parser;
use kindred::{Individual, RecordSet, Xref};
use tracing::instrument;

use super::terminal::{Colorize, label};

#[derive(Debug, Parser)]
#[command(about = "Display an individual and their immediate relatives")]
pub struct Show {
    /// The id of the individual to display
    #[clap(value_parser = super::parse_xref)]
    id: Xref,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let archive = super::open_archive(root)?;
        let records = archive.records();

        let Some(individual) = records.individual(&self.id) else {
            anyhow::bail!("Individual {} not found", self.id);
        };

        match self.output {
            OutputFormat::Pretty => output_pretty(records, individual),
            OutputFormat::Json => output_json(records, individual)?,
        }

        Ok(())
    }
}

fn output_pretty(records: &RecordSet, individual: &Individual) {
    println!("# {}\n", label(individual));

    println!("{}", "Details".dim());
    let details = [
        ("Sex", individual.sex.as_ref().map(|sex| sex.as_str())),
        ("Born", individual.birth_date.as_deref()),
        ("Residence", individual.residence.as_deref()),
        ("Occupation", individual.occupation.as_deref()),
    ];
    for (field, value) in details {
        if let Some(value) = value {
            println!("  {:<11}{value}", format!("{field}:"));
        }
    }

    if let Some(spouse) = records.spouse_of(&individual.id) {
        println!("\n{}", "Spouse".dim());
        println!("  • {}", label(spouse));
    }

    print_group("Parents", &records.parents_of(&individual.id));
    print_group("Children", &records.children_of(&individual.id));

    if !individual.spousal_links.is_empty() || !individual.child_links.is_empty() {
        println!("\n{}", "Family units".dim());
        for link in &individual.spousal_links {
            println!("  • {link} (spouse){}", missing_marker(records, link));
        }
        for link in &individual.child_links {
            println!("  • {link} (child){}", missing_marker(records, link));
        }
    }
}

fn print_group(heading: &str, individuals: &[&Individual]) {
    if individuals.is_empty() {
        return;
    }
    println!("\n{}", heading.dim());
    for individual in individuals {
        println!("  • {}", label(individual));
    }
}

fn missing_marker(records: &RecordSet, family: &Xref) -> String {
    if records.family(family).is_some() {
        String::new()
    } else {
        format!(" {}", "⚠️ missing".warning())
    }
}

fn output_json(records: &RecordSet, individual: &Individual) -> anyhow::Result<()> {
    use serde_json::json;

    let ids = |individuals: Vec<&Individual>| -> Vec<String> {
        individuals
            .into_iter()
            .map(|individual| individual.id.to_string())
            .collect()
    };

    let output = json!({
        "individual": individual,
        "spouse": records.spouse_of(&individual.id).map(|spouse| spouse.id.to_string()),
        "parents": ids(records.parents_of(&individual.id)),
        "children": ids(records.children_of(&individual.id)),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
