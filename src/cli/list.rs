use std::path::Path;

use clap::{Parser, ValueEnum};
use kindred::{Individual, RecordSet};
use tracing::instrument;

use super::terminal::{self, Colorize};

const MIN_NAME_WIDTH: usize = 12;

/// Command arguments for `kin list`.
#[derive(Debug, Default, Parser)]
pub struct List {
    /// Case-insensitive substring match against name and occupation
    #[arg(long, short)]
    search: Option<String>,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let archive = super::open_archive(root)?;
        let records = archive.records();

        let individuals: Vec<&Individual> = match &self.search {
            Some(term) => records.search(term).collect(),
            None => records.individuals().iter().collect(),
        };

        match self.output {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(std::io::stdout(), &individuals)?;
                println!();
            }
            OutputFormat::Table => print_table(records, &individuals),
        }

        Ok(())
    }
}

fn print_table(records: &RecordSet, individuals: &[&Individual]) {
    if individuals.is_empty() {
        println!("{}", "No individuals found.".dim());
        return;
    }

    let id_width = individuals
        .iter()
        .map(|individual| individual.id.len())
        .max()
        .unwrap_or(0);
    let name_width = name_width(id_width);

    println!(
        "{}",
        format!(
            "{:id_width$}  {:name_width$}  {:3}  {:12}  {:name_width$}  {:>8}",
            "ID", "NAME", "SEX", "BORN", "SPOUSE", "CHILDREN"
        )
        .dim()
    );
    for individual in individuals {
        let spouse = records
            .spouse_of(&individual.id)
            .map_or("", Individual::display_name);
        println!(
            "{:id_width$}  {:name_width$}  {:3}  {:12}  {:name_width$}  {:>8}",
            individual.id.as_str(),
            truncate(individual.display_name(), name_width),
            individual.sex.as_ref().map_or("", |sex| sex.as_str()),
            individual.birth_date.as_deref().unwrap_or(""),
            truncate(spouse, name_width),
            records.children_of(&individual.id).len(),
        );
    }
}

/// The name and spouse columns share whatever the terminal leaves after the
/// fixed columns.
fn name_width(id_width: usize) -> usize {
    let fixed = id_width + 2 + 3 + 2 + 12 + 2 + 2 + 8;
    terminal::terminal_width().map_or(24, |width| {
        (usize::from(width).saturating_sub(fixed) / 2).max(MIN_NAME_WIDTH)
    })
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
