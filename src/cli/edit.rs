use std::path::Path;

use anyhow::Context;
use clap::Parser;
use dialoguer::Input;
use kindred::{Individual, Sex, Xref};
use tracing::instrument;

use super::terminal::{Colorize, label};

/// Field values given on the command line.
#[derive(Debug, Default, clap::Args)]
struct Fields {
    /// Display name; a `/` around the surname is removed
    #[arg(long)]
    name: Option<String>,

    /// Sex (M, F, or any other token)
    #[arg(long)]
    sex: Option<String>,

    /// Birth date, as free text
    #[arg(long)]
    birth: Option<String>,

    /// Place of residence
    #[arg(long)]
    residence: Option<String>,

    /// Occupation
    #[arg(long)]
    occupation: Option<String>,
}

impl Fields {
    const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sex.is_none()
            && self.birth.is_none()
            && self.residence.is_none()
            && self.occupation.is_none()
    }

    /// Overwrites the given fields. An empty value clears the field.
    fn apply(self, individual: &mut Individual) {
        if let Some(name) = self.name {
            individual.name = single_line(&name.replace('/', ""));
        }
        if let Some(sex) = self.sex {
            individual.sex = optional(&sex).map(Sex::from);
        }
        if let Some(birth) = self.birth {
            individual.birth_date = optional(&birth);
        }
        if let Some(residence) = self.residence {
            individual.residence = optional(&residence);
        }
        if let Some(occupation) = self.occupation {
            individual.occupation = optional(&occupation);
        }
    }

    /// Prompts for every field, defaulting to the current values.
    fn prompt(individual: &Individual) -> anyhow::Result<Self> {
        let ask = |prompt: &str, current: Option<&str>| -> anyhow::Result<Option<String>> {
            let value = Input::<String>::new()
                .with_prompt(prompt)
                .with_initial_text(current.unwrap_or_default())
                .allow_empty(true)
                .interact_text()
                .context("failed to read input")?;
            Ok(Some(value))
        };

        Ok(Self {
            name: ask("Name", Some(&individual.name))?,
            sex: ask("Sex", individual.sex.as_ref().map(|sex| sex.as_str()))?,
            birth: ask("Born", individual.birth_date.as_deref())?,
            residence: ask("Residence", individual.residence.as_deref())?,
            occupation: ask("Occupation", individual.occupation.as_deref())?,
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let value = single_line(value);
    (!value.is_empty()).then_some(value)
}

/// Joins the lines of a pasted or escaped value with single spaces.
fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Parser)]
pub struct Add {
    #[command(flatten)]
    fields: Fields,
}

impl Add {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut archive = super::open_archive(root)?;
        let mut individual = archive.add_individual()?;

        if !self.fields.is_empty() {
            self.fields.apply(&mut individual);
            archive.update_individual(individual.clone())?;
        }

        println!("{}", format!("✅ Added {}", individual.id).success());
        println!("  {}", label(&individual));
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Edit {
    /// The id of the individual to edit
    #[clap(value_parser = super::parse_xref)]
    id: Xref,

    #[command(flatten)]
    fields: Fields,
}

impl Edit {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut archive = super::open_archive(root)?;

        let Some(existing) = archive.records().individual(&self.id) else {
            anyhow::bail!("Individual {} not found", self.id);
        };
        let mut individual = existing.clone();

        let fields = if self.fields.is_empty() {
            Fields::prompt(&individual)?
        } else {
            self.fields
        };
        fields.apply(&mut individual);

        archive.update_individual(individual.clone())?;
        println!("{}", format!("✅ Updated {}", individual.id).success());
        println!("  {}", label(&individual));
        Ok(())
    }
}
