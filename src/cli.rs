use std::path::{Path, PathBuf};

mod delete;
mod diagnose;
mod edit;
mod family;
mod import;
mod list;
mod show;
mod terminal;
mod tree;

use anyhow::Context;
use clap::ArgAction;
use delete::{Clear, Delete};
use diagnose::Diagnose;
use edit::{Add, Edit};
use family::Family;
use import::{Export, Import};
use kindred::{Archive, Config, DirectoryStore, Xref};
use list::List;
use show::Show;
use tracing::instrument;
use tree::{Ancestors, Descendants};

const CONFIG_FILE: &str = "config.toml";

/// Parse an individual or family id, adding the `@` delimiters if they were
/// left off.
///
/// `I1` and `@I1@` name the same record.
fn parse_xref(s: &str) -> Result<Xref, String> {
    let trimmed = s.trim().trim_matches('@');
    if trimmed.is_empty() {
        return Err("id must not be empty".to_string());
    }
    format!("@{trimmed}@")
        .parse()
        .map_err(|e| format!("{e}"))
}

fn load_config(root: &Path) -> Config {
    Config::load_or_default(&root.join(CONFIG_FILE))
}

fn open_archive(root: &Path) -> anyhow::Result<Archive<DirectoryStore>> {
    Archive::open(DirectoryStore::new(root.to_path_buf()))
        .with_context(|| format!("failed to open archive in {}", root.display()))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the root of the archive directory
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::List(List::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Initialize a new archive
    Init,

    /// Replace every record with the contents of a GEDCOM file
    Import(Import),

    /// Write every record to a GEDCOM file
    Export(Export),

    /// List individuals (default)
    List(List),

    /// Show an individual and their immediate relatives
    Show(Show),

    /// Create a new individual
    Add(Add),

    /// Edit an individual's details
    Edit(Edit),

    /// Delete an individual
    ///
    /// Family units that reference the individual are left unchanged.
    Delete(Delete),

    /// Delete every record
    Clear(Clear),

    /// Create or replace a family unit
    ///
    /// The husband, wife and children are linked back to the family unit.
    Family(Family),

    /// Show descendant trees
    Descendants(Descendants),

    /// Show the ancestor tree of an individual
    Ancestors(Ancestors),

    /// Report dangling references and parentage cycles
    Diagnose(Diagnose),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Init => Init::run(&root)?,
            Self::Import(command) => command.run(&root)?,
            Self::Export(command) => command.run(&root)?,
            Self::List(command) => command.run(&root)?,
            Self::Show(command) => command.run(&root)?,
            Self::Add(command) => command.run(&root)?,
            Self::Edit(command) => command.run(&root)?,
            Self::Delete(command) => command.run(&root)?,
            Self::Clear(command) => command.run(&root)?,
            Self::Family(command) => command.run(&root)?,
            Self::Descendants(command) => command.run(&root)?,
            Self::Ancestors(command) => command.run(&root)?,
            Self::Diagnose(command) => command.run(&root)?,
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Init {}

impl Init {
    #[instrument]
    fn run(root: &Path) -> anyhow::Result<()> {
        use std::fs;

        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!("Archive already initialized (found existing {CONFIG_FILE})");
        }

        fs::create_dir_all(root)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", root.display()))?;

        Config::default()
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {CONFIG_FILE}: {e}"))?;

        println!("Initialized archive in {}", root.display());
        println!("  Created: {CONFIG_FILE}");
        println!();
        println!("Next steps:");
        println!("  kin import family.ged");
        println!("  kin add --name \"Ada Lovelace\" --sex F");

        Ok(())
    }
}
