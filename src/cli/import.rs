use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use kindred::{
    ArchiveError,
    storage::gedcom::{self, DecodeReport, Header},
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Import {
    /// The GEDCOM file to read
    file: PathBuf,
}

impl Import {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let decoded = gedcom::read_file(&self.file)?;

        let mut archive = super::open_archive(root)?;
        let report = match archive.import(decoded) {
            Ok(report) => report,
            Err(ArchiveError::ImportNotSaved { report, source }) => {
                print_skipped(&report);
                return Err(source).context("imported records could not be saved");
            }
            Err(e) => return Err(e.into()),
        };

        let records = archive.records();
        println!(
            "{}",
            format!(
                "✅ Imported {} individuals and {} family units",
                records.individuals().len(),
                records.families().len()
            )
            .success()
        );

        print_skipped(&report);
        Ok(())
    }
}

fn print_skipped(report: &DecodeReport) {
    if report.is_clean() {
        return;
    }
    println!(
        "{}",
        format!("⚠️  Skipped {} malformed lines:", report.skipped.len()).warning()
    );
    for line in &report.skipped {
        println!("  • line {}: {}", line.number, line.reason);
    }
}

#[derive(Debug, Parser)]
pub struct Export {
    /// The file to write, or `-` for stdout [default: the configured export
    /// file name in the archive root]
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Export {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = super::load_config(root);
        let archive = super::open_archive(root)?;
        let records = archive.records();

        let header = Header::from(&config);

        let path = self
            .output
            .unwrap_or_else(|| root.join(&config.export_file_name));
        if path == Path::new("-") {
            let mut stdout = std::io::stdout().lock();
            return gedcom::write(&mut stdout, &header, records.individuals(), records.families())
                .context("failed to write to stdout");
        }
        gedcom::write_file(&path, &header, records.individuals(), records.families())?;

        println!(
            "{}",
            format!(
                "✅ Exported {} individuals and {} family units to {}",
                records.individuals().len(),
                records.families().len(),
                path.display()
            )
            .success()
        );
        Ok(())
    }
}
