use std::path::{Path, PathBuf};

use anyhow::Context;
use lesson_cards::annotations::Library;
use tracing::instrument;

use crate::cli::terminal::Colorize;

/// The Zotero item key of the book annotations are exported from by default.
const DEFAULT_KEY: &str = "6LKJEGD4";

#[derive(Debug, clap::Parser)]
pub struct ExportAnnotations {
    /// Path to the Zotero database [default: ~/Zotero/zotero.sqlite]
    #[arg(long)]
    database: Option<PathBuf>,

    /// The Zotero item key of the book
    #[arg(long, default_value = DEFAULT_KEY)]
    key: String,

    /// Where to write the export [default: <root>/annotations.json]
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExportAnnotations {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let database = match self.database {
            Some(path) => path,
            None => default_database()?,
        };

        if !database.exists() {
            println!("Zotero database not found: {}", database.display());
            return Ok(());
        }

        let library = Library::open(&database)
            .with_context(|| format!("Failed to open {}", database.display()))?;

        let Some(export) = library.export(&self.key)? else {
            println!("Book not found with key: {}", self.key);
            return Ok(());
        };

        println!("Found: {}", export.book.title);
        println!("Found {} annotations", export.annotations.len());

        let output = self
            .output
            .unwrap_or_else(|| root.join("annotations.json"));
        export.write(&output)?;

        println!(
            "{}",
            format!("Wrote annotations to: {}", output.display()).success()
        );
        Ok(())
    }
}

fn default_database() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    Ok(home.join("Zotero").join("zotero.sqlite"))
}
