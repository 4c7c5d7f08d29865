use std::path::{Path, PathBuf};

mod export;
mod list;
mod r#move;
mod resync;
mod terminal;

use clap::ArgAction;
use export::ExportAnnotations;
use lesson_cards::{domain::config::CONFIG_FILE, Config};
use list::List;
use r#move::Move;
use resync::Resync;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The content directory holding `config.json` and the lesson files
    #[arg(short, long, default_value = "content", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(&self.root)
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
    /// Move a card to another lesson
    ///
    /// The card gets a new UID in the destination lesson, and its Anki note is
    /// retagged and moved to the lesson's deck.
    Move(Move),

    /// Retry the Anki update of a card that has already been moved
    Resync(Resync),

    /// List all lessons and their cards
    List(List),

    /// Export a book's annotations from the local Zotero database
    ExportAnnotations(ExportAnnotations),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Move(command) => command.run(root)?,
            Self::Resync(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::ExportAnnotations(command) => command.run(root)?,
        }
        Ok(())
    }
}

/// Load the collection configuration from the content directory.
fn load_config(root: &Path) -> anyhow::Result<Config> {
    let path = root.join(CONFIG_FILE);
    let config = Config::load(&path)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Connect to Anki and mirror a finished move, reporting the outcome.
fn sync_to_anki(config: &Config, moved: &lesson_cards::relocate::Moved) {
    use lesson_cards::{
        relocate::{self, SyncFailure, SyncOutcome},
        AnkiConnect,
    };
    use terminal::Colorize;

    let outcome = match AnkiConnect::new(config.anki_connect_url()) {
        Ok(anki) => relocate::sync(&anki, config, moved),
        Err(e) => SyncOutcome::Failed(SyncFailure::Service(e)),
    };

    match outcome {
        SyncOutcome::Synced => {
            println!("  Updated Anki (uid tag, chapter tag, and deck)");
        }
        SyncOutcome::Failed(failure) => {
            println!("  {}", format!("Warning: {failure}").warning());
            println!(
                "  {}",
                format!(
                    "Could not update Anki. Retry with: cards resync {} {}",
                    moved.old_uid, moved.new_uid
                )
                .dim()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    /// A content directory with lesson 12 (`p-12-070`, `p-12-071`) and lesson
    /// 8 (`p-08-001` to `p-08-004`). Anki is configured on a port nothing
    /// listens on.
    pub(super) fn content_dir() -> TempDir {
        let tmp = tempfile::tempdir().unwrap();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let closed = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let files = [
            (
                CONFIG_FILE,
                json!({"uid_prefix": "p", "deck": "Book", "anki_connect_url": closed}),
            ),
            (
                "lesson_12.json",
                json!({"title": "Transformers", "cards": [
                    {"uid": "p-12-070", "front": "Other", "tags": ["ch12"]},
                    {"uid": "p-12-071", "front": "What is attention?", "tags": ["ch12", "important"]},
                ]}),
            ),
            (
                "lesson_08.json",
                json!({"title": "Single-layer Networks", "cards": (1..=4)
                    .map(|n| json!({"uid": format!("p-08-{n:03}"), "front": "Q"}))
                    .collect::<Vec<_>>()}),
            ),
        ];
        for (name, value) in files {
            fs::write(tmp.path().join(name), value.to_string()).unwrap();
        }

        tmp
    }

    /// The contents of both lesson files.
    pub(super) fn lessons(root: &Path) -> (String, String) {
        (
            fs::read_to_string(root.join("lesson_12.json")).unwrap(),
            fs::read_to_string(root.join("lesson_08.json")).unwrap(),
        )
    }

    #[test]
    fn parses_move() {
        let cli = Cli::try_parse_from(["cards", "move", "p-12-071", "08", "--dry-run"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("content"));
        assert!(matches!(cli.command, Command::Move(_)));
    }

    #[test]
    fn move_requires_numeric_lesson() {
        assert!(Cli::try_parse_from(["cards", "move", "p-12-071", "eight"]).is_err());
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["cards", "list", "-vv", "--root", "elsewhere"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.root, PathBuf::from("elsewhere"));
    }

    #[test]
    fn parses_export_defaults() {
        let cli = Cli::try_parse_from(["cards", "export-annotations"]).unwrap();
        assert!(matches!(cli.command, Command::ExportAnnotations(_)));
    }

    #[test]
    fn load_config_reports_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let error = load_config(tmp.path()).unwrap_err();
        assert!(error.to_string().starts_with("Failed to read config file"));
    }
}
