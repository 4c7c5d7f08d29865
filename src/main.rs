//! `cards`: move flashcards between lessons and export Zotero annotations.

use std::process::ExitCode;

use clap::Parser;

mod cli;
use cli::Cli;

fn main() -> ExitCode {
    match Cli::parse().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
