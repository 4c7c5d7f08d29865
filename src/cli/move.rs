use std::path::Path;

use lesson_cards::{
    relocate::{self, Planned},
    Directory,
};
use tracing::instrument;

use crate::cli::{
    load_config, sync_to_anki,
    terminal::{truncate, Colorize},
};

const QUESTION_WIDTH: usize = 60;

#[derive(Debug, clap::Parser)]
pub struct Move {
    /// The UID of the card to move, e.g. `p-12-071`
    uid: String,

    /// The lesson number to move the card to
    lesson: u32,

    /// Show what would change without writing files or contacting Anki
    #[arg(short, long)]
    dry_run: bool,
}

impl Move {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = load_config(root)?;
        let directory = Directory::new(root.to_path_buf());

        let plan = match relocate::plan(&directory, &config, &self.uid, self.lesson)? {
            Planned::AlreadyInLesson(lesson) => {
                println!("Card is already in lesson {lesson}");
                return Ok(());
            }
            Planned::Move(plan) => *plan,
        };

        println!("Moving card:");
        println!("  From: {}", plan.old_uid);
        println!("  To:   {}", plan.new_uid);
        println!("  Deck: {}", plan.deck);
        println!("  Tags: {} → {}", plan.old_tag, plan.new_tag);
        println!("  Question: {}", truncate(&plan.question, QUESTION_WIDTH));

        if self.dry_run {
            println!("\n{}", "[DRY RUN] No changes made.".info());
            return Ok(());
        }

        let moved = plan.apply(&directory)?;
        println!("\n  Updated JSON files");

        sync_to_anki(&config, &moved);

        println!(
            "\n{}",
            format!("Moved {} to {}", moved.old_uid, moved.new_uid).success()
        );
        Ok(())
    }
}
