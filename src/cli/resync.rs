use std::path::Path;

use lesson_cards::{relocate, Directory};
use tracing::instrument;

use crate::cli::{load_config, sync_to_anki};

#[derive(Debug, clap::Parser)]
pub struct Resync {
    /// The UID the card had before it was moved
    old_uid: String,

    /// The UID the card has now
    new_uid: String,
}

impl Resync {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = load_config(root)?;
        let directory = Directory::new(root.to_path_buf());

        let moved = relocate::recall(&directory, &config, &self.old_uid, &self.new_uid)?;
        println!("Updating Anki for {} → {}", moved.old_uid, moved.new_uid);

        sync_to_anki(&config, &moved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{
        r#move::Move,
        tests::{content_dir, lessons},
    };

    fn command(old_uid: &str, new_uid: &str) -> Resync {
        Resync {
            old_uid: old_uid.to_string(),
            new_uid: new_uid.to_string(),
        }
    }

    #[test]
    fn unreachable_anki_leaves_files_alone() {
        let tmp = content_dir();
        Move::try_parse_from(["move", "p-12-071", "8"])
            .unwrap()
            .run(tmp.path())
            .unwrap();
        let before = lessons(tmp.path());

        command("p-12-071", "p-08-005").run(tmp.path()).unwrap();

        assert_eq!(lessons(tmp.path()), before);
    }

    #[test]
    fn card_must_already_be_moved() {
        let tmp = content_dir();
        let error = command("p-12-071", "p-08-005").run(tmp.path()).unwrap_err();
        assert_eq!(error.to_string(), "Card not found: p-08-005");
    }
}
