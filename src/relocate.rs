//! Moving a card from one lesson to another
//!
//! A move runs in three steps, each consuming the output of the last:
//!
//! 1. [`plan`] validates the UID, locates the card, loads the destination
//!    lesson and works out the new UID, deck and chapter tag. Nothing is
//!    written. A dry run stops here.
//! 2. [`Plan::apply`] rewrites the card and saves both lesson files. The files
//!    are the source of truth, so this always happens before Anki is touched.
//! 3. [`sync`] mirrors the move into Anki. Failures here are reported, not
//!    raised: the files are already correct and Anki can be reconciled later.
//!
//! [`recall`] rebuilds the outcome of step 2 from the two UIDs, so a sync that
//! failed can be run again later.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::{
    anki::{self, uid_tag, StudyApp},
    domain::{uid::chapter_tag, Lesson, Uid, UidError},
    storage::{next_card_number, Directory, FindError, LoadError, Located, SaveError},
    Config,
};

/// The result of planning a move.
#[derive(Debug)]
pub enum Planned {
    /// The UID already belongs to the destination lesson. Nothing to do.
    AlreadyInLesson(u32),

    /// The card needs to move.
    Move(Box<Plan>),
}

/// Everything needed to carry out a move.
#[derive(Debug)]
pub struct Plan {
    /// The card's current UID.
    pub old_uid: String,
    /// The UID the card will have in its new lesson.
    pub new_uid: String,
    /// The Anki deck the card's note will move to.
    pub deck: String,
    /// The chapter tag to remove.
    pub old_tag: String,
    /// The chapter tag to add.
    pub new_tag: String,
    /// The question side of the card.
    pub question: String,

    source: Located,
    destination_path: PathBuf,
    destination: Lesson,
}

/// A move that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moved {
    /// The card's previous UID.
    pub old_uid: String,
    /// The card's UID after the move.
    pub new_uid: String,
    /// The Anki deck the card belongs in.
    pub deck: String,
    /// The previous chapter tag.
    pub old_tag: String,
    /// The new chapter tag.
    pub new_tag: String,
    /// The lesson file the card was taken from.
    pub source_path: PathBuf,
    /// The lesson file the card was appended to.
    pub destination_path: PathBuf,
}

/// How mirroring a move into Anki went.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The note's tags and deck now match the files.
    Synced,

    /// Anki was not updated. The move itself still stands.
    Failed(SyncFailure),
}

/// Why a move could not be mirrored into Anki.
#[derive(Debug, thiserror::Error)]
pub enum SyncFailure {
    /// No note carries the card's old UID tag, e.g. because it was deleted by
    /// hand.
    #[error("Note not found in Anki for {0}")]
    NoteNotFound(String),

    /// Anki could not be reached or rejected a request.
    #[error(transparent)]
    Service(#[from] anki::Error),
}

/// Errors that abort a move before anything is written, or while writing.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    /// The UID is malformed.
    #[error(transparent)]
    Uid(#[from] UidError),

    /// The card could not be found.
    #[error(transparent)]
    Find(#[from] FindError),

    /// The destination lesson could not be loaded.
    #[error(transparent)]
    Destination(#[from] LoadError),

    /// The lesson files could not be written.
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Work out how to move the card `uid` into lesson `destination`.
///
/// Only reads from disk. Destination lessons are never created: the lesson
/// file must already exist.
///
/// # Errors
///
/// Returns an error if the UID is malformed, the card cannot be found, or the
/// destination lesson cannot be loaded.
#[instrument(skip(directory, config))]
pub fn plan(
    directory: &Directory,
    config: &Config,
    uid: &str,
    destination: u32,
) -> Result<Planned, MoveError> {
    let prefix = config.uid_prefix();
    let from = Uid::parse(uid, prefix)?;

    if from.lesson() == destination {
        return Ok(Planned::AlreadyInLesson(destination));
    }

    let source = directory.find_by_uid(uid)?;
    let destination_path = directory.lesson_path(destination);
    let destination_lesson = directory.load(destination)?;

    let to = Uid::new(
        destination,
        next_card_number(&destination_lesson, prefix, destination),
    );

    let plan = Plan {
        old_uid: uid.to_string(),
        new_uid: to.display(prefix).to_string(),
        deck: lesson_deck(config, &destination_lesson, destination),
        old_tag: from.chapter_tag(),
        new_tag: chapter_tag(destination),
        question: source.card.front().unwrap_or_default().to_string(),
        source,
        destination_path,
        destination: destination_lesson,
    };

    info!("Planned move {} -> {}", plan.old_uid, plan.new_uid);
    Ok(Planned::Move(Box::new(plan)))
}

impl Plan {
    /// Rewrite the card and save both lessons.
    ///
    /// The card gets its new UID and chapter tag and is appended to the end of
    /// the destination lesson. All its other fields are kept as they were.
    ///
    /// # Errors
    ///
    /// Returns an error if the lesson files cannot be written. In that case
    /// neither file has been changed.
    #[instrument(skip(self, directory), fields(old_uid = %self.old_uid, new_uid = %self.new_uid))]
    pub fn apply(self, directory: &Directory) -> Result<Moved, MoveError> {
        let Self {
            old_uid,
            new_uid,
            deck,
            old_tag,
            new_tag,
            question: _,
            source,
            destination_path,
            mut destination,
        } = self;

        let Located {
            mut card,
            lesson: mut source_lesson,
            path: source_path,
            index,
        } = source;

        card.set_uid(new_uid.clone());
        card.retag(&old_tag, &new_tag);

        source_lesson.cards.remove(index);

        if source_path == destination_path {
            // The card was filed under the destination lesson already, only
            // its UID disagreed. Edit the one document in place.
            source_lesson.cards.push(card);
            directory.save(&source_path, &source_lesson)?;
        } else {
            destination.cards.push(card);
            directory.save_all(&[
                (&source_path, &source_lesson),
                (&destination_path, &destination),
            ])?;
        }

        info!("Moved {old_uid} to {new_uid}");

        Ok(Moved {
            old_uid,
            new_uid,
            deck,
            old_tag,
            new_tag,
            source_path,
            destination_path,
        })
    }
}

/// Reconstruct a move that has already been written to disk.
///
/// The card must now be filed under `new_uid`. Tags and deck are derived the
/// same way [`plan`] derives them.
///
/// # Errors
///
/// Returns an error if either UID is malformed, or no card has `new_uid`.
#[instrument(skip(directory, config))]
pub fn recall(
    directory: &Directory,
    config: &Config,
    old_uid: &str,
    new_uid: &str,
) -> Result<Moved, MoveError> {
    let prefix = config.uid_prefix();
    let from = Uid::parse(old_uid, prefix)?;
    let to = Uid::parse(new_uid, prefix)?;

    let located = directory.find_by_uid(new_uid)?;

    Ok(Moved {
        old_uid: old_uid.to_string(),
        new_uid: new_uid.to_string(),
        deck: lesson_deck(config, &located.lesson, to.lesson()),
        old_tag: from.chapter_tag(),
        new_tag: to.chapter_tag(),
        source_path: directory.lesson_path(from.lesson()),
        destination_path: located.path,
    })
}

fn lesson_deck(config: &Config, lesson: &Lesson, number: u32) -> String {
    match lesson.title() {
        Some(title) => config.lesson_deck(title),
        None => config.lesson_deck(&format!("Lesson {number:02}")),
    }
}

/// Mirror a completed move into the study application.
///
/// The note is looked up by its old UID tag within the collection's top-level
/// deck. Its UID and chapter tags are swapped and all its cards are moved to
/// the new lesson deck.
#[instrument(skip(app, config, moved), fields(uid = %moved.old_uid))]
pub fn sync(app: &impl StudyApp, config: &Config, moved: &Moved) -> SyncOutcome {
    match try_sync(app, config, moved) {
        Ok(()) => SyncOutcome::Synced,
        Err(failure) => {
            warn!("Could not update Anki: {failure}");
            SyncOutcome::Failed(failure)
        }
    }
}

fn try_sync(app: &impl StudyApp, config: &Config, moved: &Moved) -> Result<(), SyncFailure> {
    let old_uid_tag = uid_tag(&moved.old_uid);
    let new_uid_tag = uid_tag(&moved.new_uid);

    let note = app
        .find_note_by_tag(&old_uid_tag, config.deck())?
        .ok_or_else(|| SyncFailure::NoteNotFound(moved.old_uid.clone()))?;

    let cards = app.cards_of_note(note)?;
    let notes = [note];

    app.remove_tag(&notes, &old_uid_tag)?;
    app.add_tag(&notes, &new_uid_tag)?;

    app.remove_tag(&notes, &moved.old_tag)?;
    app.add_tag(&notes, &moved.new_tag)?;

    app.move_cards(&cards, &moved.deck)?;

    Ok(())
}
