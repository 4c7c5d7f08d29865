use std::fmt;

use serde::{Deserialize, Serialize};

mod connect;
pub use connect::AnkiConnect;

/// An Anki note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An Anki card identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub i64);

/// The tag that ties an Anki note to a card UID, e.g. `uid:dl-12-071`.
#[must_use]
pub fn uid_tag(uid: &str) -> String {
    format!("uid:{uid}")
}

/// The operations the card tooling needs from a study application.
///
/// Tag operations are idempotent: removing a tag a note lacks, or adding one
/// it already has, succeeds without effect.
pub trait StudyApp {
    /// Find the first note under `deck_prefix` (or any of its subdecks)
    /// carrying `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the application cannot be queried. A missing note
    /// is `Ok(None)`.
    fn find_note_by_tag(&self, tag: &str, deck_prefix: &str) -> Result<Option<NoteId>, Error>;

    /// The cards generated from a note.
    ///
    /// # Errors
    ///
    /// Returns an error if the application cannot be queried.
    fn cards_of_note(&self, note: NoteId) -> Result<Vec<CardId>, Error>;

    /// Remove a tag from notes.
    ///
    /// # Errors
    ///
    /// Returns an error if the application rejects the request.
    fn remove_tag(&self, notes: &[NoteId], tag: &str) -> Result<(), Error>;

    /// Add a tag to notes.
    ///
    /// # Errors
    ///
    /// Returns an error if the application rejects the request.
    fn add_tag(&self, notes: &[NoteId], tag: &str) -> Result<(), Error>;

    /// Move cards into a deck, which the application creates if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the application rejects the request.
    fn move_cards(&self, cards: &[CardId], deck: &str) -> Result<(), Error>;
}

/// A failure talking to the study application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The application is not reachable.
    #[error(
        "Cannot connect to Anki at {url}. Make sure Anki is running and the AnkiConnect add-on is \
         installed (code: 2055492159)"
    )]
    Unreachable {
        /// The endpoint that was tried.
        url: String,
        /// The underlying transport error.
        source: reqwest::Error,
    },

    /// The request failed in transit, or the response could not be decoded.
    #[error("AnkiConnect request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The application answered with a non-success status.
    #[error("AnkiConnect responded with status {0}")]
    Status(reqwest::StatusCode),

    /// The application reported an error for the action.
    #[error("AnkiConnect error: {0}")]
    Api(String),

    /// The result did not have the expected shape.
    #[error("Unexpected AnkiConnect result for {action}: {source}")]
    Decode {
        /// The action whose result was malformed.
        action: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}
