//! Lesson card tooling
//!
//! Flashcards are stored as one JSON document per lesson. This crate moves
//! cards between lessons while keeping Anki in step, and exports book
//! annotations from Zotero.

pub mod domain;
pub use domain::{Card, Config, Lesson, Uid};

/// Filesystem storage of lesson documents.
pub mod storage;
pub use storage::Directory;

/// The study application the cards are mirrored into.
pub mod anki;
pub use anki::{AnkiConnect, StudyApp};

/// Moving cards between lessons.
pub mod relocate;

/// Exporting annotations from the reference manager.
pub mod annotations;
