//! Domain models for lesson cards.
//!
//! This module contains the core domain types: card identifiers, cards and
//! lessons, and the collection configuration.

/// Card and lesson documents.
pub mod lesson;
pub use lesson::{Card, Lesson};

/// Collection configuration.
pub mod config;
pub use config::Config;

/// Card identifier (UID) parsing and formatting.
pub mod uid;
pub use uid::{Error as UidError, Uid};
