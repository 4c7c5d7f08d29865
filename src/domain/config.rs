use std::path::Path;

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// The file name of the configuration inside the content directory.
pub const CONFIG_FILE: &str = "config.json";

/// The address AnkiConnect listens on by default.
pub const DEFAULT_ANKI_CONNECT_URL: &str = "http://127.0.0.1:8765";

/// Configuration for a card collection.
///
/// Loaded once per invocation from `config.json` and passed by reference to
/// everything that needs it. Unknown keys in the file are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The prefix shared by every card UID in the collection.
    ///
    /// This is the first component of the UID, e.g.
    /// `deep-learning-foundations-and-concepts` in
    /// `deep-learning-foundations-and-concepts-12-071`.
    uid_prefix: NonEmptyString,

    /// The top-level Anki deck. Each lesson is a subdeck named after the
    /// lesson title.
    deck: String,

    /// Where to reach the AnkiConnect add-on.
    #[serde(default = "default_anki_connect_url")]
    anki_connect_url: String,
}

impl Config {
    /// Create a configuration with the default AnkiConnect address.
    #[must_use]
    pub fn new(uid_prefix: NonEmptyString, deck: String) -> Self {
        Self {
            uid_prefix,
            deck,
            anki_connect_url: default_anki_connect_url(),
        }
    }

    /// Loads the configuration from a JSON file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the JSON content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| LoadError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Returns the UID prefix.
    #[must_use]
    pub fn uid_prefix(&self) -> &str {
        self.uid_prefix.as_str()
    }

    /// Returns the top-level deck name.
    #[must_use]
    pub fn deck(&self) -> &str {
        &self.deck
    }

    /// Returns the AnkiConnect endpoint.
    #[must_use]
    pub fn anki_connect_url(&self) -> &str {
        &self.anki_connect_url
    }

    /// The subdeck a lesson's cards live in, e.g. `Book::Lesson Title`.
    #[must_use]
    pub fn lesson_deck(&self, lesson_title: &str) -> String {
        format!("{}::{lesson_title}", self.deck)
    }
}

fn default_anki_connect_url() -> String {
    DEFAULT_ANKI_CONNECT_URL.to_string()
}

/// Errors that can occur while loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// The configuration path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not a valid configuration.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// The configuration path.
        path: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}
