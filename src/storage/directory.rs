//! A filesystem backed store of lessons
//!
//! The [`Directory`] owns the content directory: one `lesson_NN.json` file
//! per lesson, plus the collection's `config.json`.

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{
    domain::{uid::card_number, Card, Lesson},
    storage::path_parser::{construct_lesson_path, is_lesson_file},
};

/// A filesystem backed store of lessons.
#[derive(Debug, Clone)]
pub struct Directory {
    /// The directory lesson files are stored in.
    root: PathBuf,
}

/// A card found by [`Directory::find_by_uid`], together with the lesson that
/// owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    /// A copy of the card record.
    pub card: Card,
    /// The lesson document the card was found in.
    pub lesson: Lesson,
    /// The path of that lesson document.
    pub path: PathBuf,
    /// The card's position within the lesson.
    pub index: usize,
}

impl Directory {
    /// Opens a directory at the given path.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The content directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path a lesson is stored at, whether or not it exists.
    #[must_use]
    pub fn lesson_path(&self, lesson: u32) -> PathBuf {
        construct_lesson_path(&self.root, lesson)
    }

    /// Every lesson file in the directory, in ascending file name order.
    ///
    /// Subdirectories are not searched. A missing directory has no lessons.
    #[must_use]
    pub fn lesson_paths(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| is_lesson_file(path))
            .collect()
    }

    /// Load a lesson by number.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NotFound`] if there is no file for the lesson, or
    /// another [`LoadError`] if it cannot be read or parsed.
    pub fn load(&self, lesson: u32) -> Result<Lesson, LoadError> {
        load_lesson(&self.lesson_path(lesson))
    }

    /// Load every lesson, in ascending file name order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered while reading or parsing a file.
    pub fn load_all(&self) -> Result<Vec<(PathBuf, Lesson)>, LoadError> {
        self.lesson_paths()
            .into_iter()
            .map(|path| load_lesson(&path).map(|lesson| (path, lesson)))
            .collect()
    }

    /// Find a card by UID.
    ///
    /// Lessons are scanned in ascending file name order and the first match
    /// wins. UIDs are assumed to be unique across the collection; duplicates
    /// are not reported.
    ///
    /// # Errors
    ///
    /// Returns [`FindError::NotFound`] if no lesson contains the card, or
    /// [`FindError::Load`] if a lesson file cannot be loaded along the way.
    pub fn find_by_uid(&self, uid: &str) -> Result<Located, FindError> {
        for path in self.lesson_paths() {
            let lesson = load_lesson(&path)?;
            if let Some(index) = lesson.position(uid) {
                tracing::debug!("Found {uid} at index {index} of {}", path.display());
                return Ok(Located {
                    card: lesson.cards[index].clone(),
                    lesson,
                    path,
                    index,
                });
            }
        }

        Err(FindError::NotFound(uid.to_string()))
    }

    /// Write a single lesson file.
    ///
    /// # Errors
    ///
    /// Returns an error if the lesson cannot be serialized or written.
    pub fn save(&self, path: &Path, lesson: &Lesson) -> Result<(), SaveError> {
        self.save_all(&[(path, lesson)])
    }

    /// Write several lesson files together.
    ///
    /// Every lesson is first written in full to a temporary file next to its
    /// destination. Only once all of them are staged are they renamed into
    /// place, so a failure while writing leaves every original untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a lesson cannot be serialized, written or renamed.
    pub fn save_all(&self, lessons: &[(&Path, &Lesson)]) -> Result<(), SaveError> {
        let staged = lessons
            .iter()
            .map(|&(path, lesson)| stage(path, lesson).map(|file| (file, path)))
            .collect::<Result<Vec<_>, _>>()?;

        for (file, path) in staged {
            file.persist(path).map_err(|e| SaveError::Io {
                path: path.to_path_buf(),
                source: e.error,
            })?;
            tracing::debug!(
                "Wrote {}",
                path.strip_prefix(&self.root).unwrap_or(path).display()
            );
        }

        Ok(())
    }
}

/// Returns the next free card number for a lesson.
///
/// This is one more than the highest card number among the lesson's cards
/// whose UID carries `prefix` and `lesson_number`, or 1 if there are none.
/// Numbers freed by earlier moves are never handed out again.
#[must_use]
pub fn next_card_number(lesson: &Lesson, prefix: &str, lesson_number: u32) -> u32 {
    lesson
        .cards
        .iter()
        .filter_map(|card| card_number(card.uid(), prefix, lesson_number))
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

fn load_lesson(path: &Path) -> Result<Lesson, LoadError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn stage(path: &Path, lesson: &Lesson) -> Result<NamedTempFile, SaveError> {
    let io_error = |source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(parent).map_err(io_error)?;

    // Keep the permissions of the file being replaced
    if let Ok(metadata) = fs::metadata(path) {
        file.as_file()
            .set_permissions(metadata.permissions())
            .map_err(io_error)?;
    }

    let mut writer = BufWriter::new(file.as_file_mut());
    serde_json::to_writer_pretty(&mut writer, lesson).map_err(|source| SaveError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(io_error)?;
    writer.flush().map_err(io_error)?;
    drop(writer);

    Ok(file)
}

/// Errors that can occur when loading a lesson file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The lesson file does not exist.
    #[error("Lesson file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The lesson file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// The lesson file.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The lesson file is not a valid lesson document.
    #[error("Malformed lesson file {}: {source}", path.display())]
    Json {
        /// The lesson file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Errors that can occur when searching for a card.
#[derive(Debug, thiserror::Error)]
pub enum FindError {
    /// No lesson contains a card with the UID.
    #[error("Card not found: {0}")]
    NotFound(String),

    /// A lesson file could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Errors that can occur when writing lesson files.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The lesson file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        /// The lesson file.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The lesson could not be serialized.
    #[error("Failed to serialize {}: {source}", path.display())]
    Json {
        /// The lesson file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}
