//! Zotero annotation export
//!
//! Zotero's local HTTP API does not expose PDF annotations, so they are read
//! straight from `zotero.sqlite`. The database is only ever opened read-only.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use rusqlite::{types::ValueRef, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

/// The kind of an annotation, as stored in `itemAnnotations.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// A text highlight.
    Highlight,
    /// A sticky note.
    Note,
    /// A rectangular image selection.
    Image,
    /// A freehand drawing.
    Ink,
    /// A text underline.
    Underline,
    /// A free text box.
    Text,
    /// Any type code this tool does not know about.
    Unknown,
}

impl From<i64> for AnnotationType {
    fn from(code: i64) -> Self {
        match code {
            1 => Self::Highlight,
            2 => Self::Note,
            3 => Self::Image,
            4 => Self::Ink,
            5 => Self::Underline,
            6 => Self::Text,
            _ => Self::Unknown,
        }
    }
}

/// A single annotation on a book's attachment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// The annotated text.
    pub text: Option<String>,
    /// The reader's comment.
    pub comment: Option<String>,
    /// The page label shown in the reader.
    pub page_label: Option<String>,
    /// The highlight color, e.g. `#ffd400`.
    pub color: Option<String>,
    /// Zotero's position key. Annotations are ordered by it.
    pub sort_index: Value,
    /// The annotation kind.
    #[serde(rename = "type")]
    pub kind: AnnotationType,
}

/// The book an export was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    /// The item title.
    pub title: String,
    /// The Zotero item key.
    pub key: String,
}

/// The exported document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Export {
    /// The book.
    pub book: Book,
    /// Its annotations, in reading order.
    pub annotations: Vec<Annotation>,
}

impl Export {
    /// Write the export as indented JSON, creating parent directories.
    ///
    /// Non-ASCII text is written as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directories cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let io_error = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut content = serde_json::to_vec_pretty(self)?;
        content.push(b'\n');

        fs::File::create(path)
            .and_then(|mut file| file.write_all(&content))
            .map_err(io_error)
    }
}

/// A read-only handle on a Zotero database.
#[derive(Debug)]
pub struct Library {
    conn: Connection,
}

impl Library {
    /// Open the database at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    /// Look up a book by its item key.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn book(&self, key: &str) -> Result<Option<Book>, Error> {
        let title: Option<String> = self
            .conn
            .query_row(
                "SELECT idv.value
                 FROM items i
                 JOIN itemData id ON i.itemID = id.itemID
                 JOIN itemDataValues idv ON id.valueID = idv.valueID
                 JOIN fields f ON id.fieldID = f.fieldID
                 WHERE i.key = ?1 AND f.fieldName = 'title'",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(title.map(|title| Book {
            title,
            key: key.to_string(),
        }))
    }

    /// Every annotation on the attachments of the book with `key`, ordered by
    /// sort index.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn annotations(&self, key: &str) -> Result<Vec<Annotation>, Error> {
        let mut stmt = self.conn.prepare(
            "SELECT ia.text, ia.comment, ia.pageLabel, ia.color, ia.sortIndex, ia.type
             FROM itemAnnotations ia
             JOIN items i ON ia.parentItemID = i.itemID
             JOIN itemAttachments att ON i.itemID = att.itemID
             WHERE att.parentItemID = (SELECT itemID FROM items WHERE key = ?1)
             ORDER BY ia.sortIndex",
        )?;

        let annotations = stmt
            .query_map([key], |row| {
                Ok(Annotation {
                    text: row.get(0)?,
                    comment: row.get(1)?,
                    page_label: row.get(2)?,
                    color: row.get(3)?,
                    sort_index: to_json(row.get_ref(4)?),
                    kind: AnnotationType::from(row.get::<_, i64>(5)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Read {} annotations for {key}", annotations.len());
        Ok(annotations)
    }

    /// Build the export for the book with `key`, or `None` if there is no
    /// such book.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    #[instrument(skip(self))]
    pub fn export(&self, key: &str) -> Result<Option<Export>, Error> {
        let Some(book) = self.book(key)? else {
            return Ok(None);
        };
        let annotations = self.annotations(key)?;
        Ok(Some(Export { book, annotations }))
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => i.into(),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned().into(),
    }
}

/// Errors that can occur while exporting annotations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The database could not be opened or queried.
    #[error("Zotero database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The export could not be serialized.
    #[error("Failed to serialize annotations: {0}")]
    Json(#[from] serde_json::Error),

    /// The export could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        /// The output path.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}
