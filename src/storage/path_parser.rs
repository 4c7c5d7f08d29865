//! Lesson file naming
//!
//! Every lesson lives in its own file directly inside the content directory,
//! named after its zero-padded lesson number:
//!
//! - `content/lesson_08.json` → lesson 8
//! - `content/lesson_12.json` → lesson 12

use std::path::{Path, PathBuf};

use crate::domain::uid::LESSON_DIGITS;

const STEM_PREFIX: &str = "lesson_";
const EXTENSION: &str = "json";

/// Construct the path of a lesson file.
#[must_use]
pub fn construct_lesson_path(root: &Path, lesson: u32) -> PathBuf {
    root.join(format!("{STEM_PREFIX}{lesson:0LESSON_DIGITS$}"))
        .with_extension(EXTENSION)
}

/// Whether a path looks like a lesson file (`lesson_*.json`).
#[must_use]
pub fn is_lesson_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == EXTENSION)
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.starts_with(STEM_PREFIX))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(8, "content/lesson_08.json")]
    #[test_case(12, "content/lesson_12.json")]
    #[test_case(0, "content/lesson_00.json")]
    #[test_case(123, "content/lesson_123.json")]
    fn construct(lesson: u32, expected: &str) {
        assert_eq!(
            construct_lesson_path(Path::new("content"), lesson),
            PathBuf::from(expected)
        );
    }

    #[test_case("content/lesson_08.json"; "lesson")]
    #[test_case("lesson_3.json"; "unpadded")]
    fn lesson_files(path: &str) {
        assert!(is_lesson_file(Path::new(path)));
    }

    #[test_case("content/config.json"; "config")]
    #[test_case("content/annotations.json"; "export")]
    #[test_case("content/lesson_08.md"; "wrong extension")]
    #[test_case("content/lesson_08"; "no extension")]
    fn other_files(path: &str) {
        assert!(!is_lesson_file(Path::new(path)));
    }
}
