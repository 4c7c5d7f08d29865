use std::path::Path;

use anyhow::Context;
use clap::Parser;
use lesson_cards::{domain::uid::short_id, Card, Directory, Lesson};
use regex::Regex;
use tracing::instrument;

use crate::cli::terminal::truncate;

const FRONT_WIDTH: usize = 80;

/// Command arguments for `cards list`.
#[derive(Debug, Parser)]
pub struct List {
    /// Case-insensitive substring match against the question side.
    #[arg(long, conflicts_with = "regex")]
    contains: Option<String>,

    /// Regular expression match against the question side.
    #[arg(long)]
    regex: Option<String>,
}

impl List {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let directory = Directory::new(root.to_path_buf());
        let filter = Filter::new(&self)?;

        for (path, lesson) in directory.load_all()? {
            let title = lesson.title().map_or_else(
                || {
                    path.file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default()
                },
                str::to_string,
            );
            print!("{}", render(&title, &lesson, &filter));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
struct Filter {
    contains: Option<String>,
    regex: Option<Regex>,
}

impl Filter {
    fn new(cmd: &List) -> anyhow::Result<Self> {
        let regex = if let Some(pattern) = &cmd.regex {
            Some(Regex::new(pattern).with_context(|| format!("invalid regex: {pattern}"))?)
        } else {
            None
        };

        Ok(Self {
            contains: cmd.contains.as_deref().map(str::to_lowercase),
            regex,
        })
    }

    fn any(&self) -> bool {
        self.contains.is_some() || self.regex.is_some()
    }

    fn matches(&self, card: &Card) -> bool {
        let front = card.front().unwrap_or_default();

        if let Some(search) = &self.contains {
            if !front.to_lowercase().contains(search) {
                return false;
            }
        }

        if let Some(regex) = &self.regex {
            if !regex.is_match(front) {
                return false;
            }
        }

        true
    }
}

/// Render one lesson block. Lessons with no matching cards are skipped when a
/// filter is active.
fn render(title: &str, lesson: &Lesson, filter: &Filter) -> String {
    let lines: Vec<String> = lesson
        .cards
        .iter()
        .filter(|card| filter.matches(card))
        .map(|card| {
            format!(
                "- {}: {}",
                short_id(card.uid()),
                truncate(card.front().unwrap_or_default(), FRONT_WIDTH)
            )
        })
        .collect();

    if lines.is_empty() && filter.any() {
        return String::new();
    }

    let mut out = format!("# {title}\n");
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn lesson() -> Lesson {
        serde_json::from_value(json!({
            "title": "Transformers",
            "cards": [
                {"uid": "p-12-070", "front": "What is attention?"},
                {"uid": "p-12-071", "front": "x".repeat(100)},
                {"uid": "legacy", "front": "Positional encoding"},
            ]
        }))
        .unwrap()
    }

    #[test]
    fn renders_lesson_block() {
        let out = render("Transformers", &lesson(), &Filter::default());
        let expected = format!(
            "# Transformers\n- 070: What is attention?\n- 071: {}...\n- legacy: Positional encoding\n\n",
            "x".repeat(80)
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_lesson_keeps_heading() {
        let empty: Lesson = serde_json::from_value(json!({"cards": []})).unwrap();
        assert_eq!(render("lesson_03", &empty, &Filter::default()), "# lesson_03\n\n");
    }

    #[test]
    fn contains_filter_is_case_insensitive() {
        let cmd = List::try_parse_from(["list", "--contains", "ATTENTION"]).unwrap();
        let out = render("Transformers", &lesson(), &Filter::new(&cmd).unwrap());
        assert_eq!(out, "# Transformers\n- 070: What is attention?\n\n");
    }

    #[test]
    fn regex_filter_skips_lessons_without_matches() {
        let cmd = List::try_parse_from(["list", "--regex", "^Backprop"]).unwrap();
        assert_eq!(render("Transformers", &lesson(), &Filter::new(&cmd).unwrap()), "");
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let cmd = List::try_parse_from(["list", "--regex", "("]).unwrap();
        assert!(Filter::new(&cmd).is_err());
    }
}
