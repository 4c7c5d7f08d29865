use std::fmt;

/// Minimum width of the lesson segment of a card UID.
pub const LESSON_DIGITS: usize = 2;

/// Minimum width of the card segment of a card UID.
pub const CARD_DIGITS: usize = 3;

/// The numeric part of a card identifier.
///
/// Format:
/// `{PREFIX}-{LESSON}-{CARD}`, where:
/// - `PREFIX` is the collection-wide prefix from the configuration (e.g.
///   `deep-learning-foundations-and-concepts`)
/// - `LESSON` is the lesson number, zero-padded to two digits
/// - `CARD` is the card number within the lesson, zero-padded to three digits
///
/// The prefix is not stored. It is supplied on parse and on display, so the
/// same value can be compared across collections without string juggling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid {
    lesson: u32,
    card: u32,
}

impl Uid {
    /// Create a UID from its lesson and card numbers.
    #[must_use]
    pub const fn new(lesson: u32, card: u32) -> Self {
        Self { lesson, card }
    }

    /// Returns the lesson number.
    #[must_use]
    pub const fn lesson(&self) -> u32 {
        self.lesson
    }

    /// Returns the card number within the lesson.
    #[must_use]
    pub const fn card(&self) -> u32 {
        self.card
    }

    /// Parse `text` as a UID carrying the given prefix.
    ///
    /// Both numeric segments must be in canonical form: exactly the padded
    /// width, or wider only when the value needs the extra digits. This makes
    /// every accepted identifier survive a round trip through
    /// [`Uid::display`].
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if the text does not carry the prefix, does not have
    /// exactly two numeric segments, or a segment is not canonical.
    ///
    /// # Examples
    ///
    /// ```
    /// use lesson_cards::Uid;
    ///
    /// let uid = Uid::parse("dl-12-071", "dl").unwrap();
    /// assert_eq!(uid.lesson(), 12);
    /// assert_eq!(uid.card(), 71);
    ///
    /// assert!(Uid::parse("dl-12-71", "dl").is_err());
    /// assert!(Uid::parse("other-12-071", "dl").is_err());
    /// ```
    pub fn parse(text: &str, prefix: &str) -> Result<Self, Error> {
        let rest = text
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or_else(|| Error::Prefix {
                uid: text.to_string(),
                prefix: prefix.to_string(),
            })?;

        let (lesson, card) = rest
            .split_once('-')
            .ok_or_else(|| Error::Syntax(text.to_string(), prefix.to_string()))?;

        let lesson = parse_segment(text, lesson, LESSON_DIGITS)?;
        let card = parse_segment(text, card, CARD_DIGITS)?;

        Ok(Self::new(lesson, card))
    }

    /// Returns a displayable representation using the given prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use lesson_cards::Uid;
    ///
    /// let uid = Uid::new(8, 5);
    /// assert_eq!(uid.display("dl").to_string(), "dl-08-005");
    /// ```
    #[must_use]
    pub const fn display<'a>(&self, prefix: &'a str) -> FormattedUid<'a> {
        FormattedUid { uid: *self, prefix }
    }

    /// The chapter tag for this UID's lesson.
    #[must_use]
    pub fn chapter_tag(&self) -> String {
        chapter_tag(self.lesson)
    }
}

fn parse_segment(uid: &str, segment: &str, width: usize) -> Result<u32, Error> {
    let invalid = || Error::Segment {
        uid: uid.to_string(),
        segment: segment.to_string(),
        width,
    };

    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let value: u32 = segment.parse().map_err(|_| invalid())?;

    if format!("{value:0width$}") != segment {
        return Err(invalid());
    }

    Ok(value)
}

/// The chapter tag for a lesson, e.g. `ch08`.
#[must_use]
pub fn chapter_tag(lesson: u32) -> String {
    format!("ch{lesson:0LESSON_DIGITS$}")
}

/// The card number of `uid` if it belongs to `lesson` under `prefix`.
///
/// Unlike [`Uid::parse`], the card segment may be any run of digits, so
/// identifiers written with extra padding (`p-08-0012`) still count.
#[must_use]
pub fn card_number(uid: &str, prefix: &str, lesson: u32) -> Option<u32> {
    let rest = uid.strip_prefix(prefix)?.strip_prefix('-')?;
    let (lesson_segment, card) = rest.split_once('-')?;

    if lesson_segment != format!("{lesson:0LESSON_DIGITS$}")
        || card.is_empty()
        || !card.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    card.parse().ok()
}

/// Returns the trailing numeric segment of an identifier (`"071"` for
/// `"dl-12-071"`), or the whole identifier when it has none.
#[must_use]
pub fn short_id(uid: &str) -> &str {
    match uid.rsplit_once('-') {
        Some((_, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => tail,
        _ => uid,
    }
}

/// A wrapper type that formats a UID with a prefix.
///
/// This type is returned by [`Uid::display`].
#[derive(Debug, Clone, Copy)]
pub struct FormattedUid<'a> {
    uid: Uid,
    prefix: &'a str,
}

impl fmt::Display for FormattedUid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}-{:0lw$}-{:0cw$}",
            self.prefix,
            self.uid.lesson,
            self.uid.card,
            lw = LESSON_DIGITS,
            cw = CARD_DIGITS
        )
    }
}

/// Errors that can occur while parsing a card UID.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The UID does not start with the configured prefix.
    #[error("Invalid UID format: {uid}. Expected: {prefix}-XX-YYY")]
    Prefix {
        /// The rejected text.
        uid: String,
        /// The prefix that was expected.
        prefix: String,
    },

    /// The UID does not have a lesson and a card segment.
    #[error("Invalid UID format: {0}. Expected: {1}-XX-YYY")]
    Syntax(String, String),

    /// A numeric segment is not a canonical zero-padded number.
    #[error("Invalid UID format: {uid}. Segment '{segment}' must be a {width}-digit number")]
    Segment {
        /// The rejected text.
        uid: String,
        /// The offending segment.
        segment: String,
        /// The expected minimum width.
        width: usize,
    },
}
