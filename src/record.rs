//! Article records.

use std::fmt;
use std::fmt::{Display, Formatter};

use serde;

/// Sentinel stored in place of a missing field.
pub const MISSING: &str = "NA";

/// Article truthfulness label.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "memory-stats", derive(deepsize::DeepSizeOf))]
pub enum Label {
    True,
    Fake,
}

impl Label {
    /// Parses a label case-insensitively. Returns [`None`] for anything but `TRUE` or `FAKE`.
    pub fn parse(s: &str) -> Option<Label> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("TRUE") {
            Some(Label::True)
        } else if s.eq_ignore_ascii_case("FAKE") {
            Some(Label::Fake)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::True => "TRUE",
            Label::Fake => "FAKE",
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar date in `DD-MM-YYYY` form.
///
/// Field order makes the derived ordering compare year, then month, then day.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "memory-stats", derive(deepsize::DeepSizeOf))]
pub struct Date {
    year: u16,
    month: u8,
    day: u8,
}

impl Date {
    /// Creates a date if day is in 1..=31, month in 1..=12 and year is at least 1900.
    /// Month lengths are not checked.
    pub fn new(day: u8, month: u8, year: u16) -> Option<Date> {
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) || year < 1900 {
            return None;
        }
        Some(Date { year, month, day })
    }

    /// Parses a strict `DD-MM-YYYY` string.
    pub fn parse(s: &str) -> Option<Date> {
        let bytes = s.as_bytes();
        if bytes.len() != 10 || bytes[2] != b'-' || bytes[5] != b'-' {
            return None;
        }
        let digits_only = bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
        if !digits_only {
            return None;
        }

        let day = s[0..2].parse().ok()?;
        let month = s[3..5].parse().ok()?;
        let year = s[6..10].parse().ok()?;

        Date::new(day, month, year)
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> u16 {
        self.year
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:04}", self.day, self.month, self.year)
    }
}

/// A single news article.
///
/// Records are immutable once built. The parsed date and the year are cached at construction time;
/// an unparseable date leaves `parsed_date` empty and the year at `0`. Only the five source fields are
/// serialized, the cached ones are derived again on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "ArticleFields", into = "ArticleFields")]
#[cfg_attr(feature = "memory-stats", derive(deepsize::DeepSizeOf))]
pub struct Article {
    title: String,
    text: String,
    subject: String,
    date: String,
    label: Label,

    parsed_date: Option<Date>,
    year: u16,
}

impl Article {
    /// Builds an article. Empty fields are replaced with [`MISSING`].
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        subject: impl Into<String>,
        date: impl Into<String>,
        label: Label,
    ) -> Self {
        let date = or_missing(date.into());
        let parsed_date = Date::parse(&date);

        Article {
            title: or_missing(title.into()),
            text: or_missing(text.into()),
            subject: or_missing(subject.into()),
            year: parsed_date.map(|d| d.year()).unwrap_or(0),
            parsed_date,
            date,
            label,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Date as stored, `DD-MM-YYYY` when valid.
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn parsed_date(&self) -> Option<Date> {
        self.parsed_date
    }

    /// Publication year, `0` when the date is invalid.
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Publication month, `0` when the date is invalid.
    pub fn month(&self) -> u8 {
        self.parsed_date.map(|d| d.month()).unwrap_or(0)
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn is_fake(&self) -> bool {
        self.label == Label::Fake
    }

    /// Case-insensitive substring match on the subject.
    pub fn subject_contains(&self, needle: &str) -> bool {
        self.subject.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Serialized form of an [`Article`].
#[derive(serde::Serialize, serde::Deserialize)]
struct ArticleFields {
    title: String,
    text: String,
    subject: String,
    date: String,
    label: Label,
}

impl From<ArticleFields> for Article {
    fn from(fields: ArticleFields) -> Self {
        Article::new(fields.title, fields.text, fields.subject, fields.date, fields.label)
    }
}

impl From<Article> for ArticleFields {
    fn from(article: Article) -> Self {
        ArticleFields {
            title: article.title,
            text: article.text,
            subject: article.subject,
            date: article.date,
            label: article.label,
        }
    }
}

fn or_missing(field: String) -> String {
    if field.is_empty() {
        MISSING.to_string()
    } else {
        field
    }
}
