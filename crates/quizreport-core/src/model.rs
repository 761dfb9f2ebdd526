//! Core data model types for quizreport.
//!
//! These mirror the records served by the assessment backend: quizzes,
//! packets of scored questions, attempts and users, plus the score scale
//! types that map marks onto performance levels.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A quiz, the unit a report is generated for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    /// Unique quiz identifier.
    pub id: String,
    /// Human-readable quiz name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Time limit in minutes, if any.
    #[serde(default)]
    pub time_limit: Option<i64>,
    /// Passing score percentage.
    #[serde(default)]
    pub passing_score: Option<i64>,
    /// Free text printed under the document title when present.
    #[serde(default)]
    pub report_header: Option<String>,
    /// Free text printed in the document footer when present.
    #[serde(default)]
    pub report_footer: Option<String>,
}

/// The person who took an attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Profile name the user belongs to.
    #[serde(default)]
    pub profile: Option<String>,
}

impl User {
    /// Name shown in reports, `"User"` when the backend has none.
    pub fn display_name(&self) -> &str {
        self.user_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("User")
    }
}

/// Question kinds supported by the quiz builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[default]
    #[serde(rename = "mcq", alias = "multiple-choice", alias = "multiple_choice", alias = "MCQ")]
    MultipleChoice,
    #[serde(rename = "true_false", alias = "true-false", alias = "TrueFalse")]
    TrueFalse,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple-choice"),
            QuestionType::TrueFalse => write!(f, "true-false"),
        }
    }
}

/// One answer option of a question.
///
/// The option shape is decided once when the record is read: a bare string is
/// a [`AnswerOption::Legacy`] option with no weight of its own, an object is a
/// [`AnswerOption::Scored`] option. Objects that omit `marks` weigh 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOption", into = "RawOption")]
pub enum AnswerOption {
    Legacy { text: String },
    Scored { text: String, marks: i64 },
}

impl AnswerOption {
    pub fn scored(text: impl Into<String>, marks: i64) -> Self {
        AnswerOption::Scored {
            text: text.into(),
            marks,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            AnswerOption::Legacy { text } | AnswerOption::Scored { text, .. } => text,
        }
    }

    /// The option's own weight, `None` for legacy options.
    pub fn marks(&self) -> Option<i64> {
        match self {
            AnswerOption::Legacy { .. } => None,
            AnswerOption::Scored { marks, .. } => Some(*marks),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawOption {
    Bare(String),
    Object {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        marks: Option<i64>,
    },
}

impl From<RawOption> for AnswerOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Bare(text) => AnswerOption::Legacy { text },
            RawOption::Object { text, marks } => AnswerOption::Scored {
                text,
                marks: marks.unwrap_or(1),
            },
        }
    }
}

impl From<AnswerOption> for RawOption {
    fn from(option: AnswerOption) -> Self {
        match option {
            AnswerOption::Legacy { text } => RawOption::Bare(text),
            AnswerOption::Scored { text, marks } => RawOption::Object {
                text,
                marks: Some(marks),
            },
        }
    }
}

/// A question inside a packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub packet_id: String,
    #[serde(rename = "question_text", alias = "text", default)]
    pub text: String,
    #[serde(rename = "question_type", alias = "type", default)]
    pub question_type: QuestionType,
    /// Options in display order. Accepts a JSON array or a JSON-encoded string.
    #[serde(default, deserialize_with = "json_or_text")]
    pub options: Vec<AnswerOption>,
    /// Aggregate weight used by legacy questions whose options carry none.
    #[serde(default)]
    pub marks: Option<i64>,
}

impl Question {
    /// Whether any option carries its own weight.
    pub fn has_scored_options(&self) -> bool {
        self.options.iter().any(|o| o.marks().is_some())
    }
}

/// A named, scored section of a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Packet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Author notes on how the packet is scored.
    #[serde(default, alias = "scoring_logic")]
    pub scoring_logic: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, alias = "scoring_scale")]
    pub scoring_scale: Option<ScoreScale>,
    #[serde(default, alias = "enable_scoring_scale")]
    pub enable_scoring_scale: bool,
}

impl Packet {
    /// The packet's own scale when it is enabled and non-empty.
    pub fn active_scale(&self) -> Option<&ScoreScale> {
        self.scoring_scale
            .as_ref()
            .filter(|s| self.enable_scoring_scale && !s.is_empty())
    }
}

/// Image shown next to a level: a short glyph or an embedded raster data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum RangeImage {
    Glyph(String),
    Raster(String),
}

impl RangeImage {
    pub fn glyph(s: impl Into<String>) -> Self {
        RangeImage::Glyph(s.into())
    }

    pub fn is_raster(&self) -> bool {
        matches!(self, RangeImage::Raster(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            RangeImage::Glyph(s) | RangeImage::Raster(s) => s,
        }
    }
}

impl Default for RangeImage {
    fn default() -> Self {
        RangeImage::Glyph(String::new())
    }
}

impl From<String> for RangeImage {
    fn from(s: String) -> Self {
        if s.starts_with("data:image") {
            RangeImage::Raster(s)
        } else {
            RangeImage::Glyph(s)
        }
    }
}

impl From<Option<String>> for RangeImage {
    fn from(s: Option<String>) -> Self {
        s.map(RangeImage::from).unwrap_or_default()
    }
}

impl From<RangeImage> for String {
    fn from(image: RangeImage) -> Self {
        match image {
            RangeImage::Glyph(s) | RangeImage::Raster(s) => s,
        }
    }
}

/// One band of a score scale. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: i64,
    pub max: i64,
    pub label: String,
    /// Hex color, e.g. `#059669`.
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub image: RangeImage,
    /// Descriptive text shown with the level.
    #[serde(default, alias = "largeText", alias = "description")]
    pub text: String,
}

impl ScoreRange {
    pub fn new(min: i64, max: i64, label: &str, color: &str, image: &str, text: &str) -> Self {
        Self {
            min,
            max,
            label: label.to_string(),
            color: color.to_string(),
            image: RangeImage::from(image.to_string()),
            text: text.to_string(),
        }
    }

    pub fn contains(&self, score: i64) -> bool {
        score >= self.min && score <= self.max
    }
}

/// An ordered list of score ranges. Ranges may leave gaps or overlap; the
/// first matching range in list order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreScale(pub Vec<ScoreRange>);

impl ScoreScale {
    pub fn new(ranges: Vec<ScoreRange>) -> Self {
        Self(ranges)
    }

    pub fn ranges(&self) -> &[ScoreRange] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lifecycle state of an attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    #[default]
    Completed,
    Abandoned,
}

/// Marks earned in one packet during an attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketMarks {
    #[serde(default)]
    pub marks: i64,
    #[serde(default)]
    pub questions: i64,
}

/// One user's run through a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub quiz_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub status: AttemptStatus,
    /// Earned marks keyed by packet name.
    #[serde(default, deserialize_with = "json_or_text")]
    pub packet_marks: HashMap<String, PacketMarks>,
    #[serde(default)]
    pub total_marks: i64,
    #[serde(default)]
    pub total_questions: i64,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Accept either a JSON value or the same value encoded as a JSON string, the
/// way the SQLite backend stores structured columns. `null` yields the default.
fn json_or_text<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(T::default()),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(T::default()),
        serde_json::Value::String(s) => serde_json::from_str(&s).map_err(serde::de::Error::custom),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

/// Timestamps arrive as RFC 3339 or as SQLite `YYYY-MM-DD HH:MM:SS` (UTC).
mod timestamp {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw).map(Some).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
    }
}
