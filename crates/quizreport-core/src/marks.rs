//! Achievable marks band for a packet.
//!
//! A question contributes its worst and best option weights to the band.
//! Legacy questions whose options carry no weight contribute their aggregate
//! `marks` (default 1) to both ends.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerOption, Question};

/// The `[min, max]` marks a packet can yield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarksRange {
    pub min_marks: i64,
    pub max_marks: i64,
    pub total_questions: usize,
}

impl MarksRange {
    /// Width of the band, `max - min`.
    pub fn span(&self) -> i64 {
        self.max_marks - self.min_marks
    }
}

/// An option weight that has been typed but not yet saved.
///
/// Passed explicitly to the calculation so the band reflects the edit without
/// waiting for the question to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionMarksEdit {
    pub question_id: String,
    pub option_index: usize,
    pub marks: i64,
}

impl OptionMarksEdit {
    /// Apply the edit to a single question, if it targets it.
    ///
    /// A legacy option becomes scored once it is given a weight. Out-of-range
    /// indices leave the question unchanged.
    pub fn apply_to<'a>(&self, question: &'a Question) -> Cow<'a, Question> {
        if question.id != self.question_id || self.option_index >= question.options.len() {
            return Cow::Borrowed(question);
        }
        let mut edited = question.clone();
        let text = edited.options[self.option_index].text().to_string();
        edited.options[self.option_index] = AnswerOption::scored(text, self.marks);
        Cow::Owned(edited)
    }
}

/// Compute the marks band for a list of questions.
pub fn calculate(questions: &[Question]) -> MarksRange {
    calculate_with_edit(questions, None)
}

/// Compute the marks band with a pending option edit applied.
pub fn calculate_with_edit(questions: &[Question], pending: Option<&OptionMarksEdit>) -> MarksRange {
    let mut range = MarksRange {
        total_questions: questions.len(),
        ..MarksRange::default()
    };

    for question in questions {
        let question = match pending {
            Some(edit) => edit.apply_to(question),
            None => Cow::Borrowed(question),
        };
        let (lo, hi) = question_band(&question);
        range.min_marks += lo;
        range.max_marks += hi;
    }

    tracing::debug!(
        min = range.min_marks,
        max = range.max_marks,
        questions = range.total_questions,
        "computed marks band"
    );
    range
}

fn question_band(question: &Question) -> (i64, i64) {
    let weights = question.options.iter().filter_map(AnswerOption::marks);
    let band = weights.fold(None, |acc: Option<(i64, i64)>, w| match acc {
        Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
        None => Some((w, w)),
    });
    band.unwrap_or_else(|| {
        let marks = question.marks.unwrap_or(1);
        (marks, marks)
    })
}
