//! Per-packet custom scale configuration.
//!
//! Opening configuration for a packet reuses its persisted scale verbatim.
//! Only a packet with no persisted scale gets a quartile scale generated from
//! its marks band. Saving validates per-range bounds and persists through a
//! [`PacketStore`].

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScaleValidationError};
use crate::marks::{calculate_with_edit, MarksRange, OptionMarksEdit};
use crate::model::{Packet, RangeImage, ScoreRange, ScoreScale};
use crate::traits::PacketStore;

const QUARTILES: [(&str, &str, &str, &str); 4] = [
    (
        "Needs Improvement",
        "#ff6b6b",
        "📚",
        "Keep practicing! You're making progress.",
    ),
    (
        "Average",
        "#ffd93d",
        "📊",
        "Good effort! You're on the right track.",
    ),
    (
        "Good",
        "#6bcf7f",
        "🎯",
        "Well done! You're showing strong understanding.",
    ),
    (
        "Excellent",
        "#4ecdc4",
        "🏆",
        "Outstanding! You've mastered this material!",
    ),
];

/// Generate a four-level scale partitioning `[min, max]` at the quartiles.
///
/// Boundaries are `floor(min + (max - min) * q)` for q in .25, .5, .75. On a
/// band too narrow to give every level its own marks, a level whose lower
/// bound would pass its upper bound is collapsed onto the upper bound.
pub fn auto_generate(min: i64, max: i64) -> ScoreScale {
    let span = (max - min) as f64;
    let boundary = |q: f64| (min as f64 + span * q).floor() as i64;
    let (b1, b2, b3) = (boundary(0.25), boundary(0.5), boundary(0.75));

    let bounds = [(min, b1), (b1 + 1, b2), (b2 + 1, b3), (b3 + 1, max)];
    let ranges = bounds
        .iter()
        .zip(QUARTILES.iter())
        .map(|(&(lo, hi), &(label, color, image, text))| {
            ScoreRange::new(lo.min(hi), hi, label, color, image, text)
        })
        .collect();
    ScoreScale::new(ranges)
}

/// Check every range has `min <= max`. Gaps and overlaps are accepted.
pub fn validate(scale: &ScoreScale) -> std::result::Result<(), ScaleValidationError> {
    match scale.ranges().iter().enumerate().find(|(_, r)| r.min > r.max) {
        Some((index, r)) => Err(ScaleValidationError::InvertedRange {
            index,
            label: r.label.clone(),
            min: r.min,
            max: r.max,
        }),
        None => Ok(()),
    }
}

/// A single field change on one range of a draft scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEdit {
    pub index: usize,
    pub field: RangeField,
}

/// The field a [`RangeEdit`] writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "lowercase")]
pub enum RangeField {
    Min(i64),
    Max(i64),
    Label(String),
    Color(String),
    Image(RangeImage),
    Text(String),
}

impl RangeEdit {
    /// Apply the edit to a copy of `scale`.
    pub fn apply(&self, scale: &ScoreScale) -> std::result::Result<ScoreScale, ScaleValidationError> {
        let mut edited = scale.clone();
        let len = edited.len();
        let range = edited
            .0
            .get_mut(self.index)
            .ok_or(ScaleValidationError::RangeOutOfBounds {
                index: self.index,
                len,
            })?;
        match &self.field {
            RangeField::Min(v) => range.min = *v,
            RangeField::Max(v) => range.max = *v,
            RangeField::Label(v) => range.label = v.clone(),
            RangeField::Color(v) => range.color = v.clone(),
            RangeField::Image(v) => range.image = v.clone(),
            RangeField::Text(v) => range.text = v.clone(),
        }
        Ok(edited)
    }
}

impl FromStr for RangeEdit {
    type Err = ScaleValidationError;

    /// Parse `index.field=value`, e.g. `2.max=9` or `0.label=Low`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ScaleValidationError::InvalidEdit(s.to_string());
        let (target, value) = s.split_once('=').ok_or_else(invalid)?;
        let (index, field) = target.trim().split_once('.').ok_or_else(invalid)?;
        let index: usize = index.parse().map_err(|_| invalid())?;
        let value = value.trim();
        let number = || value.parse::<i64>().map_err(|_| invalid());
        let field = match field {
            "min" => RangeField::Min(number()?),
            "max" => RangeField::Max(number()?),
            "label" => RangeField::Label(value.to_string()),
            "color" => RangeField::Color(value.to_string()),
            "image" => RangeField::Image(RangeImage::from(value.to_string())),
            "text" => RangeField::Text(value.to_string()),
            _ => return Err(invalid()),
        };
        Ok(RangeEdit { index, field })
    }
}

/// Where an opened scale came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleOrigin {
    Persisted,
    Generated,
}

/// The state shown when scale configuration is opened for a packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSession {
    pub packet_id: String,
    pub marks: MarksRange,
    pub scale: ScoreScale,
    pub origin: ScaleOrigin,
    pub enabled: bool,
}

/// Opens and saves packet scales.
pub struct ScaleConfigStore<S: ?Sized> {
    store: Arc<S>,
}

impl<S: PacketStore + ?Sized> ScaleConfigStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Open scale configuration for `packet`.
    ///
    /// `pending` is an option weight typed but not yet saved; it shifts the
    /// marks band and therefore a generated scale.
    pub fn open(&self, packet: &Packet, pending: Option<&OptionMarksEdit>) -> ScaleSession {
        let marks = calculate_with_edit(&packet.questions, pending);
        let (scale, origin) = match packet.scoring_scale.as_ref().filter(|s| !s.is_empty()) {
            Some(persisted) => (persisted.clone(), ScaleOrigin::Persisted),
            None => (
                auto_generate(marks.min_marks, marks.max_marks),
                ScaleOrigin::Generated,
            ),
        };
        tracing::debug!(packet = %packet.name, origin = ?origin, "opened scale configuration");
        ScaleSession {
            packet_id: packet.id.clone(),
            marks,
            scale,
            origin,
            enabled: packet.enable_scoring_scale,
        }
    }

    /// Validate and persist `draft` with `pending` applied.
    ///
    /// Nothing is written when validation fails. Returns the scale as stored.
    pub async fn save(
        &self,
        packet_id: &str,
        draft: &ScoreScale,
        pending: Option<&RangeEdit>,
        enabled: bool,
    ) -> Result<ScoreScale> {
        let scale = match pending {
            Some(edit) => edit.apply(draft)?,
            None => draft.clone(),
        };
        validate(&scale)?;
        self.store
            .save_packet_scale(packet_id, &scale, enabled)
            .await?;
        tracing::info!(packet_id, ranges = scale.len(), enabled, "saved packet scale");
        Ok(scale)
    }
}
