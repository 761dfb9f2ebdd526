//! Performance level resolution.
//!
//! Maps a numeric score onto a [`ScoreRange`]. Packet scores use the packet's
//! own scale when it is enabled, otherwise [`default_packet_scale`]. The
//! attempt total always uses the fixed [`overall_scale`].

use serde::{Deserialize, Serialize};

use crate::model::{Packet, ScoreRange, ScoreScale};

impl ScoreScale {
    /// First range containing `score`, in list order.
    pub fn find(&self, score: i64) -> Option<&ScoreRange> {
        self.0.iter().find(|r| r.contains(score))
    }

    /// Index of the first range containing `score`.
    pub fn position(&self, score: i64) -> Option<usize> {
        self.0.iter().position(|r| r.contains(score))
    }
}

/// Four-level scale used for packets without an enabled custom scale.
pub fn default_packet_scale() -> ScoreScale {
    ScoreScale::new(vec![
        ScoreRange::new(
            0,
            2,
            "Needs Improvement",
            "#dc2626",
            "📚",
            "Keep practicing! You're making progress.",
        ),
        ScoreRange::new(
            3,
            5,
            "Average",
            "#d97706",
            "📊",
            "Good effort! You're on the right track.",
        ),
        ScoreRange::new(
            6,
            8,
            "Good",
            "#059669",
            "🎯",
            "Well done! You're showing strong understanding.",
        ),
        ScoreRange::new(
            9,
            12,
            "Excellent",
            "#2563eb",
            "🏆",
            "Outstanding! You've mastered this material!",
        ),
    ])
}

/// Fixed scale applied to an attempt's total marks.
pub fn overall_scale() -> ScoreScale {
    ScoreScale::new(vec![
        ScoreRange::new(0, 10, "Needs Improvement", "#dc2626", "📚", ""),
        ScoreRange::new(11, 20, "Average", "#d97706", "📊", ""),
        ScoreRange::new(21, 30, "Good", "#059669", "🎯", ""),
        ScoreRange::new(31, 50, "Excellent", "#2563eb", "🏆", ""),
    ])
}

/// Resolve `score` against `scale`, falling back to the default packet scale
/// and finally to its first entry. Never fails.
pub fn resolve(score: i64, scale: &ScoreScale) -> ScoreRange {
    resolve_ranked(score, scale).range
}

/// Which scale a level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    /// The packet's own custom scale.
    Custom,
    /// The default packet scale.
    Default,
    /// The fixed overall scale.
    Overall,
    /// No range matched; the first entry of the fallback scale was used.
    Unmatched,
}

/// A resolved level together with its position in the scale it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLevel {
    pub range: ScoreRange,
    /// 1-based index of `range` in its scale.
    pub rank: usize,
    pub scale_len: usize,
    pub source: LevelSource,
}

fn resolve_ranked(score: i64, scale: &ScoreScale) -> ResolvedLevel {
    if let Some(idx) = scale.position(score) {
        return ResolvedLevel {
            range: scale.0[idx].clone(),
            rank: idx + 1,
            scale_len: scale.len(),
            source: LevelSource::Custom,
        };
    }
    let fallback = default_packet_scale();
    match fallback.position(score) {
        Some(idx) => ResolvedLevel {
            range: fallback.0[idx].clone(),
            rank: idx + 1,
            scale_len: fallback.len(),
            source: LevelSource::Default,
        },
        None => ResolvedLevel {
            range: fallback.0[0].clone(),
            rank: 1,
            scale_len: fallback.len(),
            source: LevelSource::Unmatched,
        },
    }
}

/// Resolve a packet's earned marks using its enabled scale or the default.
pub fn resolve_packet_level(marks: i64, packet: &Packet) -> ResolvedLevel {
    let level = match packet.active_scale() {
        Some(scale) => resolve_ranked(marks, scale),
        None => {
            let mut level = resolve_ranked(marks, &default_packet_scale());
            if level.source == LevelSource::Custom {
                level.source = LevelSource::Default;
            }
            level
        }
    };
    tracing::debug!(
        packet = %packet.name,
        marks,
        level = %level.range.label,
        source = ?level.source,
        "resolved packet level"
    );
    level
}

/// Resolve an attempt total against the fixed overall scale.
///
/// Totals outside every band resolve to the overall scale's first entry.
pub fn resolve_overall_level(total_marks: i64) -> ResolvedLevel {
    let scale = overall_scale();
    match scale.position(total_marks) {
        Some(idx) => ResolvedLevel {
            range: scale.0[idx].clone(),
            rank: idx + 1,
            scale_len: scale.len(),
            source: LevelSource::Overall,
        },
        None => ResolvedLevel {
            range: scale.0[0].clone(),
            rank: 1,
            scale_len: scale.len(),
            source: LevelSource::Unmatched,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(scale: Option<ScoreScale>, enabled: bool) -> Packet {
        Packet {
            id: "p1".into(),
            name: "Stress".into(),
            description: String::new(),
            scoring_logic: String::new(),
            questions: vec![],
            scoring_scale: scale,
            enable_scoring_scale: enabled,
        }
    }

    #[test]
    fn first_match_wins_on_overlap() {
        let scale = ScoreScale::new(vec![
            ScoreRange::new(0, 10, "Wide", "#000000", "", ""),
            ScoreRange::new(5, 6, "Narrow", "#ffffff", "", ""),
        ]);
        assert_eq!(resolve(5, &scale).label, "Wide");

        let reversed = ScoreScale::new(scale.0.iter().rev().cloned().collect());
        assert_eq!(resolve(5, &reversed).label, "Narrow");
    }

    #[test]
    fn gap_falls_back_to_default_scale() {
        let scale = ScoreScale::new(vec![
            ScoreRange::new(0, 1, "Low", "#000000", "", ""),
            ScoreRange::new(10, 12, "High", "#000000", "", ""),
        ]);
        assert_eq!(resolve(4, &scale).label, "Average");
    }

    #[test]
    fn no_match_anywhere_returns_first_default_entry() {
        let level = resolve(99, &ScoreScale::default());
        assert_eq!(level.label, "Needs Improvement");
        assert_eq!(level.min, 0);
    }

    #[test]
    fn disabled_scale_uses_default() {
        let custom = ScoreScale::new(vec![ScoreRange::new(0, 12, "Custom", "#000000", "", "")]);
        let level = resolve_packet_level(9, &packet(Some(custom), false));
        assert_eq!(level.range.label, "Excellent");
        assert_eq!(level.source, LevelSource::Default);
        assert_eq!((level.rank, level.scale_len), (4, 4));
    }

    #[test]
    fn enabled_empty_scale_uses_default() {
        let level = resolve_packet_level(4, &packet(Some(ScoreScale::default()), true));
        assert_eq!(level.range.label, "Average");
        assert_eq!(level.source, LevelSource::Default);
    }

    #[test]
    fn enabled_custom_scale_is_used() {
        let custom = ScoreScale::new(vec![
            ScoreRange::new(0, 5, "Low", "#ff6b6b", "📚", ""),
            ScoreRange::new(6, 12, "High", "#4ecdc4", "🏆", ""),
        ]);
        let level = resolve_packet_level(7, &packet(Some(custom), true));
        assert_eq!(level.range.label, "High");
        assert_eq!(level.source, LevelSource::Custom);
        assert_eq!((level.rank, level.scale_len), (2, 2));
    }

    #[test]
    fn overall_scale_thresholds() {
        assert_eq!(resolve_overall_level(0).range.label, "Needs Improvement");
        assert_eq!(resolve_overall_level(11).range.label, "Average");
        assert_eq!(resolve_overall_level(30).range.label, "Good");
        assert_eq!(resolve_overall_level(31).range.label, "Excellent");

        let outside = resolve_overall_level(51);
        assert_eq!(outside.range.label, "Needs Improvement");
        assert_eq!(outside.source, LevelSource::Unmatched);
    }
}
