//! Narrative insight and recommendation text.
//!
//! Both generators are pure functions of the attempt total and the per-packet
//! scores. Thresholds follow the overall scale bands.

use serde::{Deserialize, Serialize};

use crate::report::PacketScore;

/// Visual tone of a recommendation card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Warning,
    Primary,
    Secondary,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub tone: Tone,
}

impl Recommendation {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// The first packet achieving the minimum marks.
pub fn lowest_scoring(scores: &[PacketScore]) -> Option<&PacketScore> {
    scores.iter().reduce(|lowest, s| if s.marks < lowest.marks { s } else { lowest })
}

pub fn generate_insights(total_marks: i64, scores: &[PacketScore]) -> String {
    let mut text = if total_marks >= 31 {
        "Exceptional performance across all sections! You demonstrate mastery of the subject matter. Consider exploring advanced topics or helping peers in areas of strength."
    } else if total_marks >= 21 {
        "Strong overall performance with room for refinement in specific areas. Focus on the sections with lower scores to achieve even better results."
    } else if total_marks >= 11 {
        "Good foundation with clear opportunities for improvement. Review the concepts in lower-scoring sections and practice similar problems to strengthen understanding."
    } else {
        "This assessment highlights areas that need focused attention. Consider additional study time, seek help from instructors, and practice regularly to improve performance."
    }
    .to_string();

    if let Some(lowest) = lowest_scoring(scores) {
        text.push_str(&format!(
            " Pay special attention to {} where additional practice would be most beneficial.",
            lowest.name
        ));
    }
    text
}

pub fn generate_recommendations(total_marks: i64, scores: &[PacketScore]) -> Vec<Recommendation> {
    let mut recs = Vec::with_capacity(4);

    if total_marks >= 21 {
        recs.push(Recommendation::new(
            "Maintain your excellent study habits and continue practicing regularly to stay sharp.",
            Tone::Success,
        ));
    } else {
        recs.push(Recommendation::new(
            "Develop a structured study schedule focusing on areas where you scored below average.",
            Tone::Warning,
        ));
    }

    if let Some(lowest) = lowest_scoring(scores) {
        recs.push(Recommendation::new(
            format!(
                "Focus additional study time on {} as this shows the greatest potential for improvement.",
                lowest.name
            ),
            Tone::Primary,
        ));
    }

    recs.push(Recommendation::new(
        "Review your responses and understand the reasoning behind different scoring levels.",
        Tone::Secondary,
    ));

    if total_marks < 11 {
        recs.push(Recommendation::new(
            "Consider seeking additional help from instructors or study groups for challenging topics.",
            Tone::Error,
        ));
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::resolve_overall_level;

    fn score(name: &str, marks: i64) -> PacketScore {
        PacketScore {
            packet_id: name.to_lowercase(),
            name: name.into(),
            marks,
            questions: 3,
            level: resolve_overall_level(marks),
        }
    }

    #[test]
    fn lowest_tie_goes_to_first() {
        let scores = [score("Stress", 4), score("Sleep", 2), score("Diet", 2)];
        assert_eq!(lowest_scoring(&scores).unwrap().name, "Sleep");
    }

    #[test]
    fn insight_thresholds() {
        let scores = [score("Stress", 1)];
        assert!(generate_insights(31, &scores).starts_with("Exceptional"));
        assert!(generate_insights(30, &scores).starts_with("Strong"));
        assert!(generate_insights(11, &scores).starts_with("Good foundation"));
        assert!(generate_insights(10, &scores).starts_with("This assessment"));
        assert!(generate_insights(10, &scores).ends_with(
            "Pay special attention to Stress where additional practice would be most beneficial."
        ));
    }

    #[test]
    fn insight_without_packets_omits_focus() {
        assert!(!generate_insights(25, &[]).contains("Pay special attention"));
    }

    #[test]
    fn recommendations_for_low_total() {
        let recs = generate_recommendations(5, &[score("Stress", 5)]);
        let tones: Vec<Tone> = recs.iter().map(|r| r.tone).collect();
        assert_eq!(tones, [Tone::Warning, Tone::Primary, Tone::Secondary, Tone::Error]);
        assert!(recs[1].text.contains("Stress"));
    }

    #[test]
    fn recommendations_for_high_total() {
        let recs = generate_recommendations(21, &[score("Stress", 9), score("Sleep", 12)]);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].tone, Tone::Success);
        assert!(recs[1].text.starts_with("Focus additional study time on Stress"));
    }
}
