//! Assembled report data.
//!
//! [`ReportData`] is everything a renderer needs: the fetched records, the
//! per-packet scores with resolved levels, the overall level and the narrative
//! text. It is computed once and is read-only afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::insights::{generate_insights, generate_recommendations, Recommendation};
use crate::model::{Attempt, Packet, Quiz, ScoreScale, User};
use crate::scale::{default_packet_scale, resolve_overall_level, resolve_packet_level, ResolvedLevel};
use crate::template::{PacketConfig, ReportTemplate, SectionId};

/// Footer line used when the quiz sets none.
pub const DEFAULT_FOOTER: &str = "Generated by Assessment System";

/// One packet's result within an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketScore {
    pub packet_id: String,
    pub name: String,
    pub marks: i64,
    pub questions: i64,
    pub level: ResolvedLevel,
}

impl PacketScore {
    /// Score `packet` from the attempt's per-packet marks, keyed by packet
    /// name. Packets the attempt never reached score zero.
    pub fn from_attempt(packet: &Packet, attempt: &Attempt) -> Self {
        let (marks, questions) = attempt
            .packet_marks
            .get(&packet.name)
            .map(|m| (m.marks, m.questions))
            .unwrap_or((0, 0));
        Self {
            packet_id: packet.id.clone(),
            name: packet.name.clone(),
            marks,
            questions,
            level: resolve_packet_level(marks, packet),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub quiz: Quiz,
    pub attempt: Attempt,
    pub user: User,
    pub packets: Vec<Packet>,
    pub template: ReportTemplate,
    pub packet_scores: Vec<PacketScore>,
    pub overall: ResolvedLevel,
    pub insights: String,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

impl ReportData {
    /// Score every packet and derive the narrative. Packets missing from the
    /// template get a default config.
    pub fn assemble(
        quiz: Quiz,
        attempt: Attempt,
        user: User,
        packets: Vec<Packet>,
        mut template: ReportTemplate,
    ) -> Self {
        let added = template.sync_packets(&packets);
        if added > 0 {
            tracing::debug!(quiz = %quiz.id, added, "added packet configs to template");
        }

        let packet_scores: Vec<PacketScore> = packets
            .iter()
            .map(|p| PacketScore::from_attempt(p, &attempt))
            .collect();
        let overall = resolve_overall_level(attempt.total_marks);
        let insights = generate_insights(attempt.total_marks, &packet_scores);
        let recommendations = generate_recommendations(attempt.total_marks, &packet_scores);

        Self {
            quiz,
            attempt,
            user,
            packets,
            template,
            packet_scores,
            overall,
            insights,
            recommendations,
            generated_at: Utc::now(),
        }
    }

    pub fn total_marks(&self) -> i64 {
        self.attempt.total_marks
    }

    /// Completion date of the attempt, or the generation date.
    pub fn report_date(&self) -> NaiveDate {
        self.attempt
            .completed_at
            .unwrap_or(self.generated_at)
            .date_naive()
    }

    /// `{quiz}_{user}_{YYYY-MM-DD}`, without an extension.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}",
            file_safe(&self.quiz.name),
            file_safe(self.user.display_name()),
            self.report_date().format("%Y-%m-%d")
        )
    }

    /// Subtitle under the header title.
    pub fn subtitle(&self) -> &str {
        self.quiz
            .report_header
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.template.header.subtitle)
    }

    pub fn footer_line(&self) -> &str {
        self.quiz
            .report_footer
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_FOOTER)
    }

    /// The largest packet mark, at least 1.
    pub fn max_packet_marks(&self) -> i64 {
        self.packet_scores
            .iter()
            .map(|s| s.marks)
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// Sections and packet cards as the template arranges them.
    pub fn view(&self) -> ReportView<'_> {
        let cards = self
            .template
            .configured_packets(&self.packets)
            .into_iter()
            .filter_map(|(packet, config)| {
                let score = self.packet_scores.iter().find(|s| s.packet_id == packet.id)?;
                Some(PacketCard {
                    score,
                    config,
                    scale: packet.active_scale().cloned().unwrap_or_else(default_packet_scale),
                })
            })
            .collect();
        ReportView {
            sections: self.template.ordered_sections(),
            packets: cards,
        }
    }
}

/// Layout of the on-screen report.
#[derive(Debug, Clone)]
pub struct ReportView<'a> {
    /// Enabled sections in display order.
    pub sections: Vec<SectionId>,
    /// Enabled packets in display order.
    pub packets: Vec<PacketCard<'a>>,
}

#[derive(Debug, Clone)]
pub struct PacketCard<'a> {
    pub score: &'a PacketScore,
    pub config: &'a PacketConfig,
    /// The scale the level was resolved against, for "all levels" displays.
    pub scale: ScoreScale,
}

fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;

    use super::*;
    use crate::model::{AttemptStatus, PacketMarks};
    use crate::scale::LevelSource;
    use crate::template::Direction;

    fn packet(id: &str, name: &str) -> Packet {
        Packet {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            scoring_logic: String::new(),
            questions: vec![],
            scoring_scale: None,
            enable_scoring_scale: false,
        }
    }

    fn data() -> ReportData {
        let mut packet_marks = HashMap::new();
        packet_marks.insert("Stress".to_string(), PacketMarks { marks: 9, questions: 3 });
        packet_marks.insert("Sleep".to_string(), PacketMarks { marks: 4, questions: 3 });
        let attempt = Attempt {
            id: "a1".into(),
            quiz_id: "q1".into(),
            user_id: Some("u1".into()),
            profile_id: None,
            status: AttemptStatus::Completed,
            packet_marks,
            total_marks: 13,
            total_questions: 6,
            started_at: None,
            completed_at: Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()),
        };
        let quiz = Quiz {
            id: "q1".into(),
            name: "Wellbeing Check".into(),
            ..Quiz::default()
        };
        let user = User {
            user_name: Some("Ada".into()),
            ..User::default()
        };
        ReportData::assemble(
            quiz,
            attempt,
            user,
            vec![packet("p1", "Stress"), packet("p2", "Sleep"), packet("p3", "Diet")],
            ReportTemplate::default(),
        )
    }

    #[test]
    fn scores_packets_by_name() {
        let data = data();
        let stress = &data.packet_scores[0];
        assert_eq!((stress.marks, stress.questions), (9, 3));
        assert_eq!(stress.level.range.label, "Excellent");
        assert_eq!(stress.level.source, LevelSource::Default);

        let diet = &data.packet_scores[2];
        assert_eq!((diet.marks, diet.questions), (0, 0));
        assert_eq!(data.overall.range.label, "Average");
        assert!(data.insights.contains("Pay special attention to Diet"));
    }

    #[test]
    fn file_name_uses_completion_date() {
        assert_eq!(data().file_name(), "Wellbeing_Check_Ada_2024-03-05");
    }

    #[test]
    fn template_gains_packet_configs() {
        let data = data();
        assert_eq!(data.template.packet_configs.len(), 3);
        assert_eq!(data.template.packet_configs["p3"].order, 3);
    }

    #[test]
    fn view_follows_template() {
        let mut data = data();
        data.template.move_packet("p3", Direction::Up, &data.packets.clone());
        data.template.toggle_packet("p1").unwrap();
        data.template.charts.enabled = false;

        let view = data.view();
        let names: Vec<_> = view.packets.iter().map(|c| c.score.name.as_str()).collect();
        assert_eq!(names, ["Diet", "Sleep"]);
        assert!(!view.sections.contains(&SectionId::Charts));
        assert_eq!(view.packets[0].scale.len(), 4);
    }

    #[test]
    fn quiz_text_overrides_defaults() {
        let mut data = data();
        assert_eq!(data.subtitle(), "Performance Analysis");
        assert_eq!(data.footer_line(), DEFAULT_FOOTER);
        data.quiz.report_header = Some("Term 2".into());
        data.quiz.report_footer = Some("Confidential".into());
        assert_eq!(data.subtitle(), "Term 2");
        assert_eq!(data.footer_line(), "Confidential");
    }
}
