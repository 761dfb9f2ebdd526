//! quizreport-render: Report documents and the on-screen view.
//!
//! [`document::layout`] places a report on fixed A4 pages which [`svg`]
//! writes as per-page SVG or as one printable HTML file. [`html`] produces
//! the on-screen view, which follows the report template's section order and
//! visibility, and [`json`] exports the assembled data.

pub mod canvas;
pub mod charts;
pub mod document;
pub mod html;
pub mod json;
pub mod svg;

pub use document::{layout, Document};
pub use html::{generate_html, write_html_report};
pub use json::{generate_json, write_json_report};
pub use svg::{printable_html, write_printable_html, write_svg_pages};

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use chrono::{TimeZone, Utc};

    use quizreport_core::model::{Attempt, AttemptStatus, Packet, PacketMarks, Quiz, User};
    use quizreport_core::report::ReportData;
    use quizreport_core::template::ReportTemplate;

    /// A completed attempt over packets `Sleep 1..=n` (ids `p1..`), where
    /// packet `i` earned `3 * i` marks.
    pub fn report_with_packets(n: usize) -> ReportData {
        let packets: Vec<Packet> = (1..=n)
            .map(|i| Packet {
                id: format!("p{i}"),
                name: format!("Sleep {i}"),
                description: String::new(),
                scoring_logic: String::new(),
                questions: vec![],
                scoring_scale: None,
                enable_scoring_scale: false,
            })
            .collect();
        let packet_marks: HashMap<String, PacketMarks> = packets
            .iter()
            .enumerate()
            .map(|(i, p)| {
                (
                    p.name.clone(),
                    PacketMarks {
                        marks: 3 * (i as i64 + 1),
                        questions: 3,
                    },
                )
            })
            .collect();
        let total = packet_marks.values().map(|m| m.marks).sum();
        let attempt = Attempt {
            id: "a1".into(),
            quiz_id: "q1".into(),
            user_id: Some("u1".into()),
            profile_id: None,
            status: AttemptStatus::Completed,
            packet_marks,
            total_marks: total,
            total_questions: 3 * n as i64,
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
        ReportData::assemble(quiz, attempt, user, packets, ReportTemplate::default())
    }
}
