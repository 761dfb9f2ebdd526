//! The `quizreport init` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use quizreport_store::{DirectoryBackend, RecordKind};

const CONFIG_FILE: &str = "quizreport.toml";
const DATA_DIR: &str = "quizreport-data";

pub async fn execute() -> Result<()> {
    // Create quizreport.toml
    if Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE, SAMPLE_CONFIG)?;
        println!("Created {CONFIG_FILE}");
    }

    // Create sample data
    if Path::new(DATA_DIR).exists() {
        println!("{DATA_DIR}/ already exists, skipping.");
    } else {
        write_sample_data(&DirectoryBackend::new(DATA_DIR))
            .await
            .context("failed to write sample data")?;
        println!("Created {DATA_DIR}/ with sample quiz 'wellbeing'");
    }

    println!("\nNext steps:");
    println!("  1. Run: quizreport marks --quiz wellbeing");
    println!("  2. Run: quizreport scale show --quiz wellbeing --packet stress");
    println!("  3. Run: quizreport generate --quiz wellbeing --attempt attempt-1,attempt-2 --format all");

    Ok(())
}

/// Four options weighted 0 to 3.
fn likert(id: &str, packet_id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "packet_id": packet_id,
        "question_text": text,
        "question_type": "mcq",
        "options": [
            { "text": "Never", "marks": 0 },
            { "text": "Sometimes", "marks": 1 },
            { "text": "Often", "marks": 2 },
            { "text": "Always", "marks": 3 }
        ]
    })
}

async fn write_sample_data(backend: &DirectoryBackend) -> Result<()> {
    backend
        .put_record(
            RecordKind::Quiz,
            "wellbeing",
            &json!({
                "id": "wellbeing",
                "name": "Wellbeing Check",
                "description": "A short check-in on sleep, stress and focus.",
                "time_limit": 15,
                "report_header": "Quarterly Wellbeing Report",
                "packet_ids": ["sleep", "stress", "focus"]
            }),
        )
        .await?;

    backend
        .put_record(
            RecordKind::Packet,
            "sleep",
            &json!({
                "id": "sleep",
                "name": "Sleep",
                "description": "Rest and recovery habits",
                "questions": [
                    likert("sleep-1", "sleep", "I wake up feeling rested"),
                    likert("sleep-2", "sleep", "I keep a regular bedtime"),
                    likert("sleep-3", "sleep", "I avoid screens before bed")
                ]
            }),
        )
        .await?;

    backend
        .put_record(
            RecordKind::Packet,
            "stress",
            &json!({
                "id": "stress",
                "name": "Stress",
                "description": "Pressure and coping",
                "questions": [
                    likert("stress-1", "stress", "I feel overwhelmed by my workload"),
                    likert("stress-2", "stress", "I find it hard to switch off"),
                    likert("stress-3", "stress", "Small setbacks upset me")
                ],
                "scoringScale": [
                    { "min": 0, "max": 3, "label": "Calm", "color": "#10b981", "image": "😌", "text": "Stress is well under control." },
                    { "min": 4, "max": 6, "label": "Tense", "color": "#f59e0b", "image": "😐", "text": "Some pressure is building up." },
                    { "min": 7, "max": 9, "label": "Overloaded", "color": "#ef4444", "image": "😣", "text": "Consider talking to someone about your workload." }
                ],
                "enableScoringScale": true
            }),
        )
        .await?;

    backend
        .put_record(
            RecordKind::Packet,
            "focus",
            &json!({
                "id": "focus",
                "name": "Focus",
                "description": "Attention and concentration",
                "questions": [
                    likert("focus-1", "focus", "I finish tasks I start"),
                    likert("focus-2", "focus", "I can concentrate for an hour"),
                    {
                        "id": "focus-3",
                        "packet_id": "focus",
                        "question_text": "Which helps you focus most?",
                        "question_type": "mcq",
                        "options": ["Music", "Silence", "Company"],
                        "marks": 2
                    }
                ]
            }),
        )
        .await?;

    for (id, name, email) in [
        ("user-1", "Ada Lovelace", "ada@example.com"),
        ("user-2", "Grace Hopper", "grace@example.com"),
    ] {
        backend
            .put_record(
                RecordKind::User,
                id,
                &json!({ "id": id, "user_name": name, "email": email }),
            )
            .await?;
    }

    for (id, user, marks, completed) in [
        ("attempt-1", "user-1", [7, 4, 8], "2024-03-05T10:00:00Z"),
        ("attempt-2", "user-2", [3, 6, 2], "2024-03-06T14:30:00Z"),
    ] {
        let [sleep, stress, focus] = marks;
        backend
            .put_record(
                RecordKind::Attempt,
                id,
                &json!({
                    "id": id,
                    "quiz_id": "wellbeing",
                    "user_id": user,
                    "status": "completed",
                    "packet_marks": {
                        "Sleep": { "marks": sleep, "questions": 3 },
                        "Stress": { "marks": stress, "questions": 3 },
                        "Focus": { "marks": focus, "questions": 3 }
                    },
                    "total_marks": sleep + stress + focus,
                    "total_questions": 9,
                    "completed_at": completed
                }),
            )
            .await?;
    }

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizreport configuration

output_dir = "./quizreport-output"
autosave_debounce_ms = 2000
parallelism = 4
default_format = "html"

[backend]
type = "directory"
path = "./quizreport-data"

# To read from the assessment server instead:
# [backend]
# type = "http"
# base_url = "https://quiz.example.com/api"
# api_token = "${QUIZREPORT_API_TOKEN}"
# timeout_secs = 30
"#;
