//! The `quizreport scale` commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};

use quizreport_core::marks::OptionMarksEdit;
use quizreport_core::model::ScoreScale;
use quizreport_core::scale_store::{RangeEdit, ScaleConfigStore, ScaleOrigin, ScaleSession};

use super::{find_packet, open_backend, quiz_packets};

#[derive(Subcommand)]
pub enum ScaleAction {
    /// Show the scale a packet would open with
    Show {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        /// Packet id or name
        #[arg(long)]
        packet: String,

        /// Unsaved option weight, as question_id:option_index=marks
        #[arg(long)]
        option: Option<String>,

        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate and save a packet's scale
    Save {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        /// Packet id or name
        #[arg(long)]
        packet: String,

        /// JSON file holding the ranges to save (default: the opened scale)
        #[arg(long)]
        from: Option<PathBuf>,

        /// Pending range edit, as index.field=value (e.g. 2.max=9)
        #[arg(long)]
        set: Option<String>,

        /// Save the scale but turn it off for this packet
        #[arg(long)]
        disable: bool,
    },
}

pub async fn execute(action: ScaleAction, config_path: Option<PathBuf>) -> Result<()> {
    let (_, backend) = open_backend(config_path.as_deref())?;
    let store = ScaleConfigStore::new(backend.clone());

    match action {
        ScaleAction::Show {
            quiz,
            packet,
            option,
            json,
        } => {
            let pending = option.as_deref().map(parse_option_edit).transpose()?;
            let packets = quiz_packets(backend.as_ref(), &quiz).await?;
            let packet = find_packet(&packets, &packet)?;
            let session = store.open(packet, pending.as_ref());

            if json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                print_session(&packet.name, &session);
            }
        }
        ScaleAction::Save {
            quiz,
            packet,
            from,
            set,
            disable,
        } => {
            let pending = set
                .as_deref()
                .map(str::parse::<RangeEdit>)
                .transpose()
                .context("invalid --set edit")?;
            let packets = quiz_packets(backend.as_ref(), &quiz).await?;
            let packet = find_packet(&packets, &packet)?;

            let draft = match &from {
                Some(path) => {
                    let content = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    serde_json::from_str::<ScoreScale>(&content)
                        .with_context(|| format!("failed to parse scale: {}", path.display()))?
                }
                None => store.open(packet, None).scale,
            };

            let saved = store
                .save(&packet.id, &draft, pending.as_ref(), !disable)
                .await
                .with_context(|| format!("scale for {} was not saved", packet.name))?;

            println!(
                "Saved {} range(s) for {} (scale {}).",
                saved.len(),
                packet.name,
                if disable { "disabled" } else { "enabled" }
            );
        }
    }

    Ok(())
}

/// Parse `question_id:option_index=marks`.
fn parse_option_edit(input: &str) -> Result<OptionMarksEdit> {
    let invalid = || anyhow::anyhow!("invalid option edit '{input}', expected question_id:index=marks");
    let (target, marks) = input.split_once('=').ok_or_else(invalid)?;
    let (question_id, index) = target.rsplit_once(':').ok_or_else(invalid)?;
    if question_id.trim().is_empty() {
        return Err(invalid());
    }
    Ok(OptionMarksEdit {
        question_id: question_id.trim().to_string(),
        option_index: index.trim().parse().map_err(|_| invalid())?,
        marks: marks.trim().parse().map_err(|_| invalid())?,
    })
}

fn print_session(name: &str, session: &ScaleSession) {
    let origin = match session.origin {
        ScaleOrigin::Persisted => "saved",
        ScaleOrigin::Generated => "generated",
    };
    println!(
        "{name}: marks {} to {} over {} question(s), {origin} scale, {}",
        session.marks.min_marks,
        session.marks.max_marks,
        session.marks.total_questions,
        if session.enabled { "enabled" } else { "disabled" }
    );

    let mut table = Table::new();
    table.set_header(vec!["#", "Min", "Max", "Label", "Color", "Image", "Text"]);
    for (i, range) in session.scale.ranges().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i),
            Cell::new(range.min),
            Cell::new(range.max),
            Cell::new(&range.label),
            Cell::new(&range.color),
            Cell::new(range.image.as_str()),
            Cell::new(&range.text),
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_edit_splits_on_last_colon() {
        let edit = parse_option_edit("q:1:2=5").unwrap();
        assert_eq!(edit.question_id, "q:1");
        assert_eq!(edit.option_index, 2);
        assert_eq!(edit.marks, 5);
    }

    #[test]
    fn option_edit_requires_marks() {
        assert!(parse_option_edit("q1:0").is_err());
        assert!(parse_option_edit(":0=3").is_err());
        assert!(parse_option_edit("q1:x=3").is_err());
    }
}
