//! The `quizreport marks` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizreport_core::marks;

use super::{open_backend, quiz_packets};

pub async fn execute(quiz_id: String, config_path: Option<PathBuf>) -> Result<()> {
    let (_, backend) = open_backend(config_path.as_deref())?;
    let packets = quiz_packets(backend.as_ref(), &quiz_id).await?;

    if packets.is_empty() {
        println!("Quiz {quiz_id} has no packets.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Packet", "Name", "Questions", "Min", "Max", "Scale"]);

    for packet in &packets {
        let range = marks::calculate(&packet.questions);
        let scale = match packet.active_scale() {
            Some(scale) => format!("{} ranges", scale.len()),
            None if packet.scoring_scale.is_some() => "disabled".to_string(),
            None => "default".to_string(),
        };
        table.add_row(vec![
            Cell::new(&packet.id),
            Cell::new(&packet.name),
            Cell::new(range.total_questions),
            Cell::new(range.min_marks),
            Cell::new(range.max_marks),
            Cell::new(scale),
        ]);
    }

    println!("{table}");
    Ok(())
}
