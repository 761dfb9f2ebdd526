//! The `quizreport template` commands.
//!
//! Every mutating command opens a [`TemplateEditor`] on the stored template,
//! publishes one new version, saves it explicitly and closes the session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Table};

use quizreport_core::autosave::TemplateEditor;
use quizreport_core::model::Packet;
use quizreport_core::template::{Direction, Preset, ReportTemplate, SectionId};
use quizreport_core::template_edit::TemplateEdit;
use quizreport_core::traits::{Backend, TemplateStore};
use quizreport_store::QuizreportConfig;

use super::{find_packet, open_backend, quiz_packets};

/// A rendered section or a packet card.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct Target {
    /// Section key, e.g. charts or sectionAnalysis
    #[arg(long)]
    section: Option<String>,

    /// Packet id or name
    #[arg(long)]
    packet: Option<String>,
}

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Print section and packet layout
    Show {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        /// Print the whole template as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a section or packet one place up or down
    Move {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        #[command(flatten)]
        target: Target,

        /// up or down
        #[arg(long)]
        direction: String,
    },

    /// Enable or disable a section or packet
    Toggle {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        #[command(flatten)]
        target: Target,
    },

    /// Set template fields, e.g. header.title=Results or packet.p1.chartType=gauge
    Set {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        /// One or more path=value edits
        #[arg(required = true)]
        edits: Vec<String>,
    },

    /// Restore default section order, or packet order with --packets
    Reset {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        /// Reset packet order instead of section order
        #[arg(long)]
        packets: bool,
    },

    /// Check user-entered template values
    Validate {
        /// Quiz id
        #[arg(long)]
        quiz: String,
    },

    /// Apply a style preset: professional, creative, minimal, academic
    Preset {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        /// Preset name
        name: String,
    },
}

/// Stored template with a config for every current packet.
struct Loaded {
    template: ReportTemplate,
    packets: Vec<Packet>,
}

async fn load(backend: &dyn Backend, quiz_id: &str) -> Result<Loaded> {
    let packets = quiz_packets(backend, quiz_id).await?;
    let mut template = backend
        .load_template(quiz_id)
        .await
        .with_context(|| format!("failed to load template of quiz {quiz_id}"))?
        .unwrap_or_default();
    let added = template.sync_packets(&packets);
    if added > 0 {
        tracing::debug!(quiz = quiz_id, added, "added default packet configs");
    }
    Ok(Loaded { template, packets })
}

/// Publish `next` through an editor, save it, and close the session.
async fn commit(
    backend: Arc<dyn Backend>,
    config: &QuizreportConfig,
    quiz_id: &str,
    loaded: Loaded,
    next: ReportTemplate,
) -> Result<()> {
    let editor = TemplateEditor::new(
        quiz_id,
        loaded.template,
        backend,
        config.autosave_debounce(),
    );
    editor.update(|_| next);
    let saved = editor.save().await.context("failed to save template")?;
    editor.close().await?;
    println!("Saved template version {}.", saved.version);
    Ok(())
}

pub async fn execute(action: TemplateAction, config_path: Option<PathBuf>) -> Result<()> {
    let (config, backend) = open_backend(config_path.as_deref())?;

    match action {
        TemplateAction::Show { quiz, json } => {
            let loaded = load(backend.as_ref(), &quiz).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&loaded.template)?);
            } else {
                print_layout(&loaded.template, &loaded.packets);
            }
        }
        TemplateAction::Move {
            quiz,
            target,
            direction,
        } => {
            let direction: Direction = direction.parse()?;
            let loaded = load(backend.as_ref(), &quiz).await?;
            let mut next = loaded.template.clone();
            let moved = match (&target.section, &target.packet) {
                (Some(section), _) => {
                    let id: SectionId = section.parse()?;
                    anyhow::ensure!(id.is_rendered(), "section {id} is not part of the report layout");
                    next.move_section(id, direction)
                }
                (None, Some(packet)) => {
                    let packet = find_packet(&loaded.packets, packet)?;
                    next.move_packet(&packet.id, direction, &loaded.packets)
                }
                (None, None) => anyhow::bail!("either --section or --packet is required"),
            };
            if !moved {
                println!("Nothing to move.");
                return Ok(());
            }
            commit(backend, &config, &quiz, loaded, next).await?;
        }
        TemplateAction::Toggle { quiz, target } => {
            let loaded = load(backend.as_ref(), &quiz).await?;
            let mut next = loaded.template.clone();
            let (name, enabled) = match (&target.section, &target.packet) {
                (Some(section), _) => {
                    let id: SectionId = section.parse()?;
                    (id.to_string(), next.toggle_section(id))
                }
                (None, Some(packet)) => {
                    let packet = find_packet(&loaded.packets, packet)?;
                    (packet.name.clone(), next.toggle_packet(&packet.id)?)
                }
                (None, None) => anyhow::bail!("either --section or --packet is required"),
            };
            println!("{name} is now {}.", if enabled { "enabled" } else { "disabled" });
            commit(backend, &config, &quiz, loaded, next).await?;
        }
        TemplateAction::Set { quiz, edits } => {
            let edits = edits
                .iter()
                .map(|e| TemplateEdit::parse(e).with_context(|| format!("invalid edit '{e}'")))
                .collect::<Result<Vec<_>>>()?;
            let loaded = load(backend.as_ref(), &quiz).await?;
            let editor = TemplateEditor::new(
                quiz.as_str(),
                loaded.template,
                backend,
                config.autosave_debounce(),
            );
            for edit in &edits {
                editor.apply(edit)?;
            }
            for issue in editor.current().validate() {
                eprintln!("Warning: {issue}");
            }
            let saved = editor.save().await.context("failed to save template")?;
            editor.close().await?;
            println!(
                "Applied {} edit(s). Saved template version {}.",
                edits.len(),
                saved.version
            );
        }
        TemplateAction::Reset { quiz, packets } => {
            let loaded = load(backend.as_ref(), &quiz).await?;
            let mut next = loaded.template.clone();
            if packets {
                next.reset_packet_order(&loaded.packets);
                println!("Packet order reset.");
            } else {
                next.reset_section_order();
                println!("Section order reset.");
            }
            commit(backend, &config, &quiz, loaded, next).await?;
        }
        TemplateAction::Validate { quiz } => {
            let loaded = load(backend.as_ref(), &quiz).await?;
            let issues = loaded.template.validate();
            if issues.is_empty() {
                println!("Template for quiz {quiz} is valid.");
            } else {
                for issue in &issues {
                    println!("  - {issue}");
                }
                anyhow::bail!("template has {} issue(s)", issues.len());
            }
        }
        TemplateAction::Preset { quiz, name } => {
            let preset: Preset = name.parse()?;
            let loaded = load(backend.as_ref(), &quiz).await?;
            let mut next = loaded.template.clone();
            next.apply_preset(preset);
            println!("Applied {} preset.", name.to_lowercase());
            commit(backend, &config, &quiz, loaded, next).await?;
        }
    }

    Ok(())
}

fn print_layout(template: &ReportTemplate, packets: &[Packet]) {
    let mut sections = Table::new();
    sections.set_header(vec!["Section", "Enabled", "Order"]);
    let mut ids = SectionId::RENDERED.to_vec();
    ids.sort_by_key(|id| template.placement(*id).1);
    for id in ids {
        let (enabled, order) = template.placement(id);
        sections.add_row(vec![
            Cell::new(id),
            Cell::new(if enabled { "yes" } else { "no" }),
            Cell::new(order),
        ]);
    }
    println!("{sections}");

    let mut cards = Table::new();
    cards.set_header(vec!["Packet", "Name", "Title", "Enabled", "Order"]);
    let mut configured: Vec<_> = packets
        .iter()
        .filter_map(|p| template.packet_configs.get(&p.id).map(|cfg| (p, cfg)))
        .collect();
    configured.sort_by_key(|(_, cfg)| cfg.order);
    for (packet, cfg) in configured {
        cards.add_row(vec![
            Cell::new(&packet.id),
            Cell::new(&packet.name),
            Cell::new(&cfg.title),
            Cell::new(if cfg.enabled { "yes" } else { "no" }),
            Cell::new(cfg.order),
        ]);
    }
    println!("{cards}");
}
