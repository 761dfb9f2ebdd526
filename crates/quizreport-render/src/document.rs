//! Paginated report layout.
//!
//! The document always draws the same sections in the same order; template
//! ordering and visibility apply to the on-screen view only. Footers and page
//! numbers are stamped after the last page exists.

use quizreport_core::insights::Tone;
use quizreport_core::model::{RangeImage, ScoreRange};
use quizreport_core::report::{PacketScore, ReportData};

use crate::canvas::{palette, Anchor, Canvas, Color, DrawOp, Font, Page, Paint, PT_TO_MM};
use crate::charts;

/// A laid-out report: pages of draw operations.
#[derive(Debug, Clone)]
pub struct Document {
    pub pages: Vec<Page>,
    /// Page width in millimetres.
    pub width: f64,
    /// Page height in millimetres.
    pub height: f64,
    /// Base name for output files, without extension.
    pub file_name: String,
    pub title: String,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All text drawn on page `index`, in drawing order.
    pub fn page_text(&self, index: usize) -> Vec<&str> {
        self.pages
            .get(index)
            .map(|page| {
                page.ops
                    .iter()
                    .filter_map(|op| match op {
                        DrawOp::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Lay out the full document for one report.
pub fn layout(data: &ReportData) -> Document {
    let mut canvas = Canvas::new();

    header(&mut canvas, data);
    user_card(&mut canvas, data);
    overall_score(&mut canvas, data);
    section_analysis(&mut canvas, data);
    insights(&mut canvas, data);
    recommendations(&mut canvas, data);
    charts::summary_page(&mut canvas, data);
    stamp_footers(&mut canvas, data);

    tracing::debug!(
        quiz = %data.quiz.id,
        attempt = %data.attempt.id,
        pages = canvas.page_count(),
        "laid out report"
    );

    Document {
        width: canvas.width,
        height: canvas.height,
        pages: canvas.into_pages(),
        file_name: data.file_name(),
        title: data.quiz.name.clone(),
    }
}

/// Color of a resolved level, or the primary color when it has none.
pub(crate) fn level_color(range: &ScoreRange) -> Color {
    Color::from_hex_or(&range.color, palette::PRIMARY)
}

pub(crate) fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Success => palette::SUCCESS,
        Tone::Warning => palette::WARNING,
        Tone::Primary => palette::PRIMARY,
        Tone::Secondary => palette::SECONDARY,
        Tone::Error => palette::ERROR,
    }
}

/// Draw a level's glyph as text, or its raster image as a square whose bottom
/// edge sits on `baseline`.
pub(crate) fn level_image(
    canvas: &mut Canvas,
    x: f64,
    baseline: f64,
    size: f64,
    range: &ScoreRange,
    color: Color,
) {
    match &range.image {
        RangeImage::Glyph(glyph) => canvas.text(x, baseline, glyph.clone(), Font::bold(size, color)),
        RangeImage::Raster(uri) => {
            let side = size * PT_TO_MM;
            canvas.image(x, baseline - side, side, side, uri.clone());
        }
    }
}

fn section_title(canvas: &mut Canvas, title: &str) {
    let y = canvas.cursor_y;
    canvas.text(canvas.margin, y, title, Font::bold(18.0, palette::GRAY_900));
}

fn card(canvas: &mut Canvas, y: f64, height: f64, radius: f64, fill: Color, stroke_width: f64) {
    let (x, w) = (canvas.margin, canvas.content_width());
    canvas.rounded_rect(
        x,
        y,
        w,
        height,
        radius,
        Paint::fill_stroke(fill, palette::GRAY_200, stroke_width),
    );
}

fn header(canvas: &mut Canvas, data: &ReportData) {
    let width = canvas.width;
    let title_font = Font::bold(22.0, Color::WHITE);
    let lines = crate::canvas::wrap_text(&data.quiz.name, title_font.size, canvas.content_width());
    // Titles past two lines push the subtitle and the band down.
    let extra = lines.len().saturating_sub(2) as f64 * 8.0;

    canvas.rect(0.0, 0.0, width, 50.0 + extra, Paint::fill(palette::PRIMARY));
    for (i, line) in lines.into_iter().enumerate() {
        canvas.text_centered(width / 2.0, 20.0 + i as f64 * 8.0, line, title_font);
    }
    canvas.text_centered(
        width / 2.0,
        35.0 + extra,
        data.subtitle(),
        Font::normal(12.0, palette::INDIGO_100),
    );

    canvas.cursor_y = 65.0 + extra;
}

fn user_card(canvas: &mut Canvas, data: &ReportData) {
    canvas.ensure_page_space(35.0);
    let (m, y) = (canvas.margin, canvas.cursor_y);
    card(canvas, y, 30.0, 4.0, Color::WHITE, 0.5);

    let label = Font::normal(10.0, palette::GRAY_700);
    let value = Font::bold(10.0, palette::GRAY_700);
    let completed = data
        .attempt
        .completed_at
        .map(|at| at.format("%B %-d, %Y, %H:%M").to_string())
        .unwrap_or_else(|| "Not completed".to_string());

    canvas.text(m + 10.0, y + 10.0, "Participant:", label);
    canvas.text(m + 35.0, y + 10.0, data.user.display_name(), value);
    canvas.text(m + 10.0, y + 18.0, "Email:", label);
    canvas.text(
        m + 25.0,
        y + 18.0,
        data.user.email.as_deref().unwrap_or("No email provided"),
        value,
    );
    canvas.text(m + 10.0, y + 26.0, "Completed:", label);
    canvas.text(m + 40.0, y + 26.0, completed, value);

    canvas.cursor_y += 45.0;
}

fn overall_score(canvas: &mut Canvas, data: &ReportData) {
    canvas.ensure_page_space(120.0);
    section_title(canvas, "Overall Performance");
    canvas.cursor_y += 15.0;

    let (m, y, width) = (canvas.margin, canvas.cursor_y, canvas.width);
    card(canvas, y, 80.0, 6.0, Color::WHITE, 1.0);

    let level = &data.overall.range;
    let color = level_color(level);
    let (cx, cy) = (width / 2.0, y + 40.0);
    canvas.circle(cx, cy, 25.0, Paint::fill(color).with_opacity(0.1));
    canvas.circle(cx, cy, 25.0, Paint::stroke(color, 3.0));
    canvas.text_centered(cx, cy + 2.0, data.total_marks().to_string(), Font::bold(24.0, color));
    canvas.text_centered(cx, cy + 15.0, level.label.clone(), Font::normal(12.0, color));

    let label = Font::normal(11.0, palette::GRAY_700);
    canvas.text(m + 15.0, y + 20.0, "Questions Answered:", label);
    canvas.text(
        m + 15.0,
        y + 30.0,
        data.attempt.total_questions.to_string(),
        Font::bold(11.0, palette::GRAY_700),
    );
    canvas.text(m + 15.0, y + 45.0, "Total Marks:", label);
    canvas.text(
        m + 15.0,
        y + 55.0,
        data.total_marks().to_string(),
        Font::bold(11.0, palette::SUCCESS),
    );

    let right = width - m - 50.0;
    canvas.text(right, y + 20.0, "Performance:", label);
    canvas.text(right, y + 30.0, level.label.clone(), Font::bold(11.0, color));
    canvas.text(right, y + 45.0, "Level:", label);
    level_image(canvas, right, y + 55.0, 11.0, level, color);

    canvas.cursor_y += 95.0;
}

fn section_analysis(canvas: &mut Canvas, data: &ReportData) {
    canvas.ensure_page_space(60.0);
    section_title(canvas, "Section Analysis");
    canvas.cursor_y += 20.0;

    for score in &data.packet_scores {
        packet_card(canvas, score);
    }
}

const PACKET_CARD_HEIGHT: f64 = 70.0;

fn packet_card(canvas: &mut Canvas, score: &PacketScore) {
    canvas.ensure_page_space(PACKET_CARD_HEIGHT + 10.0);
    let (m, y, width) = (canvas.margin, canvas.cursor_y, canvas.width);
    let level = &score.level.range;
    let color = level_color(level);

    card(canvas, y, PACKET_CARD_HEIGHT, 4.0, Color::WHITE, 0.5);
    canvas.rounded_rect(m, y, 4.0, PACKET_CARD_HEIGHT, 2.0, Paint::fill(color));

    canvas.text(m + 15.0, y + 15.0, score.name.clone(), Font::bold(14.0, palette::GRAY_900));
    level_image(canvas, width - m - 40.0, y + 20.0, 20.0, level, color);

    let detail = Font::normal(10.0, palette::GRAY_700);
    canvas.text(m + 15.0, y + 30.0, format!("Marks: {}", score.marks), detail);
    canvas.text(m + 15.0, y + 42.0, format!("Questions: {}", score.questions), detail);
    canvas.text(m + 15.0, y + 54.0, format!("Level: {}", level.label), detail);

    let (bx, by) = (width - m - 85.0, y + 50.0);
    canvas.circle(bx, by, 12.0, Paint::fill(color));
    let short: String = level.label.chars().take(3).collect();
    canvas.text_centered(bx, by + 3.0, short, Font::bold(10.0, Color::WHITE));

    canvas.cursor_y += PACKET_CARD_HEIGHT + 10.0;
}

const INSIGHTS_CARD_MIN_HEIGHT: f64 = 80.0;

fn insights(canvas: &mut Canvas, data: &ReportData) {
    let font = Font::normal(11.0, palette::GRAY_700);
    let max_width = canvas.content_width() - 50.0;
    let lines = crate::canvas::wrap_text(&data.insights, font.size, max_width);
    let height = (lines.len() as f64 * 6.0 + 24.0).max(INSIGHTS_CARD_MIN_HEIGHT);

    canvas.ensure_page_space(height + 20.0);
    section_title(canvas, "Performance Insights");
    canvas.cursor_y += 20.0;

    let (m, y) = (canvas.margin, canvas.cursor_y);
    card(canvas, y, height, 6.0, palette::GRAY_50, 0.5);

    canvas.circle(m + 20.0, y + 20.0, 8.0, Paint::fill(palette::PRIMARY));
    canvas.text_centered(m + 20.0, y + 23.0, "!", Font::bold(12.0, Color::WHITE));

    for (i, line) in lines.into_iter().enumerate() {
        canvas.text(m + 35.0, y + 15.0 + i as f64 * 6.0, line, font);
    }

    canvas.cursor_y += height + 20.0;
}

fn recommendations(canvas: &mut Canvas, data: &ReportData) {
    canvas.ensure_page_space(120.0);
    section_title(canvas, "Recommendations");
    canvas.cursor_y += 20.0;

    let font = Font::normal(11.0, palette::GRAY_700);
    let max_width = canvas.content_width() - 40.0;
    for (i, rec) in data.recommendations.iter().enumerate() {
        let lines = crate::canvas::wrap_text(&rec.text, font.size, max_width);
        let height = (lines.len() as f64 * 6.0 + 17.0).max(35.0);
        canvas.ensure_page_space(height + 5.0);
        let (m, y) = (canvas.margin, canvas.cursor_y);
        card(canvas, y, height, 4.0, Color::WHITE, 0.5);

        canvas.circle(m + 15.0, y + 17.0, 8.0, Paint::fill(tone_color(rec.tone)));
        canvas.text_centered(
            m + 15.0,
            y + 20.0,
            (i + 1).to_string(),
            Font::bold(12.0, Color::WHITE),
        );

        for (j, line) in lines.into_iter().enumerate() {
            canvas.text(m + 30.0, y + 12.0 + j as f64 * 6.0, line, font);
        }

        canvas.cursor_y += height + 10.0;
    }
}

fn stamp_footers(canvas: &mut Canvas, data: &ReportData) {
    let total = canvas.page_count();
    let (m, w, h) = (canvas.margin, canvas.width, canvas.height);
    let small = Font::normal(8.0, palette::GRAY_500);
    let date = format!("Report Date: {}", data.generated_at.format("%Y-%m-%d"));

    for index in 0..total {
        canvas.push_to(
            index,
            DrawOp::Line {
                x1: m,
                y1: h - 20.0,
                x2: w - m,
                y2: h - 20.0,
                color: palette::GRAY_200,
                width: 0.5,
            },
        );
        for (y, text) in [(h - 12.0, data.footer_line().to_string()), (h - 6.0, date.clone())] {
            canvas.push_to(
                index,
                DrawOp::Text {
                    x: m,
                    y,
                    text,
                    font: small,
                    anchor: Anchor::Start,
                },
            );
        }
        canvas.push_to(
            index,
            DrawOp::Text {
                x: w - m,
                y: h - 10.0,
                text: format!("Page {} of {}", index + 1, total),
                font: Font::normal(9.0, palette::GRAY_500),
                anchor: Anchor::End,
            },
        );
    }
}
