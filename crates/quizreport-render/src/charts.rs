//! Summary page: stat cards, bar chart, gauge, scatter plot and table.

use std::f64::consts::PI;

use quizreport_core::report::ReportData;

use crate::canvas::{palette, truncate, Canvas, Color, Font, Paint};
use crate::document::{level_color, level_image};

/// Total marks that fill the gauge.
pub const GAUGE_FULL_MARKS: f64 = 50.0;
/// Marks at the top of the scatter plot, for every packet.
pub const SCATTER_MAX_MARKS: f64 = 12.0;

const CARD_GAP: f64 = 10.0;
const TABLE_HEADER_HEIGHT: f64 = 18.0;
const TABLE_ROW_HEIGHT: f64 = 16.0;

/// Start a new page and draw the analytics summary on it.
pub fn summary_page(canvas: &mut Canvas, data: &ReportData) {
    canvas.add_page();
    let width = canvas.width;
    canvas.rect(0.0, 0.0, width, 40.0, Paint::fill(palette::SUCCESS));
    canvas.text_centered(
        width / 2.0,
        25.0,
        "Assessment Summary & Analytics",
        Font::bold(20.0, Color::WHITE),
    );
    canvas.cursor_y = 60.0;

    stat_cards(canvas, data);
    bar_chart(canvas, data);
    gauge_and_scatter(canvas, data);
    summary_table(canvas, data);
}

fn stat_cards(canvas: &mut Canvas, data: &ReportData) {
    let card_width = (canvas.content_width() - 2.0 * CARD_GAP) / 3.0;
    let (m, y) = (canvas.margin, canvas.cursor_y);
    let overall = &data.overall.range;
    let overall_color = level_color(overall);
    let big = Font::bold(24.0, Color::WHITE);
    let small = Font::normal(10.0, Color::WHITE);

    let cards = [
        (palette::PRIMARY, "Total Marks"),
        (overall_color, "Performance"),
        (palette::SECONDARY, "Total Questions"),
    ];
    for (i, (color, label)) in cards.into_iter().enumerate() {
        let x = m + i as f64 * (card_width + CARD_GAP);
        let cx = x + card_width / 2.0;
        canvas.rounded_rect(x, y, card_width, 50.0, 6.0, Paint::fill(color));
        match i {
            0 => canvas.text_centered(cx, y + 20.0, data.total_marks().to_string(), big),
            1 if overall.image.is_raster() => {
                level_image(canvas, cx - 4.0, y + 24.0, 24.0, overall, Color::WHITE)
            }
            1 => canvas.text_centered(cx, y + 20.0, overall.image.as_str(), big),
            _ => canvas.text_centered(
                cx,
                y + 20.0,
                data.attempt.total_questions.to_string(),
                big,
            ),
        }
        canvas.text_centered(cx, y + 35.0, label, small);
    }

    canvas.cursor_y += 70.0;
}

fn bar_chart(canvas: &mut Canvas, data: &ReportData) {
    canvas.ensure_page_space(120.0);
    let (m, y) = (canvas.margin, canvas.cursor_y);
    canvas.rounded_rect(
        m,
        y,
        canvas.content_width(),
        100.0,
        6.0,
        Paint::fill_stroke(Color::WHITE, palette::GRAY_200, 1.0),
    );
    canvas.text(
        m + 10.0,
        y + 15.0,
        "Section Performance Comparison",
        Font::bold(14.0, palette::GRAY_900),
    );

    let chart_x = m + 20.0;
    let chart_y = y + 25.0;
    let chart_width = canvas.content_width() - 40.0;
    let chart_height = 50.0;

    let scores = &data.packet_scores;
    if !scores.is_empty() {
        let slot = chart_width / scores.len() as f64;
        let bar_width = (slot - 10.0).max(1.0);
        let max_marks = data.max_packet_marks() as f64;

        for (i, score) in scores.iter().enumerate() {
            let color = level_color(&score.level.range);
            let bar_height = chart_height * (score.marks.max(0) as f64) / max_marks;
            let bar_x = chart_x + i as f64 * slot;
            let bar_y = chart_y + chart_height - bar_height;
            let center = bar_x + bar_width / 2.0;

            if bar_height > 0.0 {
                canvas.rounded_rect(bar_x, bar_y, bar_width, bar_height, 2.0, Paint::fill(color));
            }
            canvas.text_centered(
                center,
                bar_y - 3.0,
                score.marks.to_string(),
                Font::bold(9.0, palette::GRAY_700),
            );
            canvas.text_centered(
                center,
                chart_y + chart_height + 10.0,
                truncate(&score.name, 12),
                Font::normal(8.0, palette::GRAY_700),
            );
        }
    }

    let axis = Font::normal(8.0, palette::GRAY_500);
    canvas.text(chart_x - 15.0, chart_y, "100%", axis);
    canvas.text(chart_x - 15.0, chart_y + chart_height / 2.0, "50%", axis);
    canvas.text(chart_x - 15.0, chart_y + chart_height, "0%", axis);

    canvas.cursor_y += 120.0;
}

/// Gauge on the left half, scatter plot on the right half of one row.
fn gauge_and_scatter(canvas: &mut Canvas, data: &ReportData) {
    canvas.ensure_page_space(120.0);
    let half = (canvas.content_width() - CARD_GAP) / 2.0;
    let (m, y) = (canvas.margin, canvas.cursor_y);
    let frame = Paint::fill_stroke(Color::WHITE, palette::GRAY_200, 1.0);
    let title = Font::bold(14.0, palette::GRAY_900);

    // Gauge
    canvas.rounded_rect(m, y, half, 100.0, 6.0, frame);
    canvas.text(m + 10.0, y + 15.0, "Performance Gauge", title);

    let overall = &data.overall.range;
    let color = level_color(overall);
    let (cx, cy, r) = (m + half / 2.0, y + 60.0, 30.0);
    canvas.circle(cx, cy, r, Paint::stroke(palette::GRAY_300, 8.0));
    let fraction = (data.total_marks().max(0) as f64 / GAUGE_FULL_MARKS).min(1.0);
    if fraction > 0.0 {
        canvas.arc(cx, cy, r, fraction * 2.0 * PI, color, 8.0);
    }
    canvas.text_centered(
        cx,
        cy + 2.0,
        data.total_marks().to_string(),
        Font::bold(18.0, palette::GRAY_900),
    );
    canvas.text_centered(cx, cy + 15.0, overall.label.clone(), Font::normal(10.0, palette::GRAY_900));

    // Scatter
    let sx = m + half + CARD_GAP;
    canvas.rounded_rect(sx, y, half, 100.0, 6.0, frame);
    canvas.text(sx + 10.0, y + 15.0, "Score Distribution", title);

    let (px, py) = (sx + 20.0, y + 25.0);
    let (pw, ph) = (half - 40.0, 60.0);
    canvas.rect(px, py, pw, ph, Paint::stroke(palette::GRAY_300, 0.5));
    for i in 1..5 {
        let gy = py + ph / 5.0 * i as f64;
        canvas.line(px, gy, px + pw, gy, palette::GRAY_200, 0.3);
    }

    let scores = &data.packet_scores;
    let n = scores.len();
    for i in 1..n {
        let gx = px + pw / n as f64 * i as f64;
        canvas.line(gx, py, gx, py + ph, palette::GRAY_200, 0.3);
    }
    for (i, score) in scores.iter().enumerate() {
        let point_x = if n > 1 {
            px + pw / (n - 1) as f64 * i as f64
        } else {
            px + pw / 2.0
        };
        let ratio = (score.marks as f64 / SCATTER_MAX_MARKS).clamp(0.0, 1.0);
        let point_y = py + ph - ph * ratio;
        canvas.circle(point_x, point_y, 3.0, Paint::fill(level_color(&score.level.range)));
        canvas.text_centered(
            point_x,
            point_y - 5.0,
            score.marks.to_string(),
            Font::normal(8.0, palette::GRAY_600),
        );
    }

    canvas.cursor_y += 120.0;
}

fn summary_table(canvas: &mut Canvas, data: &ReportData) {
    let scores = &data.packet_scores;
    canvas.ensure_page_space(TABLE_HEADER_HEIGHT + 2.0 + scores.len() as f64 * TABLE_ROW_HEIGHT);
    let (m, width) = (canvas.margin, canvas.width);
    let columns = [m + 10.0, m + 80.0, m + 120.0, m + 160.0, width - m - 40.0];
    table_header(canvas, &columns);

    let body = Font::normal(10.0, palette::GRAY_700);
    for (i, score) in scores.iter().enumerate() {
        // Rows continue on a fresh page under a repeated header.
        if canvas.ensure_page_space(TABLE_ROW_HEIGHT) {
            table_header(canvas, &columns);
        }
        let y = canvas.cursor_y;
        let shade = if i % 2 == 0 { Color::WHITE } else { palette::GRAY_50 };
        let level = &score.level.range;
        let color = level_color(level);

        canvas.rect(m, y, canvas.content_width(), TABLE_ROW_HEIGHT, Paint::fill(shade));
        canvas.line(
            m,
            y + TABLE_ROW_HEIGHT,
            width - m,
            y + TABLE_ROW_HEIGHT,
            palette::GRAY_200,
            0.3,
        );
        canvas.text(columns[0], y + 10.0, truncate(&score.name, 20), body);
        canvas.text(columns[1], y + 10.0, score.marks.to_string(), body);
        level_image(canvas, columns[2], y + 10.0, 10.0, level, color);
        canvas.text(columns[3], y + 10.0, score.questions.to_string(), body);
        canvas.text(columns[4], y + 10.0, level.label.clone(), Font::bold(10.0, color));

        canvas.cursor_y += TABLE_ROW_HEIGHT;
    }
    canvas.cursor_y += 10.0;
}

fn table_header(canvas: &mut Canvas, columns: &[f64; 5]) {
    let y = canvas.cursor_y;
    canvas.rounded_rect(
        canvas.margin,
        y,
        canvas.content_width(),
        TABLE_HEADER_HEIGHT,
        3.0,
        Paint::fill_stroke(palette::PRIMARY, palette::PRIMARY, 0.5),
    );
    let head = Font::bold(11.0, Color::WHITE);
    for (x, label) in columns
        .iter()
        .zip(["Section", "Marks", "Level", "Questions", "Performance"])
    {
        canvas.text(*x, y + 12.0, label, head);
    }
    canvas.cursor_y += TABLE_HEADER_HEIGHT + 2.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawOp;
    use crate::test_support::report_with_packets;

    fn summary(data: &ReportData) -> Canvas {
        let mut canvas = Canvas::new();
        summary_page(&mut canvas, data);
        canvas
    }

    fn ops(canvas: &Canvas) -> Vec<&DrawOp> {
        canvas.pages().iter().flat_map(|p| p.ops.iter()).collect()
    }

    #[test]
    fn gauge_sweep_follows_total_marks() {
        let mut data = report_with_packets(2);
        data.attempt.total_marks = 25;
        let canvas = summary(&data);
        let sweep = ops(&canvas)
            .into_iter()
            .find_map(|op| match op {
                DrawOp::Arc { sweep, .. } => Some(*sweep),
                _ => None,
            })
            .unwrap();
        assert!((sweep - PI).abs() < 1e-9);

        data.attempt.total_marks = 80;
        let canvas = summary(&data);
        assert!(ops(&canvas).iter().any(|op| matches!(op, DrawOp::Arc { sweep, .. } if (*sweep - 2.0 * PI).abs() < 1e-9)));
    }

    #[test]
    fn tallest_bar_is_best_packet() {
        let data = report_with_packets(3);
        let canvas = summary(&data);
        let heights: Vec<f64> = ops(&canvas)
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::Rect { h, radius, .. } if *radius == 2.0 => Some(*h),
                _ => None,
            })
            .collect();
        assert_eq!(heights.len(), 3);
        let best = heights.iter().cloned().fold(0.0, f64::max);
        assert!((best - 50.0).abs() < 1e-9);
    }

    #[test]
    fn single_packet_scatter_is_centered() {
        let data = report_with_packets(1);
        let canvas = summary(&data);
        let points: Vec<f64> = ops(&canvas)
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::Circle { cx, r, .. } if *r == 3.0 => Some(*cx),
                _ => None,
            })
            .collect();
        assert_eq!(points.len(), 1);
        assert!(points[0].is_finite());
    }

    #[test]
    fn table_truncates_long_names() {
        let mut data = report_with_packets(1);
        data.packet_scores[0].name = "Emotional Regulation Under Pressure".into();
        let canvas = summary(&data);
        let text: Vec<&str> = ops(&canvas)
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(text.contains(&"Emotional Regulation..."));
        assert!(text.contains(&"Emotional Re..."));
    }

    #[test]
    fn long_table_continues_on_next_page() {
        let data = report_with_packets(20);
        let canvas = summary(&data);
        let limit = canvas.height - canvas.margin;
        let chart_page = canvas
            .pages()
            .iter()
            .position(|p| {
                p.ops.iter().any(|op| {
                    matches!(op, DrawOp::Text { text, .. } if text == "Section Performance Comparison")
                })
            })
            .unwrap();

        let mut rows = Vec::new();
        for (page, p) in canvas.pages().iter().enumerate() {
            for op in &p.ops {
                if let DrawOp::Text { y, text, .. } = op {
                    assert!(*y <= limit, "{text:?} drawn at y={y} on page {page}");
                    if page > chart_page && text.starts_with("Sleep ") {
                        rows.push(text.clone());
                    }
                }
            }
        }
        for i in 1..=20 {
            assert_eq!(rows.iter().filter(|r| **r == format!("Sleep {i}")).count(), 1);
        }

        let headers = ops(&canvas)
            .into_iter()
            .filter(|op| matches!(op, DrawOp::Text { text, .. } if text == "Questions"))
            .count();
        assert!(headers >= 2, "table header not repeated");
    }
}
