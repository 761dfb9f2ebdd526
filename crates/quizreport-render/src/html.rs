//! On-screen HTML report.
//!
//! Unlike the paginated document, this view follows the template: sections
//! and packet cards appear in template order, disabled ones are left out, and
//! each box carries its configured style.

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use quizreport_core::model::{RangeImage, ScoreRange};
use quizreport_core::report::{PacketCard, ReportData};
use quizreport_core::template::{
    BoxStyle, ImageDisplayStyle, LevelIndicatorStyle, ReportTemplate, ScaleProgressStyle, SectionId,
    TextDisplayPosition,
};

use crate::charts::GAUGE_FULL_MARKS;
use crate::document::{level_color, tone_color};

/// Escape a string for safe HTML insertion.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Inline `style` attribute from CSS declarations, skipping empty values.
fn style_attr(declarations: &[(&str, &str)]) -> String {
    let css: Vec<String> = declarations
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(property, value)| format!("{property}: {value}"))
        .collect();
    if css.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", html_escape(&css.join("; ")))
    }
}

fn box_style(style: &BoxStyle, extra: &[(&str, &str)]) -> String {
    let border = if style.border_width.trim().is_empty() {
        String::new()
    } else {
        format!("{} solid {}", style.border_width, style.border_color)
    };
    let mut declarations = vec![
        ("background-color", style.background_color.as_str()),
        ("border", border.as_str()),
        ("border-radius", style.border_radius.as_str()),
        ("font-size", style.font_size.as_str()),
        ("font-weight", style.font_weight.as_str()),
        ("text-align", style.text_align.as_str()),
        ("padding", style.padding.as_str()),
        ("margin", style.margin.as_str()),
        ("box-shadow", style.shadow.as_str()),
    ];
    declarations.extend_from_slice(extra);
    style_attr(&declarations)
}

fn theme_css(template: &ReportTemplate) -> String {
    let colors = &template.colors;
    let typography = &template.typography;
    format!(
        ":root {{ --primary: {}; --secondary: {}; --success: {}; --warning: {}; --danger: {}; --info: {}; --light: {}; --dark: {}; \
         --heading-size: {}; --subheading-size: {}; --body-size: {}; --caption-size: {}; }}\n\
         body {{ font-family: {}; line-height: {}; letter-spacing: {}; background: {}; }}\n\
         h1, h2, h3 {{ font-family: {}; }}\n",
        colors.primary,
        colors.secondary,
        colors.success,
        colors.warning,
        colors.danger,
        colors.info,
        colors.light,
        colors.dark,
        typography.heading_font_size,
        typography.subheading_font_size,
        typography.body_font_size,
        typography.caption_font_size,
        typography.secondary_font,
        typography.line_height,
        typography.letter_spacing,
        template.page.background_color,
        typography.primary_font,
    )
}

/// Generate the on-screen HTML view of a report.
pub fn generate_html(data: &ReportData) -> String {
    let view = data.view();
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(
        html,
        "<title>{} | {}</title>",
        html_escape(&data.quiz.name),
        html_escape(data.user.display_name())
    );
    html.push_str("<style>\n");
    html.push_str(&theme_css(&data.template));
    html.push_str(CSS);
    html.push_str("</style>\n</head>\n<body>\n<main class=\"report\">\n");

    if data.template.page.show_watermark {
        let _ = writeln!(
            html,
            "<div class=\"watermark\"{}>{}</div>",
            style_attr(&[("opacity", data.template.page.watermark_opacity.as_str())]),
            html_escape(&data.template.page.watermark_text)
        );
    }

    for section in &view.sections {
        match section {
            SectionId::Header => header(&mut html, data),
            SectionId::UserInfo => user_info(&mut html, data),
            SectionId::OverallScore => overall_score(&mut html, data),
            SectionId::Charts => charts(&mut html, data),
            SectionId::SectionAnalysis => section_analysis(&mut html, data, &view.packets),
            SectionId::PerformanceInsights => insights(&mut html, data),
            SectionId::Recommendations => recommendations(&mut html, data),
            SectionId::Footer => footer(&mut html, data),
            _ => {}
        }
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

/// Write the on-screen HTML view to a file.
pub fn write_html_report(data: &ReportData, path: &Path) -> Result<()> {
    let html = generate_html(data);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn header(html: &mut String, data: &ReportData) {
    let section = &data.template.header;
    let _ = writeln!(
        html,
        "<header class=\"section header\"{}>",
        box_style(&section.style, &[("color", section.text_color.as_str())])
    );
    if section.show_logo {
        let _ = writeln!(
            html,
            "<div class=\"logo logo-{}\">{}</div>",
            html_escape(&section.logo_position),
            html_escape(&section.title)
        );
    }
    let _ = writeln!(html, "<h1>{}</h1>", html_escape(&data.quiz.name));
    let _ = writeln!(html, "<p class=\"subtitle\">{}</p>", html_escape(data.subtitle()));
    html.push_str("</header>\n");
}

fn user_info(html: &mut String, data: &ReportData) {
    let section = &data.template.user_info;
    let _ = writeln!(
        html,
        "<section class=\"section user-info\"{}>",
        box_style(&section.style, &[])
    );
    if section.show_avatar {
        let initial = data.user.display_name().chars().next().unwrap_or('U');
        let _ = writeln!(
            html,
            "<div class=\"avatar\">{}</div>",
            html_escape(&initial.to_uppercase().to_string())
        );
    }
    html.push_str("<dl>\n");
    let mut field = |label: &str, value: &str| {
        let _ = writeln!(
            html,
            "<dt>{}</dt><dd>{}</dd>",
            html_escape(label),
            html_escape(value)
        );
    };
    field("Participant", data.user.display_name());
    if section.show_email {
        field("Email", data.user.email.as_deref().unwrap_or("No email provided"));
    }
    if section.show_profile {
        if let Some(profile) = data.user.profile.as_deref() {
            field("Profile", profile);
        }
    }
    if section.show_date {
        field("Completed", &data.report_date().format("%B %-d, %Y").to_string());
    }
    html.push_str("</dl>\n</section>\n");
}

fn overall_score(html: &mut String, data: &ReportData) {
    let section = &data.template.overall_score;
    let level = &data.overall;
    let color = level_color(&level.range).to_hex();
    let _ = writeln!(
        html,
        "<section class=\"section overall\"{}>",
        box_style(&section.style, &[])
    );
    html.push_str("<h2>Overall Performance</h2>\n");
    let _ = writeln!(
        html,
        "<div class=\"score-circle\"{}><span class=\"score\">{}</span>",
        style_attr(&[("border-color", color.as_str()), ("color", color.as_str())]),
        data.total_marks()
    );
    if section.show_level {
        let _ = write!(html, "<span class=\"level\">{}</span>", html_escape(&level.range.label));
    }
    html.push_str("</div>\n<div class=\"stats\">\n");
    let _ = writeln!(
        html,
        "<div class=\"stat\"><strong>{}</strong><span>Questions</span></div>",
        data.attempt.total_questions
    );
    let _ = writeln!(
        html,
        "<div class=\"stat\"><strong>{}</strong><span>Total Marks</span></div>",
        data.total_marks()
    );
    if section.show_grade {
        let _ = writeln!(
            html,
            "<div class=\"stat\"><strong>{} of {}</strong><span>Level</span></div>",
            level.rank, level.scale_len
        );
    }
    if section.show_percentage {
        let percent = (data.total_marks().max(0) as f64 / GAUGE_FULL_MARKS * 100.0).min(100.0);
        let _ = writeln!(
            html,
            "<div class=\"stat\"><strong>{percent:.0}%</strong><span>Of Gauge</span></div>"
        );
    }
    html.push_str("</div>\n");
    if !level.range.text.is_empty() {
        let _ = writeln!(html, "<p class=\"level-text\">{}</p>", html_escape(&level.range.text));
    }
    html.push_str("</section>\n");
}

fn charts(html: &mut String, data: &ReportData) {
    let section = &data.template.charts;
    let columns = format!("repeat({}, minmax(0, 1fr))", section.grid_columns.max(1));
    let layout = if section.layout == "grid" {
        columns.as_str()
    } else {
        "minmax(0, 1fr)"
    };
    let _ = writeln!(
        html,
        "<section class=\"section charts\"{}>",
        box_style(&section.style, &[])
    );
    html.push_str("<h2>Performance Analytics</h2>\n");
    let _ = writeln!(
        html,
        "<div class=\"chart-grid\"{}>",
        style_attr(&[("grid-template-columns", layout)])
    );
    let chart = |html: &mut String, title: &str, svg: String| {
        let _ = writeln!(
            html,
            "<figure class=\"chart\"{}><figcaption>{}</figcaption>\n{}</figure>",
            style_attr(&[
                ("min-height", section.chart_height.as_str()),
                ("width", section.chart_width.as_str()),
            ]),
            html_escape(title),
            svg
        );
    };
    if section.show_bar_chart {
        chart(html, "Section Performance Comparison", bar_chart_svg(data));
    }
    if section.show_pie_chart {
        chart(html, "Score Distribution by Section", pie_chart_svg(data));
    }
    if section.show_gauge_chart {
        chart(html, "Performance Gauge", gauge_svg(data));
    }
    if section.show_radar_chart {
        chart(html, "Performance Radar", radar_svg(data));
    }
    html.push_str("</div>\n</section>\n");
}

fn section_analysis(html: &mut String, data: &ReportData, cards: &[PacketCard<'_>]) {
    let section = &data.template.section_analysis;
    let _ = writeln!(
        html,
        "<section class=\"section analysis\"{}>",
        box_style(&section.style, &[])
    );
    html.push_str("<h2>Section Analysis</h2>\n");
    if section.show_packet_scores {
        for card in cards {
            packet_card(html, data, card);
        }
    }
    html.push_str("</section>\n");
}

fn image_html(image: &RangeImage, style: ImageDisplayStyle) -> String {
    match image {
        RangeImage::Raster(uri) => {
            let size = match style {
                ImageDisplayStyle::Icon => "32px",
                ImageDisplayStyle::Medium => "64px",
                ImageDisplayStyle::Large => "100px",
                ImageDisplayStyle::Banner => "100%",
            };
            let fit = if style == ImageDisplayStyle::Banner {
                "cover"
            } else {
                "contain"
            };
            format!(
                "<img class=\"level-image\" src=\"{}\" alt=\"\"{}>",
                html_escape(uri),
                style_attr(&[("width", size), ("max-height", "100px"), ("object-fit", fit)])
            )
        }
        RangeImage::Glyph(glyph) if glyph.is_empty() => String::new(),
        RangeImage::Glyph(glyph) => {
            let size = match style {
                ImageDisplayStyle::Icon => "20px",
                ImageDisplayStyle::Medium => "28px",
                ImageDisplayStyle::Large | ImageDisplayStyle::Banner => "36px",
            };
            format!(
                "<span class=\"level-glyph\"{}>{}</span>",
                style_attr(&[("font-size", size)]),
                html_escape(glyph)
            )
        }
    }
}

/// Rank of the current level within its scale, drawn per the progress style.
fn progress_html(style: ScaleProgressStyle, rank: usize, len: usize, color: &str) -> String {
    let len = len.max(1);
    match style {
        ScaleProgressStyle::None => String::new(),
        ScaleProgressStyle::Linear => {
            let width = format!("{:.0}%", rank as f64 / len as f64 * 100.0);
            format!(
                "<div class=\"progress-linear\"><div{}></div></div>",
                style_attr(&[("width", width.as_str()), ("background", color)])
            )
        }
        ScaleProgressStyle::Circular => {
            let fraction = rank as f64 / len as f64;
            format!(
                "<svg class=\"progress-circular\" width=\"40\" height=\"40\" viewBox=\"0 0 40 40\">{}{}</svg>",
                "<circle cx=\"20\" cy=\"20\" r=\"16\" fill=\"none\" stroke=\"#e5e7eb\" stroke-width=\"4\"/>",
                arc_path(20.0, 20.0, 16.0, fraction * 2.0 * PI, color, 4.0)
            )
        }
        ScaleProgressStyle::Dots | ScaleProgressStyle::Steps => {
            let class = if style == ScaleProgressStyle::Dots {
                "progress-dots"
            } else {
                "progress-steps"
            };
            let mut out = format!("<div class=\"{class}\">");
            for i in 1..=len {
                let fill = if i <= rank { color } else { "#e5e7eb" };
                let _ = write!(out, "<span{}></span>", style_attr(&[("background", fill)]));
            }
            out.push_str("</div>");
            out
        }
    }
}

fn text_block(html: &mut String, text: &str, color: &str, separate: bool) {
    let background = if separate { "#f8fafc" } else { "transparent" };
    let _ = writeln!(
        html,
        "<div class=\"level-description\"{}>{}</div>",
        style_attr(&[("border-color", color), ("color", color), ("background", background)]),
        html_escape(text)
    );
}

fn packet_card(html: &mut String, data: &ReportData, card: &PacketCard<'_>) {
    let config = card.config;
    let score = card.score;
    let level = &score.level.range;
    let level_hex = level_color(level).to_hex();
    let accent = if config.score_color.is_empty() {
        level_hex.as_str()
    } else {
        config.score_color.as_str()
    };
    let text = level.text.trim();

    let _ = writeln!(
        html,
        "<article class=\"packet-card\" data-packet=\"{}\"{}>",
        html_escape(&score.packet_id),
        box_style(&config.style, &[])
    );

    if config.show_header {
        let title = if config.title.is_empty() { &score.name } else { &config.title };
        let _ = write!(
            html,
            "<div class=\"packet-header\"{}>",
            style_attr(&[
                ("background", config.header_background_color.as_str()),
                ("color", config.header_text_color.as_str()),
            ])
        );
        if !config.custom_icon.is_empty() {
            let _ = write!(html, "<span class=\"packet-icon\">{}</span>", html_escape(&config.custom_icon));
        }
        let _ = write!(html, "<h3>{}</h3>", html_escape(title));
        if !config.custom_label.is_empty() {
            let _ = write!(html, "<span class=\"packet-label\">{}</span>", html_escape(&config.custom_label));
        }
        if !config.description.is_empty() {
            let _ = write!(html, "<p>{}</p>", html_escape(&config.description));
        }
        html.push_str("</div>\n");
    }

    if config.show_scaling_text && config.text_display_position == TextDisplayPosition::Above && !text.is_empty() {
        text_block(html, text, accent, false);
    }

    html.push_str("<div class=\"packet-body\">\n");
    if config.show_score_breakdown {
        html.push_str("<dl class=\"packet-details\">");
        let _ = write!(
            html,
            "<dt>Marks</dt><dd{}>{}",
            style_attr(&[("color", config.score_color.as_str())]),
            score.marks
        );
        if config.show_scaling_range {
            let _ = write!(html, " <small>({} to {})</small>", level.min, level.max);
        }
        html.push_str("</dd>");
        let _ = write!(html, "<dt>Questions</dt><dd>{}</dd>", score.questions);
        if config.show_scaling_level {
            let class = match config.level_indicator_style {
                LevelIndicatorStyle::Badge => "badge",
                LevelIndicatorStyle::Highlight => "highlight",
                LevelIndicatorStyle::Border => "border",
                LevelIndicatorStyle::Background => "background",
            };
            let color = if config.show_scaling_colors { accent } else { "" };
            let _ = write!(
                html,
                "<dt>Level</dt><dd class=\"level level-{class}\"{}>{}",
                style_attr(&[("--level-color", level_hex.as_str()), ("color", color)]),
                if config.show_scaling_label {
                    html_escape(&level.label)
                } else {
                    String::new()
                }
            );
            if config.show_scaling_text
                && config.text_display_position == TextDisplayPosition::Inline
                && !text.is_empty()
            {
                let _ = write!(html, " <span class=\"level-inline\">{}</span>", html_escape(text));
            }
            html.push_str("</dd>");
        }
        html.push_str("</dl>\n");
    }

    if config.show_performance_level {
        html.push_str("<div class=\"packet-performance\">");
        if config.show_scaling_image {
            html.push_str(&image_html(&level.image, config.image_display_style));
        }
        let _ = write!(html, "<span>{}</span>", html_escape(&level.label));
        html.push_str(&progress_html(
            config.scale_progress_style,
            score.level.rank,
            score.level.scale_len,
            &level_hex,
        ));
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n");

    if config.show_recommendations && !text.is_empty() {
        let _ = write!(
            html,
            "<div class=\"packet-advice\"{}><p>{}</p>",
            style_attr(&[("border-color", accent)]),
            html_escape(text)
        );
        if config.show_improvement_suggestions {
            html.push_str("<p class=\"hint\">Keep practicing to reach the next level!</p>");
        }
        html.push_str("</div>\n");
    }

    if config.show_scaling_text
        && matches!(
            config.text_display_position,
            TextDisplayPosition::Below | TextDisplayPosition::Separate
        )
        && !text.is_empty()
    {
        let separate = config.text_display_position == TextDisplayPosition::Separate;
        text_block(html, text, accent, separate);
    }

    if config.show_all_scale_levels {
        all_levels(html, card.scale.ranges(), level, config.highlight_current_level, accent);
    }

    if config.show_scale_comparison {
        let next = card
            .scale
            .ranges()
            .iter()
            .find(|r| r.min > level.max)
            .map(|r| r.label.as_str())
            .unwrap_or("Maximum level reached");
        let _ = writeln!(
            html,
            "<p class=\"comparison\">Current: {} | Next: {}</p>",
            html_escape(&level.label),
            html_escape(next)
        );
    }

    if config.show_question_list {
        if let Some(packet) = data.packets.iter().find(|p| p.id == score.packet_id) {
            if !packet.questions.is_empty() {
                html.push_str("<details class=\"questions\"><summary>Questions</summary><ol>");
                for question in &packet.questions {
                    let _ = write!(html, "<li>{}</li>", html_escape(&question.text));
                }
                html.push_str("</ol></details>\n");
            }
        }
    }

    html.push_str("</article>\n");
}

fn all_levels(html: &mut String, ranges: &[ScoreRange], current: &ScoreRange, highlight: bool, accent: &str) {
    html.push_str("<div class=\"all-levels\"><strong>All Performance Levels</strong><ul>");
    for range in ranges {
        let is_current = highlight && range.label == current.label;
        let _ = write!(
            html,
            "<li{}{}>{} ({} to {} points)</li>",
            if is_current { " class=\"current\"" } else { "" },
            if is_current {
                style_attr(&[("color", accent)])
            } else {
                String::new()
            },
            html_escape(&range.label),
            range.min,
            range.max
        );
    }
    html.push_str("</ul></div>\n");
}

fn insights(html: &mut String, data: &ReportData) {
    let section = &data.template.performance_insights;
    let _ = writeln!(
        html,
        "<section class=\"section insights\"{}>",
        box_style(&section.style, &[])
    );
    html.push_str("<h2>Performance Insights</h2>\n");
    let _ = writeln!(html, "<p>{}</p>", html_escape(&data.insights));
    if section.show_strengths || section.show_weaknesses {
        let best = data.packet_scores.iter().max_by_key(|s| s.marks);
        let weakest = quizreport_core::insights::lowest_scoring(&data.packet_scores);
        html.push_str("<ul class=\"highlights\">");
        if let (true, Some(best)) = (section.show_strengths, best) {
            let _ = write!(html, "<li class=\"strength\">Strongest: {} ({})</li>", html_escape(&best.name), best.marks);
        }
        if let (true, Some(weakest)) = (section.show_weaknesses, weakest) {
            let _ = write!(html, "<li class=\"weakness\">Needs focus: {} ({})</li>", html_escape(&weakest.name), weakest.marks);
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");
}

fn recommendations(html: &mut String, data: &ReportData) {
    let section = &data.template.recommendations;
    let _ = writeln!(
        html,
        "<section class=\"section recommendations\"{}>",
        box_style(&section.style, &[])
    );
    html.push_str("<h2>Recommendations</h2>\n<ol>\n");
    for rec in &data.recommendations {
        let tone = tone_color(rec.tone).to_hex();
        let _ = writeln!(
            html,
            "<li{}>{}</li>",
            style_attr(&[("--tone", tone.as_str())]),
            html_escape(&rec.text)
        );
    }
    html.push_str("</ol>\n</section>\n");
}

fn footer(html: &mut String, data: &ReportData) {
    let section = &data.template.footer;
    let _ = writeln!(
        html,
        "<footer class=\"section footer\"{}>",
        box_style(&section.style, &[])
    );
    let _ = writeln!(html, "<p>{}</p>", html_escape(data.footer_line()));
    if section.show_timestamp {
        let _ = writeln!(
            html,
            "<p class=\"meta\">Report Date: {}</p>",
            data.generated_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    html.push_str("</footer>\n");
}

fn arc_path(cx: f64, cy: f64, r: f64, sweep: f64, color: &str, width: f64) -> String {
    if sweep <= 0.0 {
        return String::new();
    }
    if sweep >= 2.0 * PI - 1e-9 {
        return format!(
            "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{r:.1}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\"/>",
            html_escape(color)
        );
    }
    let (ex, ey) = (cx + r * sweep.sin(), cy - r * sweep.cos());
    let large = if sweep > PI { 1 } else { 0 };
    format!(
        "<path d=\"M {cx:.1} {:.1} A {r:.1} {r:.1} 0 {large} 1 {ex:.1} {ey:.1}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\"/>",
        cy - r,
        html_escape(color)
    )
}

fn bar_chart_svg(data: &ReportData) -> String {
    let bar_height = 24;
    let padding = 8;
    let label_width = 140;
    let max_width = 260.0;
    let max_marks = data.max_packet_marks() as f64;
    let total_height = data.packet_scores.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width as usize + 40,
        total_height
    );
    for (i, score) in data.packet_scores.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (score.marks.max(0) as f64 / max_marks * max_width) as usize;
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{}\" font-size=\"13\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            label_width - 8,
            y + bar_height / 2,
            html_escape(&crate::canvas::truncate(&score.name, 16))
        );
        let _ = writeln!(
            svg,
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>",
            label_width,
            y,
            width,
            bar_height,
            level_color(&score.level.range).to_hex()
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>",
            label_width + width + 6,
            y + bar_height / 2,
            score.marks
        );
    }
    svg.push_str("</svg>\n");
    svg
}

fn pie_chart_svg(data: &ReportData) -> String {
    let (cx, cy, r) = (80.0, 80.0, 70.0);
    let total: i64 = data.packet_scores.iter().map(|s| s.marks.max(0)).sum();
    let mut svg = String::from("<svg width=\"160\" height=\"160\" viewBox=\"0 0 160 160\" xmlns=\"http://www.w3.org/2000/svg\">\n");
    if total == 0 {
        let _ = writeln!(svg, "  <circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\" fill=\"#e5e7eb\"/>");
        svg.push_str("</svg>\n");
        return svg;
    }
    let mut start = 0.0_f64;
    for score in data.packet_scores.iter().filter(|s| s.marks > 0) {
        let sweep = score.marks as f64 / total as f64 * 2.0 * PI;
        let color = level_color(&score.level.range).to_hex();
        if sweep >= 2.0 * PI - 1e-9 {
            let _ = writeln!(svg, "  <circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\" fill=\"{color}\"/>");
        } else {
            let end = start + sweep;
            let large = if sweep > PI { 1 } else { 0 };
            let _ = writeln!(
                svg,
                "  <path d=\"M {cx} {cy} L {:.1} {:.1} A {r} {r} 0 {large} 1 {:.1} {:.1} Z\" fill=\"{color}\" stroke=\"#ffffff\"><title>{}: {}</title></path>",
                cx + r * start.sin(),
                cy - r * start.cos(),
                cx + r * end.sin(),
                cy - r * end.cos(),
                html_escape(&score.name),
                score.marks
            );
        }
        start += sweep;
    }
    svg.push_str("</svg>\n");
    svg
}

fn gauge_svg(data: &ReportData) -> String {
    let fraction = (data.total_marks().max(0) as f64 / GAUGE_FULL_MARKS).min(1.0);
    let color = level_color(&data.overall.range).to_hex();
    format!(
        "<svg width=\"160\" height=\"160\" viewBox=\"0 0 160 160\" xmlns=\"http://www.w3.org/2000/svg\">\n  \
         <circle cx=\"80\" cy=\"80\" r=\"60\" fill=\"none\" stroke=\"#d1d5db\" stroke-width=\"14\"/>\n  {}\n  \
         <text x=\"80\" y=\"84\" font-size=\"28\" font-weight=\"bold\" text-anchor=\"middle\" fill=\"currentColor\">{}</text>\n  \
         <text x=\"80\" y=\"106\" font-size=\"12\" text-anchor=\"middle\" fill=\"currentColor\">{}</text>\n</svg>\n",
        arc_path(80.0, 80.0, 60.0, fraction * 2.0 * PI, &color, 14.0),
        data.total_marks(),
        html_escape(&data.overall.range.label)
    )
}

/// Radar over each packet's level rank, so packets on different scales share
/// one axis.
fn radar_svg(data: &ReportData) -> String {
    let (cx, cy, r) = (100.0, 100.0, 70.0);
    let scores = &data.packet_scores;
    let mut svg = String::from("<svg width=\"200\" height=\"200\" viewBox=\"0 0 200 200\" xmlns=\"http://www.w3.org/2000/svg\">\n");
    if scores.len() < 3 {
        svg.push_str("  <text x=\"100\" y=\"100\" font-size=\"12\" text-anchor=\"middle\" fill=\"currentColor\">Needs three or more sections</text>\n</svg>\n");
        return svg;
    }
    let n = scores.len() as f64;
    let point = |i: usize, fraction: f64| {
        let angle = i as f64 / n * 2.0 * PI;
        (cx + r * fraction * angle.sin(), cy - r * fraction * angle.cos())
    };
    for ring in [0.25, 0.5, 0.75, 1.0] {
        let points: Vec<String> = (0..scores.len())
            .map(|i| {
                let (x, y) = point(i, ring);
                format!("{x:.1},{y:.1}")
            })
            .collect();
        let _ = writeln!(
            svg,
            "  <polygon points=\"{}\" fill=\"none\" stroke=\"#e5e7eb\"/>",
            points.join(" ")
        );
    }
    let values: Vec<String> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let fraction = s.level.rank as f64 / s.level.scale_len.max(1) as f64;
            let (x, y) = point(i, fraction);
            format!("{x:.1},{y:.1}")
        })
        .collect();
    let _ = writeln!(
        svg,
        "  <polygon points=\"{}\" fill=\"#2563eb\" fill-opacity=\"0.25\" stroke=\"#2563eb\"/>",
        values.join(" ")
    );
    for (i, score) in scores.iter().enumerate() {
        let (x, y) = point(i, 1.18);
        let _ = writeln!(
            svg,
            "  <text x=\"{x:.1}\" y=\"{y:.1}\" font-size=\"10\" text-anchor=\"middle\" fill=\"currentColor\">{}</text>",
            html_escape(&crate::canvas::truncate(&score.name, 12))
        );
    }
    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
body { margin: 0; padding: 2rem; color: var(--dark); font-size: var(--body-size); }
.report { max-width: 960px; margin: 0 auto; position: relative; }
.section h2 { font-size: var(--subheading-size); margin-top: 0; }
.header h1 { font-size: var(--heading-size); margin: 0.25rem 0; }
.subtitle { opacity: 0.85; margin: 0; }
.user-info { display: flex; gap: 1rem; align-items: center; }
.user-info dl, .packet-details { display: grid; grid-template-columns: max-content 1fr; gap: 0.25rem 1rem; margin: 0; }
.user-info dt, .packet-details dt { color: #6b7280; }
.avatar { width: 48px; height: 48px; border-radius: 50%; background: var(--primary); color: #fff; display: flex; align-items: center; justify-content: center; font-weight: bold; }
.score-circle { width: 120px; height: 120px; border-radius: 50%; border: 6px solid; display: flex; flex-direction: column; align-items: center; justify-content: center; margin: 1rem auto; }
.score { font-size: 2rem; font-weight: bold; }
.stats { display: flex; justify-content: space-around; }
.stat { display: flex; flex-direction: column; align-items: center; }
.stat span, .meta { color: #6b7280; font-size: var(--caption-size); }
.chart-grid { display: grid; gap: 1rem; }
.chart { margin: 0; }
.chart figcaption { font-weight: bold; margin-bottom: 0.5rem; }
.packet-header { padding: 8px; margin-bottom: 8px; border-radius: 4px; }
.packet-header h3 { display: inline; margin: 0; }
.packet-label { margin-left: 0.5rem; font-size: var(--caption-size); }
.packet-body { display: flex; justify-content: space-between; gap: 1rem; }
.packet-performance { display: flex; flex-direction: column; align-items: center; gap: 0.25rem; }
.level-badge { padding: 2px 6px; border-radius: 4px; background: color-mix(in srgb, var(--level-color) 15%, transparent); }
.level-highlight { background: color-mix(in srgb, var(--level-color) 12%, transparent); }
.level-border { border: 2px solid var(--level-color); padding: 2px 6px; border-radius: 4px; }
.level-background { background: var(--level-color); color: #fff !important; padding: 2px 6px; }
.level-description, .packet-advice { border-left: 3px solid; padding: 8px 12px; margin-top: 8px; border-radius: 4px; }
.hint { font-style: italic; color: #6b7280; }
.all-levels { background: #f8fafc; padding: 8px; margin-top: 8px; border-radius: 4px; }
.all-levels ul { margin: 0.25rem 0 0; padding-left: 1.25rem; color: #6b7280; }
.all-levels .current { font-weight: bold; }
.comparison { background: #fdf2f8; padding: 8px; border-radius: 4px; font-size: var(--caption-size); }
.progress-linear { width: 100px; height: 6px; background: #e5e7eb; border-radius: 3px; overflow: hidden; }
.progress-linear div { height: 100%; }
.progress-dots, .progress-steps { display: flex; gap: 4px; }
.progress-dots span { width: 8px; height: 8px; border-radius: 50%; }
.progress-steps span { width: 16px; height: 6px; border-radius: 2px; }
.recommendations li { border-left: 4px solid var(--tone); padding: 0.5rem 0.75rem; margin: 0.5rem 0; }
.watermark { position: fixed; top: 45%; left: 0; right: 0; text-align: center; font-size: 6rem; transform: rotate(-30deg); pointer-events: none; color: #9ca3af; }
details summary { cursor: pointer; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::report_with_packets;
    use quizreport_core::template::{Direction, SectionId};

    fn position(html: &str, needle: &str) -> usize {
        html.find(needle).unwrap_or_else(|| panic!("{needle} missing"))
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&report_with_packets(2));
        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Wellbeing Check"));
        assert!(html.contains("Ada"));
        assert!(html.contains("Sleep 2"));
        assert!(html.contains("Generated by Assessment System"));
    }

    #[test]
    fn sections_follow_template_order() {
        let mut data = report_with_packets(2);
        let before = generate_html(&data);
        assert!(position(&before, "<h2>Performance Insights") < position(&before, "<h2>Recommendations"));

        data.template.move_section(SectionId::Recommendations, Direction::Up);
        let after = generate_html(&data);
        assert!(position(&after, "<h2>Recommendations") < position(&after, "<h2>Performance Insights"));
    }

    #[test]
    fn disabled_sections_and_packets_are_hidden() {
        let mut data = report_with_packets(3);
        data.template.toggle_section(SectionId::Charts);
        data.template.toggle_packet("p2").unwrap();
        let html = generate_html(&data);
        assert!(!html.contains("Performance Analytics"));
        assert!(!html.contains("data-packet=\"p2\""));
        assert!(html.contains("data-packet=\"p1\""));
        assert!(html.contains("data-packet=\"p3\""));
    }

    #[test]
    fn packet_card_follows_config() {
        let mut data = report_with_packets(1);
        {
            let config = data.template.packet_configs.get_mut("p1").unwrap();
            config.show_all_scale_levels = true;
            config.show_scale_comparison = true;
            config.scale_progress_style = ScaleProgressStyle::Dots;
            config.custom_label = "Core".into();
        }
        let html = generate_html(&data);
        assert!(html.contains("All Performance Levels"));
        assert!(html.contains("Needs Improvement (0 to 2 points)"));
        assert!(html.contains("Current: Average | Next: Good"));
        assert!(html.contains("progress-dots"));
        assert!(html.contains("Core"));
    }

    #[test]
    fn raster_and_glyph_images() {
        let glyph = image_html(&RangeImage::glyph("🎯"), ImageDisplayStyle::Large);
        assert!(glyph.contains("font-size: 36px"));
        let raster = image_html(
            &RangeImage::Raster("data:image/png;base64,AAAA".into()),
            ImageDisplayStyle::Banner,
        );
        assert!(raster.starts_with("<img"));
        assert!(raster.contains("object-fit: cover"));
        assert!(image_html(&RangeImage::default(), ImageDisplayStyle::Icon).is_empty());
    }

    #[test]
    fn user_text_is_escaped() {
        let mut data = report_with_packets(1);
        data.quiz.name = "<script>alert(1)</script>".into();
        let html = generate_html(&data);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn html_report_write_to_file() {
        let data = report_with_packets(1);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.html");
        write_html_report(&data, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
