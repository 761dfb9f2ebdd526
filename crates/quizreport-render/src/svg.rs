//! SVG serialization of a laid-out [`Document`].
//!
//! Pages keep millimetre user units through the `viewBox`, so the printed size
//! matches the layout.

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::canvas::{Anchor, DrawOp, Page, Paint, Weight, PT_TO_MM};
use crate::document::Document;
use crate::html::html_escape;

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";

fn paint_attrs(paint: &Paint) -> String {
    let mut attrs = match paint.fill {
        Some(fill) => format!("fill=\"{}\"", fill.to_hex()),
        None => "fill=\"none\"".to_string(),
    };
    if let Some(stroke) = paint.stroke {
        let _ = write!(
            attrs,
            " stroke=\"{}\" stroke-width=\"{:.2}\"",
            stroke.to_hex(),
            paint.stroke_width
        );
    }
    if paint.opacity < 1.0 {
        let _ = write!(attrs, " opacity=\"{:.2}\"", paint.opacity);
    }
    attrs
}

fn op_svg(op: &DrawOp) -> String {
    match op {
        DrawOp::Rect {
            x,
            y,
            w,
            h,
            radius,
            paint,
        } => {
            let corner = if *radius > 0.0 {
                format!(" rx=\"{radius:.2}\"")
            } else {
                String::new()
            };
            format!(
                "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\"{corner} {}/>",
                paint_attrs(paint)
            )
        }
        DrawOp::Circle { cx, cy, r, paint } => format!(
            "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" {}/>",
            paint_attrs(paint)
        ),
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        } => format!(
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{}\" stroke-width=\"{width:.2}\"/>",
            color.to_hex()
        ),
        DrawOp::Arc {
            cx,
            cy,
            r,
            sweep,
            color,
            width,
        } => {
            // A full sweep has no distinct end point; draw the ring instead.
            if *sweep >= 2.0 * PI - 1e-9 {
                return format!(
                    "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width:.2}\"/>",
                    color.to_hex()
                );
            }
            let (sx, sy) = (cx, cy - r);
            let ex = cx + r * sweep.sin();
            let ey = cy - r * sweep.cos();
            let large = if *sweep > PI { 1 } else { 0 };
            format!(
                "<path d=\"M {sx:.2} {sy:.2} A {r:.2} {r:.2} 0 {large} 1 {ex:.2} {ey:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width:.2}\"/>",
                color.to_hex()
            )
        }
        DrawOp::Text {
            x,
            y,
            text,
            font,
            anchor,
        } => {
            let anchor = match anchor {
                Anchor::Start => "start",
                Anchor::Middle => "middle",
                Anchor::End => "end",
            };
            let weight = match font.weight {
                Weight::Normal => "normal",
                Weight::Bold => "bold",
            };
            format!(
                "<text x=\"{x:.2}\" y=\"{y:.2}\" font-size=\"{:.2}\" font-weight=\"{weight}\" fill=\"{}\" text-anchor=\"{anchor}\">{}</text>",
                font.size * PT_TO_MM,
                font.color.to_hex(),
                html_escape(text)
            )
        }
        DrawOp::Image { x, y, w, h, href } => format!(
            "<image x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" href=\"{}\" preserveAspectRatio=\"xMidYMid meet\"/>",
            html_escape(href)
        ),
    }
}

/// One page as a standalone SVG document.
pub fn page_svg(page: &Page, width: f64, height: f64) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}mm\" height=\"{height}mm\" viewBox=\"0 0 {width} {height}\" font-family=\"{FONT_FAMILY}\">\n"
    );
    let _ = writeln!(
        svg,
        "  <rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"#ffffff\"/>"
    );
    for op in &page.ops {
        svg.push_str("  ");
        svg.push_str(&op_svg(op));
        svg.push('\n');
    }
    svg.push_str("</svg>\n");
    svg
}

/// Every page of `doc` as SVG, in page order.
pub fn document_svgs(doc: &Document) -> Vec<String> {
    doc.pages
        .iter()
        .map(|page| page_svg(page, doc.width, doc.height))
        .collect()
}

/// A single HTML file holding every page, one printed sheet per page.
pub fn printable_html(doc: &Document) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", html_escape(&doc.title));
    html.push_str("<style>\n");
    let _ = writeln!(
        html,
        "@page {{ size: {}mm {}mm; margin: 0; }}",
        doc.width, doc.height
    );
    html.push_str(PRINT_CSS);
    html.push_str("</style>\n</head>\n<body>\n");
    for (i, svg) in document_svgs(doc).into_iter().enumerate() {
        let _ = writeln!(html, "<section class=\"page\" id=\"page-{}\">", i + 1);
        html.push_str(&svg);
        html.push_str("</section>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Write the printable HTML document to `path`.
pub fn write_printable_html(doc: &Document, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, printable_html(doc))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Write one `{file_name}-page-{n}.svg` per page into `dir`.
pub fn write_svg_pages(doc: &Document, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let mut written = Vec::with_capacity(doc.page_count());
    for (i, svg) in document_svgs(doc).into_iter().enumerate() {
        let path = dir.join(format!("{}-page-{}.svg", doc.file_name, i + 1));
        std::fs::write(&path, svg)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

const PRINT_CSS: &str = r#"
body { margin: 0; background: #e5e7eb; }
.page { width: fit-content; margin: 1rem auto; box-shadow: 0 2px 8px rgba(0,0,0,0.15); page-break-after: always; break-after: page; }
.page svg { display: block; }
@media print {
  body { background: none; }
  .page { margin: 0; box-shadow: none; }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, Font};
    use crate::document::layout;
    use crate::test_support::report_with_packets;

    #[test]
    fn text_is_escaped() {
        let op = DrawOp::Text {
            x: 1.0,
            y: 2.0,
            text: "Q&A <basics>".into(),
            font: Font::bold(10.0, Color::BLACK),
            anchor: Anchor::Middle,
        };
        let svg = op_svg(&op);
        assert!(svg.contains("Q&amp;A &lt;basics&gt;"));
        assert!(svg.contains("text-anchor=\"middle\""));
        assert!(svg.contains("font-weight=\"bold\""));
    }

    #[test]
    fn half_arc_ends_at_six_oclock() {
        let op = DrawOp::Arc {
            cx: 50.0,
            cy: 50.0,
            r: 30.0,
            sweep: PI,
            color: Color::BLACK,
            width: 8.0,
        };
        assert!(op_svg(&op).contains("M 50.00 20.00 A 30.00 30.00 0 0 1 50.00 80.00"));
    }

    #[test]
    fn printable_html_has_every_page() {
        let doc = layout(&report_with_packets(3));
        let html = printable_html(&doc);
        assert_eq!(html.matches("<section class=\"page\"").count(), doc.page_count());
        assert_eq!(html.matches("<svg ").count(), doc.page_count());
        assert!(html.contains("@page { size: 210mm 297mm"));
    }

    #[test]
    fn writes_one_svg_per_page() {
        let doc = layout(&report_with_packets(1));
        let dir = tempfile::tempdir().unwrap();
        let paths = write_svg_pages(&doc, &dir.path().join("svg")).unwrap();
        assert_eq!(paths.len(), doc.page_count());
        let first = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(first.starts_with("<svg"));
        assert!(paths[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("-page-1.svg"));
    }
}
