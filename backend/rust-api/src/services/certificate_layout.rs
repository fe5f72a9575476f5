//! Text placement on the certificate template.
//!
//! The template is a fixed single-page design with three blank regions: a
//! name bar under the heading, a wider bar for the completion sentence and a
//! small date box at the lower left. Nothing on the page is a form field, so
//! all text is positioned here from measured glyph widths and page-relative
//! anchors tuned to the artwork.

use anyhow::{anyhow, Context, Result};
use printpdf::{
    BuiltinFont, Color, Op, PdfDocument, PdfParseOptions, PdfSaveOptions, Point, Pt, Rgb, TextItem,
};

use crate::utils::text_metrics::{text_width, Face};

/// The three confirmed strings, ready to draw.
#[derive(Debug, Clone)]
pub struct CertificateFields {
    pub name_text: String,
    pub completion_line: String,
    pub completion_date: String,
}

const NAME_FONT_SIZE: f32 = 28.0;
const LINE_FONT_SIZE: f32 = 16.0;
const DATE_FONT_SIZE: f32 = 12.0;

/// Fraction of page height for the name baseline.
const NAME_BASELINE_FRACTION: f32 = 0.46;
/// The wrapped completion block is balanced around this height.
const LINE_ANCHOR_FRACTION: f32 = 0.24;
/// Usable width of the completion bar relative to the page.
const BAR_WIDTH_FRACTION: f32 = 0.78;
/// Baseline-to-baseline advance inside the wrapped block.
const LINE_ADVANCE: f32 = LINE_FONT_SIZE + 3.0;
/// The date box is fixed, not centered.
const DATE_X_FRACTION: f32 = 0.14;
const DATE_Y_FRACTION: f32 = 0.12;

/// One run of text with a resolved baseline position, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub face: Face,
}

/// Greedy word wrap against a maximum rendered width.
///
/// Words are never split; a single word wider than `max_width` becomes its
/// own (overflowing) line rather than being broken mid-word.
pub fn wrap_to_width(text: &str, max_width: f32, face: Face, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if text_width(face, &candidate, size) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(current);
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Left offset that centers a run of `text_width` points on the page.
pub fn centered_x(page_width: f32, text_width: f32) -> f32 {
    (page_width - text_width) / 2.0
}

/// Resolves every text run for a page of the given dimensions (points).
pub fn layout_fields(fields: &CertificateFields, page_width: f32, page_height: f32) -> Vec<PlacedText> {
    let mut placed = Vec::new();

    // Name: measured centering, fixed baseline height.
    let name_width = text_width(Face::HelveticaBold, &fields.name_text, NAME_FONT_SIZE);
    placed.push(PlacedText {
        text: fields.name_text.clone(),
        x: centered_x(page_width, name_width),
        y: page_height * NAME_BASELINE_FRACTION,
        size: NAME_FONT_SIZE,
        face: Face::HelveticaBold,
    });

    // Completion sentence: wrapped to the bar, each line centered on its own,
    // the whole block balanced around the anchor height.
    let bar_width = page_width * BAR_WIDTH_FRACTION;
    let lines = wrap_to_width(&fields.completion_line, bar_width, Face::Helvetica, LINE_FONT_SIZE);
    let anchor_y = page_height * LINE_ANCHOR_FRACTION;
    let mut line_y = anchor_y + LINE_ADVANCE * (lines.len().saturating_sub(1)) as f32 / 2.0;
    for line in lines {
        let line_width = text_width(Face::Helvetica, &line, LINE_FONT_SIZE);
        placed.push(PlacedText {
            text: line,
            x: centered_x(page_width, line_width),
            y: line_y,
            size: LINE_FONT_SIZE,
            face: Face::Helvetica,
        });
        line_y -= LINE_ADVANCE;
    }

    // Date: fixed corner of the date box.
    placed.push(PlacedText {
        text: fields.completion_date.clone(),
        x: page_width * DATE_X_FRACTION,
        y: page_height * DATE_Y_FRACTION,
        size: DATE_FONT_SIZE,
        face: Face::Helvetica,
    });

    placed
}

/// Draws `fields` onto a copy of the template and serializes a new document.
/// The template bytes themselves are never modified.
pub fn overlay_on_template(template: &[u8], fields: &CertificateFields) -> Result<Vec<u8>> {
    let mut warnings = Vec::new();
    let mut document = PdfDocument::parse(template, &PdfParseOptions::default(), &mut warnings)
        .map_err(|err| anyhow!("template is not a readable PDF: {err}"))?;

    {
        let page = document
            .pages
            .first_mut()
            .context("template document has no pages")?;
        let page_width = page.media_box.width.0;
        let page_height = page.media_box.height.0;

        for run in layout_fields(fields, page_width, page_height) {
            push_text_run(&mut page.ops, &run);
        }
    }

    Ok(document.save(&PdfSaveOptions::default(), &mut warnings))
}

fn builtin_font(face: Face) -> BuiltinFont {
    match face {
        Face::Helvetica => BuiltinFont::Helvetica,
        Face::HelveticaBold => BuiltinFont::HelveticaBold,
    }
}

fn push_text_run(ops: &mut Vec<Op>, run: &PlacedText) {
    let font = builtin_font(run.face);
    let black = Color::Rgb(Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        icc_profile: None,
    });
    ops.extend([
        Op::StartTextSection,
        Op::SetTextCursor {
            pos: Point {
                x: Pt(run.x),
                y: Pt(run.y),
            },
        },
        Op::SetFontSizeBuiltinFont {
            size: Pt(run.size),
            font,
        },
        Op::SetFillColor { col: black },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(run.text.clone())],
            font,
        },
        Op::EndTextSection,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    // US Letter landscape, the template's page size.
    const PAGE_WIDTH: f32 = 792.0;
    const PAGE_HEIGHT: f32 = 612.0;

    fn fields(completion_line: &str) -> CertificateFields {
        CertificateFields {
            name_text: "Lauren Burrell".to_string(),
            completion_line: completion_line.to_string(),
            completion_date: "December 9, 2025".to_string(),
        }
    }

    #[test]
    fn wrapped_lines_never_exceed_the_bar() {
        let bar = PAGE_WIDTH * BAR_WIDTH_FRACTION;
        let text = "for completing Fastener Selection for Commercial Rooftop Equipment \
                    including torque specification review and substrate compatibility";
        let lines = wrap_to_width(text, bar, Face::Helvetica, LINE_FONT_SIZE);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(Face::Helvetica, line, LINE_FONT_SIZE) <= bar);
        }
    }

    #[test]
    fn wrapping_preserves_every_word_in_order() {
        let text = "for completing Fastener Selection for Commercial Rooftop Equipment";
        let lines = wrap_to_width(text, 150.0, Face::Helvetica, LINE_FONT_SIZE);
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let lines = wrap_to_width("for completing Safety Basics", 10_000.0, Face::Helvetica, 16.0);
        assert_eq!(lines, vec!["for completing Safety Basics".to_string()]);
    }

    #[test]
    fn oversized_single_word_is_not_split() {
        let lines = wrap_to_width("Antidisestablishmentarianism", 20.0, Face::Helvetica, 16.0);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn centering_is_symmetric() {
        for text in ["Ian Li", "Wilhelmina Oyelaran-Montgomery"] {
            let width = text_width(Face::HelveticaBold, text, NAME_FONT_SIZE);
            assert!(width < PAGE_WIDTH);
            let x = centered_x(PAGE_WIDTH, width);
            let right_margin = PAGE_WIDTH - (x + width);
            assert!((x - right_margin).abs() < 1e-3);
        }
    }

    #[test]
    fn name_sits_at_the_fixed_baseline() {
        let placed = layout_fields(&fields("for completing Safety Basics"), PAGE_WIDTH, PAGE_HEIGHT);
        let name = &placed[0];
        assert_eq!(name.face, Face::HelveticaBold);
        assert!((name.y - PAGE_HEIGHT * NAME_BASELINE_FRACTION).abs() < 1e-3);
    }

    #[test]
    fn date_is_fixed_not_centered() {
        let placed = layout_fields(&fields("for completing Safety Basics"), PAGE_WIDTH, PAGE_HEIGHT);
        let date = placed.last().unwrap();
        assert!((date.x - PAGE_WIDTH * DATE_X_FRACTION).abs() < 1e-3);
        assert!((date.y - PAGE_HEIGHT * DATE_Y_FRACTION).abs() < 1e-3);
    }

    #[test]
    fn single_line_block_sits_on_the_anchor() {
        let placed = layout_fields(&fields("for completing Safety Basics"), PAGE_WIDTH, PAGE_HEIGHT);
        let lines: Vec<_> = placed
            .iter()
            .filter(|run| run.size == LINE_FONT_SIZE)
            .collect();
        assert_eq!(lines.len(), 1);
        assert!((lines[0].y - PAGE_HEIGHT * LINE_ANCHOR_FRACTION).abs() < 1e-3);
    }

    #[test]
    fn multi_line_block_is_balanced_around_the_anchor() {
        let long_line = "for completing Fastener Selection for Commercial Rooftop Equipment \
                         with supplemental wind uplift calculations";
        let placed = layout_fields(&fields(long_line), PAGE_WIDTH, PAGE_HEIGHT);
        let baselines: Vec<f32> = placed
            .iter()
            .filter(|run| run.size == LINE_FONT_SIZE)
            .map(|run| run.y)
            .collect();
        assert!(baselines.len() >= 2);

        let anchor = PAGE_HEIGHT * LINE_ANCHOR_FRACTION;
        let mean = baselines.iter().sum::<f32>() / baselines.len() as f32;
        assert!((mean - anchor).abs() < 1e-2);

        // consecutive baselines descend by the fixed advance
        for pair in baselines.windows(2) {
            assert!((pair[0] - pair[1] - LINE_ADVANCE).abs() < 1e-3);
        }
    }
}
