use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::glyph::GlyphItem;

static EXCESS_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

/// Thresholds used to rebuild reading order and whitespace from glyph
/// positions. All values are in page units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Baselines closer than this belong to the same visual line.
    pub same_line_tolerance: f64,
    /// Vertical gap, as a multiple of the item height, that starts a new paragraph.
    pub paragraph_gap_factor: f64,
    /// Vertical gap that starts a new line within a paragraph.
    pub line_gap: f64,
    /// Horizontal gap between boxes that separates two words.
    pub word_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            same_line_tolerance: 5.0,
            paragraph_gap_factor: 1.5,
            line_gap: 2.0,
            word_gap: 1.0,
        }
    }
}

/// Keep only items whose baseline lies inside the page body band.
pub fn filter_body_region(items: Vec<GlyphItem>, page_height: f64) -> Vec<GlyphItem> {
    items
        .into_iter()
        .filter(|item| item.in_body_region(page_height))
        .collect()
}

/// Order items top to bottom, then left to right within a visual line.
///
/// Items are sorted by descending baseline and grouped into lines: an item
/// joins the current line while its baseline is within `same_line_tolerance`
/// of the line's topmost baseline. Each line is then ordered by ascending `x`.
pub fn sort_reading_order(mut items: Vec<GlyphItem>, config: &LayoutConfig) -> Vec<GlyphItem> {
    items.sort_by(|a, b| b.y.total_cmp(&a.y).then_with(|| a.x.total_cmp(&b.x)));

    let mut ordered = Vec::with_capacity(items.len());
    let mut line: Vec<GlyphItem> = Vec::new();
    let mut line_top = f64::NAN;

    for item in items {
        if !line.is_empty() && (line_top - item.y).abs() > config.same_line_tolerance {
            flush_line(&mut line, &mut ordered);
        }
        if line.is_empty() {
            line_top = item.y;
        }
        line.push(item);
    }
    flush_line(&mut line, &mut ordered);

    ordered
}

fn flush_line(line: &mut Vec<GlyphItem>, out: &mut Vec<GlyphItem>) {
    line.sort_by(|a, b| a.x.total_cmp(&b.x));
    out.append(line);
}

/// Concatenate ordered items, inserting paragraph breaks, line breaks or
/// word spaces based on the gap to the previous item.
pub fn join_items(items: &[GlyphItem], config: &LayoutConfig) -> String {
    let mut text = String::new();
    let mut previous: Option<&GlyphItem> = None;

    for item in items {
        if let Some(prev) = previous {
            let dy = (prev.y - item.y).abs();
            if dy > config.paragraph_gap_factor * item.height {
                text.push_str("\n\n");
            } else if dy > config.line_gap {
                text.push('\n');
            } else if item.x - prev.right() > config.word_gap {
                text.push(' ');
            }
        }
        text.push_str(&item.text);
        previous = Some(item);
    }

    text
}

/// Full per-page pipeline: body filter, reading-order sort, join.
pub fn compose_page(items: Vec<GlyphItem>, page_height: f64, config: &LayoutConfig) -> String {
    let body = filter_body_region(items, page_height);
    let ordered = sort_reading_order(body, config);
    join_items(&ordered, config)
}

/// Collapse any run of three or more newlines into exactly two.
pub fn normalize_newlines(text: &str) -> String {
    EXCESS_NEWLINES.replace_all(text, "\n\n").into_owned()
}
