use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::decoder::{DecodedDocument, DecodedPage, PdfDecoder};
use super::glyph::GlyphItem;
use crate::error::ExtractError;

/// US Letter height, used when a page has no usable MediaBox.
const DEFAULT_PAGE_HEIGHT: f64 = 792.0;
/// Glyph width (thousandths of an em) when the font carries no metrics.
const FALLBACK_GLYPH_WIDTH: f64 = 500.0;
/// TJ kerning (thousandths of an em) at or beyond which a run is split in two.
const TJ_SPLIT_THRESHOLD: f64 = 200.0;
/// Guard against cyclic page trees.
const MAX_PARENT_DEPTH: usize = 32;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `lhs × rhs` for PDF row-vector affine matrices.
fn multiply(lhs: &Matrix, rhs: &Matrix) -> Matrix {
    [
        lhs[0] * rhs[0] + lhs[1] * rhs[2],
        lhs[0] * rhs[1] + lhs[1] * rhs[3],
        lhs[2] * rhs[0] + lhs[3] * rhs[2],
        lhs[2] * rhs[1] + lhs[3] * rhs[3],
        lhs[4] * rhs[0] + lhs[5] * rhs[2] + rhs[4],
        lhs[4] * rhs[1] + lhs[5] * rhs[3] + rhs[5],
    ]
}

fn to_decode_error(context: &str, err: lopdf::Error) -> ExtractError {
    ExtractError::Decode(format!("{}: {}", context, err))
}

/// [`PdfDecoder`] backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfDecoder;

impl PdfDecoder for LopdfDecoder {
    type Document = LopdfDocument;

    fn open_document(&self, bytes: &[u8]) -> Result<LopdfDocument, ExtractError> {
        let document =
            Document::load_mem(bytes).map_err(|e| to_decode_error("Failed to load PDF", e))?;
        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
        debug!("Opened PDF with {} pages", pages.len());
        Ok(LopdfDocument { document, pages })
    }
}

pub struct LopdfDocument {
    document: Document,
    pages: Vec<ObjectId>,
}

impl DecodedDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, number: usize) -> Result<DecodedPage, ExtractError> {
        let page_id = number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .copied()
            .ok_or_else(|| ExtractError::Decode(format!("Page {} does not exist", number)))?;

        let doc = &self.document;
        let height = page_height(doc, page_id);
        let raw = doc
            .get_page_content(page_id)
            .map_err(|e| to_decode_error(&format!("Failed to read page {}", number), e))?;
        let content = Content::decode(&raw)
            .map_err(|e| to_decode_error(&format!("Failed to parse page {}", number), e))?;

        let fonts: BTreeMap<Vec<u8>, PageFont<'_>> = doc
            .get_page_fonts(page_id)
            .unwrap_or_default()
            .into_iter()
            .map(|(key, dict)| (key, PageFont::load(dict, doc)))
            .collect();

        let mut machine = TextMachine::new(&fonts);
        for operation in &content.operations {
            machine.apply(operation);
        }
        trace!("Page {}: {} text runs", number, machine.items.len());

        Ok(DecodedPage {
            height,
            items: machine.items,
        })
    }
}

/// Height of the page's MediaBox, walking up the page tree for inherited boxes.
fn page_height(doc: &Document, page_id: ObjectId) -> f64 {
    let mut current = doc.get_dictionary(page_id).ok();
    let mut depth = 0;

    while let Some(dict) = current {
        if let Some(height) = dict
            .get_deref(b"MediaBox", doc)
            .and_then(Object::as_array)
            .ok()
            .and_then(|rect| media_box_height(rect))
        {
            return height;
        }
        depth += 1;
        if depth > MAX_PARENT_DEPTH {
            break;
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }

    DEFAULT_PAGE_HEIGHT
}

fn media_box_height(rect: &[Object]) -> Option<f64> {
    if rect.len() != 4 {
        return None;
    }
    let lly = number(&rect[1])?;
    let ury = number(&rect[3])?;
    let height = (ury - lly).abs();
    (height > 0.0).then_some(height)
}

fn number(object: &Object) -> Option<f64> {
    object.as_float().ok().map(f64::from)
}

/// Glyph advance widths for one font, in thousandths of an em.
#[derive(Debug, Clone)]
enum GlyphWidths {
    /// Single-byte font with a `Widths` array starting at `FirstChar`.
    Simple { first_char: i64, widths: Vec<f64> },
    /// Two-byte CID font; every glyph uses the default width.
    Composite { default_width: f64 },
    /// No metrics available.
    Unknown,
}

impl GlyphWidths {
    fn load(font: &Dictionary, doc: &Document) -> Self {
        let subtype = font.get(b"Subtype").and_then(Object::as_name).ok();
        if subtype == Some(b"Type0".as_slice()) {
            let default_width = font
                .get_deref(b"DescendantFonts", doc)
                .and_then(Object::as_array)
                .ok()
                .and_then(|fonts| fonts.first())
                .and_then(|first| doc.dereference(first).ok())
                .and_then(|(_, descendant)| descendant.as_dict().ok())
                .and_then(|descendant| descendant.get(b"DW").ok())
                .and_then(number)
                .unwrap_or(1000.0);
            return GlyphWidths::Composite { default_width };
        }

        let first_char = font.get(b"FirstChar").and_then(Object::as_i64).ok();
        let widths = font
            .get_deref(b"Widths", doc)
            .and_then(Object::as_array)
            .ok()
            .map(|values| {
                values
                    .iter()
                    .map(|w| number(w).unwrap_or(FALLBACK_GLYPH_WIDTH))
                    .collect::<Vec<_>>()
            });

        match (first_char, widths) {
            (Some(first_char), Some(widths)) if !widths.is_empty() => {
                GlyphWidths::Simple { first_char, widths }
            }
            _ => GlyphWidths::Unknown,
        }
    }
}

/// Font resources needed to decode and measure shown strings.
struct PageFont<'a> {
    encoding: Option<Encoding<'a>>,
    widths: GlyphWidths,
}

impl<'a> PageFont<'a> {
    fn load(font: &'a Dictionary, doc: &'a Document) -> Self {
        Self {
            encoding: font.get_font_encoding(doc).ok(),
            widths: GlyphWidths::load(font, doc),
        }
    }
}

/// One glyph code of a shown string with its advance width.
struct Glyph {
    width: f64,
    is_space: bool,
}

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horiz_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Pending text of a TJ array, flushed as one item.
struct PendingRun {
    text: String,
    origin: Matrix,
    advance: f64,
}

/// Content-stream interpreter that records every shown string as a
/// [`GlyphItem`] in page space.
struct TextMachine<'f, 'a> {
    fonts: &'f BTreeMap<Vec<u8>, PageFont<'a>>,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    state: TextState,
    items: Vec<GlyphItem>,
}

impl<'f, 'a> TextMachine<'f, 'a> {
    fn new(fonts: &'f BTreeMap<Vec<u8>, PageFont<'a>>) -> Self {
        Self {
            fonts,
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            state: TextState::default(),
            items: Vec::new(),
        }
    }

    fn apply(&mut self, op: &Operation) {
        let operands = &op.operands;
        let num = |i: usize| operands.get(i).and_then(number);

        match op.operator.as_str() {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.ctm_stack.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                if let (Some(key), Some(size)) =
                    (operands.first().and_then(|o| o.as_name().ok()), num(1))
                {
                    self.state.font_key = key.to_vec();
                    self.state.font_size = size;
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.state.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "T*" => self.next_line(0.0, -self.state.leading),
            "TL" => {
                if let Some(v) = num(0) {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = num(0) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = num(0) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = num(0) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = num(0) {
                    self.state.rise = v;
                }
            }
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(|o| o.as_str().ok()) {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line(0.0, -self.state.leading);
                if let Some(bytes) = operands.first().and_then(|o| o.as_str().ok()) {
                    self.show(bytes);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (num(0), num(1)) {
                    self.state.word_spacing = aw;
                    self.state.char_spacing = ac;
                }
                self.next_line(0.0, -self.state.leading);
                if let Some(bytes) = operands.get(2).and_then(|o| o.as_str().ok()) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(elements) = operands.first().and_then(|o| o.as_array().ok()) {
                    self.show_array(elements);
                }
            }
            _ => {}
        }
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn font(&self) -> Option<&PageFont<'a>> {
        self.fonts.get(&self.state.font_key)
    }

    fn decode(&self, bytes: &[u8]) -> String {
        self.font()
            .and_then(|font| font.encoding.as_ref())
            .and_then(|encoding| Document::decode_text(encoding, bytes).ok())
            .unwrap_or_else(|| bytes.iter().map(|&b| char::from(b)).collect())
    }

    fn glyphs(&self, bytes: &[u8], text: &str) -> Vec<Glyph> {
        match self.font().map(|font| &font.widths) {
            Some(GlyphWidths::Simple { first_char, widths }) => bytes
                .iter()
                .map(|&code| {
                    let index = i64::from(code) - first_char;
                    let width = usize::try_from(index)
                        .ok()
                        .and_then(|i| widths.get(i))
                        .copied()
                        .unwrap_or(FALLBACK_GLYPH_WIDTH);
                    Glyph {
                        width,
                        is_space: code == b' ',
                    }
                })
                .collect(),
            Some(GlyphWidths::Composite { default_width }) => bytes
                .chunks(2)
                .map(|_| Glyph {
                    width: *default_width,
                    is_space: false,
                })
                .collect(),
            _ => text
                .chars()
                .map(|c| Glyph {
                    width: FALLBACK_GLYPH_WIDTH,
                    is_space: c == ' ',
                })
                .collect(),
        }
    }

    /// Horizontal displacement of a shown string in unscaled text space.
    fn advance_of(&self, bytes: &[u8], text: &str) -> f64 {
        let s = &self.state;
        self.glyphs(bytes, text)
            .iter()
            .map(|g| {
                let spacing = s.char_spacing + if g.is_space { s.word_spacing } else { 0.0 };
                (g.width / 1000.0 * s.font_size + spacing) * s.horiz_scale
            })
            .sum()
    }

    fn translate_text(&mut self, tx: f64) {
        self.text_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], &self.text_matrix);
    }

    fn show(&mut self, bytes: &[u8]) {
        let text = self.decode(bytes);
        let advance = self.advance_of(bytes, &text);
        let origin = self.text_matrix;
        self.emit(text, origin, advance);
        self.translate_text(advance);
    }

    fn show_array(&mut self, elements: &[Object]) {
        let mut run: Option<PendingRun> = None;

        for element in elements {
            if let Ok(bytes) = element.as_str() {
                let text = self.decode(bytes);
                let advance = self.advance_of(bytes, &text);
                let pending = run.get_or_insert_with(|| PendingRun {
                    text: String::new(),
                    origin: self.text_matrix,
                    advance: 0.0,
                });
                pending.text.push_str(&text);
                pending.advance += advance;
                self.translate_text(advance);
            } else if let Some(adjust) = number(element) {
                let shift = -adjust / 1000.0 * self.state.font_size * self.state.horiz_scale;
                if -adjust >= TJ_SPLIT_THRESHOLD {
                    if let Some(done) = run.take() {
                        self.emit(done.text, done.origin, done.advance);
                    }
                } else if let Some(pending) = run.as_mut() {
                    pending.advance += shift;
                }
                self.translate_text(shift);
            }
        }

        if let Some(done) = run {
            self.emit(done.text, done.origin, done.advance);
        }
    }

    fn emit(&mut self, text: String, origin: Matrix, advance: f64) {
        if text.trim().is_empty() {
            return;
        }
        let rendering = multiply(&origin, &self.ctm);
        let rise = self.state.rise;
        let x = rendering[2] * rise + rendering[4];
        let y = rendering[3] * rise + rendering[5];
        let x_scale = rendering[0].hypot(rendering[1]);
        let y_scale = rendering[2].hypot(rendering[3]);

        self.items.push(GlyphItem {
            text,
            x,
            y,
            width: advance * x_scale,
            height: (self.state.font_size * y_scale).abs(),
        });
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_translation() {
        let scale = [2.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let translate = [1.0, 0.0, 0.0, 1.0, 10.0, 20.0];
        assert_eq!(multiply(&translate, &scale), [2.0, 0.0, 0.0, 2.0, 20.0, 40.0]);
        assert_eq!(multiply(&IDENTITY, &translate), translate);
    }

    #[test]
    fn test_media_box_height() {
        let rect = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(595.0),
            Object::Real(842.0),
        ];
        assert_eq!(media_box_height(&rect), Some(842.0));
        assert_eq!(media_box_height(&rect[..2]), None);
    }

    #[test]
    fn test_machine_without_fonts_uses_fallback_metrics() {
        let fonts = BTreeMap::new();
        let mut machine = TextMachine::new(&fonts);
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 10.into()]),
            Operation::new("Td", vec![100.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Hello")]),
            Operation::new("Tj", vec![Object::string_literal("World")]),
            Operation::new("ET", vec![]),
        ];
        for op in &ops {
            machine.apply(op);
        }

        assert_eq!(machine.items.len(), 2);
        let first = &machine.items[0];
        assert_eq!(first.text, "Hello");
        assert_eq!((first.x, first.y), (100.0, 700.0));
        assert_eq!(first.width, 25.0);
        assert_eq!(first.height, 10.0);
        assert_eq!(machine.items[1].x, 125.0);
    }

    #[test]
    fn test_tj_array_splits_on_word_sized_kerning() {
        let fonts = BTreeMap::new();
        let mut machine = TextMachine::new(&fonts);
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 10.into()]),
            Operation::new("Td", vec![0.into(), 500.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Ke"),
                    Object::Integer(-20),
                    Object::string_literal("rn"),
                    Object::Integer(-400),
                    Object::string_literal("next"),
                ])],
            ),
        ];
        for op in &ops {
            machine.apply(op);
        }

        let texts: Vec<_> = machine.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Kern", "next"]);
        assert!(machine.items[1].x > machine.items[0].right() + 1.0);
    }

    #[test]
    fn test_cm_and_leading_affect_position() {
        let fonts = BTreeMap::new();
        let mut machine = TextMachine::new(&fonts);
        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 0.into()],
            ),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 12.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![0.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal("one")]),
            Operation::new("'", vec![Object::string_literal("two")]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ];
        for op in &ops {
            machine.apply(op);
        }

        assert_eq!((machine.items[0].x, machine.items[0].y), (50.0, 600.0));
        assert_eq!((machine.items[1].x, machine.items[1].y), (50.0, 586.0));
        assert_eq!(machine.ctm, IDENTITY);
    }
}
