//! Markdown → PDF typesetter.
//!
//! Parses the resume Markdown into headings, paragraphs and list items, then
//! lays them out on A4 pages with the built-in Helvetica faces. Lines are
//! broken greedily using the static width tables in `metrics`.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};

use super::metrics::{space_width_mm, text_width_mm, Face, PT_PER_MM};
use super::RenderError;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const LINE_SPACING: f32 = 1.4;
const BULLET_INDENT_MM: f32 = 4.5;
const RULE_THICKNESS_PT: f32 = 1.5;
const LAYER_NAME: &str = "Layer 1";

// ────────────────────────────────────────────────────────────────────────────
// Stylesheet
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct BlockStyle {
    size_pt: f32,
    color: (u8, u8, u8),
    centered: bool,
    space_before_mm: f32,
    space_after_mm: f32,
}

const BODY_COLOR: (u8, u8, u8) = (0x33, 0x33, 0x33);
const MUTED_COLOR: (u8, u8, u8) = (0x55, 0x55, 0x55);
const TITLE_COLOR: (u8, u8, u8) = (0x2c, 0x3e, 0x50);
const SECTION_COLOR: (u8, u8, u8) = (0x34, 0x49, 0x5e);

fn style_for(kind: &BlockKind, in_header: bool, all_italic: bool) -> BlockStyle {
    let body = BlockStyle {
        size_pt: 11.0,
        color: BODY_COLOR,
        centered: false,
        space_before_mm: 0.0,
        space_after_mm: 1.5,
    };
    match kind {
        BlockKind::Heading(1) => BlockStyle {
            size_pt: 24.0,
            color: TITLE_COLOR,
            centered: true,
            space_after_mm: 2.0,
            ..body
        },
        BlockKind::Heading(2) => BlockStyle {
            size_pt: 14.0,
            color: SECTION_COLOR,
            space_before_mm: 5.0,
            space_after_mm: 3.0,
            ..body
        },
        BlockKind::Heading(_) => BlockStyle {
            size_pt: 12.0,
            color: TITLE_COLOR,
            space_before_mm: 2.0,
            space_after_mm: 0.5,
            ..body
        },
        BlockKind::Paragraph if in_header => BlockStyle {
            size_pt: 10.0,
            color: MUTED_COLOR,
            centered: true,
            space_after_mm: 0.5,
            ..body
        },
        BlockKind::Paragraph if all_italic => BlockStyle {
            size_pt: 10.0,
            color: MUTED_COLOR,
            space_after_mm: 1.0,
            ..body
        },
        BlockKind::ListItem => BlockStyle {
            space_after_mm: 0.5,
            ..body
        },
        BlockKind::Paragraph | BlockKind::Rule => body,
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn line_height_mm(size_pt: f32) -> f32 {
    size_pt * LINE_SPACING / PT_PER_MM
}

// ────────────────────────────────────────────────────────────────────────────
// Markdown → blocks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum BlockKind {
    Heading(u8),
    Paragraph,
    ListItem,
    Rule,
}

/// A run of characters set in one face.
#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    text: String,
    face: Face,
}

/// Characters between two spaces; may mix faces (e.g. `**Python**,`).
#[derive(Debug, Clone, Default, PartialEq)]
struct Word {
    fragments: Vec<Fragment>,
}

impl Word {
    fn push(&mut self, c: char, face: Face) {
        match self.fragments.last_mut() {
            Some(fragment) if fragment.face == face => fragment.text.push(c),
            _ => self.fragments.push(Fragment {
                text: c.to_string(),
                face,
            }),
        }
    }

    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn width_mm(&self, size_pt: f32) -> f32 {
        self.fragments
            .iter()
            .map(|f| text_width_mm(&f.text, f.face, size_pt))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Block {
    kind: BlockKind,
    words: Vec<Word>,
}

impl Block {
    fn all_italic(&self) -> bool {
        !self.words.is_empty()
            && self
                .words
                .iter()
                .flat_map(|w| &w.fragments)
                .all(|f| matches!(f.face, Face::Italic | Face::BoldItalic))
    }

    fn plain_text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.fragments.iter().map(|f| f.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    open: Option<(BlockKind, Word, Vec<Word>)>,
    bold: u32,
    italic: u32,
    in_item: bool,
}

impl BlockBuilder {
    fn open(&mut self, kind: BlockKind) {
        self.close();
        self.open = Some((kind, Word::default(), Vec::new()));
    }

    fn close(&mut self) {
        if let Some((kind, word, mut words)) = self.open.take() {
            if !word.is_empty() {
                words.push(word);
            }
            if !words.is_empty() {
                self.blocks.push(Block { kind, words });
            }
        }
    }

    fn text(&mut self, text: &str) {
        let face = Face::from_flags(self.bold > 0, self.italic > 0);
        if self.open.is_none() {
            self.open(BlockKind::Paragraph);
        }
        if let Some((_, word, words)) = self.open.as_mut() {
            for c in text.chars() {
                if c.is_whitespace() {
                    if !word.is_empty() {
                        words.push(std::mem::take(word));
                    }
                } else {
                    word.push(pdf_safe(c), face);
                }
            }
        }
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                builder.open(BlockKind::Heading(heading_depth(level)))
            }
            Event::Start(Tag::Item) => {
                builder.in_item = true;
                builder.open(BlockKind::ListItem);
            }
            // loose list items wrap their text in a paragraph
            Event::Start(Tag::Paragraph) if !builder.in_item => builder.open(BlockKind::Paragraph),
            Event::Start(Tag::Strong) => builder.bold += 1,
            Event::Start(Tag::Emphasis) => builder.italic += 1,
            Event::End(Tag::Strong) => builder.bold = builder.bold.saturating_sub(1),
            Event::End(Tag::Emphasis) => builder.italic = builder.italic.saturating_sub(1),
            Event::End(Tag::Item) => {
                builder.close();
                builder.in_item = false;
            }
            Event::End(Tag::Heading(..)) => builder.close(),
            Event::End(Tag::Paragraph) if !builder.in_item => builder.close(),
            Event::Text(text) | Event::Code(text) => builder.text(&text),
            Event::SoftBreak | Event::HardBreak => builder.text(" "),
            Event::Rule => {
                builder.close();
                builder.blocks.push(Block {
                    kind: BlockKind::Rule,
                    words: Vec::new(),
                });
            }
            _ => {}
        }
    }
    builder.close();
    builder.blocks
}

/// Maps characters outside the built-in fonts' Latin-1 range to ASCII stand-ins.
fn pdf_safe(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{2033}' => '"',
        '\u{2010}'..='\u{2015}' | '\u{2022}' | '\u{2212}' => '-',
        c if (c as u32) <= 0xFF => c,
        _ => '?',
    }
}

/// Greedy word wrap. A word wider than the line gets a line to itself.
fn wrap(words: &[Word], size_pt: f32, max_width_mm: f32) -> Vec<(&[Word], f32)> {
    let space = space_width_mm(Face::Regular, size_pt);
    let mut lines = Vec::new();
    let mut start = 0;
    let mut width = 0.0_f32;

    for (i, word) in words.iter().enumerate() {
        let word_width = word.width_mm(size_pt);
        if i > start && width + space + word_width > max_width_mm {
            lines.push((&words[start..i], width));
            start = i;
            width = word_width;
        } else if i == start {
            width = word_width;
        } else {
            width += space + word_width;
        }
    }
    if start < words.len() {
        lines.push((&words[start..], width));
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    bold_italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, RenderError> {
        let add = |font| {
            doc.add_builtin_font(font)
                .map_err(|e| RenderError::Pdf(e.to_string()))
        };
        Ok(Self {
            regular: add(BuiltinFont::Helvetica)?,
            bold: add(BuiltinFont::HelveticaBold)?,
            italic: add(BuiltinFont::HelveticaOblique)?,
            bold_italic: add(BuiltinFont::HelveticaBoldOblique)?,
        })
    }

    fn get(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
            Face::Italic => &self.italic,
            Face::BoldItalic => &self.bold_italic,
        }
    }
}

struct Typesetter {
    doc: PdfDocumentReference,
    fonts: Fonts,
    layer: PdfLayerReference,
    /// Top of the next line, in millimetres from the page bottom.
    cursor_mm: f32,
    pages: usize,
}

impl Typesetter {
    fn new(title: &str) -> Result<Self, RenderError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            LAYER_NAME,
        );
        let fonts = Fonts::load(&doc)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            fonts,
            layer,
            cursor_mm: PAGE_HEIGHT_MM - MARGIN_MM,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor_mm = PAGE_HEIGHT_MM - MARGIN_MM;
        self.pages += 1;
    }

    /// Starts a new page unless `needed_mm` still fits above the bottom margin.
    fn ensure_space(&mut self, needed_mm: f32) {
        let at_top = self.cursor_mm >= PAGE_HEIGHT_MM - MARGIN_MM;
        if !at_top && self.cursor_mm - needed_mm < MARGIN_MM {
            self.new_page();
        }
    }

    fn skip(&mut self, mm: f32) {
        // vertical space never carries over to a fresh page
        if self.cursor_mm < PAGE_HEIGHT_MM - MARGIN_MM {
            self.cursor_mm -= mm;
        }
    }

    fn block(&mut self, block: &Block, style: BlockStyle) {
        let is_heading = matches!(block.kind, BlockKind::Heading(_));
        let indent = if block.kind == BlockKind::ListItem {
            BULLET_INDENT_MM
        } else {
            0.0
        };
        let line_height = line_height_mm(style.size_pt);
        let lines = wrap(&block.words, style.size_pt, CONTENT_WIDTH_MM - indent);

        self.skip(style.space_before_mm);
        if is_heading {
            // keep a heading with at least two lines of what follows
            self.ensure_space(line_height * lines.len() as f32 + 2.0 * line_height_mm(11.0));
        }

        for (i, (words, width)) in lines.iter().enumerate() {
            self.ensure_space(line_height);
            let baseline = self.cursor_mm - style.size_pt / PT_PER_MM;
            let x = if style.centered {
                MARGIN_MM + (CONTENT_WIDTH_MM - width) / 2.0
            } else {
                MARGIN_MM + indent
            };
            if i == 0 && block.kind == BlockKind::ListItem {
                self.write_run(MARGIN_MM, baseline, style.size_pt, SECTION_COLOR, &bullet_word());
            }
            self.write_run(x, baseline, style.size_pt, style.color, words);
            self.cursor_mm -= line_height;
        }

        if block.kind == BlockKind::Heading(2) {
            self.rule(self.cursor_mm + line_height * 0.15);
        }
        self.skip(style.space_after_mm);
    }

    fn write_run(&self, x: f32, baseline: f32, size_pt: f32, color: (u8, u8, u8), words: &[Word]) {
        let layer = &self.layer;
        layer.begin_text_section();
        layer.set_fill_color(rgb(color));
        layer.set_text_cursor(Mm(x), Mm(baseline));
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                layer.set_font(&self.fonts.regular, size_pt);
                layer.write_text(" ", &self.fonts.regular);
            }
            for fragment in &word.fragments {
                let font = self.fonts.get(fragment.face);
                layer.set_font(font, size_pt);
                layer.write_text(fragment.text.as_str(), font);
            }
        }
        layer.end_text_section();
    }

    fn rule(&self, y_mm: f32) {
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN_MM), Mm(y_mm)), false),
                (Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), Mm(y_mm)), false),
            ],
            is_closed: false,
        };
        self.layer.set_outline_color(rgb(SECTION_COLOR));
        self.layer.set_outline_thickness(RULE_THICKNESS_PT);
        self.layer.add_line(line);
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }
}

fn bullet_word() -> [Word; 1] {
    let mut word = Word::default();
    word.push('-', Face::Regular);
    [word]
}

/// Typesets `markdown` into PDF bytes. Pure: no I/O beyond the returned buffer.
pub fn typeset_pdf(markdown: &str, title: &str) -> Result<Vec<u8>, RenderError> {
    let blocks = parse_blocks(markdown);
    let mut typesetter = Typesetter::new(title)?;
    let mut in_header = true;

    for block in &blocks {
        match block.kind {
            BlockKind::Rule => {
                typesetter.skip(1.5);
                typesetter.rule(typesetter.cursor_mm);
                typesetter.skip(1.5);
                continue;
            }
            BlockKind::Heading(level) if level >= 2 => in_header = false,
            _ => {}
        }
        let style = style_for(&block.kind, in_header, block.all_italic());
        typesetter.block(block, style);
    }

    tracing::debug!(
        "Typeset {} blocks onto {} page(s)",
        blocks.len(),
        typesetter.pages
    );
    typesetter.finish()
}
