use anyhow::{Context, Result};
use printpdf::{BuiltinFont, Color, Greyscale, IndirectFontRef, Mm, PdfDocument};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_TOP: f32 = PAGE_HEIGHT - MARGIN - 6.0;
const CONTENT_BOTTOM: f32 = MARGIN + 4.0;
const BODY_SIZE: f32 = 11.0;
const NOTE_SIZE: f32 = 9.0;
const PT_TO_MM: f32 = 0.3528;

/// A block-level element of the Markdown document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Bullet { marker: String, depth: usize, text: String },
    Note(String),
    Rule,
}

/// A positioned line of text, coordinates in millimetres from the bottom left.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub size: f32,
    pub bold: bool,
    pub grey: bool,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<Line>,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    current: String,
    heading: Option<u8>,
    lists: Vec<Option<u64>>,
    item: Option<(String, usize)>,
    links: Vec<String>,
}

impl BlockBuilder {
    fn flush(&mut self) {
        let text = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        self.current.clear();
        if text.is_empty() {
            return;
        }

        let block = if let Some(level) = self.heading {
            Block::Heading { level, text }
        } else if let Some((marker, depth)) = self.item.take() {
            Block::Bullet { marker, depth, text }
        } else {
            Block::Paragraph(text)
        };
        self.blocks.push(block);
    }

    fn start_item(&mut self) {
        self.flush();
        let depth = self.lists.len().saturating_sub(1);
        let marker = match self.lists.last_mut() {
            Some(Some(n)) => {
                let marker = format!("{}.", n);
                *n += 1;
                marker
            }
            _ => "-".to_string(),
        };
        self.item = Some((marker, depth));
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Flatten Markdown into printable blocks. Inline styling is dropped and
/// link targets are kept in parentheses after the link text.
pub fn parse_markdown(markdown: &str) -> Vec<Block> {
    let mut b = BlockBuilder::default();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                b.flush();
                b.heading = Some(heading_level(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                b.flush();
                b.heading = None;
            }
            Event::Start(Tag::Paragraph) => {
                if b.item.is_none() {
                    b.flush();
                }
            }
            Event::End(TagEnd::Paragraph) => b.flush(),
            Event::Start(Tag::List(start)) => {
                b.flush();
                b.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                b.flush();
                b.lists.pop();
            }
            Event::Start(Tag::Item) => b.start_item(),
            Event::End(TagEnd::Item) => b.flush(),
            Event::Start(Tag::Link { dest_url, .. }) => {
                b.links.push(dest_url.to_string());
            }
            Event::End(TagEnd::Link) => {
                if let Some(url) = b.links.pop() {
                    if !url.starts_with('#') && !b.current.trim_end().ends_with(url.as_str()) {
                        b.current.push_str(&format!(" ({})", url));
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => b.current.push_str(&text),
            Event::SoftBreak | Event::HardBreak => b.current.push(' '),
            Event::Rule => {
                b.flush();
                b.blocks.push(Block::Rule);
            }
            _ => {}
        }
    }
    b.flush();

    b.blocks
}

/// Replace characters the standard PDF fonts cannot show.
pub fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' | '\u{00B7}' => out.push('-'),
            '\u{00A0}' | '\t' => out.push(' '),
            c if c.is_control() => {}
            c if (c as u32) <= 0xFF => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.45
}

fn max_chars(width_mm: f32, size: f32, bold: bool) -> usize {
    let avg = size * PT_TO_MM * if bold { 0.56 } else { 0.5 };
    ((width_mm / avg).floor() as usize).max(10)
}

/// Greedy word wrap. Words longer than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.len();
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: CONTENT_TOP,
        }
    }

    fn space(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn push(&mut self, text: String, size: f32, bold: bool, grey: bool, x: f32) {
        let height = line_height(size);
        if self.y - height < CONTENT_BOTTOM {
            self.pages.push(Page::default());
            self.y = CONTENT_TOP;
        }
        self.y -= height;

        if let Some(page) = self.pages.last_mut() {
            page.lines.push(Line {
                text,
                size,
                bold,
                grey,
                x,
                y: self.y,
            });
        }
    }
}

/// Place blocks on A4 pages. Always yields at least one page.
pub fn layout(blocks: &[Block]) -> Vec<Page> {
    let mut cursor = Cursor::new();
    let usable = PAGE_WIDTH - 2.0 * MARGIN;

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = match level {
                    1 => 18.0,
                    2 => 15.0,
                    3 => 13.0,
                    _ => 12.0,
                };
                cursor.space(3.0);
                for line in wrap(&pdf_safe(text), max_chars(usable, size, true)) {
                    cursor.push(line, size, true, false, MARGIN);
                }
                cursor.space(1.5);
            }
            Block::Paragraph(text) => {
                for line in wrap(&pdf_safe(text), max_chars(usable, BODY_SIZE, false)) {
                    cursor.push(line, BODY_SIZE, false, false, MARGIN);
                }
                cursor.space(2.5);
            }
            Block::Bullet {
                marker,
                depth,
                text,
            } => {
                let indent = MARGIN + 5.0 * (*depth as f32 + 1.0);
                let width = max_chars(usable - (indent - MARGIN) - 5.0, BODY_SIZE, false);
                for (i, line) in wrap(&pdf_safe(text), width).into_iter().enumerate() {
                    if i == 0 {
                        cursor.push(format!("{} {}", marker, line), BODY_SIZE, false, false, indent);
                    } else {
                        cursor.push(line, BODY_SIZE, false, false, indent + 5.0);
                    }
                }
                cursor.space(1.0);
            }
            Block::Note(text) => {
                cursor.space(4.0);
                for line in wrap(&pdf_safe(text), max_chars(usable, NOTE_SIZE, false)) {
                    cursor.push(line, NOTE_SIZE, false, true, MARGIN);
                }
            }
            Block::Rule => {
                cursor.space(2.0);
                let dashes = "-".repeat(max_chars(usable, BODY_SIZE, false));
                cursor.push(dashes, BODY_SIZE, false, true, MARGIN);
                cursor.space(2.0);
            }
        }
    }

    cursor.pages
}

fn render(pages: &[Page], title: &str, path: &Path) -> Result<()> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("Failed to load PDF font: {:?}", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow::anyhow!("Failed to load PDF font: {:?}", e))?;

    let black = Color::Greyscale(Greyscale::new(0.0, None));
    let grey = Color::Greyscale(Greyscale::new(0.45, None));
    let total = pages.len();

    for (index, page) in pages.iter().enumerate() {
        let (page_idx, layer_idx) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", index + 1))
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);

        layer.set_fill_color(grey.clone());
        layer.use_text(pdf_safe(title), NOTE_SIZE, Mm(MARGIN), Mm(PAGE_HEIGHT - 12.0), &bold);
        layer.use_text(
            format!("Page {} of {}", index + 1, total),
            NOTE_SIZE,
            Mm(PAGE_WIDTH / 2.0 - 8.0),
            Mm(10.0),
            &regular,
        );

        for line in &page.lines {
            let font: &IndirectFontRef = if line.bold { &bold } else { &regular };
            layer.set_fill_color(if line.grey { grey.clone() } else { black.clone() });
            layer.use_text(line.text.as_str(), line.size, Mm(line.x), Mm(line.y), font);
        }
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create PDF file: {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| anyhow::anyhow!("Failed to write PDF: {:?}", e))?;

    Ok(())
}

/// Render a Markdown document to an A4 PDF with a running header, page
/// numbers and a closing note.
pub fn write_pdf(markdown: &str, title: &str, closing: &str, path: &Path) -> Result<()> {
    let mut blocks = parse_markdown(markdown);
    blocks.push(Block::Note(closing.to_string()));

    let pages = layout(&blocks);
    tracing::debug!(pages = pages.len(), path = %path.display(), "rendering PDF");

    render(&pages, title, path)
}
