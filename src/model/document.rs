//! Page model: a Markdown document laid out as terminal rows.
//!
//! Inline links become link elements; inline code written as `input:<name>`
//! becomes an editable field.

use std::path::Path;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use crate::error::{Error, Result};
use crate::model::geometry::ElementId;

/// Rendered width of a field, brackets excluded.
pub const FIELD_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    Plain,
    Heading,
    Emphasis,
    Strong,
    Code,
    Link,
    Field,
    Quote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
    pub element: Option<ElementId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocLine {
    pub spans: Vec<Span>,
}

impl DocLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    fn width(&self) -> usize {
        self.spans.iter().map(|span| span.text.chars().count()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Link { url: String },
    Field(Field),
}

/// Editable text field. `caret` counts characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub caret: usize,
}

impl Field {
    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset();
        self.value.insert(at, c);
        self.caret += 1;
    }

    pub fn delete_before(&mut self) {
        if self.caret == 0 {
            return;
        }
        self.caret -= 1;
        let at = self.byte_offset();
        self.value.remove(at);
    }

    pub fn move_caret(&mut self, delta: isize) {
        let len = self.value.chars().count() as isize;
        self.caret = (self.caret as isize + delta).clamp(0, len) as usize;
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.caret = 0;
    }

    /// Value padded or cut to the rendered width.
    pub fn display(&self) -> String {
        let shown: String = self.value.chars().take(FIELD_WIDTH).collect();
        format!("[{shown:_<width$}]", width = FIELD_WIDTH)
    }

    fn byte_offset(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.caret)
            .map_or(self.value.len(), |(i, _)| i)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocElement {
    pub id: ElementId,
    pub kind: ElementKind,
    pub row: usize,
    pub col: usize,
    pub width: usize,
}

impl DocElement {
    pub fn is_link(&self) -> bool {
        matches!(self.kind, ElementKind::Link { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: Option<String>,
    pub lines: Vec<DocLine>,
    pub elements: Vec<DocElement>,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_markdown(&text))
    }

    pub fn from_markdown(text: &str) -> Self {
        let mut builder = Builder::default();
        for event in Parser::new(text) {
            builder.event(event);
        }
        builder.finish()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_text(&self, row: usize) -> Option<String> {
        self.lines.get(row).map(DocLine::text)
    }

    pub fn element(&self, id: ElementId) -> Option<&DocElement> {
        self.elements.get(id.0)
    }

    pub fn field_mut(&mut self, id: ElementId) -> Option<&mut Field> {
        match self.elements.get_mut(id.0).map(|element| &mut element.kind) {
            Some(ElementKind::Field(field)) => Some(field),
            _ => None,
        }
    }

    pub fn links(&self) -> impl Iterator<Item = &DocElement> {
        self.elements.iter().filter(|element| element.is_link())
    }

    pub fn fields(&self) -> impl Iterator<Item = &DocElement> {
        self.elements.iter().filter(|element| !element.is_link())
    }
}

#[derive(Default)]
struct Builder {
    doc: Document,
    line: DocLine,
    prefix: Vec<&'static str>,
    strong: usize,
    emphasis: usize,
    heading: Option<HeadingLevel>,
    in_code_block: bool,
    /// A bullet was just written; the item's first paragraph shares its row.
    bullet_open: bool,
    link: Option<ElementId>,
}

impl Builder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.in_code_block => {
                for line in text.lines() {
                    self.push(line, SpanStyle::Code);
                    self.break_line();
                }
            }
            Event::Text(text) => {
                let style = self.style();
                if self.heading.is_some() && self.doc.title.is_none() {
                    self.doc.title = Some(text.to_string());
                }
                self.push(&text, style);
            }
            Event::Code(code) => match code.strip_prefix("input:") {
                Some(name) if self.link.is_none() => self.push_field(name.trim()),
                _ => self.push(&code, SpanStyle::Code),
            },
            Event::SoftBreak => self.push(" ", self.style()),
            Event::HardBreak => self.break_line(),
            Event::Rule => {
                self.break_line();
                self.push(&"─".repeat(40), SpanStyle::Plain);
                self.end_block();
            }
            Event::TaskListMarker(done) => {
                self.push(if done { "[x] " } else { "[ ] " }, SpanStyle::Plain)
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.break_line();
                self.heading = Some(level);
                let marks = "#".repeat(heading_depth(level));
                self.push(&format!("{marks} "), SpanStyle::Heading);
            }
            Tag::Paragraph if self.bullet_open => self.bullet_open = false,
            Tag::Paragraph => self.break_line(),
            Tag::Item => {
                self.break_line();
                self.push("• ", SpanStyle::Plain);
                self.bullet_open = true;
            }
            Tag::List(_) => self.break_line(),
            Tag::BlockQuote { .. } => {
                self.break_line();
                self.prefix.push("│ ");
            }
            Tag::CodeBlock(_) => {
                self.break_line();
                self.in_code_block = true;
            }
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Link { dest_url, .. } => {
                let id = ElementId(self.doc.elements.len());
                self.doc.elements.push(DocElement {
                    id,
                    kind: ElementKind::Link {
                        url: dest_url.to_string(),
                    },
                    row: self.doc.lines.len(),
                    col: self.line.width(),
                    width: 0,
                });
                self.link = Some(id);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.heading = None;
                self.end_block();
            }
            TagEnd::Paragraph | TagEnd::CodeBlock { .. } => {
                self.in_code_block = false;
                self.end_block();
            }
            TagEnd::Item => self.break_line(),
            TagEnd::List(_) => self.end_block(),
            TagEnd::BlockQuote { .. } => {
                self.break_line();
                self.prefix.pop();
            }
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Link => {
                if let Some(id) = self.link.take()
                    && let Some(element) = self.doc.elements.get_mut(id.0)
                {
                    element.width = self.line.width().saturating_sub(element.col);
                }
            }
            _ => {}
        }
    }

    fn style(&self) -> SpanStyle {
        if self.link.is_some() {
            SpanStyle::Link
        } else if self.heading.is_some() {
            SpanStyle::Heading
        } else if self.strong > 0 {
            SpanStyle::Strong
        } else if self.emphasis > 0 {
            SpanStyle::Emphasis
        } else if !self.prefix.is_empty() {
            SpanStyle::Quote
        } else {
            SpanStyle::Plain
        }
    }

    fn push(&mut self, text: &str, style: SpanStyle) {
        if text.is_empty() {
            return;
        }
        self.bullet_open = false;
        if self.line.spans.is_empty() {
            for prefix in &self.prefix {
                self.line.spans.push(Span {
                    text: prefix.to_string(),
                    style: SpanStyle::Quote,
                    element: None,
                });
            }
            if let Some(id) = self.link
                && let Some(element) = self.doc.elements.get_mut(id.0)
            {
                element.col = self.line.width();
            }
        }
        self.line.spans.push(Span {
            text: text.to_string(),
            style,
            element: self.link,
        });
    }

    fn push_field(&mut self, name: &str) {
        let id = ElementId(self.doc.elements.len());
        let field = Field {
            name: name.to_string(),
            ..Field::default()
        };
        let display = field.display();
        let col = self.line.width();
        self.push(&display, SpanStyle::Field);
        if let Some(span) = self.line.spans.last_mut() {
            span.element = Some(id);
        }
        self.doc.elements.push(DocElement {
            id,
            kind: ElementKind::Field(field),
            row: self.doc.lines.len(),
            col: if col == 0 { self.prefix_width() } else { col },
            width: FIELD_WIDTH + 2,
        });
    }

    fn prefix_width(&self) -> usize {
        self.prefix.iter().map(|p| p.chars().count()).sum()
    }

    /// Finishes the current row if it has content.
    fn break_line(&mut self) {
        self.bullet_open = false;
        if !self.line.spans.is_empty() {
            self.doc.lines.push(std::mem::take(&mut self.line));
        }
    }

    /// Finishes the row and leaves one blank row after the block.
    fn end_block(&mut self) {
        self.break_line();
        if self.doc.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.doc.lines.push(DocLine::default());
        }
    }

    fn finish(mut self) -> Document {
        self.break_line();
        while self.doc.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.doc.lines.pop();
        }
        self.doc
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
