//! A [`Page`] backed by a Markdown [`Document`] shown in a terminal.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use slotmap::{Key as _, KeyData, SlotMap, new_key_type};

use crate::error::Result;
use crate::model::document::{Document, ElementKind, Field};
use crate::model::geometry::{Element, ElementId, Point, Rect};
use crate::model::key::{Key, KeyInput};
use crate::page::{LABEL_Z_INDEX, LabelId, Page, ScrollBehavior, ScrollTarget, TextNode};

const CONSOLE_LIMIT: usize = 200;
const LOCAL_HOST: &str = "localhost";

/// Pages compiled into the binary, addressed by file name.
const BUILTIN_PAGES: &[(&str, &str)] = &[
    ("welcome.md", include_str!("../demos/welcome.md")),
    ("keys.md", include_str!("../demos/keys.md")),
];

fn builtin_page(name: &str) -> Option<(&'static str, &'static str)> {
    let name = name.trim_start_matches("./");
    BUILTIN_PAGES.iter().copied().find(|(page, _)| *page == name)
}

new_key_type! { struct LabelKey; }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub code: String,
    pub at: Point,
    pub z: u32,
}

/// Notifications the host forwards to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Focus(ElementId),
    Blur(ElementId),
    Navigated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Remote { url: String, host: String },
    /// One of the pages shipped inside the binary; links between them
    /// resolve to each other.
    Builtin(&'static str),
    /// Markdown handed over directly; kept so history can rebuild it.
    Inline(String),
}

impl Location {
    pub fn host(&self) -> &str {
        match self {
            Location::Remote { host, .. } => host,
            Location::File(_) | Location::Builtin(_) | Location::Inline(_) => LOCAL_HOST,
        }
    }

    /// Directory a file page lives in, for watching it.
    pub fn directory(&self) -> Option<PathBuf> {
        let Location::File(path) = self else {
            return None;
        };
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => Some(dir.to_path_buf()),
            _ => Some(PathBuf::from(".")),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Location::File(path) => path.display().to_string(),
            Location::Remote { url, .. } => url.clone(),
            Location::Builtin(name) => format!("[{name}]"),
            Location::Inline(_) => "[inline]".to_string(),
        }
    }
}

pub struct TerminalPage {
    location: Location,
    document: Document,
    scroll: Point,
    viewport_height: usize,
    animation: Option<i32>,
    labels: SlotMap<LabelKey, Label>,
    history: Vec<Location>,
    focused: Option<ElementId>,
    command_line: Option<String>,
    console: VecDeque<String>,
    events: VecDeque<PageEvent>,
}

impl TerminalPage {
    pub fn new(location: Location, document: Document) -> Self {
        Self {
            location,
            document,
            scroll: Point::ORIGIN,
            viewport_height: 24,
            animation: None,
            labels: SlotMap::with_key(),
            history: Vec::new(),
            focused: None,
            command_line: None,
            console: VecDeque::new(),
            events: VecDeque::new(),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let document = Document::load(path)?;
        Ok(Self::new(Location::File(path.to_path_buf()), document))
    }

    /// A page shipped with the binary, e.g. `welcome.md`.
    pub fn builtin(name: &str) -> Option<Self> {
        let (name, text) = builtin_page(name)?;
        Some(Self::new(
            Location::Builtin(name),
            Document::from_markdown(text),
        ))
    }

    pub fn from_markdown(text: &str) -> Self {
        Self::new(
            Location::Inline(text.to_string()),
            Document::from_markdown(text),
        )
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn focused_field(&self) -> Option<&Field> {
        let element = self.document.element(self.focused?)?;
        match &element.kind {
            ElementKind::Field(field) => Some(field),
            ElementKind::Link { .. } => None,
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    pub fn command_line(&self) -> Option<&str> {
        self.command_line.as_deref()
    }

    pub fn console(&self) -> impl DoubleEndedIterator<Item = &String> {
        self.console.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        self.scroll.y = self.clamp_row(self.scroll.y);
    }

    pub fn max_scroll(&self) -> i32 {
        self.document
            .line_count()
            .saturating_sub(self.viewport_height) as i32
    }

    pub fn take_events(&mut self) -> Vec<PageEvent> {
        self.events.drain(..).collect()
    }

    /// Steps a smooth scroll towards its target. Returns `true` while moving.
    pub fn advance_animation(&mut self) -> bool {
        let Some(target) = self.animation else {
            return false;
        };
        let distance = target - self.scroll.y;
        if distance == 0 {
            self.animation = None;
            return false;
        }
        let step = (distance.abs() / 3).max(1) * distance.signum();
        self.scroll.y += step;
        true
    }

    /// Opens `location`, remembering the current one for `history_back`.
    pub fn navigate(&mut self, location: Location) {
        let previous = self.location.clone();
        if self.replace(location) {
            self.history.push(previous);
        }
    }

    /// Re-reads the current file, keeping scroll where possible.
    pub fn reload(&mut self) {
        let Location::File(path) = &self.location else {
            return;
        };
        match Document::load(path) {
            Ok(document) => {
                let scroll = self.scroll;
                self.show(document);
                self.scroll.y = self.clamp_row(scroll.y);
                tracing::info!("reloaded {}", self.location.describe());
            }
            Err(err) => {
                tracing::warn!("reload failed: {err}");
                self.report(&format!("reload failed: {err}"));
            }
        }
    }

    /// Browser-native handling for keys the dispatcher did not claim.
    pub fn handle_native(&mut self, input: &KeyInput) {
        match input.key {
            Key::Up => self.scroll_by(-1),
            Key::Down => self.scroll_by(1),
            Key::PageUp => self.scroll_by(-(self.viewport_height as i32)),
            Key::PageDown => self.scroll_by(self.viewport_height as i32),
            Key::Left if input.alt => self.history_back(),
            Key::Left => self.move_caret(-1),
            Key::Right => self.move_caret(1),
            Key::Tab => self.focus_next(),
            Key::Backspace => {
                if let Some(field) = self.focused_field_mut() {
                    field.delete_before();
                }
            }
            Key::Enter => {
                if let Some(field) = self.focused_field() {
                    let message = format!("submitted {}={:?}", field.name, field.value);
                    self.report(&message);
                }
            }
            Key::Char(c) if !input.ctrl && !input.alt => {
                if let Some(field) = self.focused_field_mut() {
                    field.insert(c);
                }
            }
            _ => {}
        }
    }

    /// Moves focus to the next field; past the last one focus returns to
    /// the page body.
    pub fn focus_next(&mut self) {
        let fields: Vec<ElementId> = self.document.fields().map(|f| f.id).collect();
        let next = match self.focused {
            None => fields.first().copied(),
            Some(current) => fields
                .iter()
                .position(|id| *id == current)
                .and_then(|i| fields.get(i + 1).copied()),
        };
        self.set_focus(next);
    }

    fn set_focus(&mut self, next: Option<ElementId>) {
        if self.focused == next {
            return;
        }
        if let Some(previous) = self.focused.take() {
            self.events.push_back(PageEvent::Blur(previous));
        }
        if let Some(id) = next {
            self.focused = Some(id);
            self.events.push_back(PageEvent::Focus(id));
        }
    }

    fn focused_field_mut(&mut self) -> Option<&mut Field> {
        let id = self.focused?;
        self.document.field_mut(id)
    }

    fn replace(&mut self, location: Location) -> bool {
        let document = match &location {
            Location::File(path) => match Document::load(path) {
                Ok(document) => document,
                Err(err) => {
                    tracing::warn!("navigation failed: {err}");
                    self.report(&format!("cannot open {}: {err}", path.display()));
                    return false;
                }
            },
            Location::Remote { url, .. } => Document::from_markdown(&format!(
                "# {url}\n\nThis page is not available offline.\n\n\
                 Press ctrl-o (alt-left on suppressed hosts) to go back.\n"
            )),
            Location::Builtin(name) => match builtin_page(name) {
                Some((_, text)) => Document::from_markdown(text),
                None => {
                    self.report(&format!("cannot open {name}: no such built-in page"));
                    return false;
                }
            },
            Location::Inline(source) => Document::from_markdown(source),
        };

        tracing::info!("navigated to {}", location.describe());
        self.location = location;
        self.show(document);
        true
    }

    fn show(&mut self, document: Document) {
        self.set_focus(None);
        self.document = document;
        self.scroll = Point::ORIGIN;
        self.animation = None;
        self.labels.clear();
        self.events.push_back(PageEvent::Navigated);
    }

    fn resolve(&self, url: &str) -> Location {
        if let Some(host) = remote_host(url) {
            return Location::Remote {
                url: url.to_string(),
                host,
            };
        }

        let target = url.split('#').next().unwrap_or(url);
        let base = match &self.location {
            Location::File(path) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
            Location::Builtin(_) => match builtin_page(target) {
                Some((name, _)) => return Location::Builtin(name),
                None => PathBuf::new(),
            },
            Location::Remote { .. } | Location::Inline(_) => PathBuf::new(),
        };
        Location::File(base.join(target))
    }

    fn clamp_row(&self, row: i32) -> i32 {
        row.clamp(0, self.max_scroll())
    }
}

/// Host part of an absolute URL, lower-cased.
fn remote_host(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() || scheme.eq_ignore_ascii_case("file") {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);
    Some(host.to_ascii_lowercase())
}

impl Page for TerminalPage {
    fn hostname(&self) -> &str {
        self.location.host()
    }

    fn links(&self) -> Vec<Element> {
        self.document
            .links()
            .map(|link| Element {
                id: link.id,
                rect: Rect::new(
                    link.col as i32,
                    link.row as i32 - self.scroll.y,
                    link.width as i32,
                    if link.width == 0 { 0 } else { 1 },
                ),
            })
            .collect()
    }

    fn text_nodes(&self) -> Vec<TextNode> {
        self.document
            .lines
            .iter()
            .enumerate()
            .filter_map(|(row, line)| {
                let text = line.text();
                (!text.trim().is_empty()).then_some(TextNode { row, text })
            })
            .collect()
    }

    fn scroll_position(&self) -> Point {
        self.scroll
    }

    fn scroll_by(&mut self, dy: i32) {
        self.animation = None;
        self.scroll.y = self.clamp_row(self.scroll.y + dy);
    }

    fn scroll_to(&mut self, target: ScrollTarget, behavior: ScrollBehavior) {
        let row = match target {
            ScrollTarget::Top => 0,
            ScrollTarget::Bottom => self.max_scroll(),
            ScrollTarget::Position(point) => self.clamp_row(point.y),
        };
        match behavior {
            ScrollBehavior::Instant => {
                self.animation = None;
                self.scroll.y = row;
            }
            ScrollBehavior::Smooth => self.animation = Some(row),
        }
    }

    fn history_back(&mut self) {
        let Some(previous) = self.history.pop() else {
            tracing::debug!("history is empty");
            return;
        };
        if !self.replace(previous.clone()) {
            self.history.push(previous);
        }
    }

    fn activate(&mut self, element: ElementId) {
        let Some(target) = self.document.element(element) else {
            return;
        };
        match &target.kind {
            ElementKind::Link { url } => {
                let location = self.resolve(url);
                self.navigate(location);
            }
            ElementKind::Field(_) => self.set_focus(Some(element)),
        }
    }

    fn render_label(&mut self, code: &str, at: Point) -> LabelId {
        let key = self.labels.insert(Label {
            code: code.to_string(),
            at,
            z: LABEL_Z_INDEX,
        });
        LabelId(key.data().as_ffi())
    }

    fn remove_label(&mut self, label: LabelId) {
        self.labels.remove(LabelKey::from(KeyData::from_ffi(label.0)));
    }

    fn move_caret(&mut self, delta: isize) {
        if let Some(field) = self.focused_field_mut() {
            field.move_caret(delta);
        }
    }

    fn clear_field(&mut self) {
        if let Some(field) = self.focused_field_mut() {
            field.clear();
        }
    }

    fn show_command_line(&mut self) {
        self.command_line = Some(String::new());
    }

    fn update_command_line(&mut self, text: &str) {
        if let Some(line) = self.command_line.as_mut() {
            line.clear();
            line.push_str(text);
        }
    }

    fn hide_command_line(&mut self) {
        self.command_line = None;
    }

    fn report(&mut self, message: &str) {
        tracing::info!(target: "pagekeys::console", "{message}");
        self.console.push_back(message.to_string());
        while self.console.len() > CONSOLE_LIMIT {
            self.console.pop_front();
        }
    }
}
