use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use pagekeys::model::document::{ElementKind, FIELD_WIDTH, SpanStyle};
use pagekeys::page::Page;
use pagekeys::terminal_page::{Location, PageEvent};
use pagekeys::{AppConfig, Dispatcher, KeyInput, Mode, TerminalPage};

use crate::msg::Msg;

const CONSOLE_HEIGHT: u16 = 6;

pub struct App {
    pub page: TerminalPage,
    pub dispatcher: Dispatcher,
    pub should_quit: bool,
    watch_tx: Option<mpsc::Sender<PathBuf>>,
    watched_dir: Option<PathBuf>,
}

impl App {
    pub fn new(config: AppConfig, path: Option<&Path>) -> Result<Self> {
        let page = match path {
            Some(path) => TerminalPage::open(path)?,
            None => TerminalPage::builtin("welcome.md").context("built-in welcome page missing")?,
        };
        let dispatcher = Dispatcher::from_config(&config);

        Ok(Self {
            page,
            dispatcher,
            should_quit: false,
            watch_tx: None,
            watched_dir: None,
        })
    }

    /// Hands over the file watcher's control channel; it is pointed at the
    /// directory of every file page shown from now on.
    pub fn follow_with(&mut self, watch_tx: mpsc::Sender<PathBuf>) {
        self.watch_tx = Some(watch_tx);
        self.retarget_watcher();
    }

    fn retarget_watcher(&mut self) {
        let Some(dir) = self.page.location().directory() else {
            return;
        };
        if self.watched_dir.as_ref() == Some(&dir) {
            return;
        }
        if let Some(watch_tx) = &self.watch_tx
            && watch_tx.send(dir.clone()).is_ok()
        {
            self.watched_dir = Some(dir);
        }
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::FileChanged(path) => self.handle_file_changed(&path),
            Msg::Tick => self.handle_tick(),
            Msg::Quit => self.should_quit = true,
            Msg::Resize(_w, h) => {
                // status bar + console; view() refines this per frame
                self.page
                    .set_viewport_height(h.saturating_sub(CONSOLE_HEIGHT + 1) as usize);
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        let input = KeyInput::from(key);
        let claimed = self
            .dispatcher
            .dispatch(&input, Instant::now(), &mut self.page);
        if !claimed && !input.is_modifier_only() {
            self.page.handle_native(&input);
        }
        self.forward_page_events();
    }

    fn handle_tick(&mut self) {
        self.dispatcher.tick(Instant::now(), &mut self.page);
        self.page.advance_animation();
        self.forward_page_events();
    }

    fn handle_file_changed(&mut self, path: &Path) {
        let Location::File(current) = self.page.location() else {
            return;
        };
        if same_file(current, path) {
            tracing::debug!("page file changed on disk: {}", path.display());
            self.page.reload();
            self.forward_page_events();
        }
    }

    fn forward_page_events(&mut self) {
        for event in self.page.take_events() {
            match event {
                PageEvent::Focus(_) => self.dispatcher.focus(),
                PageEvent::Blur(_) => self.dispatcher.blur(),
                PageEvent::Navigated => {
                    self.dispatcher.navigated(&mut self.page);
                    self.retarget_watcher();
                }
            }
        }
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let command_line_height = u16::from(self.page.command_line().is_some());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),                      // page
                Constraint::Length(command_line_height), // command line
                Constraint::Length(CONSOLE_HEIGHT),      // console
                Constraint::Length(1),                   // status bar
            ])
            .split(frame.area());

        self.page.set_viewport_height(chunks[0].height as usize);
        self.render_page(frame, chunks[0]);
        self.render_labels(frame, chunks[0]);
        self.render_command_line(frame, chunks[1]);
        self.render_console(frame, chunks[2]);
        self.render_status_bar(frame, chunks[3]);
    }

    fn render_page(&self, frame: &mut Frame, area: Rect) {
        let document = self.page.document();
        let top = self.page.scroll_position().y.max(0) as usize;
        let bottom = (top + area.height as usize).min(document.line_count());
        let focused = self.page.focused();

        let lines: Vec<Line> = document.lines[top.min(bottom)..bottom]
            .iter()
            .map(|line| {
                Line::from(
                    line.spans
                        .iter()
                        .map(|span| {
                            let text = match span.element.and_then(|id| document.element(id)) {
                                Some(element) => match &element.kind {
                                    ElementKind::Field(field) => field.display(),
                                    ElementKind::Link { .. } => span.text.clone(),
                                },
                                None => span.text.clone(),
                            };
                            let mut style = span_style(span.style);
                            if span.element.is_some() && span.element == focused {
                                style = style.add_modifier(Modifier::REVERSED);
                            }
                            Span::styled(text, style)
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), area);

        if self.dispatcher.mode() == Mode::Insert
            && let Some((x, y)) = self.caret_position(area)
        {
            frame.set_cursor_position((x, y));
        }
    }

    fn caret_position(&self, area: Rect) -> Option<(u16, u16)> {
        let id = self.page.focused()?;
        let element = self.page.document().element(id)?;
        let field = self.page.focused_field()?;
        let row = element.row as i32 - self.page.scroll_position().y;
        if row < 0 || row >= area.height as i32 {
            return None;
        }
        let col = element.col + 1 + field.caret.min(FIELD_WIDTH);
        Some((area.x + col as u16, area.y + row as u16))
    }

    /// Hint labels go on top of everything else in the page area.
    fn render_labels(&self, frame: &mut Frame, area: Rect) {
        let scroll = self.page.scroll_position();
        let style = Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD);

        let mut labels: Vec<_> = self.page.labels().collect();
        labels.sort_by_key(|label| label.z);
        for label in labels {
            let row = label.at.y - scroll.y;
            if row < 0 || row >= area.height as i32 || label.at.x >= area.width as i32 {
                continue;
            }
            let x = area.x + label.at.x.max(0) as u16;
            let width = (label.code.chars().count() as u16).min(area.right().saturating_sub(x));
            let cell = Rect::new(x, area.y + row as u16, width, 1);
            frame.render_widget(Paragraph::new(label.code.as_str()).style(style), cell);
        }
    }

    fn render_command_line(&self, frame: &mut Frame, area: Rect) {
        let Some(text) = self.page.command_line() else {
            return;
        };
        let prompt = Paragraph::new(format!(":{text}"))
            .style(Style::default().fg(Color::White).bg(Color::Rgb(15, 15, 24)));
        frame.render_widget(prompt, area);
        frame.set_cursor_position((area.x + 1 + text.chars().count() as u16, area.y));
    }

    fn render_console(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(1) as usize;
        let mut lines: Vec<Line> = self
            .page
            .console()
            .rev()
            .take(visible)
            .map(|line| Line::from(Span::styled(line.clone(), Style::default().fg(Color::Gray))))
            .collect();
        lines.reverse();

        let panel = Paragraph::new(lines).block(
            Block::default()
                .title(" Console ")
                .borders(Borders::TOP)
                .style(Style::default().bg(Color::Rgb(12, 12, 18))),
        );
        frame.render_widget(panel, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode = self.dispatcher.mode();
        let mode_style = match mode {
            Mode::NormalPage => Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            Mode::Insert => Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            Mode::NormalInput => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };

        let mut spans = vec![Span::styled(format!(" {} ", mode.label()), mode_style)];
        if let Some(overlay) = self.dispatcher.overlay().label() {
            spans.push(Span::styled(
                format!(" {overlay} "),
                Style::default().fg(Color::Black).bg(Color::Green),
            ));
        }

        let host = self.page.hostname();
        let mut info = format!(
            " {}  {}  {}/{}",
            self.page.location().describe(),
            host,
            self.page.scroll_position().y + 1,
            self.page.document().line_count().max(1),
        );
        if self.dispatcher.is_suppressed(host) {
            info.push_str(" | keys passed through");
        }
        if let Some(key) = self.dispatcher.pending_chord() {
            info.push_str(&format!(" | {key}"));
        }
        if self.dispatcher.hints().is_active() && !self.dispatcher.hints().choice().is_empty() {
            info.push_str(&format!(" | hint: {}", self.dispatcher.hints().choice()));
        }
        info.push(' ');
        spans.push(Span::styled(
            info,
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        ));

        let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }
}

fn span_style(style: SpanStyle) -> Style {
    match style {
        SpanStyle::Plain => Style::default(),
        SpanStyle::Heading => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        SpanStyle::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
        SpanStyle::Strong => Style::default().add_modifier(Modifier::BOLD),
        SpanStyle::Code => Style::default().fg(Color::Yellow),
        SpanStyle::Link => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED),
        SpanStyle::Field => Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 40)),
        SpanStyle::Quote => Style::default().fg(Color::DarkGray),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
