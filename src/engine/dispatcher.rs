//! Mode state machine: routes every keydown to the active overlay or to the
//! per-mode key tables.

use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::chord::{ChordOutcome, PendingChord};
use super::command_line::{self, CommandLine, CommandLineOutcome};
use super::hints::{HintAllocator, HintOutcome};
use crate::model::config::{AppConfig, SitesConfig};
use crate::model::geometry::Point;
use crate::model::key::{Key, KeyInput};
use crate::model::mode::{Mode, Overlay};
use crate::page::{Page, ScrollBehavior, ScrollTarget};

/// What a recognized key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ScrollBy(i32),
    ScrollToTop,
    ScrollToBottom,
    /// Swap the viewport with the saved position.
    JumpBack,
    HistoryBack,
    EnterHints,
    EnterCommandLine,
    EnterInsert,
    ExitInsert,
    /// Enter inside a field: back to page mode, the page still sees the key.
    LeaveInput,
    CaretLeft,
    CaretRight,
    ClearField,
    /// First half of a chord.
    ChordPending,
}

impl Action {
    fn passes_through(&self) -> bool {
        matches!(self, Action::LeaveInput)
    }
}

pub struct Dispatcher {
    mode: Mode,
    step: i32,
    page_step: i32,
    smooth: bool,
    sites: SitesConfig,
    hints: HintAllocator,
    command_line: CommandLine,
    top: PendingChord,
    jump_back: PendingChord,
    clear_field: PendingChord,
    saved_position: Option<Point>,
}

impl Dispatcher {
    pub fn new(config: &AppConfig, rng: StdRng) -> Self {
        let window = config.chord_timeout();
        Self {
            mode: Mode::NormalPage,
            step: config.scroll.step,
            page_step: config.scroll.page,
            smooth: config.scroll.smooth,
            sites: config.sites.clone(),
            hints: HintAllocator::new(config.hint_alphabet(), config.hint_timeout(), rng),
            command_line: CommandLine::default(),
            top: PendingChord::new('g', window),
            jump_back: PendingChord::new(',', window),
            clear_field: PendingChord::new('d', window),
            saved_position: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config, StdRng::from_entropy())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn overlay(&self) -> Overlay {
        if self.command_line.is_active() {
            Overlay::CommandLine
        } else if self.hints.is_active() {
            Overlay::Hints
        } else {
            Overlay::None
        }
    }

    pub fn hints(&self) -> &HintAllocator {
        &self.hints
    }

    pub fn command_line(&self) -> &CommandLine {
        &self.command_line
    }

    pub fn saved_position(&self) -> Option<Point> {
        self.saved_position
    }

    /// First key of a chord waiting for its second press, if any.
    pub fn pending_chord(&self) -> Option<char> {
        [&self.top, &self.jump_back, &self.clear_field]
            .into_iter()
            .find(|chord| chord.is_pending())
            .map(PendingChord::key)
    }

    pub fn is_suppressed(&self, host: &str) -> bool {
        self.sites.is_suppressed(host)
    }

    /// Handles one keydown. Returns `true` when the page must not see it.
    pub fn dispatch(&mut self, input: &KeyInput, now: Instant, page: &mut dyn Page) -> bool {
        if self.is_suppressed(page.hostname()) {
            return false;
        }

        // Expiries queued before this key run first.
        self.tick(now, page);

        if self.command_line.is_active() {
            if let CommandLineOutcome::Submitted(Some(command)) =
                self.command_line.feed(input, page)
            {
                command_line::execute(&command, page);
            }
            return true;
        }

        if self.hints.is_active() {
            self.hints.feed(input, now, page);
            return true;
        }

        let action = self
            .regular_action(input, now)
            .or_else(|| self.ctrl_action(input))
            .or_else(|| self.shift_action(input));

        tracing::trace!("{:?} in {:?} -> {action:?}", input.key, self.mode);

        match action {
            Some(action) => {
                self.apply(action, page);
                !action.passes_through()
            }
            None if input.key == Key::Escape && self.pending_chord().is_some() => {
                self.cancel_chords();
                true
            }
            // Inside a field, unbound keys must not reach it until Insert.
            None => self.mode == Mode::NormalInput,
        }
    }

    /// Runs due expiries. Returns the hint resolution if one happened.
    pub fn tick(&mut self, now: Instant, page: &mut dyn Page) -> Option<HintOutcome> {
        for chord in [&mut self.top, &mut self.jump_back, &mut self.clear_field] {
            if chord.expire(now) {
                tracing::trace!("chord {:?} expired", chord.key());
            }
        }
        self.hints.tick(now, page)
    }

    /// An editable element gained focus.
    pub fn focus(&mut self) {
        self.cancel_chords();
        self.set_mode(Mode::NormalInput);
    }

    /// The focused editable element lost focus.
    pub fn blur(&mut self) {
        self.cancel_chords();
        self.set_mode(Mode::NormalPage);
    }

    /// The page was replaced; drop every transient state.
    pub fn navigated(&mut self, page: &mut dyn Page) {
        self.hints.exit(page);
        self.command_line.cancel(page);
        self.cancel_chords();
        self.saved_position = None;
        self.set_mode(Mode::NormalPage);
    }

    fn regular_action(&mut self, input: &KeyInput, now: Instant) -> Option<Action> {
        if input.ctrl {
            return None;
        }

        match (self.mode, input.key) {
            (Mode::NormalPage, Key::Char('j')) => Some(Action::ScrollBy(self.step)),
            (Mode::NormalPage, Key::Char('k')) => Some(Action::ScrollBy(-self.step)),
            (Mode::NormalPage, Key::Char('g')) => {
                Some(chord_action(self.top.press(now), Action::ScrollToTop))
            }
            (Mode::NormalPage, Key::Char(',')) => {
                Some(chord_action(self.jump_back.press(now), Action::JumpBack))
            }
            (Mode::NormalPage, Key::Char('f')) => Some(Action::EnterHints),
            (Mode::NormalInput, Key::Char('i')) => Some(Action::EnterInsert),
            (Mode::NormalInput, Key::Char('h')) => Some(Action::CaretLeft),
            (Mode::NormalInput, Key::Char('l')) => Some(Action::CaretRight),
            (Mode::NormalInput, Key::Char('d')) => Some(chord_action(
                self.clear_field.press(now),
                Action::ClearField,
            )),
            (Mode::NormalInput | Mode::Insert, Key::Enter) => Some(Action::LeaveInput),
            (Mode::Insert, Key::Escape) => Some(Action::ExitInsert),
            _ => None,
        }
    }

    fn ctrl_action(&self, input: &KeyInput) -> Option<Action> {
        if !input.ctrl {
            return None;
        }

        match (self.mode, input.key) {
            (Mode::NormalPage, Key::Char('d')) => Some(Action::ScrollBy(self.page_step)),
            (Mode::NormalPage, Key::Char('u')) => Some(Action::ScrollBy(-self.page_step)),
            (Mode::NormalPage, Key::Char('o')) => Some(Action::HistoryBack),
            _ => None,
        }
    }

    fn shift_action(&self, input: &KeyInput) -> Option<Action> {
        if !input.shift {
            return None;
        }

        match (self.mode, input.key) {
            (Mode::NormalPage, Key::Char('G')) => Some(Action::ScrollToBottom),
            (Mode::NormalPage, Key::Char(':')) => Some(Action::EnterCommandLine),
            _ => None,
        }
    }

    fn apply(&mut self, action: Action, page: &mut dyn Page) {
        match action {
            Action::ScrollBy(dy) => {
                self.save_position(page);
                page.scroll_by(dy);
            }
            Action::ScrollToTop => {
                self.save_position(page);
                page.scroll_to(ScrollTarget::Top, self.behavior());
            }
            Action::ScrollToBottom => {
                self.save_position(page);
                page.scroll_to(ScrollTarget::Bottom, self.behavior());
            }
            Action::JumpBack => {
                if let Some(saved) = self.saved_position {
                    self.save_position(page);
                    page.scroll_to(ScrollTarget::Position(saved), ScrollBehavior::Instant);
                }
            }
            Action::HistoryBack => page.history_back(),
            Action::EnterHints => {
                self.hints.enter(page);
            }
            Action::EnterCommandLine => self.command_line.enter(page),
            Action::EnterInsert => self.set_mode(Mode::Insert),
            Action::ExitInsert => self.set_mode(Mode::NormalInput),
            Action::LeaveInput => self.set_mode(Mode::NormalPage),
            Action::CaretLeft => page.move_caret(-1),
            Action::CaretRight => page.move_caret(1),
            Action::ClearField => page.clear_field(),
            Action::ChordPending => {}
        }
    }

    fn save_position(&mut self, page: &dyn Page) {
        self.saved_position = Some(page.scroll_position());
    }

    fn behavior(&self) -> ScrollBehavior {
        if self.smooth {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Instant
        }
    }

    fn cancel_chords(&mut self) {
        self.top.cancel();
        self.jump_back.cancel();
        self.clear_field.cancel();
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::debug!("mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }
}

fn chord_action(outcome: ChordOutcome, commit: Action) -> Action {
    match outcome {
        ChordOutcome::Committed => commit,
        ChordOutcome::Armed => Action::ChordPending,
    }
}
