//! Link-hint mode: label every visible link with a short code and activate
//! the one whose code is typed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::rngs::StdRng;

use super::timer::Deadline;
use crate::model::geometry::{self, ElementId};
use crate::model::key::{Key, KeyInput};
use crate::page::{LabelId, Page};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintEntry {
    pub code: String,
    pub label: LabelId,
    pub target: ElementId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintOutcome {
    /// Key buffered; waiting for more input or expiry.
    Pending,
    /// Escape; labels removed without activation.
    Cancelled,
    /// Buffer matched a live code; the target was clicked and hints removed.
    Activated(ElementId),
    /// Buffer matched nothing and was dropped; hints stay up.
    Discarded,
}

pub struct HintAllocator {
    alphabet: Vec<char>,
    timeout: Duration,
    rng: StdRng,
    entries: Vec<HintEntry>,
    by_code: HashMap<String, usize>,
    choice: String,
    deadline: Deadline,
    active: bool,
}

impl HintAllocator {
    /// An empty alphabet falls back to `a`–`z`.
    pub fn new(alphabet: Vec<char>, timeout: Duration, rng: StdRng) -> Self {
        let alphabet = if alphabet.is_empty() {
            ('a'..='z').collect()
        } else {
            alphabet
        };

        Self {
            alphabet,
            timeout,
            rng,
            entries: Vec::new(),
            by_code: HashMap::new(),
            choice: String::new(),
            deadline: Deadline::default(),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn entries(&self) -> &[HintEntry] {
        &self.entries
    }

    pub fn code_for(&self, target: ElementId) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.target == target)
            .map(|entry| entry.code.as_str())
    }

    /// Characters typed since the last expiry.
    pub fn choice(&self) -> &str {
        &self.choice
    }

    /// Labels every visible link. Returns the number of hints created.
    pub fn enter(&mut self, page: &mut dyn Page) -> usize {
        if self.active {
            self.exit(page);
        }
        self.active = true;

        let scroll = page.scroll_position();
        for element in geometry::visible(page.links()) {
            let code = self.unique_code();
            let label = page.render_label(&code, element.rect.anchor(scroll));
            self.by_code.insert(code.clone(), self.entries.len());
            self.entries.push(HintEntry {
                code,
                label,
                target: element.id,
            });
        }

        tracing::debug!("hint mode entered with {} labels", self.entries.len());
        self.entries.len()
    }

    pub fn feed(&mut self, input: &KeyInput, now: Instant, page: &mut dyn Page) -> HintOutcome {
        match input.key {
            Key::Escape => {
                self.exit(page);
                HintOutcome::Cancelled
            }
            Key::Char(c) if !input.ctrl => {
                self.choice.push(c);
                self.deadline.arm(now, self.timeout);
                HintOutcome::Pending
            }
            _ => HintOutcome::Pending,
        }
    }

    /// Resolves the buffer once its expiry has passed. `None` while nothing
    /// is due.
    pub fn tick(&mut self, now: Instant, page: &mut dyn Page) -> Option<HintOutcome> {
        if !self.active || !self.deadline.fire(now) {
            return None;
        }

        let choice = std::mem::take(&mut self.choice);
        match self.by_code.get(&choice).map(|&i| self.entries[i].target) {
            Some(target) => {
                tracing::debug!("hint {choice:?} activates {target:?}");
                self.exit(page);
                page.activate(target);
                Some(HintOutcome::Activated(target))
            }
            None => {
                tracing::trace!("hint input {choice:?} matched nothing");
                Some(HintOutcome::Discarded)
            }
        }
    }

    /// Removes every label and forgets all bindings.
    pub fn exit(&mut self, page: &mut dyn Page) {
        for entry in self.entries.drain(..) {
            page.remove_label(entry.label);
        }
        self.by_code.clear();
        self.choice.clear();
        self.deadline.cancel();
        self.active = false;
    }

    /// Appends random characters until the code is not live. Codes only
    /// lengthen when every shorter candidate drawn so far is taken.
    fn unique_code(&mut self) -> String {
        let mut code = String::new();
        loop {
            let c = self.alphabet[self.rng.gen_range(0..self.alphabet.len())];
            code.push(c);
            if !self.by_code.contains_key(&code) {
                return code;
            }
        }
    }
}
