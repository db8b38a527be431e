//! `:` command line: buffer free text, split it into operator and argument
//! on Enter, run the operator against the page.

use regex::Regex;

use crate::model::key::{Key, KeyInput};
use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `search <pattern>`: report every text node matching a regex.
    Search,
    /// `help`: list operators.
    Help,
}

impl Operator {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "search" => Some(Self::Search),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub operator: Operator,
    pub argument: String,
}

impl Command {
    /// Splits at `split_at`, the byte index of the first whitespace. The
    /// separator itself belongs to neither token. Unknown operators yield
    /// `None`.
    pub fn parse(text: &str, split_at: Option<usize>) -> Option<Self> {
        let (operator, argument) = match split_at {
            Some(i) if i < text.len() => {
                let (head, rest) = text.split_at(i);
                let mut rest = rest.chars();
                rest.next();
                (head, rest.as_str())
            }
            _ => (text, ""),
        };

        Operator::parse(operator).map(|operator| Command {
            operator,
            argument: argument.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLineOutcome {
    Pending,
    /// Enter; `None` when the operator was not recognized.
    Submitted(Option<Command>),
    Cancelled,
}

#[derive(Debug, Default)]
pub struct CommandLine {
    active: bool,
    text: String,
    split_at: Option<usize>,
}

impl CommandLine {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn split_at(&self) -> Option<usize> {
        self.split_at
    }

    pub fn enter(&mut self, page: &mut dyn Page) {
        self.reset();
        self.active = true;
        page.show_command_line();
    }

    pub fn feed(&mut self, input: &KeyInput, page: &mut dyn Page) -> CommandLineOutcome {
        match input.key {
            Key::Escape => {
                self.cancel(page);
                CommandLineOutcome::Cancelled
            }
            Key::Enter => {
                let command = Command::parse(&self.text, self.split_at);
                tracing::debug!("command line submitted {:?} -> {command:?}", self.text);
                self.reset();
                page.hide_command_line();
                CommandLineOutcome::Submitted(command)
            }
            Key::Backspace => {
                self.text.pop();
                if let Some(i) = self.split_at
                    && i >= self.text.len()
                {
                    self.split_at = None;
                }
                page.update_command_line(&self.text);
                CommandLineOutcome::Pending
            }
            Key::Char(c) if !input.ctrl => {
                if self.split_at.is_none() && c.is_whitespace() {
                    self.split_at = Some(self.text.len());
                }
                self.text.push(c);
                page.update_command_line(&self.text);
                CommandLineOutcome::Pending
            }
            _ => CommandLineOutcome::Pending,
        }
    }

    pub fn cancel(&mut self, page: &mut dyn Page) {
        if self.active {
            page.hide_command_line();
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.active = false;
        self.text.clear();
        self.split_at = None;
    }
}

const HELP: &[&str] = &[
    "operators:",
    "  search <pattern>  report text matching a regular expression",
    "  help              this list",
];

pub fn execute(command: &Command, page: &mut dyn Page) {
    match command.operator {
        Operator::Search => {
            search(&command.argument, page);
        }
        Operator::Help => {
            for line in HELP {
                page.report(line);
            }
        }
    }
}

/// Reports each matching text node and a summary line. Returns the number
/// of matching nodes.
pub fn search(pattern: &str, page: &mut dyn Page) -> usize {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => {
            tracing::debug!("search pattern {pattern:?} rejected: {err}");
            page.report("search: invalid pattern");
            return 0;
        }
    };

    let matches: Vec<_> = page
        .text_nodes()
        .into_iter()
        .filter(|node| re.is_match(&node.text))
        .collect();

    for node in &matches {
        page.report(&format!("{}: {}", node.row + 1, node.text));
    }
    page.report(&format!(
        "search: {} match(es) for /{pattern}/",
        matches.len()
    ));
    matches.len()
}
