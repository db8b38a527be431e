//! End-to-end keyboard sessions against a real `TerminalPage`, driven the way
//! the terminal host drives them but on a virtual clock.

use std::fs;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use pagekeys::model::geometry::ElementId;
use pagekeys::model::key::Key;
use pagekeys::page::Page;
use pagekeys::terminal_page::{Location, PageEvent};
use pagekeys::{AppConfig, Dispatcher, KeyInput, Mode, Overlay, TerminalPage};

const STEP: Duration = Duration::from_millis(20);

struct Session {
    dispatcher: Dispatcher,
    page: TerminalPage,
    now: Instant,
}

impl Session {
    fn new(config: &AppConfig, page: TerminalPage) -> Self {
        Self {
            dispatcher: Dispatcher::new(config, StdRng::seed_from_u64(42)),
            page,
            now: Instant::now(),
        }
    }

    fn markdown(text: &str) -> Self {
        let mut page = TerminalPage::from_markdown(text);
        page.set_viewport_height(10);
        Self::new(&AppConfig::default(), page)
    }

    /// One keydown; returns whether the dispatcher claimed it.
    fn press(&mut self, input: KeyInput) -> bool {
        self.now += STEP;
        let claimed = self.dispatcher.dispatch(&input, self.now, &mut self.page);
        if !claimed {
            self.page.handle_native(&input);
        }
        self.forward();
        claimed
    }

    fn keys(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyInput::char(c));
        }
    }

    fn wait(&mut self, duration: Duration) {
        self.now += duration;
        self.dispatcher.tick(self.now, &mut self.page);
        self.forward();
    }

    fn settle(&mut self) {
        while self.page.advance_animation() {}
    }

    fn forward(&mut self) {
        for event in self.page.take_events() {
            match event {
                PageEvent::Focus(_) => self.dispatcher.focus(),
                PageEvent::Blur(_) => self.dispatcher.blur(),
                PageEvent::Navigated => self.dispatcher.navigated(&mut self.page),
            }
        }
    }

    fn scroll_y(&self) -> i32 {
        self.page.scroll_position().y
    }
}

fn long_text(paragraphs: usize) -> String {
    (0..paragraphs).map(|i| format!("paragraph {i}\n\n")).collect()
}

#[test]
fn typing_a_hint_code_follows_only_that_link() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join(format!("{name}.md")), format!("# {name}\n")).unwrap();
    }
    let index = dir.path().join("index.md");
    fs::write(&index, "- [a](a.md)\n- [b](b.md)\n- [c](c.md)\n").unwrap();

    let mut session = Session::new(&AppConfig::default(), TerminalPage::open(&index).unwrap());
    assert!(session.press(KeyInput::char('f')));
    assert_eq!(session.dispatcher.overlay(), Overlay::Hints);
    assert_eq!(session.page.labels().count(), 3);

    let code = session
        .dispatcher
        .hints()
        .code_for(ElementId(1))
        .unwrap()
        .to_string();
    session.keys(&code);
    assert_eq!(session.page.location(), &Location::File(index.clone()));

    session.wait(Duration::from_millis(600));
    assert_eq!(
        session.page.location(),
        &Location::File(dir.path().join("b.md"))
    );
    assert_eq!(session.page.labels().count(), 0);
    assert_eq!(session.dispatcher.overlay(), Overlay::None);
    assert_eq!(session.page.history_len(), 1);
}

#[test]
fn welcome_page_first_link_opens_key_reference() {
    let mut session = Session::new(
        &AppConfig::default(),
        TerminalPage::builtin("welcome.md").unwrap(),
    );
    session.press(KeyInput::char('f'));
    let code = session
        .dispatcher
        .hints()
        .code_for(ElementId(0))
        .unwrap()
        .to_string();
    session.keys(&code);
    session.wait(Duration::from_millis(600));

    assert_eq!(session.page.location(), &Location::Builtin("keys.md"));
    assert_eq!(session.page.console().count(), 0);
    assert_eq!(session.page.hostname(), "localhost");
}

#[test]
fn unmatched_hint_input_keeps_labels_up() {
    let mut session = Session::markdown("[one](1.md) [two](2.md)");
    session.press(KeyInput::char('f'));
    session.keys("zzzzz");
    session.wait(Duration::from_millis(600));

    assert_eq!(session.dispatcher.overlay(), Overlay::Hints);
    assert_eq!(session.page.labels().count(), 2);

    assert!(session.press(KeyInput::new(Key::Escape)));
    assert_eq!(session.page.labels().count(), 0);
    assert_eq!(session.dispatcher.overlay(), Overlay::None);
}

#[test]
fn j_five_times_scrolls_five_steps() {
    let mut session = Session::markdown(&long_text(50));
    for _ in 0..5 {
        assert!(session.press(KeyInput::char('j')));
    }
    assert_eq!(session.scroll_y(), 15);
    assert_eq!(session.dispatcher.saved_position().map(|p| p.y), Some(12));

    session.press(KeyInput::char('k'));
    assert_eq!(session.scroll_y(), 12);
}

#[test]
fn gg_and_shift_g_jump_smoothly() {
    let mut session = Session::markdown(&long_text(50));
    let max = session.page.max_scroll();

    session.press(KeyInput::char('G'));
    session.settle();
    assert_eq!(session.scroll_y(), max);

    session.keys("gg");
    session.settle();
    assert_eq!(session.scroll_y(), 0);

    session.keys(",,");
    assert_eq!(session.scroll_y(), max);
}

#[test]
fn slow_second_g_does_nothing() {
    let mut session = Session::markdown(&long_text(50));
    session.press(KeyInput::ctrl('d'));
    assert_eq!(session.scroll_y(), 20);

    session.press(KeyInput::char('g'));
    session.wait(Duration::from_millis(700));
    session.press(KeyInput::char('g'));
    session.settle();
    assert_eq!(session.scroll_y(), 20);
    assert_eq!(session.dispatcher.pending_chord(), Some('g'));
}

#[test]
fn search_command_reports_to_console() {
    let mut session = Session::markdown("food court\n\nnothing here\n\na foo b\n");
    assert!(session.press(KeyInput::char(':')));
    assert_eq!(session.page.command_line(), Some(""));

    session.keys("search foo");
    assert_eq!(session.page.command_line(), Some("search foo"));
    assert!(session.press(KeyInput::new(Key::Enter)));

    assert_eq!(session.page.command_line(), None);
    assert_eq!(session.dispatcher.overlay(), Overlay::None);
    let console: Vec<_> = session.page.console().cloned().collect();
    assert!(console.iter().any(|line| line.ends_with(": food court")));
    assert!(console.iter().any(|line| line.ends_with(": a foo b")));
    assert_eq!(
        console.last().map(String::as_str),
        Some("search: 2 match(es) for /foo/")
    );
}

#[test]
fn field_editing_walks_through_every_mode() {
    let mut session = Session::markdown("Query: `input:q`\n");

    assert!(!session.press(KeyInput::new(Key::Tab)));
    assert_eq!(session.dispatcher.mode(), Mode::NormalInput);

    // Unbound keys are swallowed until Insert.
    assert!(session.press(KeyInput::char('x')));
    assert_eq!(session.page.focused_field().map(|f| f.value.as_str()), Some(""));

    session.press(KeyInput::char('i'));
    assert_eq!(session.dispatcher.mode(), Mode::Insert);
    assert!(!session.press(KeyInput::char('h')));
    assert!(!session.press(KeyInput::char('i')));
    assert_eq!(session.page.focused_field().map(|f| f.value.as_str()), Some("hi"));

    session.press(KeyInput::new(Key::Escape));
    assert_eq!(session.dispatcher.mode(), Mode::NormalInput);
    session.press(KeyInput::char('h'));
    assert_eq!(session.page.focused_field().map(|f| f.caret), Some(1));

    session.keys("dd");
    assert_eq!(session.page.focused_field().map(|f| f.value.as_str()), Some(""));

    assert!(!session.press(KeyInput::new(Key::Enter)));
    assert_eq!(session.dispatcher.mode(), Mode::NormalPage);
    assert!(
        session
            .page
            .console()
            .any(|line| line.starts_with("submitted q="))
    );
}

#[test]
fn suppressed_host_gets_every_key() {
    let mut session = Session::markdown("[gh](https://github.com/rust-lang)");
    session.press(KeyInput::char('f'));
    let code = session
        .dispatcher
        .hints()
        .code_for(ElementId(0))
        .unwrap()
        .to_string();
    session.keys(&code);
    session.wait(Duration::from_millis(600));
    assert_eq!(session.page.hostname(), "github.com");

    assert!(!session.press(KeyInput::char('f')));
    assert!(!session.press(KeyInput::ctrl('o')));
    assert_eq!(session.page.labels().count(), 0);

    let mut alt_left = KeyInput::new(Key::Left);
    alt_left.alt = true;
    assert!(!session.press(alt_left));
    assert!(matches!(session.page.location(), Location::Inline(_)));
    assert_eq!(session.page.links().len(), 1);
}

#[test]
fn navigation_drops_transient_state() {
    let dir = tempfile::tempdir().unwrap();
    let index = dir.path().join("index.md");
    fs::write(&index, format!("{}[next](next.md)\n", long_text(30))).unwrap();
    fs::write(dir.path().join("next.md"), "# next\n").unwrap();

    let mut session = Session::new(&AppConfig::default(), TerminalPage::open(&index).unwrap());
    session.page.set_viewport_height(10);
    session.press(KeyInput::char('j'));
    session.press(KeyInput::char('g'));
    assert_eq!(session.dispatcher.pending_chord(), Some('g'));

    session.page.activate(ElementId(0));
    session.forward();
    assert_eq!(session.dispatcher.pending_chord(), None);
    assert_eq!(session.dispatcher.saved_position(), None);
    assert_eq!(session.scroll_y(), 0);

    assert!(session.press(KeyInput::ctrl('o')));
    assert_eq!(session.page.location(), &Location::File(index));
}

#[test]
fn reload_keeps_scroll_and_picks_up_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.md");
    fs::write(&path, long_text(30)).unwrap();

    let mut session = Session::new(&AppConfig::default(), TerminalPage::open(&path).unwrap());
    session.page.set_viewport_height(10);
    session.keys("jj");

    fs::write(&path, format!("# edited\n\n{}", long_text(30))).unwrap();
    session.page.reload();
    session.forward();

    assert_eq!(session.page.document().title.as_deref(), Some("edited"));
    assert_eq!(session.scroll_y(), 6);
    assert_eq!(session.page.history_len(), 0);
}

#[test]
fn config_file_changes_bindings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[scroll]\nstep = 7\nsmooth = false\n\n[sites]\nsuppressed = []\n",
    )
    .unwrap();
    let config = AppConfig::load(Some(&path)).unwrap();

    let mut page = TerminalPage::from_markdown(&long_text(50));
    page.set_viewport_height(10);
    let mut session = Session::new(&config, page);

    session.press(KeyInput::char('j'));
    assert_eq!(session.scroll_y(), 7);
    session.press(KeyInput::char('G'));
    assert_eq!(session.scroll_y(), session.page.max_scroll());
}
