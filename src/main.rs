mod app;
mod msg;

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use app::App;
use msg::Msg;
use pagekeys::AppConfig;

const USAGE: &str = "usage: pagekeys [--config <file>] [page.md]";

struct Args {
    page: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        page: None,
        config: None,
    };
    let mut raw = std::env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = raw.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown flag {flag}\n{USAGE}"),
            _ if args.page.is_some() => bail!("only one page can be opened\n{USAGE}"),
            _ => args.page = Some(PathBuf::from(&arg)),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = AppConfig::load(args.config.as_deref())?;

    // Initialize logging to file (never stdout)
    let log_dir = directories::ProjectDirs::from("", "", "pagekeys")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("/tmp"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "pagekeys.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .init();

    tracing::info!("pagekeys starting");

    let app = App::new(config, args.page.as_deref())?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("pagekeys error: {e:?}");
    }

    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();

    // Input thread: reads terminal events and forwards as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            match event::read() {
                Ok(event) => {
                    let msg = match event {
                        Event::Key(k) => Msg::Key(k),
                        Event::Resize(w, h) => Msg::Resize(w, h),
                        _ => continue,
                    };
                    if tx_input.send(msg).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!("terminal input failed: {err}");
                    let _ = tx_input.send(Msg::Quit);
                    break;
                }
            }
        }
    });

    // Tick thread: 50ms periodic tick drives chord and hint expiry
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(Duration::from_millis(50));
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    // File watcher thread: emits FileChanged for the current page's directory.
    let (watch_tx, watch_rx) = mpsc::channel::<PathBuf>();
    spawn_file_watcher(watch_rx, tx.clone());
    app.follow_with(watch_tx);

    terminal.draw(|f| app.view(f))?;

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        app.update(first)?;

        while let Ok(msg) = rx.try_recv() {
            app.update(msg)?;
        }

        if app.should_quit {
            tracing::info!("pagekeys exiting");
            break;
        }

        terminal.draw(|f| app.view(f))?;
    }

    Ok(())
}

fn spawn_file_watcher(dirs: mpsc::Receiver<PathBuf>, tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let tx_watch = tx.clone();
        let mut watcher: RecommendedWatcher =
            match notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        for path in event.paths {
                            if tx_watch.send(Msg::FileChanged(path)).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!("file watcher error: {err}");
                }
            }) {
                Ok(w) => w,
                Err(err) => {
                    tracing::warn!("failed to initialize file watcher: {err}");
                    return;
                }
            };

        // One directory at a time; ends when the app drops its sender.
        let mut current: Option<PathBuf> = None;
        for dir in dirs {
            if let Some(previous) = current.take()
                && let Err(err) = watcher.unwatch(&previous)
            {
                tracing::debug!("failed to unwatch {}: {err}", previous.display());
            }
            match watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    tracing::debug!("watching {}", dir.display());
                    current = Some(dir);
                }
                Err(err) => tracing::warn!("failed to watch {}: {err}", dir.display()),
            }
        }
    });
}
