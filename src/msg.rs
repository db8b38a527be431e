use crossterm::event::KeyEvent;
use std::path::PathBuf;

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- File I/O
    FileChanged(PathBuf),

    // -- System
    Tick,
    Quit,
}
