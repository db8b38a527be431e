/// Base interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Normal mode with focus on the page body: scrolling and navigation.
    #[default]
    NormalPage,
    /// Normal mode inside an editable field: caret movement, no typing.
    NormalInput,
    /// Insert mode: keys reach the focused field untouched.
    Insert,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::NormalPage => "NORMAL",
            Mode::NormalInput => "INPUT",
            Mode::Insert => "INSERT",
        }
    }
}

/// Transient sub-mode layered over the base [`Mode`].
///
/// At most one overlay is active; while it is, every key is routed to it and
/// the base mode tables are not consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    /// Link-hint labels are on screen.
    Hints,
    /// Free-text command line (`:`).
    CommandLine,
}

impl Overlay {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Overlay::None => None,
            Overlay::Hints => Some("HINT"),
            Overlay::CommandLine => Some("COMMAND"),
        }
    }
}
