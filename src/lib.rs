//! Modal, vim-style keyboard navigation for pages.
//!
//! [`Dispatcher`] owns the interaction mode and turns keydowns into page
//! actions: scrolling, double-press chords (`gg`, `,,`), link hints and a
//! `:` command line. The page itself sits behind the [`Page`] trait;
//! [`TerminalPage`] renders Markdown documents in a terminal.

pub mod engine;
pub mod error;
pub mod model;
pub mod page;
pub mod terminal_page;

pub use engine::Dispatcher;
pub use error::{Error, Result};
pub use model::config::AppConfig;
pub use model::key::KeyInput;
pub use model::mode::{Mode, Overlay};
pub use page::Page;
pub use terminal_page::TerminalPage;
