pub mod chord;
pub mod command_line;
pub mod dispatcher;
pub mod hints;
pub mod timer;

pub use dispatcher::{Action, Dispatcher};
pub use hints::{HintAllocator, HintEntry, HintOutcome};
