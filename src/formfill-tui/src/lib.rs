//! Terminal rendering surface for formfill.
//!
//! Left column: instruction editor and run log. Right column: the mock form,
//! filled in live by the session with the active row highlighted.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod app;
pub mod input;
pub mod runner;
pub mod terminal;
pub mod ui;

pub use app::App;
pub use input::{Action, EditOp, InstructionInput, PRESETS, map_key};
pub use runner::run;
pub use terminal::{FormfillTerminal, TerminalOptions, restore_terminal};
