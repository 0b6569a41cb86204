//! Command-line driver for the rawtty primitives

pub mod app;
pub mod terminal_guard;

pub use terminal_guard::TerminalGuard;
