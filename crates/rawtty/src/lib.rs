//! Terminal I/O primitives for Rawtty
//!
//! Puts a terminal into raw input mode and back, measures its column width,
//! and on consoles that deliver UTF-16 code units reassembles them into UTF-8
//! bytes for line-oriented consumers.

pub mod backend;
pub mod capability;
pub mod console;
pub mod console_mode;
pub mod escape;
pub mod options;
pub mod size;

#[cfg(unix)]
pub mod posix;
#[cfg(windows)]
pub mod wincon;

#[cfg(any(unix, windows))]
pub use backend::{native_stdio, NativeTerminal};
pub use backend::TerminalBackend;
pub use capability::{is_unsupported_term, is_unsupported_term_value};
pub use console::{ConsoleReader, Utf16Source};
pub use console_mode::{raw_console_modes, ConsoleSnapshot};
pub use options::{RawModeConfig, RawOptions, ReadPolicy};
pub use size::{get_columns, parse_cursor_report, query_cursor_column};

#[cfg(unix)]
pub use posix::{PosixSnapshot, PosixTerminal};
#[cfg(windows)]
pub use wincon::WindowsConsole;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TermError {
    #[error("Failed to initialize raw mode: {0}")]
    InitFailure(String),

    #[error("Invalid cursor position report: {0}")]
    CursorPosition(String),

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TermError>;
