//! Console mode bookkeeping for raw mode
//!
//! The mode arithmetic and the order of console calls live here, behind
//! [`ConsoleModeApi`], so they build and run on every platform. The Windows
//! backend supplies the real console calls.

use crate::{Result, TermError};
use std::io;
use tracing::{debug, warn};

pub const ENABLE_VIRTUAL_TERMINAL_INPUT: u32 = 0x0200;
pub const ENABLE_VIRTUAL_TERMINAL_PROCESSING: u32 = 0x0004;
pub const CP_UTF8: u32 = 65001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Input,
    Output,
}

/// The console calls raw-mode entry and exit depend on.
pub trait ConsoleModeApi {
    /// Non-consuming look at pending input events.
    fn peek_input(&mut self) -> io::Result<()>;

    fn mode(&mut self, stream: ConsoleStream) -> io::Result<u32>;

    fn set_mode(&mut self, stream: ConsoleStream, mode: u32) -> io::Result<()>;

    /// Current code page; 0 when it cannot be read.
    fn code_page(&mut self, stream: ConsoleStream) -> u32;

    fn set_code_page(&mut self, stream: ConsoleStream, code_page: u32) -> io::Result<()>;
}

/// Console modes and code pages captured on entry to raw mode.
#[derive(Debug, PartialEq, Eq)]
pub struct ConsoleSnapshot {
    input_mode: u32,
    output_mode: u32,
    input_code_page: u32,
    output_code_page: u32,
}

impl ConsoleSnapshot {
    pub fn input_mode(&self) -> u32 {
        self.input_mode
    }

    pub fn output_mode(&self) -> u32 {
        self.output_mode
    }

    pub fn input_code_page(&self) -> u32 {
        self.input_code_page
    }

    pub fn output_code_page(&self) -> u32 {
        self.output_code_page
    }
}

/// Raw modes derived from the current ones. The input mode is replaced
/// outright; the output mode keeps its bits and gains VT processing.
pub fn raw_console_modes(_input: u32, output: u32) -> (u32, u32) {
    (ENABLE_VIRTUAL_TERMINAL_INPUT, output | ENABLE_VIRTUAL_TERMINAL_PROCESSING)
}

/// Switch the console to raw mode and return what restores it.
pub fn enter_raw_console<A: ConsoleModeApi + ?Sized>(api: &mut A) -> Result<ConsoleSnapshot> {
    api.peek_input()
        .map_err(|e| TermError::InitFailure(format!("console input not readable: {e}")))?;

    let input_mode = api
        .mode(ConsoleStream::Input)
        .map_err(|e| TermError::InitFailure(format!("GetConsoleMode(input) failed: {e}")))?;
    let output_mode = api
        .mode(ConsoleStream::Output)
        .map_err(|e| TermError::InitFailure(format!("GetConsoleMode(output) failed: {e}")))?;
    let snapshot = ConsoleSnapshot {
        input_mode,
        output_mode,
        input_code_page: api.code_page(ConsoleStream::Input),
        output_code_page: api.code_page(ConsoleStream::Output),
    };

    let (raw_input, raw_output) = raw_console_modes(input_mode, output_mode);
    api.set_mode(ConsoleStream::Input, raw_input)
        .map_err(|e| TermError::InitFailure(format!("SetConsoleMode(input) failed: {e}")))?;

    if let Err(e) = api.set_mode(ConsoleStream::Output, raw_output) {
        if let Err(rollback) = api.set_mode(ConsoleStream::Input, input_mode) {
            warn!("failed to roll back console input mode: {}", rollback);
        }
        return Err(TermError::InitFailure(format!("SetConsoleMode(output) failed: {e}")));
    }

    for stream in [ConsoleStream::Input, ConsoleStream::Output] {
        if let Err(e) = api.set_code_page(stream, CP_UTF8) {
            warn!("setting {:?} code page to UTF-8 failed: {}", stream, e);
        }
    }

    debug!(
        "raw mode enabled, saved modes input=0x{:08X} output=0x{:08X}",
        input_mode, output_mode
    );
    Ok(snapshot)
}

/// Put back everything [`enter_raw_console`] changed. Failures are logged.
pub fn restore_console<A: ConsoleModeApi + ?Sized>(api: &mut A, snapshot: ConsoleSnapshot) {
    let modes = [
        (ConsoleStream::Input, snapshot.input_mode),
        (ConsoleStream::Output, snapshot.output_mode),
    ];
    for (stream, mode) in modes {
        if let Err(e) = api.set_mode(stream, mode) {
            warn!("failed to restore console {:?} mode: {}", stream, e);
        }
    }

    let code_pages = [
        (ConsoleStream::Input, snapshot.input_code_page),
        (ConsoleStream::Output, snapshot.output_code_page),
    ];
    for (stream, code_page) in code_pages {
        if code_page == 0 {
            continue;
        }
        if let Err(e) = api.set_code_page(stream, code_page) {
            warn!("failed to restore console {:?} code page: {}", stream, e);
        }
    }
    debug!("raw mode disabled");
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENABLE_PROCESSED_OUTPUT: u32 = 0x0001;
    const ENABLE_WRAP_AT_EOL_OUTPUT: u32 = 0x0002;
    const ENABLE_LINE_INPUT: u32 = 0x0002;
    const ENABLE_ECHO_INPUT: u32 = 0x0004;

    struct FakeConsole {
        modes: [u32; 2],
        code_pages: [u32; 2],
        peek_fails: bool,
        failing_set_mode: Option<ConsoleStream>,
        failing_set_mode_remaining: usize,
    }

    impl FakeConsole {
        fn new(input_mode: u32, output_mode: u32) -> Self {
            Self {
                modes: [input_mode, output_mode],
                code_pages: [437, 850],
                peek_fails: false,
                failing_set_mode: None,
                failing_set_mode_remaining: 0,
            }
        }

        fn index(stream: ConsoleStream) -> usize {
            match stream {
                ConsoleStream::Input => 0,
                ConsoleStream::Output => 1,
            }
        }
    }

    impl ConsoleModeApi for FakeConsole {
        fn peek_input(&mut self) -> io::Result<()> {
            if self.peek_fails {
                return Err(io::Error::new(io::ErrorKind::Other, "not a console"));
            }
            Ok(())
        }

        fn mode(&mut self, stream: ConsoleStream) -> io::Result<u32> {
            Ok(self.modes[Self::index(stream)])
        }

        fn set_mode(&mut self, stream: ConsoleStream, mode: u32) -> io::Result<()> {
            if self.failing_set_mode == Some(stream) && self.failing_set_mode_remaining > 0 {
                self.failing_set_mode_remaining -= 1;
                return Err(io::Error::new(io::ErrorKind::Other, "mode rejected"));
            }
            self.modes[Self::index(stream)] = mode;
            Ok(())
        }

        fn code_page(&mut self, stream: ConsoleStream) -> u32 {
            self.code_pages[Self::index(stream)]
        }

        fn set_code_page(&mut self, stream: ConsoleStream, code_page: u32) -> io::Result<()> {
            self.code_pages[Self::index(stream)] = code_page;
            Ok(())
        }
    }

    #[test]
    fn input_mode_is_replaced() {
        let (input, _) = raw_console_modes(ENABLE_LINE_INPUT | ENABLE_ECHO_INPUT, 0);
        assert_eq!(input, ENABLE_VIRTUAL_TERMINAL_INPUT);
    }

    #[test]
    fn output_mode_keeps_other_bits() {
        let original = ENABLE_PROCESSED_OUTPUT | ENABLE_WRAP_AT_EOL_OUTPUT;
        let (_, output) = raw_console_modes(0, original);
        assert_eq!(output, original | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
    }

    #[test]
    fn enter_sets_raw_modes_and_utf8() {
        let mut console = FakeConsole::new(ENABLE_LINE_INPUT, ENABLE_PROCESSED_OUTPUT);

        let snapshot = enter_raw_console(&mut console).unwrap();

        assert_eq!(snapshot.input_mode(), ENABLE_LINE_INPUT);
        assert_eq!(snapshot.output_mode(), ENABLE_PROCESSED_OUTPUT);
        assert_eq!(snapshot.input_code_page(), 437);
        assert_eq!(snapshot.output_code_page(), 850);
        assert_eq!(
            console.modes,
            [
                ENABLE_VIRTUAL_TERMINAL_INPUT,
                ENABLE_PROCESSED_OUTPUT | ENABLE_VIRTUAL_TERMINAL_PROCESSING
            ]
        );
        assert_eq!(console.code_pages, [CP_UTF8, CP_UTF8]);
    }

    #[test]
    fn restore_round_trips_modes_and_code_pages() {
        let mut console = FakeConsole::new(ENABLE_LINE_INPUT | ENABLE_ECHO_INPUT, 0x0007);

        let snapshot = enter_raw_console(&mut console).unwrap();
        restore_console(&mut console, snapshot);

        assert_eq!(console.modes, [ENABLE_LINE_INPUT | ENABLE_ECHO_INPUT, 0x0007]);
        assert_eq!(console.code_pages, [437, 850]);
    }

    #[test]
    fn unreadable_code_page_is_not_restored() {
        let mut console = FakeConsole::new(0, 0);
        console.code_pages = [0, 850];

        let snapshot = enter_raw_console(&mut console).unwrap();
        restore_console(&mut console, snapshot);

        assert_eq!(console.code_pages, [CP_UTF8, 850]);
    }

    #[test]
    fn failed_peek_is_init_failure() {
        let mut console = FakeConsole::new(ENABLE_LINE_INPUT, 0);
        console.peek_fails = true;

        assert!(matches!(enter_raw_console(&mut console), Err(TermError::InitFailure(_))));
        assert_eq!(console.modes, [ENABLE_LINE_INPUT, 0]);
    }

    #[test]
    fn failed_output_mode_rolls_back_input() {
        let mut console = FakeConsole::new(ENABLE_LINE_INPUT, ENABLE_PROCESSED_OUTPUT);
        console.failing_set_mode = Some(ConsoleStream::Output);
        console.failing_set_mode_remaining = 1;

        assert!(matches!(enter_raw_console(&mut console), Err(TermError::InitFailure(_))));
        assert_eq!(console.modes, [ENABLE_LINE_INPUT, ENABLE_PROCESSED_OUTPUT]);
        assert_eq!(console.code_pages, [437, 850]);
    }

    #[test]
    fn restore_continues_past_failures() {
        let mut console = FakeConsole::new(ENABLE_LINE_INPUT, ENABLE_PROCESSED_OUTPUT);
        let snapshot = enter_raw_console(&mut console).unwrap();
        console.failing_set_mode = Some(ConsoleStream::Input);
        console.failing_set_mode_remaining = 1;

        restore_console(&mut console, snapshot);

        assert_eq!(console.modes[0], ENABLE_VIRTUAL_TERMINAL_INPUT);
        assert_eq!(console.modes[1], ENABLE_PROCESSED_OUTPUT);
        assert_eq!(console.code_pages, [437, 850]);
    }
}
