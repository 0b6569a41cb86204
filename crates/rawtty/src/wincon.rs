//! Windows console backend
//!
//! Raw mode here means virtual-terminal input and output processing with
//! both code pages switched to UTF-8. Input arrives from `ReadConsoleW` as
//! UTF-16 and goes through a [`ConsoleReader`] before reaching callers.

use crate::backend::TerminalBackend;
use crate::console::{ConsoleReader, Utf16Source};
use crate::console_mode::{
    enter_raw_console, restore_console, ConsoleModeApi, ConsoleSnapshot, ConsoleStream,
};
use crate::options::RawModeConfig;
use crate::size::get_columns;
use crate::Result;
use std::ffi::c_void;
use std::io::{self, Write};
use tracing::debug;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Storage::FileSystem::WriteFile;
use windows::Win32::System::Console::{
    GetConsoleCP, GetConsoleMode, GetConsoleOutputCP, GetConsoleScreenBufferInfo, GetStdHandle,
    PeekConsoleInputW, ReadConsoleW, SetConsoleCP, SetConsoleMode, SetConsoleOutputCP,
    CONSOLE_MODE, CONSOLE_SCREEN_BUFFER_INFO, INPUT_RECORD, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};

/// A console reached through input and output handles owned elsewhere.
pub struct WindowsConsole {
    input: HANDLE,
    output: HANDLE,
    reader: ConsoleReader<ConsoleUnits>,
}

impl WindowsConsole {
    /// Raw-mode options and read policy do not apply to the console, which
    /// has a single raw configuration; `_config` keeps the constructor in
    /// step with the POSIX backend.
    pub fn new(input: HANDLE, output: HANDLE, _config: RawModeConfig) -> Self {
        Self {
            input,
            output,
            reader: ConsoleReader::new(ConsoleUnits(input)),
        }
    }

    pub fn stdio(config: RawModeConfig) -> Result<Self> {
        let input = unsafe { GetStdHandle(STD_INPUT_HANDLE) }.map_err(io::Error::from)?;
        let output = unsafe { GetStdHandle(STD_OUTPUT_HANDLE) }.map_err(io::Error::from)?;
        Ok(Self::new(input, output, config))
    }

    /// Visible window width from the screen buffer, or `None` when the query
    /// fails or reports no width.
    pub fn window_columns(&self) -> Option<u16> {
        let mut info = CONSOLE_SCREEN_BUFFER_INFO::default();
        if let Err(e) = unsafe { GetConsoleScreenBufferInfo(self.output, &mut info) } {
            debug!("GetConsoleScreenBufferInfo failed: {}", e);
            return None;
        }
        let width = i32::from(info.srWindow.Right) - i32::from(info.srWindow.Left) + 1;
        u16::try_from(width).ok().filter(|&cols| cols > 0)
    }

    fn handles(&self) -> ConsoleHandles {
        ConsoleHandles {
            input: self.input,
            output: self.output,
        }
    }
}

impl TerminalBackend for WindowsConsole {
    type Snapshot = ConsoleSnapshot;

    fn enable_raw_mode(&mut self) -> Result<ConsoleSnapshot> {
        enter_raw_console(&mut self.handles())
    }

    fn disable_raw_mode(&mut self, snapshot: ConsoleSnapshot) {
        restore_console(&mut self.handles(), snapshot)
    }

    fn columns(&mut self) -> Result<u16> {
        let direct = self.window_columns();
        get_columns(direct, &mut self.reader, &mut HandleWriter(self.output))
    }

    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut self.reader, buf)
    }

    fn write_output(&mut self, buf: &[u8]) -> io::Result<()> {
        HandleWriter(self.output).write_all(buf)
    }
}

/// One UTF-16 unit per `ReadConsoleW` call.
struct ConsoleUnits(HANDLE);

impl Utf16Source for ConsoleUnits {
    fn read_unit(&mut self) -> io::Result<Option<u16>> {
        let mut unit = 0u16;
        let mut read = 0u32;
        unsafe {
            ReadConsoleW(
                self.0,
                &mut unit as *mut u16 as *mut c_void,
                1,
                &mut read,
                None,
            )
        }?;
        Ok((read == 1).then_some(unit))
    }
}

struct HandleWriter(HANDLE);

impl Write for HandleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len().min(u32::MAX as usize);
        let mut written = 0u32;
        unsafe { WriteFile(self.0, Some(&buf[..len]), Some(&mut written), None) }?;
        Ok(written as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The real console calls behind [`ConsoleModeApi`].
struct ConsoleHandles {
    input: HANDLE,
    output: HANDLE,
}

impl ConsoleHandles {
    fn handle(&self, stream: ConsoleStream) -> HANDLE {
        match stream {
            ConsoleStream::Input => self.input,
            ConsoleStream::Output => self.output,
        }
    }
}

impl ConsoleModeApi for ConsoleHandles {
    fn peek_input(&mut self) -> io::Result<()> {
        let mut record = [INPUT_RECORD::default()];
        let mut events = 0u32;
        unsafe { PeekConsoleInputW(self.input, &mut record, &mut events) }?;
        Ok(())
    }

    fn mode(&mut self, stream: ConsoleStream) -> io::Result<u32> {
        let mut mode = CONSOLE_MODE(0);
        unsafe { GetConsoleMode(self.handle(stream), &mut mode) }?;
        Ok(mode.0)
    }

    fn set_mode(&mut self, stream: ConsoleStream, mode: u32) -> io::Result<()> {
        unsafe { SetConsoleMode(self.handle(stream), CONSOLE_MODE(mode)) }?;
        Ok(())
    }

    fn code_page(&mut self, stream: ConsoleStream) -> u32 {
        match stream {
            ConsoleStream::Input => unsafe { GetConsoleCP() },
            ConsoleStream::Output => unsafe { GetConsoleOutputCP() },
        }
    }

    fn set_code_page(&mut self, stream: ConsoleStream, code_page: u32) -> io::Result<()> {
        match stream {
            ConsoleStream::Input => unsafe { SetConsoleCP(code_page) }?,
            ConsoleStream::Output => unsafe { SetConsoleOutputCP(code_page) }?,
        }
        Ok(())
    }
}
