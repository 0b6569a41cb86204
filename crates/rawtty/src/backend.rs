//! Platform-neutral terminal interface
//!
//! Callers program against [`TerminalBackend`]; [`native_stdio`] picks the
//! implementation for the running platform once, bound to the process'
//! standard input and output.

use crate::escape::{BELL, CLEAR_SCREEN};
use crate::options::RawModeConfig;
use crate::Result;
use std::io;

/// Raw-mode control, width measurement and byte I/O over a terminal whose
/// handles belong to the caller.
pub trait TerminalBackend {
    /// Opaque capture of the attributes in force before raw mode.
    type Snapshot;

    /// Switch to raw mode and return what is needed to switch back.
    fn enable_raw_mode(&mut self) -> Result<Self::Snapshot>;

    /// Put back the attributes captured by [`enable_raw_mode`].
    ///
    /// Restoration never fails from the caller's point of view: it runs on
    /// cleanup paths with nothing left to recover, so errors are logged and
    /// dropped.
    ///
    /// [`enable_raw_mode`]: TerminalBackend::enable_raw_mode
    fn disable_raw_mode(&mut self, snapshot: Self::Snapshot);

    /// Current width in columns.
    fn columns(&mut self) -> Result<u16>;

    /// Read input bytes, UTF-8 encoded.
    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write_output(&mut self, buf: &[u8]) -> io::Result<()>;

    fn clear_screen(&mut self) -> io::Result<()> {
        self.write_output(CLEAR_SCREEN)
    }

    fn beep(&mut self) -> io::Result<()> {
        self.write_output(BELL)
    }
}

impl<B: TerminalBackend + ?Sized> TerminalBackend for &mut B {
    type Snapshot = B::Snapshot;

    fn enable_raw_mode(&mut self) -> Result<Self::Snapshot> {
        (**self).enable_raw_mode()
    }

    fn disable_raw_mode(&mut self, snapshot: Self::Snapshot) {
        (**self).disable_raw_mode(snapshot)
    }

    fn columns(&mut self) -> Result<u16> {
        (**self).columns()
    }

    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_input(buf)
    }

    fn write_output(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write_output(buf)
    }

    fn clear_screen(&mut self) -> io::Result<()> {
        (**self).clear_screen()
    }

    fn beep(&mut self) -> io::Result<()> {
        (**self).beep()
    }
}

#[cfg(unix)]
pub type NativeTerminal = crate::posix::PosixTerminal<'static>;

#[cfg(windows)]
pub type NativeTerminal = crate::wincon::WindowsConsole;

/// The backend for this platform over standard input and output.
#[cfg(any(unix, windows))]
pub fn native_stdio(config: RawModeConfig) -> Result<NativeTerminal> {
    #[cfg(unix)]
    {
        Ok(crate::posix::PosixTerminal::stdio(config))
    }
    #[cfg(windows)]
    {
        crate::wincon::WindowsConsole::stdio(config)
    }
}
