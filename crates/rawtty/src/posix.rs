//! POSIX terminal backend built on termios

use crate::backend::TerminalBackend;
use crate::options::{RawModeConfig, ReadPolicy};
use crate::size::get_columns;
use crate::{Result, TermError};
use nix::errno::Errno;
use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices,
    Termios,
};
use nix::unistd;
use std::io::{self, IsTerminal, Read, Write};
use std::os::fd::{AsRawFd, BorrowedFd};
use tracing::{debug, warn};

/// Terminal attributes captured on entry to raw mode.
#[derive(Debug)]
pub struct PosixSnapshot(Termios);

impl PosixSnapshot {
    /// The captured attribute block.
    pub fn termios(&self) -> &Termios {
        &self.0
    }
}

/// A terminal reached through a pair of file descriptors owned elsewhere.
pub struct PosixTerminal<'fd> {
    input: BorrowedFd<'fd>,
    output: BorrowedFd<'fd>,
    config: RawModeConfig,
}

impl<'fd> PosixTerminal<'fd> {
    pub fn new(input: BorrowedFd<'fd>, output: BorrowedFd<'fd>, config: RawModeConfig) -> Self {
        Self {
            input,
            output,
            config,
        }
    }

    /// Column count from `TIOCGWINSZ`, or `None` when the ioctl fails or
    /// reports zero.
    pub fn window_columns(&self) -> Option<u16> {
        // SAFETY: winsize is plain old data and TIOCGWINSZ only writes into it.
        let mut winsize: libc::winsize = unsafe { std::mem::zeroed() };
        let ret = unsafe {
            libc::ioctl(
                self.output.as_raw_fd(),
                libc::TIOCGWINSZ,
                &mut winsize as *mut libc::winsize,
            )
        };
        if ret < 0 {
            debug!("TIOCGWINSZ failed: {}", io::Error::last_os_error());
            return None;
        }
        Some(winsize.ws_col).filter(|&cols| cols > 0)
    }
}

impl PosixTerminal<'static> {
    /// Terminal on the process' standard input and output.
    pub fn stdio(config: RawModeConfig) -> Self {
        // SAFETY: descriptors 0 and 1 stay open for the life of the process.
        let (input, output) = unsafe {
            (
                BorrowedFd::borrow_raw(libc::STDIN_FILENO),
                BorrowedFd::borrow_raw(libc::STDOUT_FILENO),
            )
        };
        Self::new(input, output, config)
    }
}

/// Turn off in `termios` everything `config` asks to disable.
pub fn apply_raw_config(termios: &mut Termios, config: &RawModeConfig) {
    let options = &config.options;

    let mut input_off = InputFlags::empty();
    if !options.break_interrupt {
        input_off |= InputFlags::BRKINT;
    }
    if !options.translate_cr {
        input_off |= InputFlags::ICRNL;
    }
    if !options.parity_check {
        input_off |= InputFlags::INPCK;
    }
    if !options.strip_eighth_bit {
        input_off |= InputFlags::ISTRIP;
    }
    if !options.flow_control {
        input_off |= InputFlags::IXON;
    }
    termios.input_flags.remove(input_off);

    if !options.output_processing {
        termios.output_flags.remove(OutputFlags::OPOST);
    }

    if options.eight_bit_chars {
        termios.control_flags.remove(ControlFlags::CSIZE);
        termios.control_flags.insert(ControlFlags::CS8);
    }

    let mut local_off = LocalFlags::empty();
    if !options.echo {
        local_off |= LocalFlags::ECHO;
    }
    if !options.canonical {
        local_off |= LocalFlags::ICANON;
    }
    if !options.extended_input {
        local_off |= LocalFlags::IEXTEN;
    }
    if !options.signals {
        local_off |= LocalFlags::ISIG;
    }
    termios.local_flags.remove(local_off);

    if let ReadPolicy::Configured {
        min_bytes,
        timeout_deciseconds,
    } = config.read
    {
        termios.control_chars[SpecialCharacterIndices::VMIN as usize] = min_bytes;
        termios.control_chars[SpecialCharacterIndices::VTIME as usize] = timeout_deciseconds;
    }
}

impl TerminalBackend for PosixTerminal<'_> {
    type Snapshot = PosixSnapshot;

    fn enable_raw_mode(&mut self) -> Result<PosixSnapshot> {
        if !self.input.is_terminal() {
            return Err(TermError::InitFailure("input is not a terminal".into()));
        }

        let original = termios::tcgetattr(self.input)
            .map_err(|e| TermError::InitFailure(format!("tcgetattr failed: {e}")))?;

        let mut raw = original.clone();
        apply_raw_config(&mut raw, &self.config);

        termios::tcsetattr(self.input, SetArg::TCSAFLUSH, &raw)
            .map_err(|e| TermError::InitFailure(format!("tcsetattr failed: {e}")))?;

        debug!("raw mode enabled on fd {}", self.input.as_raw_fd());
        Ok(PosixSnapshot(original))
    }

    fn disable_raw_mode(&mut self, snapshot: PosixSnapshot) {
        match termios::tcsetattr(self.input, SetArg::TCSAFLUSH, &snapshot.0) {
            Ok(()) => debug!("raw mode disabled on fd {}", self.input.as_raw_fd()),
            Err(e) => warn!("failed to restore terminal attributes: {}", e),
        }
    }

    fn columns(&mut self) -> Result<u16> {
        let direct = self.window_columns();
        get_columns(direct, &mut FdStream(self.input), &mut FdStream(self.output))
    }

    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FdStream(self.input).read(buf)
    }

    fn write_output(&mut self, buf: &[u8]) -> io::Result<()> {
        FdStream(self.output).write_all(buf)
    }
}

/// Unbuffered byte I/O on a borrowed descriptor.
struct FdStream<'fd>(BorrowedFd<'fd>);

impl Read for FdStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match unistd::read(self.0.as_raw_fd(), buf) {
                Err(Errno::EINTR) => continue,
                result => return result.map_err(io::Error::from),
            }
        }
    }
}

impl Write for FdStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        unistd::write(self.0, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
