//! In-memory stand-ins for terminals and consoles

use rawtty::{
    get_columns, ConsoleReader, RawOptions, TermError, TerminalBackend, Utf16Source,
};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use tracing::warn;

/// A byte terminal that answers from a fixed script and records everything
/// written to it.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl ScriptedTerminal {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            output: Vec::new(),
        }
    }

    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl Read for ScriptedTerminal {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for ScriptedTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A UTF-16 console handing out one scripted result per native read.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    reads: VecDeque<io::Result<Option<u16>>>,
    calls: usize,
    interactive: bool,
}

impl ScriptedConsole {
    pub fn new(units: &[u16]) -> Self {
        let mut console = Self::default();
        for &unit in units {
            console.push_unit(unit);
        }
        console
    }

    /// Like [`ScriptedConsole::new`], but reading past the script panics,
    /// the way a real console would block waiting for another key.
    pub fn interactive(units: &[u16]) -> Self {
        let mut console = Self::new(units);
        console.interactive = true;
        console
    }

    pub fn push_unit(&mut self, unit: u16) {
        self.reads.push_back(Ok(Some(unit)));
    }

    /// Next read returns no data.
    pub fn push_empty(&mut self) {
        self.reads.push_back(Ok(None));
    }

    /// Next read fails.
    pub fn push_error(&mut self, kind: io::ErrorKind) {
        self.reads
            .push_back(Err(io::Error::new(kind, "scripted console failure")));
    }

    /// Number of native reads performed so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Utf16Source for ScriptedConsole {
    fn read_unit(&mut self) -> io::Result<Option<u16>> {
        self.calls += 1;
        match self.reads.pop_front() {
            Some(read) => read,
            None if self.interactive => {
                panic!("native read #{} would block waiting for a key", self.calls)
            }
            None => Ok(None),
        }
    }
}

/// A backend whose "terminal attributes" are a [`RawOptions`] value, so
/// raw-mode round trips can be checked without a real device.
#[derive(Debug)]
pub struct ScriptedBackend {
    pub attributes: RawOptions,
    pub direct_columns: Option<u16>,
    pub terminal: ScriptedTerminal,
    pub fail_enable: bool,
    pub fail_restore: bool,
    pub restores: usize,
}

impl ScriptedBackend {
    pub fn new(direct_columns: Option<u16>, input: &[u8]) -> Self {
        Self {
            attributes: RawOptions::cooked(),
            direct_columns,
            terminal: ScriptedTerminal::new(input),
            fail_enable: false,
            fail_restore: false,
            restores: 0,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.attributes == RawOptions::raw()
    }
}

impl TerminalBackend for ScriptedBackend {
    type Snapshot = RawOptions;

    fn enable_raw_mode(&mut self) -> rawtty::Result<RawOptions> {
        if self.fail_enable {
            return Err(TermError::InitFailure("scripted terminal refused".into()));
        }
        let original = self.attributes;
        self.attributes = RawOptions::raw();
        Ok(original)
    }

    fn disable_raw_mode(&mut self, snapshot: RawOptions) {
        self.restores += 1;
        if self.fail_restore {
            warn!("scripted restore failure");
            return;
        }
        self.attributes = snapshot;
    }

    fn columns(&mut self) -> rawtty::Result<u16> {
        let terminal = &mut self.terminal;
        get_columns(self.direct_columns, &mut terminal.input, &mut terminal.output)
    }

    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.terminal.read(buf)
    }

    fn write_output(&mut self, buf: &[u8]) -> io::Result<()> {
        self.terminal.write_all(buf)
    }
}

/// A console-style backend: input goes through a [`ConsoleReader`] over a
/// [`ScriptedConsole`], output is captured.
pub struct ConsoleBackend {
    reader: ConsoleReader<ScriptedConsole>,
    output: Vec<u8>,
    raw: bool,
}

impl ConsoleBackend {
    pub fn new(console: ScriptedConsole) -> Self {
        Self {
            reader: ConsoleReader::new(console),
            output: Vec::new(),
            raw: false,
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn native_reads(&self) -> usize {
        self.reader.get_ref().calls()
    }
}

impl TerminalBackend for ConsoleBackend {
    type Snapshot = bool;

    fn enable_raw_mode(&mut self) -> rawtty::Result<bool> {
        let was_raw = self.raw;
        self.raw = true;
        Ok(was_raw)
    }

    fn disable_raw_mode(&mut self, snapshot: bool) {
        self.raw = snapshot;
    }

    fn columns(&mut self) -> rawtty::Result<u16> {
        get_columns(None, &mut self.reader, &mut self.output)
    }

    fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }

    fn write_output(&mut self, buf: &[u8]) -> io::Result<()> {
        self.output.write_all(buf)
    }
}
