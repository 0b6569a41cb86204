//! Argument parsing and the subcommands behind the `rawtty` binary

use crate::TerminalGuard;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rawtty::{is_unsupported_term, RawModeConfig, RawOptions, ReadPolicy, TerminalBackend};
use std::io;
use tracing::{debug, info};

/// Ctrl-C and Ctrl-D arrive as plain bytes once signals are off.
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;

#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Rawtty - raw terminal mode, width and input diagnostics")]
pub struct Args {
    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Minimum bytes a raw read waits for (VMIN)
    #[arg(long, default_value = "1")]
    pub min_bytes: u8,

    /// Raw read timeout in tenths of a second (VTIME)
    #[arg(long, default_value = "0")]
    pub timeout_ds: u8,

    /// Keep ^C / ^Z generating signals in raw mode
    #[arg(long)]
    pub keep_signals: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Report TERM support and the terminal width
    Probe,

    /// Enter raw mode and print the bytes of every key pressed
    Keys {
        /// Key that ends the session
        #[arg(long, default_value = "q")]
        quit: char,
    },

    /// Clear the screen
    Clear,

    /// Ring the terminal bell
    Beep,
}

impl Args {
    pub fn raw_mode_config(&self) -> RawModeConfig {
        let options = if self.keep_signals {
            RawOptions::raw().with_signals()
        } else {
            RawOptions::raw()
        };
        let read = ReadPolicy::Configured {
            min_bytes: self.min_bytes,
            timeout_deciseconds: self.timeout_ds,
        };
        RawModeConfig::new(options, read)
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level {
        LogLevel::Trace => tracing::Level::TRACE,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Error => tracing::Level::ERROR,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .init();

    let config = args.raw_mode_config();
    debug!("raw mode config: {:?}", config);
    let mut backend = rawtty::native_stdio(config).context("Failed to open the terminal")?;

    match args.command {
        Command::Probe => {
            let report = probe(backend, is_unsupported_term())?;
            println!("{report}");
        }
        Command::Keys { quit } => {
            if is_unsupported_term() {
                bail!("TERM does not support raw mode");
            }
            let quit = u8::try_from(quit).context("Quit key must be a single-byte character")?;
            echo_keys(backend, quit)?;
        }
        Command::Clear => {
            backend.clear_screen().context("Failed to clear the screen")?;
        }
        Command::Beep => {
            backend.beep().context("Failed to ring the bell")?;
        }
    }

    Ok(())
}

/// Describe the terminal: whether raw mode is usable and how wide it is.
pub fn probe<B: TerminalBackend>(backend: B, unsupported: bool) -> Result<String> {
    if unsupported {
        return Ok("raw mode: unsupported (TERM)".to_string());
    }

    let mut guard = TerminalGuard::new(backend);
    guard.enable_raw_mode().context("Failed to enable raw mode")?;
    let columns = guard
        .backend_mut()
        .columns()
        .context("Failed to measure the terminal width")?;
    guard.disable_raw_mode();

    Ok(format!("raw mode: supported\ncolumns: {columns}"))
}

/// Echo each key of raw input as hex until `quit`, Ctrl-C or Ctrl-D is
/// read, or input ends. Returns the number of keys echoed.
pub fn echo_keys<B: TerminalBackend>(backend: B, quit: u8) -> Result<usize> {
    let mut guard = TerminalGuard::new(backend);
    guard.enable_raw_mode().context("Failed to enable raw mode")?;
    info!("echoing keys, press {:?} to quit", quit as char);

    let backend = guard.backend_mut();
    let mut keys = 0;
    loop {
        let mut key = [0u8; 4];
        let n = read_key(backend, &mut key).context("Failed to read input")?;
        if n == 0 {
            debug!("input ended");
            break;
        }

        let bytes = &key[..n];
        let line = format!("{:02x?} {:?}\r\n", bytes, String::from_utf8_lossy(bytes));
        backend
            .write_output(line.as_bytes())
            .context("Failed to write output")?;
        keys += 1;

        if bytes.iter().any(|&b| b == quit || b == CTRL_C || b == CTRL_D) {
            break;
        }
    }

    Ok(keys)
}

/// Read one character a byte at a time: a UTF-8 lead byte, then as many
/// continuation bytes as it announces. Single-byte reads keep a console
/// backend from waiting on further keys to fill a larger buffer.
fn read_key<B: TerminalBackend + ?Sized>(
    backend: &mut B,
    key: &mut [u8; 4],
) -> io::Result<usize> {
    if backend.read_input(&mut key[..1])? == 0 {
        return Ok(0);
    }

    let len = match key[0] {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    };
    let mut filled = 1;
    while filled < len {
        if backend.read_input(&mut key[filled..filled + 1])? == 0 {
            break;
        }
        filled += 1;
    }
    Ok(filled)
}
