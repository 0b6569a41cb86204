//! Raw-mode configuration
//!
//! `RawOptions` names each terminal behavior this crate switches off when
//! entering raw mode. A `false` field switches the behavior off, `true`
//! leaves it as the terminal had it. `eight_bit_chars` is the exception: it
//! forces 8-bit characters when `true`. Only the
//! POSIX backend translates these into termios flags; the Windows console
//! backend has a fixed raw configuration and ignores them.

/// Terminal behaviors touched when entering raw mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOptions {
    /// Break condition raises an interrupt (`BRKINT`)
    pub break_interrupt: bool,
    /// Carriage return becomes newline on input (`ICRNL`)
    pub translate_cr: bool,
    /// Input parity checking (`INPCK`)
    pub parity_check: bool,
    /// Strip the eighth bit of input bytes (`ISTRIP`)
    pub strip_eighth_bit: bool,
    /// Software flow control on input (`IXON`)
    pub flow_control: bool,
    /// Output post-processing (`OPOST`)
    pub output_processing: bool,
    /// Force 8-bit characters (`CS8`)
    pub eight_bit_chars: bool,
    /// Echo typed characters (`ECHO`)
    pub echo: bool,
    /// Line-buffered canonical input (`ICANON`)
    pub canonical: bool,
    /// Extended input processing (`IEXTEN`)
    pub extended_input: bool,
    /// Signal-generating characters such as ^C and ^Z (`ISIG`)
    pub signals: bool,
}

impl RawOptions {
    /// Fully raw: every behavior disabled, characters forced to 8 bits.
    pub const fn raw() -> Self {
        Self {
            break_interrupt: false,
            translate_cr: false,
            parity_check: false,
            strip_eighth_bit: false,
            flow_control: false,
            output_processing: false,
            eight_bit_chars: true,
            echo: false,
            canonical: false,
            extended_input: false,
            signals: false,
        }
    }

    /// Leaves the terminal's own settings in place.
    pub const fn cooked() -> Self {
        Self {
            break_interrupt: true,
            translate_cr: true,
            parity_check: true,
            strip_eighth_bit: true,
            flow_control: true,
            output_processing: true,
            eight_bit_chars: false,
            echo: true,
            canonical: true,
            extended_input: true,
            signals: true,
        }
    }

    /// Raw, but ^C and ^Z still deliver signals.
    pub const fn with_signals(mut self) -> Self {
        self.signals = true;
        self
    }
}

impl Default for RawOptions {
    fn default() -> Self {
        Self::raw()
    }
}

/// How a raw-mode read waits for input (`VMIN` / `VTIME`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Keep whatever the terminal had configured.
    Untouched,
    /// Block until `min_bytes` are available; with `timeout_deciseconds`
    /// non-zero the timer restarts after each byte.
    Configured { min_bytes: u8, timeout_deciseconds: u8 },
}

impl ReadPolicy {
    /// Block until at least one byte arrives, no timeout.
    pub const fn blocking() -> Self {
        ReadPolicy::Configured {
            min_bytes: 1,
            timeout_deciseconds: 0,
        }
    }

    /// Return after `deciseconds` tenths of a second even if nothing arrived.
    pub const fn timeout(deciseconds: u8) -> Self {
        ReadPolicy::Configured {
            min_bytes: 0,
            timeout_deciseconds: deciseconds,
        }
    }

    pub const fn untouched() -> Self {
        ReadPolicy::Untouched
    }
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self::blocking()
    }
}

/// Everything a backend needs to enter raw mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawModeConfig {
    pub options: RawOptions,
    pub read: ReadPolicy,
}

impl RawModeConfig {
    pub fn new(options: RawOptions, read: ReadPolicy) -> Self {
        Self { options, read }
    }
}
