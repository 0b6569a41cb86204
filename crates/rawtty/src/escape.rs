//! Escape sequences written to the terminal

/// Device status report: ask for the cursor position.
pub const CURSOR_POSITION_REQUEST: &[u8] = b"\x1b[6n";

/// Move right by 999 columns; terminals clamp at the last column.
pub const CURSOR_FAR_RIGHT: &[u8] = b"\x1b[999C";

/// Home the cursor, then erase the whole screen.
pub const CLEAR_SCREEN: &[u8] = b"\x1b[H\x1b[2J";

pub const BELL: &[u8] = b"\x07";

/// Prefix of every cursor position report.
pub const CSI: &[u8] = b"\x1b[";

/// Final byte of a cursor position report.
pub const CURSOR_REPORT_TERMINATOR: u8 = b'R';

/// Move left by `columns`.
pub fn cursor_left(columns: u16) -> Vec<u8> {
    format!("\x1b[{columns}D").into_bytes()
}
