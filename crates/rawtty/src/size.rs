//! Terminal width measurement
//!
//! The OS is asked first. When it cannot answer, the width is measured by
//! asking the terminal where the cursor is, pushing the cursor against the
//! right edge, asking again, and moving back.

use crate::escape::{
    cursor_left, CSI, CURSOR_FAR_RIGHT, CURSOR_POSITION_REQUEST, CURSOR_REPORT_TERMINATOR,
};
use crate::{Result, TermError};
use std::io::{self, Read, Write};
use tracing::{debug, trace};

/// Longest cursor position report accepted before the terminator.
const CURSOR_REPORT_CAPACITY: usize = 32;

/// Resolve the column count from a direct OS answer, falling back to the
/// cursor position protocol over `input`/`output` when `direct` is absent or
/// zero.
pub fn get_columns<R, W>(direct: Option<u16>, input: &mut R, output: &mut W) -> Result<u16>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    if let Some(columns) = direct.filter(|&columns| columns > 0) {
        debug!("OS reports {} columns", columns);
        return Ok(columns);
    }

    debug!("OS window size unavailable, probing with cursor reports");
    let start = query_cursor_column(input, output)?;

    output.write_all(CURSOR_FAR_RIGHT)?;
    let columns = query_cursor_column(input, output)?;

    if columns > start {
        output.write_all(&cursor_left(columns - start))?;
        output.flush()?;
    }

    debug!("cursor probe measured {} columns", columns);
    Ok(columns)
}

/// Ask the terminal for the cursor position and return its column.
pub fn query_cursor_column<R, W>(input: &mut R, output: &mut W) -> Result<u16>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    output.write_all(CURSOR_POSITION_REQUEST)?;
    output.flush()?;

    let mut report = [0u8; CURSOR_REPORT_CAPACITY];
    let mut len = 0;
    loop {
        if len == report.len() {
            return Err(TermError::CursorPosition(format!(
                "no terminator within {CURSOR_REPORT_CAPACITY} bytes"
            )));
        }

        let mut byte = [0u8; 1];
        match input.read(&mut byte) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed while awaiting cursor position report",
                )
                .into())
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }

        if byte[0] == CURSOR_REPORT_TERMINATOR {
            break;
        }
        report[len] = byte[0];
        len += 1;
    }

    trace!("cursor position report: {:?}", &report[..len]);
    parse_cursor_report(&report[..len])
}

/// Extract the column from a report of the form `ESC [ row ; col`, with or
/// without the trailing `R`. The row is not validated.
pub fn parse_cursor_report(report: &[u8]) -> Result<u16> {
    let report = report
        .strip_suffix(&[CURSOR_REPORT_TERMINATOR])
        .unwrap_or(report);

    let body = report.strip_prefix(CSI).ok_or_else(|| {
        TermError::CursorPosition(format!("missing CSI prefix in {report:?}"))
    })?;
    let body = std::str::from_utf8(body)
        .map_err(|_| TermError::CursorPosition(format!("non-ASCII report {report:?}")))?;

    let (_row, column) = body
        .split_once(';')
        .ok_or_else(|| TermError::CursorPosition(format!("missing ';' in {body:?}")))?;

    column
        .parse::<u16>()
        .map_err(|e| TermError::CursorPosition(format!("bad column {column:?}: {e}")))
}
