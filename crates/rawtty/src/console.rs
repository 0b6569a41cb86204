//! UTF-16 console input reassembled into UTF-8 bytes
//!
//! Some consoles hand out input one UTF-16 code unit at a time. A single
//! keystroke may need two units (a surrogate pair) and its UTF-8 form may not
//! fit the caller's buffer, so decoded bytes are staged in the reader and
//! handed out across as many `read` calls as it takes.

use std::io::{self, Read};
use tracing::{debug, trace};

/// Worst case staged at once: one surrogate pair.
const STAGING_CAPACITY: usize = 4;

const HIGH_SURROGATES: std::ops::RangeInclusive<u16> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u16> = 0xDC00..=0xDFFF;

/// A console that yields UTF-16 code units.
pub trait Utf16Source {
    /// Read a single code unit, blocking until one is available.
    /// `Ok(None)` means the native read returned no data.
    fn read_unit(&mut self) -> io::Result<Option<u16>>;
}

impl<S: Utf16Source + ?Sized> Utf16Source for &mut S {
    fn read_unit(&mut self) -> io::Result<Option<u16>> {
        (**self).read_unit()
    }
}

/// Byte-oriented reader over a [`Utf16Source`].
///
/// Each reader owns its staging buffer, so independent readers never see
/// each other's partially delivered characters.
pub struct ConsoleReader<S> {
    source: S,
    staged: [u8; STAGING_CAPACITY],
    staged_len: usize,
    /// Unit read while looking for a low surrogate that did not complete
    /// the pair; it starts the next character.
    held: Option<u16>,
}

impl<S: Utf16Source> ConsoleReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            staged: [0; STAGING_CAPACITY],
            staged_len: 0,
            held: None,
        }
    }

    /// Bytes decoded but not yet returned by `read`.
    pub fn pending(&self) -> &[u8] {
        &self.staged[..self.staged_len]
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Move staged bytes into `dest`, oldest first.
    fn drain_into(&mut self, dest: &mut [u8]) -> usize {
        let n = self.staged_len.min(dest.len());
        dest[..n].copy_from_slice(&self.staged[..n]);
        self.staged.copy_within(n..self.staged_len, 0);
        self.staged_len -= n;
        n
    }

    fn next_unit(&mut self) -> io::Result<Option<u16>> {
        match self.held.take() {
            Some(unit) => Ok(Some(unit)),
            None => self.source.read_unit(),
        }
    }

    /// Decode the next character into the staging buffer. Returns `false`
    /// when the source has nothing more to give.
    fn stage_next(&mut self) -> io::Result<bool> {
        debug_assert_eq!(self.staged_len, 0);

        let first = match self.next_unit()? {
            Some(unit) => unit,
            None => return Ok(false),
        };

        let mut units = [first, 0];
        let mut count = 1;
        if HIGH_SURROGATES.contains(&first) {
            match self.source.read_unit() {
                Ok(Some(low)) if LOW_SURROGATES.contains(&low) => {
                    units[1] = low;
                    count = 2;
                }
                Ok(Some(other)) => self.held = Some(other),
                Ok(None) => return Ok(false),
                Err(e) => {
                    debug!("console read failed inside surrogate pair: {}", e);
                    return Ok(false);
                }
            }
        }

        for decoded in char::decode_utf16(units[..count].iter().copied()) {
            let ch = decoded.unwrap_or(char::REPLACEMENT_CHARACTER);
            let end = self.staged_len + ch.len_utf8();
            ch.encode_utf8(&mut self.staged[self.staged_len..end]);
            self.staged_len = end;
        }

        trace!("staged {:?} from {:04X?}", self.pending(), &units[..count]);
        Ok(true)
    }
}

impl<S: Utf16Source> Read for ConsoleReader<S> {
    /// Fills `buf` until it is full or the console has no more data. A
    /// console failure ends the read early; with nothing delivered yet that
    /// surfaces as `Ok(0)`, like end of file on a byte stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            if self.staged_len > 0 {
                written += self.drain_into(&mut buf[written..]);
                continue;
            }

            match self.stage_next() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    debug!("console read failed after {} bytes: {}", written, e);
                    break;
                }
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Units(VecDeque<io::Result<Option<u16>>>);

    impl Units {
        fn of(units: &[u16]) -> Self {
            Self(units.iter().map(|&u| Ok(Some(u))).collect())
        }
    }

    impl Utf16Source for Units {
        fn read_unit(&mut self) -> io::Result<Option<u16>> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    fn read_all(reader: &mut ConsoleReader<Units>, chunk: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; chunk];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn ascii_passes_through() {
        let mut reader = ConsoleReader::new(Units::of(&[b'h' as u16, b'i' as u16]));
        assert_eq!(read_all(&mut reader, 16), b"hi");
    }

    #[test]
    fn bmp_character_split_across_reads() {
        // U+00E9 and U+20AC
        let mut reader = ConsoleReader::new(Units::of(&[0x00E9, 0x20AC]));
        let mut buf = [0u8; 1];

        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0xC3);
        assert_eq!(reader.pending(), &[0xA9]);
        assert_eq!(read_all(&mut reader, 1), vec![0xA9, 0xE2, 0x82, 0xAC]);
    }

    #[test]
    fn surrogate_pair_becomes_four_bytes() {
        let mut reader = ConsoleReader::new(Units::of(&[0xD83D, 0xDE00]));
        assert_eq!(read_all(&mut reader, 4), "\u{1F600}".as_bytes());
    }

    #[test]
    fn unpaired_low_surrogate_is_replaced() {
        let mut reader = ConsoleReader::new(Units::of(&[0xDE00, b'a' as u16]));
        assert_eq!(read_all(&mut reader, 8), "\u{FFFD}a".as_bytes());
    }

    #[test]
    fn high_surrogate_followed_by_bmp_unit() {
        let mut reader = ConsoleReader::new(Units::of(&[0xD83D, b'x' as u16]));
        assert_eq!(read_all(&mut reader, 2), "\u{FFFD}x".as_bytes());
    }

    #[test]
    fn repeated_high_surrogate_keeps_following_pair() {
        let mut reader = ConsoleReader::new(Units::of(&[0xD83D, 0xD83D, 0xDE00]));
        assert_eq!(read_all(&mut reader, 1), "\u{FFFD}\u{1F600}".as_bytes());
    }

    #[test]
    fn missing_low_surrogate_stops_early() {
        let mut reader = ConsoleReader::new(Units::of(&[b'a' as u16, 0xD83D]));
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(&buf[..1], b"a");
        assert!(reader.pending().is_empty());
    }

    #[test]
    fn failure_with_nothing_read_returns_zero() {
        let mut source = Units::of(&[]);
        source
            .0
            .push_back(Err(io::Error::new(io::ErrorKind::Other, "console gone")));
        let mut reader = ConsoleReader::new(source);

        assert_eq!(reader.read(&mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn failure_after_data_returns_what_was_read() {
        let mut source = Units::of(&[b'o' as u16, b'k' as u16]);
        source
            .0
            .push_back(Err(io::Error::new(io::ErrorKind::Other, "console gone")));
        let mut reader = ConsoleReader::new(source);

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ok");
    }

    #[test]
    fn empty_destination_reads_nothing() {
        let mut reader = ConsoleReader::new(Units::of(&[b'a' as u16]));
        assert_eq!(reader.read(&mut [0u8; 0]).unwrap(), 0);
        assert_eq!(reader.into_inner().0.len(), 1);
    }
}
