//! Length-prefix / padding / spacer framing primitives (§4.1).
//!
//! Every HAR record on disk is a sequence of *framed blocks*:
//!
//! ```text
//! length (i32, LE) | payload (length bytes) | length (i32, LE)
//! ```
//!
//! The two lengths must match exactly. Most payloads additionally begin with
//! the four-space padding sentinel `0x20202020`, which the caller must
//! verify and strip before reading the semantic content. This module owns
//! both primitives, plus a small in-memory [`Cursor`] used to walk a
//! block's payload value-by-value with explicit little-endian decoding
//! (never by reinterpreting the byte slice in place), so behaviour is
//! identical on big-endian hosts.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, FramingError, Result, ValidationKind};

/// The four-space padding sentinel beginning most framed payloads.
pub const PADDING: u32 = 0x2020_2020;

/// The spacer sentinel appearing at known offsets inside set-definition blocks.
pub const SPACER: u32 = 0xFFFF_FFFF;

/// Reads one length-prefixed frame from `reader`.
///
/// Returns `Ok(None)` if the stream is at a clean boundary (zero bytes
/// available before the opening length) — the EOF-between-records
/// termination condition. Any other truncation is a fatal framing error.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    let n = read_fill(reader, &mut len_buf)?;
    if n == 0 {
        return Ok(None);
    }
    if n != 4 {
        return Err(FramingError::UnexpectedEof {
            context: "opening frame length",
        }
        .into());
    }
    let opening = i32::from_le_bytes(len_buf);
    if opening < 0 {
        return Err(FramingError::InvalidLength(opening).into());
    }

    let mut payload = vec![0u8; opening as usize];
    reader
        .read_exact(&mut payload)
        .map_err(|_| FramingError::UnexpectedEof {
            context: "frame payload",
        })?;

    let closing = reader
        .read_i32::<LittleEndian>()
        .map_err(|_| FramingError::UnexpectedEof {
            context: "closing frame length",
        })?;
    if opening != closing {
        return Err(Error::validation(
            ValidationKind::Length,
            FramingError::LengthMismatch { opening, closing },
        ));
    }

    Ok(Some(payload))
}

/// Reads exactly one frame, treating EOF as a fatal error (used once a
/// record has started and more blocks are expected).
pub fn read_frame_required<R: Read>(reader: &mut R, context: &'static str) -> Result<Vec<u8>> {
    read_frame(reader)?.ok_or(Error::Framing(FramingError::UnexpectedEof { context }))
}

/// Writes `payload` as one length-prefixed frame.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = i32::try_from(payload.len())
        .map_err(|_| FramingError::InvalidLength(i32::MAX))?;
    writer.write_i32::<LittleEndian>(len)?;
    writer.write_all(payload)?;
    writer.write_i32::<LittleEndian>(len)?;
    Ok(())
}

/// Reads the 4-character record identifier: framed with length prefix/suffix
/// but *no* padding sentinel. Returns `None` at a clean record boundary EOF.
pub fn read_header_string<R: Read>(reader: &mut R) -> Result<Option<String>> {
    let Some(payload) = read_frame(reader)? else {
        return Ok(None);
    };
    Ok(Some(ascii_lossy(&payload)))
}

/// Writes the 4-character record identifier, framed with no padding sentinel.
pub fn write_header_string<W: Write>(writer: &mut W, header: &str) -> Result<()> {
    write_frame(writer, &pad_ascii(header, 4))
}

/// Reads a padding-prefixed payload block: a frame whose first four bytes
/// must equal [`PADDING`]. The padding is verified then stripped.
pub fn read_block<R: Read>(reader: &mut R, context: &'static str) -> Result<Vec<u8>> {
    let payload = read_frame_required(reader, context)?;
    if payload.len() < 4 {
        return Err(Error::validation(
            ValidationKind::Padding,
            FramingError::UnexpectedEof {
                context: "padding sentinel",
            },
        ));
    }
    let actual = u32::from_le_bytes(payload[0..4].try_into().unwrap());
    if actual != PADDING {
        return Err(Error::validation(
            ValidationKind::Padding,
            FramingError::PaddingMismatch {
                expected: PADDING,
                actual,
            },
        ));
    }
    Ok(payload[4..].to_vec())
}

/// Writes a padding-prefixed payload block.
pub fn write_block<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let mut framed = Vec::with_capacity(payload.len() + 4);
    framed.extend_from_slice(&PADDING.to_le_bytes());
    framed.extend_from_slice(payload);
    write_frame(writer, &framed)
}

fn read_fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

/// Pads `s` with trailing ASCII spaces to exactly `width` bytes, truncating
/// if it is already longer.
#[must_use]
pub fn pad_ascii(s: &str, width: usize) -> Vec<u8> {
    let mut buf = s.as_bytes().to_vec();
    buf.truncate(width);
    buf.resize(width, b' ');
    buf
}

/// Trims leading/trailing NUL, STX (`0x02`), and space from a byte slice and
/// decodes it as (lossy) ASCII. Uses [`memchr`] to locate the trim
/// boundaries efficiently on longer fields.
#[must_use]
pub fn ascii_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(trim_padding(bytes)).into_owned()
}

/// Returns the sub-slice of `bytes` with leading/trailing padding
/// characters (NUL, STX, space) removed.
///
/// A NUL byte anywhere in the field acts as a hard terminator: Fortran-style
/// fixed-width buffers routinely carry undefined bytes after the first NUL,
/// so [`memchr`] locates that cutoff before the STX/space trim runs.
#[must_use]
pub fn trim_padding(bytes: &[u8]) -> &[u8] {
    let bytes = match memchr::memchr(0x00, bytes) {
        Some(idx) => &bytes[..idx],
        None => bytes,
    };
    fn is_pad(b: u8) -> bool {
        matches!(b, 0x02 | b' ')
    }
    let start = bytes.iter().position(|&b| !is_pad(b)).unwrap_or(bytes.len());
    let rest = &bytes[start..];
    let end = rest.iter().rposition(|&b| !is_pad(b)).map_or(0, |p| p + 1);
    &rest[..end]
}

/// A small cursor for walking a block's payload value-by-value with
/// explicit little-endian decoding.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        let v = (&self.buf[self.pos..self.pos + 4])
            .read_i32::<LittleEndian>()
            .unwrap();
        self.pos += 4;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        let v = (&self.buf[self.pos..self.pos + 4])
            .read_u32::<LittleEndian>()
            .unwrap();
        self.pos += 4;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.need(4)?;
        let v = (&self.buf[self.pos..self.pos + 4])
            .read_f32::<LittleEndian>()
            .unwrap();
        self.pos += 4;
        Ok(v)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n)?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads `n` bytes and decodes them as padding-trimmed ASCII.
    pub fn read_ascii(&mut self, n: usize) -> Result<String> {
        Ok(ascii_lossy(self.read_bytes(n)?))
    }

    /// Checks that the next 4 bytes equal the [`SPACER`] sentinel.
    pub fn expect_spacer(&mut self) -> Result<()> {
        let actual = self.read_u32()?;
        if actual != SPACER {
            return Err(Error::validation(
                ValidationKind::Spacer,
                FramingError::SpacerMismatch {
                    expected: SPACER,
                    actual,
                },
            ));
        }
        Ok(())
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(FramingError::UnexpectedEof {
                context: "block payload",
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello").unwrap();
        let mut cur = &buf[..];
        let payload = read_frame(&mut cur).unwrap().unwrap();
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn frame_detects_length_mismatch() {
        // Hand-craft a frame with mismatched open/close lengths.
        let mut buf = Vec::new();
        buf.extend_from_slice(&5i32.to_le_bytes());
        buf.extend_from_slice(b"hello");
        buf.extend_from_slice(&6i32.to_le_bytes());
        let mut cur = &buf[..];
        let err = read_frame(&mut cur).unwrap_err();
        assert!(matches!(
            err,
            Error::DataValidation {
                kind: ValidationKind::Length,
                ..
            }
        ));
    }

    #[test]
    fn clean_eof_between_records_is_none() {
        let mut cur: &[u8] = &[];
        assert!(read_frame(&mut cur).unwrap().is_none());
    }

    #[test]
    fn block_round_trips_with_padding() {
        let mut buf = Vec::new();
        write_block(&mut buf, b"payload").unwrap();
        let mut cur = &buf[..];
        let payload = read_block(&mut cur, "test").unwrap();
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn block_detects_bad_padding() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&8i32.to_le_bytes());
        buf.extend_from_slice(b"XXXXdata");
        buf.extend_from_slice(&8i32.to_le_bytes());
        let mut cur = &buf[..];
        let err = read_block(&mut cur, "test").unwrap_err();
        assert!(matches!(
            err,
            Error::DataValidation {
                kind: ValidationKind::Padding,
                ..
            }
        ));
    }

    #[test]
    fn trims_nul_stx_space() {
        assert_eq!(ascii_lossy(b"AA  "), "AA");
        assert_eq!(ascii_lossy(b"AA\x00\x02"), "AA");
        assert_eq!(ascii_lossy(b"   "), "");
        assert_eq!(ascii_lossy(b"A B"), "A B");
    }

    #[test]
    fn pad_ascii_fixed_width() {
        assert_eq!(pad_ascii("AB", 4), b"AB  ");
        assert_eq!(pad_ascii("ABCDE", 4), b"ABCD");
    }

    #[test]
    fn cursor_reads_values_le() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&42i32.to_le_bytes());
        buf.extend_from_slice(&3.25f32.to_le_bytes());
        let mut cur = Cursor::new(&buf);
        assert_eq!(cur.read_i32().unwrap(), 42);
        assert!((cur.read_f32().unwrap() - 3.25).abs() < f32::EPSILON);
        assert!(cur.is_empty());
    }

    #[test]
    fn cursor_expect_spacer() {
        let buf = SPACER.to_le_bytes();
        let mut cur = Cursor::new(&buf);
        assert!(cur.expect_spacer().is_ok());
    }
}
