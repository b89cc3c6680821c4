//! Shared `1C`-shaped payload codec (§4.4.1).
//!
//! Both standalone `1C` records and the per-set label blocks inside an
//! `RE` set-header (§4.4.2) use this exact on-disk shape: a block whose
//! payload opens with three `i32` counters — segment count, total items,
//! items in *this* segment — followed by that many fixed-width ASCII
//! slots. Multiple such blocks are read back to back until the declared
//! segment count is exhausted.

use std::io::{Read, Write};

use crate::error::{FramingError, Result};
use crate::framing::{self, Cursor};

/// Reads a full `1C`-shaped value stream: one or more padding-framed blocks
/// each carrying `(segment_count, total_items, items_this_segment)`
/// followed by that many fixed-width ASCII slots.
pub fn read_char_stream<R: Read>(reader: &mut R, context: &'static str) -> Result<Vec<String>> {
    let mut items = Vec::new();
    let mut segments_read = 0usize;
    let mut total_segments = 1usize;

    loop {
        let payload = framing::read_block(reader, context)?;
        let mut cur = Cursor::new(&payload);
        let seg_count = cur.read_i32()?;
        let total_items = cur.read_i32()?;
        let this_segment = cur.read_i32()?;

        if segments_read == 0 {
            total_segments = seg_count.max(1) as usize;
            items.reserve(total_items.max(0) as usize);
        }

        if this_segment < 0 {
            return Err(FramingError::InvalidLength(this_segment).into());
        }
        let this_segment = this_segment as usize;
        if this_segment == 0 {
            segments_read += 1;
            if segments_read >= total_segments {
                break;
            }
            continue;
        }
        let slot_width = cur.remaining() / this_segment;
        for _ in 0..this_segment {
            let slot = cur.read_bytes(slot_width)?;
            items.push(framing::ascii_lossy(slot));
        }

        segments_read += 1;
        if segments_read >= total_segments {
            break;
        }
    }

    Ok(items)
}

/// Writes `items` as one or more `1C`-shaped blocks, each holding at most
/// `max_per_segment` items padded to `slot_width` bytes.
pub fn write_char_stream<W: Write>(
    writer: &mut W,
    items: &[String],
    slot_width: usize,
    max_per_segment: usize,
) -> Result<()> {
    let total_items = items.len();
    let chunks: Vec<&[String]> = if items.is_empty() {
        vec![&[]]
    } else {
        items.chunks(max_per_segment.max(1)).collect()
    };
    let total_segments = chunks.len();

    for chunk in chunks {
        let mut payload = Vec::with_capacity(12 + chunk.len() * slot_width);
        payload.extend_from_slice(&(total_segments as i32).to_le_bytes());
        payload.extend_from_slice(&(total_items as i32).to_le_bytes());
        payload.extend_from_slice(&(chunk.len() as i32).to_le_bytes());
        for item in chunk {
            payload.extend_from_slice(&framing::pad_ascii(item, slot_width));
        }
        framing::write_block(writer, &payload)?;
    }
    Ok(())
}

/// Synthesises the `INDEX` set labels `{"0", "1", …}` used by `1C`, `2I`,
/// and `2R` records, using `itoa` for fast integer-to-string formatting.
#[must_use]
pub fn synthetic_index_labels(count: usize) -> Vec<String> {
    let mut buf = itoa::Buffer::new();
    (0..count).map(|i| buf.format(i).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_single_segment() {
        let items = vec!["AA".to_string(), "BB".to_string(), "CC".to_string()];
        let mut buf = Vec::new();
        write_char_stream(&mut buf, &items, 4, 100).unwrap();
        let mut cur = &buf[..];
        let read_back = read_char_stream(&mut cur, "test").unwrap();
        assert_eq!(read_back, items);
    }

    #[test]
    fn round_trips_multiple_segments() {
        let items: Vec<String> = (0..10).map(|i| format!("ITEM{i}")).collect();
        let mut buf = Vec::new();
        write_char_stream(&mut buf, &items, 8, 3).unwrap();
        let mut cur = &buf[..];
        let read_back = read_char_stream(&mut cur, "test").unwrap();
        assert_eq!(read_back, items);
    }

    #[test]
    fn trims_trailing_spaces_on_read() {
        let items = vec!["AA  ".to_string(), "BB  ".to_string(), "CC  ".to_string()];
        let mut buf = Vec::new();
        write_char_stream(&mut buf, &items, 4, 100).unwrap();
        let mut cur = &buf[..];
        let read_back = read_char_stream(&mut cur, "test").unwrap();
        assert_eq!(read_back, vec!["AA", "BB", "CC"]);
    }

    #[test]
    fn synthetic_index_labels_are_zero_based() {
        assert_eq!(synthetic_index_labels(3), vec!["0", "1", "2"]);
    }
}
