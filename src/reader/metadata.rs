//! Parsing for the per-record metadata block (§4.4).

use crate::error::{RecordError, Result};
use crate::framing::Cursor;
use crate::header_array::{RecordType, Storage};

/// The decoded metadata block shared by every record kind.
#[derive(Debug)]
pub struct RecordMetadata {
    pub record_type: RecordType,
    pub storage: Storage,
    pub description: String,
    pub dimensions: Vec<i32>,
}

/// Parses the metadata block payload (already padding-stripped):
/// `type(2) | storage(4) | description(70) | dim_count(4) | dims(4*n)`.
pub fn parse_metadata(payload: &[u8]) -> Result<RecordMetadata> {
    let mut cur = Cursor::new(payload);
    let tag_bytes = cur.read_bytes(2)?;
    let tag: [u8; 2] = tag_bytes.try_into().unwrap();
    let record_type = RecordType::from_tag(tag)?;

    let storage_bytes = cur.read_bytes(4)?;
    let storage_tag: [u8; 4] = storage_bytes.try_into().unwrap();
    let storage = Storage::from_tag(storage_tag)?;

    let description = cur.read_ascii(70)?;

    let dim_count = cur.read_i32()?;
    if !(1..=7).contains(&dim_count) {
        return Err(RecordError::InvalidDimensionCount(dim_count).into());
    }
    let mut dimensions = Vec::with_capacity(dim_count as usize);
    for _ in 0..dim_count {
        dimensions.push(cur.read_i32()?);
    }

    Ok(RecordMetadata {
        record_type,
        storage,
        description,
        dimensions,
    })
}

/// Serialises a metadata block payload (without the padding sentinel, which
/// the caller adds via `framing::write_block`).
pub fn write_metadata(
    record_type: RecordType,
    storage: Storage,
    description: &str,
    dimensions: &[i32],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(80 + 4 * dimensions.len());
    buf.extend_from_slice(record_type.tag());
    buf.extend_from_slice(storage.tag());
    buf.extend_from_slice(&crate::framing::pad_ascii(description, 70));
    buf.extend_from_slice(&(dimensions.len() as i32).to_le_bytes());
    for &d in dimensions {
        buf.extend_from_slice(&d.to_le_bytes());
    }
    buf
}
