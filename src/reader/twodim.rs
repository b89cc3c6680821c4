//! `2I` / `2R` — two-dimensional integer/real records with a synthetic
//! `INDEX` set (§4.4.4).
//!
//! Each on-disk block restates the stream-level counters
//! `(vectors, total_count, max_per_vector)` twice — a quirk of the legacy
//! writer carried through unchanged — followed by the block's own
//! `vector_number` and its values. Blocks are read until `vector_number == 1`.

use std::io::{Read, Write};

use crate::error::Result;
use crate::framing::{self, Cursor};
use crate::key_sequence::KeySequence;
use crate::reader::char_vector::synthetic_index_labels;
use crate::sequence_dictionary::SequenceDictionary;
use crate::set_expansion::Set;
use crate::writer::partition;

fn read_block_header(cur: &mut Cursor<'_>) -> Result<i32> {
    let _vectors = cur.read_i32()?;
    let _total_count = cur.read_i32()?;
    let _max_per_vector = cur.read_i32()?;
    let _vectors_restated = cur.read_i32()?;
    let _total_count_restated = cur.read_i32()?;
    let _max_per_vector_restated = cur.read_i32()?;
    cur.read_i32()
}

fn write_block_header(
    payload: &mut Vec<u8>,
    vectors: i32,
    total_count: i32,
    max_per_vector: i32,
    vector_number: i32,
) {
    for v in [vectors, total_count, max_per_vector, vectors, total_count, max_per_vector] {
        payload.extend_from_slice(&v.to_le_bytes());
    }
    payload.extend_from_slice(&vector_number.to_le_bytes());
}

/// Reads a `2I` record into an `i32`-valued, synthetic-`INDEX`-keyed dictionary.
pub fn read_twodim_ints<R: Read>(reader: &mut R) -> Result<SequenceDictionary<String, i32>> {
    let mut values = Vec::new();
    loop {
        let payload = framing::read_block(reader, "2I data block")?;
        let mut cur = Cursor::new(&payload);
        let vector_number = read_block_header(&mut cur)?;
        while !cur.is_empty() {
            values.push(cur.read_i32()?);
        }
        if vector_number <= 1 {
            break;
        }
    }
    Ok(index_dict(values))
}

/// Reads a `2R` record into an `f32`-valued, synthetic-`INDEX`-keyed dictionary.
pub fn read_twodim_floats<R: Read>(reader: &mut R) -> Result<SequenceDictionary<String, f32>> {
    let mut values = Vec::new();
    loop {
        let payload = framing::read_block(reader, "2R data block")?;
        let mut cur = Cursor::new(&payload);
        let vector_number = read_block_header(&mut cur)?;
        while !cur.is_empty() {
            values.push(cur.read_f32()?);
        }
        if vector_number <= 1 {
            break;
        }
    }
    Ok(index_dict(values))
}

fn index_dict<V>(values: Vec<V>) -> SequenceDictionary<String, V> {
    let labels = synthetic_index_labels(values.len());
    let set = Set::new("INDEX", labels.clone());
    let mut dict = SequenceDictionary::new(vec![set]);
    for (label, value) in labels.into_iter().zip(values) {
        dict.insert(KeySequence::new(vec![label]), value);
    }
    dict
}

/// Writes a flat `i32` value stream as one or more `2I` blocks, honouring the
/// per-vector element limit.
pub fn write_twodim_ints<W: Write>(writer: &mut W, values: &[i32], limit: usize) -> Result<()> {
    let chunks = partition::plan_flat_chunks(values.len(), limit);
    let total = chunks.len() as i32;
    let total_count = values.len() as i32;
    let max_per_vector = limit as i32;

    for (i, &(start, end)) in chunks.iter().enumerate() {
        let vector_number = total - i as i32;
        let mut payload = Vec::new();
        write_block_header(&mut payload, total, total_count, max_per_vector, vector_number);
        for &v in &values[start..end] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        framing::write_block(writer, &payload)?;
    }
    Ok(())
}

/// Writes a flat `f32` value stream as one or more `2R` blocks, honouring the
/// per-vector element limit.
pub fn write_twodim_floats<W: Write>(writer: &mut W, values: &[f32], limit: usize) -> Result<()> {
    let chunks = partition::plan_flat_chunks(values.len(), limit);
    let total = chunks.len() as i32;
    let total_count = values.len() as i32;
    let max_per_vector = limit as i32;

    for (i, &(start, end)) in chunks.iter().enumerate() {
        let vector_number = total - i as i32;
        let mut payload = Vec::new();
        write_block_header(&mut payload, total, total_count, max_per_vector, vector_number);
        for &v in &values[start..end] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        framing::write_block(writer, &payload)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_small_int_vector() {
        let values = vec![1, 2, 3, 4, 5];
        let mut buf = Vec::new();
        write_twodim_ints(&mut buf, &values, 1_999_991).unwrap();
        let mut cur = &buf[..];
        let dict = read_twodim_ints(&mut cur).unwrap();
        assert_eq!(dict.len(), 5);
        assert_eq!(
            dict.get(&KeySequence::new(vec!["4".to_string()])),
            Some(&5)
        );
    }

    #[test]
    fn splits_float_vector_across_segment_limit_s5() {
        let values: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let mut buf = Vec::new();
        write_twodim_floats(&mut buf, &values, 4).unwrap();
        let mut cur = &buf[..];
        let dict = read_twodim_floats(&mut cur).unwrap();
        assert_eq!(dict.len(), 10);
        for i in 0..10 {
            assert_eq!(
                dict.get(&KeySequence::new(vec![i.to_string()])),
                Some(&(i as f32))
            );
        }
    }
}
