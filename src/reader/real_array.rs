//! `RE` (and fallback `RL`/`2R`-adjacent) real-array parsing: set headers,
//! dense (`FULL`) segment accumulation, and sparse (`SPSE`) chunk
//! accumulation (§4.4.2).

use std::io::{Read, Write};

use crate::error::{FramingError, RecordError, Result};
use crate::framing::{self, Cursor};
use crate::reader::char_vector;
use crate::sequence_dictionary::SequenceDictionary;
use crate::set_expansion::{self, Set};
use crate::writer::partition::{self, GEMPACK_VECTOR_LIMIT};

const SET_NAME_WIDTH: usize = 12;

/// Parses the set-header block plus its trailing per-set label blocks.
///
/// Per §4.4.5, the spacer check is relaxed for a zero-set scalar (`a == 0`).
pub fn read_set_header<R: Read>(
    reader: &mut R,
    coefficient_fallback: &str,
) -> Result<(Vec<Set>, String)> {
    let payload = framing::read_block(reader, "RE set header")?;
    let mut cur = Cursor::new(&payload);

    let a = cur.read_i32()?;
    if a > 0 {
        cur.expect_spacer()?;
    } else {
        cur.read_u32()?;
    }
    let c = cur.read_i32()?;
    let coefficient = cur.read_ascii(SET_NAME_WIDTH)?;
    if a > 0 {
        cur.expect_spacer()?;
    } else {
        cur.read_u32()?;
    }

    let mut names = Vec::with_capacity(a.max(0) as usize);
    for _ in 0..a.max(0) {
        names.push(cur.read_ascii(SET_NAME_WIDTH)?);
    }

    let mut sets = Vec::with_capacity(names.len());
    for name in &names {
        let labels = char_vector::read_char_stream(reader, "RE set labels")?;
        sets.push(Set::new(name.clone(), labels));
    }

    if c > a {
        if c - a != 1 {
            return Err(RecordError::SetCountMismatch { a, c }.into());
        }
        let shared = sets
            .last()
            .cloned()
            .ok_or(RecordError::SetCountMismatch { a, c })?;
        sets.push(shared);
    }

    if sets.is_empty() {
        let coefficient = if coefficient.trim().is_empty() {
            coefficient_fallback.to_string()
        } else {
            coefficient.clone()
        };
        sets.push(Set::new(coefficient.clone(), vec![coefficient]));
    }

    Ok((sets, coefficient))
}

/// Writes the set-header block and its per-set label blocks.
///
/// When `sets` is a single synthetic `(coefficient, [coefficient])` set (the
/// shape [`read_set_header`] produces for a zero-set scalar), this writes
/// `a = c = 0` and no label blocks, round-tripping the collapse.
pub fn write_set_header<W: Write>(writer: &mut W, sets: &[Set], coefficient: &str) -> Result<()> {
    let is_synthetic_scalar = sets.len() == 1
        && sets[0].name() == coefficient
        && sets[0].labels() == [coefficient.to_string()];
    let shares_last = sets.len() >= 2 && sets[sets.len() - 1] == sets[sets.len() - 2];

    let (a, c, distinct) = if is_synthetic_scalar {
        (0, 0, &sets[..0])
    } else if shares_last {
        (sets.len() - 1, sets.len(), &sets[..sets.len() - 1])
    } else {
        (sets.len(), sets.len(), sets)
    };

    let mut payload = Vec::new();
    payload.extend_from_slice(&(a as i32).to_le_bytes());
    payload.extend_from_slice(&framing::SPACER.to_le_bytes());
    payload.extend_from_slice(&(c as i32).to_le_bytes());
    payload.extend_from_slice(&framing::pad_ascii(coefficient, SET_NAME_WIDTH));
    payload.extend_from_slice(&framing::SPACER.to_le_bytes());
    for set in distinct {
        payload.extend_from_slice(&framing::pad_ascii(set.name(), SET_NAME_WIDTH));
    }
    framing::write_block(writer, &payload)?;

    for set in distinct {
        let width = set
            .labels()
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(SET_NAME_WIDTH);
        char_vector::write_char_stream(writer, set.labels(), width, set.labels().len().max(1))?;
    }
    Ok(())
}

/// Reads the record-dimensions block: `(vector_index, dim_count, dims...)`.
pub fn read_record_dimensions<R: Read>(reader: &mut R) -> Result<Vec<i32>> {
    let payload = framing::read_block(reader, "RE record dimensions")?;
    let mut cur = Cursor::new(&payload);
    let _vector_index = cur.read_i32()?;
    let dim_count = cur.read_i32()?;
    let mut dims = Vec::with_capacity(dim_count.max(0) as usize);
    for _ in 0..dim_count.max(0) {
        dims.push(cur.read_i32()?);
    }
    Ok(dims)
}

/// Writes the record-dimensions block.
pub fn write_record_dimensions<W: Write>(writer: &mut W, dimensions: &[i32]) -> Result<()> {
    let mut payload = Vec::with_capacity(8 + dimensions.len() * 4);
    payload.extend_from_slice(&1i32.to_le_bytes());
    payload.extend_from_slice(&(dimensions.len() as i32).to_le_bytes());
    for &d in dimensions {
        payload.extend_from_slice(&d.to_le_bytes());
    }
    framing::write_block(writer, &payload)
}

/// Reads `(extents, data)` segments until the terminal `vector_index == 1`,
/// filling `dict` over `sets`. Fails if the segments do not jointly cover the
/// whole logical array.
pub fn read_dense_segments<R: Read>(
    reader: &mut R,
    header: &str,
    sets: &[Set],
    dimensions: &[i32],
) -> Result<SequenceDictionary<String, f32>> {
    let mut dict = SequenceDictionary::new(sets.to_vec());
    let axis_count = dimensions.len().max(1);
    let mut covered = 0usize;

    loop {
        let extents_payload = framing::read_block(reader, "RE extents block")?;
        let mut cur = Cursor::new(&extents_payload);
        let vector_index = cur.read_i32()?;
        let mut bounds = Vec::with_capacity(axis_count);
        for _ in 0..axis_count {
            let start = cur.read_i32()?;
            let end = cur.read_i32()?;
            bounds.push((
                (start - 1).max(0) as usize,
                (end - 1).max(0) as usize,
            ));
        }

        let data_payload = framing::read_block(reader, "RE data block")?;
        let mut data_cur = Cursor::new(&data_payload);
        let _data_vector_index = data_cur.read_i32()?;

        let keys = if sets.is_empty() {
            vec![crate::key_sequence::KeySequence::new(Vec::new())]
        } else {
            set_expansion::bounded_expand(sets, &bounds)
        };
        for key in keys {
            let value = data_cur.read_f32()?;
            dict.insert(key, value);
        }
        covered += bounds
            .iter()
            .map(|&(s, e)| e - s + 1)
            .product::<usize>()
            .max(1);

        if vector_index <= 1 {
            break;
        }
    }

    let expected = set_expansion::SetExpansion::len(sets);
    if covered != expected {
        return Err(RecordError::IncompleteSegments {
            header: header.to_string(),
            expected,
            covered,
        }
        .into());
    }
    Ok(dict)
}

/// Writes the dense `(extents, data)` segment stream for a fully-populated
/// logical array, honouring the per-vector element limit.
pub fn write_dense_segments<W: Write>(
    writer: &mut W,
    sets: &[Set],
    dimensions: &[i32],
    dict: &SequenceDictionary<String, f32>,
    segment_limit: usize,
) -> Result<()> {
    let segments = partition::plan_segments(dimensions, segment_limit);
    let total = segments.len();

    for (i, segment) in segments.iter().enumerate() {
        let vector_index = (total - i) as i32;

        let mut extents_payload = Vec::new();
        extents_payload.extend_from_slice(&vector_index.to_le_bytes());
        for &(start, end) in &segment.bounds {
            extents_payload.extend_from_slice(&((start as i32) + 1).to_le_bytes());
            extents_payload.extend_from_slice(&((end as i32) + 1).to_le_bytes());
        }
        framing::write_block(writer, &extents_payload)?;

        let mut data_payload = Vec::new();
        data_payload.extend_from_slice(&vector_index.to_le_bytes());
        let keys = if sets.is_empty() {
            vec![crate::key_sequence::KeySequence::new(Vec::new())]
        } else {
            set_expansion::bounded_expand(sets, &segment.bounds)
        };
        for key in keys {
            let value = dict.get(&key).copied().unwrap_or(0.0);
            data_payload.extend_from_slice(&value.to_le_bytes());
        }
        framing::write_block(writer, &data_payload)?;
    }
    Ok(())
}

/// Reads the sparse metadata block: `(nonzero_count, size_of_int,
/// size_of_real, description)`.
pub fn read_sparse_metadata<R: Read>(reader: &mut R) -> Result<(i32, String)> {
    let payload = framing::read_block(reader, "RE sparse metadata")?;
    let mut cur = Cursor::new(&payload);
    let nonzero_count = cur.read_i32()?;
    let _size_of_int = cur.read_i32()?;
    let _size_of_real = cur.read_i32()?;
    let description = if cur.is_empty() {
        String::new()
    } else {
        cur.read_ascii(cur.remaining())?
    };
    Ok((nonzero_count, description))
}

/// Writes the sparse metadata block.
pub fn write_sparse_metadata<W: Write>(writer: &mut W, nonzero_count: usize) -> Result<()> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(nonzero_count as i32).to_le_bytes());
    payload.extend_from_slice(&4i32.to_le_bytes());
    payload.extend_from_slice(&4i32.to_le_bytes());
    framing::write_block(writer, &payload)
}

/// Reads sparse chunks, converting 1-based pointers to 0-based, until
/// `nonzero_count` values have been recovered or a terminal
/// `vector_index == 1` chunk is consumed. Unaddressed positions are filled
/// with zero, producing a fully dense dictionary (§8 property 11).
pub fn read_sparse_chunks<R: Read>(
    reader: &mut R,
    sets: &[Set],
    nonzero_count: i32,
) -> Result<SequenceDictionary<String, f32>> {
    let logical_len = set_expansion::SetExpansion::len(sets);
    let keys: Vec<_> = set_expansion::SetExpansion::new(sets).collect();
    let mut dict = SequenceDictionary::new(sets.to_vec());

    let mut read_total = 0i64;
    if nonzero_count > 0 {
        loop {
            let payload = framing::read_block(reader, "RE sparse chunk")?;
            let mut cur = Cursor::new(&payload);
            let vector_index = cur.read_i32()?;
            let _total_nonzero = cur.read_i32()?;
            let chunk_len = cur.read_i32()?;
            if chunk_len < 0 {
                return Err(FramingError::InvalidLength(chunk_len).into());
            }
            let chunk_len = chunk_len as usize;

            let mut pointers = Vec::with_capacity(chunk_len);
            for _ in 0..chunk_len {
                pointers.push(cur.read_i32()?);
            }
            for pointer in pointers {
                let value = cur.read_f32()?;
                let zero_based = (pointer - 1) as i64;
                if zero_based < 0 || zero_based as usize >= logical_len {
                    return Err(RecordError::SparsePointerOutOfRange {
                        pointer: pointer as usize,
                        len: logical_len,
                    }
                    .into());
                }
                dict.insert(keys[zero_based as usize].clone(), value);
            }
            read_total += chunk_len as i64;

            if vector_index <= 1 || read_total >= i64::from(nonzero_count) {
                break;
            }
        }
    }

    for key in &keys {
        if dict.get(key).is_none() {
            dict.insert(key.clone(), 0.0);
        }
    }
    Ok(dict)
}

/// Writes the sparse chunk stream for the nonzero entries of `dict`.
pub fn write_sparse_chunks<W: Write>(
    writer: &mut W,
    sets: &[Set],
    dict: &SequenceDictionary<String, f32>,
    segment_limit: usize,
) -> Result<()> {
    let nonzero: Vec<(usize, f32)> = set_expansion::SetExpansion::new(sets)
        .enumerate()
        .filter_map(|(idx, key)| {
            let value = dict.get(&key).copied().unwrap_or(0.0);
            (value != 0.0).then_some((idx, value))
        })
        .collect();

    if nonzero.is_empty() {
        return Ok(());
    }

    let limit = segment_limit.max(1);
    let chunks: Vec<&[(usize, f32)]> = nonzero.chunks(limit).collect();
    let total = chunks.len();
    let total_nonzero = nonzero.len() as i32;

    for (i, chunk) in chunks.iter().enumerate() {
        let vector_index = (total - i) as i32;
        let mut payload = Vec::new();
        payload.extend_from_slice(&vector_index.to_le_bytes());
        payload.extend_from_slice(&total_nonzero.to_le_bytes());
        payload.extend_from_slice(&(chunk.len() as i32).to_le_bytes());
        for &(idx, _) in *chunk {
            payload.extend_from_slice(&((idx as i32) + 1).to_le_bytes());
        }
        for &(_, value) in *chunk {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        framing::write_block(writer, &payload)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_sequence::KeySequence;

    #[test]
    fn set_header_round_trips_distinct_sets() {
        let sets = vec![
            Set::new("ROW", vec!["r1".into(), "r2".into()]),
            Set::new("COL", vec!["c1".into(), "c2".into(), "c3".into()]),
        ];
        let mut buf = Vec::new();
        write_set_header(&mut buf, &sets, "TEST").unwrap();
        let mut cur = &buf[..];
        let (read_sets, coefficient) = read_set_header(&mut cur, "TEST").unwrap();
        assert_eq!(read_sets, sets);
        assert_eq!(coefficient, "TEST");
    }

    #[test]
    fn set_header_round_trips_shared_vocabulary_s3() {
        let sets = vec![
            Set::new("COM", vec!["c1".into(), "c2".into()]),
            Set::new("COM", vec!["c1".into(), "c2".into()]),
        ];
        let mut buf = Vec::new();
        write_set_header(&mut buf, &sets, "TEST").unwrap();
        let mut cur = &buf[..];
        let (read_sets, _) = read_set_header(&mut cur, "TEST").unwrap();
        assert_eq!(read_sets, sets);
    }

    #[test]
    fn set_header_round_trips_zero_set_scalar() {
        let sets = vec![Set::new("TEST", vec!["TEST".to_string()])];
        let mut buf = Vec::new();
        write_set_header(&mut buf, &sets, "TEST").unwrap();
        let mut cur = &buf[..];
        let (read_sets, _) = read_set_header(&mut cur, "TEST").unwrap();
        assert_eq!(read_sets, sets);
    }

    #[test]
    fn dense_segments_round_trip_scalar() {
        let sets = vec![Set::new("TEST", vec!["TEST".to_string()])];
        let mut dict: SequenceDictionary<String, f32> = SequenceDictionary::new(sets.clone());
        dict.insert(KeySequence::new(vec!["TEST".to_string()]), 3.25);

        let mut buf = Vec::new();
        write_dense_segments(&mut buf, &sets, &[1], &dict, GEMPACK_VECTOR_LIMIT).unwrap();
        let mut cur = &buf[..];
        let read_back = read_dense_segments(&mut cur, "TEST", &sets, &[1]).unwrap();
        assert_eq!(
            read_back.get(&KeySequence::new(vec!["TEST".to_string()])),
            Some(&3.25)
        );
    }

    #[test]
    fn dense_segments_split_across_vector_limit() {
        let sets = vec![Set::new("AX", vec!["1".into(), "2".into(), "3".into()])];
        let mut dict: SequenceDictionary<String, f32> = SequenceDictionary::new(sets.clone());
        for (i, label) in ["1", "2", "3"].iter().enumerate() {
            dict.insert(KeySequence::new(vec![(*label).to_string()]), i as f32);
        }

        let mut buf = Vec::new();
        write_dense_segments(&mut buf, &sets, &[3], &dict, 1).unwrap();
        let mut cur = &buf[..];
        let read_back = read_dense_segments(&mut cur, "AX", &sets, &[3]).unwrap();
        for (i, label) in ["1", "2", "3"].iter().enumerate() {
            assert_eq!(
                read_back.get(&KeySequence::new(vec![(*label).to_string()])),
                Some(&(i as f32))
            );
        }
    }

    #[test]
    fn sparse_round_trips_with_zero_fill_s4() {
        let sets = vec![
            Set::new("ROW", vec!["r1".into(), "r2".into(), "r3".into()]),
            Set::new("COL", vec!["c1".into(), "c2".into(), "c3".into()]),
        ];
        let mut dict: SequenceDictionary<String, f32> = SequenceDictionary::new(sets.clone());
        dict.insert(
            KeySequence::new(vec!["r1".to_string(), "c2".to_string()]),
            5.0,
        );
        dict.insert(
            KeySequence::new(vec!["r3".to_string(), "c3".to_string()]),
            7.0,
        );

        let mut buf = Vec::new();
        write_sparse_metadata(&mut buf, 2).unwrap();
        write_sparse_chunks(&mut buf, &sets, &dict, GEMPACK_VECTOR_LIMIT).unwrap();

        let mut cur = &buf[..];
        let (nonzero_count, _) = read_sparse_metadata(&mut cur).unwrap();
        assert_eq!(nonzero_count, 2);
        let read_back = read_sparse_chunks(&mut cur, &sets, nonzero_count).unwrap();
        assert_eq!(read_back.len(), 9);
        assert_eq!(
            read_back.get(&KeySequence::new(vec!["r1".to_string(), "c2".to_string()])),
            Some(&5.0)
        );
        assert_eq!(
            read_back.get(&KeySequence::new(vec!["r2".to_string(), "c1".to_string()])),
            Some(&0.0)
        );
    }

    #[test]
    fn sparse_all_zero_has_no_chunks() {
        let sets = vec![Set::new("AX", vec!["1".into(), "2".into()])];
        let dict: SequenceDictionary<String, f32> = SequenceDictionary::new(sets.clone());
        let mut buf = Vec::new();
        write_sparse_metadata(&mut buf, 0).unwrap();
        write_sparse_chunks(&mut buf, &sets, &dict, GEMPACK_VECTOR_LIMIT).unwrap();

        let mut cur = &buf[..];
        let (nonzero_count, _) = read_sparse_metadata(&mut cur).unwrap();
        assert_eq!(nonzero_count, 0);
        let read_back = read_sparse_chunks(&mut cur, &sets, nonzero_count).unwrap();
        assert_eq!(read_back.len(), 2);
        assert_eq!(
            read_back.get(&KeySequence::new(vec!["1".to_string()])),
            Some(&0.0)
        );
    }
}
