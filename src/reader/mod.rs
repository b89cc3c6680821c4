//! Parses HAR records into [`HeaderArray`] values (§4.4).
//!
//! [`BinaryReader::read_all`] is the ordinary entry point for opening a
//! `.har` file; [`BinaryReader::read_one`] reads a single record and is used
//! by the solution reconstructor's SL4 ingestion path as well.

pub mod char_vector;
pub mod legacy;
pub mod metadata;
pub mod real_array;
pub mod twodim;

use std::io::Read;

use tracing::{debug, trace};

use crate::error::Result;
use crate::file::HeaderArrayFile;
use crate::header_array::{HeaderArray, HeaderArrayData, RecordType, Storage};
use crate::key_sequence::KeySequence;
use crate::sequence_dictionary::SequenceDictionary;
use crate::set_expansion::Set;

/// Stateless entry point for HAR record parsing.
pub struct BinaryReader;

impl BinaryReader {
    /// Reads every record from `reader` into a [`HeaderArrayFile`] in file
    /// order, stopping at the first clean end-of-stream.
    pub fn read_all<R: Read>(reader: R) -> Result<HeaderArrayFile> {
        Self::read_all_cancellable(reader, || false)
    }

    /// As [`Self::read_all`], but polls `should_cancel` between records and
    /// stops early (returning what has been read so far) once it answers
    /// `true`. A cancellation never interrupts a record already in progress
    /// (§5 Cancellation).
    pub fn read_all_cancellable<R: Read>(
        mut reader: R,
        should_cancel: impl Fn() -> bool,
    ) -> Result<HeaderArrayFile> {
        let mut file = HeaderArrayFile::new();
        loop {
            if should_cancel() {
                debug!("cancellation requested between records, stopping");
                break;
            }
            match Self::read_one(&mut reader)? {
                Some(array) => file.insert(array)?,
                None => break,
            }
        }
        Ok(file)
    }

    /// Reads a single record. Returns `Ok(None)` at a clean record boundary
    /// EOF; any truncation mid-record is a fatal validation failure.
    pub fn read_one<R: Read>(reader: &mut R) -> Result<Option<HeaderArray>> {
        let Some(raw_header) = crate::framing::read_header_string(reader)? else {
            return Ok(None);
        };
        let header = raw_header.trim().to_string();
        trace!(header = %header, "reading record");

        let metadata_payload = crate::framing::read_block(reader, "record metadata")?;
        let meta = metadata::parse_metadata(&metadata_payload)?;

        let array = match meta.record_type {
            RecordType::Char => {
                let items = char_vector::read_char_stream(reader, "1C values")?;
                let dict = index_keyed(items);
                let dims = vec![dict.len() as i32];
                HeaderArray::new(
                    &header,
                    &header,
                    meta.description,
                    RecordType::Char,
                    meta.storage,
                    dims,
                    HeaderArrayData::Chars(dict),
                )?
            }
            RecordType::Real => {
                let (sets, coefficient) = real_array::read_set_header(reader, &header)?;
                let dict = match meta.storage {
                    Storage::Full => {
                        let dims = real_array::read_record_dimensions(reader)?;
                        real_array::read_dense_segments(reader, &header, &sets, &dims)?
                    }
                    Storage::Sparse => {
                        let (nonzero_count, _) = real_array::read_sparse_metadata(reader)?;
                        real_array::read_sparse_chunks(reader, &sets, nonzero_count)?
                    }
                };
                let dims: Vec<i32> = sets.iter().map(|s| s.len() as i32).collect();
                HeaderArray::new(
                    &header,
                    &coefficient,
                    meta.description,
                    RecordType::Real,
                    meta.storage,
                    dims,
                    HeaderArrayData::Floats(dict),
                )?
            }
            RecordType::LegacyReal => {
                let dict = legacy::read_legacy(reader, &meta.dimensions)?;
                let dims = vec![dict.len() as i32];
                HeaderArray::new(
                    &header,
                    &header,
                    meta.description,
                    RecordType::LegacyReal,
                    meta.storage,
                    dims,
                    HeaderArrayData::Floats(dict),
                )?
            }
            RecordType::Int2D => {
                let dict = twodim::read_twodim_ints(reader)?;
                let dims = vec![dict.len() as i32];
                HeaderArray::new(
                    &header,
                    &header,
                    meta.description,
                    RecordType::Int2D,
                    meta.storage,
                    dims,
                    HeaderArrayData::Ints(dict),
                )?
            }
            RecordType::Real2D => {
                let dict = twodim::read_twodim_floats(reader)?;
                let dims = vec![dict.len() as i32];
                HeaderArray::new(
                    &header,
                    &header,
                    meta.description,
                    RecordType::Real2D,
                    meta.storage,
                    dims,
                    HeaderArrayData::Floats(dict),
                )?
            }
        };

        Ok(Some(array))
    }
}

fn index_keyed(items: Vec<String>) -> SequenceDictionary<String, String> {
    let labels = char_vector::synthetic_index_labels(items.len());
    let set = Set::new("INDEX", labels.clone());
    let mut dict = SequenceDictionary::new(vec![set]);
    for (label, item) in labels.into_iter().zip(items) {
        dict.insert(KeySequence::new(vec![label]), item);
    }
    dict
}
