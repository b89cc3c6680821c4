//! Serialises [`HeaderArray`] values back into HAR records (§4.5).
//!
//! Construction goes through [`BinaryWriterBuilder`], mirroring the
//! teacher's writer-builder shape, so the per-vector element limit can be
//! overridden by tests without materialising multi-million-element fixtures.

pub mod partition;

use std::io::Write;

use tracing::trace;

use crate::error::{Result, WriterError};
use crate::file::HeaderArrayFile;
use crate::header_array::{HeaderArray, HeaderArrayMeta, RecordType};
use crate::reader::{char_vector, metadata, real_array, twodim};
use crate::set_expansion::SetExpansion;
use partition::GEMPACK_VECTOR_LIMIT;

/// Builds a [`BinaryWriter`], optionally overriding the per-vector element
/// limit used when partitioning oversized dense/sparse/flat arrays.
#[derive(Clone, Copy, Debug)]
pub struct BinaryWriterBuilder {
    segment_limit: usize,
}

impl Default for BinaryWriterBuilder {
    fn default() -> Self {
        Self {
            segment_limit: GEMPACK_VECTOR_LIMIT,
        }
    }
}

impl BinaryWriterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the default Gempack element-per-vector limit (tests use a
    /// small value to exercise segmentation, §4.5.1).
    pub fn segment_limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(WriterError::InvalidSegmentLimit(limit).into());
        }
        self.segment_limit = limit;
        Ok(self)
    }

    pub fn build<W: Write>(self, writer: W) -> Result<BinaryWriter<W>> {
        Ok(BinaryWriter {
            writer,
            segment_limit: self.segment_limit,
        })
    }
}

/// Writes `HeaderArray` values as HAR records.
pub struct BinaryWriter<W> {
    writer: W,
    segment_limit: usize,
}

impl<W: Write> BinaryWriter<W> {
    /// Writes every array in `file`, in the collection's stored (insertion)
    /// order — never alphabetic order, since on-disk order is
    /// caller-controlled (§4.5.1).
    pub fn write_all(&mut self, file: &HeaderArrayFile) -> Result<()> {
        for array in file.iter() {
            self.write_one(array)?;
        }
        Ok(())
    }

    /// Writes a single array. Refuses `RL` (legacy real array), which the
    /// format only supports reading (§4.4.3).
    pub fn write_one(&mut self, array: &HeaderArray) -> Result<()> {
        trace!(header = %array.header(), record_type = ?array.record_type(), "writing record");
        if matches!(array.record_type(), RecordType::LegacyReal) {
            return Err(WriterError::LegacyRecordUnsupported.into());
        }

        crate::framing::write_header_string(&mut self.writer, array.header())?;

        match array.record_type() {
            RecordType::Char => self.write_char(array),
            RecordType::Real => self.write_real(array),
            RecordType::Int2D => self.write_int2d(array),
            RecordType::Real2D => self.write_real2d(array),
            RecordType::LegacyReal => unreachable!("refused above"),
        }
    }

    fn write_char(&mut self, array: &HeaderArray) -> Result<()> {
        let dict = array
            .data()
            .as_chars()
            .expect("Char record carries Chars data");
        let items: Vec<String> = dict.iter_logical().map(|(_, v)| v.clone()).collect();
        let width = items.iter().map(String::len).max().unwrap_or(0).max(1);

        let payload = metadata::write_metadata(
            RecordType::Char,
            array.storage(),
            array.description(),
            &[items.len() as i32, width as i32],
        );
        crate::framing::write_block(&mut self.writer, &payload)?;

        char_vector::write_char_stream(&mut self.writer, &items, width, self.segment_limit)
    }

    fn write_real(&mut self, array: &HeaderArray) -> Result<()> {
        let dict = array
            .data()
            .as_floats()
            .expect("Real record carries Floats data");
        let sets = array.sets();

        let payload = metadata::write_metadata(
            RecordType::Real,
            array.storage(),
            array.description(),
            array.dimensions(),
        );
        crate::framing::write_block(&mut self.writer, &payload)?;
        real_array::write_set_header(&mut self.writer, sets, array.coefficient())?;

        match array.storage() {
            crate::header_array::Storage::Full => {
                real_array::write_record_dimensions(&mut self.writer, array.dimensions())?;
                real_array::write_dense_segments(
                    &mut self.writer,
                    sets,
                    array.dimensions(),
                    dict,
                    self.segment_limit,
                )
            }
            crate::header_array::Storage::Sparse => {
                let nonzero_count = SetExpansion::new(sets)
                    .filter(|k| dict.get(k).copied().unwrap_or(0.0) != 0.0)
                    .count();
                real_array::write_sparse_metadata(&mut self.writer, nonzero_count)?;
                real_array::write_sparse_chunks(&mut self.writer, sets, dict, self.segment_limit)
            }
        }
    }

    fn write_int2d(&mut self, array: &HeaderArray) -> Result<()> {
        let dict = array
            .data()
            .as_ints()
            .expect("Int2D record carries Ints data");
        let values: Vec<i32> = dict.iter_logical().map(|(_, v)| *v).collect();

        let payload = metadata::write_metadata(
            RecordType::Int2D,
            array.storage(),
            array.description(),
            array.dimensions(),
        );
        crate::framing::write_block(&mut self.writer, &payload)?;
        twodim::write_twodim_ints(&mut self.writer, &values, self.segment_limit)
    }

    fn write_real2d(&mut self, array: &HeaderArray) -> Result<()> {
        let dict = array
            .data()
            .as_floats()
            .expect("Real2D record carries Floats data");
        let values: Vec<f32> = dict.iter_logical().map(|(_, v)| *v).collect();

        let payload = metadata::write_metadata(
            RecordType::Real2D,
            array.storage(),
            array.description(),
            array.dimensions(),
        );
        crate::framing::write_block(&mut self.writer, &payload)?;
        twodim::write_twodim_floats(&mut self.writer, &values, self.segment_limit)
    }
}
