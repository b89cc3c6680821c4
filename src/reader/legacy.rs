//! `RL` — legacy real array (§4.4.3). Read-only: the writer refuses to emit
//! this record kind (see [`crate::error::WriterError::LegacyRecordUnsupported`]).

use std::io::Read;

use crate::error::Result;
use crate::framing::{self, Cursor};
use crate::key_sequence::KeySequence;
use crate::reader::char_vector::synthetic_index_labels;
use crate::sequence_dictionary::SequenceDictionary;
use crate::set_expansion::Set;

/// Reads an `RL` record's single dense block, keyed by a synthetic `INDEX`
/// set over the flattened logical array.
pub fn read_legacy<R: Read>(
    reader: &mut R,
    dimensions: &[i32],
) -> Result<SequenceDictionary<String, f32>> {
    let logical_len: usize = dimensions.iter().map(|&d| d.max(0) as usize).product::<usize>().max(1);

    let payload = framing::read_block(reader, "RL data block")?;
    let mut cur = Cursor::new(&payload);

    let labels = synthetic_index_labels(logical_len);
    let set = Set::new("INDEX", labels.clone());
    let mut dict = SequenceDictionary::new(vec![set]);
    for label in &labels {
        let value = cur.read_f32()?;
        dict.insert(KeySequence::new(vec![label.clone()]), value);
    }
    Ok(dict)
}
