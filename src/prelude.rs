//! Convenience re-exports for downstream crates.

pub use crate::error::{Error, Result};
pub use crate::file::HeaderArrayFile;
pub use crate::header_array::{HeaderArray, HeaderArrayData, HeaderArrayMeta, RecordType, Storage};
pub use crate::key_sequence::KeySequence;
pub use crate::reader::BinaryReader;
pub use crate::sequence_dictionary::SequenceDictionary;
pub use crate::set_expansion::{Set, SetExpansion};
pub use crate::solution::SolutionReconstructor;
pub use crate::validate::validate_sets;
pub use crate::writer::{BinaryWriter, BinaryWriterBuilder};
