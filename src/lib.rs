#![allow(clippy::module_inception)]

pub mod error;
pub mod prelude;

mod file;
mod framing;
mod header_array;
mod key_sequence;
mod reader;
mod sequence_dictionary;
mod set_expansion;
mod solution;
mod validate;
mod writer;

pub use error::{Error, Result};
pub use file::HeaderArrayFile;
pub use header_array::{HeaderArray, HeaderArrayData, HeaderArrayMeta, RecordType, Storage};
pub use key_sequence::KeySequence;
pub use reader::BinaryReader;
pub use sequence_dictionary::SequenceDictionary;
pub use set_expansion::{Set, SetExpansion};
pub use solution::SolutionReconstructor;
pub use validate::validate_sets;
pub use writer::{BinaryWriter, BinaryWriterBuilder};
