//! [`HeaderArray`] — the core entity of the data model (§3).

use crate::error::{Error, RecordError, Result};
use crate::key_sequence::KeySequence;
use crate::sequence_dictionary::SequenceDictionary;
use crate::set_expansion::Set;

/// The five on-disk record kinds (§6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// `1C` — character vector.
    Char,
    /// `RE` — real array with explicit sets.
    Real,
    /// `RL` — legacy real array (read-only; the writer refuses to emit it).
    LegacyReal,
    /// `2I` — two-dimensional integer.
    Int2D,
    /// `2R` — two-dimensional real.
    Real2D,
}

impl RecordType {
    #[must_use]
    pub fn tag(self) -> &'static [u8; 2] {
        match self {
            RecordType::Char => b"1C",
            RecordType::Real => b"RE",
            RecordType::LegacyReal => b"RL",
            RecordType::Int2D => b"2I",
            RecordType::Real2D => b"2R",
        }
    }

    pub fn from_tag(tag: [u8; 2]) -> Result<Self> {
        match &tag {
            b"1C" => Ok(RecordType::Char),
            b"RE" => Ok(RecordType::Real),
            b"RL" => Ok(RecordType::LegacyReal),
            b"2I" => Ok(RecordType::Int2D),
            b"2R" => Ok(RecordType::Real2D),
            _ => Err(RecordError::UnknownType { tag }.into()),
        }
    }
}

/// Dense (`FULL`) or sparse (`SPSE`) storage (§3, §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Storage {
    Full,
    Sparse,
}

impl Storage {
    #[must_use]
    pub fn tag(self) -> &'static [u8; 4] {
        match self {
            Storage::Full => b"FULL",
            Storage::Sparse => b"SPSE",
        }
    }

    pub fn from_tag(tag: [u8; 4]) -> Result<Self> {
        match &tag {
            b"FULL" => Ok(Storage::Full),
            b"SPSE" => Ok(Storage::Sparse),
            _ => Err(RecordError::UnknownStorage { tag }.into()),
        }
    }
}

/// The typed payload of a [`HeaderArray`], dispatching on value type the way
/// the source's non-generic interface + generic implementation pair would
/// (§9 "Cyclic / interface dispatch").
#[derive(Clone, Debug)]
pub enum HeaderArrayData {
    /// `1C` values: a dictionary of strings.
    Chars(SequenceDictionary<String, String>),
    /// `2I` values: a dictionary of signed 32-bit integers.
    Ints(SequenceDictionary<String, i32>),
    /// `RE`, `RL`, `2R` values: a dictionary of 32-bit floats.
    Floats(SequenceDictionary<String, f32>),
}

impl HeaderArrayData {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            HeaderArrayData::Chars(d) => d.len(),
            HeaderArrayData::Ints(d) => d.len(),
            HeaderArrayData::Floats(d) => d.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn sets(&self) -> &[Set] {
        match self {
            HeaderArrayData::Chars(d) => d.sets(),
            HeaderArrayData::Ints(d) => d.sets(),
            HeaderArrayData::Floats(d) => d.sets(),
        }
    }

    #[must_use]
    pub fn as_floats(&self) -> Option<&SequenceDictionary<String, f32>> {
        match self {
            HeaderArrayData::Floats(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_ints(&self) -> Option<&SequenceDictionary<String, i32>> {
        match self {
            HeaderArrayData::Ints(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_chars(&self) -> Option<&SequenceDictionary<String, String>> {
        match self {
            HeaderArrayData::Chars(d) => Some(d),
            _ => None,
        }
    }
}

/// Shared metadata accessible uniformly regardless of the array's value
/// type. Blanket-usable through `&HeaderArray`/`Box<HeaderArray>` via
/// `auto_impl`, mirroring the teacher's use of `auto_impl` on its
/// processor-shaped traits.
#[auto_impl::auto_impl(&, Box)]
pub trait HeaderArrayMeta {
    fn header(&self) -> &str;
    fn coefficient(&self) -> &str;
    fn description(&self) -> &str;
    fn record_type(&self) -> RecordType;
    fn storage(&self) -> Storage;
    fn dimensions(&self) -> &[i32];
}

/// The canonical record: header, description, type, dimensions, sets, and
/// entries (§3).
#[derive(Clone, Debug)]
pub struct HeaderArray {
    header: String,
    coefficient: String,
    description: String,
    record_type: RecordType,
    storage: Storage,
    dimensions: Vec<i32>,
    data: HeaderArrayData,
}

impl HeaderArray {
    /// Constructs a new `HeaderArray`, validating the invariants in §3:
    /// `record_type` is congruent with `data`'s variant (`Char`↔`Chars`,
    /// `Real`/`LegacyReal`/`Real2D`↔`Floats`, `Int2D`↔`Ints`),
    /// `len(sets) == len(dimensions)`, and each set's label count matches
    /// its axis's dimension.
    pub fn new(
        header: impl Into<String>,
        coefficient: impl Into<String>,
        description: impl Into<String>,
        record_type: RecordType,
        storage: Storage,
        dimensions: Vec<i32>,
        data: HeaderArrayData,
    ) -> Result<Self> {
        let data_kind = match &data {
            HeaderArrayData::Chars(_) => "Chars",
            HeaderArrayData::Ints(_) => "Ints",
            HeaderArrayData::Floats(_) => "Floats",
        };
        let congruent = matches!(
            (record_type, &data),
            (RecordType::Char, HeaderArrayData::Chars(_))
                | (
                    RecordType::Real | RecordType::LegacyReal | RecordType::Real2D,
                    HeaderArrayData::Floats(_)
                )
                | (RecordType::Int2D, HeaderArrayData::Ints(_))
        );
        if !congruent {
            return Err(RecordError::DataKindMismatch {
                record_type,
                data_kind,
            }
            .into());
        }

        let sets = data.sets();
        if sets.len() != dimensions.len() {
            return Err(Error::InvalidArgument(format!(
                "array declares {} sets but {} dimensions",
                sets.len(),
                dimensions.len()
            )));
        }
        for (axis, (set, &dim)) in sets.iter().zip(dimensions.iter()).enumerate() {
            if set.len() != dim as usize {
                return Err(RecordError::SetLabelLengthMismatch {
                    axis,
                    declared: set.len(),
                    dimension: dim as usize,
                }
                .into());
            }
        }
        Ok(Self {
            header: header.into(),
            coefficient: coefficient.into(),
            description: description.into(),
            record_type,
            storage,
            dimensions,
            data,
        })
    }

    #[must_use]
    pub fn data(&self) -> &HeaderArrayData {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> HeaderArrayData {
        self.data
    }

    #[must_use]
    pub fn sets(&self) -> &[Set] {
        self.data.sets()
    }

    /// Returns a renamed copy of this array, sharing its entries (§3
    /// Lifecycle: "`with(header)` returns a renamed copy sharing entries").
    #[must_use]
    pub fn with_header(&self, header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..self.clone()
        }
    }

    /// Checks the product-of-dimensions invariant (§8, property 1).
    #[must_use]
    pub fn logical_len(&self) -> usize {
        self.dimensions.iter().map(|&d| d as usize).product()
    }

    /// A key sequence with one key per set, used to address an entry.
    #[must_use]
    pub fn key(&self, components: Vec<String>) -> KeySequence<String> {
        KeySequence::new(components)
    }
}

impl HeaderArrayMeta for HeaderArray {
    fn header(&self) -> &str {
        &self.header
    }

    fn coefficient(&self) -> &str {
        &self.coefficient
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn record_type(&self) -> RecordType {
        self.record_type
    }

    fn storage(&self) -> Storage {
        self.storage
    }

    fn dimensions(&self) -> &[i32] {
        &self.dimensions
    }
}
