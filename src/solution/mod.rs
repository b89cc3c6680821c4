//! Reconstructs per-variable result arrays from an SL4 solution file's
//! auxiliary index tables (§4.6).

mod tables;

use std::thread;

use tracing::debug;

use crate::error::{Result, SolutionError};
use crate::file::HeaderArrayFile;
use crate::header_array::{HeaderArray, HeaderArrayData, RecordType, Storage};
use crate::sequence_dictionary::SequenceDictionary;
use crate::set_expansion::{Set, SetExpansion};
use tables::SolutionTables;

/// A variable is retained for reconstruction only if its `VCS0` code marks
/// it backsolved (`b`) or condensed (`c`); other kinds (exogenous,
/// ordinary endogenous) are not emitted.
fn is_retained(kind: &str) -> bool {
    matches!(
        kind.trim().chars().next().map(|c| c.to_ascii_lowercase()),
        Some('b') | Some('c')
    )
}

/// Reconstructs SL4 result arrays from their constituent index tables.
pub struct SolutionReconstructor;

impl SolutionReconstructor {
    /// Reconstructs every backsolved/condensed variable in `file`,
    /// fanning per-variable work out across worker threads once the
    /// (sequentially validated) auxiliary tables are built, then restoring
    /// ascending `variable_index` order (§4.6.1).
    pub fn reconstruct_all(file: &HeaderArrayFile) -> Result<HeaderArrayFile> {
        let tables = SolutionTables::build(file)?;

        let retained: Vec<usize> = (0..tables.variable_count())
            .filter(|&i| is_retained(&tables.variable_kinds[i]))
            .collect();

        if retained.is_empty() {
            return Ok(HeaderArrayFile::new());
        }

        let worker_count = num_cpus::get().max(1).min(retained.len());
        let chunk_size = retained.len().div_ceil(worker_count);

        let results: Vec<Result<(usize, HeaderArray)>> = thread::scope(|scope| {
            let handles: Vec<_> = retained
                .chunks(chunk_size.max(1))
                .map(|chunk| {
                    let tables = &tables;
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|&i| reconstruct_variable(tables, i).map(|a| (i, a)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().expect("reconstruction worker panicked"))
                .collect()
        });

        let mut indexed = Vec::with_capacity(results.len());
        for result in results {
            indexed.push(result?);
        }
        indexed.sort_by_key(|(i, _)| *i);

        HeaderArrayFile::from_vec(indexed.into_iter().map(|(_, array)| array).collect())
    }
}

fn reconstruct_variable(tables: &SolutionTables, i: usize) -> Result<HeaderArray> {
    let count_v = tables.element_count[i].max(0) as usize;
    let mut values = vec![0.0f32; count_v];

    // Step 2: cumulative copy.
    if tables.cumulative_pointer[i] != 0 {
        let start = (tables.cumulative_pointer[i] - 1).max(0) as usize;
        let cmnd = (tables.cumulative_count[i].max(0) as usize).min(count_v);
        for k in 0..cmnd {
            values[k] = *tables
                .cumulative_values
                .get(start + k)
                .ok_or(SolutionError::MissingHeader("CUMS"))?;
        }
    }

    // Step 3: shift for exogenous positions.
    let orex = tables.exogenous_count[i].max(0) as usize;
    if orex == count_v {
        values.iter_mut().for_each(|v| *v = 0.0);
    } else {
        let offset = tables.exogenous_offset(i);
        for k in 0..orex {
            let pointer = *tables
                .exogenous_positions
                .get(offset + k)
                .ok_or(SolutionError::ExogenousPointerOutOfRange {
                    variable: i,
                    pointer: offset + k,
                    len: tables.exogenous_positions.len(),
                })?;
            let pos = (pointer - 1).max(0) as usize;
            if pos >= values.len() {
                return Err(SolutionError::ExogenousPointerOutOfRange {
                    variable: i,
                    pointer: pos,
                    len: values.len(),
                }
                .into());
            }
            values.insert(pos, 0.0);
            values.pop();
        }
    }

    // Step 4: apply shocks.
    let shock_count = tables.shock_count[i].max(0);
    if shock_count > 0 {
        debug!(
            variable = i,
            shock_count, "applying shocks using the literal source offset predicate"
        );
        let offset = tables.shock_offset(i);
        let shoc_start = (tables.shock_pointer[i] - 1).max(0) as usize;
        for k in 0..shock_count as usize {
            let pointer = *tables
                .shock_positions
                .get(offset + k)
                .ok_or(SolutionError::ShockPointerOutOfRange {
                    variable: i,
                    pointer: offset + k,
                    len: tables.shock_positions.len(),
                })?;
            let pos = (pointer - 1).max(0) as usize;
            if pos >= values.len() {
                return Err(SolutionError::ShockPointerOutOfRange {
                    variable: i,
                    pointer: pos,
                    len: values.len(),
                }
                .into());
            }
            let value = *tables
                .shock_values
                .get(shoc_start + k)
                .ok_or(SolutionError::ShockPointerOutOfRange {
                    variable: i,
                    pointer: shoc_start + k,
                    len: tables.shock_values.len(),
                })?;
            values[pos] = value;
        }
    }

    // Step 5: assemble sets and emit.
    let set_count = tables.set_count[i].max(0) as usize;
    let set_offset = (tables.set_offset[i] - 1).max(0) as usize;
    let mut sets = Vec::with_capacity(set_count);
    for k in 0..set_count {
        let set_index = *tables
            .set_indices
            .get(set_offset + k)
            .ok_or(SolutionError::UnknownSetIndex(set_offset + k))?;
        let (name, labels) = tables.set_at(set_index)?;
        sets.push(Set::new(name, labels.to_vec()));
    }

    let mut dict: SequenceDictionary<String, f32> = SequenceDictionary::new(sets.clone());
    for (key, value) in SetExpansion::new(&sets).zip(values) {
        dict.insert(key, value);
    }

    let name = tables.names[i].trim().to_string();
    let dims: Vec<i32> = sets.iter().map(|s| s.len() as i32).collect();

    HeaderArray::new(
        &name,
        &name,
        tables.descriptions[i].clone(),
        RecordType::Real,
        Storage::Full,
        dims,
        HeaderArrayData::Floats(dict),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header_array::{HeaderArrayMeta, RecordType as RT, Storage as St};
    use crate::key_sequence::KeySequence;

    fn int2d(header: &str, values: Vec<i32>) -> HeaderArray {
        let labels = crate::reader::char_vector::synthetic_index_labels(values.len());
        let sets = vec![Set::new("INDEX", labels.clone())];
        let mut dict: SequenceDictionary<String, i32> = SequenceDictionary::new(sets);
        for (label, v) in labels.into_iter().zip(values) {
            dict.insert(KeySequence::new(vec![label]), v);
        }
        HeaderArray::new(
            header,
            header,
            "",
            RT::Int2D,
            St::Full,
            vec![dict.len() as i32],
            HeaderArrayData::Ints(dict),
        )
        .unwrap()
    }

    fn real2d(header: &str, values: Vec<f32>) -> HeaderArray {
        let labels = crate::reader::char_vector::synthetic_index_labels(values.len());
        let sets = vec![Set::new("INDEX", labels.clone())];
        let mut dict: SequenceDictionary<String, f32> = SequenceDictionary::new(sets);
        for (label, v) in labels.into_iter().zip(values) {
            dict.insert(KeySequence::new(vec![label]), v);
        }
        HeaderArray::new(
            header,
            header,
            "",
            RT::Real2D,
            St::Full,
            vec![dict.len() as i32],
            HeaderArrayData::Floats(dict),
        )
        .unwrap()
    }

    fn char1c(header: &str, values: Vec<&str>) -> HeaderArray {
        let labels = crate::reader::char_vector::synthetic_index_labels(values.len());
        let sets = vec![Set::new("INDEX", labels.clone())];
        let mut dict: SequenceDictionary<String, String> = SequenceDictionary::new(sets);
        for (label, v) in labels.into_iter().zip(values) {
            dict.insert(KeySequence::new(vec![label]), v.to_string());
        }
        HeaderArray::new(
            header,
            header,
            "",
            RT::Char,
            St::Full,
            vec![dict.len() as i32],
            HeaderArrayData::Chars(dict),
        )
        .unwrap()
    }

    /// Builds the minimal single-variable SL4 fixture from §8 scenario S6:
    /// `VNCP=4, OREX=1 (position 3), CMND=3 from CUMS=[10,20,30],
    /// SHCK=1 (position 2) from SHOC=[99]`. Expected reconstructed values:
    /// `[10, 99, 0, 30]`.
    fn s6_fixture() -> HeaderArrayFile {
        let mut file = HeaderArrayFile::new();
        file.insert(char1c("VCNM", vec!["VAR "])).unwrap();
        file.insert(char1c("VCL0", vec!["a variable"])).unwrap();
        file.insert(char1c("VCLE", vec!["ordinary"])).unwrap();
        file.insert(char1c("VCT0", vec!["ordinary"])).unwrap();
        file.insert(char1c("VCS0", vec!["b"])).unwrap();
        file.insert(int2d("VCNI", vec![1])).unwrap();
        file.insert(int2d("VCSP", vec![1])).unwrap();
        file.insert(int2d("VCSN", vec![1])).unwrap();
        file.insert(int2d("VNCP", vec![4])).unwrap();

        file.insert(char1c("STNM", vec!["REG "])).unwrap();
        file.insert(char1c("STLB", vec!["regions"])).unwrap();
        file.insert(char1c("STTP", vec![" "])).unwrap();
        file.insert(int2d("SSZ", vec![4])).unwrap();
        file.insert(char1c("STEL", vec!["r1", "r2", "r3", "r4"]))
            .unwrap();

        file.insert(int2d("PCUM", vec![1])).unwrap();
        file.insert(int2d("CMND", vec![3])).unwrap();
        file.insert(real2d("CUMS", vec![10.0, 20.0, 30.0])).unwrap();

        file.insert(int2d("OREX", vec![1])).unwrap();
        file.insert(int2d("OREL", vec![3])).unwrap();

        file.insert(int2d("PSHK", vec![1])).unwrap();
        file.insert(int2d("SHCK", vec![1])).unwrap();
        file.insert(int2d("SHCL", vec![2])).unwrap();
        file.insert(real2d("SHOC", vec![99.0])).unwrap();

        file
    }

    #[test]
    fn reconstructs_backsolved_variable_with_shock_s6() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .try_init();
        let file = s6_fixture();
        let result = SolutionReconstructor::reconstruct_all(&file).unwrap();
        assert_eq!(result.len(), 1);
        let array = result.iter().next().unwrap();
        assert_eq!(array.header(), "VAR");
        let values: Vec<f32> = array
            .data()
            .as_floats()
            .unwrap()
            .iter_logical()
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(values, vec![10.0, 99.0, 0.0, 30.0]);
    }

    #[test]
    fn missing_header_is_reported() {
        let mut file = s6_fixture();
        // Remove a required header by rebuilding without it.
        let mut rebuilt = HeaderArrayFile::new();
        for array in file.iter() {
            if array.header() != "SHOC" {
                rebuilt.insert(array.clone()).unwrap();
            }
        }
        file = rebuilt;
        let err = SolutionReconstructor::reconstruct_all(&file).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Solution(SolutionError::MissingHeader("SHOC"))
        ));
    }

    #[test]
    fn fully_exogenous_variable_yields_all_zero_before_shocks() {
        let mut file = HeaderArrayFile::new();
        file.insert(char1c("VCNM", vec!["EXO "])).unwrap();
        file.insert(char1c("VCL0", vec![""])).unwrap();
        file.insert(char1c("VCLE", vec![""])).unwrap();
        file.insert(char1c("VCT0", vec![""])).unwrap();
        file.insert(char1c("VCS0", vec!["c"])).unwrap();
        file.insert(int2d("VCNI", vec![1])).unwrap();
        file.insert(int2d("VCSP", vec![1])).unwrap();
        file.insert(int2d("VCSN", vec![1])).unwrap();
        file.insert(int2d("VNCP", vec![2])).unwrap();
        file.insert(char1c("STNM", vec!["REG "])).unwrap();
        file.insert(char1c("STLB", vec![""])).unwrap();
        file.insert(char1c("STTP", vec![" "])).unwrap();
        file.insert(int2d("SSZ", vec![2])).unwrap();
        file.insert(char1c("STEL", vec!["r1", "r2"])).unwrap();
        file.insert(int2d("PCUM", vec![0])).unwrap();
        file.insert(int2d("CMND", vec![0])).unwrap();
        file.insert(real2d("CUMS", vec![])).unwrap();
        file.insert(int2d("OREX", vec![2])).unwrap();
        file.insert(int2d("OREL", vec![])).unwrap();
        file.insert(int2d("PSHK", vec![1])).unwrap();
        file.insert(int2d("SHCK", vec![0])).unwrap();
        file.insert(int2d("SHCL", vec![])).unwrap();
        file.insert(real2d("SHOC", vec![])).unwrap();

        let result = SolutionReconstructor::reconstruct_all(&file).unwrap();
        let array = result.iter().next().unwrap();
        let values: Vec<f32> = array
            .data()
            .as_floats()
            .unwrap()
            .iter_logical()
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(values, vec![0.0, 0.0]);
    }
}
