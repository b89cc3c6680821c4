//! Extracts the flat auxiliary index tables an SL4 file packages as
//! ordinary HAR records (§4.6).

use crate::error::{Result, SolutionError};
use crate::file::HeaderArrayFile;
use crate::header_array::HeaderArray;

const REQUIRED_HEADERS: &[&str] = &[
    "VCNM", "VCL0", "VCLE", "VCT0", "VCS0", "VCNI", "VCSP", "VCSN", "VNCP", "STNM", "STLB",
    "STTP", "SSZ", "STEL", "PCUM", "CMND", "CUMS", "OREX", "OREL", "PSHK", "SHCK", "SHCL", "SHOC",
];

/// All validation tables an SL4 file must carry, flattened from their HAR
/// records into plain index-addressable vectors.
pub struct SolutionTables {
    pub names: Vec<String>,
    pub descriptions: Vec<String>,
    pub unit_kinds: Vec<String>,
    pub change_kinds: Vec<String>,
    pub variable_kinds: Vec<String>,
    pub set_count: Vec<i32>,
    pub set_offset: Vec<i32>,
    pub set_indices: Vec<i32>,
    pub element_count: Vec<i32>,

    pub set_names: Vec<String>,
    pub set_sizes: Vec<i32>,
    pub set_elements: Vec<String>,
    set_catalog_offset: Vec<usize>,

    pub cumulative_pointer: Vec<i32>,
    pub cumulative_count: Vec<i32>,
    pub cumulative_values: Vec<f32>,

    pub exogenous_count: Vec<i32>,
    pub exogenous_positions: Vec<i32>,
    exogenous_offset: Vec<i64>,

    pub shock_pointer: Vec<i32>,
    pub shock_count: Vec<i32>,
    pub shock_positions: Vec<i32>,
    pub shock_values: Vec<f32>,
    shock_offset: Vec<i64>,
}

fn required<'a>(file: &'a HeaderArrayFile, header: &'static str) -> Result<&'a HeaderArray> {
    file.get(header)
        .ok_or_else(|| SolutionError::MissingHeader(header).into())
}

fn flat_strings(array: &HeaderArray, header: &'static str) -> Result<Vec<String>> {
    let dict = array
        .data()
        .as_chars()
        .ok_or(SolutionError::MissingHeader(header))?;
    Ok(dict.iter_logical().map(|(_, v)| v.clone()).collect())
}

fn flat_ints(array: &HeaderArray, header: &'static str) -> Result<Vec<i32>> {
    let dict = array
        .data()
        .as_ints()
        .ok_or(SolutionError::MissingHeader(header))?;
    Ok(dict.iter_logical().map(|(_, v)| *v).collect())
}

fn flat_floats(array: &HeaderArray, header: &'static str) -> Result<Vec<f32>> {
    let dict = array
        .data()
        .as_floats()
        .ok_or(SolutionError::MissingHeader(header))?;
    Ok(dict.iter_logical().map(|(_, v)| *v).collect())
}

impl SolutionTables {
    /// Validates that every required SL4 header is present, then flattens
    /// each into a plain vector. Fails fast: no variable reconstruction is
    /// attempted if any table is missing or malformed.
    pub fn build(file: &HeaderArrayFile) -> Result<Self> {
        for header in REQUIRED_HEADERS {
            required(file, header)?;
        }

        let names = flat_strings(required(file, "VCNM")?, "VCNM")?;
        let descriptions = flat_strings(required(file, "VCL0")?, "VCL0")?;
        let unit_kinds = flat_strings(required(file, "VCLE")?, "VCLE")?;
        let change_kinds = flat_strings(required(file, "VCT0")?, "VCT0")?;
        let variable_kinds = flat_strings(required(file, "VCS0")?, "VCS0")?;
        let set_count = flat_ints(required(file, "VCNI")?, "VCNI")?;
        let set_offset = flat_ints(required(file, "VCSP")?, "VCSP")?;
        let set_indices = flat_ints(required(file, "VCSN")?, "VCSN")?;
        let element_count = flat_ints(required(file, "VNCP")?, "VNCP")?;

        let set_names = flat_strings(required(file, "STNM")?, "STNM")?;
        let _set_descriptions = flat_strings(required(file, "STLB")?, "STLB")?;
        let _set_intertemporal = flat_strings(required(file, "STTP")?, "STTP")?;
        let set_sizes = flat_ints(required(file, "SSZ")?, "SSZ")?;
        let set_elements = flat_strings(required(file, "STEL")?, "STEL")?;

        let mut set_catalog_offset = Vec::with_capacity(set_sizes.len());
        let mut running = 0usize;
        for &size in &set_sizes {
            set_catalog_offset.push(running);
            running += size.max(0) as usize;
        }

        let cumulative_pointer = flat_ints(required(file, "PCUM")?, "PCUM")?;
        let cumulative_count = flat_ints(required(file, "CMND")?, "CMND")?;
        let cumulative_values = flat_floats(required(file, "CUMS")?, "CUMS")?;

        let exogenous_count = flat_ints(required(file, "OREX")?, "OREX")?;
        let exogenous_positions = flat_ints(required(file, "OREL")?, "OREL")?;

        let shock_pointer = flat_ints(required(file, "PSHK")?, "PSHK")?;
        let shock_count = flat_ints(required(file, "SHCK")?, "SHCK")?;
        let shock_positions = flat_ints(required(file, "SHCL")?, "SHCL")?;
        let shock_values = flat_floats(required(file, "SHOC")?, "SHOC")?;

        let exogenous_offset = prefix_offsets(&exogenous_count, |j| {
            exogenous_count[j] != *element_count.get(j).unwrap_or(&exogenous_count[j])
        });

        // The shock offset predicate is reproduced literally from the
        // source algorithm (§9 open question): a variable's shock stream
        // only advances the shared offset when its own shock count exceeds
        // one AND differs from the immediately preceding variable's. This
        // is almost certainly incidental rather than intentional, but it is
        // not "fixed" here.
        let shock_offset = prefix_offsets(&shock_count, |j| {
            shock_count[j] > 1 && (j == 0 || shock_count[j] != shock_count[j - 1])
        });

        Ok(Self {
            names,
            descriptions,
            unit_kinds,
            change_kinds,
            variable_kinds,
            set_count,
            set_offset,
            set_indices,
            element_count,
            set_names,
            set_sizes,
            set_elements,
            set_catalog_offset,
            cumulative_pointer,
            cumulative_count,
            cumulative_values,
            exogenous_count,
            exogenous_positions,
            exogenous_offset,
            shock_pointer,
            shock_count,
            shock_positions,
            shock_values,
            shock_offset,
        })
    }

    pub fn variable_count(&self) -> usize {
        self.names.len()
    }

    pub fn exogenous_offset(&self, i: usize) -> usize {
        self.exogenous_offset[i].max(0) as usize
    }

    pub fn shock_offset(&self, i: usize) -> usize {
        self.shock_offset[i].max(0) as usize
    }

    /// The catalogue set at 1-based `set_index`, as `(name, labels)`.
    pub fn set_at(&self, set_index: i32) -> Result<(&str, &[String])> {
        let idx = (set_index - 1) as i64;
        if idx < 0 || idx as usize >= self.set_sizes.len() {
            return Err(SolutionError::UnknownSetIndex(set_index.max(0) as usize).into());
        }
        let idx = idx as usize;
        let size = self.set_sizes[idx].max(0) as usize;
        let start = self.set_catalog_offset[idx];
        Ok((&self.set_names[idx], &self.set_elements[start..start + size]))
    }
}

/// Builds `offset[i] = sum_{j < i} counts[j]` restricted to indices where
/// `include(j)` holds.
fn prefix_offsets(counts: &[i32], include: impl Fn(usize) -> bool) -> Vec<i64> {
    let mut offsets = Vec::with_capacity(counts.len());
    let mut running = 0i64;
    for j in 0..counts.len() {
        offsets.push(running);
        if include(j) {
            running += i64::from(counts[j]);
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_offsets_accumulate_only_included_entries() {
        let counts = vec![2, 3, 0, 4];
        let offsets = prefix_offsets(&counts, |j| j != 2);
        assert_eq!(offsets, vec![0, 2, 5, 5]);
    }
}
