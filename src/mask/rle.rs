//! Dense run-length encoding of label masks.
//!
//! The annotation export stores raster layers as a flat array
//! `[v0, c0, v1, c1, ...]`: `c0` copies of `v0`, then `c1` copies of `v1`,
//! walking the mask row-major from the top-left pixel. Unlike COCO's binary
//! RLE the values are arbitrary labels, not alternating 0/1 runs.

use serde::{Deserialize, Serialize};

use super::LabelMask;
use crate::error::LabelvoxError;

/// One `(value, count)` run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub value: u32,
    pub count: u64,
}

/// An ordered sequence of runs.
///
/// A stream is only meaningful together with the mask dimensions it was
/// encoded for: a valid stream for a `width × height` mask has counts
/// summing to exactly `width * height`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunLengthStream {
    runs: Vec<Run>,
}

impl RunLengthStream {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    /// Parses the flat `[v0, c0, v1, c1, ...]` form.
    ///
    /// # Errors
    /// Returns [`LabelvoxError::MalformedRleArray`] for an odd-length array
    /// and [`LabelvoxError::UnsupportedFormat`] if a value exceeds `u32`.
    pub fn from_flat(flat: &[u64]) -> Result<Self, LabelvoxError> {
        if flat.len() % 2 != 0 {
            return Err(LabelvoxError::MalformedRleArray { len: flat.len() });
        }
        let runs = flat
            .chunks_exact(2)
            .map(|pair| {
                let value = u32::try_from(pair[0]).map_err(|_| {
                    LabelvoxError::UnsupportedFormat(format!("RLE value {} exceeds u32", pair[0]))
                })?;
                Ok(Run {
                    value,
                    count: pair[1],
                })
            })
            .collect::<Result<Vec<_>, LabelvoxError>>()?;
        Ok(Self { runs })
    }

    /// Flattens back into `[v0, c0, v1, c1, ...]`.
    pub fn to_flat(&self) -> Vec<u64> {
        self.runs
            .iter()
            .flat_map(|r| [u64::from(r.value), r.count])
            .collect()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Sum of all run counts, saturating at `u64::MAX`.
    pub fn total_count(&self) -> u64 {
        self.runs
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.count))
    }

    /// Distinct non-zero values referenced by the stream, in first-use order.
    pub fn labels(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for run in &self.runs {
            if run.value != 0 && run.count > 0 && !seen.contains(&run.value) {
                seen.push(run.value);
            }
        }
        seen
    }
}

/// Decodes a run-length stream into a `width × height` mask.
///
/// # Errors
/// Returns [`LabelvoxError::MalformedRle`] if the runs cover fewer or more
/// pixels than `width * height`. A short stream is never padded silently.
pub fn decode(
    stream: &RunLengthStream,
    width: u32,
    height: u32,
) -> Result<LabelMask, LabelvoxError> {
    let expected = u64::from(width) * u64::from(height);
    let actual = stream.total_count();
    if actual != expected {
        return Err(LabelvoxError::MalformedRle { expected, actual });
    }

    let mut mask = LabelMask::new(width, height);
    let cells = mask.as_mut_slice();
    let mut pos = 0usize;
    for run in stream.runs() {
        let end = pos + run.count as usize;
        if run.value != 0 {
            cells[pos..end].fill(run.value);
        }
        pos = end;
    }
    Ok(mask)
}

/// Encodes a mask row-major, merging adjacent equal labels into one run.
pub fn encode(mask: &LabelMask) -> RunLengthStream {
    let mut runs: Vec<Run> = Vec::new();
    for &v in mask.as_slice() {
        match runs.last_mut() {
            Some(last) if last.value == v => last.count += 1,
            _ => runs.push(Run { value: v, count: 1 }),
        }
    }
    RunLengthStream { runs }
}
