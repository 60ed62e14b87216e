// src/oci/decode.rs

//! OCI page decoding
//!
//! Every page encodes a run of absolute sat numbers as successive deltas;
//! reconstruction is a prefix-sum scan. Three raw layouts exist, declared
//! per page in the configuration rather than inferred from page position:
//!
//! - `sparse`: a 2-element JSON array holding the delta-encoded values
//!   and the domain positions to scatter them to;
//! - `sparse-flat`: the same two sequences as one bare comma-joined run
//!   that must be bracket-wrapped and split at a fixed interior boundary;
//! - `dense`: a JSON object with a single delta-encoded run covering
//!   every position from the page base upward.
//!
//! Payload scalars arrive as JSON numbers or numeric strings; both are
//! accepted. Decoding is pure; fetching lives in [`super::OciClient`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Number of leading flat elements holding the delta-encoded values
const FLAT_VALUES_LEN: usize = 99_999;

/// Flat index where the position run starts (one boundary element is
/// skipped between the runs)
const FLAT_POSITIONS_START: usize = 100_000;

/// Flat index one past the last position element
const FLAT_POSITIONS_END: usize = 199_999;

/// Whitespace-noise cleanup passes for `sparse` payloads, applied in
/// order before structured parsing. Each pass strips one known formatting
/// quirk; the first pass whose result parses wins. Individual passes are
/// best-effort, but the chain as a whole must produce a parse.
const CLEANUP_PASSES: [&str; 2] = ["\\n  ", "  "];

/// Raw layout of one OCI page, declared in the page table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageFormat {
    /// `[deltas, positions]` JSON payload, possibly with whitespace noise
    Sparse,
    /// Bare flat run of deltas then positions, split at a fixed boundary
    SparseFlat,
    /// `{"deltaEncodedSats": [...]}` with no position list and no
    /// vacant slots
    Dense,
}

impl PageFormat {
    /// Configuration tag for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sparse => "sparse",
            Self::SparseFlat => "sparse-flat",
            Self::Dense => "dense",
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Dense tail page payload
#[derive(Debug, Deserialize)]
struct DensePage {
    #[serde(rename = "deltaEncodedSats")]
    delta_encoded_sats: Vec<Value>,
}

/// Decode one raw page into its dense value array.
///
/// For the sparse formats the result has exactly `width` slots with 0
/// marking a vacant position; for `dense` the result length is the
/// decoded run length and `width` is ignored. Any failure here is fatal
/// to the run, since a malformed page would corrupt the global sort
/// order of every chunk.
pub fn decode_page(format: PageFormat, raw: &str, width: usize) -> Result<Vec<u64>> {
    match format {
        PageFormat::Sparse => {
            let payload = parse_sparse_payload(raw)?;
            let (deltas, positions) = split_sparse_payload(&payload)?;
            scatter(&prefix_sum(&deltas)?, &positions, width)
        }
        PageFormat::SparseFlat => {
            let (deltas, positions) = split_flat_payload(raw)?;
            scatter(&prefix_sum(&deltas)?, &positions, width)
        }
        PageFormat::Dense => {
            let page: DensePage = serde_json::from_str(raw)
                .map_err(|e| Error::ParseError(format!("Invalid dense page payload: {e}")))?;
            let deltas = scalar_run_i64(&page.delta_encoded_sats)?;
            prefix_sum(&deltas)
        }
    }
}

/// Run the cleanup-pass chain over a noisy `sparse` payload.
///
/// Returns the first successful parse; errors only when every pass fails.
fn parse_sparse_payload(raw: &str) -> Result<Value> {
    for noise in CLEANUP_PASSES {
        match serde_json::from_str(&raw.replace(noise, "")) {
            Ok(value) => return Ok(value),
            Err(e) => debug!("Cleanup pass stripping {:?} did not parse: {}", noise, e),
        }
    }
    Err(Error::ParseError(
        "Sparse page payload is not valid JSON after all cleanup passes".to_string(),
    ))
}

/// Pull the delta and position runs out of a parsed `sparse` payload
fn split_sparse_payload(payload: &Value) -> Result<(Vec<i64>, Vec<usize>)> {
    let parts = payload
        .as_array()
        .ok_or_else(|| Error::ParseError("Sparse page payload is not a JSON array".to_string()))?;
    if parts.len() < 2 {
        return Err(Error::ParseError(format!(
            "Sparse page payload has {} elements, expected deltas and positions",
            parts.len()
        )));
    }
    let deltas = parts[0]
        .as_array()
        .ok_or_else(|| Error::ParseError("Sparse page deltas are not an array".to_string()))?;
    let positions = parts[1]
        .as_array()
        .ok_or_else(|| Error::ParseError("Sparse page positions are not an array".to_string()))?;
    Ok((scalar_run_i64(deltas)?, scalar_run_usize(positions)?))
}

/// Wrap and split a `sparse-flat` payload at the fixed interior boundary.
///
/// The raw text is a bare comma-joined run; bracket-wrapping turns it
/// into one flat JSON array whose first [`FLAT_VALUES_LEN`] elements are
/// the deltas and whose elements from [`FLAT_POSITIONS_START`] up to
/// [`FLAT_POSITIONS_END`] are the positions. Both ranges clamp to the
/// actual array length; the boundary elements between and after the runs
/// are padding and are dropped.
fn split_flat_payload(raw: &str) -> Result<(Vec<i64>, Vec<usize>)> {
    let wrapped = format!("[{raw}]");
    let flat: Vec<Value> = serde_json::from_str(&wrapped)
        .map_err(|e| Error::ParseError(format!("Invalid flat page payload: {e}")))?;

    let deltas = flat
        .iter()
        .take(FLAT_VALUES_LEN)
        .map(scalar_to_i64)
        .collect::<Result<Vec<_>>>()?;
    let positions = flat
        .iter()
        .skip(FLAT_POSITIONS_START)
        .take(FLAT_POSITIONS_END - FLAT_POSITIONS_START)
        .map(scalar_to_usize)
        .collect::<Result<Vec<_>>>()?;
    Ok((deltas, positions))
}

/// Prefix-sum a delta run into absolute values.
///
/// `absolute[0] = delta[0]`, `absolute[i] = absolute[i-1] + delta[i]`.
/// Deltas may be negative but every absolute must be non-negative.
fn prefix_sum(deltas: &[i64]) -> Result<Vec<u64>> {
    let mut absolutes = Vec::with_capacity(deltas.len());
    let mut running: i64 = 0;
    for delta in deltas {
        running = running.checked_add(*delta).ok_or_else(|| {
            Error::ParseError("Delta sequence overflows while reconstructing".to_string())
        })?;
        let value = u64::try_from(running).map_err(|_| {
            Error::ParseError(format!("Reconstructed value {running} is negative"))
        })?;
        absolutes.push(value);
    }
    Ok(absolutes)
}

/// Scatter reconstructed values into a fixed-width dense array (0 =
/// vacant). Positions past the declared width are a malformed page.
fn scatter(values: &[u64], positions: &[usize], width: usize) -> Result<Vec<u64>> {
    let mut dense = vec![0u64; width];
    for (value, position) in values.iter().zip(positions) {
        let slot = dense.get_mut(*position).ok_or_else(|| {
            Error::ParseError(format!(
                "Scatter position {position} is outside the page domain of {width}"
            ))
        })?;
        *slot = *value;
    }
    Ok(dense)
}

fn scalar_run_i64(values: &[Value]) -> Result<Vec<i64>> {
    values.iter().map(scalar_to_i64).collect()
}

fn scalar_run_usize(values: &[Value]) -> Result<Vec<usize>> {
    values.iter().map(scalar_to_usize).collect()
}

/// Accept a JSON number or numeric string as an integer
fn scalar_to_i64(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| Error::ParseError(format!("Non-integer scalar {n} in page payload"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| Error::ParseError(format!("Non-numeric scalar {s:?} in page payload: {e}"))),
        other => Err(Error::ParseError(format!(
            "Unexpected scalar {other} in page payload"
        ))),
    }
}

fn scalar_to_usize(value: &Value) -> Result<usize> {
    let n = scalar_to_i64(value)?;
    usize::try_from(n)
        .map_err(|_| Error::ParseError(format!("Negative position {n} in page payload")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_sum_reconstruction() {
        // First element absolute, each subsequent one a difference
        assert_eq!(prefix_sum(&[5, -2, 3]).unwrap(), vec![5, 3, 6]);
    }

    #[test]
    fn test_prefix_sum_rejects_negative_value() {
        let err = prefix_sum(&[5, -9]).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_sparse_decode_scatters_into_dense_array() {
        // Values 7 and 12 (deltas 7, +5) land at positions 1 and 3
        let raw = "[[7,5],[1,3]]";
        let dense = decode_page(PageFormat::Sparse, raw, 4).unwrap();
        assert_eq!(dense, vec![0, 7, 0, 12]);
    }

    #[test]
    fn test_sparse_decode_accepts_string_scalars() {
        let raw = r#"[["7","5"],["1","3"]]"#;
        let dense = decode_page(PageFormat::Sparse, raw, 4).unwrap();
        assert_eq!(dense, vec![0, 7, 0, 12]);
    }

    #[test]
    fn test_sparse_cleanup_first_pass_strips_escape_noise() {
        // Literal backslash-n plus indentation inside the payload text
        let raw = "[[7,\\n  5],[1,3]]";
        let dense = decode_page(PageFormat::Sparse, raw, 4).unwrap();
        assert_eq!(dense, vec![0, 7, 0, 12]);
    }

    #[test]
    fn test_sparse_cleanup_falls_through_to_second_pass() {
        // Not valid JSON as-is and untouched by the first pass; only
        // stripping the double spaces makes it parse
        let raw = "[[1  2],[0]]";
        let dense = decode_page(PageFormat::Sparse, raw, 2).unwrap();
        assert_eq!(dense, vec![12, 0]);
    }

    #[test]
    fn test_sparse_decode_fails_when_all_passes_fail() {
        let err = decode_page(PageFormat::Sparse, "not json at all", 4).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_sparse_position_outside_domain_is_an_error() {
        let raw = "[[7],[9]]";
        let err = decode_page(PageFormat::Sparse, raw, 4).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_dense_decode_is_plain_prefix_sum() {
        let raw = r#"{"deltaEncodedSats": ["4", "3", "-2"]}"#;
        let dense = decode_page(PageFormat::Dense, raw, 0).unwrap();
        assert_eq!(dense, vec![4, 7, 5]);
    }

    #[test]
    fn test_flat_decode_splits_at_fixed_boundary() {
        // Build a flat run long enough to cross the boundary: the first
        // 99 999 elements are deltas, element 99 999 is boundary padding,
        // and positions follow from 100 000.
        let mut elements = vec!["0".to_string(); FLAT_POSITIONS_START + 3];
        elements[0] = "7".to_string();
        elements[1] = "5".to_string();
        elements[FLAT_VALUES_LEN] = "999".to_string(); // dropped padding
        elements[FLAT_POSITIONS_START] = "1".to_string();
        elements[FLAT_POSITIONS_START + 1] = "3".to_string();
        elements[FLAT_POSITIONS_START + 2] = "5".to_string();
        let raw = elements.join(",");

        let dense = decode_page(PageFormat::SparseFlat, &raw, 8).unwrap();
        // Deltas [7,5,0,0,...] reconstruct to [7,12,12,12,...]; the first
        // three land at positions 1, 3 and 5, the rest have no position.
        assert_eq!(dense[1], 7);
        assert_eq!(dense[3], 12);
        assert_eq!(dense[5], 12);
        assert_eq!(dense[0], 0);
        assert_eq!(dense[2], 0);
    }

    #[test]
    fn test_flat_decode_clamps_short_input() {
        // Shorter than the boundary: everything is a delta, no positions,
        // so nothing scatters and the page is vacant.
        let dense = decode_page(PageFormat::SparseFlat, "1,2,3", 4).unwrap();
        assert_eq!(dense, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(PageFormat::Sparse.name(), "sparse");
        assert_eq!(PageFormat::SparseFlat.name(), "sparse-flat");
        assert_eq!(PageFormat::Dense.name(), "dense");
        assert_eq!(format!("{}", PageFormat::SparseFlat), "sparse-flat");
    }
}
