// src/ledger/partition.rs

//! Range partitioning of the sorted ledger

use super::merge::SatEntry;
use tracing::debug;

/// A bounded, contiguous-by-sat slice of the sorted ledger, published as
/// one registry file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    min_sat: u64,
    max_sat: u64,
    entries: Vec<SatEntry>,
}

impl Chunk {
    /// Build a chunk from one non-empty window of the sorted ledger
    fn from_window(window: &[SatEntry]) -> Self {
        Self {
            min_sat: window[0].sat,
            max_sat: window[window.len() - 1].sat,
            entries: window.to_vec(),
        }
    }

    /// Registry file name, derived from the sat range alone so the same
    /// ledger always produces the same names
    pub fn file_name(&self) -> String {
        format!("sat_{}-{}.txt", self.min_sat, self.max_sat)
    }

    /// Serialized file body: `(sat,height)` pairs joined by commas, no
    /// trailing separator, no surrounding brackets
    pub fn contents(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("({},{})", e.sat, e.height))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn min_sat(&self) -> u64 {
        self.min_sat
    }

    pub fn max_sat(&self) -> u64 {
        self.max_sat
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sort the ledger by sat and slice it into chunks of at most
/// `chunk_size` entries, at most `max_chunks` of them.
///
/// The sort is stable, so duplicate sats keep their merge order and both
/// survive. Partitioning stops as soon as the ledger runs out; trailing
/// empty ranges never produce chunks. `chunk_size` must be non-zero,
/// which configuration validation guarantees.
pub fn partition(mut ledger: Vec<SatEntry>, chunk_size: usize, max_chunks: usize) -> Vec<Chunk> {
    ledger.sort_by_key(|e| e.sat);

    let chunks: Vec<Chunk> = ledger
        .chunks(chunk_size)
        .take(max_chunks)
        .map(Chunk::from_window)
        .collect();

    debug!(
        "Partitioned {} entries into {} chunks of at most {}",
        ledger.len(),
        chunks.len(),
        chunk_size
    );
    chunks
}
