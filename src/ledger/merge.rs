// src/ledger/merge.rs

//! Cross-page merge into a single ledger

use tracing::debug;

/// One decoded page positioned in the global height domain
#[derive(Debug, Clone)]
pub struct DecodedPage {
    /// Dense value array, 0 marking a vacant slot
    pub values: Vec<u64>,
    /// Height of the page's first slot
    pub offset: u64,
}

/// One reconstructed ledger entry: a sat number and the block height it
/// was mined at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SatEntry {
    pub sat: u64,
    pub height: u64,
}

/// Merge decoded pages into a flat entry list.
///
/// Each occupied slot becomes one entry keyed by the page offset plus
/// the slot index; vacant slots (sentinel 0) are dropped. Output is in
/// page order and carries no ordering guarantee of its own; the
/// partitioner imposes the sat order.
pub fn merge_pages(pages: &[DecodedPage]) -> Vec<SatEntry> {
    let mut ledger = Vec::new();
    for page in pages {
        let before = ledger.len();
        for (i, value) in page.values.iter().enumerate() {
            if *value != 0 {
                ledger.push(SatEntry {
                    sat: *value,
                    height: page.offset + i as u64,
                });
            }
        }
        debug!(
            "Page at offset {} contributed {} entries",
            page.offset,
            ledger.len() - before
        );
    }
    ledger
}
