// src/ledger/mod.rs

//! Sat ledger assembly
//!
//! Decoded pages are merged into one flat collection of (sat, height)
//! entries, then sorted by sat and partitioned into bounded chunks whose
//! names derive from the sat range they cover. The ledger is rebuilt in
//! full on every run; nothing here is incremental.

mod merge;
mod partition;

pub use merge::{merge_pages, DecodedPage, SatEntry};
pub use partition::{partition, Chunk};
