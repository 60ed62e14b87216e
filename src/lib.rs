// src/lib.rs

//! Satdex registry builder
//!
//! Rebuilds the sat name registry from the on-chain ordinals content
//! index and publishes it to a GitHub repository.
//!
//! # Architecture
//!
//! - Page-table driven: every index page is declared in configuration
//!   with its path, encoding and height offset
//! - Full rebuild: each run reconstructs the whole (sat, height) ledger
//!   from the first page; there is no incremental state
//! - Policy-split publishing: computed chunk files overwrite remote
//!   state under a fetched revision token, scaffolded placeholders are
//!   never overwritten
//! - Idempotence lives in the publisher, not in checkpoints

pub mod config;
mod error;
pub mod ledger;
pub mod oci;
pub mod pipeline;
pub mod registry;

pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{merge_pages, partition, Chunk, DecodedPage, SatEntry};
pub use oci::{decode_page, OciClient, PageFormat};
pub use pipeline::RunReport;
pub use registry::{ContentStore, PublishOutcome, PublishTally, Publisher, RemoteObject};
