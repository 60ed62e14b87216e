// src/oci/mod.rs

//! Ordinals content index access
//!
//! The sat ledger is published as a fixed table of inscription pages on
//! an ordinals gateway. This module fetches raw pages over HTTP and
//! decodes each one into a dense array of absolute sat numbers.

mod client;
mod decode;

pub use client::OciClient;
pub use decode::{decode_page, PageFormat};
