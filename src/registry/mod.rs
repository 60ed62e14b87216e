// src/registry/mod.rs

//! Registry publication
//!
//! The registry is a directory of text files in a GitHub repository:
//! computed sat chunks, numbered range placeholders, and per-letter name
//! indexes. This module scaffolds the placeholder layout locally and
//! publishes files through the contents API, with distinct overwrite
//! policies for computed and scaffolded content.

mod publisher;
mod scaffold;
mod store;

pub use publisher::{PublishOutcome, PublishTally, Publisher};
pub use scaffold::{generate_scaffold, scaffold_file_names, ScaffoldReport};
pub use store::{ContentStore, GithubStore, RemoteObject};
