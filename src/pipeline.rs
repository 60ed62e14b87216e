// src/pipeline.rs

//! End-to-end ingest and publish pipeline
//!
//! One run is a single sequential pass: scaffold the local registry,
//! fetch and decode every configured page, merge into the sat ledger,
//! partition into chunks, stage the chunk files locally, publish the
//! chunks, then sweep the registry directory for anything not yet
//! remote. Nothing is checkpointed; a re-run rebuilds the ledger from
//! the first page and leans on the publisher's policies for idempotence.

use crate::config::{Config, RegistrySection};
use crate::error::{Error, Result};
use crate::ledger::{self, Chunk, DecodedPage};
use crate::oci::{decode_page, OciClient};
use crate::registry::{generate_scaffold, ContentStore, PublishTally, Publisher};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Summary of one pipeline run
#[derive(Debug, Default, Clone, Copy)]
pub struct RunReport {
    /// Ledger entries reconstructed across all pages
    pub entries: usize,
    /// Chunks produced by partitioning
    pub chunks: usize,
    /// Chunk publish outcomes
    pub chunk_tally: PublishTally,
    /// Registry sweep outcomes
    pub registry_tally: PublishTally,
}

/// Full run: scaffold, ingest, partition, stage, publish
pub fn run<S: ContentStore>(config: &Config, store: &S) -> Result<RunReport> {
    generate_scaffold(&config.registry)?;
    let (entries, chunks) = assemble(config)?;
    stage_chunks(&config.registry, &chunks)?;

    let publisher = Publisher::new(store, &config.registry.dir);
    let chunk_tally = publish_chunks(&chunks, &publisher)?;
    let registry_tally = publish_registry_dir(&config.registry, &publisher)?;

    Ok(RunReport {
        entries,
        chunks: chunks.len(),
        chunk_tally,
        registry_tally,
    })
}

/// Local-only run: scaffold, ingest and stage without touching the store
pub fn build_local(config: &Config) -> Result<RunReport> {
    generate_scaffold(&config.registry)?;
    let (entries, chunks) = assemble(config)?;
    stage_chunks(&config.registry, &chunks)?;

    Ok(RunReport {
        entries,
        chunks: chunks.len(),
        ..RunReport::default()
    })
}

/// Fetch, decode, merge and partition per the configured page table
fn assemble(config: &Config) -> Result<(usize, Vec<Chunk>)> {
    let client = OciClient::new(&config.source.origin)?;
    let pages = fetch_pages(config, &client)?;

    let entries = ledger::merge_pages(&pages);
    let count = entries.len();
    info!("Merged ledger holds {} entries", count);

    let chunks = ledger::partition(
        entries,
        config.chunking.chunk_size,
        config.chunking.max_chunks,
    );
    info!("Partitioned into {} chunks", chunks.len());
    Ok((count, chunks))
}

/// Fetch and decode every page, strictly in table order.
///
/// Any fetch or decode failure aborts the run; a missing page would
/// corrupt the global sort order of every chunk.
fn fetch_pages(config: &Config, client: &OciClient) -> Result<Vec<DecodedPage>> {
    let pages = &config.source.pages;
    info!(
        "Ingesting {} pages from {}",
        pages.len(),
        config.source.origin
    );
    let pb = progress_bar(pages.len() as u64, "Fetching pages");

    let mut decoded = Vec::with_capacity(pages.len());
    for page in pages {
        let raw = client.fetch_page(&page.path)?;
        let values = decode_page(page.format, &raw, page.width)?;
        debug!(
            "Decoded {} page at offset {} into {} slots",
            page.format,
            page.offset,
            values.len()
        );
        decoded.push(DecodedPage {
            values,
            offset: page.offset,
        });
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(decoded)
}

/// Write chunk files into the local registry directory
pub fn stage_chunks(registry: &RegistrySection, chunks: &[Chunk]) -> Result<()> {
    let dir = registry.local_dir();
    fs::create_dir_all(&dir)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", dir.display())))?;

    for chunk in chunks {
        let path = dir.join(chunk.file_name());
        fs::write(&path, chunk.contents())
            .map_err(|e| Error::IoError(format!("Failed to write {}: {e}", path.display())))?;
    }

    info!("Staged {} chunk files under {}", chunks.len(), dir.display());
    Ok(())
}

/// Publish every chunk, overwriting remote state
pub fn publish_chunks<S: ContentStore>(
    chunks: &[Chunk],
    publisher: &Publisher<S>,
) -> Result<PublishTally> {
    let pb = progress_bar(chunks.len() as u64, "Publishing chunks");

    let mut tally = PublishTally::default();
    for chunk in chunks {
        tally.record(publisher.publish_chunk(&chunk.file_name(), &chunk.contents())?);
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Chunk publish: {}", tally);
    Ok(tally)
}

/// Sweep the local registry directory, publishing any file that does not
/// exist remotely yet. Existing remote files are never touched, so the
/// sweep is safe to run after chunk publication.
pub fn publish_registry_dir<S: ContentStore>(
    registry: &RegistrySection,
    publisher: &Publisher<S>,
) -> Result<PublishTally> {
    let dir = registry.local_dir();
    info!("Sweeping {} for unpublished files", dir.display());

    let mut tally = PublishTally::default();
    for entry in WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry
            .map_err(|e| Error::IoError(format!("Failed to walk {}: {e}", dir.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let content = fs::read_to_string(entry.path())
            .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", entry.path().display())))?;
        tally.record(publisher.publish_if_absent(&name, &content)?);
    }

    info!("Registry sweep: {}", tally);
    Ok(tally)
}

fn progress_bar(len: u64, operation: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} ({pos}/{len}) [{bar:40.green/dim}] {percent}%")
            .expect("Invalid progress bar template")
            .progress_chars("##-"),
    );
    pb.set_message(operation.to_string());
    pb
}
