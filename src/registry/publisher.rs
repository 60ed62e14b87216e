// src/registry/publisher.rs

//! Conflict-safe publication
//!
//! Two publish paths with deliberately different overwrite policies.
//! Chunk files are the computed source of truth for each run, so an
//! existing chunk is rewritten under its fetched revision token. The
//! scaffolded placeholder files are curated by hand once published, so
//! the bulk path never overwrites an existing object. Keeping the paths
//! separate preserves those data-loss semantics.

use super::store::ContentStore;
use crate::error::Result;
use std::fmt;
use tracing::{debug, error, info};

/// What happened to one object during publication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Object did not exist and was created
    Created,
    /// Object existed and was overwritten under its revision token
    Updated,
    /// Object existed and was left untouched
    Skipped,
    /// The write failed; the run continues with the next object
    Failed,
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Per-run tally of publish outcomes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishTally {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PublishTally {
    pub fn record(&mut self, outcome: PublishOutcome) {
        match outcome {
            PublishOutcome::Created => self.created += 1,
            PublishOutcome::Updated => self.updated += 1,
            PublishOutcome::Skipped => self.skipped += 1,
            PublishOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed
    }
}

impl fmt::Display for PublishTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} failed",
            self.created, self.updated, self.skipped, self.failed
        )
    }
}

/// Publishes files into one registry directory of a content store
pub struct Publisher<'a, S: ContentStore> {
    store: &'a S,
    registry_dir: String,
}

impl<'a, S: ContentStore> Publisher<'a, S> {
    pub fn new(store: &'a S, registry_dir: &str) -> Self {
        Self {
            store,
            registry_dir: registry_dir.trim_matches('/').to_string(),
        }
    }

    /// Remote repository path for one registry file
    fn remote_path(&self, name: &str) -> String {
        format!("{}/{}", self.registry_dir, name)
    }

    /// Publish one chunk file, overwriting any previous revision.
    ///
    /// A write failure is logged and reported as [`PublishOutcome::Failed`]
    /// so the caller can continue with the next chunk; a lookup failure
    /// other than not-found propagates and aborts the publish phase.
    pub fn publish_chunk(&self, name: &str, content: &str) -> Result<PublishOutcome> {
        let path = self.remote_path(name);
        let message = format!("Update {name}");

        match self.store.get(&path)? {
            Some(remote) => {
                debug!("Remote {} exists ({} bytes), overwriting", path, remote.size);
                match self.store.update(&path, content, &message, &remote.revision) {
                    Ok(()) => {
                        info!("Updated {}", path);
                        Ok(PublishOutcome::Updated)
                    }
                    Err(e) => {
                        error!("Failed to update {}: {}", path, e);
                        Ok(PublishOutcome::Failed)
                    }
                }
            }
            None => match self.store.create(&path, content, &message) {
                Ok(()) => {
                    info!("Created {}", path);
                    Ok(PublishOutcome::Created)
                }
                Err(e) => {
                    error!("Failed to create {}: {}", path, e);
                    Ok(PublishOutcome::Failed)
                }
            },
        }
    }

    /// Publish one scaffolding file only if no remote object exists.
    ///
    /// Existing remote content is authoritative and is never overwritten,
    /// whatever the local file holds. Write failures are contained the
    /// same way as in [`Self::publish_chunk`].
    pub fn publish_if_absent(&self, name: &str, content: &str) -> Result<PublishOutcome> {
        let path = self.remote_path(name);

        if self.store.get(&path)?.is_some() {
            debug!("Remote {} already exists, skipping", path);
            return Ok(PublishOutcome::Skipped);
        }

        let message = format!("Create {name}");
        match self.store.create(&path, content, &message) {
            Ok(()) => {
                info!("Created {}", path);
                Ok(PublishOutcome::Created)
            }
            Err(e) => {
                error!("Failed to create {}: {}", path, e);
                Ok(PublishOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::registry::store::RemoteObject;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory store double recording every mutating call
    #[derive(Default)]
    struct MockStore {
        objects: RefCell<HashMap<String, (String, String)>>,
        writes: RefCell<Vec<String>>,
        fail_writes: bool,
        fail_lookups: bool,
    }

    impl MockStore {
        fn with_object(self, path: &str, content: &str, revision: &str) -> Self {
            self.objects
                .borrow_mut()
                .insert(path.to_string(), (content.to_string(), revision.to_string()));
            self
        }

        fn writes(&self) -> Vec<String> {
            self.writes.borrow().clone()
        }
    }

    impl ContentStore for MockStore {
        fn get(&self, path: &str) -> Result<Option<RemoteObject>> {
            if self.fail_lookups {
                return Err(Error::StoreError("lookup unavailable".to_string()));
            }
            Ok(self.objects.borrow().get(path).map(|(content, revision)| {
                RemoteObject {
                    revision: revision.clone(),
                    size: content.len() as u64,
                }
            }))
        }

        fn create(&self, path: &str, content: &str, message: &str) -> Result<()> {
            self.writes
                .borrow_mut()
                .push(format!("create {path} [{message}]"));
            if self.fail_writes {
                return Err(Error::StoreError("write rejected".to_string()));
            }
            self.objects
                .borrow_mut()
                .insert(path.to_string(), (content.to_string(), "r1".to_string()));
            Ok(())
        }

        fn update(&self, path: &str, content: &str, message: &str, revision: &str) -> Result<()> {
            self.writes
                .borrow_mut()
                .push(format!("update {path} rev={revision} [{message}]"));
            if self.fail_writes {
                return Err(Error::StoreError("write rejected".to_string()));
            }
            self.objects
                .borrow_mut()
                .insert(path.to_string(), (content.to_string(), "r2".to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_chunk_create_when_absent() {
        let store = MockStore::default();
        let publisher = Publisher::new(&store, "Registry");

        let outcome = publisher.publish_chunk("sat_1-2.txt", "(1,1),(2,3)").unwrap();

        assert_eq!(outcome, PublishOutcome::Created);
        assert_eq!(
            store.writes(),
            vec!["create Registry/sat_1-2.txt [Update sat_1-2.txt]"]
        );
    }

    #[test]
    fn test_chunk_overwrite_carries_fetched_revision() {
        let store = MockStore::default().with_object("Registry/sat_1-2.txt", "old", "abc123");
        let publisher = Publisher::new(&store, "Registry");

        let outcome = publisher.publish_chunk("sat_1-2.txt", "new").unwrap();

        assert_eq!(outcome, PublishOutcome::Updated);
        assert_eq!(
            store.writes(),
            vec!["update Registry/sat_1-2.txt rev=abc123 [Update sat_1-2.txt]"]
        );
    }

    #[test]
    fn test_scaffold_never_overwrites() {
        let store = MockStore::default().with_object("Registry/index_A.txt", "curated", "abc123");
        let publisher = Publisher::new(&store, "Registry");

        let outcome = publisher.publish_if_absent("index_A.txt", "").unwrap();

        assert_eq!(outcome, PublishOutcome::Skipped);
        assert!(store.writes().is_empty());
        assert_eq!(
            store.objects.borrow()["Registry/index_A.txt"].0,
            "curated"
        );
    }

    #[test]
    fn test_scaffold_creates_when_absent() {
        let store = MockStore::default();
        let publisher = Publisher::new(&store, "Registry");

        let outcome = publisher.publish_if_absent("index_A.txt", "").unwrap();

        assert_eq!(outcome, PublishOutcome::Created);
        assert_eq!(
            store.writes(),
            vec!["create Registry/index_A.txt [Create index_A.txt]"]
        );
    }

    #[test]
    fn test_write_failure_is_contained() {
        let store = MockStore {
            fail_writes: true,
            ..MockStore::default()
        };
        let publisher = Publisher::new(&store, "Registry");

        let outcome = publisher.publish_chunk("sat_1-2.txt", "x").unwrap();
        assert_eq!(outcome, PublishOutcome::Failed);
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let store = MockStore {
            fail_lookups: true,
            ..MockStore::default()
        };
        let publisher = Publisher::new(&store, "Registry");

        assert!(publisher.publish_chunk("sat_1-2.txt", "x").is_err());
        assert!(publisher.publish_if_absent("index_A.txt", "").is_err());
    }

    #[test]
    fn test_tally_records_outcomes() {
        let mut tally = PublishTally::default();
        tally.record(PublishOutcome::Created);
        tally.record(PublishOutcome::Created);
        tally.record(PublishOutcome::Skipped);
        tally.record(PublishOutcome::Failed);

        assert_eq!(tally.created, 2);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.to_string(), "2 created, 0 updated, 1 skipped, 1 failed");
    }
}
