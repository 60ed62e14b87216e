// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

// Allow dead code - not every test binary uses every helper
#![allow(dead_code)]

use satdex::config::RegistrySection;
use satdex::{ContentStore, Error, RemoteObject, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use tempfile::TempDir;

/// In-memory content store with the same write rules as the real one:
/// creates fail when the object exists, updates require the current
/// revision token. Every mutating call is recorded for assertions.
pub struct MemoryStore {
    objects: RefCell<HashMap<String, (String, String)>>,
    writes: RefCell<Vec<String>>,
    next_revision: RefCell<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: RefCell::new(HashMap::new()),
            writes: RefCell::new(Vec::new()),
            next_revision: RefCell::new(0),
        }
    }

    fn bump_revision(&self) -> String {
        let mut counter = self.next_revision.borrow_mut();
        *counter += 1;
        format!("r{counter}")
    }

    /// Seed an object as if a prior run (or a human) had published it
    pub fn seed(&self, path: &str, content: &str) {
        let revision = self.bump_revision();
        self.objects
            .borrow_mut()
            .insert(path.to_string(), (content.to_string(), revision));
    }

    pub fn content_of(&self, path: &str) -> Option<String> {
        self.objects
            .borrow()
            .get(path)
            .map(|(content, _)| content.clone())
    }

    pub fn revision_of(&self, path: &str) -> Option<String> {
        self.objects
            .borrow()
            .get(path)
            .map(|(_, revision)| revision.clone())
    }

    pub fn object_count(&self) -> usize {
        self.objects.borrow().len()
    }

    pub fn write_log(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }
}

impl ContentStore for MemoryStore {
    fn get(&self, path: &str) -> Result<Option<RemoteObject>> {
        Ok(self.objects.borrow().get(path).map(|(content, revision)| {
            RemoteObject {
                revision: revision.clone(),
                size: content.len() as u64,
            }
        }))
    }

    fn create(&self, path: &str, content: &str, message: &str) -> Result<()> {
        if self.objects.borrow().contains_key(path) {
            return Err(Error::StoreError(format!(
                "create of existing object {path}"
            )));
        }
        self.writes
            .borrow_mut()
            .push(format!("create {path} [{message}]"));
        let revision = self.bump_revision();
        self.objects
            .borrow_mut()
            .insert(path.to_string(), (content.to_string(), revision));
        Ok(())
    }

    fn update(&self, path: &str, content: &str, message: &str, revision: &str) -> Result<()> {
        let current = self
            .revision_of(path)
            .ok_or_else(|| Error::StoreError(format!("update of missing object {path}")))?;
        if current != revision {
            return Err(Error::StoreError(format!(
                "stale revision {revision} for {path}, current is {current}"
            )));
        }
        self.writes
            .borrow_mut()
            .push(format!("update {path} rev={revision} [{message}]"));
        let next = self.bump_revision();
        self.objects
            .borrow_mut()
            .insert(path.to_string(), (content.to_string(), next));
        Ok(())
    }
}

/// Registry layout rooted in a temporary directory
pub fn registry_at(root: &TempDir) -> RegistrySection {
    RegistrySection {
        output_dir: root.path().to_path_buf(),
        ..RegistrySection::default()
    }
}
