//! Persisted catalog: load once, rewrite in full after every entry.
//!
//! Entries read from disk keep their original JSON text and are written back
//! verbatim until the crawl replaces them, so a run never rewrites an entry it
//! skipped.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use racefeed_common::{CatalogEntry, RaceFeedError};
use serde::Serialize;
use serde_json::value::RawValue;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// In-memory catalog: entries in insertion order, indexed by slug.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    /// Text each entry was loaded from; `None` once upserted.
    as_read: Vec<Option<Box<RawValue>>>,
    by_slug: HashMap<String, usize>,
}

/// One element of the saved array.
#[derive(Serialize)]
#[serde(untagged)]
enum Saved<'a> {
    AsRead(&'a RawValue),
    Entry(&'a CatalogEntry),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries. Later duplicates of a slug are dropped.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self::from_loaded(entries.into_iter().map(|entry| (entry, None)))
    }

    fn from_loaded(
        loaded: impl IntoIterator<Item = (CatalogEntry, Option<Box<RawValue>>)>,
    ) -> Self {
        let mut catalog = Self::new();
        for (entry, raw) in loaded {
            if catalog.contains(&entry.slug) {
                warn!(slug = entry.slug.as_str(), "Dropping duplicate catalog entry");
                continue;
            }
            catalog
                .by_slug
                .insert(entry.slug.clone(), catalog.entries.len());
            catalog.entries.push(entry);
            catalog.as_read.push(raw);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    pub fn get(&self, slug: &str) -> Option<&CatalogEntry> {
        self.by_slug.get(slug).map(|&i| &self.entries[i])
    }

    /// Append a new slug, or replace the existing entry in place.
    pub fn upsert(&mut self, entry: CatalogEntry) -> Upsert {
        match self.by_slug.get(&entry.slug) {
            Some(&i) => {
                self.entries[i] = entry;
                self.as_read[i] = None;
                Upsert::Updated
            }
            None => {
                self.by_slug.insert(entry.slug.clone(), self.entries.len());
                self.entries.push(entry);
                self.as_read.push(None);
                Upsert::Inserted
            }
        }
    }

    fn to_saved(&self) -> Vec<Saved<'_>> {
        self.entries
            .iter()
            .zip(&self.as_read)
            .map(|(entry, raw)| match raw {
                Some(raw) => Saved::AsRead(&**raw),
                None => Saved::Entry(entry),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// CatalogStore
// ---------------------------------------------------------------------------

/// JSON file holding the whole catalog as a pretty-printed array.
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable catalog is copied before it gets overwritten.
    pub fn unreadable_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".unreadable");
        PathBuf::from(name)
    }

    /// Load the catalog. Never fails: a missing file is an empty catalog, and
    /// an unreadable one is logged, set aside, and also treated as empty.
    pub fn load(&self) -> Catalog {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No catalog yet, starting empty");
            return Catalog::new();
        }

        match self.read() {
            Ok(entries) => {
                let catalog = Catalog::from_loaded(entries);
                info!(path = %self.path.display(), entries = catalog.len(), "Loaded catalog");
                catalog
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read catalog, starting empty");
                self.set_aside();
                Catalog::new()
            }
        }
    }

    fn read(&self) -> Result<Vec<(CatalogEntry, Option<Box<RawValue>>)>, RaceFeedError> {
        let text = fs::read_to_string(&self.path)?;
        let items: Vec<Box<RawValue>> = serde_json::from_str(&text)?;
        items
            .into_iter()
            .map(|raw| -> Result<_, RaceFeedError> {
                let entry: CatalogEntry = serde_json::from_str(raw.get())?;
                Ok((entry, Some(raw)))
            })
            .collect()
    }

    fn set_aside(&self) {
        let backup = self.unreadable_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => warn!(backup = %backup.display(), "Kept a copy of the unreadable catalog"),
            Err(e) => warn!(error = %e, "Could not copy the unreadable catalog"),
        }
    }

    /// Write the full catalog. The file is replaced atomically, so readers
    /// see either the previous snapshot or this one.
    pub fn save(&self, catalog: &Catalog) -> Result<(), RaceFeedError> {
        let json = serde_json::to_vec_pretty(&catalog.to_saved())?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| RaceFeedError::Io(e.error))?;
        Ok(())
    }
}
