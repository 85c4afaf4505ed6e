//! Reconcile freshly scraped stream links with a persisted entry.
//!
//! - `id`: reuse the persisted one, otherwise mint a new one.
//! - `server1`, `server2`, `customServer`: fresh value if present, otherwise
//!   the persisted value.
//! - Numbered links: fresh ones keep their labels exactly, duplicates
//!   included. Persisted URLs that the fresh set does not contain follow,
//!   renumbered to continue the sequence. Persisted labels are therefore not
//!   stable across merges.
//! - Anything the catalog does not model (unknown entry fields, unlabelled
//!   link keys) is carried over from the persisted entry.

use racefeed_common::{new_entry_id, CatalogEntry, SourceLabel, StreamLinks};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub id: String,
    pub stream_links: StreamLinks,
    pub extra: Map<String, Value>,
}

pub fn merge(fresh: StreamLinks, persisted: Option<&CatalogEntry>) -> Merged {
    match persisted {
        Some(entry) => Merged {
            id: entry.id.clone(),
            stream_links: merge_links(fresh, &entry.stream_links),
            extra: entry.extra.clone(),
        },
        None => Merged {
            id: new_entry_id(),
            stream_links: fresh,
            extra: Map::new(),
        },
    }
}

pub fn merge_links(fresh: StreamLinks, persisted: &StreamLinks) -> StreamLinks {
    let mut merged = StreamLinks::new();

    for label in SourceLabel::NAMED {
        if let Some(url) = fresh.get(label).or_else(|| persisted.get(label)) {
            merged.insert(label, url);
        }
    }

    for (label, url) in fresh.numbered() {
        merged.insert(label, url);
    }
    for (_, url) in persisted.numbered() {
        if fresh.numbered().any(|(_, fresh_url)| fresh_url == url) {
            continue;
        }
        merged.push_numbered(url);
    }

    merged.keep_unlabelled_from(&fresh);
    merged.keep_unlabelled_from(persisted);
    merged
}
