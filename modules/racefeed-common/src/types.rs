use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Source labels ---

/// First number handed out to links found by cross-site search.
pub const FIRST_NUMBERED_STREAM: u32 = 3;

/// Key under which a discovered stream URL is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceLabel {
    /// Primary mirror found on the entry's own detail page.
    Server1,
    /// Secondary mirror found on the entry's own detail page.
    Server2,
    /// Remote-mirrored copy of `Server1`.
    CustomServer,
    /// Link discovered via fuzzy cross-site search, numbered from 3.
    Stream(u32),
}

impl SourceLabel {
    /// The fixed labels, in the order they are written.
    pub const NAMED: [SourceLabel; 3] = [
        SourceLabel::Server1,
        SourceLabel::Server2,
        SourceLabel::CustomServer,
    ];
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLabel::Server1 => write!(f, "server1"),
            SourceLabel::Server2 => write!(f, "server2"),
            SourceLabel::CustomServer => write!(f, "customServer"),
            SourceLabel::Stream(n) => write!(f, "stream{n}"),
        }
    }
}

impl FromStr for SourceLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server1" => Ok(SourceLabel::Server1),
            "server2" => Ok(SourceLabel::Server2),
            // Older catalogs spelled it in lower case.
            "customServer" | "customserver" => Ok(SourceLabel::CustomServer),
            other => other
                .strip_prefix("stream")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n >= FIRST_NUMBERED_STREAM)
                .map(SourceLabel::Stream)
                .ok_or_else(|| format!("unknown source label: {other}")),
        }
    }
}

// --- Stream links ---

/// Mapping from source label to stream URL.
///
/// Serialized as a flat JSON object in label order: `server1`, `server2`,
/// `customServer`, then `stream3`, `stream4`, ... Keys that are not labels
/// are carried through untouched and written after the labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamLinks {
    pub server1: Option<String>,
    pub server2: Option<String>,
    pub custom_server: Option<String>,
    numbered: BTreeMap<u32, String>,
    unlabelled: BTreeMap<String, Value>,
}

impl StreamLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links discovered in order, labelled `stream3`, `stream4`, ...
    pub fn with_discovered(mut self, urls: impl IntoIterator<Item = String>) -> Self {
        for url in urls {
            self.push_numbered(url);
        }
        self
    }

    pub fn get(&self, label: SourceLabel) -> Option<&str> {
        match label {
            SourceLabel::Server1 => self.server1.as_deref(),
            SourceLabel::Server2 => self.server2.as_deref(),
            SourceLabel::CustomServer => self.custom_server.as_deref(),
            SourceLabel::Stream(n) => self.numbered.get(&n).map(String::as_str),
        }
    }

    /// Set a label. Empty URLs are ignored.
    pub fn insert(&mut self, label: SourceLabel, url: impl Into<String>) {
        let url = url.into();
        if url.is_empty() {
            return;
        }
        match label {
            SourceLabel::Server1 => self.server1 = Some(url),
            SourceLabel::Server2 => self.server2 = Some(url),
            SourceLabel::CustomServer => self.custom_server = Some(url),
            SourceLabel::Stream(n) => {
                self.numbered.insert(n, url);
            }
        }
    }

    /// Append a numbered link after the highest label in use.
    pub fn push_numbered(&mut self, url: impl Into<String>) -> Option<SourceLabel> {
        let url = url.into();
        if url.is_empty() {
            return None;
        }
        let next = self
            .numbered
            .keys()
            .next_back()
            .map_or(FIRST_NUMBERED_STREAM, |last| last + 1);
        self.numbered.insert(next, url);
        Some(SourceLabel::Stream(next))
    }

    /// Numbered links in label order.
    pub fn numbered(&self) -> impl Iterator<Item = (SourceLabel, &str)> {
        self.numbered
            .iter()
            .map(|(n, url)| (SourceLabel::Stream(*n), url.as_str()))
    }

    pub fn numbered_len(&self) -> usize {
        self.numbered.len()
    }

    /// Keys that are not source labels, kept as read.
    pub fn unlabelled(&self) -> &BTreeMap<String, Value> {
        &self.unlabelled
    }

    /// Carry over unlabelled keys from `other` that this map lacks.
    pub fn keep_unlabelled_from(&mut self, other: &StreamLinks) {
        for (key, value) in &other.unlabelled {
            self.unlabelled
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Every (label, url) pair in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (SourceLabel, &str)> {
        SourceLabel::NAMED
            .into_iter()
            .filter_map(|label| self.get(label).map(|url| (label, url)))
            .chain(self.numbered())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for StreamLinks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len() + self.unlabelled.len()))?;
        for (label, url) in self.iter() {
            map.serialize_entry(&label.to_string(), url)?;
        }
        for (key, value) in &self.unlabelled {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StreamLinks {
    /// Label keys need a string value; empty strings and other values are
    /// dropped. Any other key is kept as unlabelled.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, Value>::deserialize(deserializer)?;
        let mut links = StreamLinks::new();
        for (key, value) in raw {
            match (key.parse::<SourceLabel>(), value) {
                (Ok(label), Value::String(url)) => links.insert(label, url),
                (Ok(_), _) => {}
                (Err(_), value) => {
                    links.unlabelled.insert(key, value);
                }
            }
        }
        Ok(links)
    }
}

// --- Catalog entries ---

/// One race in the persisted catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Opaque identifier, minted on first discovery and reused afterwards.
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub thumbnail: String,
    /// URL-derived key, unique within the catalog.
    pub slug: String,
    #[serde(default, alias = "thumbnailslug")]
    pub thumbnail_slug: String,
    #[serde(default, alias = "streamlinks")]
    pub stream_links: StreamLinks,
    /// Fields this crate does not know about, written back after the rest.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Mint a fresh entry identifier.
pub fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
