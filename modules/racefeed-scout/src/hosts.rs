//! Which hosting providers feed which source label.
//!
//! Adding a mirror provider means adding a pattern here, not touching the
//! fetchers.

use racefeed_common::SourceLabel;
use regex::Regex;

/// Built-in rules: each label accepts the known domain variants of one host.
pub const DEFAULT_HOST_RULES: &[(SourceLabel, &[&str])] = &[
    (SourceLabel::Server1, &[r"filemoon\.(to|sx)/e/"]),
    (SourceLabel::Server2, &[r"luluvdo(o)?\.com/e/"]),
];

#[derive(Debug, Clone)]
pub struct HostTable {
    rules: Vec<(SourceLabel, Vec<Regex>)>,
}

impl HostTable {
    pub fn new(rules: &[(SourceLabel, &[&str])]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|(label, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((*label, compiled))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn labels(&self) -> impl Iterator<Item = SourceLabel> + '_ {
        self.rules.iter().map(|(label, _)| *label)
    }

    /// Whether `url` belongs to the host behind `label`.
    pub fn matches(&self, label: SourceLabel, url: &str) -> bool {
        self.rules
            .iter()
            .filter(|(l, _)| *l == label)
            .any(|(_, patterns)| patterns.iter().any(|re| re.is_match(url)))
    }

    /// For every label, the first candidate URL its host accepts.
    pub fn first_matches<'a>(&self, candidates: &'a [String]) -> Vec<(SourceLabel, &'a str)> {
        self.labels()
            .filter_map(|label| {
                candidates
                    .iter()
                    .find(|url| self.matches(label, url))
                    .map(|url| (label, url.as_str()))
            })
            .collect()
    }
}

impl Default for HostTable {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_RULES).expect("valid host pattern")
    }
}
