//! Fuzzy title comparison used to correlate the same event across sites.

use std::sync::LazyLock;

use regex::Regex;

/// Fraction of one title's words that must appear in the other.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9 ]+").expect("valid regex"));

/// Domain terms that say nothing about which event a title denotes.
static STOP_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(race|full|replay|formula|grand prix|watch|video|stream|round|gp|qualifying|practice|show|post|pre|202[0-9])\b",
    )
    .expect("valid regex")
});

/// Lower-case, strip punctuation and stop words, and split into words.
pub fn normalize(title: &str) -> Vec<String> {
    let lowered = title.to_lowercase();
    let cleaned = NON_ALNUM_RE.replace_all(&lowered, " ");
    let stripped = STOP_WORDS_RE.replace_all(&cleaned, "");
    stripped.split_whitespace().map(str::to_string).collect()
}

/// Whether two titles plausibly denote the same event.
///
/// True when more than 60% of either title's significant words occur in the
/// other. A title with no significant words never matches.
pub fn similar(a: &str, b: &str) -> bool {
    let wa = normalize(a);
    let wb = normalize(b);
    overlap(&wa, &wb) > SIMILARITY_THRESHOLD || overlap(&wb, &wa) > SIMILARITY_THRESHOLD
}

/// Share of `words` present in `other`, counting each occurrence separately.
fn overlap(words: &[String], other: &[String]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let hits = words.iter().filter(|w| other.contains(w)).count();
    hits as f64 / words.len() as f64
}
