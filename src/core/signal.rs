use sha2::{Digest, Sha256};

use crate::config::DetectionConfig;
use crate::models::{Fingerprint, SignalVector};

/// Default stock-related keywords counted on every page.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "out of stock",
    "sold out",
    "add to bag",
    "add to cart",
    "notify me",
    "in stock",
];

pub const DEFAULT_SLICE_CHARS: usize = 2000;

/// Turns page text into a fingerprint plus keyword signal vector.
///
/// The digest covers the character length, every `keyword:count` pair in
/// configuration order, and the first and last `slice_chars` characters of the
/// lower-cased text. Identical input always yields identical output.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    keywords: Vec<String>,
    slice_chars: usize,
}

impl SignalExtractor {
    pub fn new(keywords: &[String], slice_chars: usize) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            keywords,
            slice_chars,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(&config.keywords, config.slice_chars)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn extract(&self, content: &str) -> (Fingerprint, SignalVector) {
        let text = content.to_lowercase();
        let char_len = text.chars().count();

        // Blank pages carry no signals at all, mirroring the absent item count.
        let keywords: &[String] = if text.trim().is_empty() { &[] } else { &self.keywords };

        let mut signals = SignalVector::new();
        let mut pairs = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let count = text.matches(keyword.as_str()).count() as u32;
            signals.insert(keyword, count);
            pairs.push(format!("{}:{}", keyword, count));
        }

        let prefix = char_prefix(&text, self.slice_chars);
        let suffix = char_suffix(&text, char_len, self.slice_chars);

        let mut hasher = Sha256::new();
        hasher.update(char_len.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(pairs.join("|").as_bytes());
        hasher.update(b"|");
        hasher.update(prefix.as_bytes());
        hasher.update(b"|");
        hasher.update(suffix.as_bytes());

        (Fingerprint::from_digest(&hasher.finalize()), signals)
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        let keywords: Vec<String> = DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
        Self::new(&keywords, DEFAULT_SLICE_CHARS)
    }
}

fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn char_suffix(text: &str, char_len: usize, n: usize) -> &str {
    if char_len <= n {
        return text;
    }
    match text.char_indices().nth(char_len - n) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}
