use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hex-encoded SHA-256 digest summarizing a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_digest(digest: &[u8]) -> Self {
        Fingerprint(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, enough to tell fingerprints apart in logs.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyword occurrence counts in the lower-cased page text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalVector(BTreeMap<String, u32>);

impl SignalVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keyword: &str, count: u32) {
        self.0.insert(keyword.to_string(), count);
    }

    pub fn get(&self, keyword: &str) -> Option<u32> {
        self.0.get(keyword).copied()
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|&c| u64::from(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// Half-open price interval `[lower, upper)`; `upper == None` means "and above".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBucket {
    pub lower: u64,
    pub upper: Option<u64>,
}

impl PriceBucket {
    pub fn contains(&self, price: u64) -> bool {
        price >= self.lower && self.upper.is_none_or(|upper| price < upper)
    }

    pub fn label(&self) -> String {
        match self.upper {
            Some(upper) => format!("{}-{}", self.lower, upper),
            None => format!("{}+", self.lower),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub label: String,
    pub count: u32,
}

/// Price counts per bucket, in ascending bucket order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistogram {
    pub buckets: Vec<BucketCount>,
}

impl PriceHistogram {
    pub fn count_for(&self, label: &str) -> Option<u32> {
        self.buckets
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.count)
    }

    pub fn total(&self) -> u32 {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantitativeSnapshot {
    /// `None` when the content could not be processed at all; distinct from `Some(0)`.
    pub item_count: Option<u32>,
    pub histogram: PriceHistogram,
}

impl QuantitativeSnapshot {
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Comparable state of one resource at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    fingerprint: Fingerprint,
    signals: SignalVector,
    quantitative: QuantitativeSnapshot,
    taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(
        fingerprint: Fingerprint,
        signals: SignalVector,
        quantitative: QuantitativeSnapshot,
        taken_at: DateTime<Utc>,
    ) -> Self {
        Self {
            fingerprint,
            signals,
            quantitative,
            taken_at,
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn signals(&self) -> &SignalVector {
        &self.signals
    }

    pub fn quantitative(&self) -> &QuantitativeSnapshot {
        &self.quantitative
    }

    pub fn item_count(&self) -> Option<u32> {
        self.quantitative.item_count
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }
}
