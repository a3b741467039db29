use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

use crate::config::DetectionConfig;
use crate::models::{BucketCount, PriceBucket, PriceHistogram, QuantitativeSnapshot};
use crate::utils::error::{AppError, Result};

pub const DEFAULT_BUCKET_BOUNDS: &[u64] = &[0, 500, 1000, 2000];

// Currency marker, then digits with optional 3- or 2-digit group separators
// (covers both 12,345 and 1,23,456), then an optional decimal part.
const PRICE_PATTERN: &str =
    r"(?i)(?:₹|\brs\.?|\binr|\$|£|€)\s*(\d{1,3}(?:,\d{2,3})+|\d+)(\.\d+)?";

/// Turns page text into structured counts.
///
/// Implementations must be pure. An implementation that cannot process the
/// content reports an absent item count rather than failing.
pub trait QuantitativeExtractor: Send + Sync {
    fn name(&self) -> &str;
    fn extract(&self, content: &str) -> QuantitativeSnapshot;
}

/// Builds contiguous half-open buckets from ascending lower bounds; the last
/// bucket is unbounded.
pub fn buckets_from_bounds(bounds: &[u64]) -> Result<Vec<PriceBucket>> {
    if bounds.is_empty() {
        return Err(AppError::Validation("At least one price bucket bound is required".into()));
    }
    if bounds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(AppError::Validation(format!(
            "Price bucket bounds must be strictly ascending: {:?}",
            bounds
        )));
    }

    Ok(bounds
        .iter()
        .enumerate()
        .map(|(i, &lower)| PriceBucket {
            lower,
            upper: bounds.get(i + 1).copied(),
        })
        .collect())
}

/// Regex heuristic: every currency-marked number counts as one item.
///
/// Non-price numbers formatted like prices (e.g. "₹200 off") are counted too.
pub struct PriceHistogramExtractor {
    price_regex: Regex,
    buckets: Vec<PriceBucket>,
}

impl PriceHistogramExtractor {
    pub fn new(bounds: &[u64]) -> Result<Self> {
        let price_regex = Regex::new(PRICE_PATTERN)
            .map_err(|e| AppError::Internal(format!("Invalid price pattern: {}", e)))?;

        Ok(Self {
            price_regex,
            buckets: buckets_from_bounds(bounds)?,
        })
    }

    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        Self::new(&config.price_buckets)
    }

    pub fn buckets(&self) -> &[PriceBucket] {
        &self.buckets
    }

    /// Parses every currency-marked number, dropping the ones that don't fit a `u64`.
    pub fn extract_prices(&self, content: &str) -> Vec<u64> {
        self.price_regex
            .captures_iter(content)
            .filter_map(|captures| {
                let integer = captures.get(1)?.as_str().replace(',', "");
                let fraction = captures.get(2).map(|m| m.as_str()).unwrap_or("");
                Decimal::from_str(&format!("{}{}", integer, fraction))
                    .ok()?
                    .trunc()
                    .to_u64()
            })
            .collect()
    }

    pub fn bucket_for(&self, price: u64) -> Option<&PriceBucket> {
        self.buckets.iter().find(|b| b.contains(price))
    }
}

impl QuantitativeExtractor for PriceHistogramExtractor {
    fn name(&self) -> &str {
        "price-histogram"
    }

    fn extract(&self, content: &str) -> QuantitativeSnapshot {
        if content.trim().is_empty() {
            return QuantitativeSnapshot::absent();
        }

        let prices = self.extract_prices(content);
        let mut counts = vec![0u32; self.buckets.len()];
        for &price in &prices {
            if let Some(idx) = self.buckets.iter().position(|b| b.contains(price)) {
                counts[idx] += 1;
            }
        }

        let histogram = PriceHistogram {
            buckets: self
                .buckets
                .iter()
                .zip(counts)
                .map(|(bucket, count)| BucketCount {
                    label: bucket.label(),
                    count,
                })
                .collect(),
        };

        QuantitativeSnapshot {
            item_count: Some(prices.len() as u32),
            histogram,
        }
    }
}
