use std::sync::Arc;

use super::quantitative::{PriceHistogramExtractor, QuantitativeExtractor};
use super::signal::SignalExtractor;
use crate::config::DetectionConfig;
use crate::models::{RawContent, Snapshot};
use crate::utils::error::{AppError, Result};

/// Runs both extractors over fetched content to produce a [`Snapshot`].
#[derive(Clone)]
pub struct SnapshotBuilder {
    signal: SignalExtractor,
    quantitative: Arc<dyn QuantitativeExtractor>,
}

impl SnapshotBuilder {
    pub fn new(signal: SignalExtractor, quantitative: Arc<dyn QuantitativeExtractor>) -> Self {
        Self {
            signal,
            quantitative,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        Ok(Self::new(
            SignalExtractor::from_config(config),
            Arc::new(PriceHistogramExtractor::from_config(config)?),
        ))
    }

    pub fn build(&self, content: &RawContent) -> Snapshot {
        let (fingerprint, signals) = self.signal.extract(&content.text);
        let quantitative = self.quantitative.extract(&content.text);
        Snapshot::new(fingerprint, signals, quantitative, content.fetched_at)
    }

    /// Builds on the blocking pool so large pages don't stall the poll loop.
    /// A panicking extractor surfaces as [`AppError::Extraction`].
    pub async fn build_blocking(&self, content: RawContent) -> Result<Snapshot> {
        let builder = self.clone();
        let resource = content.resource_id.clone();
        tokio::task::spawn_blocking(move || builder.build(&content))
            .await
            .map_err(|e| AppError::Extraction {
                resource,
                message: e.to_string(),
            })
    }
}
