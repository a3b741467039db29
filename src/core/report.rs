use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::decision::SignificanceCriterion;
use crate::models::PriceHistogram;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Emitted when a baselined resource changes significantly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeAlert {
    pub resource_id: String,
    pub previous_count: Option<u32>,
    pub current_count: Option<u32>,
    pub delta: Option<i64>,
    pub histogram: PriceHistogram,
    pub criteria: Vec<SignificanceCriterion>,
    pub detected_at: DateTime<Local>,
}

impl ChangeAlert {
    pub fn to_message(&self) -> String {
        let mut lines = vec![
            "🚨 CATALOG UPDATE DETECTED".to_string(),
            "Possible new stock / change".to_string(),
            String::new(),
            self.resource_id.clone(),
            String::new(),
            format!(
                "Items: {} → {} ({})",
                format_count(self.previous_count),
                format_count(self.current_count),
                format_delta(self.delta)
            ),
        ];

        if self.current_count.is_some_and(|c| c > 0) && !self.histogram.buckets.is_empty() {
            lines.push("Price ranges:".to_string());
            for bucket in &self.histogram.buckets {
                lines.push(format!("{}: {}", bucket.label, bucket.count));
            }
        }

        if !self.criteria.is_empty() {
            let names: Vec<String> = self.criteria.iter().map(|c| c.to_string()).collect();
            lines.push(format!("Changed: {}", names.join(", ")));
        }

        lines.push(format!(
            "Detected at: {}",
            self.detected_at.format(TIMESTAMP_FORMAT)
        ));
        lines.join("\n")
    }
}

/// Emitted once per resource per cycle when fetching or extraction fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub resource_id: String,
    pub error: String,
    pub occurred_at: DateTime<Local>,
}

impl ScanFailure {
    pub fn to_message(&self) -> String {
        format!(
            "⚠️ Scan error on catalog\n{}\n\n{}\nAt: {}",
            self.resource_id,
            self.error,
            self.occurred_at.format(TIMESTAMP_FORMAT)
        )
    }
}

fn format_count(count: Option<u32>) -> String {
    count.map_or_else(|| "n/a".to_string(), |c| c.to_string())
}

fn format_delta(delta: Option<i64>) -> String {
    delta.map_or_else(|| "n/a".to_string(), |d| format!("{:+}", d))
}
