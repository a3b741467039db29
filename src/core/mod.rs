pub mod baseline;
pub mod decision;
pub mod quantitative;
pub mod report;
pub mod signal;
pub mod snapshot_builder;
pub mod state;

pub use baseline::{BaselineState, BaselineStore};
pub use decision::{ChangeDetector, Decision, DiscardReason, SignificanceCriterion, SignificancePredicate};
pub use quantitative::{PriceHistogramExtractor, QuantitativeExtractor};
pub use report::{ChangeAlert, ScanFailure};
pub use signal::SignalExtractor;
pub use snapshot_builder::SnapshotBuilder;
pub use state::WatchState;
