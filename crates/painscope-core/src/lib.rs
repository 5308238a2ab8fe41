//! Shared value types and configuration for the painscope pipeline.
//!
//! Every stage in `painscope-scoring` consumes and produces the types
//! defined here. Nothing in this crate performs I/O except configuration
//! loading.

pub mod app_config;
pub mod calibration;
pub mod cluster;
pub mod config;
pub mod error;
pub mod features;
pub mod pain;
pub mod recommendation;
pub mod signal;
pub mod trend;

pub use app_config::{DetectorConfig, FreshnessConfig, PipelineConfig, TrendConfig};
pub use calibration::{load_calibration, Calibration, TierBoundary};
pub use cluster::{ClusterAggregate, PainCluster, Persona};
pub use config::{load_pipeline_config, load_pipeline_config_from_env};
pub use error::{ConfigError, InputError};
pub use features::FeatureVector;
pub use pain::PainInstance;
pub use recommendation::{BuildSignalRecommendation, Recommendation};
pub use signal::{ContentFingerprint, RawSignal};
pub use trend::{DailyMetric, OpportunityWindow, TrendPoint, TrendReport, WindowTrend};
