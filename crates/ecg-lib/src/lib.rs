pub mod config;
pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod noise;
pub mod pipeline;
pub mod plot;
pub mod signal;

pub use detectors::*;
pub use error::{EcgError, Result};
pub use filters::{design_and_apply, filter, FilterSpec};
pub use metrics::*;
pub use noise::{add_noise, inject, NoiseConfig, NoiseKind};
pub use pipeline::{run_batch, run_pipeline, EcgAnalysis, EcgPipelineConfig};
pub use signal::*;
