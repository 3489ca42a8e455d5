use crate::pipeline::EcgPipelineConfig;
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Load a pipeline configuration from TOML. Missing sections keep their
/// defaults, e.g.
///
/// ```toml
/// normalize_amplitude = false
///
/// [filter]
/// low_cutoff_hz = 0.5
/// high_cutoff_hz = 40.0
/// order = 2
///
/// [detection]
/// min_height = 0.5
/// min_separation_s = 0.6
///
/// [noise]
/// kind = "gaussian"
/// stddev = 0.3
/// seed = 0
/// ```
pub fn read_config(path: &Path) -> Result<EcgPipelineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<EcgPipelineConfig> {
    let cfg: EcgPipelineConfig = toml::from_str(contents)?;
    Ok(cfg)
}
