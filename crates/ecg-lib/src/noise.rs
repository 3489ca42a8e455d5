//! Seeded synthetic noise for demonstrating the filter stage.

use crate::{
    error::{EcgError, Result},
    signal::TimeSeries,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Noise distribution with its level, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NoiseKind {
    /// Zero-mean normal noise.
    Gaussian { stddev: f64 },
    /// Uniform noise on `[-range, range]`.
    Uniform { range: f64 },
}

impl NoiseKind {
    pub fn gaussian(stddev: f64) -> Result<Self> {
        check_level(stddev)?;
        Ok(Self::Gaussian { stddev })
    }

    pub fn uniform(range: f64) -> Result<Self> {
        check_level(range)?;
        Ok(Self::Uniform { range })
    }

    /// Build from a tag such as `"gaussian"` or `"uniform"`.
    pub fn parse(tag: &str, level: f64) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "gaussian" => Self::gaussian(level),
            "uniform" => Self::uniform(level),
            _ => Err(EcgError::InvalidNoiseKind(tag.to_string())),
        }
    }

    pub fn level(&self) -> f64 {
        match *self {
            Self::Gaussian { stddev } => stddev,
            Self::Uniform { range } => range,
        }
    }

    /// Re-check a value that may have been deserialized without going
    /// through the constructors.
    pub fn validate(&self) -> Result<()> {
        check_level(self.level())
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gaussian { stddev } => write!(f, "gaussian(stddev={stddev})"),
            Self::Uniform { range } => write!(f, "uniform(+/-{range})"),
        }
    }
}

fn check_level(level: f64) -> Result<()> {
    if level.is_finite() && level >= 0.0 {
        Ok(())
    } else {
        Err(EcgError::InvalidNoiseLevel(level))
    }
}

/// Noise section of the pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    #[serde(flatten)]
    pub kind: NoiseKind,
    #[serde(default)]
    pub seed: u64,
}

/// Add one draw per sample from `kind`, using the caller's generator.
pub fn inject<R: Rng + ?Sized>(
    signal: &TimeSeries,
    kind: NoiseKind,
    rng: &mut R,
) -> Result<TimeSeries> {
    kind.validate()?;
    let data = match kind {
        NoiseKind::Gaussian { stddev } => {
            let dist =
                Normal::new(0.0, stddev).map_err(|_| EcgError::InvalidNoiseLevel(stddev))?;
            perturb(&signal.data, &dist, rng)
        }
        NoiseKind::Uniform { range } => {
            let dist = Uniform::new_inclusive(-range, range);
            perturb(&signal.data, &dist, rng)
        }
    };
    Ok(signal.with_data(data))
}

/// [`inject`] with a fresh `StdRng` seeded from `seed`; identical arguments
/// give identical output.
pub fn add_noise(signal: &TimeSeries, kind: NoiseKind, seed: u64) -> Result<TimeSeries> {
    let mut rng = StdRng::seed_from_u64(seed);
    log::debug!("adding {kind} noise to {} samples (seed {seed})", signal.len());
    inject(signal, kind, &mut rng)
}

fn perturb<D, R>(data: &[f64], dist: &D, rng: &mut R) -> Vec<f64>
where
    D: Distribution<f64>,
    R: Rng + ?Sized,
{
    data.iter().map(|x| x + dist.sample(rng)).collect()
}
