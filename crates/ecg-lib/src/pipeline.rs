use crate::{
    detectors::ecg::{detect_beats_with_policy, BeatDetection, DetectionPolicy},
    error::Result,
    filters::{filter, FilterSpec},
    metrics::spectrum::{spectrum, Spectrum},
    noise::{add_noise, NoiseConfig},
    signal::{SamplingContext, TimeSeries},
};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, thread};

/// Everything one pipeline run needs besides the samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcgPipelineConfig {
    pub filter: FilterSpec,
    pub detection: DetectionPolicy,
    /// Synthetic noise added to the raw record before filtering.
    pub noise: Option<NoiseConfig>,
    /// Rescale the filtered signal to unit peak amplitude before detection so
    /// `detection.min_height` becomes a fraction of the tallest deflection.
    pub normalize_amplitude: bool,
}

impl EcgPipelineConfig {
    /// Defaults derived from one sampling context; unlike [`Default`] these
    /// stay valid at low sampling rates.
    pub fn from_sampling(sampling: &SamplingContext) -> Self {
        Self {
            filter: sampling.filter_spec(),
            detection: sampling.detection_policy(),
            noise: None,
            normalize_amplitude: false,
        }
    }

    /// Check every stage's parameters against `sampling` before any work.
    pub fn validate(&self, sampling: &SamplingContext) -> Result<()> {
        self.filter.normalized(sampling)?;
        self.detection.validate()?;
        if let Some(noise) = &self.noise {
            noise.kind.validate()?;
        }
        Ok(())
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcgAnalysis {
    pub fs: f64,
    pub sample_count: usize,
    pub noise: Option<NoiseConfig>,
    pub filtered: TimeSeries,
    pub beats: BeatDetection,
    pub spectrum: Spectrum,
}

/// raw -> (noise) -> band-pass -> beats, and band-pass -> spectrum.
pub fn run_pipeline(raw: &TimeSeries, cfg: &EcgPipelineConfig) -> Result<EcgAnalysis> {
    let sampling = raw.sampling()?;
    cfg.validate(&sampling)?;

    let input: Cow<'_, TimeSeries> = match &cfg.noise {
        Some(noise) => Cow::Owned(add_noise(raw, noise.kind, noise.seed)?),
        None => Cow::Borrowed(raw),
    };
    let filtered = filter(&input, &cfg.filter)?;
    let spectrum = spectrum(&filtered)?;

    let detection_input = if cfg.normalize_amplitude {
        Cow::Owned(normalize_peak(&filtered))
    } else {
        Cow::Borrowed(&filtered)
    };
    let beats = detect_beats_with_policy(&detection_input, &cfg.detection)?;

    log::info!(
        "analysed {} samples at {} Hz: {} beats, {:.1} bpm average",
        raw.len(),
        raw.fs,
        beats.peaks.len(),
        beats.average_bpm()
    );

    Ok(EcgAnalysis {
        fs: raw.fs,
        sample_count: raw.len(),
        noise: cfg.noise,
        filtered,
        beats,
        spectrum,
    })
}

/// Run independent records concurrently, one scoped thread each. Results
/// come back in input order.
pub fn run_batch(records: &[TimeSeries], cfg: &EcgPipelineConfig) -> Vec<Result<EcgAnalysis>> {
    thread::scope(|scope| {
        let handles: Vec<_> = records
            .iter()
            .map(|record| scope.spawn(move || run_pipeline(record, cfg)))
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

/// Scale so the largest absolute sample is 1. All-zero input is returned as is.
pub fn normalize_peak(ts: &TimeSeries) -> TimeSeries {
    let peak = ts.data.iter().fold(0.0f64, |acc, x| acc.max(x.abs()));
    if peak == 0.0 || !peak.is_finite() {
        return ts.clone();
    }
    ts.with_data(ts.data.iter().map(|x| x / peak).collect())
}
