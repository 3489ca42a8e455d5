use crate::{
    detectors::ecg::DetectionPolicy,
    error::{EcgError, Result},
    filters::FilterSpec,
};
use serde::{Deserialize, Serialize};

/// Uniformly sampled single-channel recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    /// Build a series after checking that `fs` is usable.
    pub fn new(fs: f64, data: Vec<f64>) -> Result<Self> {
        SamplingContext::new(fs)?;
        Ok(Self { fs, data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    /// Same sampling rate, different samples.
    pub fn with_data(&self, data: Vec<f64>) -> Self {
        Self { fs: self.fs, data }
    }

    pub fn sampling(&self) -> Result<SamplingContext> {
        SamplingContext::new(self.fs)
    }
}

/// Validated sampling frequency and the single place `fs`-dependent
/// parameters are derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingContext {
    fs: f64,
}

impl SamplingContext {
    pub fn new(fs: f64) -> Result<Self> {
        if !fs.is_finite() || fs <= 0.0 {
            return Err(EcgError::InvalidSamplingRate(fs));
        }
        Ok(Self { fs })
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn nyquist(&self) -> f64 {
        0.5 * self.fs
    }

    /// Default band-pass for this rate. The 50 Hz upper cutoff is pulled down
    /// to 90% of Nyquist when the rate cannot support it; rates too slow to
    /// keep it above the 0.5 Hz lower cutoff still fail validation.
    pub fn filter_spec(&self) -> FilterSpec {
        let spec = FilterSpec::default();
        let ceiling = 0.9 * self.nyquist();
        FilterSpec {
            high_cutoff_hz: spec.high_cutoff_hz.min(ceiling),
            ..spec
        }
    }

    /// Default detection policy. It is stated in seconds and carries no rate;
    /// [`SamplingContext::min_peak_distance`] turns it into samples.
    pub fn detection_policy(&self) -> DetectionPolicy {
        DetectionPolicy::default()
    }

    /// Minimum peak spacing in samples for `policy`, never below one sample.
    pub fn min_peak_distance(&self, policy: &DetectionPolicy) -> usize {
        // The epsilon keeps 0.6 * 500.0 at 300 rather than 301 on rounding noise.
        let samples = policy.min_separation_s * self.fs - 1e-9;
        (samples.ceil().max(1.0)) as usize
    }
}

/// Detected R-peaks together with the parameters that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakSet {
    pub indices: Vec<usize>,
    pub min_height: f64,
    pub min_distance: usize,
}

impl PeakSet {
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn from_peaks(peaks: &PeakSet, fs: f64) -> Self {
        let rr = peaks
            .indices
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64 / fs)
            .collect();
        Self { rr }
    }
}

/// Instantaneous heart rate (bpm), one value per RR interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSeries {
    pub bpm: Vec<f64>,
    pub average_bpm: f64,
}

impl HeartRateSeries {
    /// Fails when there is no interval to average over. The detector checks
    /// the peak count first, so `found` here only reports an empty series.
    pub fn from_rr(rr: &RRSeries) -> Result<Self> {
        if rr.rr.is_empty() {
            return Err(EcgError::InsufficientBeats { found: 0 });
        }
        let bpm: Vec<f64> = rr.rr.iter().map(|interval| 60.0 / interval).collect();
        let average_bpm = bpm.iter().sum::<f64>() / bpm.len() as f64;
        Ok(Self { bpm, average_bpm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_sampling_rate() {
        assert_eq!(
            SamplingContext::new(0.0),
            Err(EcgError::InvalidSamplingRate(0.0))
        );
        assert!(SamplingContext::new(f64::NAN).is_err());
        assert!(TimeSeries::new(-250.0, vec![0.0; 4]).is_err());
    }

    #[test]
    fn peak_distance_rounds_up() {
        let policy = DetectionPolicy::default();
        assert_eq!(SamplingContext::new(500.0).unwrap().min_peak_distance(&policy), 300);
        assert_eq!(SamplingContext::new(257.0).unwrap().min_peak_distance(&policy), 155);
    }

    #[test]
    fn default_filter_fits_below_nyquist() {
        let fast = SamplingContext::new(500.0).unwrap();
        assert_eq!(fast.filter_spec(), FilterSpec::default());

        let slow = SamplingContext::new(100.0).unwrap();
        let spec = slow.filter_spec();
        assert!((spec.high_cutoff_hz - 45.0).abs() < 1e-12);
        assert_eq!(spec.low_cutoff_hz, 0.5);
        assert!(spec.normalized(&slow).is_ok());
        assert!(FilterSpec::default().normalized(&slow).is_err());
    }

    #[test]
    fn rr_and_rate_from_peaks() {
        let peaks = PeakSet {
            indices: vec![100, 350, 600],
            min_height: 0.5,
            min_distance: 150,
        };
        let rr = RRSeries::from_peaks(&peaks, 250.0);
        assert_eq!(rr.rr, vec![1.0, 1.0]);
        let hr = HeartRateSeries::from_rr(&rr).unwrap();
        assert_eq!(hr.bpm, vec![60.0, 60.0]);
        assert!((hr.average_bpm - 60.0).abs() < 1e-12);
    }

    #[test]
    fn empty_rr_has_no_rate() {
        let rr = RRSeries { rr: Vec::new() };
        assert_eq!(
            HeartRateSeries::from_rr(&rr),
            Err(EcgError::InsufficientBeats { found: 0 })
        );
    }
}
