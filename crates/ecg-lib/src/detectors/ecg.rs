use crate::{
    error::{EcgError, Result},
    signal::{HeartRateSeries, PeakSet, RRSeries, SamplingContext, TimeSeries},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Thresholds for R-peak picking on a band-passed ECG.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionPolicy {
    /// Minimum peak amplitude, in the units of the filtered signal. The
    /// default assumes a millivolt-scaled recording.
    pub min_height: f64,
    /// Minimum spacing between accepted peaks (seconds). 0.6 s caps the
    /// detectable rate at 100 bpm; lower it for faster rhythms.
    pub min_separation_s: f64,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            min_height: 0.5,
            min_separation_s: 0.6,
        }
    }
}

impl DetectionPolicy {
    pub fn validate(&self) -> Result<()> {
        if !self.min_height.is_finite() {
            return Err(EcgError::InvalidDetectionPolicy(format!(
                "min_height must be finite, got {}",
                self.min_height
            )));
        }
        if !self.min_separation_s.is_finite() || self.min_separation_s <= 0.0 {
            return Err(EcgError::InvalidDetectionPolicy(format!(
                "min_separation_s must be finite and positive, got {}",
                self.min_separation_s
            )));
        }
        Ok(())
    }
}

/// Peaks, RR intervals and heart rate for one filtered record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatDetection {
    pub fs: f64,
    pub sample_count: usize,
    pub peaks: PeakSet,
    pub rr: RRSeries,
    pub heart_rate: HeartRateSeries,
}

impl BeatDetection {
    /// Derive RR and heart rate from already located peaks.
    pub fn from_peaks(ts: &TimeSeries, peaks: PeakSet) -> Result<Self> {
        if peaks.len() < 2 {
            return Err(EcgError::InsufficientBeats { found: peaks.len() });
        }
        let rr = RRSeries::from_peaks(&peaks, ts.fs);
        let heart_rate = HeartRateSeries::from_rr(&rr)?;
        Ok(Self {
            fs: ts.fs,
            sample_count: ts.len(),
            peaks,
            rr,
            heart_rate,
        })
    }

    pub fn average_bpm(&self) -> f64 {
        self.heart_rate.average_bpm
    }
}

/// Detect beats with the default policy.
pub fn detect_beats(filtered: &TimeSeries) -> Result<BeatDetection> {
    detect_beats_with_policy(filtered, &DetectionPolicy::default())
}

/// Locate R-peaks under `policy`, then turn their spacing into RR intervals
/// and instantaneous rates.
pub fn detect_beats_with_policy(
    filtered: &TimeSeries,
    policy: &DetectionPolicy,
) -> Result<BeatDetection> {
    let peaks = detect_r_peaks(filtered, policy)?;
    log::debug!(
        "detected {} peaks (min height {}, min distance {} samples) in {} samples",
        peaks.len(),
        peaks.min_height,
        peaks.min_distance,
        filtered.len()
    );
    BeatDetection::from_peaks(filtered, peaks)
}

/// Peak search only; never fails on a low peak count.
pub fn detect_r_peaks(filtered: &TimeSeries, policy: &DetectionPolicy) -> Result<PeakSet> {
    let sampling: SamplingContext = filtered.sampling()?;
    policy.validate()?;
    let min_distance = sampling.min_peak_distance(policy);
    let indices = find_peaks(&filtered.data, policy.min_height, min_distance);

    if indices.len() < 2 {
        let max = filtered.data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max.is_finite() && max < policy.min_height {
            log::warn!(
                "signal never reaches min_height {} (max {:.4}); check the amplitude scale",
                policy.min_height,
                max
            );
        }
    }

    Ok(PeakSet {
        indices,
        min_height: policy.min_height,
        min_distance,
    })
}

/// Strict local maxima at or above `min_height`, thinned so that no two
/// survivors are closer than `min_distance` samples. Higher peaks win; equal
/// heights go to the earlier index. Output is sorted ascending.
pub fn find_peaks(data: &[f64], min_height: f64, min_distance: usize) -> Vec<usize> {
    if data.len() < 3 {
        return Vec::new();
    }
    let candidates: Vec<usize> = (1..data.len() - 1)
        .filter(|&i| data[i] > data[i - 1] && data[i] > data[i + 1] && data[i] >= min_height)
        .collect();
    if min_distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        data[candidates[b]]
            .partial_cmp(&data[candidates[a]])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut keep = vec![true; candidates.len()];
    for &i in &order {
        if !keep[i] {
            continue;
        }
        let peak = candidates[i];
        let mut j = i;
        while j > 0 && peak - candidates[j - 1] < min_distance {
            j -= 1;
            keep[j] = false;
        }
        let mut j = i + 1;
        while j < candidates.len() && candidates[j] - peak < min_distance {
            keep[j] = false;
            j += 1;
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(idx, kept)| kept.then_some(idx))
        .collect()
}
