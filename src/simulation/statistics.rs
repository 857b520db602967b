use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{ConifersError, Result};
use crate::models::Stand;

/// Running mean and variance of one per-acre metric across plots.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlotSample {
    n: usize,
    mean: f64,
    m2: f64,
}

impl PlotSample {
    /// Add one plot's value (Welford update).
    pub fn push(&mut self, value: f64) {
        self.n += 1;
        let delta = value - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance with n - 1 degrees of freedom. Zero below two plots.
    pub fn variance(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            (self.m2 / (self.n - 1) as f64).max(0.0)
        }
    }

    pub fn std_error(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        (self.variance() / self.n as f64).sqrt()
    }
}

impl FromIterator<f64> for PlotSample {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sample = PlotSample::default();
        iter.into_iter().for_each(|v| sample.push(v));
        sample
    }
}

/// Confidence interval for a per-acre plot metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub mean: f64,
    pub std_error: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence_level: f64,
    pub sample_size: usize,
    pub sampling_error_percent: f64,
}

impl ConfidenceInterval {
    /// Two-sided Student-t interval around the sample mean.
    pub fn from_sample(sample: &PlotSample, confidence: f64) -> Result<Self> {
        if sample.len() < 2 {
            return Err(ConifersError::InvalidPlotCount(format!(
                "Need at least 2 plots for a confidence interval, got {}",
                sample.len()
            )));
        }
        let t = t_quantile(sample.len() - 1, confidence)?;
        let mean = sample.mean();
        let std_error = sample.std_error();
        let half_width = t * std_error;
        let sampling_error_percent = if mean.abs() > f64::EPSILON {
            100.0 * half_width / mean
        } else {
            0.0
        };
        Ok(ConfidenceInterval {
            mean,
            std_error,
            lower: mean - half_width,
            upper: mean + half_width,
            confidence_level: confidence,
            sample_size: sample.len(),
            sampling_error_percent,
        })
    }
}

/// Upper critical value of Student's t for a two-sided interval.
fn t_quantile(df: usize, confidence: f64) -> Result<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(ConifersError::InvalidInputVal(format!(
            "confidence level must be in (0, 1), got {confidence}"
        )));
    }
    let dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| ConifersError::Simulation(e.to_string()))?;
    Ok(dist.inverse_cdf(0.5 + confidence / 2.0))
}

/// Between-plot sampling statistics for a stand. Plot aggregates must be current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingStatistics {
    pub expf: ConfidenceInterval,
    pub basal_area: ConfidenceInterval,
    pub sdi: ConfidenceInterval,
}

impl SamplingStatistics {
    /// Compute sampling statistics at a given confidence level (e.g. 0.95).
    pub fn compute(stand: &Stand, confidence: f64) -> Result<Self> {
        let mut expf = PlotSample::default();
        let mut basal_area = PlotSample::default();
        let mut sdi = PlotSample::default();
        for agg in stand.plots.iter().map(|p| &p.aggregates) {
            expf.push(agg.bh_expf);
            basal_area.push(agg.basal_area);
            sdi.push(agg.sdi);
        }
        Ok(SamplingStatistics {
            expf: ConfidenceInterval::from_sample(&expf, confidence)?,
            basal_area: ConfidenceInterval::from_sample(&basal_area, confidence)?,
            sdi: ConfidenceInterval::from_sample(&sdi, confidence)?,
        })
    }
}
