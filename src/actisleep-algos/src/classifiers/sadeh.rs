use actisleep_types::{ActisleepError, Result, SleepWakeLabel};
use serde_json::json;

use super::{SleepScoringAlgorithm, zero_padded};
use crate::{
    algorithm::{Configurable, Parameters, param_f64},
    helpers::stats::sample_std_dev,
};

/// Published threshold variants of the Sadeh (1994) classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SadehPreset {
    /// Threshold of the original paper.
    Original,
    /// Threshold reproducing ActiLife's output.
    ActiLife,
}

impl SadehPreset {
    pub const fn threshold(self) -> f64 {
        match self {
            Self::Original => 0.0,
            Self::ActiLife => -4.0,
        }
    }

    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Original => "sadeh_1994_original",
            Self::ActiLife => "sadeh_1994_actilife",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Original => "Sadeh (1994) Original",
            Self::ActiLife => "Sadeh (1994) ActiLife",
        }
    }

    fn from_threshold(threshold: f64) -> Option<Self> {
        [Self::Original, Self::ActiLife]
            .into_iter()
            .find(|p| p.threshold() == threshold)
    }
}

/// Sadeh, Sharkey & Carskadon (1994) wrist actigraphy classifier.
///
/// `PS = 7.601 - 0.065*AVG - 1.08*NATS - 0.056*SD - 0.703*LG`, sleep when `PS > threshold`.
#[derive(Clone, Debug, PartialEq)]
pub struct Sadeh {
    threshold: f64,
}

impl Sadeh {
    const CAP: f64 = 300.0;
    /// Epochs either side of the current one in the AVG/NATS window.
    const HALF_WINDOW: isize = 5;
    const WINDOW_LEN: f64 = 11.0;
    /// Forward-only window for SD, starting at the current epoch.
    const SD_WINDOW: usize = 6;
    const NATS_MIN: f64 = 50.0;
    const NATS_MAX: f64 = 100.0;

    const INTERCEPT: f64 = 7.601;
    const AVG_COEF: f64 = 0.065;
    const NATS_COEF: f64 = 1.08;
    const SD_COEF: f64 = 0.056;
    const LG_COEF: f64 = 0.703;

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_preset(preset: SadehPreset) -> Self {
        Self::new(preset.threshold())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Raw probability-of-sleep score for every epoch.
    pub fn sleep_scores(counts: &[f64]) -> Vec<f64> {
        let capped = counts.iter().map(|c| c.min(Self::CAP)).collect::<Vec<_>>();
        let mut forward = [0_f64; Self::SD_WINDOW];

        (0..counts.len())
            .map(|i| {
                let center = i as isize;
                let window = (center - Self::HALF_WINDOW)..=(center + Self::HALF_WINDOW);

                let avg = window
                    .clone()
                    .map(|j| zero_padded(&capped, j))
                    .sum::<f64>()
                    / Self::WINDOW_LEN;

                let nats = window
                    .map(|j| zero_padded(counts, j))
                    .filter(|v| (Self::NATS_MIN..Self::NATS_MAX).contains(v))
                    .count() as f64;

                for (k, slot) in forward.iter_mut().enumerate() {
                    *slot = zero_padded(&capped, center + k as isize);
                }
                let sd = sample_std_dev(&forward);

                let lg = (capped[i] + 1.0).ln();

                Self::INTERCEPT - Self::AVG_COEF * avg - Self::NATS_COEF * nats
                    - Self::SD_COEF * sd
                    - Self::LG_COEF * lg
            })
            .collect()
    }
}

impl Default for Sadeh {
    fn default() -> Self {
        Self::from_preset(SadehPreset::ActiLife)
    }
}

impl Configurable for Sadeh {
    fn name(&self) -> &'static str {
        SadehPreset::from_threshold(self.threshold)
            .map(SadehPreset::display_name)
            .unwrap_or("Sadeh (1994) Custom")
    }

    fn identifier(&self) -> &'static str {
        SadehPreset::from_threshold(self.threshold)
            .map(SadehPreset::identifier)
            .unwrap_or("sadeh_1994_custom")
    }

    fn get_parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("threshold".into(), json!(self.threshold));
        params
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<()> {
        let mut next = self.clone();
        for (name, value) in params {
            match name.as_str() {
                "threshold" => next.threshold = param_f64(self.identifier(), name, value)?,
                _ => return Err(ActisleepError::unknown_parameter(self.identifier(), name)),
            }
        }
        *self = next;
        Ok(())
    }
}

impl SleepScoringAlgorithm for Sadeh {
    fn score_minutes(&self, counts: &[f64]) -> Vec<SleepWakeLabel> {
        Self::sleep_scores(counts)
            .into_iter()
            .map(|ps| SleepWakeLabel::from_sleep(ps > self.threshold))
            .collect()
    }
}
