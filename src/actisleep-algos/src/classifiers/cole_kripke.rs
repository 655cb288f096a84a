use actisleep_types::{ActisleepError, Result, SleepWakeLabel};

use super::{SleepScoringAlgorithm, zero_padded};
use crate::algorithm::{Configurable, Parameters};

/// Cole-Kripke (1992) classifier as applied to ActiGraph counts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColeKripke;

impl ColeKripke {
    pub const IDENTIFIER: &'static str = "cole_kripke_1992";

    const SCALE: f64 = 100.0;
    const CAP: f64 = 300.0;
    /// Weights from lag 4 through lead 2.
    const WEIGHTS: [f64; 7] = [106.0, 54.0, 58.0, 76.0, 230.0, 74.0, 67.0];
    const LAG: isize = 4;
    const SCALE_FACTOR: f64 = 0.001;
    const SLEEP_BELOW: f64 = 1.0;

    /// Sleep index for every epoch; sleep when below 1.0.
    pub fn sleep_indices(counts: &[f64]) -> Vec<f64> {
        let scaled = counts
            .iter()
            .map(|c| (c / Self::SCALE).min(Self::CAP))
            .collect::<Vec<_>>();

        (0..scaled.len() as isize)
            .map(|i| {
                let weighted = Self::WEIGHTS
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * zero_padded(&scaled, i - Self::LAG + k as isize))
                    .sum::<f64>();
                Self::SCALE_FACTOR * weighted
            })
            .collect()
    }
}

impl Configurable for ColeKripke {
    fn name(&self) -> &'static str {
        "Cole-Kripke (1992)"
    }

    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn get_parameters(&self) -> Parameters {
        Parameters::new()
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<()> {
        match params.keys().next() {
            Some(name) => Err(ActisleepError::unknown_parameter(Self::IDENTIFIER, name)),
            None => Ok(()),
        }
    }
}

impl SleepScoringAlgorithm for ColeKripke {
    fn score_minutes(&self, counts: &[f64]) -> Vec<SleepWakeLabel> {
        Self::sleep_indices(counts)
            .into_iter()
            .map(|si| SleepWakeLabel::from_sleep(si < Self::SLEEP_BELOW))
            .collect()
    }
}
