use actisleep_types::{
    ActisleepError, ActivityChannel, ActivitySeries, NonwearPeriod, Result,
    validation::{validate_counts, validate_same_length},
};
use chrono::{NaiveDateTime, TimeDelta};
use serde_json::json;

use super::{NonwearDetector, merge_ranges};
use crate::algorithm::{Configurable, Parameters, param_usize};

/// Choi et al. (2011) nonwear detection with its validated parameters.
///
/// A nonwear run is at least 90 consecutive zero epochs; a non-zero epoch is tolerated
/// inside a run when the 61-epoch window centred on it holds at most 2 non-zero epochs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Choi;

impl Choi {
    pub const IDENTIFIER: &'static str = "choi_2011";

    pub const MIN_PERIOD: usize = 90;
    pub const SPIKE_TOLERANCE: usize = 2;
    pub const WINDOW: usize = 30;
    const MAX_MERGE_GAP: TimeDelta = TimeDelta::seconds(60);

    /// Runs the detector on exactly the values it is handed.
    pub fn detect_values(
        &self,
        values: &[f64],
        timestamps: &[NaiveDateTime],
    ) -> Result<Vec<NonwearPeriod>> {
        validate_counts(values)?;
        validate_same_length("values", values.len(), "timestamps", timestamps.len())?;

        let runs = Self::find_runs(values);
        let periods = merge_ranges(&runs, timestamps, Self::MAX_MERGE_GAP, Self::IDENTIFIER);

        debug!(
            "{}: {} runs, {} periods over {} epochs",
            Self::IDENTIFIER,
            runs.len(),
            periods.len(),
            values.len()
        );
        Ok(periods)
    }

    fn find_runs(values: &[f64]) -> Vec<(usize, usize)> {
        let n = values.len();

        // prefix[k] = non-zero epochs in values[..k]
        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(0_usize);
        for v in values {
            prefix.push(prefix[prefix.len() - 1] + usize::from(*v != 0.0));
        }
        let non_zero_around = |j: usize| {
            let lo = j.saturating_sub(Self::WINDOW);
            let hi = (j + Self::WINDOW + 1).min(n);
            prefix[hi] - prefix[lo]
        };

        let mut runs = Vec::new();
        let mut i = 0;
        while i < n {
            if values[i] != 0.0 {
                i += 1;
                continue;
            }

            let start = i;
            let mut end = i;
            for (j, &v) in values.iter().enumerate().skip(i + 1) {
                if v == 0.0 {
                    end = j;
                } else if non_zero_around(j) > Self::SPIKE_TOLERANCE {
                    break;
                }
            }

            if end - start + 1 >= Self::MIN_PERIOD {
                trace!("{}: run {start}..={end}", Self::IDENTIFIER);
                runs.push((start, end));
                i = end + 1;
            } else {
                i += 1;
            }
        }

        runs
    }
}

impl Configurable for Choi {
    fn name(&self) -> &'static str {
        "Choi (2011)"
    }

    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn get_parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("min_period".into(), json!(Self::MIN_PERIOD));
        params.insert("spike_tolerance".into(), json!(Self::SPIKE_TOLERANCE));
        params.insert("window".into(), json!(Self::WINDOW));
        params
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<()> {
        for (name, value) in params {
            let fixed = match name.as_str() {
                "min_period" => Self::MIN_PERIOD,
                "spike_tolerance" => Self::SPIKE_TOLERANCE,
                "window" => Self::WINDOW,
                "activity_column" => {
                    let column = value.as_str().unwrap_or_default();
                    column.parse::<ActivityChannel>().map_err(|_| {
                        ActisleepError::invalid_parameter(
                            Self::IDENTIFIER,
                            name,
                            format!("unknown activity channel `{column}`"),
                        )
                    })?;
                    debug!(
                        "{}: activity_column `{column}` ignored, the caller selects the channel",
                        Self::IDENTIFIER
                    );
                    continue;
                }
                _ => return Err(ActisleepError::unknown_parameter(Self::IDENTIFIER, name)),
            };

            if param_usize(Self::IDENTIFIER, name, value)? != fixed {
                return Err(ActisleepError::FixedParameter {
                    algorithm: Self::IDENTIFIER.into(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl NonwearDetector for Choi {
    fn detect(
        &self,
        series: &ActivitySeries,
        channel: ActivityChannel,
    ) -> Result<Vec<NonwearPeriod>> {
        let values = series.channel(channel)?;
        self.detect_values(&values, &series.timestamps())
    }
}
