use actisleep_types::{
    ActisleepError, ActivityChannel, ActivitySeries, NonwearPeriod, Result,
    validation::validate_same_length,
};
use chrono::{NaiveDateTime, TimeDelta};
use serde_json::json;

use super::{NonwearDetector, merge_ranges};
use crate::{
    algorithm::{Configurable, Parameters, param_positive_f64, param_positive_usize},
    helpers::stats::{range, sample_std_dev},
};

/// Raw-acceleration nonwear detection in the style of van Hees et al. (2013).
///
/// The stream is cut into blocks of `medium_epoch_sec`; a block is nonwear when, on every
/// axis, both the standard deviation and the range stay below their criteria.
#[derive(Clone, Debug, PartialEq)]
pub struct VanHees {
    /// g
    pub sd_criterion: f64,
    /// g
    pub range_criterion: f64,
    pub medium_epoch_sec: usize,
    /// Hz
    pub sample_freq: f64,
}

impl Default for VanHees {
    fn default() -> Self {
        Self {
            sd_criterion: 0.013,
            range_criterion: 0.050,
            medium_epoch_sec: 900,
            sample_freq: 30.0,
        }
    }
}

impl VanHees {
    pub const IDENTIFIER: &'static str = "van_hees_2013";

    /// Fewest samples a block needs for a sample standard deviation.
    const MIN_BLOCK: usize = 2;

    /// Samples per block at `sample_freq`.
    pub fn block_len(&self) -> usize {
        ((self.medium_epoch_sec as f64 * self.sample_freq).round() as usize).max(Self::MIN_BLOCK)
    }

    /// Production path: tri-axial samples in g, one timestamp per sample.
    pub fn detect_raw(
        &self,
        samples: &[[f64; 3]],
        timestamps: &[NaiveDateTime],
    ) -> Result<Vec<NonwearPeriod>> {
        self.detect_blocks(samples, timestamps, self.block_len())
    }

    fn detect_blocks(
        &self,
        samples: &[[f64; 3]],
        timestamps: &[NaiveDateTime],
        block_len: usize,
    ) -> Result<Vec<NonwearPeriod>> {
        if samples.is_empty() {
            return Err(ActisleepError::EmptyInput);
        }
        validate_same_length("samples", samples.len(), "timestamps", timestamps.len())?;
        Self::check_finite(samples)?;

        let flagged = samples
            .chunks(block_len)
            .enumerate()
            .filter(|(_, block)| self.is_nonwear_block(block))
            .map(|(b, block)| {
                let start = b * block_len;
                (start, start + block.len() - 1)
            })
            .collect::<Vec<_>>();

        // Only contiguous blocks join; there is no time-gap tolerance.
        let periods = merge_ranges(&flagged, timestamps, TimeDelta::zero(), Self::IDENTIFIER);
        debug!(
            "{}: {} of {} blocks flagged, {} periods",
            Self::IDENTIFIER,
            flagged.len(),
            samples.len().div_ceil(block_len),
            periods.len()
        );
        Ok(periods)
    }

    fn is_nonwear_block(&self, block: &[[f64; 3]]) -> bool {
        if block.len() < Self::MIN_BLOCK {
            return false;
        }

        (0..3).all(|axis| {
            let values = block.iter().map(|s| s[axis]).collect::<Vec<_>>();
            sample_std_dev(&values) < self.sd_criterion && range(&values) < self.range_criterion
        })
    }

    fn check_finite(samples: &[[f64; 3]]) -> Result<()> {
        let bad = samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.iter().any(|v| !v.is_finite()))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if bad.is_empty() {
            return Ok(());
        }
        Err(ActisleepError::InvalidActivityValues {
            reason: "non-finite",
            count: bad.len(),
            indices: bad
                .into_iter()
                .take(actisleep_types::MAX_REPORTED_INDICES)
                .collect(),
        })
    }

    /// Tri-axial view of a series: stored axes when present, otherwise `channel` on all three.
    fn synthesize(series: &ActivitySeries, channel: ActivityChannel) -> Result<Vec<[f64; 3]>> {
        if series.has_triaxial() {
            return Ok(series
                .epochs()
                .iter()
                .map(|e| [e.axis_x.unwrap_or_default(), e.axis_y, e.axis_z.unwrap_or_default()])
                .collect());
        }

        Ok(series
            .channel(channel)?
            .into_iter()
            .map(|v| [v, v, v])
            .collect())
    }
}

impl Configurable for VanHees {
    fn name(&self) -> &'static str {
        "van Hees (2013)"
    }

    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn get_parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("sd_criterion".into(), json!(self.sd_criterion));
        params.insert("range_criterion".into(), json!(self.range_criterion));
        params.insert("medium_epoch_sec".into(), json!(self.medium_epoch_sec));
        params.insert("sample_freq".into(), json!(self.sample_freq));
        params
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<()> {
        let mut next = self.clone();
        for (name, value) in params {
            match name.as_str() {
                "sd_criterion" => {
                    next.sd_criterion = param_positive_f64(Self::IDENTIFIER, name, value)?
                }
                "range_criterion" => {
                    next.range_criterion = param_positive_f64(Self::IDENTIFIER, name, value)?
                }
                "medium_epoch_sec" => {
                    next.medium_epoch_sec = param_positive_usize(Self::IDENTIFIER, name, value)?
                }
                "sample_freq" => {
                    next.sample_freq = param_positive_f64(Self::IDENTIFIER, name, value)?
                }
                _ => return Err(ActisleepError::unknown_parameter(Self::IDENTIFIER, name)),
            }
        }
        *self = next;
        Ok(())
    }
}

impl NonwearDetector for VanHees {
    /// Testing path over epoch data; blocks span `medium_epoch_sec` worth of epochs.
    fn detect(
        &self,
        series: &ActivitySeries,
        channel: ActivityChannel,
    ) -> Result<Vec<NonwearPeriod>> {
        let samples = Self::synthesize(series, channel)?;
        let block_len =
            (self.medium_epoch_sec / series.epoch_seconds() as usize).max(Self::MIN_BLOCK);
        self.detect_blocks(&samples, &series.timestamps(), block_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actisleep_types::{Epoch, nonwear_mask};
    use chrono::NaiveDate;
    use rand::Rng;

    fn timestamps(n: usize, step_ms: i64) -> Vec<NaiveDateTime> {
        let base = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| base + TimeDelta::milliseconds(step_ms * i as i64))
            .collect()
    }

    fn small_blocks() -> VanHees {
        // 10 s blocks at 10 Hz = 100 samples
        VanHees {
            medium_epoch_sec: 10,
            sample_freq: 10.0,
            ..VanHees::default()
        }
    }

    fn still(n: usize) -> Vec<[f64; 3]> {
        (0..n)
            .map(|i| {
                let wobble = if i % 2 == 0 { 0.001 } else { -0.001 };
                [wobble, 1.0, 0.0]
            })
            .collect()
    }

    fn moving(n: usize) -> Vec<[f64; 3]> {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| {
                [
                    rng.random_range(-1.0..1.0),
                    rng.random_range(0.0..2.0),
                    rng.random_range(-1.0..1.0),
                ]
            })
            .collect()
    }

    #[test]
    fn block_len_from_parameters() {
        assert_eq!(VanHees::default().block_len(), 27_000);
        assert_eq!(small_blocks().block_len(), 100);
    }

    #[test]
    fn still_blocks_flagged() {
        let detector = small_blocks();
        let samples = [moving(100), still(200), moving(100)].concat();
        let periods = detector
            .detect_raw(&samples, &timestamps(samples.len(), 100))
            .unwrap();
        assert_eq!(periods, vec![NonwearPeriod::new(100, 299, VanHees::IDENTIFIER)]);
    }

    #[test]
    fn one_moving_axis_keeps_wear() {
        let detector = small_blocks();
        let mut samples = still(100);
        for (i, s) in samples.iter_mut().enumerate() {
            s[2] = if i % 2 == 0 { 0.2 } else { -0.2 };
        }
        assert!(
            detector
                .detect_raw(&samples, &timestamps(100, 100))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn range_criterion_alone_can_keep_wear() {
        // One outlier lifts the range past 0.05 g while the SD stays tiny
        let detector = VanHees {
            sd_criterion: 0.013,
            ..small_blocks()
        };
        let mut samples = vec![[0.0, 1.0, 0.0]; 100];
        samples[50][0] = 0.06;
        assert!(
            detector
                .detect_raw(&samples, &timestamps(100, 100))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn partial_tail_block_is_evaluated() {
        let detector = small_blocks();
        let samples = [moving(100), still(10)].concat();
        let periods = detector
            .detect_raw(&samples, &timestamps(110, 100))
            .unwrap();
        assert_eq!(periods, vec![NonwearPeriod::new(100, 109, VanHees::IDENTIFIER)]);

        let samples = [moving(100), still(1)].concat();
        assert!(
            detector
                .detect_raw(&samples, &timestamps(101, 100))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn series_path_replicates_a_single_channel() {
        let base = timestamps(1, 0)[0];
        let counts = [vec![500.0, 0.0].repeat(15), vec![0.0; 60]].concat();
        let series = ActivitySeries::from_counts(base, 60, &counts).unwrap();
        let detector = VanHees {
            medium_epoch_sec: 15 * 60,
            ..VanHees::default()
        };

        let mask = detector.detect_mask(&series, ActivityChannel::AxisY).unwrap();
        assert_eq!(mask.len(), counts.len());
        assert!(mask[..30].iter().all(|&m| m == 0));
        assert!(mask[30..].iter().all(|&m| m == 1));
    }

    #[test]
    fn series_path_prefers_stored_axes() {
        let base = timestamps(1, 0)[0];
        let epochs = (0..30)
            .map(|i| Epoch::new(base + TimeDelta::minutes(i), 0.0).with_axes(0.0, (i % 2) as f64))
            .collect();
        let series = ActivitySeries::new(epochs, 60).unwrap();
        let detector = VanHees {
            medium_epoch_sec: 15 * 60,
            ..VanHees::default()
        };
        // Z alternates 0/1, so no block is still even though Y is flat
        let periods = detector.detect(&series, ActivityChannel::AxisY).unwrap();
        assert!(periods.is_empty());
        assert_eq!(nonwear_mask(&periods, 30), vec![0; 30]);
    }

    #[test]
    fn validation() {
        let detector = small_blocks();
        assert_eq!(detector.detect_raw(&[], &[]), Err(ActisleepError::EmptyInput));
        assert!(matches!(
            detector.detect_raw(&still(5), &timestamps(4, 100)),
            Err(ActisleepError::LengthMismatch { .. })
        ));
        let mut samples = still(5);
        samples[3][1] = f64::NAN;
        assert!(matches!(
            detector.detect_raw(&samples, &timestamps(5, 100)),
            Err(ActisleepError::InvalidActivityValues { .. })
        ));
    }

    #[test]
    fn parameters_round_trip_and_validate() {
        let mut detector = VanHees::default();
        let mut params = Parameters::new();
        params.insert("sd_criterion".into(), json!(0.02));
        params.insert("medium_epoch_sec".into(), json!(60));
        detector.set_parameters(&params).unwrap();
        assert_eq!(detector.sd_criterion, 0.02);
        assert_eq!(detector.medium_epoch_sec, 60);
        assert_eq!(detector.get_parameters()["sample_freq"], json!(30.0));

        let mut bad = Parameters::new();
        bad.insert("sample_freq".into(), json!(-1.0));
        assert!(matches!(
            detector.set_parameters(&bad),
            Err(ActisleepError::InvalidParameter { .. })
        ));
        let mut unknown = Parameters::new();
        unknown.insert("axes".into(), json!(3));
        assert!(matches!(
            detector.set_parameters(&unknown),
            Err(ActisleepError::UnknownParameter { .. })
        ));
    }
}
