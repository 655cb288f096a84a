use actisleep_types::{
    ActisleepError, Result, SleepMetrics, SleepWakeLabel,
    validation::{validate_counts, validate_length, validate_same_length},
};
use chrono::NaiveDateTime;

use crate::helpers::stats::{percentage, run_lengths};

/// Computes [`SleepMetrics`] over a closed `[onset, offset]` window of scored epochs.
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepMetricsCalculator;

impl SleepMetricsCalculator {
    pub fn calculate_metrics(
        &self,
        labels: &[SleepWakeLabel],
        activity: &[f64],
        onset_index: usize,
        offset_index: usize,
        timestamps: &[NaiveDateTime],
        epoch_seconds: u32,
    ) -> Result<SleepMetrics> {
        validate_length(labels.len())?;
        validate_same_length("labels", labels.len(), "activity", activity.len())?;
        validate_same_length("labels", labels.len(), "timestamps", timestamps.len())?;
        if epoch_seconds == 0 {
            return Err(ActisleepError::UnsupportedEpochLength(epoch_seconds));
        }
        if offset_index >= labels.len() {
            return Err(ActisleepError::IndexOutOfRange {
                name: "offset",
                index: offset_index,
                len: labels.len(),
            });
        }
        if onset_index >= offset_index {
            return Err(ActisleepError::OnsetNotBeforeOffset {
                onset: onset_index,
                offset: offset_index,
            });
        }

        let window = &labels[onset_index..=offset_index];
        let window_activity = &activity[onset_index..=offset_index];
        validate_counts(window_activity)?;

        let minutes_per_epoch = f64::from(epoch_seconds) / 60.0;
        let to_minutes = |epochs: usize| epochs as f64 * minutes_per_epoch;

        let time_in_bed = to_minutes(window.len());
        let first_sleep = window.iter().position(|l| l.is_sleep());
        let last_sleep = window.iter().rposition(|l| l.is_sleep());

        let (latency_epochs, awakenings) = match first_sleep {
            Some(first) => (first, run_lengths(&window[first..], &SleepWakeLabel::Wake)),
            None => (window.len(), Vec::new()),
        };
        let sleep_onset_latency = to_minutes(latency_epochs);
        let wake_after_sleep_onset = to_minutes(awakenings.iter().sum());
        let total_sleep_time = time_in_bed - wake_after_sleep_onset - sleep_onset_latency;

        let average_awakening_length = if awakenings.is_empty() {
            0.0
        } else {
            wake_after_sleep_onset / awakenings.len() as f64
        };

        let sleep_bouts = run_lengths(window, &SleepWakeLabel::Sleep);
        let single_epoch_bouts = sleep_bouts.iter().filter(|&&len| len == 1).count();
        let fragmentation_index = percentage(single_epoch_bouts, sleep_bouts.len());

        let moving_epochs = window_activity.iter().filter(|&&v| v != 0.0).count();
        let movement_index = percentage(moving_epochs, window.len());

        let metrics = SleepMetrics {
            onset_index,
            offset_index,
            in_bed_time: timestamps[onset_index],
            out_bed_time: timestamps[offset_index],
            sleep_onset: timestamps[onset_index + first_sleep.unwrap_or(0)],
            sleep_offset: timestamps[onset_index + last_sleep.unwrap_or(window.len() - 1)],
            time_in_bed,
            total_sleep_time,
            sleep_onset_latency,
            wake_after_sleep_onset,
            number_of_awakenings: awakenings.len(),
            average_awakening_length,
            number_of_sleep_bouts: sleep_bouts.len(),
            sleep_efficiency: total_sleep_time / time_in_bed * 100.0,
            movement_index,
            fragmentation_index,
            sleep_fragmentation_index: movement_index + fragmentation_index,
            total_activity: window_activity.iter().sum(),
        };

        debug!(
            "metrics {onset_index}..={offset_index}: TIB {:.1} TST {:.1} SE {:.1}%",
            metrics.time_in_bed, metrics.total_sleep_time, metrics.sleep_efficiency
        );
        Ok(metrics)
    }
}
