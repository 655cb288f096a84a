use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sleep quality summary for one scored period. Durations are in minutes, indices in percent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SleepMetrics {
    pub onset_index: usize,
    pub offset_index: usize,
    pub in_bed_time: NaiveDateTime,
    pub out_bed_time: NaiveDateTime,
    pub sleep_onset: NaiveDateTime,
    pub sleep_offset: NaiveDateTime,

    pub time_in_bed: f64,
    pub total_sleep_time: f64,
    pub sleep_onset_latency: f64,
    pub wake_after_sleep_onset: f64,

    pub number_of_awakenings: usize,
    pub average_awakening_length: f64,
    pub number_of_sleep_bouts: usize,

    pub sleep_efficiency: f64,
    pub movement_index: f64,
    pub fragmentation_index: f64,
    pub sleep_fragmentation_index: f64,

    pub total_activity: f64,
}
