use actisleep_types::{ActivityChannel, ActivitySeries, NonwearPeriod, Result, nonwear_mask};
use chrono::{NaiveDateTime, TimeDelta};

use crate::algorithm::Configurable;

mod choi;
pub use choi::Choi;

mod van_hees;
pub use van_hees::VanHees;

/// Detects periods where the device was not worn.
pub trait NonwearDetector: Configurable {
    /// Periods over `series`, reading `channel` where the detector uses a single channel.
    /// The caller selects the channel; detectors never substitute their own.
    fn detect(
        &self,
        series: &ActivitySeries,
        channel: ActivityChannel,
    ) -> Result<Vec<NonwearPeriod>>;

    /// `{0,1}` per epoch, 1 marking nonwear.
    fn detect_mask(&self, series: &ActivitySeries, channel: ActivityChannel) -> Result<Vec<u8>> {
        let periods = self.detect(series, channel)?;
        Ok(nonwear_mask(&periods, series.len()))
    }
}

/// Merges sorted closed ranges that overlap, touch, or sit within `max_gap` of each other.
pub(crate) fn merge_ranges(
    ranges: &[(usize, usize)],
    timestamps: &[NaiveDateTime],
    max_gap: TimeDelta,
    source: &str,
) -> Vec<NonwearPeriod> {
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());

    for &(start, end) in ranges {
        if let Some(last) = merged.last_mut() {
            let touches = start <= last.1 + 1;
            let close = timestamps[start] - timestamps[last.1] <= max_gap;
            if touches || close {
                trace!("{source}: merging {:?} with {:?}", *last, (start, end));
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
        .into_iter()
        .map(|(start, end)| NonwearPeriod::new(start, end, source))
        .collect()
}
