use actisleep_types::{
    ActisleepError, ActivityChannel, ActivitySeries, Result, SleepWakeLabel,
    validation::validate_counts,
};
use chrono::Timelike as _;

use crate::algorithm::Configurable;

mod cole_kripke;
pub use cole_kripke::ColeKripke;

mod sadeh;
pub use sadeh::{Sadeh, SadehPreset};

/// Epoch length the published classifiers were validated on.
pub const SCORING_EPOCH_SECONDS: u32 = 60;

/// Epoch-by-epoch sleep/wake classifier over a complete recording.
pub trait SleepScoringAlgorithm: Configurable {
    /// Scores already validated 60 second counts.
    fn score_minutes(&self, counts: &[f64]) -> Vec<SleepWakeLabel>;

    /// Validates a count column, brings it to 60 second epochs, scores it, and maps the labels
    /// back onto the input epochs. Sub-minute epochs are grouped from the first one.
    fn score_counts(&self, counts: &[f64], epoch_seconds: u32) -> Result<Vec<SleepWakeLabel>> {
        score_in_minutes(self, counts, epoch_seconds, 0)
    }

    /// Scores `channel` of `series`, grouping sub-minute epochs by clock minute.
    fn score_channel(
        &self,
        series: &ActivitySeries,
        channel: ActivityChannel,
    ) -> Result<Vec<SleepWakeLabel>> {
        let counts = series.channel(channel)?;
        score_in_minutes(
            self,
            &counts,
            series.epoch_seconds(),
            series.start().second(),
        )
    }

    /// Scores the vertical axis.
    fn score(&self, series: &ActivitySeries) -> Result<Vec<SleepWakeLabel>> {
        self.score_channel(series, ActivityChannel::AxisY)
    }
}

/// `first_second` is the second-of-minute of the first epoch.
fn score_in_minutes<S: SleepScoringAlgorithm + ?Sized>(
    scorer: &S,
    counts: &[f64],
    epoch_seconds: u32,
    first_second: u32,
) -> Result<Vec<SleepWakeLabel>> {
    validate_counts(counts)?;
    let factor = collapse_factor(epoch_seconds)?;

    let labels = if factor == 1 {
        scorer.score_minutes(counts)
    } else {
        let lead = leading_epochs(first_second, epoch_seconds, factor);
        let minutes = collapse(counts, factor, lead);
        expand(&scorer.score_minutes(&minutes), factor, lead, counts.len())
    };

    debug!(
        "{}: scored {} epochs, {} sleep",
        scorer.identifier(),
        labels.len(),
        labels.iter().filter(|l| l.is_sleep()).count()
    );
    Ok(labels)
}

/// Number of input epochs per scoring minute.
fn collapse_factor(epoch_seconds: u32) -> Result<usize> {
    if epoch_seconds == 0
        || epoch_seconds > SCORING_EPOCH_SECONDS
        || SCORING_EPOCH_SECONDS % epoch_seconds != 0
    {
        return Err(ActisleepError::UnsupportedEpochLength(epoch_seconds));
    }
    Ok((SCORING_EPOCH_SECONDS / epoch_seconds) as usize)
}

/// Epochs before the first whole minute, 0 when the series starts on one.
fn leading_epochs(first_second: u32, epoch_seconds: u32, factor: usize) -> usize {
    let to_minute = SCORING_EPOCH_SECONDS.saturating_sub(first_second % SCORING_EPOCH_SECONDS);
    to_minute.div_ceil(epoch_seconds) as usize % factor
}

/// Sums `lead` epochs into a partial first minute, then every `factor` epochs.
fn collapse(counts: &[f64], factor: usize, lead: usize) -> Vec<f64> {
    let (head, rest) = counts.split_at(lead.min(counts.len()));
    let partial = (!head.is_empty()).then(|| head.iter().sum());
    partial
        .into_iter()
        .chain(rest.chunks(factor).map(|chunk| chunk.iter().sum()))
        .collect()
}

fn expand(
    labels: &[SleepWakeLabel],
    factor: usize,
    lead: usize,
    len: usize,
) -> Vec<SleepWakeLabel> {
    labels
        .iter()
        .enumerate()
        .flat_map(|(i, &label)| {
            let n = if i == 0 && lead > 0 { lead } else { factor };
            std::iter::repeat_n(label, n)
        })
        .take(len)
        .collect()
}

/// Value at `index` with zeros outside the series.
pub(crate) fn zero_padded(values: &[f64], index: isize) -> f64 {
    usize::try_from(index)
        .ok()
        .and_then(|i| values.get(i))
        .copied()
        .unwrap_or_default()
}
