use actisleep_types::{
    Result, SleepWakeLabel,
    validation::{validate_length, validate_same_length},
};
use chrono::NaiveDateTime;

use crate::algorithm::Configurable;

mod consecutive;
pub use consecutive::ConsecutiveEpochs;

mod tudor_locke;
pub use tudor_locke::TudorLocke;

/// Epochs the marker-bounded range is widened by on each side unless configured otherwise.
pub const DEFAULT_SEARCH_EXTENSION: usize = 5;

/// Closed index range searched for boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: usize,
    pub end: usize,
}

impl SearchWindow {
    /// Window between the epochs nearest to both markers, widened by `extension` and clipped
    /// to the series. `None` when a marker lies outside the recording or they are reversed.
    pub fn from_markers(
        timestamps: &[NaiveDateTime],
        onset_marker: NaiveDateTime,
        offset_marker: NaiveDateTime,
        extension: usize,
    ) -> Option<Self> {
        if onset_marker > offset_marker {
            warn!("onset marker {onset_marker} is after offset marker {offset_marker}");
            return None;
        }

        let onset = nearest_index(timestamps, onset_marker)?;
        let offset = nearest_index(timestamps, offset_marker)?;
        Some(Self {
            start: onset.saturating_sub(extension),
            end: offset.saturating_add(extension).min(timestamps.len() - 1),
        })
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// Index of the timestamp nearest `marker`, earlier epoch on ties.
fn nearest_index(timestamps: &[NaiveDateTime], marker: NaiveDateTime) -> Option<usize> {
    let (first, last) = (timestamps.first()?, timestamps.last()?);
    if marker < *first || marker > *last {
        warn!("marker {marker} is outside the recording ({first} - {last})");
        return None;
    }

    let after = timestamps.partition_point(|t| *t < marker);
    if after == 0 {
        return Some(0);
    }
    let before = after - 1;
    if after == timestamps.len() || marker - timestamps[before] <= timestamps[after] - marker {
        Some(before)
    } else {
        Some(after)
    }
}

/// Progress of a boundary search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SearchState {
    SearchOnset,
    SearchOffset { onset: usize },
    Found { onset: usize, offset: usize },
    NotFound { onset: Option<usize> },
}

/// Locates sleep onset and offset around two approximate markers.
pub trait SleepPeriodDetector: Configurable {
    fn search_extension(&self) -> usize;

    /// First onset candidate inside `window`.
    fn find_onset(&self, labels: &[SleepWakeLabel], window: SearchWindow) -> Option<usize>;

    /// Offset after `onset` inside `window`.
    fn find_offset(
        &self,
        labels: &[SleepWakeLabel],
        onset: usize,
        window: SearchWindow,
    ) -> Option<usize>;

    /// `(onset, offset)` indices; either may be absent, a missing offset keeps the onset.
    fn apply_rules(
        &self,
        labels: &[SleepWakeLabel],
        onset_marker: NaiveDateTime,
        offset_marker: NaiveDateTime,
        timestamps: &[NaiveDateTime],
    ) -> Result<(Option<usize>, Option<usize>)> {
        validate_length(labels.len())?;
        validate_same_length("labels", labels.len(), "timestamps", timestamps.len())?;

        let Some(window) = SearchWindow::from_markers(
            timestamps,
            onset_marker,
            offset_marker,
            self.search_extension(),
        ) else {
            return Ok((None, None));
        };

        let mut state = SearchState::SearchOnset;
        loop {
            trace!("{}: {state:?}", self.identifier());
            state = match state {
                SearchState::SearchOnset => match self.find_onset(labels, window) {
                    Some(onset) => SearchState::SearchOffset { onset },
                    None => SearchState::NotFound { onset: None },
                },
                SearchState::SearchOffset { onset } => {
                    match self.find_offset(labels, onset, window) {
                        Some(offset) if offset > onset => SearchState::Found { onset, offset },
                        _ => SearchState::NotFound { onset: Some(onset) },
                    }
                }
                SearchState::Found { onset, offset } => {
                    debug!("{}: period {onset}..={offset}", self.identifier());
                    return Ok((Some(onset), Some(offset)));
                }
                SearchState::NotFound { onset } => {
                    debug!("{}: no complete period, onset {onset:?}", self.identifier());
                    return Ok((onset, None));
                }
            };
        }
    }
}

/// Whether `labels[start..start + len]` exists and is entirely `label`.
pub(crate) fn is_run(
    labels: &[SleepWakeLabel],
    start: usize,
    len: usize,
    label: SleepWakeLabel,
) -> bool {
    start
        .checked_add(len)
        .and_then(|end| labels.get(start..end))
        .is_some_and(|run| run.iter().all(|l| *l == label))
}

/// Earliest `i` in `window` whose run of `len` sleep epochs fits inside the window.
pub(crate) fn first_sleep_run(
    labels: &[SleepWakeLabel],
    window: SearchWindow,
    len: usize,
) -> Option<usize> {
    let last_start = (window.end + 1).checked_sub(len)?;
    (window.start..=last_start).find(|&i| is_run(labels, i, len, SleepWakeLabel::Sleep))
}
