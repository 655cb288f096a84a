use actisleep_types::{ActisleepError, Result, SleepWakeLabel};
use serde_json::json;

use super::{DEFAULT_SEARCH_EXTENSION, SearchWindow, SleepPeriodDetector, first_sleep_run, is_run};
use crate::algorithm::{Configurable, Parameters, param_bool, param_positive_usize, param_usize};

/// Onset at the first run of `onset_epochs` sleep epochs, offset at the end of the last run
/// of `offset_epochs` sleep epochs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsecutiveEpochs {
    onset_epochs: usize,
    offset_epochs: usize,
    search_extension: usize,
    require_wake_after_offset: bool,
}

impl ConsecutiveEpochs {
    pub const ONSET3S_OFFSET5S: &'static str = "consecutive_onset3s_offset5s";
    pub const ONSET5S_OFFSET10S: &'static str = "consecutive_onset5s_offset10s";
    pub const CUSTOM: &'static str = "consecutive_custom";

    pub fn new(onset_epochs: usize, offset_epochs: usize) -> Self {
        Self {
            onset_epochs: onset_epochs.max(1),
            offset_epochs: offset_epochs.max(1),
            search_extension: DEFAULT_SEARCH_EXTENSION,
            require_wake_after_offset: false,
        }
    }

    /// 3 sleep epochs for onset, 5 for offset.
    pub fn onset3s_offset5s() -> Self {
        Self::new(3, 5)
    }

    /// 5 sleep epochs for onset, 10 for offset.
    pub fn onset5s_offset10s() -> Self {
        Self::new(5, 10)
    }

    pub fn with_wake_after_offset(mut self, required: bool) -> Self {
        self.require_wake_after_offset = required;
        self
    }

    pub fn with_search_extension(mut self, epochs: usize) -> Self {
        self.search_extension = epochs;
        self
    }

    pub fn onset_epochs(&self) -> usize {
        self.onset_epochs
    }

    pub fn offset_epochs(&self) -> usize {
        self.offset_epochs
    }

    pub fn require_wake_after_offset(&self) -> bool {
        self.require_wake_after_offset
    }
}

impl Default for ConsecutiveEpochs {
    fn default() -> Self {
        Self::onset3s_offset5s()
    }
}

impl Configurable for ConsecutiveEpochs {
    fn name(&self) -> &'static str {
        match self.identifier() {
            Self::ONSET3S_OFFSET5S => "Consecutive 3S/5S",
            Self::ONSET5S_OFFSET10S => "Consecutive 5S/10S",
            _ => "Consecutive (custom)",
        }
    }

    fn identifier(&self) -> &'static str {
        match (self.onset_epochs, self.offset_epochs) {
            (3, 5) => Self::ONSET3S_OFFSET5S,
            (5, 10) => Self::ONSET5S_OFFSET10S,
            _ => Self::CUSTOM,
        }
    }

    fn get_parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("onset_epochs".into(), json!(self.onset_epochs));
        params.insert("offset_epochs".into(), json!(self.offset_epochs));
        params.insert("search_extension_epochs".into(), json!(self.search_extension));
        params.insert(
            "require_wake_after_offset".into(),
            json!(self.require_wake_after_offset),
        );
        params
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<()> {
        let id = self.identifier();
        let mut next = *self;
        for (name, value) in params {
            match name.as_str() {
                "onset_epochs" => next.onset_epochs = param_positive_usize(id, name, value)?,
                "offset_epochs" => next.offset_epochs = param_positive_usize(id, name, value)?,
                "search_extension_epochs" => next.search_extension = param_usize(id, name, value)?,
                "require_wake_after_offset" => {
                    next.require_wake_after_offset = param_bool(id, name, value)?
                }
                _ => return Err(ActisleepError::unknown_parameter(id, name)),
            }
        }
        *self = next;
        Ok(())
    }
}

impl SleepPeriodDetector for ConsecutiveEpochs {
    fn search_extension(&self) -> usize {
        self.search_extension
    }

    fn find_onset(&self, labels: &[SleepWakeLabel], window: SearchWindow) -> Option<usize> {
        first_sleep_run(labels, window, self.onset_epochs)
    }

    fn find_offset(
        &self,
        labels: &[SleepWakeLabel],
        onset: usize,
        window: SearchWindow,
    ) -> Option<usize> {
        let len = self.offset_epochs;
        let last_start = (window.end + 1).checked_sub(len)?;
        if last_start < onset {
            return None;
        }

        (onset..=last_start)
            .rev()
            .filter(|&j| is_run(labels, j, len, SleepWakeLabel::Sleep))
            .find(|&j| {
                !self.require_wake_after_offset
                    || labels.get(j + len) == Some(&SleepWakeLabel::Wake)
            })
            .map(|j| j + len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actisleep_types::labels_from_str;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn timestamps(n: usize) -> Vec<NaiveDateTime> {
        let base = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        (0..n).map(|i| base + TimeDelta::minutes(i as i64)).collect()
    }

    fn apply(detector: &ConsecutiveEpochs, labels: &str) -> (Option<usize>, Option<usize>) {
        let labels = labels_from_str(labels);
        let ts = timestamps(labels.len());
        detector
            .apply_rules(&labels, ts[0], ts[ts.len() - 1], &ts)
            .unwrap()
    }

    #[test]
    fn earliest_onset_and_latest_offset() {
        //                               0         1         2
        //                               0123456789012345678901234
        let labels = "WWSSWSSSSWWSSSSSSWWSSSSSW";
        assert_eq!(
            apply(&ConsecutiveEpochs::onset3s_offset5s(), labels),
            (Some(5), Some(23))
        );
        assert_eq!(
            apply(&ConsecutiveEpochs::onset5s_offset10s(), labels),
            (Some(11), None)
        );
    }

    #[test]
    fn no_sleep_finds_nothing() {
        assert_eq!(
            apply(&ConsecutiveEpochs::default(), "WWWWWWWWWWWW"),
            (None, None)
        );
    }

    #[test]
    fn missing_offset_keeps_onset() {
        assert_eq!(
            apply(&ConsecutiveEpochs::default(), "WWSSSSWWWW"),
            (Some(2), None)
        );
    }

    #[test]
    fn wake_after_offset_is_optional() {
        let labels = "WSSSSSSWWSSSSS";
        let plain = ConsecutiveEpochs::default();
        assert_eq!(apply(&plain, labels), (Some(1), Some(13)));

        // the series end does not count as wake
        let strict = plain.with_wake_after_offset(true);
        assert_eq!(apply(&strict, labels), (Some(1), Some(6)));
    }

    #[test]
    fn search_is_limited_to_the_marker_window() {
        let labels = labels_from_str(&format!("SSSSS{}SSSSS", "W".repeat(30)));
        let ts = timestamps(labels.len());
        let detector = ConsecutiveEpochs::default().with_search_extension(2);

        assert_eq!(
            detector.apply_rules(&labels, ts[10], ts[25], &ts).unwrap(),
            (None, None)
        );
        assert_eq!(
            detector.apply_rules(&labels, ts[3], ts[25], &ts).unwrap(),
            (Some(1), None)
        );
    }

    #[test]
    fn markers_outside_the_recording() {
        let labels = labels_from_str("SSSSSSSSSS");
        let ts = timestamps(labels.len());
        let before = ts[0] - TimeDelta::hours(1);
        let detector = ConsecutiveEpochs::default();

        assert_eq!(
            detector.apply_rules(&labels, before, ts[9], &ts).unwrap(),
            (None, None)
        );
        assert_eq!(
            detector.apply_rules(&labels, ts[9], ts[0], &ts).unwrap(),
            (None, None)
        );
    }

    #[test]
    fn rejects_invalid_input() {
        let detector = ConsecutiveEpochs::default();
        let ts = timestamps(3);
        assert_eq!(
            detector.apply_rules(&[], ts[0], ts[2], &[]),
            Err(ActisleepError::EmptyInput)
        );
        assert!(matches!(
            detector.apply_rules(&labels_from_str("SS"), ts[0], ts[2], &ts),
            Err(ActisleepError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn identifier_follows_parameters() {
        let mut detector = ConsecutiveEpochs::default();
        assert_eq!(detector.identifier(), ConsecutiveEpochs::ONSET3S_OFFSET5S);

        let mut params = Parameters::new();
        params.insert("onset_epochs".into(), json!(5));
        params.insert("offset_epochs".into(), json!(10));
        detector.set_parameters(&params).unwrap();
        assert_eq!(detector.identifier(), ConsecutiveEpochs::ONSET5S_OFFSET10S);

        params.insert("onset_epochs".into(), json!(4));
        detector.set_parameters(&params).unwrap();
        assert_eq!(detector.identifier(), ConsecutiveEpochs::CUSTOM);
        assert_eq!(detector.get_parameters()["onset_epochs"], json!(4));
    }

    #[test]
    fn parameters_apply_atomically() {
        let mut detector = ConsecutiveEpochs::default();
        let mut params = Parameters::new();
        params.insert("onset_epochs".into(), json!(7));
        params.insert("offset_epochs".into(), json!(0));
        assert!(matches!(
            detector.set_parameters(&params),
            Err(ActisleepError::InvalidParameter { .. })
        ));
        assert_eq!(detector, ConsecutiveEpochs::default());

        let mut params = Parameters::new();
        params.insert("window".into(), json!(3));
        assert!(matches!(
            detector.set_parameters(&params),
            Err(ActisleepError::UnknownParameter { .. })
        ));

        let mut params = Parameters::new();
        params.insert("require_wake_after_offset".into(), json!(true));
        params.insert("search_extension_epochs".into(), json!(0));
        detector.set_parameters(&params).unwrap();
        assert!(detector.require_wake_after_offset());
        assert_eq!(detector.search_extension(), 0);
    }

    #[test]
    fn oversized_parameters_stay_inside_the_recording() {
        let mut detector = ConsecutiveEpochs::default();
        let mut params = Parameters::new();
        params.insert("search_extension_epochs".into(), json!(u64::MAX));
        detector.set_parameters(&params).unwrap();
        assert_eq!(apply(&detector, "WWSSSSSSW"), (Some(2), Some(7)));

        let mut detector = ConsecutiveEpochs::new(usize::MAX, usize::MAX);
        detector.set_parameters(&params).unwrap();
        assert_eq!(apply(&detector, "WWSSSSSSW"), (None, None));
    }
}
