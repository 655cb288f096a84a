use actisleep_types::{ActisleepError, Result, SleepWakeLabel};
use serde_json::json;

use super::{DEFAULT_SEARCH_EXTENSION, SearchWindow, SleepPeriodDetector, first_sleep_run, is_run};
use crate::algorithm::{Configurable, Parameters, param_positive_usize, param_usize};

/// Tudor-Locke et al. (2014) sleep period rules.
///
/// Onset is the first run of `onset_epochs` sleep epochs. The period ends at the sleep epoch
/// right before the first run of `offset_epochs` wake epochs; without such a run the last
/// sleep epoch of the window is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TudorLocke {
    onset_epochs: usize,
    offset_epochs: usize,
    search_extension: usize,
}

impl TudorLocke {
    pub const IDENTIFIER: &'static str = "tudor_locke_2014";

    pub fn with_search_extension(mut self, epochs: usize) -> Self {
        self.search_extension = epochs;
        self
    }
}

impl Default for TudorLocke {
    fn default() -> Self {
        Self {
            onset_epochs: 5,
            offset_epochs: 10,
            search_extension: DEFAULT_SEARCH_EXTENSION,
        }
    }
}

impl Configurable for TudorLocke {
    fn name(&self) -> &'static str {
        "Tudor-Locke (2014)"
    }

    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn get_parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("onset_epochs".into(), json!(self.onset_epochs));
        params.insert("offset_epochs".into(), json!(self.offset_epochs));
        params.insert("search_extension_epochs".into(), json!(self.search_extension));
        params
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<()> {
        let mut next = *self;
        for (name, value) in params {
            match name.as_str() {
                "onset_epochs" => {
                    next.onset_epochs = param_positive_usize(Self::IDENTIFIER, name, value)?
                }
                "offset_epochs" => {
                    next.offset_epochs = param_positive_usize(Self::IDENTIFIER, name, value)?
                }
                "search_extension_epochs" => {
                    next.search_extension = param_usize(Self::IDENTIFIER, name, value)?
                }
                _ => return Err(ActisleepError::unknown_parameter(Self::IDENTIFIER, name)),
            }
        }
        *self = next;
        Ok(())
    }
}

impl SleepPeriodDetector for TudorLocke {
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
        let wake_run = (window.end + 1)
            .checked_sub(len)
            .and_then(|last_start| {
                (onset + 1..=last_start).find(|&k| is_run(labels, k, len, SleepWakeLabel::Wake))
            });

        if let Some(k) = wake_run {
            let before = k - 1;
            if labels[before].is_sleep() {
                trace!("{}: wake run at {k}, offset {before}", Self::IDENTIFIER);
                return Some(before);
            }
        }

        let fallback = (onset + 1..=window.end)
            .rev()
            .find(|&i| labels[i].is_sleep());
        if let Some(offset) = fallback {
            warn!(
                "{}: no run of {len} wake epochs after onset {onset}, using last sleep epoch {offset}",
                Self::IDENTIFIER
            );
        }
        fallback
    }
}
