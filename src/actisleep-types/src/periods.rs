use serde::{Deserialize, Serialize};

/// Closed epoch range where the device is inferred not worn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonwearPeriod {
    pub start_index: usize,
    pub end_index: usize,
    pub duration_epochs: usize,
    pub source_algorithm: String,
}

impl NonwearPeriod {
    pub fn new(start_index: usize, end_index: usize, source_algorithm: impl Into<String>) -> Self {
        debug_assert!(start_index <= end_index);
        Self {
            start_index,
            end_index,
            duration_epochs: end_index - start_index + 1,
            source_algorithm: source_algorithm.into(),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..=self.end_index).contains(&index)
    }
}

/// Expands periods into a `{0,1}` mask of `len` entries, 1 marking nonwear.
pub fn nonwear_mask(periods: &[NonwearPeriod], len: usize) -> Vec<u8> {
    let mut mask = vec![0_u8; len];
    for period in periods {
        let end = period.end_index.min(len.saturating_sub(1));
        if period.start_index < len {
            mask[period.start_index..=end].fill(1);
        }
    }
    mask
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepPeriod {
    pub onset_index: usize,
    pub offset_index: usize,
}

impl SleepPeriod {
    /// Pairs detector output into a period, if both bounds exist and are ordered.
    pub fn from_bounds(onset: Option<usize>, offset: Option<usize>) -> Option<Self> {
        match (onset, offset) {
            (Some(onset_index), Some(offset_index)) if onset_index < offset_index => Some(Self {
                onset_index,
                offset_index,
            }),
            _ => None,
        }
    }
}
