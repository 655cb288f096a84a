use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SleepWakeLabel {
    Sleep,
    Wake,
}

impl SleepWakeLabel {
    pub fn from_sleep(is_sleep: bool) -> Self {
        if is_sleep { Self::Sleep } else { Self::Wake }
    }

    pub fn is_sleep(self) -> bool {
        matches!(self, Self::Sleep)
    }

    pub fn is_wake(self) -> bool {
        matches!(self, Self::Wake)
    }
}

/// Parses a compact `S`/`W` string, mostly useful for building fixtures.
pub fn labels_from_str(pattern: &str) -> Vec<SleepWakeLabel> {
    pattern
        .chars()
        .filter_map(|c| match c {
            'S' | 's' => Some(SleepWakeLabel::Sleep),
            'W' | 'w' => Some(SleepWakeLabel::Wake),
            _ => None,
        })
        .collect()
}
