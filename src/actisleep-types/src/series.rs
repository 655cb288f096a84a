use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    error::{ActisleepError, Result},
    validation::{check_values, validate_length},
};

/// Tolerance applied to the spacing between consecutive epochs.
const SPACING_TOLERANCE_SECS: i64 = 1;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityChannel {
    /// Vertical axis counts, the channel the published classifiers were validated on.
    #[default]
    AxisY,
    AxisX,
    AxisZ,
    VectorMagnitude,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    pub timestamp: NaiveDateTime,
    pub axis_y: f64,
    pub axis_x: Option<f64>,
    pub axis_z: Option<f64>,
    pub vector_magnitude: Option<f64>,
}

impl Epoch {
    pub fn new(timestamp: NaiveDateTime, axis_y: f64) -> Self {
        Self {
            timestamp,
            axis_y,
            axis_x: None,
            axis_z: None,
            vector_magnitude: None,
        }
    }

    pub fn with_axes(self, axis_x: f64, axis_z: f64) -> Self {
        Self {
            axis_x: Some(axis_x),
            axis_z: Some(axis_z),
            ..self
        }
    }

    pub fn with_vector_magnitude(self, vector_magnitude: f64) -> Self {
        Self {
            vector_magnitude: Some(vector_magnitude),
            ..self
        }
    }

    /// Value of `channel`, deriving vector magnitude from the three axes when it is not stored.
    pub fn value(&self, channel: ActivityChannel) -> Option<f64> {
        match channel {
            ActivityChannel::AxisY => Some(self.axis_y),
            ActivityChannel::AxisX => self.axis_x,
            ActivityChannel::AxisZ => self.axis_z,
            ActivityChannel::VectorMagnitude => self.vector_magnitude.or_else(|| {
                let (x, z) = (self.axis_x?, self.axis_z?);
                Some((x * x + self.axis_y * self.axis_y + z * z).sqrt())
            }),
        }
    }

    fn stored_values(&self) -> impl Iterator<Item = f64> + Clone + '_ {
        [
            Some(self.axis_y),
            self.axis_x,
            self.axis_z,
            self.vector_magnitude,
        ]
        .into_iter()
        .flatten()
    }
}

/// One recording's epochs, validated on construction and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivitySeries {
    epochs: Vec<Epoch>,
    epoch_seconds: u32,
}

impl ActivitySeries {
    pub fn new(epochs: Vec<Epoch>, epoch_seconds: u32) -> Result<Self> {
        validate_length(epochs.len())?;
        if epoch_seconds == 0 {
            return Err(ActisleepError::UnsupportedEpochLength(epoch_seconds));
        }

        let expected = i64::from(epoch_seconds);
        for (index, pair) in epochs.windows(2).enumerate() {
            let actual = (pair[1].timestamp - pair[0].timestamp).num_seconds();
            if actual <= 0 || (actual - expected).abs() > SPACING_TOLERANCE_SECS {
                return Err(ActisleepError::IrregularTimestamps {
                    index: index + 1,
                    expected,
                    actual,
                });
            }
        }

        check_values(
            epochs
                .iter()
                .enumerate()
                .flat_map(|(i, e)| e.stored_values().map(move |v| (i, v))),
        )?;

        Ok(Self {
            epochs,
            epoch_seconds,
        })
    }

    /// Builds a vertical-axis-only series with uniformly spaced timestamps.
    pub fn from_counts(start: NaiveDateTime, epoch_seconds: u32, counts: &[f64]) -> Result<Self> {
        let step = TimeDelta::seconds(i64::from(epoch_seconds));
        let epochs = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| Epoch::new(start + step * i as i32, count))
            .collect();
        Self::new(epochs, epoch_seconds)
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    pub fn epoch_seconds(&self) -> u32 {
        self.epoch_seconds
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.epochs.iter().map(|e| e.timestamp).collect()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.epochs[0].timestamp
    }

    pub fn end(&self) -> NaiveDateTime {
        self.epochs[self.epochs.len() - 1].timestamp
    }

    pub fn has_channel(&self, channel: ActivityChannel) -> bool {
        self.epochs.iter().all(|e| e.value(channel).is_some())
    }

    pub fn has_triaxial(&self) -> bool {
        self.epochs
            .iter()
            .all(|e| e.axis_x.is_some() && e.axis_z.is_some())
    }

    /// Copies `channel` out into a fresh column.
    pub fn channel(&self, channel: ActivityChannel) -> Result<Vec<f64>> {
        self.epochs
            .iter()
            .map(|e| e.value(channel))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ActisleepError::MissingChannel(channel.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap()
    }

    #[test]
    fn from_counts_spaces_epochs() {
        let series = ActivitySeries::from_counts(base(), 60, &[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.end() - series.start(), TimeDelta::minutes(2));
        assert_eq!(series.channel(ActivityChannel::AxisY).unwrap(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn empty_series_rejected() {
        assert_eq!(
            ActivitySeries::new(Vec::new(), 60),
            Err(ActisleepError::EmptyInput)
        );
    }

    #[test]
    fn zero_epoch_length_rejected() {
        assert_eq!(
            ActivitySeries::from_counts(base(), 0, &[1.0]),
            Err(ActisleepError::UnsupportedEpochLength(0))
        );
    }

    #[test]
    fn irregular_spacing_rejected() {
        let epochs = vec![
            Epoch::new(base(), 0.0),
            Epoch::new(base() + TimeDelta::seconds(60), 0.0),
            Epoch::new(base() + TimeDelta::seconds(180), 0.0),
        ];
        assert_eq!(
            ActivitySeries::new(epochs, 60),
            Err(ActisleepError::IrregularTimestamps {
                index: 2,
                expected: 60,
                actual: 120,
            })
        );
    }

    #[test]
    fn one_second_jitter_tolerated() {
        let epochs = vec![
            Epoch::new(base(), 0.0),
            Epoch::new(base() + TimeDelta::seconds(61), 0.0),
            Epoch::new(base() + TimeDelta::seconds(120), 0.0),
        ];
        assert!(ActivitySeries::new(epochs, 60).is_ok());
    }

    #[test]
    fn non_increasing_timestamps_rejected() {
        let epochs = vec![Epoch::new(base(), 0.0), Epoch::new(base(), 0.0)];
        assert!(ActivitySeries::new(epochs, 60).is_err());
    }

    #[test]
    fn negative_secondary_axis_rejected() {
        let epochs = vec![
            Epoch::new(base(), 0.0).with_axes(-3.0, 0.0),
            Epoch::new(base() + TimeDelta::seconds(60), 0.0).with_axes(0.0, 0.0),
        ];
        assert_eq!(
            ActivitySeries::new(epochs, 60),
            Err(ActisleepError::InvalidActivityValues {
                reason: "negative",
                indices: vec![0],
                count: 1,
            })
        );
    }

    #[test]
    fn vector_magnitude_derived_from_axes() {
        let epochs = vec![Epoch::new(base(), 4.0).with_axes(3.0, 0.0)];
        let series = ActivitySeries::new(epochs, 60).unwrap();
        assert_eq!(
            series.channel(ActivityChannel::VectorMagnitude).unwrap(),
            vec![5.0]
        );
    }

    #[test]
    fn stored_vector_magnitude_wins() {
        let epochs = vec![Epoch::new(base(), 4.0)
            .with_axes(3.0, 0.0)
            .with_vector_magnitude(7.0)];
        let series = ActivitySeries::new(epochs, 60).unwrap();
        assert_eq!(
            series.channel(ActivityChannel::VectorMagnitude).unwrap(),
            vec![7.0]
        );
    }

    #[test]
    fn missing_channel_is_an_error() {
        let series = ActivitySeries::from_counts(base(), 60, &[1.0]).unwrap();
        assert!(!series.has_channel(ActivityChannel::AxisX));
        assert_eq!(
            series.channel(ActivityChannel::AxisX),
            Err(ActisleepError::MissingChannel("axis_x".into()))
        );
    }

    #[test]
    fn channel_names_round_trip_through_strum() {
        assert_eq!(
            "vector_magnitude".parse::<ActivityChannel>().unwrap(),
            ActivityChannel::VectorMagnitude
        );
        assert_eq!(ActivityChannel::AxisY.to_string(), "axis_y");
    }
}
