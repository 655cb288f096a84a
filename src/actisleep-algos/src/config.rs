use std::{collections::BTreeMap, sync::PoisonError};

use actisleep_types::{ActisleepError, ActivityChannel, ActivitySeries, Result};
use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::{
    algorithm::Parameters,
    classifiers::SadehPreset,
    nonwear::Choi,
    periods::ConsecutiveEpochs,
    pipeline::Pipeline,
    registry,
};

/// Approximate in-bed and out-of-bed times, usually from a sleep diary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepMarkers {
    pub onset: NaiveDateTime,
    pub offset: NaiveDateTime,
}

/// Which algorithms a [`Pipeline`] runs and how they are configured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub classifier: String,
    /// `None` (JSON `null`) disables nonwear detection.
    pub nonwear_detector: Option<String>,
    pub period_detector: String,
    /// Per-algorithm overrides keyed by identifier.
    pub parameters: BTreeMap<String, Parameters>,
    pub night_start_hour: u32,
    pub night_end_hour: u32,
    pub classifier_channel: ActivityChannel,
    pub nonwear_channel: ActivityChannel,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifier: SadehPreset::ActiLife.identifier().to_owned(),
            nonwear_detector: Some(Choi::IDENTIFIER.to_owned()),
            period_detector: ConsecutiveEpochs::ONSET3S_OFFSET5S.to_owned(),
            parameters: BTreeMap::new(),
            night_start_hour: 21,
            night_end_hour: 9,
            classifier_channel: ActivityChannel::AxisY,
            nonwear_channel: ActivityChannel::VectorMagnitude,
        }
    }
}

impl PipelineConfig {
    const NAME: &'static str = "pipeline";

    pub fn overrides_for(&self, id: &str) -> Parameters {
        self.parameters.get(id).cloned().unwrap_or_default()
    }

    /// Resolves every algorithm through the shared registries.
    pub fn build(&self) -> Result<Pipeline> {
        self.check_hours()?;

        let classifier = registry::classifiers()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .create_with(&self.classifier, &self.overrides_for(&self.classifier))?;
        let nonwear = self
            .nonwear_detector
            .as_deref()
            .map(|id| {
                registry::nonwear_detectors()
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .create_with(id, &self.overrides_for(id))
            })
            .transpose()?;
        let period_detector = registry::period_detectors()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .create_with(
                &self.period_detector,
                &self.overrides_for(&self.period_detector),
            )?;

        debug!(
            "pipeline: {} -> {} -> {}",
            classifier.identifier(),
            nonwear.as_ref().map_or("no nonwear", |d| d.identifier()),
            period_detector.identifier()
        );
        Ok(Pipeline::new(
            self.clone(),
            classifier,
            nonwear,
            period_detector,
        ))
    }

    fn check_hours(&self) -> Result<()> {
        for (name, hour) in [
            ("night_start_hour", self.night_start_hour),
            ("night_end_hour", self.night_end_hour),
        ] {
            if hour > 23 {
                return Err(ActisleepError::invalid_parameter(
                    Self::NAME,
                    name,
                    format!("expected an hour between 0 and 23, got {hour}"),
                ));
            }
        }
        Ok(())
    }

    /// Markers for the first night of `series`: the first epochs at or after
    /// `night_start_hour` and the following `night_end_hour`, clamped into the recording. A
    /// recording that starts before `night_end_hour` belongs to the night that began the
    /// evening before.
    pub fn night_markers(&self, series: &ActivitySeries) -> SleepMarkers {
        let timestamps = series.timestamps();
        let hour = |h: u32| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN);
        let (night_start, night_end) = (hour(self.night_start_hour), hour(self.night_end_hour));
        let overnight = night_end <= night_start;

        let start = series.start();
        let night = if overnight && start.time() < night_end {
            start.date() - TimeDelta::days(1)
        } else {
            start.date()
        };
        let morning = if overnight {
            night + TimeDelta::days(1)
        } else {
            night
        };

        let at_or_after = |target: NaiveDateTime| {
            let index = timestamps
                .partition_point(|t| *t < target)
                .min(timestamps.len() - 1);
            timestamps[index]
        };
        let onset = at_or_after(night.and_time(night_start));
        let offset = at_or_after(morning.and_time(night_end));
        trace!("night markers {onset} - {offset}");

        SleepMarkers { onset, offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn series(start: NaiveDateTime, minutes: usize) -> ActivitySeries {
        ActivitySeries::from_counts(start, 60, &vec![0.0; minutes]).unwrap()
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"period_detector": "tudor_locke_2014"}"#).unwrap();
        assert_eq!(config.classifier, "sadeh_1994_actilife");
        assert_eq!(config.nonwear_detector.as_deref(), Some("choi_2011"));
        assert_eq!(config.period_detector, "tudor_locke_2014");
        assert_eq!(config.night_start_hour, 21);
        assert_eq!(config.night_end_hour, 9);
        assert_eq!(config.nonwear_channel, ActivityChannel::VectorMagnitude);

        let config: PipelineConfig =
            serde_json::from_str(r#"{"classifier_channel": "vector_magnitude"}"#).unwrap();
        assert_eq!(config.classifier_channel, ActivityChannel::VectorMagnitude);

        let config: PipelineConfig =
            serde_json::from_str(r#"{"nonwear_detector": null}"#).unwrap();
        assert_eq!(config.nonwear_detector, None);
        assert!(config.build().unwrap().nonwear_detector().is_none());
    }

    #[test]
    fn build_resolves_and_applies_overrides() {
        let mut config = PipelineConfig {
            classifier: "sadeh_1994_original".into(),
            ..Default::default()
        };
        let mut params = Parameters::new();
        params.insert("search_extension_epochs".into(), json!(12));
        config
            .parameters
            .insert(config.period_detector.clone(), params);

        let pipeline = config.build().unwrap();
        assert_eq!(pipeline.classifier().identifier(), "sadeh_1994_original");
        assert_eq!(pipeline.period_detector().search_extension(), 12);
    }

    #[test]
    fn build_fails_before_running() {
        let config = PipelineConfig {
            nonwear_detector: Some("troiano_2008".into()),
            ..Default::default()
        };
        assert!(config.build().err().unwrap().is_configuration());

        let mut config = PipelineConfig::default();
        let mut params = Parameters::new();
        params.insert("threshold".into(), json!("high"));
        config
            .parameters
            .insert("sadeh_1994_actilife".into(), params);
        assert!(matches!(
            config.build().err().unwrap(),
            ActisleepError::InvalidParameter { .. }
        ));

        let config = PipelineConfig {
            night_end_hour: 24,
            ..Default::default()
        };
        assert!(config.build().err().unwrap().is_configuration());
    }

    #[test]
    fn night_markers_span_the_first_night() {
        let config = PipelineConfig::default();
        let markers = config.night_markers(&series(at(1, 12, 0), 24 * 60));
        assert_eq!(markers.onset, at(1, 21, 0));
        assert_eq!(markers.offset, at(2, 9, 0));
    }

    #[test]
    fn night_markers_are_clamped() {
        let config = PipelineConfig::default();

        // starts after the night start, ends before the morning
        let markers = config.night_markers(&series(at(1, 22, 30), 6 * 60));
        assert_eq!(markers.onset, at(1, 22, 30));
        assert_eq!(markers.offset, at(2, 4, 29));
    }

    #[test]
    fn night_markers_for_a_recording_started_after_midnight() {
        let config = PipelineConfig::default();

        let markers = config.night_markers(&series(at(2, 0, 0), 8 * 60));
        assert_eq!(markers.onset, at(2, 0, 0));
        assert_eq!(markers.offset, at(2, 7, 59));

        let markers = config.night_markers(&series(at(2, 3, 15), 12 * 60));
        assert_eq!(markers.onset, at(2, 3, 15));
        assert_eq!(markers.offset, at(2, 9, 0));

        // from the end hour on, the next evening is the first night
        let markers = config.night_markers(&series(at(2, 9, 0), 25 * 60));
        assert_eq!(markers.onset, at(2, 21, 0));
        assert_eq!(markers.offset, at(3, 9, 0));
    }

    #[test]
    fn same_day_night_window() {
        let config = PipelineConfig {
            night_start_hour: 1,
            night_end_hour: 7,
            ..Default::default()
        };
        let markers = config.night_markers(&series(at(1, 0, 0), 12 * 60));
        assert_eq!(markers.onset, at(1, 1, 0));
        assert_eq!(markers.offset, at(1, 7, 0));
    }
}
