use actisleep_types::{
    ActivitySeries, NonwearPeriod, Result, SleepMetrics, SleepPeriod, SleepWakeLabel,
};
use serde::Serialize;

use crate::{
    classifiers::SleepScoringAlgorithm,
    config::{PipelineConfig, SleepMarkers},
    metrics::SleepMetricsCalculator,
    nonwear::NonwearDetector,
    periods::SleepPeriodDetector,
};

/// Everything one pipeline run produced. Period and metrics are absent when no complete
/// sleep period was found.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub classifier: &'static str,
    pub nonwear_detector: Option<&'static str>,
    pub period_detector: &'static str,
    pub labels: Vec<SleepWakeLabel>,
    pub nonwear_periods: Vec<NonwearPeriod>,
    pub markers: SleepMarkers,
    pub onset_index: Option<usize>,
    pub offset_index: Option<usize>,
    pub period: Option<SleepPeriod>,
    pub metrics: Option<SleepMetrics>,
}

/// Classifier, nonwear detector and period detector resolved from a [`PipelineConfig`].
pub struct Pipeline {
    config: PipelineConfig,
    classifier: Box<dyn SleepScoringAlgorithm>,
    nonwear: Option<Box<dyn NonwearDetector>>,
    period_detector: Box<dyn SleepPeriodDetector>,
    metrics: SleepMetricsCalculator,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        classifier: Box<dyn SleepScoringAlgorithm>,
        nonwear: Option<Box<dyn NonwearDetector>>,
        period_detector: Box<dyn SleepPeriodDetector>,
    ) -> Self {
        Self {
            config,
            classifier,
            nonwear,
            period_detector,
            metrics: SleepMetricsCalculator,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &dyn SleepScoringAlgorithm {
        self.classifier.as_ref()
    }

    /// `None` when nonwear detection is disabled.
    pub fn nonwear_detector(&self) -> Option<&dyn NonwearDetector> {
        self.nonwear.as_deref()
    }

    pub fn period_detector(&self) -> &dyn SleepPeriodDetector {
        self.period_detector.as_ref()
    }

    pub fn score(&self, series: &ActivitySeries) -> Result<Vec<SleepWakeLabel>> {
        self.classifier
            .score_channel(series, self.config.classifier_channel)
    }

    /// Nonwear periods on the configured channel, empty when detection is disabled.
    pub fn detect_nonwear(&self, series: &ActivitySeries) -> Result<Vec<NonwearPeriod>> {
        match &self.nonwear {
            Some(detector) => detector.detect(series, self.config.nonwear_channel),
            None => Ok(Vec::new()),
        }
    }

    /// Scores `series`, flags nonwear, locates the sleep period around `markers` (the
    /// configured night window when `None`) and summarises it. Nonwear detection is skipped
    /// when the series lacks the nonwear channel.
    pub fn run(
        &self,
        series: &ActivitySeries,
        markers: Option<SleepMarkers>,
    ) -> Result<PipelineOutput> {
        let activity = series.channel(self.config.classifier_channel)?;
        let labels = self.score(series)?;

        let nonwear_periods = if self.nonwear.is_some()
            && !series.has_channel(self.config.nonwear_channel)
        {
            warn!(
                "skipping nonwear detection, series has no `{}` channel",
                self.config.nonwear_channel
            );
            Vec::new()
        } else {
            self.detect_nonwear(series)?
        };

        let markers = markers.unwrap_or_else(|| self.config.night_markers(series));
        let timestamps = series.timestamps();
        let (onset_index, offset_index) =
            self.period_detector
                .apply_rules(&labels, markers.onset, markers.offset, &timestamps)?;

        let period = SleepPeriod::from_bounds(onset_index, offset_index);
        let metrics = period
            .map(|p| {
                self.metrics.calculate_metrics(
                    &labels,
                    &activity,
                    p.onset_index,
                    p.offset_index,
                    &timestamps,
                    series.epoch_seconds(),
                )
            })
            .transpose()?;

        if let Some(p) = period {
            let overlapping = nonwear_periods
                .iter()
                .filter(|n| n.start_index <= p.offset_index && n.end_index >= p.onset_index)
                .count();
            if overlapping > 0 {
                warn!(
                    "sleep period {}..={} overlaps {overlapping} nonwear period(s)",
                    p.onset_index, p.offset_index
                );
            }
        }

        info!(
            "{} epochs: {} nonwear periods, period {:?}",
            series.len(),
            nonwear_periods.len(),
            period.map(|p| (p.onset_index, p.offset_index))
        );

        Ok(PipelineOutput {
            classifier: self.classifier.identifier(),
            nonwear_detector: self.nonwear.as_ref().map(|d| d.identifier()),
            period_detector: self.period_detector.identifier(),
            labels,
            nonwear_periods,
            markers,
            onset_index,
            offset_index,
            period,
            metrics,
        })
    }
}
