use std::fmt::{self, Display};

use actisleep_algos::PipelineOutput;
use chrono::{NaiveDateTime, Timelike as _};

pub trait FormatHM {
    fn format_hm(&self) -> String;
}

/// Minutes as `HH:MM`.
impl FormatHM for f64 {
    fn format_hm(&self) -> String {
        let total = self.round() as i64;
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

/// Clock time of day.
impl FormatHM for NaiveDateTime {
    fn format_hm(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Human readable rendering of a pipeline run.
pub struct Summary<'a>(pub &'a PipelineOutput);

impl Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let output = self.0;
        let sleep = output.labels.iter().filter(|l| l.is_sleep()).count();
        writeln!(
            f,
            "Algorithms: {} / {} / {}",
            output.classifier,
            output.nonwear_detector.unwrap_or("no nonwear"),
            output.period_detector
        )?;
        writeln!(
            f,
            "Epochs: {} ({} sleep), nonwear periods: {}",
            output.labels.len(),
            sleep,
            output.nonwear_periods.len()
        )?;

        let Some(metrics) = &output.metrics else {
            return write!(
                f,
                "No sleep period found between {} and {} (onset {:?}, offset {:?})",
                output.markers.onset, output.markers.offset, output.onset_index, output.offset_index
            );
        };

        writeln!(
            f,
            "In bed: {} - {}, asleep: {} - {}",
            metrics.in_bed_time.format_hm(),
            metrics.out_bed_time.format_hm(),
            metrics.sleep_onset.format_hm(),
            metrics.sleep_offset.format_hm()
        )?;
        writeln!(
            f,
            "TIB: {}, TST: {}, SOL: {}, WASO: {}",
            metrics.time_in_bed.format_hm(),
            metrics.total_sleep_time.format_hm(),
            metrics.sleep_onset_latency.format_hm(),
            metrics.wake_after_sleep_onset.format_hm()
        )?;
        writeln!(
            f,
            "Awakenings: {} (avg {:.1} min), sleep bouts: {}",
            metrics.number_of_awakenings,
            metrics.average_awakening_length,
            metrics.number_of_sleep_bouts
        )?;
        write!(
            f,
            "Efficiency: {:.1}%, movement: {:.1}%, fragmentation: {:.1}%, SFI: {:.1}%",
            metrics.sleep_efficiency,
            metrics.movement_index,
            metrics.fragmentation_index,
            metrics.sleep_fragmentation_index
        )
    }
}
