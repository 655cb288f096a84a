use std::{fs::File, io::Read, path::Path};

use actisleep_types::{ActivitySeries, Epoch};
use anyhow::Context;
use chrono::NaiveDateTime;
use serde::Deserialize;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats accepted for timestamps given on the command line.
const DATETIME_FORMATS: [&str; 3] = [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Deserialize)]
struct CsvEpoch {
    timestamp: String,
    axis_y: f64,
    axis_x: Option<f64>,
    axis_z: Option<f64>,
    vector_magnitude: Option<f64>,
}

impl CsvEpoch {
    fn into_epoch(self) -> anyhow::Result<Epoch> {
        let timestamp = NaiveDateTime::parse_from_str(self.timestamp.trim(), TIMESTAMP_FORMAT)
            .with_context(|| format!("invalid timestamp `{}`", self.timestamp))?;

        let mut epoch = Epoch::new(timestamp, self.axis_y);
        if let (Some(x), Some(z)) = (self.axis_x, self.axis_z) {
            epoch = epoch.with_axes(x, z);
        }
        if let Some(vm) = self.vector_magnitude {
            epoch = epoch.with_vector_magnitude(vm);
        }
        Ok(epoch)
    }
}

/// Reads an epoch CSV with a `timestamp,axis_y[,axis_x,axis_z,vector_magnitude]` header.
pub fn read_series(path: &Path, epoch_seconds: u32) -> anyhow::Result<ActivitySeries> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let series = parse_series(file, epoch_seconds)
        .with_context(|| format!("reading {}", path.display()))?;
    info!(
        "{}: {} epochs from {} to {}",
        path.display(),
        series.len(),
        series.start(),
        series.end()
    );
    Ok(series)
}

pub fn parse_series<R: Read>(reader: R, epoch_seconds: u32) -> anyhow::Result<ActivitySeries> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut epochs = Vec::new();
    for (row, result) in rdr.deserialize::<CsvEpoch>().enumerate() {
        let record = result.with_context(|| format!("row {}", row + 1))?;
        epochs.push(record.into_epoch().with_context(|| format!("row {}", row + 1))?);
    }
    debug!("parsed {} rows", epochs.len());

    Ok(ActivitySeries::new(epochs, epoch_seconds)?)
}

pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let s = s.trim();
    DATETIME_FORMATS[1..].iter().fold(
        NaiveDateTime::parse_from_str(s, DATETIME_FORMATS[0]),
        |parsed, format| parsed.or_else(|_| NaiveDateTime::parse_from_str(s, format)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use actisleep_types::{ActisleepError, ActivityChannel};

    #[test]
    fn reads_vertical_axis_only() {
        let csv = "timestamp,axis_y\n\
                   2025-01-01 22:00:00,10\n\
                   2025-01-01 22:01:00,0\n\
                   2025-01-01 22:02:00,5.5\n";
        let series = parse_series(csv.as_bytes(), 60).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(
            series.channel(ActivityChannel::AxisY).unwrap(),
            vec![10.0, 0.0, 5.5]
        );
        assert!(!series.has_channel(ActivityChannel::VectorMagnitude));
    }

    #[test]
    fn reads_all_channels() {
        let csv = "timestamp,axis_y,axis_x,axis_z,vector_magnitude\n\
                   2025-01-01 22:00:00,3,4,0,5\n\
                   2025-01-01 22:00:30,0,0,0,\n";
        let series = parse_series(csv.as_bytes(), 30).unwrap();
        assert!(series.has_triaxial());
        // stored magnitude wins, missing magnitude is derived from the axes
        assert_eq!(
            series.channel(ActivityChannel::VectorMagnitude).unwrap(),
            vec![5.0, 0.0]
        );
    }

    #[test]
    fn reports_bad_rows() {
        let csv = "timestamp,axis_y\n2025-01-01 22:00:00,1\n01/01/2025 22:01,2\n";
        let err = parse_series(csv.as_bytes(), 60).unwrap_err();
        assert!(format!("{err:#}").contains("row 2"));

        let csv = "timestamp,axis_y\n2025-01-01 22:00:00,-1\n";
        let err = parse_series(csv.as_bytes(), 60).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActisleepError>(),
            Some(ActisleepError::InvalidActivityValues { .. })
        ));
    }

    #[test]
    fn empty_file_is_rejected() {
        let err = parse_series("timestamp,axis_y\n".as_bytes(), 60).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ActisleepError>(),
            Some(&ActisleepError::EmptyInput)
        );
    }

    #[test]
    fn command_line_datetimes() {
        let expected = NaiveDateTime::parse_from_str("2025-01-01 22:30:00", TIMESTAMP_FORMAT)
            .unwrap();
        assert_eq!(parse_datetime("2025-01-01 22:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("2025-01-01T22:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("2025-01-01 22:30").unwrap(), expected);
        assert!(parse_datetime("tonight").is_err());
    }
}
