mod error;
pub use error::{ActisleepError, MAX_REPORTED_INDICES, Result};

mod labels;
pub use labels::{SleepWakeLabel, labels_from_str};

mod metrics;
pub use metrics::SleepMetrics;

mod periods;
pub use periods::{NonwearPeriod, SleepPeriod, nonwear_mask};

mod series;
pub use series::{ActivityChannel, ActivitySeries, Epoch};

pub mod validation;
