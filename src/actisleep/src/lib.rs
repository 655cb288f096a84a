#[macro_use]
extern crate log;

pub mod input;
pub use input::{parse_datetime, parse_series, read_series};

pub mod report;
pub use report::{FormatHM, Summary};
