#[macro_use]
extern crate log;

pub mod algorithm;
pub use algorithm::{Configurable, Parameters};

pub(crate) mod classifiers;
pub use classifiers::{ColeKripke, SCORING_EPOCH_SECONDS, Sadeh, SadehPreset, SleepScoringAlgorithm};

pub(crate) mod nonwear;
pub use nonwear::{Choi, NonwearDetector, VanHees};

pub(crate) mod periods;
pub use periods::{
    ConsecutiveEpochs, DEFAULT_SEARCH_EXTENSION, SearchWindow, SleepPeriodDetector, TudorLocke,
};

pub(crate) mod metrics;
pub use metrics::SleepMetricsCalculator;

pub mod registry;
pub use registry::{
    AlgorithmFactory, ClassifierFactory, NonwearAlgorithmFactory, SleepPeriodDetectorFactory,
};

pub(crate) mod config;
pub use config::{PipelineConfig, SleepMarkers};

pub(crate) mod pipeline;
pub use pipeline::{Pipeline, PipelineOutput};

pub mod helpers;
