#[macro_use]
extern crate log;

use std::{fs, path::PathBuf, sync::PoisonError};

use actisleep::{Summary, parse_datetime, read_series};
use actisleep_algos::{
    Configurable, PipelineConfig, SleepMarkers,
    registry::{self, AlgorithmFactory},
};
use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use dotenv::dotenv;

#[derive(Parser)]
#[command(author, version, about)]
pub struct ActisleepCli {
    /// JSON pipeline configuration
    #[arg(env = "ACTISLEEP_CONFIG", long)]
    pub config: Option<PathBuf>,
    #[arg(env = "ACTISLEEP_EPOCH_SECONDS", long, default_value_t = 60)]
    pub epoch_seconds: u32,
    #[arg(env = "ACTISLEEP_CLASSIFIER", long)]
    pub classifier: Option<String>,
    #[arg(env = "ACTISLEEP_NONWEAR", long, conflicts_with = "skip_nonwear")]
    pub nonwear: Option<String>,
    /// Run without nonwear detection
    #[arg(env = "ACTISLEEP_SKIP_NONWEAR", long)]
    pub skip_nonwear: bool,
    #[arg(env = "ACTISLEEP_PERIOD_DETECTOR", long)]
    pub period_detector: Option<String>,
    #[clap(subcommand)]
    pub subcommand: ActisleepCommand,
}

#[derive(Subcommand)]
pub enum ActisleepCommand {
    ///
    /// List registered algorithms
    ///
    Algorithms,
    ///
    /// Print sleep/wake labels for every epoch
    ///
    Score {
        #[arg(long)]
        input: PathBuf,
    },
    ///
    /// Print detected nonwear periods
    ///
    Nonwear {
        #[arg(long)]
        input: PathBuf,
    },
    ///
    /// Run the full pipeline: labels, nonwear, sleep period and metrics
    ///
    Analyze {
        #[arg(long)]
        input: PathBuf,
        /// Approximate in-bed time, defaults to the configured night window
        #[arg(long, requires = "offset", value_parser = parse_datetime)]
        onset: Option<NaiveDateTime>,
        /// Approximate out-of-bed time
        #[arg(long, requires = "onset", value_parser = parse_datetime)]
        offset: Option<NaiveDateTime>,
        /// Print a readable summary instead of JSON
        #[arg(long)]
        summary: bool,
    },
}

impl ActisleepCli {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => PipelineConfig::default(),
        };

        if let Some(id) = &self.classifier {
            config.classifier = id.clone();
        }
        if let Some(id) = &self.nonwear {
            config.nonwear_detector = Some(id.clone());
        }
        if self.skip_nonwear {
            config.nonwear_detector = None;
        }
        if let Some(id) = &self.period_detector {
            config.period_detector = id.clone();
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let dotenv_result = dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = dotenv_result {
        debug!("no .env loaded: {}", error);
    }

    let cli = ActisleepCli::parse();

    match &cli.subcommand {
        ActisleepCommand::Algorithms => {
            print_table(
                &registry::classifiers()
                    .read()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            print_table(
                &registry::nonwear_detectors()
                    .read()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            print_table(
                &registry::period_detectors()
                    .read()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            Ok(())
        }
        ActisleepCommand::Score { input } => {
            let pipeline = cli.pipeline_config()?.build()?;
            let series = read_series(input, cli.epoch_seconds)?;
            let labels = pipeline.score(&series)?;
            println!("{}", serde_json::to_string_pretty(&labels)?);
            Ok(())
        }
        ActisleepCommand::Nonwear { input } => {
            let pipeline = cli.pipeline_config()?.build()?;
            let series = read_series(input, cli.epoch_seconds)?;
            let Some(detector) = pipeline.nonwear_detector() else {
                anyhow::bail!("nonwear detection is disabled by the configuration");
            };
            let periods = pipeline
                .detect_nonwear(&series)
                .with_context(|| format!("{} on {}", detector.identifier(), input.display()))?;
            println!("{}", serde_json::to_string_pretty(&periods)?);
            Ok(())
        }
        ActisleepCommand::Analyze {
            input,
            onset,
            offset,
            summary,
        } => {
            let pipeline = cli.pipeline_config()?.build()?;
            let series = read_series(input, cli.epoch_seconds)?;
            let markers = (*onset)
                .zip(*offset)
                .map(|(onset, offset)| SleepMarkers { onset, offset });

            let output = pipeline
                .run(&series, markers)
                .with_context(|| format!("analyzing {}", input.display()))?;
            if *summary {
                println!("{}", Summary(&output));
            } else {
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            Ok(())
        }
    }
}

fn print_table<T: Configurable + ?Sized>(factory: &AlgorithmFactory<T>) {
    println!("{} (default: {})", factory.kind(), factory.get_default_id());
    for (id, name) in factory.get_available() {
        println!("\t{id:<32} {name}");
    }
    println!();
}
