use std::{
    collections::BTreeMap,
    sync::{LazyLock, RwLock},
};

use actisleep_types::{ActisleepError, Result};

use crate::{
    algorithm::{Configurable, Parameters},
    classifiers::{ColeKripke, Sadeh, SadehPreset, SleepScoringAlgorithm},
    nonwear::{Choi, NonwearDetector, VanHees},
    periods::{ConsecutiveEpochs, SleepPeriodDetector, TudorLocke},
};

pub type Constructor<T> = fn() -> Box<T>;

pub type ClassifierFactory = AlgorithmFactory<dyn SleepScoringAlgorithm>;
pub type NonwearAlgorithmFactory = AlgorithmFactory<dyn NonwearDetector>;
pub type SleepPeriodDetectorFactory = AlgorithmFactory<dyn SleepPeriodDetector>;

struct Registration<T: ?Sized> {
    constructor: Constructor<T>,
    display_name: String,
    params: Parameters,
}

/// Table of algorithm constructors keyed by identifier.
pub struct AlgorithmFactory<T: ?Sized> {
    kind: &'static str,
    default_id: String,
    entries: BTreeMap<String, Registration<T>>,
}

impl<T: Configurable + ?Sized> AlgorithmFactory<T> {
    /// An empty table. `default_id` should be registered before `create_default` is used.
    pub fn new(kind: &'static str, default_id: impl Into<String>) -> Self {
        Self {
            kind,
            default_id: default_id.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Adds `id`. `params` are checked against a fresh instance now and applied on every
    /// `create`.
    pub fn register(
        &mut self,
        id: &str,
        constructor: Constructor<T>,
        display_name: &str,
        params: Parameters,
    ) -> Result<()> {
        if self.entries.contains_key(id) {
            return Err(ActisleepError::DuplicateRegistration {
                kind: self.kind,
                id: id.to_owned(),
            });
        }

        constructor().set_parameters(&params)?;
        self.insert(id, constructor, display_name, params);
        info!("registered {} `{id}`", self.kind);
        Ok(())
    }

    fn insert(
        &mut self,
        id: &str,
        constructor: Constructor<T>,
        display_name: &str,
        params: Parameters,
    ) {
        self.entries.insert(
            id.to_owned(),
            Registration {
                constructor,
                display_name: display_name.to_owned(),
                params,
            },
        );
    }

    pub fn create(&self, id: &str) -> Result<Box<T>> {
        self.create_with(id, &Parameters::new())
    }

    /// Creates `id` and applies `overrides` on top of its registered parameters.
    pub fn create_with(&self, id: &str, overrides: &Parameters) -> Result<Box<T>> {
        let registration = self
            .entries
            .get(id)
            .ok_or_else(|| ActisleepError::UnknownAlgorithm {
                kind: self.kind,
                id: id.to_owned(),
            })?;

        let mut instance = (registration.constructor)();
        if !registration.params.is_empty() {
            instance.set_parameters(&registration.params)?;
        }
        if !overrides.is_empty() {
            instance.set_parameters(overrides)?;
        }
        debug!("created {} `{id}` as `{}`", self.kind, instance.identifier());
        Ok(instance)
    }

    pub fn create_default(&self) -> Result<Box<T>> {
        self.create(&self.default_id)
    }

    /// Identifier to display name.
    pub fn get_available(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(id, r)| (id.clone(), r.display_name.clone()))
            .collect()
    }

    pub fn get_default_id(&self) -> &str {
        &self.default_id
    }

    pub fn set_default_id(&mut self, id: &str) -> Result<()> {
        if !self.is_registered(id) {
            return Err(ActisleepError::UnknownAlgorithm {
                kind: self.kind,
                id: id.to_owned(),
            });
        }
        self.default_id = id.to_owned();
        Ok(())
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}

impl ClassifierFactory {
    pub fn with_builtins() -> Self {
        let mut factory = Self::new("classifier", SadehPreset::ActiLife.identifier());
        for preset in [SadehPreset::ActiLife, SadehPreset::Original] {
            let mut params = Parameters::new();
            params.insert("threshold".into(), preset.threshold().into());
            factory.insert(
                preset.identifier(),
                || Box::new(Sadeh::default()),
                preset.display_name(),
                params,
            );
        }
        factory.insert(
            ColeKripke::IDENTIFIER,
            || Box::new(ColeKripke),
            "Cole-Kripke (1992)",
            Parameters::new(),
        );
        factory
    }
}

impl NonwearAlgorithmFactory {
    pub fn with_builtins() -> Self {
        let mut factory = Self::new("nonwear detector", Choi::IDENTIFIER);
        factory.insert(
            Choi::IDENTIFIER,
            || Box::new(Choi),
            "Choi (2011)",
            Parameters::new(),
        );
        factory.insert(
            VanHees::IDENTIFIER,
            || Box::new(VanHees::default()),
            "van Hees (2013)",
            Parameters::new(),
        );
        factory
    }
}

impl SleepPeriodDetectorFactory {
    pub fn with_builtins() -> Self {
        let mut factory = Self::new("sleep period detector", ConsecutiveEpochs::ONSET3S_OFFSET5S);
        factory.insert(
            ConsecutiveEpochs::ONSET3S_OFFSET5S,
            || Box::new(ConsecutiveEpochs::onset3s_offset5s()),
            "Consecutive 3S/5S",
            Parameters::new(),
        );
        factory.insert(
            ConsecutiveEpochs::ONSET5S_OFFSET10S,
            || Box::new(ConsecutiveEpochs::onset5s_offset10s()),
            "Consecutive 5S/10S",
            Parameters::new(),
        );
        factory.insert(
            TudorLocke::IDENTIFIER,
            || Box::new(TudorLocke::default()),
            "Tudor-Locke (2014)",
            Parameters::new(),
        );
        factory
    }
}

static CLASSIFIERS: LazyLock<RwLock<ClassifierFactory>> =
    LazyLock::new(|| RwLock::new(ClassifierFactory::with_builtins()));

static NONWEAR_DETECTORS: LazyLock<RwLock<NonwearAlgorithmFactory>> =
    LazyLock::new(|| RwLock::new(NonwearAlgorithmFactory::with_builtins()));

static PERIOD_DETECTORS: LazyLock<RwLock<SleepPeriodDetectorFactory>> =
    LazyLock::new(|| RwLock::new(SleepPeriodDetectorFactory::with_builtins()));

/// Process-wide classifier table, populated with the built-ins on first access.
pub fn classifiers() -> &'static RwLock<ClassifierFactory> {
    &CLASSIFIERS
}

pub fn nonwear_detectors() -> &'static RwLock<NonwearAlgorithmFactory> {
    &NONWEAR_DETECTORS
}

pub fn period_detectors() -> &'static RwLock<SleepPeriodDetectorFactory> {
    &PERIOD_DETECTORS
}
