use thiserror::Error;

use crate::codec::CompositeKey;
use crate::{MovieId, UserId};

/// An `Id` value that could not be split into two non-negative integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed key {raw:?}: {reason}")]
pub struct MalformedKeyError {
    pub raw: String,
    pub reason: MalformedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("missing '_' separator")]
    MissingSeparator,
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("{0} is not a decimal number")]
    NotANumber(&'static str),
    #[error("{0} does not fit in 64 bits")]
    OutOfRange(&'static str),
}

impl MalformedKeyError {
    pub(crate) fn missing_separator(raw: &str) -> Self {
        Self::new(raw, MalformedReason::MissingSeparator)
    }

    pub(crate) fn empty_component(raw: &str, component: &'static str) -> Self {
        Self::new(raw, MalformedReason::Empty(component))
    }

    pub(crate) fn not_a_number(raw: &str, component: &'static str) -> Self {
        Self::new(raw, MalformedReason::NotANumber(component))
    }

    pub(crate) fn out_of_range(raw: &str, component: &'static str) -> Self {
        Self::new(raw, MalformedReason::OutOfRange(component))
    }

    fn new(raw: &str, reason: MalformedReason) -> Self {
        MalformedKeyError {
            raw: raw.to_string(),
            reason,
        }
    }

    /// Name of the offending half of the key, if the separator was found.
    pub fn component(&self) -> Option<&'static str> {
        match self.reason {
            MalformedReason::MissingSeparator => None,
            MalformedReason::Empty(component)
            | MalformedReason::NotANumber(component)
            | MalformedReason::OutOfRange(component) => Some(component),
        }
    }
}

/// Why a predictor could not score a single `(user, movie)` pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("user {0} was not seen during training")]
    UnknownUser(UserId),
    #[error("movie {0} was not seen during training")]
    UnknownMovie(MovieId),
    #[error("estimate is not a finite number: {0}")]
    NonFinite(f64),
    #[error("{0}")]
    Other(String),
}

/// The batch runner stopped at `key`, found at `position` in the input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("prediction failed for key {key} at position {position}: {source}")]
pub struct PredictionError {
    pub position: usize,
    pub key: CompositeKey,
    #[source]
    pub source: EstimateError,
}

#[derive(Debug, Error)]
#[error("could not start {num_workers} prediction workers: {message}")]
pub struct WorkerPoolError {
    pub num_workers: usize,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("cannot fit a model on an empty training set")]
    EmptyTrainingSet,
    #[error("invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value {0}")]
    Missing(String),
    #[error("invalid configuration value {path}: {message}")]
    Invalid { path: String, message: String },
    #[error("cannot load configuration file {path}: {message}")]
    File { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("submission row {row}: {source}")]
    Malformed {
        row: usize,
        #[source]
        source: MalformedKeyError,
    },
    #[error(transparent)]
    Prediction(#[from] PredictionError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
