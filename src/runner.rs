use std::str::FromStr;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::codec::CompositeKey;
use crate::error::{EstimateError, PredictionError, WorkerPoolError};
use crate::predictor::RatingPredictor;
use crate::{MovieId, Rating, UserId};

/// What the runner does when the predictor cannot score a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the batch at the first failing key.
    #[default]
    FailFast,
    /// Keep scoring and hand back the failures next to the successful records.
    CollectAndContinue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "collect" | "collect_and_continue" => Ok(FailurePolicy::CollectAndContinue),
            other => Err(format!(
                "unknown failure policy '{}', expected 'fail_fast' or 'collect'",
                other
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredictionRecord {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub estimated_rating: Rating,
}

impl PredictionRecord {
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(self.user_id, self.movie_id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PredictionFailure {
    pub position: usize,
    pub key: CompositeKey,
    pub error: EstimateError,
}

/// Result of a collect-and-continue run. Records keep their input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialPredictions {
    pub records: Vec<PredictionRecord>,
    pub failures: Vec<PredictionFailure>,
}

impl PartialPredictions {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Scores an ordered batch of keys against a predictor, one call per key.
#[derive(Clone, Debug)]
pub struct BatchRunner {
    policy: FailurePolicy,
    // present only when more than one worker was requested
    pool: Option<Arc<ThreadPool>>,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::sequential(FailurePolicy::FailFast)
    }
}

impl BatchRunner {
    pub fn sequential(policy: FailurePolicy) -> Self {
        BatchRunner { policy, pool: None }
    }

    /// `num_workers` above one gives the runner its own rayon pool of that
    /// size; zero or one runs the batch on the calling thread.
    pub fn new(policy: FailurePolicy, num_workers: usize) -> Result<Self, WorkerPoolError> {
        if num_workers <= 1 {
            return Ok(Self::sequential(policy));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|index| format!("predict-{}", index))
            .build()
            .map_err(|source| WorkerPoolError {
                num_workers,
                message: source.to_string(),
            })?;
        Ok(BatchRunner {
            policy,
            pool: Some(Arc::new(pool)),
        })
    }

    pub fn num_workers(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, |pool| pool.current_num_threads())
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Runs the batch with the configured policy and parallelism.
    ///
    /// Under [`FailurePolicy::FailFast`] the first failure is returned as an
    /// error and the `Ok` value never carries failures.
    pub fn execute<P>(
        &self,
        keys: &[CompositeKey],
        predictor: &P,
    ) -> Result<PartialPredictions, PredictionError>
    where
        P: RatingPredictor + Sync + ?Sized,
    {
        let parallel = self.pool.is_some();
        debug!(
            qty_keys = keys.len(),
            policy = ?self.policy,
            parallel,
            "starting prediction batch"
        );
        let outcome = match (self.policy, parallel) {
            (FailurePolicy::FailFast, false) => self.run(keys, predictor).map(|records| {
                PartialPredictions {
                    records,
                    failures: Vec::new(),
                }
            }),
            (FailurePolicy::FailFast, true) => {
                self.run_parallel(keys, predictor)
                    .map(|records| PartialPredictions {
                        records,
                        failures: Vec::new(),
                    })
            }
            (FailurePolicy::CollectAndContinue, false) => Ok(self.run_collecting(keys, predictor)),
            (FailurePolicy::CollectAndContinue, true) => {
                Ok(self.run_collecting_parallel(keys, predictor))
            }
        };
        match &outcome {
            Ok(partial) => info!(
                qty_records = partial.records.len(),
                qty_failures = partial.failures.len(),
                "prediction batch finished"
            ),
            Err(error) => warn!(%error, "prediction batch aborted"),
        }
        outcome
    }

    /// Sequential fail-fast run. The predictor is not called for keys after
    /// the first failure.
    pub fn run<P>(
        &self,
        keys: &[CompositeKey],
        predictor: &P,
    ) -> Result<Vec<PredictionRecord>, PredictionError>
    where
        P: RatingPredictor + ?Sized,
    {
        let mut records = Vec::with_capacity(keys.len());
        for (position, key) in keys.iter().enumerate() {
            records.push(score(position, key, predictor)?);
        }
        Ok(records)
    }

    pub fn run_collecting<P>(&self, keys: &[CompositeKey], predictor: &P) -> PartialPredictions
    where
        P: RatingPredictor + ?Sized,
    {
        let mut partial = PartialPredictions::default();
        for (position, key) in keys.iter().enumerate() {
            partial.push(score(position, key, predictor));
        }
        partial
    }

    /// Parallel fail-fast run. Results are gathered by index, so the output
    /// order matches the input order and the reported failure is the one with
    /// the lowest position. Keys after that failure may still have been scored.
    pub fn run_parallel<P>(
        &self,
        keys: &[CompositeKey],
        predictor: &P,
    ) -> Result<Vec<PredictionRecord>, PredictionError>
    where
        P: RatingPredictor + Sync + ?Sized,
    {
        self.score_indexed(keys, predictor).into_iter().collect()
    }

    pub fn run_collecting_parallel<P>(
        &self,
        keys: &[CompositeKey],
        predictor: &P,
    ) -> PartialPredictions
    where
        P: RatingPredictor + Sync + ?Sized,
    {
        let mut partial = PartialPredictions::default();
        for outcome in self.score_indexed(keys, predictor) {
            partial.push(outcome);
        }
        partial
    }

    /// Results are gathered by index, never by completion order.
    fn score_indexed<P>(
        &self,
        keys: &[CompositeKey],
        predictor: &P,
    ) -> Vec<Result<PredictionRecord, PredictionError>>
    where
        P: RatingPredictor + Sync + ?Sized,
    {
        let score_all = || -> Vec<Result<PredictionRecord, PredictionError>> {
            keys.par_iter()
                .enumerate()
                .map(|(position, key)| score(position, key, predictor))
                .collect()
        };
        match &self.pool {
            Some(pool) => pool.install(score_all),
            None => score_all(),
        }
    }
}

impl PartialPredictions {
    fn push(&mut self, outcome: Result<PredictionRecord, PredictionError>) {
        match outcome {
            Ok(record) => self.records.push(record),
            Err(error) => {
                debug!(%error, "collected failure");
                self.failures.push(PredictionFailure {
                    position: error.position,
                    key: error.key,
                    error: error.source,
                });
            }
        }
    }
}

fn score<P>(
    position: usize,
    key: &CompositeKey,
    predictor: &P,
) -> Result<PredictionRecord, PredictionError>
where
    P: RatingPredictor + ?Sized,
{
    predictor
        .estimate(key.user_id, key.movie_id)
        .map(|estimated_rating| PredictionRecord {
            user_id: key.user_id,
            movie_id: key.movie_id,
            estimated_rating,
        })
        .map_err(|source| PredictionError {
            position,
            key: *key,
            source,
        })
}
