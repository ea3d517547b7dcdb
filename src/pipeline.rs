use std::io::{Read, Write};

use tracing::info;

use crate::codec::{CompositeKey, KeyCodec};
use crate::error::PipelineError;
use crate::io;
use crate::predictor::RatingPredictor;
use crate::runner::{BatchRunner, PartialPredictions, PredictionRecord};

/// Decode submission ids, score them, and write the `Id,rating` table.
#[derive(Clone, Debug, Default)]
pub struct SubmissionPipeline {
    codec: KeyCodec,
    runner: BatchRunner,
}

impl SubmissionPipeline {
    pub fn new(codec: KeyCodec, runner: BatchRunner) -> Self {
        SubmissionPipeline { codec, runner }
    }

    /// Decodes every id or stops at the first malformed one. Rows are
    /// numbered from 1, not counting the header.
    pub fn decode_ids<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<CompositeKey>, PipelineError> {
        ids.iter()
            .enumerate()
            .map(|(index, raw)| {
                self.codec
                    .decode(raw.as_ref())
                    .map_err(|source| PipelineError::Malformed {
                        row: index + 1,
                        source,
                    })
            })
            .collect()
    }

    pub fn predict<S, P>(&self, ids: &[S], predictor: &P) -> Result<PartialPredictions, PipelineError>
    where
        S: AsRef<str>,
        P: RatingPredictor + Sync + ?Sized,
    {
        let keys = self.decode_ids(ids)?;
        Ok(self.runner.execute(&keys, predictor)?)
    }

    pub fn write<W: Write>(&self, records: &[PredictionRecord], writer: W) -> Result<usize, PipelineError> {
        let rows = records
            .iter()
            .map(|record| (self.codec.encode(&record.key()), record.estimated_rating));
        Ok(io::write_predictions(writer, rows)?)
    }

    /// Reads ids from `input`, writes the successful predictions to `output`
    /// and returns the full outcome, failures included, to the caller.
    pub fn run<R, W, P>(&self, input: R, predictor: &P, output: W) -> Result<PartialPredictions, PipelineError>
    where
        R: Read,
        W: Write,
        P: RatingPredictor + Sync + ?Sized,
    {
        let ids = io::read_submission_ids(input)?;
        info!(qty_ids = ids.len(), "read submission ids");
        let outcome = self.predict(&ids, predictor)?;
        let qty_written = self.write(&outcome.records, output)?;
        info!(qty_written, "wrote predictions");
        Ok(outcome)
    }
}

#[cfg(test)]
mod pipeline_test {
    use super::*;
    use crate::error::EstimateError;
    use crate::runner::FailurePolicy;
    use crate::{MovieId, Rating, UserId};

    fn stub_predictor(user_id: UserId, movie_id: MovieId) -> Result<Rating, EstimateError> {
        match (user_id, movie_id) {
            (1, 10) => Ok(4.2),
            (1, 20) => Ok(3.7),
            _ => Err(EstimateError::Other(format!("no stub for {}_{}", user_id, movie_id))),
        }
    }

    #[test]
    fn should_produce_submission_table() {
        let input = "Id,rating\n1_10,0.0\n1_20,0.0\n";
        let mut output = Vec::new();

        let outcome = SubmissionPipeline::default()
            .run(input.as_bytes(), &stub_predictor, &mut output)
            .unwrap();

        assert!(outcome.is_complete());
        assert_eq!("Id,rating\n1_10,4.2\n1_20,3.7\n", String::from_utf8(output).unwrap());
    }

    #[test]
    fn should_report_row_of_malformed_id() {
        let ids = vec!["1_10", "1_20", "oops"];
        let error = SubmissionPipeline::default()
            .predict(&ids, &stub_predictor)
            .unwrap_err();
        match error {
            PipelineError::Malformed { row, source } => {
                assert_eq!(3, row);
                assert_eq!("oops", source.raw);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn should_abort_without_output_on_prediction_failure() {
        let input = "Id\n1_10\n2_99\n1_20\n";
        let mut output = Vec::new();

        let error = SubmissionPipeline::default()
            .run(input.as_bytes(), &stub_predictor, &mut output)
            .unwrap_err();

        match error {
            PipelineError::Prediction(error) => {
                assert_eq!(1, error.position);
                assert_eq!(CompositeKey::new(2, 99), error.key);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(output.is_empty());
    }

    #[test]
    fn should_write_successful_rows_when_collecting() {
        let input = "Id\n1_10\n2_99\n1_20\n";
        let mut output = Vec::new();
        let pipeline = SubmissionPipeline::new(
            KeyCodec::new(),
            BatchRunner::sequential(FailurePolicy::CollectAndContinue),
        );

        let outcome = pipeline
            .run(input.as_bytes(), &stub_predictor, &mut output)
            .unwrap();

        assert_eq!(1, outcome.failures.len());
        assert_eq!(CompositeKey::new(2, 99), outcome.failures[0].key);
        assert_eq!("Id,rating\n1_10,4.2\n1_20,3.7\n", String::from_utf8(output).unwrap());
    }
}
