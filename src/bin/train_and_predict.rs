use std::fs::File;
use std::io::BufWriter;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use moviesvd::codec::KeyCodec;
use moviesvd::config::AppConfig;
use moviesvd::io;
use moviesvd::logging::init_logging;
use moviesvd::pipeline::SubmissionPipeline;
use moviesvd::runner::BatchRunner;
use moviesvd::stats::determine_training_data_statistics;
use moviesvd::svd::SvdModel;

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(&config_path).context("Loading configuration failed.")?;
    init_logging(&config.log.level);

    let training_data_path = &config.data.training_data_path;
    info!(path = %training_data_path, "reading training data");
    let ratings = io::read_ratings_from_path(training_data_path)
        .with_context(|| format!("Reading training data {} failed.", training_data_path))?;
    let stats = determine_training_data_statistics(training_data_path, &ratings);
    let hyper = &config.model.hyperparameters;
    if !stats.fits_rating_scale(hyper.rating_min, hyper.rating_max) {
        warn!(
            min_rating = ?stats.min_rating,
            max_rating = ?stats.max_rating,
            rating_min = hyper.rating_min,
            rating_max = hyper.rating_max,
            "training ratings fall outside the model's rating scale, estimates will be clipped"
        );
    }

    let model = SvdModel::fit(&ratings, hyper.clone())?;

    let submission_data_path = &config.data.submission_data_path;
    let ids = io::read_submission_ids_from_path(submission_data_path)
        .with_context(|| format!("Reading submission ids {} failed.", submission_data_path))?;

    let pipeline = SubmissionPipeline::new(
        KeyCodec::new(),
        BatchRunner::new(config.runner.failure_policy, config.runner.num_workers)
            .context("Could not start the prediction thread pool.")?,
    );
    // the output file is only created once the batch has been scored
    let outcome = pipeline.predict(&ids, &model)?;

    let output_path = &config.data.output_path;
    let output = File::create(output_path)
        .with_context(|| format!("Could not create output file {}", output_path))?;
    let qty_written = pipeline.write(&outcome.records, BufWriter::new(output))?;
    info!(qty_written, path = %output_path, "predictions saved");

    if !outcome.is_complete() {
        for failure in &outcome.failures {
            warn!(
                position = failure.position,
                key = %failure.key,
                error = %failure.error,
                "no prediction"
            );
        }
        bail!(
            "{} of {} keys could not be scored; {} is incomplete",
            outcome.failures.len(),
            ids.len(),
            output_path
        );
    }
    Ok(())
}
