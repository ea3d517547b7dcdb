//! Train a biased SVD model on movie ratings and score a submission file
//! whose rows are identified by `"<userId>_<movieId>"` keys.
//!
//! ```no_run
//! use moviesvd::pipeline::SubmissionPipeline;
//! use moviesvd::svd::{Hyperparameters, SvdModel};
//!
//! let ratings = moviesvd::io::read_ratings_from_path("train.csv").unwrap();
//! let model = SvdModel::fit(&ratings, Hyperparameters::default()).unwrap();
//! let input = std::fs::File::open("sample_submission.csv").unwrap();
//! let output = std::fs::File::create("predictions.csv").unwrap();
//! SubmissionPipeline::default().run(input, &model, output).unwrap();
//! ```

pub mod codec;
pub mod config;
pub mod config_processors;
pub mod error;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod predictor;
pub mod runner;
pub mod stats;
pub mod svd;

pub type UserId = u64;
pub type MovieId = u64;
pub type Rating = f64;
