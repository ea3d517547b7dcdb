use std::fs;
use std::fs::File;

use moviesvd::codec::{CompositeKey, KeyCodec};
use moviesvd::error::{EstimateError, PipelineError};
use moviesvd::io;
use moviesvd::pipeline::SubmissionPipeline;
use moviesvd::runner::{BatchRunner, FailurePolicy};
use moviesvd::svd::{Hyperparameters, SvdModel};

const TRAIN_CSV: &str = "userId,movieId,rating,timestamp
1,10,4.0,1518349992
1,20,3.5,1518349993
2,10,2.0,1206238739
2,30,1.5,1206238740
3,20,5.0,1076215539
3,30,4.5,1076215540
";

const SUBMISSION_CSV: &str = "Id,rating
3_10,1.0
1_30,1.0
2_20,1.0
1_10,1.0
";

fn hyper(strict_unknowns: bool) -> Hyperparameters {
    Hyperparameters {
        n_factors: 5,
        n_epochs: 30,
        strict_unknowns,
        ..Hyperparameters::default()
    }
}

#[test]
fn should_score_submission_file_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.csv");
    let submission_path = dir.path().join("sample_submission.csv");
    let output_path = dir.path().join("predictions.csv");
    fs::write(&train_path, TRAIN_CSV).unwrap();
    fs::write(&submission_path, SUBMISSION_CSV).unwrap();

    let ratings = io::read_ratings_from_path(&train_path).unwrap();
    let model = SvdModel::fit(&ratings, hyper(false)).unwrap();
    let outcome = SubmissionPipeline::default()
        .run(
            File::open(&submission_path).unwrap(),
            &model,
            File::create(&output_path).unwrap(),
        )
        .unwrap();
    assert!(outcome.is_complete());

    let written = fs::read_to_string(&output_path).unwrap();
    let mut lines = written.lines();
    assert_eq!(Some("Id,rating"), lines.next());
    let rows: Vec<(String, f64)> = lines
        .map(|line| {
            let (id, rating) = line.split_once(',').unwrap();
            (id.to_string(), rating.parse().unwrap())
        })
        .collect();
    assert_eq!(
        vec!["3_10", "1_30", "2_20", "1_10"],
        rows.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>()
    );
    assert!(rows.iter().all(|(_, rating)| (0.5..=5.0).contains(rating)));

    // the codec reproduces exactly the ids that were read
    let ids = io::read_submission_ids_from_path(&submission_path).unwrap();
    let codec = KeyCodec::new();
    for id in &ids {
        assert_eq!(*id, codec.encode(&codec.decode(id).unwrap()));
    }
}

#[test]
fn should_surface_unknown_movie_with_strict_model() {
    let ratings = io::read_ratings(TRAIN_CSV.as_bytes()).unwrap();
    let model = SvdModel::fit(&ratings, hyper(true)).unwrap();
    let submission = "Id\n1_10\n1_99\n2_20\n1_98\n";

    let fail_fast = SubmissionPipeline::default().predict(
        &io::read_submission_ids(submission.as_bytes()).unwrap(),
        &model,
    );
    match fail_fast {
        Err(PipelineError::Prediction(error)) => {
            assert_eq!(1, error.position);
            assert_eq!(CompositeKey::new(1, 99), error.key);
            assert_eq!(EstimateError::UnknownMovie(99), error.source);
        }
        other => panic!("expected a prediction error, got {:?}", other),
    }

    let collecting = SubmissionPipeline::new(
        KeyCodec::new(),
        BatchRunner::new(FailurePolicy::CollectAndContinue, 2).unwrap(),
    );
    let mut output = Vec::new();
    let outcome = collecting
        .run(submission.as_bytes(), &model, &mut output)
        .unwrap();
    assert_eq!(
        vec![CompositeKey::new(1, 10), CompositeKey::new(2, 20)],
        outcome.records.iter().map(|r| r.key()).collect::<Vec<_>>()
    );
    assert_eq!(
        vec![CompositeKey::new(1, 99), CompositeKey::new(1, 98)],
        outcome.failures.iter().map(|f| f.key).collect::<Vec<_>>()
    );
    assert!(String::from_utf8(output).unwrap().starts_with("Id,rating\n1_10,"));
}
