use std::time::Instant;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use indicatif::ProgressBar;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;
use tracing::{debug, info};

use crate::error::{EstimateError, TrainError};
use crate::io::RatingTriple;
use crate::predictor::RatingPredictor;
use crate::{MovieId, Rating, UserId};

pub mod hyperparameters;

pub use hyperparameters::Hyperparameters;

/// Biased matrix factorization trained with stochastic gradient descent.
///
/// A rating is estimated as `mean + b_u + b_i + q_i . p_u`. Terms belonging to
/// a user or movie absent from the training data are left out, and the result
/// is clipped to the configured rating scale.
#[derive(Debug)]
pub struct SvdModel {
    hyper: Hyperparameters,
    global_mean: f64,
    user_index: HashMap<UserId, usize>,
    movie_index: HashMap<MovieId, usize>,
    user_biases: Vec<f64>,
    movie_biases: Vec<f64>,
    // row-major, `n_factors` columns
    user_factors: Vec<f64>,
    movie_factors: Vec<f64>,
}

impl SvdModel {
    pub fn fit(ratings: &[RatingTriple], hyper: Hyperparameters) -> Result<Self, TrainError> {
        hyper.validate()?;
        if ratings.is_empty() {
            return Err(TrainError::EmptyTrainingSet);
        }

        let start_time = Instant::now();
        let mut user_index: HashMap<UserId, usize> = HashMap::new();
        let mut movie_index: HashMap<MovieId, usize> = HashMap::new();
        let indexed: Vec<(usize, usize, f64)> = ratings
            .iter()
            .map(|&(user_id, movie_id, rating)| {
                let user = dense_index(&mut user_index, user_id);
                let movie = dense_index(&mut movie_index, movie_id);
                (user, movie, rating)
            })
            .collect();
        let global_mean = indexed.iter().map(|&(_, _, rating)| rating).sum::<f64>() / indexed.len() as f64;

        let k = hyper.n_factors;
        let mut rng = Pcg64::seed_from_u64(hyper.seed);
        let normal = Normal::new(hyper.init_mean, hyper.init_std)
            .map_err(|e| TrainError::InvalidHyperparameter(e.to_string()))?;
        let mut user_factors: Vec<f64> = (0..user_index.len() * k)
            .map(|_| normal.sample(&mut rng))
            .collect();
        let mut movie_factors: Vec<f64> = (0..movie_index.len() * k)
            .map(|_| normal.sample(&mut rng))
            .collect();
        let mut user_biases = vec![0.0; user_index.len()];
        let mut movie_biases = vec![0.0; movie_index.len()];

        info!(
            qty_ratings = indexed.len(),
            qty_users = user_index.len(),
            qty_movies = movie_index.len(),
            n_factors = k,
            n_epochs = hyper.n_epochs,
            "fitting svd model"
        );

        let progress = if hyper.show_progress {
            ProgressBar::new(hyper.n_epochs as u64)
        } else {
            ProgressBar::hidden()
        };
        let (lr, reg) = (hyper.lr_all, hyper.reg_all);
        for epoch in 0..hyper.n_epochs {
            for &(user, movie, rating) in indexed.iter() {
                let p_u = &mut user_factors[user * k..(user + 1) * k];
                let q_i = &mut movie_factors[movie * k..(movie + 1) * k];
                let dot: f64 = p_u.iter().zip(q_i.iter()).map(|(p, q)| p * q).sum();
                let err = rating - (global_mean + user_biases[user] + movie_biases[movie] + dot);

                user_biases[user] += lr * (err - reg * user_biases[user]);
                movie_biases[movie] += lr * (err - reg * movie_biases[movie]);
                for (p, q) in p_u.iter_mut().zip(q_i.iter_mut()) {
                    let (p_old, q_old) = (*p, *q);
                    *p += lr * (err * q_old - reg * p_old);
                    *q += lr * (err * p_old - reg * q_old);
                }
            }
            debug!(epoch, "finished epoch");
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!("fitting svd model:{} micros", start_time.elapsed().as_micros());

        Ok(SvdModel {
            hyper,
            global_mean,
            user_index,
            movie_index,
            user_biases,
            movie_biases,
            user_factors,
            movie_factors,
        })
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn num_users(&self) -> usize {
        self.user_index.len()
    }

    pub fn num_movies(&self) -> usize {
        self.movie_index.len()
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyper
    }

    fn factors(factors: &[f64], row: usize, k: usize) -> &[f64] {
        &factors[row * k..(row + 1) * k]
    }
}

impl RatingPredictor for SvdModel {
    fn estimate(&self, user_id: UserId, movie_id: MovieId) -> Result<Rating, EstimateError> {
        let user = self.user_index.get(&user_id).copied();
        let movie = self.movie_index.get(&movie_id).copied();
        if self.hyper.strict_unknowns {
            user.ok_or(EstimateError::UnknownUser(user_id))?;
            movie.ok_or(EstimateError::UnknownMovie(movie_id))?;
        }

        let k = self.hyper.n_factors;
        let mut estimate = self.global_mean;
        if let Some(user) = user {
            estimate += self.user_biases[user];
        }
        if let Some(movie) = movie {
            estimate += self.movie_biases[movie];
        }
        if let (Some(user), Some(movie)) = (user, movie) {
            estimate += Self::factors(&self.user_factors, user, k)
                .iter()
                .zip(Self::factors(&self.movie_factors, movie, k))
                .map(|(p, q)| p * q)
                .sum::<f64>();
        }

        if !estimate.is_finite() {
            return Err(EstimateError::NonFinite(estimate));
        }
        Ok(estimate.clamp(self.hyper.rating_min, self.hyper.rating_max))
    }
}

fn dense_index(index: &mut HashMap<u64, usize>, id: u64) -> usize {
    let next = index.len();
    match index.entry(id) {
        Entry::Occupied(entry) => *entry.get(),
        Entry::Vacant(entry) => *entry.insert(next),
    }
}
