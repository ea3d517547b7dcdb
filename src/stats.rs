use rayon::prelude::*;
use tracing::info;

use crate::io::RatingTriple;
use crate::{MovieId, Rating, UserId};

pub struct TrainingDataStats {
    pub descriptive_name: String,
    pub qty_ratings: usize,
    pub qty_unique_user_ids: usize,
    pub qty_unique_movie_ids: usize,
    pub mean_rating: Option<Rating>,
    pub min_rating: Option<Rating>,
    pub max_rating: Option<Rating>,
}

impl TrainingDataStats {
    /// True when every observed rating lies on `[rating_min, rating_max]`.
    /// Empty training data trivially fits.
    pub fn fits_rating_scale(&self, rating_min: Rating, rating_max: Rating) -> bool {
        let above_min = self.min_rating.map_or(true, |min| min >= rating_min);
        let below_max = self.max_rating.map_or(true, |max| max <= rating_max);
        above_min && below_max
    }
}

pub fn determine_training_data_statistics(
    descriptive_name: &str,
    training_data: &[RatingTriple],
) -> TrainingDataStats {
    let qty_ratings = training_data.len();

    let mut user_ids: Vec<UserId> = training_data
        .par_iter()
        .map(|(user_id, _movie_id, _rating)| *user_id)
        .collect();
    user_ids.par_sort_unstable();
    user_ids.dedup();
    let qty_unique_user_ids = user_ids.len();

    let mut movie_ids: Vec<MovieId> = training_data
        .par_iter()
        .map(|(_user_id, movie_id, _rating)| *movie_id)
        .collect();
    movie_ids.par_sort_unstable();
    movie_ids.dedup();
    let qty_unique_movie_ids = movie_ids.len();

    let min_rating = training_data
        .par_iter()
        .map(|(_user_id, _movie_id, rating)| *rating)
        .reduce_with(f64::min);
    let max_rating = training_data
        .par_iter()
        .map(|(_user_id, _movie_id, rating)| *rating)
        .reduce_with(f64::max);
    let mean_rating = if qty_ratings > 0 {
        let sum_of_ratings: f64 = training_data
            .par_iter()
            .map(|(_user_id, _movie_id, rating)| *rating)
            .sum();
        Some(sum_of_ratings / qty_ratings as f64)
    } else {
        None
    };

    info!(
        name = descriptive_name,
        qty_ratings,
        qty_unique_user_ids,
        qty_unique_movie_ids,
        ?mean_rating,
        ?min_rating,
        ?max_rating,
        "loaded training data"
    );

    TrainingDataStats {
        descriptive_name: descriptive_name.to_string(),
        qty_ratings,
        qty_unique_user_ids,
        qty_unique_movie_ids,
        mean_rating,
        min_rating,
        max_rating,
    }
}

#[cfg(test)]
mod stats_test {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn should_count_unique_users_and_movies() {
        let data = vec![(1, 10, 4.0), (1, 20, 3.0), (2, 10, 5.0), (3, 30, 0.5)];
        let stats = determine_training_data_statistics("train.csv", &data);

        assert_eq!("train.csv", stats.descriptive_name);
        assert_eq!(4, stats.qty_ratings);
        assert_eq!(3, stats.qty_unique_user_ids);
        assert_eq!(3, stats.qty_unique_movie_ids);
        assert!(approx_eq!(f64, 3.125, stats.mean_rating.unwrap(), ulps = 2));
        assert_eq!(Some(0.5), stats.min_rating);
        assert_eq!(Some(5.0), stats.max_rating);
    }

    #[test]
    fn should_check_ratings_against_scale() {
        let data = vec![(1, 10, 0.5), (2, 20, 5.0)];
        let stats = determine_training_data_statistics("train.csv", &data);
        assert!(stats.fits_rating_scale(0.5, 5.0));
        assert!(!stats.fits_rating_scale(1.0, 5.0));
        assert!(!stats.fits_rating_scale(0.5, 4.0));

        let empty = determine_training_data_statistics("empty", &[]);
        assert!(empty.fits_rating_scale(1.0, 5.0));
    }

    #[test]
    fn should_handle_empty_training_data() {
        let stats = determine_training_data_statistics("empty", &[]);
        assert_eq!(0, stats.qty_ratings);
        assert_eq!(0, stats.qty_unique_user_ids);
        assert!(stats.mean_rating.is_none());
        assert!(stats.min_rating.is_none());
    }
}
