use crate::error::EstimateError;
use crate::{MovieId, Rating, UserId};

/// A trained model that scores a single user/movie pair.
///
/// Implementations are read-only once built; the batch runner never mutates
/// them, which is also why the parallel runner only asks for `Sync`.
pub trait RatingPredictor {
    fn estimate(&self, user_id: UserId, movie_id: MovieId) -> Result<Rating, EstimateError>;
}

impl<F> RatingPredictor for F
where
    F: Fn(UserId, MovieId) -> Result<Rating, EstimateError>,
{
    fn estimate(&self, user_id: UserId, movie_id: MovieId) -> Result<Rating, EstimateError> {
        self(user_id, movie_id)
    }
}
