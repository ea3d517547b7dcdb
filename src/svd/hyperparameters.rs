use crate::error::TrainError;
use crate::Rating;

const DEFAULT_N_FACTORS: usize = 100;
const DEFAULT_N_EPOCHS: usize = 20;
const DEFAULT_LR_ALL: f64 = 0.005;
const DEFAULT_REG_ALL: f64 = 0.02;
const DEFAULT_INIT_STD: f64 = 0.1;
const DEFAULT_SEED: u64 = 42;

#[derive(Clone, Debug, PartialEq)]
pub struct Hyperparameters {
    pub n_factors: usize,
    pub n_epochs: usize,
    pub lr_all: f64,
    pub reg_all: f64,
    pub init_mean: f64,
    pub init_std: f64,
    pub rating_min: Rating,
    pub rating_max: Rating,
    /// Refuse to score users or movies that were absent from the training set
    /// instead of falling back to the baseline.
    pub strict_unknowns: bool,
    pub seed: u64,
    pub show_progress: bool,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters {
            n_factors: DEFAULT_N_FACTORS,
            n_epochs: DEFAULT_N_EPOCHS,
            lr_all: DEFAULT_LR_ALL,
            reg_all: DEFAULT_REG_ALL,
            init_mean: 0.0,
            init_std: DEFAULT_INIT_STD,
            rating_min: 0.5,
            rating_max: 5.0,
            strict_unknowns: false,
            seed: DEFAULT_SEED,
            show_progress: false,
        }
    }
}

impl Hyperparameters {
    pub fn validate(&self) -> Result<(), TrainError> {
        let invalid = |message: String| Err(TrainError::InvalidHyperparameter(message));

        if self.n_factors == 0 {
            return invalid("n_factors must be at least 1".to_string());
        }
        if !(self.lr_all.is_finite() && self.lr_all > 0.0) {
            return invalid(format!("lr_all must be positive, got {}", self.lr_all));
        }
        if !(self.reg_all.is_finite() && self.reg_all >= 0.0) {
            return invalid(format!("reg_all must be non-negative, got {}", self.reg_all));
        }
        if !(self.init_std.is_finite() && self.init_std >= 0.0) || !self.init_mean.is_finite() {
            return invalid(format!(
                "init_mean/init_std must be finite with init_std >= 0, got {}/{}",
                self.init_mean, self.init_std
            ));
        }
        if !(self.rating_min.is_finite()
            && self.rating_max.is_finite()
            && self.rating_min < self.rating_max)
        {
            return invalid(format!(
                "rating scale must satisfy min < max, got ({}, {})",
                self.rating_min, self.rating_max
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod hyperparameters_test {
    use super::*;

    #[test]
    fn should_accept_defaults() {
        assert!(Hyperparameters::default().validate().is_ok());
    }

    #[test]
    fn should_reject_inverted_rating_scale() {
        let hyper = Hyperparameters {
            rating_min: 5.0,
            rating_max: 0.5,
            ..Hyperparameters::default()
        };
        assert!(matches!(
            hyper.validate(),
            Err(TrainError::InvalidHyperparameter(_))
        ));
    }

    #[test]
    fn should_reject_zero_learning_rate_and_factors() {
        let no_lr = Hyperparameters {
            lr_all: 0.0,
            ..Hyperparameters::default()
        };
        let no_factors = Hyperparameters {
            n_factors: 0,
            ..Hyperparameters::default()
        };
        assert!(no_lr.validate().is_err());
        assert!(no_factors.validate().is_err());
    }
}
