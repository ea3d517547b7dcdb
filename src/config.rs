use std::convert::TryInto;
use std::ffi::OsStr;
use std::fmt::Display;
use std::fs::File;
use std::str::FromStr;

use justconfig::item::ValueExtractor;
use justconfig::sources::env::Env;
use justconfig::sources::text::ConfigText;
use justconfig::ConfPath;
use justconfig::Config;

use crate::config_processors::StripQuotes;
use crate::error::ConfigError;
use crate::runner::FailurePolicy;
use crate::svd::Hyperparameters;

const DEFAULT_OUTPUT_PATH: &str = "predictions.csv";
const DEFAULT_NUM_WORKERS: usize = 1;
const DEFAULT_LOG_LEVEL: &str = "info";

pub struct AppConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub runner: RunnerConfig,
    pub log: LogConfig,
}

pub struct DataConfig {
    pub training_data_path: String,
    pub submission_data_path: String,
    pub output_path: String,
}

pub struct ModelConfig {
    pub hyperparameters: Hyperparameters,
}

pub struct RunnerConfig {
    pub failure_policy: FailurePolicy,
    /// 1 runs the batch sequentially; 0 uses one worker per cpu.
    pub num_workers: usize,
}

pub struct LogConfig {
    pub level: String,
}

/// One configuration section, so lookups can report `section.key` in errors.
struct Section<'a> {
    conf: &'a Config,
    name: &'static str,
    path: ConfPath,
}

impl<'a> Section<'a> {
    fn new(conf: &'a Config, name: &'static str) -> Self {
        Section {
            conf,
            name,
            path: ConfPath::from(&[name]),
        }
    }

    fn raw(&self, key: &str) -> Result<Option<String>, ConfigError> {
        self.conf
            .get(self.path.push(key))
            .strip_quotes()
            .try_value()
            .map_err(|error| self.invalid(key, error))
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.raw(key)?
            .ok_or_else(|| ConfigError::Missing(self.qualified(key)))
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.raw(key)? {
            Some(raw) => raw.trim().parse().map_err(|error| self.invalid(key, error)),
            None => Ok(default),
        }
    }

    fn qualified(&self, key: &str) -> String {
        format!("{}.{}", self.name, key)
    }

    fn invalid(&self, key: &str, error: impl Display) -> ConfigError {
        ConfigError::Invalid {
            path: self.qualified(key),
            message: error.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the optional config file at `config_path`. `TRAINING_DATA`,
    /// `SUBMISSION_DATA`, `OUTPUT_PATH` and `NUM_WORKERS` override its values.
    pub fn new(config_path: &str) -> Result<AppConfig, ConfigError> {
        let mut conf = Config::default();

        // Environment variables take precedence over the config file
        let config_env = Env::new(&[
            (
                ConfPath::from(&["data", "training_data_path"]),
                OsStr::new("TRAINING_DATA"),
            ),
            (
                ConfPath::from(&["data", "submission_data_path"]),
                OsStr::new("SUBMISSION_DATA"),
            ),
            (
                ConfPath::from(&["data", "output_path"]),
                OsStr::new("OUTPUT_PATH"),
            ),
            (
                ConfPath::from(&["runner", "num_workers"]),
                OsStr::new("NUM_WORKERS"),
            ),
        ]);
        conf.add_source(config_env);

        if !config_path.is_empty() {
            let config_file = File::open(config_path).map_err(|error| ConfigError::File {
                path: config_path.to_string(),
                message: error.to_string(),
            })?;
            let config_text =
                ConfigText::new(config_file, config_path).map_err(|error| ConfigError::File {
                    path: config_path.to_string(),
                    message: error.to_string(),
                })?;
            conf.add_source(config_text);
        }

        AppConfig::parse(&conf)
    }

    pub fn parse(conf: &Config) -> Result<AppConfig, ConfigError> {
        Ok(AppConfig {
            data: DataConfig::parse(&Section::new(conf, "data"))?,
            model: ModelConfig::parse(&Section::new(conf, "model"))?,
            runner: RunnerConfig::parse(&Section::new(conf, "runner"))?,
            log: LogConfig::parse(&Section::new(conf, "log"))?,
        })
    }
}

impl DataConfig {
    fn parse(section: &Section) -> Result<DataConfig, ConfigError> {
        Ok(DataConfig {
            training_data_path: section.required("training_data_path")?,
            submission_data_path: section.required("submission_data_path")?,
            output_path: section.parsed_or("output_path", DEFAULT_OUTPUT_PATH.to_string())?,
        })
    }
}

impl ModelConfig {
    fn parse(section: &Section) -> Result<ModelConfig, ConfigError> {
        let defaults = Hyperparameters::default();
        let hyperparameters = Hyperparameters {
            n_factors: section.parsed_or("n_factors", defaults.n_factors)?,
            n_epochs: section.parsed_or("n_epochs", defaults.n_epochs)?,
            lr_all: section.parsed_or("lr_all", defaults.lr_all)?,
            reg_all: section.parsed_or("reg_all", defaults.reg_all)?,
            init_mean: section.parsed_or("init_mean", defaults.init_mean)?,
            init_std: section.parsed_or("init_std", defaults.init_std)?,
            rating_min: section.parsed_or("rating_min", defaults.rating_min)?,
            rating_max: section.parsed_or("rating_max", defaults.rating_max)?,
            strict_unknowns: section.parsed_or("strict_unknowns", defaults.strict_unknowns)?,
            seed: section.parsed_or("seed", defaults.seed)?,
            show_progress: section.parsed_or("show_progress", true)?,
        };
        hyperparameters
            .validate()
            .map_err(|error| section.invalid("*", error))?;
        Ok(ModelConfig { hyperparameters })
    }
}

impl RunnerConfig {
    fn parse(section: &Section) -> Result<RunnerConfig, ConfigError> {
        let num_workers = match section.parsed_or("num_workers", DEFAULT_NUM_WORKERS)? {
            // Detect number of CPUs
            0 => sys_info::cpu_num()
                .ok()
                .and_then(|qty_cpus| qty_cpus.try_into().ok())
                .unwrap_or(DEFAULT_NUM_WORKERS),
            num_workers => num_workers,
        };
        Ok(RunnerConfig {
            failure_policy: section.parsed_or("failure_policy", FailurePolicy::FailFast)?,
            num_workers,
        })
    }
}

impl LogConfig {
    fn parse(section: &Section) -> Result<LogConfig, ConfigError> {
        Ok(LogConfig {
            level: section.parsed_or("level", DEFAULT_LOG_LEVEL.to_string())?,
        })
    }
}
