use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::models::columns;
use crate::models::{ResamplingStrategy, Technique};

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    #[validate(nested)]
    pub cleaning: CleaningSettings,
    #[serde(default)]
    #[validate(nested)]
    pub features: FeatureSettings,
    #[serde(default)]
    #[validate(nested)]
    pub geo: GeoSettings,
    #[serde(default)]
    #[validate(nested)]
    pub experiment: ExperimentSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_input_path")]
    pub input_path: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_input_path() -> String { "data/hiring.csv".to_string() }
fn default_output_dir() -> String { "output".to_string() }

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CleaningSettings {
    /// Columns that must agree across all rows sharing a candidate ID
    #[serde(default = "default_invariant_columns")]
    #[validate(length(min = 1))]
    pub invariant_columns: Vec<String>,
    /// Candidate states considered an early, low-signal stage
    #[serde(default = "default_initial_stages")]
    pub initial_stages: Vec<String>,
}

impl Default for CleaningSettings {
    fn default() -> Self {
        Self {
            invariant_columns: default_invariant_columns(),
            initial_stages: default_initial_stages(),
        }
    }
}

fn default_invariant_columns() -> Vec<String> {
    vec![columns::YEAR_OF_BIRTH.to_string(), columns::SEX.to_string()]
}

fn default_initial_stages() -> Vec<String> {
    vec![
        "imported".to_string(),
        "first contact".to_string(),
        "in selection".to_string(),
    ]
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FeatureSettings {
    /// Character n-gram size used for study area similarity
    #[serde(default = "default_ngram")]
    #[validate(range(min = 1, max = 8))]
    pub study_area_ngram: usize,
    /// Capacity of the text vector cache
    #[serde(default = "default_text_cache_size")]
    #[validate(range(min = 1))]
    pub text_cache_size: usize,
    /// Score columns averaged into the overall score
    #[serde(default = "default_overall_columns")]
    pub overall_columns: Vec<String>,
    /// When set, only these columns are kept in the feature output
    #[serde(default)]
    pub keep_columns: Option<Vec<String>>,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            study_area_ngram: default_ngram(),
            text_cache_size: default_text_cache_size(),
            overall_columns: default_overall_columns(),
            keep_columns: None,
        }
    }
}

fn default_ngram() -> usize { 3 }
fn default_text_cache_size() -> usize { 4096 }

fn default_overall_columns() -> Vec<String> {
    [
        columns::STUDY_AREA_SCORE,
        columns::PROFESSIONAL_SIMILARITY_SCORE,
        columns::NLP_SIMILARITY_SCORE,
        columns::PROXIMITY_SCORE,
        columns::OVERALL_SCALED,
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// Great-circle formula used for distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMethod {
    #[default]
    Geodesic,
    Haversine,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GeoSettings {
    /// CSV file with `location,latitude,longitude` rows
    #[serde(default)]
    pub gazetteer_path: Option<String>,
    #[serde(default = "default_hq_name")]
    pub hq_name: String,
    #[serde(default = "default_hq_latitude")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub hq_latitude: f64,
    #[serde(default = "default_hq_longitude")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub hq_longitude: f64,
    #[serde(default)]
    pub distance_method: DistanceMethod,
    #[serde(default = "default_geo_cache_size")]
    #[validate(range(min = 1))]
    pub cache_size: usize,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            gazetteer_path: None,
            hq_name: default_hq_name(),
            hq_latitude: default_hq_latitude(),
            hq_longitude: default_hq_longitude(),
            distance_method: DistanceMethod::default(),
            cache_size: default_geo_cache_size(),
        }
    }
}

fn default_hq_name() -> String { "Via dei Fornari 12, Bologna, Italy".to_string() }
fn default_hq_latitude() -> f64 { 44.4949 }
fn default_hq_longitude() -> f64 { 11.3426 }
fn default_geo_cache_size() -> usize { 1024 }

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExperimentSettings {
    #[serde(default = "default_protected_attributes")]
    #[validate(length(min = 1))]
    pub protected_attributes: Vec<String>,
    #[serde(default = "default_feature_columns")]
    #[validate(length(min = 1))]
    pub feature_columns: Vec<String>,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    /// Label values (case-insensitive) counted as a positive outcome
    #[serde(default = "default_positive_labels")]
    #[validate(length(min = 1))]
    pub positive_labels: Vec<String>,
    /// Mitigation strengths to sweep, each in [0, 1]
    #[serde(default = "default_levels")]
    #[validate(length(min = 1), custom(function = "validate_levels"))]
    pub levels: Vec<f64>,
    #[serde(default = "default_folds")]
    #[validate(range(min = 2, max = 50))]
    pub folds: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: f64,
    #[serde(default = "default_technique")]
    pub technique: Technique,
    #[serde(default)]
    pub resampling: ResamplingStrategy,
    #[serde(default)]
    #[validate(nested)]
    pub model: ModelSettings,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            protected_attributes: default_protected_attributes(),
            feature_columns: default_feature_columns(),
            label_column: default_label_column(),
            positive_labels: default_positive_labels(),
            levels: default_levels(),
            folds: default_folds(),
            seed: default_seed(),
            threshold: default_threshold(),
            technique: default_technique(),
            resampling: ResamplingStrategy::default(),
            model: ModelSettings::default(),
        }
    }
}

fn default_protected_attributes() -> Vec<String> {
    vec![columns::SEX.to_string(), columns::AGE_RANGE.to_string()]
}

fn default_feature_columns() -> Vec<String> {
    [
        columns::STUDY_TITLE_SCORE,
        columns::EXPERIENCE_MATCH_SCORE,
        columns::EXPECTED_SALARY_FIT_SCORE,
        columns::STUDY_AREA_SCORE,
        columns::PROFESSIONAL_SIMILARITY_SCORE,
        columns::NLP_SIMILARITY_SCORE,
        columns::PROXIMITY_SCORE,
        columns::OVERALL_SCORE,
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

fn default_label_column() -> String { columns::CANDIDATE_STATE.to_string() }
fn default_positive_labels() -> Vec<String> { vec!["hired".to_string()] }
fn default_levels() -> Vec<f64> { vec![0.0, 0.25, 0.5, 0.75, 1.0] }
fn default_folds() -> usize { 5 }
fn default_seed() -> u64 { 42 }
fn default_threshold() -> f64 { 0.5 }
fn default_technique() -> Technique { Technique::DisparateImpactRemover }

fn validate_levels(levels: &Vec<f64>) -> Result<(), ValidationError> {
    if levels.iter().all(|l| (0.0..=1.0).contains(l)) {
        Ok(())
    } else {
        Err(ValidationError::new("levels_out_of_range"))
    }
}

/// Logistic regression hyperparameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModelSettings {
    #[serde(default = "default_learning_rate")]
    #[validate(range(min = 0.0001, max = 10.0))]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    #[validate(range(min = 1, max = 100000))]
    pub epochs: usize,
    #[serde(default = "default_l2")]
    #[validate(range(min = 0.0))]
    pub l2: f64,
    /// Fairness penalty strength of the prejudice remover at level 1
    #[serde(default = "default_prejudice_eta")]
    #[validate(range(min = 0.0))]
    pub prejudice_eta: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
            l2: default_l2(),
            prejudice_eta: default_prejudice_eta(),
        }
    }
}

fn default_learning_rate() -> f64 { 0.1 }
fn default_epochs() -> usize { 500 }
fn default_l2() -> f64 { 0.01 }
fn default_prejudice_eta() -> f64 { 25.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the structs
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with FAIRHIRE__)
    pub fn load() -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., FAIRHIRE__EXPERIMENT__FOLDS -> experiment.folds
            .add_source(env_source())
            .build()?;

        Self::finish(settings)
    }

    /// Load configuration from a custom path, still honouring the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        Self::finish(settings)
    }

    fn finish(settings: Config) -> Result<Self, SettingsError> {
        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("FAIRHIRE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.experiment.folds, 5);
        assert_eq!(settings.experiment.technique, Technique::DisparateImpactRemover);
        assert_eq!(settings.geo.distance_method, DistanceMethod::Geodesic);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "pretty");
    }

    #[test]
    fn test_levels_out_of_range_rejected() {
        let mut settings = Settings::default();
        settings.experiment.levels = vec![0.0, 1.5];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[experiment]\nfolds = 3\ntechnique = \"reweighing\"\nlevels = [0.0, 1.0]\n\n[geo]\ndistance_method = \"haversine\""
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.experiment.folds, 3);
        assert_eq!(settings.experiment.technique, Technique::Reweighing);
        assert_eq!(settings.experiment.levels, vec![0.0, 1.0]);
        assert_eq!(settings.geo.distance_method, DistanceMethod::Haversine);
        // Untouched sections keep their defaults
        assert_eq!(settings.cleaning.initial_stages.len(), 3);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[experiment]\nfolds = 1").unwrap();

        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Validation(_)));
    }
}
