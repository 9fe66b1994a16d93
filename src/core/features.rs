use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{FeatureSettings, GeoSettings};
use crate::core::{
    distance::HqDistance,
    experience::parse_experience,
    scoring::{
        experience_match_score, experience_range, overall_score, proximity_score,
        salary_fit_score, scale_overall_rating, study_title_score,
    },
    similarity::{Analyzer, TextSimilarity},
    text::{candidate_background, candidate_text, job_background, job_text},
};
use crate::models::columns;
use crate::models::{Coordinates, Dataset, DatasetError};
use crate::services::geocoder::{GazetteerGeocoder, GeocodeError, Geocoder};

/// Share of rows with a value for each engineered column
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub rows: usize,
    pub coverage: BTreeMap<String, f64>,
}

/// Adds candidate/job match features to a cleaned hiring dataset
///
/// # Pipeline Stages
/// 1. Parse experience buckets
/// 2. Structured match scores (study level, experience, salary)
/// 3. Text similarity scores (study area, background, full profiles)
/// 4. Distance to headquarters
/// 5. Overall score
pub struct FeatureEngineer<G: Geocoder = GazetteerGeocoder> {
    settings: FeatureSettings,
    hq: HqDistance<G>,
}

impl FeatureEngineer<GazetteerGeocoder> {
    /// Build from settings, loading the gazetteer file when one is configured
    pub fn from_settings(features: &FeatureSettings, geo: &GeoSettings) -> Result<Self, GeocodeError> {
        let geocoder = match &geo.gazetteer_path {
            Some(path) => GazetteerGeocoder::from_csv(path, geo.cache_size)?,
            None => GazetteerGeocoder::with_builtin_places(geo.cache_size),
        };
        let hq = Coordinates::new(geo.hq_latitude, geo.hq_longitude);
        tracing::debug!("Headquarters '{}' at {:?}", geo.hq_name, hq);

        Ok(Self::new(
            features.clone(),
            HqDistance::new(geocoder, hq, geo.distance_method),
        ))
    }
}

impl<G: Geocoder> FeatureEngineer<G> {
    pub fn new(settings: FeatureSettings, hq: HqDistance<G>) -> Self {
        Self { settings, hq }
    }

    /// Add every feature column to the dataset in place
    pub fn run(&self, dataset: &mut Dataset) -> Result<FeatureReport, DatasetError> {
        self.add_experience(dataset)?;
        self.add_structured_scores(dataset)?;
        self.add_text_scores(dataset)?;
        self.add_distance(dataset)?;
        self.add_overall(dataset)?;

        let report = coverage_report(dataset);

        if let Some(keep) = &self.settings.keep_columns {
            let keep: Vec<&str> = keep.iter().map(String::as_str).collect();
            *dataset = dataset.select_columns(&keep);
        }

        tracing::info!(
            "Feature engineering finished: {} rows, {} columns",
            dataset.len(),
            dataset.columns().len()
        );
        Ok(report)
    }

    fn add_experience(&self, dataset: &mut Dataset) -> Result<(), DatasetError> {
        for (source, target) in [
            (columns::YEARS_EXPERIENCE, columns::YEARS_EXPERIENCE_INT),
            (columns::YEARS_EXPERIENCE_REQUIRED, columns::YEARS_EXPERIENCE_REQUIRED_INT),
        ] {
            let parsed: Vec<Option<f64>> = dataset
                .text_column(source)
                .into_iter()
                .map(|v| v.and_then(parse_experience))
                .collect();
            dataset.set_numeric_column(target, parsed)?;
        }
        Ok(())
    }

    fn add_structured_scores(&self, dataset: &mut Dataset) -> Result<(), DatasetError> {
        let study: Vec<Option<f64>> = dataset
            .rows()
            .map(|row| study_title_score(row.get(columns::STUDY_TITLE), row.get(columns::STUDY_LEVEL)))
            .collect();
        dataset.set_numeric_column(columns::STUDY_TITLE_SCORE, study)?;

        let candidate = dataset.numeric_column(columns::YEARS_EXPERIENCE_INT)?;
        let required = dataset.numeric_column(columns::YEARS_EXPERIENCE_REQUIRED_INT)?;
        let range = experience_range(&candidate, &required);
        let experience: Vec<Option<f64>> = candidate
            .iter()
            .zip(&required)
            .map(|(&c, &r)| experience_match_score(c, r, range))
            .collect();
        dataset.set_numeric_column(columns::EXPERIENCE_MATCH_SCORE, experience)?;

        let min = optional_numeric(dataset, columns::MINIMUM_RAL);
        let max = optional_numeric(dataset, columns::MAXIMUM_RAL);
        for (salary_column, target) in [
            (columns::EXPECTED_RAL, columns::EXPECTED_SALARY_FIT_SCORE),
            (columns::CURRENT_RAL, columns::CURRENT_SALARY_FIT_SCORE),
        ] {
            let salary = optional_numeric(dataset, salary_column);
            let fit: Vec<Option<f64>> = salary
                .iter()
                .zip(min.iter().zip(&max))
                .map(|(&s, (&lo, &hi))| salary_fit_score(s, lo, hi))
                .collect();
            dataset.set_numeric_column(target, fit)?;
        }
        Ok(())
    }

    fn add_text_scores(&self, dataset: &mut Dataset) -> Result<(), DatasetError> {
        let cache_size = self.settings.text_cache_size;

        // Study area vs required study area, on character n-grams
        let areas: BTreeSet<&str> = dataset
            .text_column(columns::STUDY_AREA)
            .into_iter()
            .chain(dataset.text_column(columns::STUDY_AREA_REQUIRED))
            .flatten()
            .collect();
        let area_model = TextSimilarity::fit(
            Analyzer::CharNgrams(self.settings.study_area_ngram),
            areas.iter().copied(),
            cache_size,
        );
        let area_scores: Vec<Option<f64>> = dataset
            .rows()
            .map(|row| area_model.score(row.get(columns::STUDY_AREA), row.get(columns::STUDY_AREA_REQUIRED)))
            .collect();
        dataset.set_numeric_column(columns::STUDY_AREA_SCORE, area_scores)?;

        // Professional background vs job family and title
        let backgrounds: Vec<(Option<String>, Option<String>)> = dataset
            .rows()
            .map(|row| (candidate_background(&row), job_background(&row)))
            .collect();
        let background_model = TextSimilarity::fit(
            Analyzer::Word,
            backgrounds
                .iter()
                .flat_map(|(c, j)| [c.as_deref(), j.as_deref()])
                .flatten(),
            cache_size,
        );
        let background_scores: Vec<Option<f64>> = backgrounds
            .iter()
            .map(|(c, j)| background_model.score(c.as_deref(), j.as_deref()))
            .collect();
        dataset.set_numeric_column(columns::PROFESSIONAL_SIMILARITY_SCORE, background_scores)?;

        // Full candidate profile vs full job description
        let candidate_texts: Vec<String> = dataset.rows().map(|row| candidate_text(&row)).collect();
        let job_texts: Vec<String> = dataset.rows().map(|row| job_text(&row)).collect();
        let nlp_model = TextSimilarity::fit(
            Analyzer::Word,
            candidate_texts
                .iter()
                .chain(&job_texts)
                .map(String::as_str)
                .filter(|t| !t.is_empty()),
            cache_size,
        );
        let nlp_scores: Vec<Option<f64>> = candidate_texts
            .iter()
            .zip(&job_texts)
            .map(|(c, j)| {
                if c.is_empty() || j.is_empty() {
                    Some(0.0)
                } else {
                    nlp_model.score(Some(c), Some(j))
                }
            })
            .collect();

        tracing::debug!(
            "Text models: study area {} terms, background {} terms, profile {} terms",
            area_model.vocabulary_size(),
            background_model.vocabulary_size(),
            nlp_model.vocabulary_size()
        );

        dataset.set_column(columns::CANDIDATE_TEXT, candidate_texts.into_iter().map(Some).collect())?;
        dataset.set_column(columns::JOB_TEXT, job_texts.into_iter().map(Some).collect())?;
        dataset.set_numeric_column(columns::NLP_SIMILARITY_SCORE, nlp_scores)?;
        Ok(())
    }

    fn add_distance(&self, dataset: &mut Dataset) -> Result<(), DatasetError> {
        let distances: Vec<Option<f64>> = dataset
            .rows()
            .map(|row| self.hq.distance_for_row(&row))
            .collect();
        let proximity: Vec<Option<f64>> = distances.iter().map(|&d| proximity_score(d)).collect();

        let located = distances.iter().filter(|d| d.is_some()).count();
        if located < distances.len() {
            tracing::warn!(
                "Could not locate {} of {} candidates",
                distances.len() - located,
                distances.len()
            );
        }

        dataset.set_numeric_column(columns::DISTANCE_KM, distances)?;
        dataset.set_numeric_column(columns::PROXIMITY_SCORE, proximity)?;
        Ok(())
    }

    fn add_overall(&self, dataset: &mut Dataset) -> Result<(), DatasetError> {
        if dataset.has_column(columns::OVERALL) {
            let scaled: Vec<Option<f64>> = dataset
                .numeric_column(columns::OVERALL)?
                .into_iter()
                .map(scale_overall_rating)
                .collect();
            dataset.set_numeric_column(columns::OVERALL_SCALED, scaled)?;
        }

        let present: Vec<&str> = self
            .settings
            .overall_columns
            .iter()
            .map(String::as_str)
            .filter(|c| dataset.has_column(c))
            .collect();
        if present.is_empty() {
            tracing::warn!("None of the overall score columns exist; overall score left empty");
        }

        let score_columns = present
            .iter()
            .map(|c| dataset.numeric_column(c))
            .collect::<Result<Vec<_>, _>>()?;
        let overall: Vec<Option<f64>> = (0..dataset.len())
            .map(|i| {
                let values: Vec<Option<f64>> = score_columns.iter().map(|col| col[i]).collect();
                overall_score(&values)
            })
            .collect();
        dataset.set_numeric_column(columns::OVERALL_SCORE, overall)?;
        Ok(())
    }
}

/// Numeric values of a column, all missing when the column is absent
fn optional_numeric(dataset: &Dataset, column: &str) -> Vec<Option<f64>> {
    dataset
        .numeric_column(column)
        .unwrap_or_else(|_| vec![None; dataset.len()])
}

const NUMERIC_FEATURES: [&str; 12] = [
    columns::YEARS_EXPERIENCE_INT,
    columns::YEARS_EXPERIENCE_REQUIRED_INT,
    columns::STUDY_TITLE_SCORE,
    columns::EXPERIENCE_MATCH_SCORE,
    columns::EXPECTED_SALARY_FIT_SCORE,
    columns::CURRENT_SALARY_FIT_SCORE,
    columns::STUDY_AREA_SCORE,
    columns::PROFESSIONAL_SIMILARITY_SCORE,
    columns::NLP_SIMILARITY_SCORE,
    columns::DISTANCE_KM,
    columns::PROXIMITY_SCORE,
    columns::OVERALL_SCORE,
];

fn coverage_report(dataset: &Dataset) -> FeatureReport {
    let rows = dataset.len();
    let coverage = NUMERIC_FEATURES
        .iter()
        .filter_map(|&c| {
            let values = dataset.numeric_column(c).ok()?;
            let present = values.iter().filter(|v| v.is_some()).count();
            let share = if rows > 0 { present as f64 / rows as f64 } else { 0.0 };
            tracing::debug!("{}: {:.1}% populated", c, share * 100.0);
            Some((c.to_string(), share))
        })
        .collect();
    FeatureReport { rows, coverage }
}
