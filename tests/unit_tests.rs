// Unit tests for Fairhire

use fairhire::config::{CleaningSettings, DistanceMethod};
use fairhire::core::{
    cleaning::{normalize_column_names, split_duplicate_ids, Cleaner},
    distance::{distance_km, haversine_distance},
    experience::parse_experience,
    fairness::fairness_metrics,
    mitigation::{repair_column, reweighing_weights},
    report::mean_std,
    resampling::stratified_folds,
    scoring::{proximity_score, salary_fit_score, study_title_score},
    similarity::{Analyzer, TextSimilarity},
};
use fairhire::models::{Coordinates, Dataset};

fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
    Dataset::from_rows(
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|r| {
                r.iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .collect()
            })
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(44.4949, 11.3426, 44.4949, 11.3426);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_bologna_to_modena() {
    // Bologna to Modena is approximately 35-40 km
    let distance = haversine_distance(44.4949, 11.3426, 44.6471, 10.9252);
    assert!(distance > 30.0 && distance < 45.0, "got {}", distance);
}

#[test]
fn test_distance_methods_agree() {
    let a = Coordinates::new(44.4949, 11.3426);
    let b = Coordinates::new(41.9028, 12.4964);
    let geodesic = distance_km(DistanceMethod::Geodesic, a, b);
    let haversine = distance_km(DistanceMethod::Haversine, a, b);
    assert!((geodesic - haversine).abs() / haversine < 0.01);
}

#[test]
fn test_normalized_names_have_no_uppercase_or_whitespace() {
    let mut ds = dataset(
        &["ID", " Candidate State ", "Study Area", "Study Area.1", "Ral Maximum", "Età"],
        &[],
    );
    normalize_column_names(&mut ds).unwrap();
    for name in ds.columns() {
        assert!(!name.chars().any(|c| c.is_uppercase() || c.is_whitespace()), "{}", name);
    }
    assert_eq!(ds.columns()[3], "study_area_1");
}

#[test]
fn test_split_ids_separate_invariant_combinations() {
    let mut ds = dataset(
        &["id", "year_of_birth", "sex"],
        &[
            &["7", "1990", "Male"],
            &["7", "1985", "Female"],
            &["7", "1990", "Male"],
            &["8", "1970", "Female"],
        ],
    );
    let invariants = vec!["year_of_birth".to_string(), "sex".to_string()];
    let summary = split_duplicate_ids(&mut ds, &invariants).unwrap();
    assert_eq!(summary.new_ids(), 1);

    let ids = ds.text_column("id");
    assert_eq!(ids, vec![Some("7_2"), Some("7_1"), Some("7_2"), Some("8")]);
}

#[test]
fn test_cleaner_keeps_multi_application_candidates() {
    let mut ds = dataset(
        &["ID", "Candidate State", "Sector", "Year Of Birth", "Sex"],
        &[
            &["1", "Imported", "", "1990", "Male"],
            &["2", "Imported", "", "1980", "Female"],
            &["2", "Hired", "", "1980", "Female"],
            &["3", "First contact", "IT", "1975", "Male"],
        ],
    );
    let report = Cleaner::new(&CleaningSettings::default()).run(&mut ds).unwrap();
    assert_eq!(report.initial_stage_candidates, 1);
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.get(1, "candidate_state"), Some("hired"));
}

#[test]
fn test_experience_buckets() {
    assert_eq!(parse_experience("[1-3]"), Some(2.0));
    assert_eq!(parse_experience("[+10]"), Some(10.0));
    assert_eq!(parse_experience("n/a"), None);
}

#[test]
fn test_structured_scores() {
    assert_eq!(study_title_score(Some("Doctorate"), Some("Doctorate")), Some(0.0));
    assert_eq!(salary_fit_score(Some(30_000.0), Some(20_000.0), Some(40_000.0)), Some(1.0));
    assert_eq!(proximity_score(Some(1.0)), Some(0.5));
}

#[test]
fn test_similarity_scores_in_unit_interval() {
    let texts = [
        "Five-year degree in Computer Engineering",
        "Software developer with Java experience",
        "Accounting",
        "Retail store manager",
        "",
        "!!!",
    ];
    for analyzer in [Analyzer::Word, Analyzer::CharNgrams(3)] {
        let sim = TextSimilarity::fit(analyzer, texts, 16);
        for a in texts {
            for b in texts {
                let score = sim.score(Some(a), Some(b)).unwrap();
                assert!((0.0..=1.0).contains(&score), "{:?}: {} vs {} = {}", analyzer, a, b, score);
            }
        }
    }
}

#[test]
fn test_stratified_folds_partition() {
    let labels: Vec<bool> = (0..50).map(|i| i % 5 == 0).collect();
    let folds = stratified_folds(&labels, 5, 42);
    let mut seen: Vec<usize> = folds.into_iter().flatten().collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..50).collect::<Vec<_>>());
}

#[test]
fn test_disparate_impact_level_zero_identity() {
    let values = [0.3, 0.9, -1.2, 4.0];
    assert_eq!(repair_column(&values, &[0, 1, 0, 1], 0.0), values.to_vec());
}

#[test]
fn test_reweighing_independence() {
    let groups = [0, 0, 0, 1, 1, 1];
    let labels = [true, true, false, false, false, true];
    let w = reweighing_weights(&groups, &labels, 1.0);
    let positive_weight = |g: usize| -> f64 {
        (0..6).filter(|&i| groups[i] == g && labels[i]).map(|i| w[i]).sum::<f64>()
            / (0..6).filter(|&i| groups[i] == g).map(|i| w[i]).sum::<f64>()
    };
    assert!((positive_weight(0) - positive_weight(1)).abs() < 1e-12);
}

#[test]
fn test_equal_selection_rates_zero_difference() {
    let m = fairness_metrics(&[true, false, true, false], &[true, false, true, false], &[0, 0, 1, 1]);
    assert_eq!(m.demographic_parity_difference, 0.0);
    assert_eq!(m.equalized_odds_difference, 0.0);
}

#[test]
fn test_mean_std_population() {
    assert_eq!(mean_std(&[1.0, 3.0]), Some((2.0, 1.0)));
}
