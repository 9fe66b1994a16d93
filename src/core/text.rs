//! Natural-language profiles of candidates and jobs, fed to text similarity.

use crate::models::columns;
use crate::models::Row;

/// Join the trimmed, non-empty fields with `" | "`, `None` if there are none
pub fn build_text(fields: &[Option<&str>]) -> Option<String> {
    let parts: Vec<&str> = fields
        .iter()
        .flatten()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

fn finish(parts: Vec<String>) -> String {
    // No parts gives "" and not a lone ".", so an empty description is
    // recognized as empty and scores 0.0 similarity
    if parts.is_empty() {
        String::new()
    } else {
        format!("{}.", parts.join(". "))
    }
}

/// Describe a candidate: education, sector, last role, experience, skills
pub fn candidate_text(row: &Row<'_>) -> String {
    let mut parts = Vec::new();

    match (row.get(columns::STUDY_TITLE), row.get(columns::STUDY_AREA)) {
        (Some(title), Some(area)) => parts.push(format!("{} in {}", title, area)),
        (Some(title), None) => parts.push(format!("Studied {}", title)),
        (None, Some(area)) => parts.push(format!("Studied in {}", area)),
        (None, None) => {}
    }

    if let Some(sector) = row.get(columns::SECTOR) {
        parts.push(format!("Worked in the {} sector", sector));
    }
    if let Some(role) = row.get(columns::LAST_ROLE) {
        parts.push(format!("Last held the role of {}", role));
    }
    if let Some(years) = row.get(columns::YEARS_EXPERIENCE) {
        parts.push(format!("with {} years of experience", years));
    }
    if let Some(tags) = row.get(columns::TAG) {
        parts.push(format!("Key skills include: {}", tags));
    }

    finish(parts)
}

/// Describe a job opening: title, department, context, requirements
pub fn job_text(row: &Row<'_>) -> String {
    let mut parts = Vec::new();

    let labelled = [
        (columns::JOB_TITLE, "Job title"),
        (columns::JOB_FAMILY, "Department"),
        (columns::RECRUITMENT_REQUEST, "Recruitment context"),
        (columns::JOB_DESCRIPTION, "Job description"),
        (columns::CANDIDATE_PROFILE, "Ideal candidate profile"),
    ];
    for (column, label) in labelled {
        if let Some(value) = row.get(column) {
            parts.push(format!("{}: {}", label, value));
        }
    }

    match (row.get(columns::STUDY_LEVEL), row.get(columns::STUDY_AREA_REQUIRED)) {
        (Some(level), Some(area)) => {
            parts.push(format!("Educational requirement: {} in {}", level, area))
        }
        (Some(level), None) => parts.push(format!("Educational requirement: {}", level)),
        (None, Some(area)) => parts.push(format!("Field of study required: {}", area)),
        (None, None) => {}
    }

    if let Some(years) = row.get(columns::YEARS_EXPERIENCE_REQUIRED) {
        parts.push(format!("Requires {} years of experience", years));
    }

    finish(parts)
}

/// Professional background of a candidate: sector and last role
pub fn candidate_background(row: &Row<'_>) -> Option<String> {
    build_text(&[row.get(columns::SECTOR), row.get(columns::LAST_ROLE)])
}

/// Professional area of a job: family and title
pub fn job_background(row: &Row<'_>) -> Option<String> {
    build_text(&[row.get(columns::JOB_FAMILY), row.get(columns::JOB_TITLE)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dataset;

    fn one_row(pairs: &[(&str, &str)]) -> Dataset {
        Dataset::from_rows(
            pairs.iter().map(|(c, _)| c.to_string()).collect(),
            vec![pairs.iter().map(|(_, v)| Some(v.to_string())).collect()],
        )
        .unwrap()
    }

    #[test]
    fn test_build_text() {
        assert_eq!(build_text(&[Some(" IT "), None, Some("Developer")]), Some("IT | Developer".to_string()));
        assert_eq!(build_text(&[Some("  "), None]), None);
    }

    #[test]
    fn test_candidate_text() {
        let ds = one_row(&[
            ("study_title", "Five-year degree"),
            ("study_area", "Engineering"),
            ("sector", "Automotive"),
            ("years_experience", "[3-5]"),
        ]);
        assert_eq!(
            candidate_text(&ds.row(0)),
            "Five-year degree in Engineering. Worked in the Automotive sector. with [3-5] years of experience."
        );
    }

    #[test]
    fn test_candidate_text_area_only() {
        let ds = one_row(&[("study_area", "Law")]);
        assert_eq!(candidate_text(&ds.row(0)), "Studied in Law.");
    }

    #[test]
    fn test_job_text() {
        let ds = one_row(&[
            ("job_title_hiring", "Data Analyst"),
            ("study_area_1", "Statistics"),
            ("years_experience_1", "[1-3]"),
        ]);
        assert_eq!(
            job_text(&ds.row(0)),
            "Job title: Data Analyst. Field of study required: Statistics. Requires [1-3] years of experience."
        );
    }

    #[test]
    fn test_empty_row_gives_empty_text() {
        let ds = one_row(&[("other", "x")]);
        assert_eq!(job_text(&ds.row(0)), "");
        assert_eq!(candidate_text(&ds.row(0)), "");
        assert_eq!(candidate_background(&ds.row(0)), None);
    }
}
