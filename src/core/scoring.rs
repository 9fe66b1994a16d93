//! Candidate/job match scores computed from structured fields.

/// Study levels from lowest to highest
pub const STUDY_LEVELS: [&str; 7] = [
    "middle school diploma",
    "high school graduation",
    "professional qualification",
    "three-year degree",
    "five-year degree",
    "master's degree",
    "doctorate",
];

/// Scale used for a salary outside a range with no usable width or minimum
const FALLBACK_SALARY_SCALE: f64 = 1000.0;

/// Maximum value of the raw `overall` performance rating
pub const OVERALL_RATING_MAX: f64 = 5.0;

fn study_rank(level: &str) -> Option<usize> {
    let level = level.trim().to_lowercase();
    STUDY_LEVELS.iter().position(|l| *l == level)
}

/// Signed distance between the candidate's and the required study level
///
/// `(rank(candidate) - rank(required)) / 6`, so a doctorate applying for a
/// middle-school role scores 1.0 and the reverse scores -1.0. Unknown or
/// missing levels give `None`.
pub fn study_title_score(candidate_level: Option<&str>, required_level: Option<&str>) -> Option<f64> {
    let candidate = study_rank(candidate_level?)? as f64;
    let required = study_rank(required_level?)? as f64;
    let max_distance = (STUDY_LEVELS.len() - 1) as f64;
    Some((candidate - required) / max_distance)
}

/// Global range of two experience columns, 1.0 when degenerate or empty
pub fn experience_range(candidate: &[Option<f64>], required: &[Option<f64>]) -> f64 {
    let (min, max) = candidate
        .iter()
        .chain(required)
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if min.is_finite() && max.is_finite() && max > min {
        max - min
    } else {
        1.0
    }
}

/// Signed experience surplus relative to the global experience range
///
/// No requirement scores 0.0; an unknown candidate experience against a
/// stated requirement is `None`.
pub fn experience_match_score(candidate: Option<f64>, required: Option<f64>, range: f64) -> Option<f64> {
    let Some(required) = required else {
        return Some(0.0);
    };
    Some((candidate? - required) / range)
}

/// How well a salary fits the offered band
///
/// 1.0 inside `[min, max]`; outside, the signed distance to the nearest bound
/// scaled by the band width, or by the minimum when the band is empty.
pub fn salary_fit_score(salary: Option<f64>, min: Option<f64>, max: Option<f64>) -> Option<f64> {
    let (salary, min, max) = (salary?, min?, max?);

    if salary >= min && salary <= max {
        return Some(1.0);
    }

    let distance = if salary < min { salary - min } else { salary - max };
    let width = max - min;
    let scale = if width > 0.0 {
        width
    } else if min > 0.0 {
        min
    } else {
        FALLBACK_SALARY_SCALE
    };

    Some(distance / scale)
}

/// Proximity in (0, 1] from a distance in kilometers: `1 / (d + 1)`
#[inline]
pub fn proximity_score(distance_km: Option<f64>) -> Option<f64> {
    let d = distance_km?;
    if d >= 0.0 {
        Some(1.0 / (d + 1.0))
    } else {
        Some(1.0)
    }
}

/// Mean of the present values, `None` when all are missing
pub fn overall_score(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Raw performance rating scaled to [0, 1]
#[inline]
pub fn scale_overall_rating(rating: Option<f64>) -> Option<f64> {
    rating.map(|r| r / OVERALL_RATING_MAX)
}
