//! Seeded generator of raw hiring records
//!
//! Produces the kind of export the cleaning stage expects: display-style
//! headers, repeated applications per candidate, reused IDs, exact duplicate
//! rows, rows without an ID and single initial-stage contacts. Outcomes carry
//! a deliberate bias on `Sex` so mitigation has something to act on.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{Cell, Dataset, DatasetError};

/// Raw headers, in export order
pub const RAW_HEADERS: [&str; 26] = [
    "ID",
    "Candidate State",
    "Sex",
    "Age Range",
    "Year Of Birth",
    "Residence Italian City",
    "Residence Italian Province",
    "Residence Italian Region",
    "Residence Country",
    "Sector",
    "Last Role",
    "Study Title",
    "Study Area",
    "Years Experience",
    "TAG",
    "Expected RAL",
    "Current RAL",
    "Overall",
    "Job Title Hiring",
    "Job Family Hiring",
    "Recruitment Request",
    "Job Description",
    "Candidate Profile",
    "Study Level",
    "Study Area.1",
    "Years Experience.1",
];

// Appended after the job columns so every header stays unique
const SALARY_HEADERS: [&str; 2] = ["Minimum Ral", "Ral Maximum"];

const STUDY_TITLES: &[&str] = &[
    "Middle school diploma",
    "High school graduation",
    "Professional qualification",
    "Three-year degree",
    "Five-year degree",
    "Master's degree",
    "Doctorate",
];

const STUDY_AREAS: &[&str] = &[
    "Computer Engineering",
    "Statistics",
    "Economics",
    "Business Administration",
    "Mechanical Engineering",
    "Law",
    "Accounting",
    "Literature",
];

const EXPERIENCE_BUCKETS: &[&str] = &["[0-1]", "[1-3]", "[3-5]", "[5-10]", "[+10]"];

const SECTORS: &[(&str, &[&str])] = &[
    ("IT", &["Software Developer", "Data Analyst", "System Administrator"]),
    ("Finance", &["Accountant", "Controller", "Financial Analyst"]),
    ("Retail", &["Store Manager", "Sales Assistant", "Cashier"]),
    ("Manufacturing", &["Production Operator", "Quality Technician", "Maintenance Technician"]),
    ("Logistics", &["Warehouse Operator", "Logistics Coordinator", "Forklift Driver"]),
];

const SKILLS: &[&str] = &[
    "Python", "SQL", "Excel", "Teamwork", "Negotiation", "Problem solving",
    "English", "SAP", "Customer care", "Lean manufacturing", "Java", "Leadership",
];

const CITIES: &[(&str, &str, &str)] = &[
    ("Bologna", "BO", "Emilia-Romagna"),
    ("Imola", "BO", "Emilia-Romagna"),
    ("Modena", "MO", "Emilia-Romagna"),
    ("Parma", "PR", "Emilia-Romagna"),
    ("Ferrara", "FE", "Emilia-Romagna"),
    ("Milano", "MI", "Lombardia"),
    ("Firenze", "FI", "Toscana"),
    ("Roma", "RM", "Lazio"),
    ("Napoli", "NA", "Campania"),
    ("Verona", "VR", "Veneto"),
];

const AGE_RANGES: &[(&str, i32, i32)] = &[
    ("< 20 years", 2005, 2007),
    ("20 - 25 years", 2000, 2004),
    ("26 - 30 years", 1995, 1999),
    ("31 - 35 years", 1990, 1994),
    ("36 - 40 years", 1985, 1989),
    ("40 - 45 years", 1980, 1984),
    ("> 45 years", 1960, 1979),
];

const FINAL_STATES: &[&str] = &["Hired", "Rejected", "Qualified", "Not interested"];
const INITIAL_STATES: &[&str] = &["Imported", "First contact", "In selection"];

struct Job {
    family: &'static str,
    title: &'static str,
    study_area: &'static str,
    study_level: &'static str,
    experience: &'static str,
    min_ral: u32,
    max_ral: u32,
    request: &'static str,
    description: &'static str,
    profile: &'static str,
}

const JOBS: &[Job] = &[
    Job {
        family: "IT",
        title: "Software Developer",
        study_area: "Computer Engineering",
        study_level: "Three-year degree",
        experience: "[1-3]",
        min_ral: 28_000,
        max_ral: 38_000,
        request: "Team expansion",
        description: "Develop and maintain web applications and internal tools",
        profile: "Developer with Java or Python experience who enjoys teamwork",
    },
    Job {
        family: "IT",
        title: "Data Analyst",
        study_area: "Statistics",
        study_level: "Five-year degree",
        experience: "[3-5]",
        min_ral: 32_000,
        max_ral: 42_000,
        request: "New business intelligence project",
        description: "Build reports and dashboards from sales and operations data",
        profile: "Analytical mind with SQL and Python skills",
    },
    Job {
        family: "Finance",
        title: "Controller",
        study_area: "Economics",
        study_level: "Five-year degree",
        experience: "[5-10]",
        min_ral: 40_000,
        max_ral: 55_000,
        request: "Replacement",
        description: "Own budgeting, forecasting and monthly closing",
        profile: "Experienced controller with SAP and Excel skills",
    },
    Job {
        family: "Retail",
        title: "Store Manager",
        study_area: "Business Administration",
        study_level: "High school graduation",
        experience: "[3-5]",
        min_ral: 26_000,
        max_ral: 32_000,
        request: "New store opening",
        description: "Lead the store team and drive sales targets",
        profile: "Leader with customer care and negotiation skills",
    },
    Job {
        family: "Manufacturing",
        title: "Quality Technician",
        study_area: "Mechanical Engineering",
        study_level: "Professional qualification",
        experience: "[1-3]",
        min_ral: 24_000,
        max_ral: 30_000,
        request: "Production increase",
        description: "Run quality checks on the production line",
        profile: "Precise technician familiar with lean manufacturing",
    },
    Job {
        family: "Logistics",
        title: "Logistics Coordinator",
        study_area: "Economics",
        study_level: "High school graduation",
        experience: "[0-1]",
        min_ral: 22_000,
        max_ral: 27_000,
        request: "Seasonal peak",
        description: "Coordinate inbound and outbound shipments",
        profile: "Organized person with good English",
    },
];

struct Candidate {
    id: String,
    sex: &'static str,
    age_range: &'static str,
    year_of_birth: i32,
    city: (&'static str, &'static str, &'static str),
    sector: Option<&'static str>,
    last_role: Option<&'static str>,
    study_title: usize,
    study_area: &'static str,
    experience: usize,
    skills: String,
    expected_ral: u32,
    current_ral: Option<u32>,
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn random_candidate(rng: &mut StdRng, id: String) -> Candidate {
    let (age_range, born_from, born_to) = *pick(rng, AGE_RANGES);
    let (sector, roles) = *pick(rng, SECTORS);
    let has_background = rng.gen_bool(0.9);
    let mut skills: Vec<&str> = SKILLS.choose_multiple(rng, 3).copied().collect();
    skills.sort_unstable();
    let expected_ral = rng.gen_range(20..60) * 1000;

    Candidate {
        id,
        sex: if rng.gen_bool(0.5) { "Male" } else { "Female" },
        age_range,
        year_of_birth: rng.gen_range(born_from..=born_to),
        city: *pick(rng, CITIES),
        sector: has_background.then_some(sector),
        last_role: has_background.then(|| *pick(rng, roles)),
        study_title: rng.gen_range(1..STUDY_TITLES.len()),
        study_area: *pick(rng, STUDY_AREAS),
        experience: rng.gen_range(0..EXPERIENCE_BUCKETS.len()),
        skills: skills.join(", "),
        expected_ral,
        current_ral: rng.gen_bool(0.7).then(|| expected_ral.saturating_sub(rng.gen_range(0..6) * 1000)),
    }
}

/// Hiring outcome: better matches are hired more often, men get a bonus
fn outcome(rng: &mut StdRng, candidate: &Candidate, job: &Job) -> &'static str {
    let area_match = if candidate.study_area == job.study_area { 1.0 } else { 0.0 };
    let required_level = STUDY_TITLES
        .iter()
        .position(|t| *t == job.study_level)
        .unwrap_or(0) as f64;
    let level_gap = (candidate.study_title as f64 - required_level) / 6.0;
    let salary_fit = if candidate.expected_ral <= job.max_ral { 0.5 } else { -0.5 };
    let bias = if candidate.sex == "Male" { 0.8 } else { 0.0 };

    let z = -1.6 + 1.5 * area_match + 1.2 * level_gap + salary_fit + bias;
    if rng.gen_bool(sigmoid(z).clamp(0.0, 1.0)) {
        "Hired"
    } else {
        *pick(rng, &FINAL_STATES[1..])
    }
}

fn application_row(rng: &mut StdRng, c: &Candidate, job: &Job, state: &str) -> Vec<Cell> {
    let text = |s: &str| Some(s.to_string());
    let rating = rng.gen_bool(0.6).then(|| rng.gen_range(1..=5).to_string());

    vec![
        text(c.id.as_str()),
        text(state),
        text(c.sex),
        text(c.age_range),
        Some(c.year_of_birth.to_string()),
        text(c.city.0),
        text(c.city.1),
        text(c.city.2),
        text("Italy"),
        c.sector.map(str::to_string),
        c.last_role.map(str::to_string),
        text(STUDY_TITLES[c.study_title]),
        text(c.study_area),
        text(EXPERIENCE_BUCKETS[c.experience]),
        text(c.skills.as_str()),
        Some(c.expected_ral.to_string()),
        c.current_ral.map(|r| r.to_string()),
        rating,
        text(job.title),
        text(job.family),
        text(job.request),
        text(job.description),
        text(job.profile),
        text(job.study_level),
        text(job.study_area),
        text(job.experience),
        Some(job.min_ral.to_string()),
        Some(job.max_ral.to_string()),
    ]
}

/// Generate roughly `rows` raw application records, reproducibly from `seed`
pub fn generate(rows: usize, seed: u64) -> Result<Dataset, DatasetError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let headers = RAW_HEADERS
        .iter()
        .chain(SALARY_HEADERS.iter())
        .map(|h| h.to_string())
        .collect();
    let mut dataset = Dataset::new(headers)?;

    let mut next_id = 1000u32;
    while dataset.len() < rows {
        next_id += 1;
        let candidate = random_candidate(&mut rng, next_id.to_string());

        // Single early-stage contact without a background: dropped by cleaning
        if candidate.sector.is_none() && rng.gen_bool(0.5) {
            let state = *pick(&mut rng, INITIAL_STATES);
            let job = pick(&mut rng, JOBS);
            let row = application_row(&mut rng, &candidate, job, state);
            dataset.push_row(row)?;
            continue;
        }

        let applications = rng.gen_range(1..=3).min(rows - dataset.len());
        for _ in 0..applications {
            let job = pick(&mut rng, JOBS);
            let state = outcome(&mut rng, &candidate, job);
            let row = application_row(&mut rng, &candidate, job, state);

            // Export glitches
            if rng.gen_bool(0.03) {
                dataset.push_row(row.clone())?;
            }
            if rng.gen_bool(0.02) {
                let mut orphan = row.clone();
                orphan[0] = None;
                dataset.push_row(orphan)?;
            }
            dataset.push_row(row)?;
        }

        // Another person filed under the same ID
        if rng.gen_bool(0.05) && dataset.len() < rows {
            let mut other = random_candidate(&mut rng, candidate.id.clone());
            other.sex = if candidate.sex == "Male" { "Female" } else { "Male" };
            let job = pick(&mut rng, JOBS);
            let state = outcome(&mut rng, &other, job);
            let row = application_row(&mut rng, &other, job, state);
            dataset.push_row(row)?;
        }
    }

    tracing::info!("Generated {} synthetic rows (seed {})", dataset.len(), seed);
    Ok(dataset)
}
