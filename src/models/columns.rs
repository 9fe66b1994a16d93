//! Canonical column names of the hiring dataset, after name normalization.

pub const ID: &str = "id";
pub const CANDIDATE_STATE: &str = "candidate_state";

// Candidate side
pub const SECTOR: &str = "sector";
pub const LAST_ROLE: &str = "last_role";
pub const STUDY_TITLE: &str = "study_title";
pub const STUDY_AREA: &str = "study_area";
pub const YEARS_EXPERIENCE: &str = "years_experience";
pub const TAG: &str = "tag";
pub const EXPECTED_RAL: &str = "expected_ral";
pub const CURRENT_RAL: &str = "current_ral";
pub const OVERALL: &str = "overall";

pub const RESIDENCE_CITY: &str = "residence_italian_city";
pub const RESIDENCE_PROVINCE: &str = "residence_italian_province";
pub const RESIDENCE_REGION: &str = "residence_italian_region";
pub const RESIDENCE_COUNTRY: &str = "residence_country";

/// Residence columns from most to least specific
pub const RESIDENCE_COLUMNS: [&str; 4] = [
    RESIDENCE_CITY,
    RESIDENCE_PROVINCE,
    RESIDENCE_REGION,
    RESIDENCE_COUNTRY,
];

// Protected attributes
pub const SEX: &str = "sex";
pub const AGE_RANGE: &str = "age_range";
pub const YEAR_OF_BIRTH: &str = "year_of_birth";

// Job side
pub const JOB_TITLE: &str = "job_title_hiring";
pub const JOB_FAMILY: &str = "job_family_hiring";
pub const RECRUITMENT_REQUEST: &str = "recruitment_request";
pub const JOB_DESCRIPTION: &str = "job_description";
pub const CANDIDATE_PROFILE: &str = "candidate_profile";
pub const STUDY_LEVEL: &str = "study_level";
pub const STUDY_AREA_REQUIRED: &str = "study_area_1";
pub const YEARS_EXPERIENCE_REQUIRED: &str = "years_experience_1";
pub const MINIMUM_RAL: &str = "minimum_ral";
pub const MAXIMUM_RAL: &str = "ral_maximum";

// Engineered features
pub const YEARS_EXPERIENCE_INT: &str = "years_experience_int";
pub const YEARS_EXPERIENCE_REQUIRED_INT: &str = "years_experience_1_int";
pub const STUDY_TITLE_SCORE: &str = "study_title_score";
pub const EXPERIENCE_MATCH_SCORE: &str = "experience_match_score";
pub const EXPECTED_SALARY_FIT_SCORE: &str = "expected_salary_fit_score";
pub const CURRENT_SALARY_FIT_SCORE: &str = "current_salary_fit_score";
pub const STUDY_AREA_SCORE: &str = "study_area_score";
pub const PROFESSIONAL_SIMILARITY_SCORE: &str = "professional_similarity_score";
pub const CANDIDATE_TEXT: &str = "candidate_text";
pub const JOB_TEXT: &str = "job_text";
pub const NLP_SIMILARITY_SCORE: &str = "nlp_similarity_score";
pub const DISTANCE_KM: &str = "distance_km";
pub const PROXIMITY_SCORE: &str = "proximity_score";
pub const OVERALL_SCALED: &str = "overall_scaled";
pub const OVERALL_SCORE: &str = "overall_score";
