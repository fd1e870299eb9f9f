use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One raw row of the jobs CSV. Every column is optional at this layer;
/// rows without a title and company are filtered out during normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobCsvRow {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub role_category: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub responsibilities: Option<String>,
    #[serde(default)]
    pub required_qualifications: Option<String>,
    #[serde(default)]
    pub preferred_qualifications: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
}

/// A normalized job posting as served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    /// Row position among the kept rows. Only stable while the file is unchanged.
    pub id: String,
    /// Content-derived id that survives reordering of the file.
    pub stable_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub required: Vec<String>,
    pub preferred: Vec<String>,
    pub skills: Vec<String>,
    pub role_category: String,
    pub deadline: String,
}
