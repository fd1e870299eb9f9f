//! Job catalog: a read-only CSV of postings, reparsed on every request.
//!
//! The file is small and never written at runtime, so there is no cache:
//! every listing and lookup reads the file fresh and either parses all of it or fails.

pub mod handlers;
pub mod models;
pub mod parse;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub use models::{JobCsvRow, JobPosting};
use parse::{parse_list, parse_skills};

const DEFAULT_ROLE_CATEGORY: &str = "Role";
const DEFAULT_DEADLINE: &str = "Open until filled";

/// Namespace for content-derived job ids.
const JOB_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6d6f_636b_7669_6577_8a1e_4c2b_9f03_d5e7);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read job file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse job CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Handle on the jobs CSV file.
#[derive(Debug, Clone)]
pub struct JobCatalog {
    path: PathBuf,
}

impl JobCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every posting, optionally truncated to the first `limit`.
    pub async fn load_jobs(&self, limit: Option<usize>) -> Result<Vec<JobPosting>, CatalogError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogError::Io {
                path: self.path.clone(),
                source,
            })?;

        let mut jobs = parse_jobs(&content)?;
        debug!("Loaded {} jobs from {}", jobs.len(), self.path.display());

        if let Some(limit) = limit {
            jobs.truncate(limit);
        }
        Ok(jobs)
    }

    /// Looks a posting up by positional id or by stable id.
    /// Reloads the whole file on each call.
    pub async fn find_job(&self, id: &str) -> Result<Option<JobPosting>, CatalogError> {
        let id = id.trim();
        let stable = Uuid::parse_str(id).ok();

        let jobs = self.load_jobs(None).await?;
        Ok(jobs
            .into_iter()
            .find(|job| job.id == id || Some(job.stable_id) == stable))
    }
}

/// Parses CSV text into normalized postings.
///
/// Rows missing a title or company are dropped; ids are assigned after the filter,
/// so they are dense and follow file order.
pub fn parse_jobs(csv_text: &str) -> Result<Vec<JobPosting>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.deserialize::<JobCsvRow>() {
        rows.push(record?);
    }

    Ok(rows
        .into_iter()
        .filter(|row| has_text(&row.job_title) && has_text(&row.company_name))
        .enumerate()
        .map(|(index, row)| transform_row(row, index))
        .collect())
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn trimmed(field: Option<&str>) -> String {
    field.map(str::trim).unwrap_or_default().to_string()
}

fn trimmed_or(field: Option<&str>, default: &str) -> String {
    match field.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

fn transform_row(row: JobCsvRow, index: usize) -> JobPosting {
    let title = trimmed(row.job_title.as_deref());
    let company = trimmed(row.company_name.as_deref());
    let description = trimmed(row.job_description.as_deref());
    let role_category = trimmed_or(row.role_category.as_deref(), DEFAULT_ROLE_CATEGORY);

    JobPosting {
        id: index.to_string(),
        stable_id: stable_job_id(&company, &title, &role_category, &description),
        responsibilities: parse_list(row.responsibilities.as_deref()),
        required: parse_list(row.required_qualifications.as_deref()),
        preferred: parse_list(row.preferred_qualifications.as_deref()),
        skills: parse_skills(row.skills.as_deref()),
        deadline: trimmed_or(row.deadline.as_deref(), DEFAULT_DEADLINE),
        title,
        company,
        description,
        role_category,
    }
}

fn stable_job_id(company: &str, title: &str, role_category: &str, description: &str) -> Uuid {
    let key = [company, title, role_category, description].join("\u{1f}");
    Uuid::new_v5(&JOB_ID_NAMESPACE, key.as_bytes())
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::fixtures::JOBS_CSV;
    use super::*;

    #[test]
    fn test_rows_without_title_or_company_are_dropped() {
        let jobs = parse_jobs(JOBS_CSV).unwrap();
        assert_eq!(jobs.len(), 3);
        assert!(jobs
            .iter()
            .all(|j| !j.title.is_empty() && !j.company.is_empty()));
    }

    #[test]
    fn test_ids_are_positional_after_filtering() {
        let jobs = parse_jobs(JOBS_CSV).unwrap();
        let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(jobs[1].company, "Globex");
        assert_eq!(jobs[2].company, "Umbrella");
    }

    #[test]
    fn test_row_normalization() {
        let jobs = parse_jobs(JOBS_CSV).unwrap();
        let acme = &jobs[0];
        assert_eq!(acme.title, "Backend Engineer");
        assert_eq!(acme.responsibilities, vec!["Design APIs", "Run on-call"]);
        assert_eq!(acme.required, vec!["3-5 years Go", "SQL"]);
        assert_eq!(acme.preferred, vec!["Kubernetes"]);
        assert_eq!(acme.skills, vec!["Go", "Rust", "SQL"]);
        assert_eq!(acme.deadline, "2026-12-31");

        let umbrella = &jobs[2];
        assert_eq!(umbrella.role_category, DEFAULT_ROLE_CATEGORY);
        assert_eq!(umbrella.deadline, DEFAULT_DEADLINE);
        assert!(umbrella.responsibilities.is_empty());
    }

    #[test]
    fn test_stable_id_ignores_row_position() {
        let jobs = parse_jobs(JOBS_CSV).unwrap();

        // Move the last (Umbrella) row to the top of the body.
        let (rest, umbrella) = JOBS_CSV.trim_end().rsplit_once('\n').unwrap();
        let (header, body) = rest.split_once('\n').unwrap();
        let shuffled = format!("{header}\n{umbrella}\n{body}\n");

        let shuffled_jobs = parse_jobs(&shuffled).unwrap();
        assert_eq!(shuffled_jobs[0].company, "Umbrella");
        assert_eq!(shuffled_jobs[0].id, "0");
        assert_eq!(shuffled_jobs[0].stable_id, jobs[2].stable_id);
    }

    #[test]
    fn test_stable_ids_are_distinct() {
        let jobs = parse_jobs(JOBS_CSV).unwrap();
        assert_ne!(jobs[0].stable_id, jobs[1].stable_id);
        assert_ne!(jobs[1].stable_id, jobs[2].stable_id);
    }

    #[test]
    fn test_header_only_file_yields_no_jobs() {
        let jobs = parse_jobs("company_name,job_title\n").unwrap();
        assert!(jobs.is_empty());
    }

    fn write_fixture() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(JOBS_CSV.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_twice_yields_identical_mapping() {
        let file = write_fixture();
        let catalog = JobCatalog::new(file.path());

        let first = catalog.load_jobs(None).await.unwrap();
        let second = catalog.load_jobs(None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_load_with_limit() {
        let file = write_fixture();
        let catalog = JobCatalog::new(file.path());

        assert_eq!(catalog.load_jobs(Some(2)).await.unwrap().len(), 2);
        assert_eq!(catalog.load_jobs(Some(0)).await.unwrap().len(), 0);
        assert_eq!(catalog.load_jobs(Some(99)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_job_by_positional_and_stable_id() {
        let file = write_fixture();
        let catalog = JobCatalog::new(file.path());

        let by_index = catalog.find_job("1").await.unwrap().unwrap();
        assert_eq!(by_index.company, "Globex");

        let by_stable = catalog
            .find_job(&by_index.stable_id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_stable, by_index);

        assert!(catalog.find_job("42").await.unwrap().is_none());
        assert!(catalog.find_job("not-an-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let catalog = JobCatalog::new("/nonexistent/jobs-db.csv");
        let err = catalog.load_jobs(None).await.unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
