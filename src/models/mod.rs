//! Wire types for the up-down user-files API.
//!
//! Field sets mirror what the server actually emits; optional string columns
//! arrive either as `null` or as `""` depending on the handler, so presence
//! checks go through helpers rather than `Option::is_some`.

use serde::{Deserialize, Serialize};

/// Sort direction for the user list, as accepted by `GET /api/users`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the user-files listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: i64,
    #[serde(default)]
    pub citizenship_id: Option<String>,
    /// Uploadcare link for identity documents, if any.
    #[serde(default)]
    pub document_files: Option<String>,
    /// Whether the document files have been downloaded server-side.
    #[serde(default)]
    pub document: bool,
    /// Uploadcare link for address confirmation files, if any.
    #[serde(default)]
    pub address_files: Option<String>,
    /// Whether the address files have been downloaded server-side.
    #[serde(default)]
    pub address: bool,
}

fn present(value: &Option<String>) -> bool {
    matches!(value, Some(v) if !v.trim().is_empty())
}

impl UserRow {
    pub fn has_document_files(&self) -> bool {
        present(&self.document_files)
    }

    pub fn has_address_files(&self) -> bool {
        present(&self.address_files)
    }

    pub fn citizenship_label(&self) -> &str {
        match &self.citizenship_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => "N/A",
        }
    }
}

/// Paginated response from `GET /api/users`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PageResult {
    pub data: Vec<UserRow>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    /// Authoritative sort order; the server normalizes whatever was requested.
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Lifecycle state of the server-side bulk download job.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
}

impl JobState {
    /// States after which the client stops polling. `Paused` is not terminal;
    /// the job can resume server-side.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Idle | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Paused => "paused",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

fn default_job_state() -> JobState {
    JobState::Idle
}

/// Snapshot from `GET /api/download/progress`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DownloadJobStatus {
    #[serde(default = "default_job_state")]
    pub status: JobState,
    #[serde(default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub processed_users: i64,
    #[serde(default)]
    pub total_users: i64,
    #[serde(default)]
    pub successful_users: i64,
    #[serde(default)]
    pub failed_users: i64,
    #[serde(default)]
    pub total_files: i64,
    #[serde(default)]
    pub successful_files: i64,
    #[serde(default)]
    pub failed_files: i64,
    #[serde(default)]
    pub skipped_users: i64,
    #[serde(default)]
    pub duration_seconds: f64,
}

impl DownloadJobStatus {
    /// Progress-bar label, one decimal place ("42.5%").
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.progress_percent)
    }

    /// Elapsed time in the shortest readable unit ("45s", "3m 12s", "1h 5m").
    pub fn human_duration(&self) -> String {
        let seconds = self.duration_seconds;
        if seconds < 60.0 {
            format!("{}s", seconds.round() as i64)
        } else if seconds < 3600.0 {
            let minutes = (seconds / 60.0).floor() as i64;
            let secs = (seconds % 60.0).round() as i64;
            format!("{}m {}s", minutes, secs)
        } else {
            let hours = (seconds / 3600.0).floor() as i64;
            let minutes = ((seconds % 3600.0) / 60.0).floor() as i64;
            format!("{}h {}m", hours, minutes)
        }
    }
}

/// Result of `POST /api/download/user` for a single user.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserDownloadResult {
    pub success: bool,
    pub user_id: i64,
    #[serde(default)]
    pub citizenship_id: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub files_downloaded: u32,
    #[serde(default)]
    pub document_success: bool,
    #[serde(default)]
    pub address_success: bool,
    /// Per-category failure details when only part of the files downloaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response from `GET /api/download` — where a user's files live on disk.
/// The server emits `user_id` as a string here, unlike the listing.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserFilesLocation {
    pub user_id: String,
    #[serde(default)]
    pub citizenship_id: String,
    pub path: String,
}

/// One successful entry of a bulk location lookup, keyed by the numeric id
/// the lookup was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDownloadEntry {
    pub user_id: i64,
    pub path: String,
}

/// Aggregate download coverage from `GET /api/download/stats`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadStats {
    #[serde(default)]
    pub total_users: i64,
    #[serde(default)]
    pub fully_downloaded: i64,
    #[serde(default)]
    pub partially_downloaded: i64,
    #[serde(default)]
    pub not_downloaded: i64,
    #[serde(default)]
    pub remaining: i64,
    #[serde(default)]
    pub progress_percent: f64,
}
