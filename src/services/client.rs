//! Typed client for the up-down user-files API.
//!
//! One method per endpoint; non-OK statuses become [`RequestError::Server`]
//! carrying the server's `{"error": ...}` message when it sends one.

use crate::config::ApiConfig;
use crate::error::RequestError;
use crate::models::{
    BulkDownloadEntry, DownloadJobStatus, DownloadStats, PageResult, SortOrder, UserDownloadResult,
    UserFilesLocation,
};
use async_trait::async_trait;
use reqwest::Client;

/// Operations the panel needs from the server. The poller and the list
/// view-model depend on this seam, not on the concrete HTTP client.
#[async_trait]
pub trait PanelApi: Send + Sync {
    /// Fetch one page of the user-files listing.
    async fn fetch_user_page(
        &self,
        page: u32,
        per_page: u32,
        sort_order: SortOrder,
    ) -> Result<PageResult, RequestError>;

    /// Ask the server to download one user's files right now.
    async fn download_user_files(&self, user_id: i64) -> Result<UserDownloadResult, RequestError>;

    /// Look up where a user's files live on the server's disk.
    async fn fetch_download_location(&self, user_id: i64)
        -> Result<UserFilesLocation, RequestError>;

    /// Start the bulk download job. The server rejects a second start while
    /// one is running.
    async fn start_download_job(&self) -> Result<(), RequestError>;

    /// Stop the bulk download job.
    async fn stop_download_job(&self) -> Result<(), RequestError>;

    /// Current bulk-job progress snapshot.
    async fn fetch_download_progress(&self) -> Result<DownloadJobStatus, RequestError>;

    /// Aggregate download coverage across all users.
    async fn fetch_download_stats(&self) -> Result<DownloadStats, RequestError>;

    /// Location lookup for a batch of users, one request at a time.
    ///
    /// Per-user failures are logged and skipped; the partial result is always
    /// returned. One broken user must not abort the rest.
    async fn download_all_selected(&self, user_ids: &[i64]) -> Vec<BulkDownloadEntry> {
        let mut entries = Vec::with_capacity(user_ids.len());
        for &user_id in user_ids {
            match self.fetch_download_location(user_id).await {
                Ok(location) => entries.push(BulkDownloadEntry {
                    user_id,
                    path: location.path,
                }),
                Err(err) => {
                    tracing::warn!(user_id, error = %err, "skipping user in bulk location lookup");
                }
            }
        }
        entries
    }
}

/// HTTP implementation of [`PanelApi`] against a single base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PanelApi for ApiClient {
    async fn fetch_user_page(
        &self,
        page: u32,
        per_page: u32,
        sort_order: SortOrder,
    ) -> Result<PageResult, RequestError> {
        let response = self
            .client
            .get(self.url("/api/users"))
            .query(&[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("sort_order", sort_order.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RequestError::from_error_body(
                status,
                &body,
                "failed to load users",
            ));
        }

        let result: PageResult = serde_json::from_str(&body)?;
        tracing::debug!(
            page = result.page,
            total = result.total,
            total_pages = result.total_pages,
            "user page loaded"
        );
        Ok(result)
    }

    async fn download_user_files(&self, user_id: i64) -> Result<UserDownloadResult, RequestError> {
        let response = self
            .client
            .post(self.url("/api/download/user"))
            .query(&[("user_id", user_id.to_string())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RequestError::from_error_body(
                status,
                &body,
                "failed to download user files",
            ));
        }

        let result: UserDownloadResult = serde_json::from_str(&body)?;

        // The server reports partial handler failures with 200 + success=false.
        if !result.success {
            let message = result
                .error
                .clone()
                .unwrap_or_else(|| "failed to download user files".to_string());
            tracing::error!(user_id, message = %message, "user file download rejected");
            return Err(RequestError::Server { status, message });
        }

        tracing::info!(
            user_id,
            files_downloaded = result.files_downloaded,
            path = %result.path,
            "user files downloaded"
        );
        Ok(result)
    }

    async fn fetch_download_location(
        &self,
        user_id: i64,
    ) -> Result<UserFilesLocation, RequestError> {
        let response = self
            .client
            .get(self.url("/api/download"))
            .query(&[("user_id", user_id.to_string())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RequestError::from_error_body(
                status,
                &body,
                "failed to resolve download location",
            ));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn start_download_job(&self) -> Result<(), RequestError> {
        let response = self
            .client
            .post(self.url("/api/download/start"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(RequestError::from_error_body(
                status,
                &body,
                "failed to start download",
            ));
        }

        tracing::info!("bulk download job started");
        Ok(())
    }

    async fn stop_download_job(&self) -> Result<(), RequestError> {
        let response = self
            .client
            .post(self.url("/api/download/stop"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(RequestError::from_error_body(
                status,
                &body,
                "failed to stop download",
            ));
        }

        tracing::info!("bulk download job stopped");
        Ok(())
    }

    async fn fetch_download_progress(&self) -> Result<DownloadJobStatus, RequestError> {
        let response = self
            .client
            .get(self.url("/api/download/progress"))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RequestError::from_error_body(
                status,
                &body,
                "failed to fetch download progress",
            ));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_download_stats(&self) -> Result<DownloadStats, RequestError> {
        let response = self
            .client
            .get(self.url("/api/download/stats"))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RequestError::from_error_body(
                status,
                &body,
                "failed to fetch download stats",
            ));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
