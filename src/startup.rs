//! Panel assembly and lifecycle.
//!
//! `Panel` replaces what the original front-end kept as module-level globals
//! (page cursor, selection set, timer handle) with one controller that has an
//! explicit construction and teardown path, so several instances can coexist
//! and tests can run in isolation.

use crate::config::{Config, PanelConfig};
use crate::error::RequestError;
use crate::models::DownloadJobStatus;
use crate::services::{ApiClient, PanelApi, ProgressPoller, ProgressSink, UserListModel};
use async_trait::async_trait;
use std::sync::Arc;

/// Sink wrapper that reloads the user list before handing the refresh event
/// on to the UI, so a completed job is reflected in the table.
struct ListRefreshSink {
    list: Arc<UserListModel>,
    inner: Arc<dyn ProgressSink>,
}

#[async_trait]
impl ProgressSink for ListRefreshSink {
    fn progress_updated(&self, status: &DownloadJobStatus) {
        self.inner.progress_updated(status);
    }

    fn controls_changed(&self, start_enabled: bool, stop_enabled: bool) {
        self.inner.controls_changed(start_enabled, stop_enabled);
    }

    async fn refresh_users(&self) {
        let page = self.list.current_page();
        if let Err(err) = self.list.load_page(page).await {
            tracing::error!(error = %err, "post-completion list refresh failed");
        }
        self.inner.refresh_users().await;
    }

    fn notify(&self, message: &str) {
        self.inner.notify(message);
    }
}

/// The whole admin panel: API client, list view-model and progress poller,
/// wired together.
pub struct Panel {
    api: Arc<dyn PanelApi>,
    list: Arc<UserListModel>,
    poller: Arc<ProgressPoller>,
}

impl Panel {
    pub fn build(config: &Config, ui: Arc<dyn ProgressSink>) -> Self {
        let api: Arc<dyn PanelApi> = Arc::new(ApiClient::new(config.api.clone()));
        Self::with_api(api, &config.panel, ui)
    }

    /// Assemble the panel around an arbitrary API implementation. Tests use
    /// this to inject fakes.
    pub fn with_api(
        api: Arc<dyn PanelApi>,
        panel: &PanelConfig,
        ui: Arc<dyn ProgressSink>,
    ) -> Self {
        let list = Arc::new(UserListModel::new(Arc::clone(&api), panel.per_page));
        let sink = Arc::new(ListRefreshSink {
            list: Arc::clone(&list),
            inner: ui,
        });
        let poller = Arc::new(ProgressPoller::new(
            Arc::clone(&api),
            sink,
            panel.poll_interval(),
            panel.refresh_delay(),
        ));
        Self { api, list, poller }
    }

    /// Page-load sequence: fetch the first page, then probe the job status so
    /// a download that was already running is picked up. A failed probe is
    /// logged and ignored, like the original page-load check.
    pub async fn init(&self) -> Result<(), RequestError> {
        self.list.load_page(1).await?;
        if let Err(err) = self.poller.sync().await {
            tracing::warn!(error = %err, "initial job status check failed");
        }
        Ok(())
    }

    pub fn api(&self) -> &Arc<dyn PanelApi> {
        &self.api
    }

    pub fn list(&self) -> &Arc<UserListModel> {
        &self.list
    }

    pub fn poller(&self) -> &Arc<ProgressPoller> {
        &self.poller
    }

    pub fn shutdown(&self) {
        self.poller.shutdown();
    }
}
