//! End-to-end panel wiring: a completed bulk job must reload the user list.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use user_files_panel::config::PanelConfig;
use user_files_panel::models::{
    DownloadJobStatus, DownloadStats, JobState, PageResult, SortOrder, UserDownloadResult,
    UserFilesLocation, UserRow,
};
use user_files_panel::services::{PanelApi, PollerState, ProgressSink};
use user_files_panel::{Panel, RequestError};

/// Fake server: scripted job lifecycle, and a user list whose `document`
/// flags flip to true once the job has completed.
struct FlowApi {
    progress_script: Mutex<VecDeque<JobState>>,
    completed: AtomicBool,
    page_loads: AtomicUsize,
    progress_calls: AtomicUsize,
}

impl FlowApi {
    fn new(states: &[JobState]) -> Arc<Self> {
        Arc::new(Self {
            progress_script: Mutex::new(states.iter().copied().collect()),
            completed: AtomicBool::new(false),
            page_loads: AtomicUsize::new(0),
            progress_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PanelApi for FlowApi {
    async fn fetch_user_page(
        &self,
        page: u32,
        per_page: u32,
        sort_order: SortOrder,
    ) -> Result<PageResult, RequestError> {
        self.page_loads.fetch_add(1, Ordering::SeqCst);
        let downloaded = self.completed.load(Ordering::SeqCst);
        Ok(PageResult {
            data: vec![UserRow {
                user_id: 45,
                citizenship_id: Some("CIT0045".into()),
                document_files: Some("https://ucarecdn.com/abc/".into()),
                document: downloaded,
                address_files: None,
                address: false,
            }],
            total: 1,
            page,
            per_page,
            total_pages: 1,
            sort_order,
        })
    }

    async fn download_user_files(&self, _user_id: i64) -> Result<UserDownloadResult, RequestError> {
        unreachable!()
    }

    async fn fetch_download_location(
        &self,
        _user_id: i64,
    ) -> Result<UserFilesLocation, RequestError> {
        unreachable!()
    }

    async fn start_download_job(&self) -> Result<(), RequestError> {
        Ok(())
    }

    async fn stop_download_job(&self) -> Result<(), RequestError> {
        Ok(())
    }

    async fn fetch_download_progress(&self) -> Result<DownloadJobStatus, RequestError> {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
        let state = {
            let mut script = self.progress_script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                *script.front().expect("script must not be empty")
            }
        };
        if state == JobState::Completed {
            self.completed.store(true, Ordering::SeqCst);
        }
        Ok(DownloadJobStatus {
            status: state,
            progress_percent: if state == JobState::Completed { 100.0 } else { 50.0 },
            processed_users: 1,
            total_users: 1,
            successful_users: 1,
            failed_users: 0,
            total_files: 2,
            successful_files: 2,
            failed_files: 0,
            skipped_users: 0,
            duration_seconds: 3.0,
        })
    }

    async fn fetch_download_stats(&self) -> Result<DownloadStats, RequestError> {
        unreachable!()
    }
}

#[derive(Default)]
struct RecordingUi {
    notifications: Mutex<Vec<String>>,
    refreshes: AtomicUsize,
}

#[async_trait]
impl ProgressSink for RecordingUi {
    fn progress_updated(&self, _status: &DownloadJobStatus) {}

    fn controls_changed(&self, _start_enabled: bool, _stop_enabled: bool) {}

    async fn refresh_users(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn notify(&self, message: &str) {
        self.notifications.lock().unwrap().push(message.to_string());
    }
}

fn panel_config() -> PanelConfig {
    PanelConfig {
        per_page: 20,
        poll_interval_ms: 1000,
        refresh_delay_ms: 1000,
    }
}

#[tokio::test(start_paused = true)]
async fn completed_job_reloads_the_list_after_the_settle_delay() {
    let api = FlowApi::new(&[JobState::Running, JobState::Completed]);
    let ui = Arc::new(RecordingUi::default());
    let panel = Panel::with_api(
        Arc::clone(&api) as Arc<dyn PanelApi>,
        &panel_config(),
        Arc::clone(&ui) as Arc<dyn ProgressSink>,
    );

    // init: first page load, then the status probe adopts the running job.
    panel.init().await.unwrap();
    assert_eq!(panel.poller().state(), PollerState::Running);
    assert_eq!(api.page_loads.load(Ordering::SeqCst), 1);
    assert!(!panel.list().page_view().unwrap().rows[0].user.document);

    // First timer tick reports completed; the refresh lands one second later.
    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!(panel.poller().state(), PollerState::Completed);
    assert_eq!(api.page_loads.load(Ordering::SeqCst), 2);
    assert_eq!(ui.refreshes.load(Ordering::SeqCst), 1);
    assert!(panel.list().page_view().unwrap().rows[0].user.document);
    assert!(ui
        .notifications
        .lock()
        .unwrap()
        .iter()
        .any(|m| m.contains("complete")));

    // Long after the terminal tick, polling stays dead.
    let polls = api.progress_calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(api.progress_calls.load(Ordering::SeqCst), polls);

    panel.shutdown();
}

#[tokio::test(start_paused = true)]
async fn idle_job_at_startup_never_arms_the_poller() {
    let api = FlowApi::new(&[JobState::Idle]);
    let ui = Arc::new(RecordingUi::default());
    let panel = Panel::with_api(
        Arc::clone(&api) as Arc<dyn PanelApi>,
        &panel_config(),
        Arc::clone(&ui) as Arc<dyn ProgressSink>,
    );

    panel.init().await.unwrap();
    assert_eq!(panel.poller().state(), PollerState::Idle);

    tokio::time::sleep(Duration::from_secs(5)).await;
    // The single probe from init is the only progress call.
    assert_eq!(api.progress_calls.load(Ordering::SeqCst), 1);
    assert_eq!(ui.refreshes.load(Ordering::SeqCst), 0);

    panel.shutdown();
}
