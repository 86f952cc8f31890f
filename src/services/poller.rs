//! Recurring poll of the bulk download job's progress.
//!
//! The poller mirrors server state to the UI: it owns the repeating timer,
//! drives Idle -> Running -> Completed/Failed/Idle transitions, and cancels
//! itself once the server reports a terminal status. Cancellation is
//! cooperative: an in-flight progress request is never aborted, and a stray
//! response that raced a cancel is still applied (last write wins) but can
//! never re-arm the timer.

use crate::error::RequestError;
use crate::models::{DownloadJobStatus, JobState};
use crate::services::client::PanelApi;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Client-side view of the job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// UI bindings the poller drives. Implementations render however they like;
/// the poller only pushes data.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Latest progress snapshot, pushed on every successful poll.
    fn progress_updated(&self, status: &DownloadJobStatus);

    /// Enablement of the start/stop controls changed.
    fn controls_changed(&self, start_enabled: bool, stop_enabled: bool);

    /// The user list should be reloaded (fires after a completed job).
    async fn refresh_users(&self);

    /// A user-visible notification.
    fn notify(&self, message: &str);
}

pub struct ProgressPoller {
    api: Arc<dyn PanelApi>,
    sink: Arc<dyn ProgressSink>,
    poll_interval: Duration,
    refresh_delay: Duration,
    /// Generation of the active poll loop; bumping it cancels cooperatively.
    epoch: Arc<AtomicU64>,
    state: Arc<Mutex<PollerState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressPoller {
    pub fn new(
        api: Arc<dyn PanelApi>,
        sink: Arc<dyn ProgressSink>,
        poll_interval: Duration,
        refresh_delay: Duration,
    ) -> Self {
        Self {
            api,
            sink,
            poll_interval,
            refresh_delay,
            epoch: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(PollerState::Idle)),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PollerState {
        *self.state.lock().unwrap()
    }

    /// One immediate progress fetch to pick up a job that was already running
    /// when the panel loaded. Anything other than `running` leaves the poller
    /// idle.
    pub async fn sync(&self) -> Result<(), RequestError> {
        let status = self.api.fetch_download_progress().await?;
        if status.status == JobState::Running {
            tracing::info!("bulk download already running, resuming polling");
            *self.state.lock().unwrap() = PollerState::Running;
            self.sink.controls_changed(false, true);
            self.arm();
        }
        Ok(())
    }

    /// Start the bulk download job and begin polling.
    ///
    /// There is deliberately no client-side guard against a double start: the
    /// server is the source of truth and rejects duplicates, and that error
    /// surfaces to the caller unchanged.
    pub async fn start(&self) -> Result<(), RequestError> {
        self.api.start_download_job().await?;
        *self.state.lock().unwrap() = PollerState::Running;
        self.sink.controls_changed(false, true);
        self.arm();
        self.sink.notify("Bulk download started");
        Ok(())
    }

    /// Stop the job and cancel the recurring poll.
    pub async fn stop(&self) -> Result<(), RequestError> {
        self.api.stop_download_job().await?;
        self.cancel();
        *self.state.lock().unwrap() = PollerState::Idle;
        self.sink.controls_changed(true, false);
        self.sink.notify("Bulk download stopped");
        Ok(())
    }

    /// Hard teardown for the owning controller. Unlike [`stop`], this aborts
    /// the poll task instead of letting it wind down.
    ///
    /// [`stop`]: ProgressPoller::stop
    pub fn shutdown(&self) {
        self.cancel();
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }

    fn cancel(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Spawn a fresh poll loop, superseding any previous one. The old loop is
    /// not aborted; it notices its stale epoch at the next checkpoint and
    /// exits on its own.
    fn arm(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let api = Arc::clone(&self.api);
        let sink = Arc::clone(&self.sink);
        let state = Arc::clone(&self.state);
        let current_epoch = Arc::clone(&self.epoch);
        let poll_interval = self.poll_interval;
        let refresh_delay = self.refresh_delay;

        let handle = tokio::spawn(async move {
            // First tick fires one full interval after arming, the way a
            // recurring timer would.
            let mut ticker = time::interval_at(Instant::now() + poll_interval, poll_interval);
            loop {
                ticker.tick().await;
                if current_epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }

                let status = match api.fetch_download_progress().await {
                    Ok(status) => status,
                    Err(err) => {
                        // A flaky poll is not fatal; keep the timer going.
                        tracing::warn!(error = %err, "progress poll failed");
                        continue;
                    }
                };

                // Applied unconditionally, even if a cancel raced this fetch.
                sink.progress_updated(&status);

                if current_epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }

                if status.status.is_terminal() {
                    *state.lock().unwrap() = match status.status {
                        JobState::Completed => PollerState::Completed,
                        JobState::Failed => PollerState::Failed,
                        _ => PollerState::Idle,
                    };
                    sink.controls_changed(true, false);

                    if status.status == JobState::Completed {
                        // Give the server a moment to finalize files on disk
                        // before the list reflects them.
                        time::sleep(refresh_delay).await;
                        sink.refresh_users().await;
                        sink.notify("Bulk download complete");
                    }
                    break;
                }
            }
        });

        // Replacing the handle drops the old one; its loop exits via the
        // epoch check.
        *self.task.lock().unwrap() = Some(handle);
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }
}
