//! Training job launcher and poller
//!
//! `JobTracker` owns at most one active job. Launching a new job cancels the
//! previous poll loop through its `CancellationToken` before the new handle
//! is tracked; nothing is sent to the backend for the abandoned job.
//!
//! Renders from a poll loop and the tracker's own cancel-then-render steps
//! are serialized by a shared gate, so a detached loop cannot draw over the
//! job that replaced it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api;
use crate::client::DashboardApi;
use crate::error::{Result, TransportError};
use crate::types::{HistoryRequest, JobHandle, JobStatus, OperationStatus};
use crate::view::{JobProgress, Presenter};

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Fixed-interval polling policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Stop after this many polls; `None` polls until a terminal status
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Lifecycle phase of the tracked job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    NoJob,
    Queued,
    Running,
    Finished,
    Error,
}

impl JobPhase {
    fn from_status(status: &JobStatus) -> Self {
        match status {
            JobStatus::Finished => Self::Finished,
            JobStatus::Error => Self::Error,
            JobStatus::Queued => Self::Queued,
            // anything else the backend reports is still in flight
            JobStatus::Running | JobStatus::Other(_) => Self::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }
}

/// Observable state of the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub handle: Option<JobHandle>,
    pub phase: JobPhase,
    pub last_status: Option<OperationStatus>,
    pub polls: u32,
}

impl JobSnapshot {
    fn idle() -> Self {
        Self {
            handle: None,
            phase: JobPhase::NoJob,
            last_status: None,
            polls: 0,
        }
    }

    fn queued(handle: JobHandle) -> Self {
        Self {
            handle: Some(handle),
            phase: JobPhase::Queued,
            last_status: None,
            polls: 0,
        }
    }
}

/// How a poll loop ended
#[derive(Debug)]
pub enum JobOutcome {
    Finished(OperationStatus),
    Failed(OperationStatus),
    /// Detached by a newer launch or an explicit cancel
    Cancelled,
    /// A status request failed; the loop does not retry
    PollFailed(TransportError),
    /// `max_attempts` polls returned no terminal status
    Exhausted { attempts: u32 },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

struct ActiveJob {
    handle: JobHandle,
    cancel: CancellationToken,
    task: Option<JoinHandle<JobOutcome>>,
    state: watch::Receiver<JobSnapshot>,
}

/// Launches training jobs and follows the current one to a terminal state
pub struct JobTracker {
    api: Arc<dyn DashboardApi>,
    presenter: Arc<dyn Presenter>,
    policy: PollPolicy,
    active: Option<ActiveJob>,
    render_gate: Arc<Mutex<()>>,
}

fn enter(gate: &Mutex<()>) -> MutexGuard<'_, ()> {
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl JobTracker {
    pub fn new(api: Arc<dyn DashboardApi>, presenter: Arc<dyn Presenter>) -> Self {
        Self::with_policy(api, presenter, PollPolicy::default())
    }

    pub fn with_policy(
        api: Arc<dyn DashboardApi>,
        presenter: Arc<dyn Presenter>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            api,
            presenter,
            policy,
            active: None,
            render_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Start a training job and begin polling it
    ///
    /// If the launch request fails, the tracker is left exactly as it was
    /// (including any loop still running for an earlier job).
    pub async fn launch(&mut self, params: &HistoryRequest) -> Result<JobHandle> {
        let handle = api::launch_training(self.api.as_ref(), params).await?;
        info!("Training job {} accepted for {}", handle, params.symbol);

        let gate = Arc::clone(&self.render_gate);
        {
            let _gate = enter(&gate);
            self.detach("superseded");
            self.presenter
                .render_job(&handle, &JobProgress::from(&OperationStatus::queued()));
        }

        let (tx, rx) = watch::channel(JobSnapshot::queued(handle.clone()));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.api),
            Arc::clone(&self.presenter),
            handle.clone(),
            self.policy,
            cancel.clone(),
            Arc::clone(&self.render_gate),
            tx,
        ));

        self.active = Some(ActiveJob {
            handle: handle.clone(),
            cancel,
            task: Some(task),
            state: rx,
        });
        Ok(handle)
    }

    /// Handle of the tracked job; kept after it reaches a terminal state
    pub fn handle(&self) -> Option<&JobHandle> {
        self.active.as_ref().map(|a| &a.handle)
    }

    /// Current state of the tracked job
    pub fn snapshot(&self) -> JobSnapshot {
        match &self.active {
            Some(active) => active.state.borrow().clone(),
            None => JobSnapshot::idle(),
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.snapshot().phase
    }

    /// Receiver that sees every state change of the tracked job
    pub fn subscribe(&self) -> Option<watch::Receiver<JobSnapshot>> {
        self.active.as_ref().map(|a| a.state.clone())
    }

    /// Stop polling the tracked job; the handle stays readable
    pub fn cancel(&mut self) {
        let _gate = enter(&self.render_gate);
        if let Some(active) = &self.active {
            if !active.cancel.is_cancelled() {
                info!("Stopped tracking training job {}", active.handle);
                active.cancel.cancel();
            }
        }
    }

    /// Wait for the tracked job's poll loop to end
    ///
    /// Returns `None` when there is no job or its outcome was already taken.
    pub async fn wait(&mut self) -> Option<JobOutcome> {
        let task = self.active.as_mut()?.task.take()?;
        match task.await {
            Ok(outcome) => Some(outcome),
            Err(e) if e.is_cancelled() => Some(JobOutcome::Cancelled),
            Err(e) => {
                warn!("Poll loop panicked: {}", e);
                Some(JobOutcome::Cancelled)
            }
        }
    }

    fn detach(&mut self, reason: &str) {
        if let Some(prev) = self.active.take() {
            if !prev.cancel.is_cancelled() && !prev.state.borrow().phase.is_terminal() {
                info!("Abandoning training job {} ({})", prev.handle, reason);
            }
            prev.cancel.cancel();
        }
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}

/// Poll `handle` until a terminal status, an error, cancellation or the
/// attempt cap. Polls are strictly sequential; the first one is immediate.
async fn poll_loop(
    api: Arc<dyn DashboardApi>,
    presenter: Arc<dyn Presenter>,
    handle: JobHandle,
    policy: PollPolicy,
    cancel: CancellationToken,
    render_gate: Arc<Mutex<()>>,
    state: watch::Sender<JobSnapshot>,
) -> JobOutcome {
    let mut attempts: u32 = 0;

    loop {
        if let Some(max) = policy.max_attempts {
            if attempts >= max {
                warn!("Training job {} still not done after {} polls, giving up", handle, attempts);
                return JobOutcome::Exhausted { attempts };
            }
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return JobOutcome::Cancelled,
            res = api::training_status(api.as_ref(), &handle) => res,
        };
        attempts += 1;

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                warn!("Training job {} poll failed: {}", handle, e);
                return JobOutcome::PollFailed(e);
            }
        };

        {
            let _gate = enter(&render_gate);
            // a launch may have detached us while the response was in flight
            if cancel.is_cancelled() {
                return JobOutcome::Cancelled;
            }

            debug!(
                "Training job {}: {} {}%",
                handle,
                status.status,
                status.percent()
            );
            presenter.render_job(&handle, &JobProgress::from(&status));
            state.send_replace(JobSnapshot {
                handle: Some(handle.clone()),
                phase: JobPhase::from_status(&status.status),
                last_status: Some(status.clone()),
                polls: attempts,
            });
        }

        match status.status {
            JobStatus::Finished => {
                info!("Training job {} finished", handle);
                return JobOutcome::Finished(status);
            }
            JobStatus::Error => {
                warn!(
                    "Training job {} failed: {}",
                    handle,
                    status.message.as_deref().unwrap_or("no message")
                );
                return JobOutcome::Failed(status);
            }
            _ => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return JobOutcome::Cancelled,
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}
