//! Transition generation coordinator.
//!
//! [`TransitionCoordinator`] submits a transition to the generation
//! service, writes the normalized result into the shared timeline and then
//! polls the remote task on a fixed cadence until it settles. Each poll
//! loop runs as its own task with a child [`CancellationToken`] of the
//! coordinator's master token, so a single transition, the transitions a
//! timeline edit orphaned, or everything at shutdown can be torn down
//! independently.
//!
//! Every write that results from a network response is guarded: the
//! transition must still exist, still be in a polling-eligible status and
//! still belong to the request that produced the response (the submission
//! attempt for submits, the task id for polls). Anything else is a stale
//! response and is discarded.
//!
//! Lifecycle changes are broadcast as [`CoordinatorEvent`]s. Call
//! [`TransitionCoordinator::subscribe`] to receive them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reelboard_core::timeline::TimelineEngine;
use reelboard_core::transition::{TransitionStatus, TransitionUpdate};
use reelboard_core::types::TransitionId;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::error::GenerationError;
use crate::events::CoordinatorEvent;
use crate::service::{GenerationService, StatusReport, SubmitRequest};
use crate::status::{normalize_initial_status, normalize_status};

/// Broadcast channel capacity for coordinator events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The single engine instance shared by the editor and the coordinator.
pub type SharedTimeline = Arc<RwLock<TimelineEngine>>;

/// Wrap an engine for sharing with a coordinator.
pub fn shared_timeline(engine: TimelineEngine) -> SharedTimeline {
    Arc::new(RwLock::new(engine))
}

/// Drives transition generation against a [`GenerationService`].
pub struct TransitionCoordinator {
    timeline: SharedTimeline,
    service: Arc<dyn GenerationService>,
    config: CoordinatorConfig,
    polls: Arc<Mutex<PollRegistry>>,
    event_tx: broadcast::Sender<CoordinatorEvent>,
    /// Master cancellation token, cancelled during shutdown.
    cancel: CancellationToken,
}

/// Internal bookkeeping for one poll loop.
struct PollTask {
    /// Distinguishes a loop from a later one for the same transition.
    generation: u64,
    task_id: String,
    /// Per-loop cancellation token (child of the master token).
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct PollRegistry {
    next_generation: u64,
    /// Outstanding submission attempt per transition.
    attempts: HashMap<TransitionId, u64>,
    tasks: HashMap<TransitionId, PollTask>,
}

impl PollRegistry {
    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Claim the submit response for `attempt` if it is still the latest.
    fn settle_attempt(&mut self, transition_id: TransitionId, attempt: u64) -> bool {
        if self.attempts.get(&transition_id) == Some(&attempt) {
            self.attempts.remove(&transition_id);
            true
        } else {
            false
        }
    }
}

impl TransitionCoordinator {
    pub fn new(
        timeline: SharedTimeline,
        service: Arc<dyn GenerationService>,
        config: CoordinatorConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            timeline,
            service,
            config,
            polls: Arc::new(Mutex::new(PollRegistry::default())),
            event_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Subscribe to generation lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.event_tx.subscribe()
    }

    pub fn timeline(&self) -> &SharedTimeline {
        &self.timeline
    }

    /// Submit a generation for `transition_id` with `prompt`.
    ///
    /// The transition is set to `running` and its prompt stored before the
    /// service is called. On success the normalized initial status and the
    /// task id are written and a poll loop is started; the written status
    /// is returned. A failed submission marks the transition `failed` and
    /// starts no polling.
    pub async fn generate(
        &self,
        transition_id: TransitionId,
        prompt: &str,
    ) -> Result<TransitionStatus, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::Validation("prompt must not be empty".to_string()));
        }

        let (request, attempt) = {
            let mut engine = self.timeline.write().await;
            let transition = engine
                .transition(transition_id)
                .ok_or(GenerationError::NotFound(transition_id))?;
            if !transition.status.accepts_submission() {
                return Err(GenerationError::NotSubmittable {
                    id: transition_id,
                    status: transition.status,
                });
            }
            let duration_seconds = transition.duration_secs();
            let (from, to) = engine
                .endpoints(transition_id)
                .ok_or(GenerationError::NotFound(transition_id))?;
            let request = SubmitRequest {
                start_image_ref: from.asset.url.clone(),
                end_image_ref: to.asset.url.clone(),
                prompt: prompt.to_string(),
                duration_seconds,
            };

            engine.update_transition(
                transition_id,
                TransitionUpdate::status(TransitionStatus::Running)
                    .with_prompt(prompt)
                    .clear_task_id(),
            );

            let mut polls = self.polls.lock().await;
            let attempt = polls.bump();
            polls.attempts.insert(transition_id, attempt);
            (request, attempt)
        };

        tracing::info!(
            transition_id = %transition_id,
            duration_seconds = request.duration_seconds,
            "Submitting transition generation",
        );

        let result = self.service.submit(&request).await;

        let mut engine = self.timeline.write().await;
        let current_attempt = self.polls.lock().await.settle_attempt(transition_id, attempt);
        let awaiting_submit = current_attempt
            && engine
                .transition(transition_id)
                .is_some_and(|t| t.status == TransitionStatus::Running && t.task_id.is_none());

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => {
                if awaiting_submit {
                    engine.update_transition(
                        transition_id,
                        TransitionUpdate::status(TransitionStatus::Failed),
                    );
                }
                drop(engine);
                tracing::error!(transition_id = %transition_id, error = %e, "Transition submission failed");
                if awaiting_submit {
                    self.emit(CoordinatorEvent::Failed {
                        transition_id,
                        reason: e.to_string(),
                        at: Utc::now(),
                    });
                }
                return Err(GenerationError::Submission(e));
            }
        };

        if !awaiting_submit {
            drop(engine);
            tracing::info!(
                transition_id = %transition_id,
                task_id = %receipt.task_id,
                attempt,
                "Transition changed while submitting, discarding task",
            );
            self.emit(CoordinatorEvent::Cancelled {
                transition_id,
                at: Utc::now(),
            });
            return Err(GenerationError::Cancelled(transition_id));
        }

        // A submit receipt carries no media URL, so a task reported ready
        // right away is polled once more to fetch it.
        let status = match normalize_initial_status(receipt.initial_status.as_deref()) {
            TransitionStatus::Ready => TransitionStatus::Running,
            other => other,
        };
        engine.update_transition(
            transition_id,
            TransitionUpdate::status(status).with_task_id(receipt.task_id.clone()),
        );
        drop(engine);

        tracing::info!(
            transition_id = %transition_id,
            task_id = %receipt.task_id,
            status = %status,
            "Transition submitted",
        );
        self.emit(CoordinatorEvent::Submitted {
            transition_id,
            task_id: receipt.task_id.clone(),
            status,
            at: Utc::now(),
        });

        if status == TransitionStatus::Failed {
            self.emit(CoordinatorEvent::Failed {
                transition_id,
                reason: format!(
                    "service rejected the task ({})",
                    receipt.initial_status.as_deref().unwrap_or_default()
                ),
                at: Utc::now(),
            });
        } else {
            self.spawn_poll(transition_id, receipt.task_id).await;
        }

        Ok(status)
    }

    /// Abort generation for one transition.
    ///
    /// Stops its poll loop and moves an in-flight transition back to
    /// `idle` (or `needs-regenerate` when it still holds an earlier
    /// preview) with its task id cleared. Returns whether anything was
    /// cancelled.
    pub async fn cancel(&self, transition_id: TransitionId) -> bool {
        let (attempt, task) = {
            let mut polls = self.polls.lock().await;
            (polls.attempts.remove(&transition_id), polls.tasks.remove(&transition_id))
        };
        if let Some(task) = &task {
            task.cancel.cancel();
        }

        let mut engine = self.timeline.write().await;
        let fallback = engine
            .transition(transition_id)
            .filter(|t| t.status.is_in_flight())
            .map(|t| match t.preview_url {
                Some(_) => TransitionStatus::NeedsRegenerate,
                None => TransitionStatus::Idle,
            });
        if let Some(status) = fallback {
            engine.update_transition(transition_id, TransitionUpdate::status(status).clear_task_id());
        }
        drop(engine);

        let cancelled = attempt.is_some() || task.is_some() || fallback.is_some();
        if cancelled {
            tracing::info!(transition_id = %transition_id, "Transition generation cancelled");
            self.emit(CoordinatorEvent::Cancelled {
                transition_id,
                at: Utc::now(),
            });
        }
        cancelled
    }

    /// Stop poll loops for transitions the timeline dropped since the last
    /// call. Returns the ids whose loops were stopped.
    pub async fn cancel_orphaned(&self) -> Vec<TransitionId> {
        let orphaned = self.timeline.write().await.take_orphaned();
        if orphaned.is_empty() {
            return Vec::new();
        }

        let mut polls = self.polls.lock().await;
        let stopped: Vec<TransitionId> = orphaned
            .into_iter()
            .filter_map(|id| {
                polls.attempts.remove(&id);
                let task = polls.tasks.remove(&id)?;
                task.cancel.cancel();
                tracing::info!(transition_id = %id, task_id = %task.task_id, "Stopped polling orphaned transition");
                Some(id)
            })
            .collect();
        drop(polls);

        for &transition_id in &stopped {
            self.emit(CoordinatorEvent::Cancelled {
                transition_id,
                at: Utc::now(),
            });
        }
        stopped
    }

    /// Whether a poll loop is currently running for `transition_id`.
    pub async fn is_polling(&self, transition_id: TransitionId) -> bool {
        self.polls
            .lock()
            .await
            .tasks
            .get(&transition_id)
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Transitions with a running poll loop.
    pub async fn active_polls(&self) -> Vec<TransitionId> {
        self.polls
            .lock()
            .await
            .tasks
            .iter()
            .filter(|(_, task)| !task.handle.is_finished())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Cancel every poll loop and wait for each to exit.
    ///
    /// Transition state is left as it is. Returns the transitions whose
    /// loop did not exit within the shutdown timeout.
    pub async fn shutdown(&self) -> Vec<TransitionId> {
        tracing::info!("Shutting down transition coordinator");
        self.cancel.cancel();

        let tasks: Vec<_> = {
            let mut polls = self.polls.lock().await;
            polls.attempts.clear();
            polls.tasks.drain().collect()
        };
        let mut stuck = Vec::new();
        for (transition_id, task) in tasks {
            tracing::debug!(transition_id = %transition_id, "Stopping poll task");
            task.cancel.cancel();
            if tokio::time::timeout(self.config.shutdown_timeout, task.handle)
                .await
                .is_err()
            {
                tracing::warn!(
                    transition_id = %transition_id,
                    task_id = %task.task_id,
                    timeout_secs = self.config.shutdown_timeout.as_secs(),
                    "Poll task did not stop before the shutdown timeout",
                );
                stuck.push(transition_id);
            }
        }

        tracing::info!("Transition coordinator shut down complete");
        stuck
    }

    // ---- private helpers ----

    fn emit(&self, event: CoordinatorEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Start the poll loop for a freshly submitted task, replacing any loop
    /// still registered for the transition.
    async fn spawn_poll(&self, transition_id: TransitionId, task_id: String) {
        let mut polls = self.polls.lock().await;
        let generation = polls.bump();
        let cancel = self.cancel.child_token();

        let poller = Poller {
            transition_id,
            task_id: task_id.clone(),
            generation,
            timeline: Arc::clone(&self.timeline),
            service: Arc::clone(&self.service),
            polls: Arc::clone(&self.polls),
            event_tx: self.event_tx.clone(),
            interval: self.config.poll_interval,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(poller.run());

        let task = PollTask {
            generation,
            task_id,
            cancel,
            handle,
        };
        if let Some(previous) = polls.tasks.insert(transition_id, task) {
            previous.cancel.cancel();
        }
    }
}

/// Whether a response for `task_id` may still be written to the transition.
fn is_pollable(engine: &TimelineEngine, transition_id: TransitionId, task_id: &str) -> bool {
    engine.transition(transition_id).is_some_and(|t| {
        t.status.is_in_flight() && t.task_id.as_deref() == Some(task_id)
    })
}

/// State owned by one spawned poll loop.
struct Poller {
    transition_id: TransitionId,
    task_id: String,
    generation: u64,
    timeline: SharedTimeline,
    service: Arc<dyn GenerationService>,
    polls: Arc<Mutex<PollRegistry>>,
    event_tx: broadcast::Sender<CoordinatorEvent>,
    interval: Duration,
    cancel: CancellationToken,
}

/// What to do after one poll response.
enum Step {
    Continue,
    Stop,
}

impl Poller {
    async fn run(self) {
        tracing::debug!(
            transition_id = %self.transition_id,
            task_id = %self.task_id,
            "Poll loop started",
        );

        self.poll_until_settled().await;

        let mut polls = self.polls.lock().await;
        let current = polls
            .tasks
            .get(&self.transition_id)
            .is_some_and(|task| task.generation == self.generation);
        if current {
            polls.tasks.remove(&self.transition_id);
        }
        drop(polls);

        tracing::debug!(transition_id = %self.transition_id, "Poll loop exited");
    }

    /// Sleep, check the precondition, poll; strictly one request at a time.
    async fn poll_until_settled(&self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(self.interval) => {}
            }

            if !is_pollable(&*self.timeline.read().await, self.transition_id, &self.task_id) {
                tracing::debug!(transition_id = %self.transition_id, "Transition no longer pollable");
                self.emit(CoordinatorEvent::Cancelled {
                    transition_id: self.transition_id,
                    at: Utc::now(),
                });
                return;
            }

            let result = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = self.service.status(&self.task_id) => result,
            };

            let step = match result {
                Ok(report) => self.apply_report(report).await,
                Err(e) => {
                    self.apply_transport_error(&e.to_string()).await;
                    Step::Stop
                }
            };
            if let Step::Stop = step {
                return;
            }
        }
    }

    async fn apply_report(&self, report: StatusReport) -> Step {
        let status = normalize_status(&report.raw_status);

        let mut engine = self.timeline.write().await;
        // Cancellation may have landed while the request was in flight.
        if self.cancel.is_cancelled() || !is_pollable(&engine, self.transition_id, &self.task_id) {
            drop(engine);
            tracing::debug!(
                transition_id = %self.transition_id,
                task_id = %self.task_id,
                raw_status = %report.raw_status,
                "Discarding stale poll response",
            );
            if !self.cancel.is_cancelled() {
                self.emit(CoordinatorEvent::Cancelled {
                    transition_id: self.transition_id,
                    at: Utc::now(),
                });
            }
            return Step::Stop;
        }
        let previous = engine.transition(self.transition_id).map(|t| t.status);

        tracing::debug!(
            transition_id = %self.transition_id,
            task_id = %self.task_id,
            raw_status = %report.raw_status,
            status = %status,
            "Polled transition status",
        );

        match status {
            TransitionStatus::Ready => {
                let mut update = TransitionUpdate::status(TransitionStatus::Ready);
                match &report.media_url {
                    Some(url) => update = update.with_preview_url(url.clone()),
                    None => tracing::warn!(
                        transition_id = %self.transition_id,
                        task_id = %self.task_id,
                        "Task finished without a media URL",
                    ),
                }
                engine.update_transition(self.transition_id, update);
                drop(engine);

                tracing::info!(transition_id = %self.transition_id, "Transition ready");
                self.emit(CoordinatorEvent::Completed {
                    transition_id: self.transition_id,
                    preview_url: report.media_url,
                    at: Utc::now(),
                });
                Step::Stop
            }
            TransitionStatus::Failed => {
                engine.update_transition(
                    self.transition_id,
                    TransitionUpdate::status(TransitionStatus::Failed),
                );
                drop(engine);

                tracing::warn!(
                    transition_id = %self.transition_id,
                    raw_status = %report.raw_status,
                    "Transition generation failed",
                );
                self.emit(CoordinatorEvent::Failed {
                    transition_id: self.transition_id,
                    reason: format!("service reported {}", report.raw_status),
                    at: Utc::now(),
                });
                Step::Stop
            }
            in_progress => {
                if previous != Some(in_progress) {
                    engine.update_transition(self.transition_id, TransitionUpdate::status(in_progress));
                    drop(engine);
                    self.emit(CoordinatorEvent::StatusChanged {
                        transition_id: self.transition_id,
                        status: in_progress,
                        at: Utc::now(),
                    });
                }
                Step::Continue
            }
        }
    }

    /// A failed poll request is terminal for the transition.
    async fn apply_transport_error(&self, reason: &str) {
        let mut engine = self.timeline.write().await;
        if self.cancel.is_cancelled() || !is_pollable(&engine, self.transition_id, &self.task_id) {
            return;
        }
        engine.update_transition(
            self.transition_id,
            TransitionUpdate::status(TransitionStatus::Failed),
        );
        drop(engine);

        tracing::error!(
            transition_id = %self.transition_id,
            task_id = %self.task_id,
            error = %reason,
            "Polling transition failed",
        );
        self.emit(CoordinatorEvent::Failed {
            transition_id: self.transition_id,
            reason: reason.to_string(),
            at: Utc::now(),
        });
    }

    fn emit(&self, event: CoordinatorEvent) {
        let _ = self.event_tx.send(event);
    }
}
