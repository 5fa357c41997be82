#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reelboard_core::frame::FrameAsset;
use reelboard_core::timeline::TimelineEngine;
use reelboard_core::types::TransitionId;
use reelboard_generation::coordinator::{shared_timeline, SharedTimeline, TransitionCoordinator};
use reelboard_generation::config::CoordinatorConfig;
use reelboard_generation::error::ServiceError;
use reelboard_generation::events::CoordinatorEvent;
use reelboard_generation::service::{GenerationService, StatusReport, SubmitReceipt, SubmitRequest};
use tokio::sync::{broadcast, Notify};

/// Lets a test hold a service call open until it says otherwise.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// A generation service that replays scripted responses.
///
/// Once the status script runs dry every poll reports `processing`. Once
/// the submit script runs dry every job gets `task-default`, or
/// `task-for-<prompt>` after [`ScriptedService::with_prompt_task_ids`].
#[derive(Default)]
pub struct ScriptedService {
    submits: Mutex<VecDeque<Result<SubmitReceipt, ServiceError>>>,
    statuses: Mutex<VecDeque<Result<StatusReport, ServiceError>>>,
    requests: Mutex<Vec<SubmitRequest>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    submit_gate: Option<Gate>,
    status_gate: Option<Gate>,
    prompt_task_ids: bool,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit(self, result: Result<SubmitReceipt, ServiceError>) -> Self {
        self.submits.lock().unwrap().push_back(result);
        self
    }

    pub fn with_statuses(
        self,
        results: impl IntoIterator<Item = Result<StatusReport, ServiceError>>,
    ) -> Self {
        self.statuses.lock().unwrap().extend(results);
        self
    }

    pub fn with_prompt_task_ids(mut self) -> Self {
        self.prompt_task_ids = true;
        self
    }

    pub fn with_submit_gate(mut self) -> Self {
        self.submit_gate = Some(Gate::default());
        self
    }

    pub fn with_status_gate(mut self) -> Self {
        self.status_gate = Some(Gate::default());
        self
    }

    pub async fn submit_entered(&self) {
        self.submit_gate.as_ref().unwrap().entered.notified().await;
    }

    pub fn release_submit(&self) {
        self.submit_gate.as_ref().unwrap().release.notify_one();
    }

    pub async fn status_entered(&self) {
        self.status_gate.as_ref().unwrap().entered.notified().await;
    }

    pub fn release_status(&self) {
        self.status_gate.as_ref().unwrap().release.notify_one();
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SubmitRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, ServiceError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.submit_gate {
            gate.pass().await;
        }
        let next = self.submits.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            if self.prompt_task_ids {
                Ok(receipt(&format!("task-for-{}", request.prompt), None))
            } else {
                Ok(receipt("task-default", None))
            }
        })
    }

    async fn status(&self, _task_id: &str) -> Result<StatusReport, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.status_gate {
            gate.pass().await;
        }
        let next = self.statuses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(StatusReport::new("processing")))
    }
}

pub fn receipt(task_id: &str, initial_status: Option<&str>) -> SubmitReceipt {
    SubmitReceipt {
        task_id: task_id.to_string(),
        initial_status: initial_status.map(str::to_string),
    }
}

pub fn api_error(status: u16) -> ServiceError {
    ServiceError::Api {
        status,
        body: "upstream unavailable".to_string(),
    }
}

/// A shared timeline with `n` concrete frames `0.png`, `1.png`, ...
pub fn timeline_with(n: usize) -> SharedTimeline {
    shared_timeline(TimelineEngine::from_assets(
        (0..n).map(|i| FrameAsset::image(format!("{i}.png"), None)),
    ))
}

pub fn coordinator(timeline: &SharedTimeline, service: &Arc<ScriptedService>) -> TransitionCoordinator {
    TransitionCoordinator::new(timeline.clone(), service.clone(), CoordinatorConfig::default())
}

pub async fn transition_at(timeline: &SharedTimeline, idx: usize) -> TransitionId {
    timeline.read().await.transitions()[idx].id
}

/// Receive events until one is terminal for `transition_id`.
pub async fn events_until_terminal(
    events: &mut broadcast::Receiver<CoordinatorEvent>,
    transition_id: TransitionId,
) -> Vec<CoordinatorEvent> {
    let mut seen = Vec::new();
    let collect = async {
        loop {
            let event = events.recv().await.unwrap();
            let done = event.transition_id() == transition_id && event.is_terminal();
            seen.push(event);
            if done {
                break;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(600), collect)
        .await
        .expect("no terminal event within ten minutes of virtual time");
    seen
}

/// Everything already sitting in the channel.
pub fn drain(events: &mut broadcast::Receiver<CoordinatorEvent>) -> Vec<CoordinatorEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
