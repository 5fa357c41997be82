//! Normalization of vendor task payloads.
//!
//! Video providers disagree on field names and status vocabularies. These
//! helpers map whatever arrives into the internal [`TransitionStatus`] and
//! pull out task ids and playable media URLs. Unknown statuses map to
//! `running`: a job we cannot classify is assumed to still be in progress
//! rather than silently dropped.

use reelboard_core::transition::TransitionStatus;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Status vocabularies
// ---------------------------------------------------------------------------

const READY_STATUSES: &[&str] = &[
    "ready", "succeeded", "success", "succeed", "completed", "complete", "done", "finished",
];

const RUNNING_STATUSES: &[&str] = &[
    "running", "processing", "in_progress", "in-progress", "inprogress", "started", "generating",
];

const QUEUED_STATUSES: &[&str] = &["queued", "pending", "waiting", "submitted", "created", "scheduled"];

const FAILED_STATUSES: &[&str] = &[
    "failed", "failure", "error", "errored", "timeout", "timed_out", "cancelled", "canceled", "rejected",
];

/// Map a raw vendor status string to the internal status enum.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
/// Anything unrecognized (including the empty string) is `Running`.
pub fn normalize_status(raw: &str) -> TransitionStatus {
    let status = raw.trim().to_ascii_lowercase();
    let status = status.as_str();

    if READY_STATUSES.contains(&status) {
        TransitionStatus::Ready
    } else if FAILED_STATUSES.contains(&status) {
        TransitionStatus::Failed
    } else if QUEUED_STATUSES.contains(&status) {
        TransitionStatus::Queued
    } else if RUNNING_STATUSES.contains(&status) {
        TransitionStatus::Running
    } else {
        tracing::debug!(raw_status = %raw, "Unrecognized task status, treating as running");
        TransitionStatus::Running
    }
}

/// Status reported at submission time; a missing status means the task
/// was accepted and is running.
pub fn normalize_initial_status(raw: Option<&str>) -> TransitionStatus {
    raw.map_or(TransitionStatus::Running, normalize_status)
}

// ---------------------------------------------------------------------------
// Payload extraction
// ---------------------------------------------------------------------------

const TASK_ID_KEYS: &[&str] = &["taskId", "task_id", "id"];
const STATUS_KEYS: &[&str] = &["rawStatus", "status", "task_status", "state"];
const MEDIA_URL_KEYS: &[&str] = &["mediaUrl", "video_url", "preview_url", "resource_url", "media_url", "url"];
const NESTED_KEYS: &[&str] = &["data", "response", "output"];

/// Task id from the top level of a payload or one of its nested envelopes.
pub fn extract_task_id(payload: &Value) -> Option<String> {
    find_in_envelopes(payload, |obj| {
        TASK_ID_KEYS.iter().find_map(|key| match obj.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    })
}

/// Raw status string, if any field carries one.
pub fn extract_raw_status(payload: &Value) -> Option<String> {
    find_in_envelopes(payload, |obj| {
        STATUS_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str).map(str::to_string))
    })
}

/// Playable media URL, looking at flat URL fields first and then at
/// `task_result.videos[0].url`.
pub fn extract_media_url(payload: &Value) -> Option<String> {
    find_in_envelopes(payload, |obj| {
        let flat = MEDIA_URL_KEYS.iter().find_map(|key| non_empty_str(obj.get(*key)));
        flat.or_else(|| {
            obj.get("task_result")
                .and_then(|r| r.get("videos"))
                .and_then(Value::as_array)
                .and_then(|videos| videos.first())
                .and_then(|video| non_empty_str(video.get("url")))
        })
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Search the payload itself, then each known envelope, breadth-first.
fn find_in_envelopes<T>(
    payload: &Value,
    lookup: impl Fn(&serde_json::Map<String, Value>) -> Option<T>,
) -> Option<T> {
    let mut queue = vec![payload];
    let mut idx = 0;
    while let Some(value) = queue.get(idx).copied() {
        idx += 1;
        let Some(obj) = value.as_object() else {
            continue;
        };
        if let Some(found) = lookup(obj) {
            return Some(found);
        }
        queue.extend(NESTED_KEYS.iter().filter_map(|key| obj.get(*key)));
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
