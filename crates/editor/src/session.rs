//! One editing session over a shared timeline.
//!
//! The session is the only place console commands touch the engine. After
//! every structural edit it asks the coordinator to stop polling the
//! transitions that edit orphaned.

use std::sync::Arc;

use reelboard_core::error::CoreError;
use reelboard_core::handoff::HandoffSlot;
use reelboard_core::keyboard::{KeyAction, KeyEvent, KeyOutcome, KeyboardController};
use reelboard_core::presets::{apply_preset_keyword, find_preset, STYLE_KEYWORDS};
use reelboard_core::timeline::TimelineSnapshot;
use reelboard_core::transition::TransitionUpdate;
use reelboard_core::types::{FrameId, Metadata, TransitionId};
use reelboard_generation::coordinator::{SharedTimeline, TransitionCoordinator};
use reelboard_generation::error::{GenerationError, ServiceError};
use reelboard_generation::service::ImageService;

use crate::command::{Command, HELP};
use crate::view::render;

/// Metadata `source` recorded on frames filled by image generation.
pub const IMAGE_GENERATION_SOURCE: &str = "image-generation";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no frame at position {0}")]
    NoSuchFrame(usize),

    #[error("no transition at position {0}")]
    NoSuchTransition(usize),

    #[error("unknown preset {0:?}")]
    UnknownPreset(String),

    #[error("unknown style keyword {0:?} (one of: {list})", list = STYLE_KEYWORDS.join(", "))]
    UnknownKeyword(String),

    /// The engine declined the edit (it would have been a no-op).
    #[error("{0}")]
    Rejected(&'static str),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("image generation failed: {0}")]
    Image(#[from] ServiceError),

    #[error("hand-off payload discarded: {0}")]
    Handoff(#[from] CoreError),
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Message(String),
    Quit,
}

impl Reply {
    fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }
}

pub struct EditorSession {
    timeline: SharedTimeline,
    coordinator: Arc<TransitionCoordinator>,
    images: Arc<dyn ImageService>,
    keyboard: KeyboardController,
    handoff: HandoffSlot,
}

impl EditorSession {
    pub fn new(
        coordinator: Arc<TransitionCoordinator>,
        images: Arc<dyn ImageService>,
        handoff: HandoffSlot,
    ) -> Self {
        Self {
            timeline: Arc::clone(coordinator.timeline()),
            coordinator,
            images,
            keyboard: KeyboardController::new(),
            handoff,
        }
    }

    pub fn timeline(&self) -> &SharedTimeline {
        &self.timeline
    }

    pub async fn snapshot(&self) -> TimelineSnapshot {
        self.timeline.read().await.snapshot()
    }

    /// Apply the pending hand-off payload, if any, to the first frame.
    ///
    /// The payload is consumed on the first call whatever its content; a
    /// malformed one is reported and leaves the timeline untouched.
    pub async fn enter(&mut self) -> Result<Option<FrameId>, SessionError> {
        if !self.handoff.is_pending() {
            return Ok(None);
        }
        let mut engine = self.timeline.write().await;
        match self.handoff.consume(&mut engine) {
            Ok(applied) => {
                if let Some(frame_id) = applied {
                    tracing::info!(frame_id = %frame_id, "Applied hand-off payload");
                }
                Ok(applied)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarded malformed hand-off payload");
                Err(e.into())
            }
        }
    }

    pub async fn execute(&self, command: Command) -> Result<Reply, SessionError> {
        tracing::debug!(?command, "Executing command");

        match command {
            Command::Add { url, thumbnail } => {
                let mut engine = self.timeline.write().await;
                let id = engine.add_frame(&url, thumbnail.as_deref());
                let order = engine.frame(id).map_or(0, |f| f.order);
                Ok(Reply::message(format!("added frame {order}")))
            }
            Command::GenerateFrame { prompt } => self.generate_frame(&prompt).await,
            Command::Remove { frame } => {
                let id = self.frame_id_at(frame).await?;
                self.timeline.write().await.remove_frame(id);
                let stopped = self.coordinator.cancel_orphaned().await;
                Ok(Reply::message(with_stopped(format!("removed frame {frame}"), &stopped)))
            }
            Command::Move { from, to } => {
                if !self.timeline.write().await.reorder_frame(from, to) {
                    return Err(SessionError::NoSuchFrame(from));
                }
                let stopped = self.coordinator.cancel_orphaned().await;
                Ok(Reply::message(with_stopped(format!("moved frame {from} to {to}"), &stopped)))
            }
            Command::Select { frame } => {
                let id = self.frame_id_at(frame).await?;
                self.timeline.write().await.select_frame(Some(id));
                Ok(Reply::message(format!("selected frame {frame}")))
            }
            Command::SelectTransition { transition } => {
                let id = self.transition_id_at(transition).await?;
                self.timeline.write().await.select_transition(Some(id));
                Ok(Reply::message(format!("selected transition {transition}")))
            }
            Command::Prompt { transition, text } => {
                let id = self.transition_id_at(transition).await?;
                self.timeline
                    .write()
                    .await
                    .update_transition(id, TransitionUpdate::default().with_prompt(text));
                Ok(Reply::message(format!("prompt set for transition {transition}")))
            }
            Command::Draft { transition, text } => {
                let id = self.transition_id_at(transition).await?;
                self.timeline.write().await.save_transition_draft(id, &text);
                Ok(Reply::message(format!("draft saved for transition {transition}")))
            }
            Command::Preset {
                transition,
                preset_id,
            } => {
                let preset =
                    find_preset(&preset_id).ok_or_else(|| SessionError::UnknownPreset(preset_id.clone()))?;
                let id = self.transition_id_at(transition).await?;
                self.timeline
                    .write()
                    .await
                    .update_transition(id, TransitionUpdate::default().with_prompt(preset.prompt));
                Ok(Reply::message(format!(
                    "transition {transition} uses preset {} ({})",
                    preset.name,
                    preset.category.label()
                )))
            }
            Command::Keyword {
                transition,
                keyword,
            } => {
                if !STYLE_KEYWORDS.contains(&keyword.as_str()) {
                    return Err(SessionError::UnknownKeyword(keyword));
                }
                let id = self.transition_id_at(transition).await?;
                let mut engine = self.timeline.write().await;
                let prompt = engine
                    .transition(id)
                    .map(|t| apply_preset_keyword(&t.prompt, &keyword))
                    .unwrap_or_default();
                engine.update_transition(id, TransitionUpdate::default().with_prompt(prompt.clone()));
                Ok(Reply::message(format!("transition {transition} prompt: {prompt}")))
            }
            Command::Generate { transition, prompt } => {
                let id = self.transition_id_at(transition).await?;
                let prompt = match prompt {
                    Some(prompt) => prompt,
                    None => self
                        .timeline
                        .read()
                        .await
                        .transition(id)
                        .map(|t| t.prompt.clone())
                        .unwrap_or_default(),
                };
                let status = self.coordinator.generate(id, &prompt).await?;
                self.timeline.write().await.select_transition(Some(id));
                Ok(Reply::message(format!("transition {transition} is {status}")))
            }
            Command::Regenerate { transition } => {
                let id = self.transition_id_at(transition).await?;
                if !self.timeline.write().await.mark_needs_regenerate(id) {
                    return Err(SessionError::Rejected(
                        "only a ready transition can be marked for regeneration",
                    ));
                }
                Ok(Reply::message(format!("transition {transition} needs regeneration")))
            }
            Command::Cancel { transition } => {
                let id = self.transition_id_at(transition).await?;
                if self.coordinator.cancel(id).await {
                    Ok(Reply::message(format!("cancelled transition {transition}")))
                } else {
                    Err(SessionError::Rejected("transition is not generating"))
                }
            }
            Command::Key(event) => self.press(&event).await,
            Command::Show => Ok(Reply::Message(render(&self.snapshot().await))),
            Command::Help => Ok(Reply::message(HELP)),
            Command::Quit => Ok(Reply::Quit),
        }
    }

    // ---- private helpers ----

    async fn frame_id_at(&self, order: usize) -> Result<FrameId, SessionError> {
        self.timeline
            .read()
            .await
            .frame_at(order)
            .map(|f| f.id)
            .ok_or(SessionError::NoSuchFrame(order))
    }

    async fn transition_id_at(&self, idx: usize) -> Result<TransitionId, SessionError> {
        self.timeline
            .read()
            .await
            .transitions()
            .get(idx)
            .map(|t| t.id)
            .ok_or(SessionError::NoSuchTransition(idx))
    }

    /// Generate an image and drop it into the placeholder slot.
    async fn generate_frame(&self, prompt: &str) -> Result<Reply, SessionError> {
        let prompt = prompt.trim();
        tracing::info!(prompt = %prompt, "Generating frame image");
        let url = self.images.generate_image(prompt, None).await?;

        let mut metadata = Metadata::new();
        metadata.insert("source".into(), IMAGE_GENERATION_SOURCE.into());
        metadata.insert("prompt".into(), prompt.into());

        let mut engine = self.timeline.write().await;
        let id = engine.add_frame_with_metadata(&url, None, metadata);
        let order = engine.frame(id).map_or(0, |f| f.order);
        Ok(Reply::message(format!("generated frame {order}")))
    }

    async fn press(&self, event: &KeyEvent) -> Result<Reply, SessionError> {
        let outcome = {
            let mut engine = self.timeline.write().await;
            self.keyboard.handle(&mut engine, event)
        };

        let text = match outcome {
            KeyOutcome::Ignored => "key ignored".to_string(),
            KeyOutcome::NotImplemented(shortcut) => {
                format!("{} is not implemented yet", shortcut.label())
            }
            KeyOutcome::Handled { action, .. } => match action {
                KeyAction::RemovedFrame(_) => {
                    let stopped = self.coordinator.cancel_orphaned().await;
                    with_stopped("removed selected frame".to_string(), &stopped)
                }
                KeyAction::SelectedFrame(id) => {
                    let order = self.timeline.read().await.frame(id).map_or(0, |f| f.order);
                    format!("selected frame {order}")
                }
                KeyAction::ClearedSelection => "selection cleared".to_string(),
                KeyAction::NoMove => "already at the edge".to_string(),
            },
        };
        Ok(Reply::Message(text))
    }
}

fn with_stopped(text: String, stopped: &[TransitionId]) -> String {
    if stopped.is_empty() {
        text
    } else {
        format!("{text}; stopped {} generation(s)", stopped.len())
    }
}
