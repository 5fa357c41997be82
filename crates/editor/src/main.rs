//! `reelboard-editor` -- console front end for the timeline editor.
//!
//! Reads one command per line from stdin (`help` lists them), applies it
//! to the session and prints the reply. Generation progress is logged as
//! the coordinator reports it.
//!
//! # Environment variables
//!
//! | Variable                         | Default                        | Description                    |
//! |----------------------------------|--------------------------------|--------------------------------|
//! | `REELBOARD_API_URL`              | `http://localhost:3000/api/ai` | Generation proxy base URL      |
//! | `REELBOARD_REQUEST_TIMEOUT_SECS` | `60`                           | HTTP timeout per request       |
//! | `REELBOARD_POLL_INTERVAL_SECS`   | `5`                            | Seconds between status polls   |
//! | `REELBOARD_HANDOFF_FILE`         | --                             | One-shot hand-off JSON payload |

use std::io::Write;
use std::sync::Arc;

use reelboard_core::frame::FrameAsset;
use reelboard_core::handoff::HandoffSlot;
use reelboard_core::timeline::TimelineEngine;
use reelboard_editor::command::Command;
use reelboard_editor::config::{take_handoff_file, EditorConfig};
use reelboard_editor::session::{EditorSession, Reply};
use reelboard_generation::api::GenerationApi;
use reelboard_generation::coordinator::{shared_timeline, TransitionCoordinator};
use reelboard_generation::events::CoordinatorEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Frame every new session starts from.
const DEMO_FRAME: &str = "/demo/frame-1.svg";
const DEMO_FRAME_THUMB: &str = "/demo/frame-1-thumb.svg";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelboard_editor=info,reelboard_generation=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = EditorConfig::from_env()?;
    tracing::info!(
        api_url = %config.service.api_url,
        poll_interval_secs = config.coordinator.poll_interval.as_secs(),
        "Loaded editor configuration",
    );

    // --- Services ---
    let api = Arc::new(GenerationApi::from_config(&config.service)?);
    let timeline = shared_timeline(TimelineEngine::from_assets([FrameAsset::image(
        DEMO_FRAME,
        Some(DEMO_FRAME_THUMB),
    )]));
    let coordinator = Arc::new(TransitionCoordinator::new(
        timeline,
        api.clone(),
        config.coordinator.clone(),
    ));
    let event_log = tokio::spawn(log_events(coordinator.subscribe()));

    // --- Session ---
    let handoff = match &config.handoff_file {
        Some(path) => take_handoff_file(path).await.unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Could not read hand-off file");
            None
        }),
        None => None,
    };
    let mut session = EditorSession::new(Arc::clone(&coordinator), api, HandoffSlot::new(handoff));
    if let Err(e) = session.enter().await {
        println!("{e}");
    }
    if let Ok(Reply::Message(text)) = session.execute(Command::Show).await {
        print!("{text}");
    }

    // --- Command loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        match session.execute(command).await {
            Ok(Reply::Message(text)) => println!("{}", text.trim_end()),
            Ok(Reply::Quit) => break,
            Err(e) => println!("error: {e}"),
        }
    }

    coordinator.shutdown().await;
    event_log.abort();
    Ok(())
}

/// Log coordinator events until the channel closes.
async fn log_events(mut events: broadcast::Receiver<CoordinatorEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => log_event(&event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn log_event(event: &CoordinatorEvent) {
    match event {
        CoordinatorEvent::Submitted {
            transition_id,
            task_id,
            status,
            ..
        } => tracing::info!(transition_id = %transition_id, task_id = %task_id, status = %status, "Generation submitted"),
        CoordinatorEvent::StatusChanged {
            transition_id,
            status,
            ..
        } => tracing::info!(transition_id = %transition_id, status = %status, "Generation progressed"),
        CoordinatorEvent::Completed {
            transition_id,
            preview_url,
            ..
        } => tracing::info!(
            transition_id = %transition_id,
            preview_url = preview_url.as_deref().unwrap_or("-"),
            "Transition ready",
        ),
        CoordinatorEvent::Failed {
            transition_id,
            reason,
            ..
        } => tracing::warn!(transition_id = %transition_id, reason = %reason, "Transition failed"),
        CoordinatorEvent::Cancelled { transition_id, .. } => {
            tracing::info!(transition_id = %transition_id, "Generation cancelled")
        }
    }
}
