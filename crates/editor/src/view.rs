//! Plain-text rendering of a timeline snapshot.

use std::fmt::Write;

use reelboard_core::frame::Frame;
use reelboard_core::selection::Selection;
use reelboard_core::timeline::TimelineSnapshot;
use reelboard_core::transition::Transition;

/// Render frames with the transitions between them, marking the selection.
pub fn render(snapshot: &TimelineSnapshot) -> String {
    let concrete: Vec<&Frame> = snapshot.frames.iter().filter(|f| !f.is_placeholder()).collect();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "timeline: {} frame(s), {} transition(s), {:.1}s",
        concrete.len(),
        snapshot.transitions.len(),
        snapshot.total_duration_ms as f64 / 1000.0,
    );

    for (idx, frame) in concrete.iter().enumerate() {
        let marker = marker(snapshot.selection == Selection::Frame(frame.id));
        let _ = writeln!(
            out,
            "{marker} [{idx}] {} ({:.1}s){}",
            short(&frame.asset.url),
            frame.duration_ms as f64 / 1000.0,
            frame
                .metadata
                .get("source")
                .and_then(|s| s.as_str())
                .map(|s| format!(" from {s}"))
                .unwrap_or_default(),
        );
        if let Some((t_idx, transition)) = snapshot
            .transitions
            .iter()
            .enumerate()
            .find(|(_, t)| t.from_frame_id == frame.id)
        {
            out.push_str(&render_transition(t_idx, transition, snapshot.selection));
        }
    }

    if let Some(placeholder) = snapshot.frames.iter().find(|f| f.is_placeholder()) {
        let marker = marker(snapshot.selection == Selection::Frame(placeholder.id));
        let _ = writeln!(out, "{marker} [+] add next frame here");
    }
    out
}

fn render_transition(idx: usize, transition: &Transition, selection: Selection) -> String {
    let marker = marker(selection == Selection::Transition(transition.id));
    let mut line = format!("{marker}     ~ t{idx} {}", transition.status);
    if !transition.prompt.is_empty() {
        let _ = write!(line, " \"{}\"", transition.prompt);
    }
    if let Some(url) = &transition.preview_url {
        let _ = write!(line, " -> {}", short(url));
    }
    line.push('\n');
    line
}

fn marker(selected: bool) -> char {
    if selected {
        '>'
    } else {
        ' '
    }
}

/// Data URLs are far too long to print.
fn short(url: &str) -> String {
    const MAX: usize = 60;
    if url.chars().count() <= MAX {
        url.to_string()
    } else {
        let head: String = url.chars().take(MAX - 3).collect();
        format!("{head}...")
    }
}
