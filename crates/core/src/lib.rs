//! Timeline domain for the reelboard editor.
//!
//! Pure value types and the synchronous [`timeline::TimelineEngine`] that
//! keeps frames, the trailing placeholder, derived transitions and the
//! selection consistent. No I/O lives here; generation is driven by
//! `reelboard-generation`.

pub mod error;
pub mod frame;
pub mod handoff;
pub mod keyboard;
pub mod presets;
pub mod selection;
pub mod timeline;
pub mod transition;
pub mod types;
