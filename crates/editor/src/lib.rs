//! Line-oriented editor over a reelboard timeline.
//!
//! [`session::EditorSession`] owns the shared engine, the transition
//! coordinator, the keyboard controller and the one-shot hand-off slot;
//! [`command`] parses console input into session commands and [`view`]
//! renders the timeline back as text.

pub mod command;
pub mod config;
pub mod session;
pub mod view;
