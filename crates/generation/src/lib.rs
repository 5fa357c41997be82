//! Transition generation for the reelboard timeline.
//!
//! Submits transition jobs to a remote video generation service, polls
//! them to completion and writes the normalized results back into a
//! shared [`TimelineEngine`](reelboard_core::timeline::TimelineEngine).
//! Also carries the HTTP client for the generation proxy and the
//! environment-driven configuration for both.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod service;
pub mod status;
