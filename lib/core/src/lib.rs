//! Core domain types for the flowdeck platform.
//!
//! This crate provides the foundational identifier types shared by the
//! flowdeck visual-automation engine and its surrounding services.

pub mod id;

pub use id::{AutomationId, ListenerId, ParseIdError, RunId};
