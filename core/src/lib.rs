//! Shared types for the Tonebridge API and CLI.
//!
//! The interesting logic lives in [`tone`]: the merge that attaches the
//! dominant emotion of the current turn to the caller's conversation context.

pub mod auth;
pub mod chatlog;
pub mod conversation;
pub mod error;
pub mod tone;
