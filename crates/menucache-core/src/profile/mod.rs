//! User profile module.
//!
//! This module provides:
//! - `SettingsStore`: small persistent key-value store with text and flag values
//! - `UserProfile`: first/last name, email and login state on top of a `SettingsStore`
//!
//! The profile is independent of the menu store; nothing in the sync path uses it.

pub mod settings;
pub mod user;

pub use settings::{JsonSettingsStore, MemorySettings, SettingsStore};
pub use user::{Profile, UserProfile};
