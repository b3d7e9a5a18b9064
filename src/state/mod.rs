//! Session state with reactive updates to observers.
//!
//! This module provides the session controller, its inbox message type and
//! the theme selection.

pub mod app_state;
pub mod theme;

pub use {
    app_state::{AppState, AppStateEvent, ControllerMessage},
    theme::{ThemeColors, ThemeManager, ThemeType},
};
