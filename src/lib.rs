//! charla: terminal chat client for a local assistant backend
//!
//! This library provides:
//! - A transcript view with fenced code-block rendering and copy keys
//! - A single input line fed by typed text and dictation
//! - An HTTP dispatcher for the backend `/message` and `/system` endpoints
//! - Session commands (reset/archive) behind a confirmation gate
//! - A restricted host bridge carrying an allow-listed channel set

pub mod app;
pub mod bridge;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod dictation;
pub mod error;
pub mod handler;
pub mod markdown;
pub mod tui;
pub mod ui;

pub use app::App;
pub use config::Config;
