//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a medical-themed interface for:
//! - Doctor login and registration
//! - Dashboard with the signed-in profile
//! - Biopsy data entry and prediction results

mod app;
mod styles;
mod ui;
mod worker;

pub use app::App;
pub use styles::MedicalTheme;
pub use worker::{Worker, WorkerEvent, WorkerHandle, WorkerPoll};
