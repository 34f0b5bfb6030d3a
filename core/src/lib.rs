//! Support-ticket triage.
//!
//! Classifies a free-text ticket description into a category and a
//! priority, asking Gemini when an API key is configured and falling back
//! to local keyword heuristics otherwise or on any failure.

pub mod ai;
pub mod classify;
pub mod config;
pub mod error;

#[cfg(feature = "cli")]
pub mod cli;

pub use classify::{
    Category, ClassificationRequest, ClassificationResult, Classifier, Outcome, Priority, Source,
};
pub use config::Settings;
pub use error::AppError;
