//! quizreport-core: Scoring, performance scales and report assembly.
//!
//! This crate defines the data model, the marks and level computations, the
//! report template and its editing session, and the engine that gathers the
//! records a report is built from. Storage and rendering live in
//! `quizreport-store` and `quizreport-render`.

pub mod autosave;
pub mod engine;
pub mod error;
pub mod insights;
pub mod marks;
pub mod model;
pub mod report;
pub mod scale;
pub mod scale_store;
pub mod template;
pub mod template_edit;
pub mod traits;
