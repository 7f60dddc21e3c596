// src/exam/mod.rs

//! Exam core: countdown, answers, scoring and the session state machine.

pub mod answers;
pub mod catalog;
pub mod error;
pub mod feedback;
pub mod registry;
pub mod runner;
pub mod scoring;
pub mod session;
pub mod timer;

pub use error::ExamError;
