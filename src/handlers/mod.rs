// src/handlers/mod.rs

pub mod auth;
pub mod exams;
pub mod profile;
pub mod results;
pub mod sessions;
