// src/models/mod.rs

pub mod dashboard;
pub mod exam_result;
pub mod profile;
pub mod question;
pub mod session;
pub mod user;
