// src/services/mod.rs

pub mod recommendation;
pub mod report;
pub mod scoring;
