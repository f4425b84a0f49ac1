// src/handlers/mod.rs

pub mod assessment;
pub mod auth;
pub mod profile;
pub mod report;
pub mod skill;
