// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Minimum score (0-100 scale) counted as a pass.
pub const PASSING_SCORE: f64 = 70.0;

/// Minimum score for the "Excellent" feedback tier.
pub const EXCELLENT_SCORE: f64 = 80.0;

/// Page size used when `limit` is missing or unparsable.
pub const DEFAULT_PAGE_LIMIT: u32 = 6;

pub const MAX_PAGE_LIMIT: u32 = 100;

/// Category used for backfill when a user has no attempt history.
pub const DEFAULT_SKILL_CATEGORY: &str = "Cognitive Skills";

/// The closed set of skill categories.
pub const SKILL_CATEGORIES: [&str; 5] = [
    "Cognitive Skills",
    "Technical Skills",
    "Communication Skills",
    "Leadership Skills",
    "Creative Skills",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let admin_email = env::var("ADMIN_EMAIL").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            admin_email,
            admin_password,
        }
    }
}
