use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::orchestrator::WaterReset;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub gemini: GeminiConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let gemini = GeminiConfig {
            api_key: std::env::var("API_KEY").context("API_KEY is not set")?,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into()),
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutria".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutria-users".into()),
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(3333),
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            gemini,
            jwt,
        })
    }
}

/// Settings for the `generate-week` driver.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub plan_api_url: String,
    pub job_delay: Duration,
    pub database_url: String,
    pub water_reset: WaterReset,
}

impl OrchestratorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let job_delay_ms = std::env::var("JOB_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(3000);
        let water_reset = match std::env::var("WATER_RESET").as_deref() {
            Ok("always") => WaterReset::Always,
            _ => WaterReset::IfAbsent,
        };
        Ok(Self {
            plan_api_url: std::env::var("PLAN_API_URL")
                .unwrap_or_else(|_| "http://localhost:3333".into()),
            job_delay: Duration::from_millis(job_delay_ms),
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            water_reset,
        })
    }
}
