//! Nutria: weekly meal-plan generation backend and the driver that fills a
//! user's daily documents with AI-generated plans.

pub mod app;
pub mod auth;
pub mod config;
pub mod daily;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod plan;
pub mod state;
pub mod store;
