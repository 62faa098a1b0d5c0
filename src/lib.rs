// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Habit Hero: a gamified daily habit tracker.
//!
//! This crate reconciles a habit list and the player's stats (XP, level,
//! coins, day streak, per-day history) with a persistence backend, rolls
//! state over at calendar-day boundaries and asks an optional text
//! generator for motivation and habit ideas.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::{Backend, Config};
use db::{FirestoreDb, HttpGateway, LocalGateway, PersistenceGateway};
use error::Result;
use services::{AdvisoryGenerator, GeminiAdvisor, HabitEngine};

/// Connect to the persistence backend selected by `config`.
pub async fn build_gateway(config: &Config) -> Result<Arc<dyn PersistenceGateway>> {
    let gateway: Arc<dyn PersistenceGateway> = match config.backend {
        Backend::Local => match &config.data_dir {
            Some(dir) => Arc::new(LocalGateway::open(dir).await?),
            None => Arc::new(LocalGateway::in_memory()),
        },
        Backend::Http => Arc::new(HttpGateway::new(config.api_base_url.clone())),
        Backend::Firestore => {
            Arc::new(FirestoreDb::new(&config.gcp_project_id, &config.profile_id).await?)
        }
    };
    Ok(gateway)
}

/// The Gemini advisor, if an API key is configured.
pub fn build_advisor(config: &Config) -> Result<Option<Arc<dyn AdvisoryGenerator>>> {
    let Some(api_key) = &config.gemini_api_key else {
        return Ok(None);
    };
    let advisor = GeminiAdvisor::new(
        api_key.clone(),
        config.gemini_model.clone(),
        config.advisory_timeout,
    )?;
    Ok(Some(Arc::new(advisor)))
}

/// Assemble an engine from configuration. State is empty until `load()`.
pub async fn build_engine(config: &Config) -> Result<HabitEngine> {
    let gateway = build_gateway(config).await?;
    let advisor = build_advisor(config)?;
    Ok(HabitEngine::new(gateway, advisor, config.utc_offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_engine_local_defaults() {
        let engine = build_engine(&Config::default()).await.unwrap();
        let outcome = engine.load().await.unwrap();

        assert_eq!(outcome.habits.len(), 2);
        assert_eq!(outcome.stats.level, 1);
    }

    #[test]
    fn test_no_advisor_without_key() {
        assert!(build_advisor(&Config::default()).unwrap().is_none());

        let config = Config {
            gemini_api_key: Some("key".to_string()),
            ..Config::default()
        };
        assert!(build_advisor(&config).unwrap().is_some());
    }
}
