// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first if present.

use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::time_utils::{local_offset, parse_utc_offset};

/// Where habits and stats are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// In-process store, mirrored to `data_dir` when set
    Local,
    /// Remote REST habit store at `api_base_url`
    Http,
    /// Google Cloud Firestore in `gcp_project_id`
    Firestore,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "memory" => Ok(Backend::Local),
            "http" | "rest" => Ok(Backend::Http),
            "firestore" => Ok(Backend::Firestore),
            _ => Err(ConfigError::Invalid {
                name: "HABIT_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Persistence ---
    pub backend: Backend,
    /// Directory for the local backend's JSON files
    pub data_dir: Option<PathBuf>,
    /// Base URL of the REST habit store
    pub api_base_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Document ID of the stats record. Habits are not scoped by it.
    pub profile_id: String,

    // --- Calendar ---
    /// Offset that defines where calendar days start
    pub utc_offset: FixedOffset,

    // --- Advisory ---
    /// Gemini API key; no key means fallbacks only
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub advisory_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            data_dir: None,
            api_base_url: "http://localhost:3000/api".to_string(),
            gcp_project_id: "test-project".to_string(),
            profile_id: "default".to_string(),
            utc_offset: FixedOffset::east_opt(0).unwrap_or_else(local_offset),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            advisory_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = match var("HABIT_BACKEND") {
            Some(value) => value.parse()?,
            None => Backend::Local,
        };

        let utc_offset = match var("HABIT_UTC_OFFSET") {
            Some(value) => parse_utc_offset(&value).ok_or(ConfigError::Invalid {
                name: "HABIT_UTC_OFFSET",
                value,
            })?,
            None => local_offset(),
        };

        let advisory_timeout = match var("ADVISORY_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.parse().map_err(|_| ConfigError::Invalid {
                    name: "ADVISORY_TIMEOUT_SECS",
                    value: value.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(10),
        };

        Ok(Self {
            backend,
            data_dir: var("HABIT_DATA_DIR").map(PathBuf::from),
            api_base_url: var("API_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000/api".to_string()),
            gcp_project_id: var("GCP_PROJECT_ID").unwrap_or_else(|| "local-dev".to_string()),
            profile_id: var("HABIT_PROFILE_ID").unwrap_or_else(|| "default".to_string()),
            utc_offset,
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            advisory_timeout,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
