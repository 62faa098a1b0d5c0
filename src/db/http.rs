// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST gateway for a remote habit store.
//!
//! Endpoints (relative to the base URL):
//! - `GET /habits`, `POST /habits`
//! - `PUT /habits/{id}`, `DELETE /habits/{id}`
//! - `GET /stats`, `PUT /stats`

use crate::db::PersistenceGateway;
use crate::error::{AppError, Result};
use crate::models::{Habit, UserStats};
use async_trait::async_trait;
use serde::Deserialize;

/// HTTP client for the habit store API.
#[derive(Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn habit_url(&self, id: &str) -> String {
        format!("{}/habits/{}", self.base_url, urlencoding::encode(id))
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(rejected(response).await)
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed habit store response: {}", e)))
    }
}

async fn rejected(response: reqwest::Response) -> AppError {
    let status = response.status();
    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), path = %url, "Habit store rejected request");

    if status == reqwest::StatusCode::NOT_FOUND {
        return AppError::NotFound(url);
    }
    AppError::GatewayStatus {
        status: status.as_u16(),
        body,
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::Connectivity(e.to_string())
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn get_habits(&self) -> Result<Vec<Habit>> {
        let response = self
            .http
            .get(format!("{}/habits", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;
        self.check_response_json(response).await
    }

    async fn create_habit(&self, habit: &Habit) -> Result<Habit> {
        let response = self
            .http
            .post(format!("{}/habits", self.base_url))
            .json(habit)
            .send()
            .await
            .map_err(transport_error)?;
        self.check_response_json(response).await
    }

    async fn update_habit(&self, habit: &Habit) -> Result<Habit> {
        let response = self
            .http
            .put(self.habit_url(&habit.id))
            .json(habit)
            .send()
            .await
            .map_err(transport_error)?;
        self.check_response_json(response).await
    }

    async fn delete_habit(&self, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.habit_url(id))
            .send()
            .await
            .map_err(transport_error)?;
        self.check_response(response).await
    }

    async fn get_user_stats(&self) -> Result<UserStats> {
        let response = self
            .http
            .get(format!("{}/stats", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;
        let mut stats: UserStats = self.check_response_json(response).await?;
        stats.normalize();
        Ok(stats)
    }

    async fn update_user_stats(&self, stats: &UserStats) -> Result<UserStats> {
        let response = self
            .http
            .put(format!("{}/stats", self.base_url))
            .json(stats)
            .send()
            .await
            .map_err(transport_error)?;
        self.check_response_json(response).await
    }
}
