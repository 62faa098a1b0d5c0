// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing the persistence gateway.
//!
//! Layout:
//! - `habits/{habit_id}`: one document per habit, shared by every profile
//! - `user_stats/{profile_id}`: the stats record
//!
//! The profile id only selects the stats record. Two profiles on the same
//! project see the same habit list.

use crate::db::{collections, PersistenceGateway};
use crate::error::{AppError, Result};
use crate::models::{Habit, UserStats};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    profile_id: String,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, profile_id: &str) -> Result<Self> {
        // The emulator takes an unauthenticated connection.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id, profile_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, profile = profile_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            profile_id: profile_id.to_string(),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str, profile_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            profile_id: profile_id.to_string(),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            profile_id: "default".to_string(),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl PersistenceGateway for FirestoreDb {
    // ─── Habit Operations ────────────────────────────────────────

    async fn get_habits(&self) -> Result<Vec<Habit>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::HABITS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_habit(&self, habit: &Habit) -> Result<Habit> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::HABITS)
            .document_id(&habit.id)
            .object(habit)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(habit.clone())
    }

    async fn update_habit(&self, habit: &Habit) -> Result<Habit> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::HABITS)
            .document_id(&habit.id)
            .object(habit)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(habit.clone())
    }

    async fn delete_habit(&self, id: &str) -> Result<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::HABITS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── User Stats Operations ──────────────────────────────────

    async fn get_user_stats(&self) -> Result<UserStats> {
        let stored: Option<UserStats> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_STATS)
            .obj()
            .one(&self.profile_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(match stored {
            Some(mut stats) => {
                stats.normalize();
                stats
            }
            None => {
                tracing::debug!(profile = %self.profile_id, "No stats stored, using initial record");
                UserStats::initial(chrono::Utc::now())
            }
        })
    }

    async fn update_user_stats(&self, stats: &UserStats) -> Result<UserStats> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_STATS)
            .document_id(&self.profile_id)
            .object(stats)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(stats.clone())
    }
}
