// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local gateway: an in-process store, optionally mirrored to JSON files.
//!
//! Used for offline operation and as the default backend of the CLI. With a
//! data directory every write rewrites `hero_habits.json` /
//! `hero_stats.json`; without one, data lives only as long as the process.

use crate::db::PersistenceGateway;
use crate::error::{AppError, Result};
use crate::models::{Frequency, Habit, Priority, UserStats};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub const HABITS_FILE: &str = "hero_habits.json";
pub const STATS_FILE: &str = "hero_stats.json";

/// Habits a new user starts with.
pub fn default_habits() -> Vec<Habit> {
    vec![
        Habit {
            id: "1".to_string(),
            title: "Drink Water".to_string(),
            completed: false,
            streak: 0,
            last_completed: None,
            icon: Some("💧".to_string()),
            color: "#60A5FA".to_string(),
            priority: Priority::Medium,
            frequency: Frequency::Daily,
            scheduled_time: None,
            coin_value: 10,
        },
        Habit {
            id: "2".to_string(),
            title: "Read 10 Pages".to_string(),
            completed: false,
            streak: 0,
            last_completed: None,
            icon: Some("📚".to_string()),
            color: "#F472B6".to_string(),
            priority: Priority::Low,
            frequency: Frequency::Daily,
            scheduled_time: None,
            coin_value: 5,
        },
    ]
}

#[derive(Debug, Default)]
struct LocalStore {
    habits: Vec<Habit>,
    stats: Option<UserStats>,
}

/// Gateway backed by process memory and (optionally) a data directory.
#[derive(Debug)]
pub struct LocalGateway {
    dir: Option<PathBuf>,
    store: RwLock<LocalStore>,
}

impl LocalGateway {
    /// In-memory store seeded with the default habits.
    pub fn in_memory() -> Self {
        Self::with_state(default_habits(), None)
    }

    /// In-memory store with explicit contents.
    pub fn with_state(habits: Vec<Habit>, stats: Option<UserStats>) -> Self {
        Self {
            dir: None,
            store: RwLock::new(LocalStore { habits, stats }),
        }
    }

    /// Open (or start) a store mirrored to `dir`.
    ///
    /// Missing files mean a new user: default habits and initial stats.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create {}: {}", dir.display(), e)))?;

        let habits = read_json::<Vec<Habit>>(&dir.join(HABITS_FILE))
            .await?
            .unwrap_or_else(default_habits);
        let stats = read_json::<UserStats>(&dir.join(STATS_FILE)).await?;

        tracing::info!(
            path = %dir.display(),
            habits = habits.len(),
            has_stats = stats.is_some(),
            "Opened local habit store"
        );

        Ok(Self {
            dir: Some(dir),
            store: RwLock::new(LocalStore { habits, stats }),
        })
    }

    async fn flush_habits(&self, habits: &[Habit]) -> Result<()> {
        match &self.dir {
            Some(dir) => write_json(&dir.join(HABITS_FILE), habits).await,
            None => Ok(()),
        }
    }

    async fn flush_stats(&self, stats: &UserStats) -> Result<()> {
        match &self.dir {
            Some(dir) => write_json(&dir.join(STATS_FILE), stats).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PersistenceGateway for LocalGateway {
    async fn get_habits(&self) -> Result<Vec<Habit>> {
        Ok(self.store.read().await.habits.clone())
    }

    async fn create_habit(&self, habit: &Habit) -> Result<Habit> {
        let mut store = self.store.write().await;
        store.habits.push(habit.clone());
        self.flush_habits(&store.habits).await?;
        Ok(habit.clone())
    }

    async fn update_habit(&self, habit: &Habit) -> Result<Habit> {
        let mut store = self.store.write().await;
        if let Some(slot) = store.habits.iter_mut().find(|h| h.id == habit.id) {
            *slot = habit.clone();
            self.flush_habits(&store.habits).await?;
        } else {
            tracing::debug!(habit_id = %habit.id, "Update for unknown habit ignored");
        }
        Ok(habit.clone())
    }

    async fn delete_habit(&self, id: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.habits.retain(|h| h.id != id);
        self.flush_habits(&store.habits).await
    }

    async fn get_user_stats(&self) -> Result<UserStats> {
        Ok(self
            .store
            .read()
            .await
            .stats
            .clone()
            .unwrap_or_else(|| UserStats::initial(chrono::Utc::now())))
    }

    async fn update_user_stats(&self, stats: &UserStats) -> Result<UserStats> {
        let mut store = self.store.write().await;
        store.stats = Some(stats.clone());
        self.flush_stats(stats).await?;
        Ok(stats.clone())
    }
}

async fn read_json<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AppError::Database(format!("Corrupt {}: {}", path.display(), e))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Database(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Serialize {}: {}", path.display(), e)))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| AppError::Database(format!("Failed to write {}: {}", path.display(), e)))
}
