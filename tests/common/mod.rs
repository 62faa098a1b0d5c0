// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use habit_hero::db::{FirestoreDb, LocalGateway, PersistenceGateway};
use habit_hero::error::{AppError, Result};
use habit_hero::models::{Frequency, Habit, Priority, UserStats};
use habit_hero::services::{EngineEvent, HabitEngine};
use habit_hero::time_utils::format_utc_rfc3339;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db(profile_id: &str) -> FirestoreDb {
    FirestoreDb::new("test-project", profile_id)
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// UTC; calendar days start at midnight UTC in tests.
#[allow(dead_code)]
pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// Fixed instant at `y-m-d h:00:00Z`.
#[allow(dead_code)]
pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn habit(id: &str, coin_value: u32) -> Habit {
    Habit {
        id: id.to_string(),
        title: format!("Habit {}", id),
        completed: false,
        streak: 0,
        last_completed: None,
        icon: None,
        color: "#6366f1".to_string(),
        priority: Priority::Medium,
        frequency: Frequency::Daily,
        scheduled_time: None,
        coin_value,
    }
}

/// Stats last seen at `login` with the given day streak.
#[allow(dead_code)]
pub fn stats_at(login: DateTime<Utc>, total_streak: u32) -> UserStats {
    UserStats {
        total_streak,
        last_login_date: Some(format_utc_rfc3339(login)),
        ..UserStats::default()
    }
}

/// Gateway operations that can be made to fail.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    GetHabits,
    CreateHabit,
    UpdateHabit,
    DeleteHabit,
    GetStats,
    UpdateStats,
}

const OPS: usize = 6;

/// In-memory gateway with per-operation failure switches and call counters.
pub struct FlakyGateway {
    inner: LocalGateway,
    failing: [AtomicBool; OPS],
    calls: [AtomicUsize; OPS],
}

#[allow(dead_code)]
impl FlakyGateway {
    pub fn new(habits: Vec<Habit>, stats: Option<UserStats>) -> Arc<Self> {
        Arc::new(Self {
            inner: LocalGateway::with_state(habits, stats),
            failing: Default::default(),
            calls: Default::default(),
        })
    }

    pub fn fail(&self, op: Op, failing: bool) {
        self.failing[op as usize].store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls[op as usize].load(Ordering::SeqCst)
    }

    /// What the backend currently stores.
    pub async fn stored_habits(&self) -> Vec<Habit> {
        self.inner.get_habits().await.unwrap()
    }

    pub async fn stored_stats(&self) -> UserStats {
        self.inner.get_user_stats().await.unwrap()
    }

    fn enter(&self, op: Op) -> Result<()> {
        self.calls[op as usize].fetch_add(1, Ordering::SeqCst);
        if self.failing[op as usize].load(Ordering::SeqCst) {
            return Err(AppError::Connectivity(format!("{:?} unavailable", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for FlakyGateway {
    async fn get_habits(&self) -> Result<Vec<Habit>> {
        self.enter(Op::GetHabits)?;
        self.inner.get_habits().await
    }

    async fn create_habit(&self, habit: &Habit) -> Result<Habit> {
        self.enter(Op::CreateHabit)?;
        self.inner.create_habit(habit).await
    }

    async fn update_habit(&self, habit: &Habit) -> Result<Habit> {
        self.enter(Op::UpdateHabit)?;
        self.inner.update_habit(habit).await
    }

    async fn delete_habit(&self, id: &str) -> Result<()> {
        self.enter(Op::DeleteHabit)?;
        self.inner.delete_habit(id).await
    }

    async fn get_user_stats(&self) -> Result<UserStats> {
        self.enter(Op::GetStats)?;
        self.inner.get_user_stats().await
    }

    async fn update_user_stats(&self, stats: &UserStats) -> Result<UserStats> {
        self.enter(Op::UpdateStats)?;
        self.inner.update_user_stats(stats).await
    }
}

/// Engine over a [`FlakyGateway`], calendar days in UTC, no advisor.
#[allow(dead_code)]
pub fn test_engine(gateway: &Arc<FlakyGateway>) -> HabitEngine {
    HabitEngine::new(gateway.clone(), None, utc())
}

/// Drain every event published so far.
#[allow(dead_code)]
pub fn drain(events: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
