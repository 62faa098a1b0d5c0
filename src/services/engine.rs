// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit engine: owns the session state and keeps it in sync with the
//! persistence gateway.
//!
//! Every mutation is applied to memory first, under a short lock that is
//! never held across an `.await`, and persisted afterwards:
//! - toggles persist in a background task and only report failures
//! - creates and deletes wait for the gateway and undo themselves on failure
//!
//! Outcomes the UI should react to are published as [`EngineEvent`]s.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use futures_util::{stream, StreamExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use validator::Validate;

use crate::db::PersistenceGateway;
use crate::error::{AppError, Result};
use crate::models::{DayStats, Habit, HabitSuggestion, NewHabit, UserStats};
use crate::services::advisory::{self, AdvisoryGenerator};
use crate::services::reconcile::{apply_rollover, apply_toggle, HabitState, Rollover};
use crate::time_utils::calendar_date;

const MAX_CONCURRENT_DB_OPS: usize = 50;
const EVENT_CAPACITY: usize = 64;

/// Something the presentation layer may want to show.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A new calendar day started without breaking the streak.
    NewDay { days_elapsed: i64 },
    /// At least one whole day was skipped; the day streak was reset.
    StreakBroken {
        previous_streak: u32,
        days_elapsed: i64,
    },
    /// A habit was marked done.
    HabitCompleted { habit_id: String, coin_value: u32 },
    /// A toggle could not be persisted. Memory keeps the toggled state.
    SyncFailed { habit_id: String, error: String },
    /// A create was rejected by the gateway and has been undone.
    AddFailed { habit: Habit, error: String },
    /// A delete was rejected by the gateway and the habit restored.
    DeleteFailed { habit: Habit, error: String },
}

/// Result of [`HabitEngine::load`].
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub habits: Vec<Habit>,
    pub stats: UserStats,
    /// Present when a new calendar day was detected
    pub rollover: Option<Rollover>,
}

/// Result of [`HabitEngine::toggle`].
#[derive(Debug)]
pub struct ToggleOutcome {
    /// The habit after the toggle
    pub habit: Habit,
    pub completed_now: bool,
    /// First completion of the day (extended the day streak)
    pub started_day: bool,
    /// Today's history entry after the toggle
    pub day: DayStats,
    pub stats: UserStats,
    /// Background persistence; drop to detach
    pub sync: JoinHandle<()>,
}

struct EngineInner {
    gateway: Arc<dyn PersistenceGateway>,
    advisor: Option<Arc<dyn AdvisoryGenerator>>,
    offset: FixedOffset,
    state: Mutex<HabitState>,
    /// Serializes toggle persistence
    sync_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<EngineEvent>,
}

/// Owner of the habit list and stats for one session.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct HabitEngine {
    inner: Arc<EngineInner>,
}

impl HabitEngine {
    /// Create an engine. Calendar days are evaluated at `offset`.
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        advisor: Option<Arc<dyn AdvisoryGenerator>>,
        offset: FixedOffset,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(EngineInner {
                gateway,
                advisor,
                offset,
                state: Mutex::new(HabitState::default()),
                sync_lock: tokio::sync::Mutex::new(()),
                events,
            }),
        }
    }

    /// Receive events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    /// Copy of the current habits and stats.
    pub fn snapshot(&self) -> HabitState {
        self.state().clone()
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.state().habits.clone()
    }

    pub fn stats(&self) -> UserStats {
        self.state().stats.clone()
    }

    /// Today's date in the engine's offset.
    pub fn today(&self) -> NaiveDate {
        calendar_date(Utc::now(), self.inner.offset)
    }

    fn state(&self) -> MutexGuard<'_, HabitState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    // ─── Load & Rollover ─────────────────────────────────────────

    /// Fetch state from the gateway and apply any day rollover.
    pub async fn load(&self) -> Result<LoadOutcome> {
        self.load_at(Utc::now()).await
    }

    /// [`load`](Self::load) with an explicit clock.
    pub async fn load_at(&self, now: DateTime<Utc>) -> Result<LoadOutcome> {
        let gateway = &self.inner.gateway;
        let (habits, stats) = tokio::try_join!(gateway.get_habits(), gateway.get_user_stats())
            .map_err(|e| match e {
                AppError::Connectivity(_) => e,
                other => AppError::Connectivity(other.to_string()),
            })?;

        let mut loaded = HabitState::new(habits, stats);
        let rollover = apply_rollover(&mut loaded, now, self.inner.offset);
        *self.state() = loaded.clone();

        tracing::info!(
            habits = loaded.habits.len(),
            level = loaded.stats.level,
            total_streak = loaded.stats.total_streak,
            new_day = rollover.is_some(),
            "Habit state loaded"
        );

        if let Some(rollover) = &rollover {
            if rollover.streak_broken {
                tracing::info!(
                    days_elapsed = rollover.days_elapsed,
                    previous_streak = rollover.previous_streak,
                    "Streak broken by missed days"
                );
                self.emit(EngineEvent::StreakBroken {
                    previous_streak: rollover.previous_streak,
                    days_elapsed: rollover.days_elapsed,
                });
            } else {
                self.emit(EngineEvent::NewDay {
                    days_elapsed: rollover.days_elapsed,
                });
            }
            self.write_back_rollover(&loaded, rollover).await;
        }

        Ok(LoadOutcome {
            habits: loaded.habits,
            stats: loaded.stats,
            rollover,
        })
    }

    /// Persist what a rollover changed. Best-effort: failures are logged only.
    async fn write_back_rollover(&self, state: &HabitState, rollover: &Rollover) {
        let gateway = &self.inner.gateway;
        let reset: Vec<&Habit> = state
            .habits
            .iter()
            .filter(|h| rollover.reset_habit_ids.contains(&h.id))
            .collect();

        let habit_writes = stream::iter(reset)
            .map(|habit| async move { (habit.id.as_str(), gateway.update_habit(habit).await) })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<_>>();

        let (stats_result, habit_results) =
            tokio::join!(gateway.update_user_stats(&state.stats), habit_writes);

        if let Err(e) = stats_result {
            tracing::warn!(error = %e, "Failed to persist stats after rollover");
        }
        for (habit_id, result) in habit_results {
            if let Err(e) = result {
                tracing::warn!(habit_id, error = %e, "Failed to persist habit reset");
            }
        }
    }

    // ─── Toggle ──────────────────────────────────────────────────

    /// Flip a habit's completion. Returns `None` for an unknown id.
    ///
    /// Memory is updated before this returns; persistence runs in the
    /// background and reports failure as [`EngineEvent::SyncFailed`].
    /// Must be called from within a tokio runtime.
    pub fn toggle(&self, habit_id: &str) -> Option<ToggleOutcome> {
        self.toggle_at(habit_id, Utc::now())
    }

    /// [`toggle`](Self::toggle) with an explicit clock.
    pub fn toggle_at(&self, habit_id: &str, now: DateTime<Utc>) -> Option<ToggleOutcome> {
        let (toggle, stats) = {
            let mut state = self.state();
            let toggle = apply_toggle(&mut state, habit_id, now, self.inner.offset)?;
            (toggle, state.stats.clone())
        };

        tracing::debug!(
            habit_id,
            completed = toggle.completed_now,
            started_day = toggle.started_day,
            xp = stats.xp,
            coins = stats.coins,
            "Habit toggled"
        );

        if toggle.completed_now {
            self.emit(EngineEvent::HabitCompleted {
                habit_id: habit_id.to_string(),
                coin_value: toggle.habit.coin_value,
            });
        }

        let sync = self.spawn_sync(habit_id.to_string());

        Some(ToggleOutcome {
            habit: toggle.habit,
            completed_now: toggle.completed_now,
            started_day: toggle.started_day,
            day: toggle.day,
            stats,
            sync,
        })
    }

    /// Persist the habit and stats as they are when the task runs.
    ///
    /// Tasks take turns on `sync_lock` and read memory only once they hold
    /// it, so the last write always carries the latest toggle even if the
    /// tasks are scheduled out of order.
    fn spawn_sync(&self, habit_id: String) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            let _turn = engine.inner.sync_lock.lock().await;
            let (habit, stats) = {
                let state = engine.state();
                (state.habit(&habit_id).cloned(), state.stats.clone())
            };

            let gateway = &engine.inner.gateway;
            let habit_write = async {
                match &habit {
                    Some(habit) => gateway.update_habit(habit).await.map(|_| ()),
                    // Deleted since the toggle; only the stats remain to write.
                    None => Ok(()),
                }
            };
            let (habit_result, stats_result) =
                tokio::join!(habit_write, gateway.update_user_stats(&stats));

            let errors: Vec<String> = [habit_result.err(), stats_result.err()]
                .into_iter()
                .flatten()
                .map(|e| e.to_string())
                .collect();
            if errors.is_empty() {
                return;
            }

            let error = errors.join("; ");
            tracing::error!(habit_id = %habit_id, error = %error, "Failed to sync toggle");
            engine.emit(EngineEvent::SyncFailed { habit_id, error });
        })
    }

    // ─── Create / Delete ─────────────────────────────────────────

    /// Add a habit. It is visible immediately and removed again if the
    /// gateway rejects it.
    pub async fn create_habit(&self, new: NewHabit) -> Result<Habit> {
        new.validate()?;

        let habit = Habit::from_new(uuid::Uuid::new_v4().to_string(), new);
        self.state().habits.push(habit.clone());

        match self.inner.gateway.create_habit(&habit).await {
            Ok(_) => {
                tracing::info!(habit_id = %habit.id, title = %habit.title, "Habit created");
                Ok(habit)
            }
            Err(e) => {
                self.state().habits.retain(|h| h.id != habit.id);
                tracing::warn!(habit_id = %habit.id, error = %e, "Create failed, reverted");
                self.emit(EngineEvent::AddFailed {
                    habit,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Delete a habit. Returns `Ok(false)` when no habit has `habit_id`.
    ///
    /// On gateway failure the habit is put back at its old position.
    pub async fn delete_habit(&self, habit_id: &str) -> Result<bool> {
        let removed = {
            let mut state = self.state();
            state
                .habits
                .iter()
                .position(|h| h.id == habit_id)
                .map(|index| (index, state.habits.remove(index)))
        };
        let Some((index, habit)) = removed else {
            return Ok(false);
        };

        match self.inner.gateway.delete_habit(habit_id).await {
            Ok(()) => {
                tracing::info!(habit_id, "Habit deleted");
                Ok(true)
            }
            Err(e) => {
                {
                    let mut state = self.state();
                    let index = index.min(state.habits.len());
                    state.habits.insert(index, habit.clone());
                }
                tracing::warn!(habit_id, error = %e, "Delete failed, restored");
                self.emit(EngineEvent::DeleteFailed {
                    habit,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    // ─── Advisory ────────────────────────────────────────────────

    /// A motivational line for the current state. Never fails.
    pub async fn motivate(&self) -> String {
        let HabitState { habits, stats } = self.snapshot();
        advisory::motivate_or_fallback(self.inner.advisor.as_deref(), &stats, &habits).await
    }

    /// A habit idea. Never fails.
    pub async fn suggest(&self) -> HabitSuggestion {
        let habits = self.habits();
        advisory::suggest_or_fallback(self.inner.advisor.as_deref(), &habits).await
    }

    /// Ask for a suggestion and create it as a medium, daily habit.
    pub async fn add_suggested_habit(&self) -> Result<Habit> {
        let suggestion = self.suggest().await;
        self.create_habit(suggestion.into_new_habit()).await
    }
}
