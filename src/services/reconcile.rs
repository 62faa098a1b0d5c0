// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pure state transitions for habits and stats.
//!
//! Nothing in here performs I/O or reads the clock: callers pass `now` and
//! the UTC offset that defines calendar days, and get back a description of
//! what changed so they can decide what to persist.

use chrono::{DateTime, FixedOffset, Utc};

use crate::models::{DayStats, Habit, UserStats};
use crate::time_utils::{calendar_date, day_key, format_utc_rfc3339, parse_calendar_date};

/// The habit list and stats record, owned as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitState {
    pub habits: Vec<Habit>,
    pub stats: UserStats,
}

impl HabitState {
    pub fn new(habits: Vec<Habit>, stats: UserStats) -> Self {
        Self { habits, stats }
    }

    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }
}

/// What a day rollover changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollover {
    /// Calendar days between the last login and today
    pub days_elapsed: i64,
    /// At least one whole day was skipped
    pub streak_broken: bool,
    /// `total_streak` before the rollover
    pub previous_streak: u32,
    /// Daily habits that went from completed to not completed
    pub reset_habit_ids: Vec<String>,
}

/// Detect a new calendar day since `stats.last_login_date` and apply it.
///
/// Returns `None` (and leaves `state` untouched) on the same calendar day.
pub fn apply_rollover(
    state: &mut HabitState,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<Rollover> {
    let today = calendar_date(now, offset);
    let last_login = match state.stats.last_login_date.as_deref() {
        Some(raw) => {
            let parsed = parse_calendar_date(raw, offset);
            if parsed.is_none() {
                tracing::warn!(
                    last_login_date = raw,
                    "Unparseable last login date, starting a new day"
                );
            }
            parsed
        }
        None => Some(today),
    };

    if last_login == Some(today) {
        return None;
    }

    // An unreadable stamp counts as a single day so it gets rewritten
    // without breaking the streak.
    let days_elapsed = last_login.map_or(1, |date| (today - date).num_days());

    let mut reset_habit_ids = Vec::new();
    for habit in state.habits.iter_mut().filter(|h| h.is_daily()) {
        if habit.completed {
            habit.completed = false;
            reset_habit_ids.push(habit.id.clone());
        }
    }

    let previous_streak = state.stats.total_streak;
    let streak_broken = days_elapsed > 1;
    if streak_broken {
        state.stats.total_streak = 0;
    }
    state.stats.last_login_date = Some(format_utc_rfc3339(now));

    Some(Rollover {
        days_elapsed,
        streak_broken,
        previous_streak,
        reset_habit_ids,
    })
}

/// What a toggle changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Toggle {
    /// The habit after the toggle
    pub habit: Habit,
    /// The toggle marked the habit done (as opposed to undoing it)
    pub completed_now: bool,
    /// This was the first completion of the day and extended the day streak
    pub started_day: bool,
    pub day_key: String,
    pub day: DayStats,
}

/// Flip one habit's completion and settle rewards and today's history entry.
///
/// Returns `None` when no habit has `id`.
pub fn apply_toggle(
    state: &mut HabitState,
    id: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<Toggle> {
    let index = state.habits.iter().position(|h| h.id == id)?;
    let coin_value = state.habits[index].coin_value;
    let others_done = state
        .habits
        .iter()
        .any(|h| h.id != id && h.completed);

    let habit = &mut state.habits[index];
    let completed_now = !habit.completed;
    habit.completed = completed_now;
    if completed_now {
        habit.streak = habit.streak.saturating_add(1);
        habit.last_completed = Some(format_utc_rfc3339(now));
    } else {
        habit.streak = habit.streak.saturating_sub(1);
    }
    let habit = habit.clone();

    let started_day = completed_now && !others_done;
    if completed_now {
        state.stats.credit_completion(coin_value, started_day);
    } else {
        state.stats.charge_uncompletion(coin_value);
    }

    let key = day_key(calendar_date(now, offset));
    let day = DayStats::from_habits(&state.habits);
    state.stats.record_day(key.clone(), day);

    Some(Toggle {
        habit,
        completed_now,
        started_day,
        day_key: key,
        day,
    })
}
