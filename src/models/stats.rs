// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User statistics: progression counters and per-day history aggregates.
//!
//! The record is rewritten wholesale on every toggle and rollover, so every
//! mutation goes through the methods here to keep `level` and the history
//! invariants intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Habit;
use crate::time_utils::format_utc_rfc3339;

/// XP needed per level.
pub const XP_PER_LEVEL: u32 = 100;

/// Completion aggregate for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    pub completed: u32,
    pub total: u32,
    pub all_completed: bool,
}

impl DayStats {
    /// Aggregate the current completion state of `habits`.
    pub fn from_habits(habits: &[Habit]) -> Self {
        let completed = habits.iter().filter(|h| h.completed).count() as u32;
        let total = habits.len() as u32;
        Self {
            completed,
            total,
            all_completed: completed == total && total > 0,
        }
    }
}

/// Progression record for the (single) user.
///
/// Stored at: `user_stats/{profile_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    // ─── Progression ─────────────────────────────────────────────
    /// Always `xp / 100 + 1`
    #[serde(default = "initial_level")]
    pub level: u32,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub coins: u32,

    // ─── Streaks ─────────────────────────────────────────────────
    /// Consecutive days with at least one completion
    #[serde(default)]
    pub total_streak: u32,
    /// High-water mark; stored but not maintained by the engine
    #[serde(default)]
    pub max_streak: u32,
    /// Last time rollover ran (ISO 8601)
    #[serde(default)]
    pub last_login_date: Option<String>,

    // ─── Companion ───────────────────────────────────────────────
    /// 0-100, display only
    #[serde(default = "initial_health")]
    pub health: u32,

    // ─── Time Series ─────────────────────────────────────────────
    /// Per-day aggregates keyed by "YYYY-MM-DD"
    #[serde(default)]
    pub history: HashMap<String, DayStats>,
}

fn initial_level() -> u32 {
    1
}

fn initial_health() -> u32 {
    100
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            level: initial_level(),
            xp: 0,
            coins: 0,
            total_streak: 0,
            max_streak: 0,
            last_login_date: None,
            health: initial_health(),
            history: HashMap::new(),
        }
    }
}

/// Level for a given XP total.
pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

impl UserStats {
    /// Record for a brand-new user, considered logged in at `now`.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            last_login_date: Some(format_utc_rfc3339(now)),
            ..Self::default()
        }
    }

    /// Credit a completion worth `coin_value`.
    ///
    /// `first_of_day` extends the day streak; later completions on the same
    /// day leave it alone.
    pub fn credit_completion(&mut self, coin_value: u32, first_of_day: bool) {
        self.xp = self.xp.saturating_add(coin_value);
        self.coins = self.coins.saturating_add(coin_value);
        self.level = level_for_xp(self.xp);
        if first_of_day {
            self.total_streak = self.total_streak.saturating_add(1);
        }
    }

    /// Charge an un-completion. Only coins are taken back, clamped at zero.
    pub fn charge_uncompletion(&mut self, coin_value: u32) {
        self.coins = self.coins.saturating_sub(coin_value);
    }

    /// Overwrite the history entry for `day_key`.
    pub fn record_day(&mut self, day_key: String, day: DayStats) {
        self.history.insert(day_key, day);
    }

    /// Restore the derived `level` after loading a record written elsewhere.
    pub fn normalize(&mut self) {
        self.level = level_for_xp(self.xp);
    }
}
