// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod habit;
pub mod stats;

pub use habit::{Frequency, Habit, HabitSuggestion, NewHabit, Priority};
pub use stats::{DayStats, UserStats};
