// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit model for storage and the engine.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Color used for habits created without an explicit color.
pub const DEFAULT_HABIT_COLOR: &str = "#6366f1";
/// Icon used for habits created without an explicit icon.
pub const DEFAULT_HABIT_ICON: &str = "✨";

/// How much a habit matters; sets its default reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Coins (and XP) awarded for completing a habit of this priority.
    pub fn default_coin_value(self) -> u32 {
        match self {
            Priority::Low => 5,
            Priority::Medium => 10,
            Priority::High => 20,
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Whether a habit repeats every day or is done once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Once,
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "once" | "one-time" => Ok(Frequency::Once),
            other => Err(format!("unknown frequency: {}", other)),
        }
    }
}

/// A tracked task.
///
/// Field names serialize in camelCase so records stay compatible with the
/// web client and the REST store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Opaque identifier (also used as document ID)
    pub id: String,
    pub title: String,
    /// True only for the current day (daily) or once done (once)
    #[serde(default)]
    pub completed: bool,
    /// Consecutive completions of this habit
    #[serde(default)]
    pub streak: u32,
    /// Last completion time (ISO 8601)
    #[serde(default)]
    pub last_completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub frequency: Frequency,
    /// Wall-clock hint ("14:30"), display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    /// Reward on completion, penalty on un-completion
    #[serde(default)]
    pub coin_value: u32,
}

fn default_color() -> String {
    DEFAULT_HABIT_COLOR.to_string()
}

impl Habit {
    /// Build a fresh, not-yet-completed habit from validated input.
    pub fn from_new(id: String, new: NewHabit) -> Self {
        let coin_value = new
            .coin_value
            .unwrap_or_else(|| new.priority.default_coin_value());
        Self {
            id,
            title: new.title.trim().to_string(),
            completed: false,
            streak: 0,
            last_completed: None,
            icon: Some(new.icon.unwrap_or_else(|| DEFAULT_HABIT_ICON.to_string())),
            color: new.color.unwrap_or_else(default_color),
            priority: new.priority,
            frequency: new.frequency,
            scheduled_time: new.scheduled_time,
            coin_value,
        }
    }

    pub fn is_daily(&self) -> bool {
        self.frequency == Frequency::Daily
    }
}

/// User input for creating a habit.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub frequency: Frequency,
    #[validate(custom(function = "validate_scheduled_time"))]
    pub scheduled_time: Option<String>,
    /// Overrides the priority-derived reward
    #[validate(range(max = 1000))]
    pub coin_value: Option<u32>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl NewHabit {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn scheduled_at(mut self, time: impl Into<String>) -> Self {
        self.scheduled_time = Some(time.into());
        self
    }

    pub fn coin_value(mut self, coins: u32) -> Self {
        self.coin_value = Some(coins);
        self
    }
}

const MAX_TITLE_LEN: usize = 100;

fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::new("title_empty"));
    }
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::new("title_too_long"));
    }
    Ok(())
}

/// Accepts 24-hour "HH:MM".
fn validate_scheduled_time(time: &str) -> Result<(), ValidationError> {
    let valid = chrono::NaiveTime::parse_from_str(time, "%H:%M").is_ok() && time.len() == 5;
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("scheduled_time_format"))
    }
}

/// A habit proposed by the advisory generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitSuggestion {
    pub title: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

impl Default for HabitSuggestion {
    /// Suggestion used whenever the generator fails.
    fn default() -> Self {
        Self {
            title: "Drink Water".to_string(),
            color: "#3B82F6".to_string(),
            icon: "💧".to_string(),
        }
    }
}

impl HabitSuggestion {
    /// Turn the suggestion into creatable input: medium priority, daily.
    pub fn into_new_habit(self) -> NewHabit {
        let color = if self.color.trim().is_empty() {
            "#F472B6".to_string()
        } else {
            self.color
        };
        let icon = if self.icon.trim().is_empty() {
            "🎀".to_string()
        } else {
            self.icon
        };
        NewHabit {
            title: self.title,
            priority: Priority::Medium,
            frequency: Frequency::Daily,
            scheduled_time: None,
            coin_value: Some(Priority::Medium.default_coin_value()),
            icon: Some(icon),
            color: Some(color),
        }
    }
}
