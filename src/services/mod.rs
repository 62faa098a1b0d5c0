// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod advisory;
pub mod calendar;
pub mod engine;
pub mod reconcile;

pub use advisory::{AdvisoryGenerator, GeminiAdvisor};
pub use engine::{EngineEvent, HabitEngine, LoadOutcome, ToggleOutcome};
pub use reconcile::{HabitState, Rollover, Toggle};
