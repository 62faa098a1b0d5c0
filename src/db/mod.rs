// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence layer: the gateway contract and its backends.

pub mod firestore;
pub mod http;
pub mod local;

pub use firestore::FirestoreDb;
pub use http::HttpGateway;
pub use local::LocalGateway;

use crate::error::Result;
use crate::models::{Habit, UserStats};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Habits (keyed by habit id)
    pub const HABITS: &str = "habits";
    /// User stats record (keyed by profile id)
    pub const USER_STATS: &str = "user_stats";
}

/// CRUD contract the engine persists through.
///
/// Every call may fail; the engine decides per operation whether a failure
/// is fatal, reverted, or only reported.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn get_habits(&self) -> Result<Vec<Habit>>;

    async fn create_habit(&self, habit: &Habit) -> Result<Habit>;

    async fn update_habit(&self, habit: &Habit) -> Result<Habit>;

    async fn delete_habit(&self, id: &str) -> Result<()>;

    /// Returns the initial record when nothing has been stored yet.
    async fn get_user_stats(&self) -> Result<UserStats>;

    async fn update_user_stats(&self, stats: &UserStats) -> Result<UserStats>;
}
