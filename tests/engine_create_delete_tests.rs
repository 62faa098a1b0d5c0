// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Optimistic create and delete with revert on gateway failure, plus
//! the advisory-backed operations.

use async_trait::async_trait;
use habit_hero::error::{AppError, Result};
use habit_hero::models::{Frequency, Habit, HabitSuggestion, NewHabit, Priority, UserStats};
use habit_hero::services::advisory::FALLBACK_MOTIVATION;
use habit_hero::services::{AdvisoryGenerator, EngineEvent, HabitEngine};
use std::sync::Arc;

mod common;
use common::{at, drain, habit, stats_at, test_engine, utc, FlakyGateway, Op};

async fn loaded(habits: Vec<Habit>) -> (Arc<FlakyGateway>, HabitEngine) {
    let gateway = FlakyGateway::new(habits, Some(stats_at(at(2024, 6, 1, 8), 0)));
    let engine = test_engine(&gateway);
    engine.load_at(at(2024, 6, 1, 9)).await.unwrap();
    (gateway, engine)
}

// ═══════════════════════════════════════════════════════════════════════════
// CREATE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_uses_priority_reward() {
    let (gateway, engine) = loaded(vec![]).await;

    let created = engine
        .create_habit(
            NewHabit::new("  Stretch  ")
                .priority(Priority::High)
                .scheduled_at("07:30"),
        )
        .await
        .unwrap();

    assert_eq!(created.title, "Stretch");
    assert_eq!(created.coin_value, 20);
    assert_eq!(created.frequency, Frequency::Daily);
    assert_eq!(created.scheduled_time.as_deref(), Some("07:30"));
    assert!(!created.completed);
    assert_eq!(created.streak, 0);
    assert!(!created.id.is_empty());

    assert_eq!(engine.habits(), vec![created.clone()]);
    assert_eq!(gateway.stored_habits().await, vec![created]);
}

#[tokio::test]
async fn test_create_ids_are_unique() {
    let (_gateway, engine) = loaded(vec![]).await;

    let a = engine.create_habit(NewHabit::new("Walk")).await.unwrap();
    let b = engine.create_habit(NewHabit::new("Walk")).await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(engine.habits().len(), 2);
}

#[tokio::test]
async fn test_create_failure_reverts() {
    let (gateway, engine) = loaded(vec![habit("1", 10)]).await;
    gateway.fail(Op::CreateHabit, true);
    let mut events = engine.subscribe();

    let err = engine
        .create_habit(NewHabit::new("Meditate"))
        .await
        .unwrap_err();

    assert!(err.is_connectivity());
    let habits = engine.habits();
    assert_eq!(habits.len(), 1);
    assert!(habits.iter().all(|h| h.title != "Meditate"));

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        EngineEvent::AddFailed { habit, .. } if habit.title == "Meditate"
    ));
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let (gateway, engine) = loaded(vec![]).await;

    for new in [
        NewHabit::new("   "),
        NewHabit::new("x".repeat(101)),
        NewHabit::new("Read").scheduled_at("25:00"),
        NewHabit::new("Read").scheduled_at("7:30"),
        NewHabit::new("Read").coin_value(5000),
    ] {
        let err = engine.create_habit(new).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "got {:?}", err);
    }

    assert!(engine.habits().is_empty());
    assert_eq!(gateway.calls(Op::CreateHabit), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// DELETE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_delete_removes_habit() {
    let (gateway, engine) = loaded(vec![habit("1", 10), habit("2", 5)]).await;

    assert!(engine.delete_habit("1").await.unwrap());

    let ids: Vec<String> = engine.habits().into_iter().map(|h| h.id).collect();
    assert_eq!(ids, vec!["2".to_string()]);
    assert_eq!(gateway.stored_habits().await.len(), 1);
}

#[tokio::test]
async fn test_delete_failure_restores_position() {
    let (gateway, engine) = loaded(vec![habit("1", 10), habit("2", 5), habit("3", 20)]).await;
    gateway.fail(Op::DeleteHabit, true);
    let mut events = engine.subscribe();

    let err = engine.delete_habit("2").await.unwrap_err();

    assert!(err.is_connectivity());
    let ids: Vec<String> = engine.habits().into_iter().map(|h| h.id).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let events = drain(&mut events);
    assert!(matches!(
        &events[..],
        [EngineEvent::DeleteFailed { habit, .. }] if habit.id == "2"
    ));
}

#[tokio::test]
async fn test_delete_unknown_id_is_noop() {
    let (gateway, engine) = loaded(vec![habit("1", 10)]).await;

    assert!(!engine.delete_habit("missing").await.unwrap());
    assert_eq!(engine.habits().len(), 1);
    assert_eq!(gateway.calls(Op::DeleteHabit), 0);
}

#[tokio::test]
async fn test_delete_keeps_history() {
    let (_gateway, engine) = loaded(vec![habit("1", 10), habit("2", 5)]).await;
    engine.toggle_at("1", at(2024, 6, 1, 10)).unwrap();

    engine.delete_habit("1").await.unwrap();

    let day = engine.stats().history["2024-06-01"];
    assert_eq!((day.completed, day.total), (1, 2));
}

// ═══════════════════════════════════════════════════════════════════════════
// ADVISORY
// ═══════════════════════════════════════════════════════════════════════════

struct CannedAdvisor {
    fail: bool,
}

#[async_trait]
impl AdvisoryGenerator for CannedAdvisor {
    async fn motivate(&self, stats: &UserStats, habits: &[Habit]) -> Result<String> {
        if self.fail {
            return Err(AppError::Advisory("offline".to_string()));
        }
        Ok(format!("Level {} with {} habits!", stats.level, habits.len()))
    }

    async fn suggest_habit(&self, existing_titles: &[String]) -> Result<HabitSuggestion> {
        if self.fail {
            return Err(AppError::Advisory("offline".to_string()));
        }
        assert!(existing_titles.contains(&"Habit 1".to_string()));
        Ok(HabitSuggestion {
            title: "Journal".to_string(),
            color: String::new(),
            icon: "📓".to_string(),
        })
    }
}

async fn engine_with_advisor(fail: bool) -> HabitEngine {
    let gateway = FlakyGateway::new(vec![habit("1", 10)], Some(stats_at(at(2024, 6, 1, 8), 0)));
    let engine = HabitEngine::new(gateway, Some(Arc::new(CannedAdvisor { fail })), utc());
    engine.load_at(at(2024, 6, 1, 9)).await.unwrap();
    engine
}

#[tokio::test]
async fn test_motivate_uses_advisor() {
    let engine = engine_with_advisor(false).await;
    assert_eq!(engine.motivate().await, "Level 1 with 1 habits!");
}

#[tokio::test]
async fn test_motivate_falls_back() {
    let engine = engine_with_advisor(true).await;
    assert_eq!(engine.motivate().await, FALLBACK_MOTIVATION);

    let (_gateway, engine) = loaded(vec![]).await;
    assert_eq!(engine.motivate().await, FALLBACK_MOTIVATION);
}

#[tokio::test]
async fn test_add_suggested_habit() {
    let engine = engine_with_advisor(false).await;

    let added = engine.add_suggested_habit().await.unwrap();

    assert_eq!(added.title, "Journal");
    assert_eq!(added.icon.as_deref(), Some("📓"));
    assert_eq!(added.color, "#F472B6");
    assert_eq!(added.priority, Priority::Medium);
    assert_eq!(added.frequency, Frequency::Daily);
    assert_eq!(added.coin_value, 10);
    assert_eq!(engine.habits().len(), 2);
}

#[tokio::test]
async fn test_add_suggested_habit_falls_back() {
    let engine = engine_with_advisor(true).await;

    let added = engine.add_suggested_habit().await.unwrap();

    assert_eq!(added.title, "Drink Water");
    assert_eq!(added.icon.as_deref(), Some("💧"));
}
