// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit Hero command-line driver.
//!
//! Loads state from the configured backend (rolling over to a new day if
//! needed), runs one command and waits for its writes to finish.

use anyhow::{anyhow, Context};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use habit_hero::{
    config::Config,
    models::{Frequency, Habit, NewHabit, Priority, UserStats},
    services::{
        calendar::{day_status, month_summary, planned_count, progress_percent, DayStatus},
        EngineEvent, HabitEngine,
    },
};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Habit Hero - level up by keeping your daily habits.
#[derive(Parser, Debug)]
#[command(name = "habit-hero", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show stats and today's habits.
    Status,
    /// Mark a habit done, or undo it.
    Toggle { id: String },
    /// Add a habit.
    Add {
        title: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
        /// Scheduled time of day (HH:MM)
        #[arg(long = "at")]
        scheduled_time: Option<String>,
        /// Coins awarded on completion; defaults by priority
        #[arg(long)]
        coins: Option<u32>,
    },
    /// Delete a habit.
    Delete { id: String },
    /// Print a motivational message.
    Motivate,
    /// Suggest a new habit.
    Suggest {
        /// Add the suggestion to the habit list
        #[arg(long)]
        add: bool,
    },
    /// Show the completion calendar for a month.
    Calendar {
        /// Month to show (YYYY-MM); defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(backend = ?config.backend, offset = %config.utc_offset, "Configuration loaded");

    let engine = habit_hero::build_engine(&config)
        .await
        .context("Failed to initialize habit engine")?;
    let mut events = engine.subscribe();

    let loaded = engine
        .load()
        .await
        .context("Unable to reach the habit store")?;
    report_events(&mut events);

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => print_status(&loaded.habits, &loaded.stats),
        Commands::Toggle { id } => {
            let outcome = engine
                .toggle(&id)
                .ok_or_else(|| anyhow!("No habit with id {}", id))?;
            outcome.sync.await.context("Sync task failed")?;

            if outcome.completed_now {
                println!("✔ {} (+{} coins)", outcome.habit.title, outcome.habit.coin_value);
            } else {
                println!("✘ {} undone", outcome.habit.title);
            }
            if outcome.started_day {
                println!("{}", streak_banner(outcome.stats.total_streak));
            }
            println!(
                "Today: {}/{} done",
                outcome.day.completed, outcome.day.total
            );
            report_events(&mut events);
        }
        Commands::Add {
            title,
            priority,
            frequency,
            scheduled_time,
            coins,
        } => {
            let mut new = NewHabit::new(title).priority(priority).frequency(frequency);
            if let Some(time) = scheduled_time {
                new = new.scheduled_at(time);
            }
            if let Some(coins) = coins {
                new = new.coin_value(coins);
            }
            let habit = engine.create_habit(new).await?;
            println!("Added {} [{}]", habit.title, habit.id);
        }
        Commands::Delete { id } => {
            if engine.delete_habit(&id).await? {
                println!("Deleted {}", id);
            } else {
                println!("No habit with id {}", id);
            }
        }
        Commands::Motivate => println!("{}", engine.motivate().await),
        Commands::Suggest { add } => {
            if add {
                let habit = engine.add_suggested_habit().await?;
                println!("Added {} {} [{}]", icon(&habit), habit.title, habit.id);
            } else {
                let suggestion = engine.suggest().await;
                println!("{} {} ({})", suggestion.icon, suggestion.title, suggestion.color);
            }
        }
        Commands::Calendar { month } => {
            let today = engine.today();
            let (year, month) = match month {
                Some(raw) => parse_month(&raw)?,
                None => (today.year(), today.month()),
            };
            print_calendar(&engine, year, month, today)?;
        }
    }

    Ok(())
}

fn streak_banner(days: u32) -> String {
    let unit = if days == 1 { "day" } else { "days" };
    format!("You've been taking care of yourself for {} {}!", days, unit)
}

fn icon(habit: &Habit) -> &str {
    habit
        .icon
        .as_deref()
        .unwrap_or(habit_hero::models::habit::DEFAULT_HABIT_ICON)
}

fn report_events(events: &mut broadcast::Receiver<EngineEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::NewDay { .. } => println!("A new day has begun. Your habits are reset."),
            EngineEvent::StreakBroken {
                previous_streak, ..
            } => println!("Streak lost after {} days. Start again today!", previous_streak),
            EngineEvent::SyncFailed { habit_id, error } => {
                eprintln!("Warning: could not save {}: {}", habit_id, error)
            }
            _ => {}
        }
    }
}

fn print_status(habits: &[Habit], stats: &UserStats) {
    println!(
        "Level {}  XP {}  Coins {}  Health {}",
        stats.level, stats.xp, stats.coins, stats.health
    );
    println!("{}", streak_banner(stats.total_streak));
    println!("Progress: {:.0}%", progress_percent(habits));
    println!();

    for habit in habits {
        let mark = if habit.completed { "x" } else { " " };
        let time = habit.scheduled_time.as_deref().unwrap_or("--:--");
        println!(
            "[{}] {} {} {:<30} {:>6} +{}  ({})",
            mark,
            time,
            icon(habit),
            habit.title,
            format!("{:?}", habit.priority).to_lowercase(),
            habit.coin_value,
            habit.id
        );
    }
}

fn parse_month(raw: &str) -> anyhow::Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month {:?}, expected YYYY-MM", raw))?;
    Ok((date.year(), date.month()))
}

fn print_calendar(
    engine: &HabitEngine,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let stats = engine.stats();
    let habits = engine.habits();
    let summary =
        month_summary(&stats, year, month, today).ok_or_else(|| anyhow!("Invalid month"))?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| anyhow!("Invalid month"))?;

    println!("{}", first.format("%B %Y"));
    println!("Mo Tu We Th Fr Sa Su");
    let lead = first.weekday().num_days_from_monday() as usize;
    let mut line = "   ".repeat(lead);
    for date in first.iter_days().take_while(|d| d.month() == month) {
        let cell = match day_status(&stats, date, today) {
            DayStatus::Perfect => "**".to_string(),
            DayStatus::Partial => "+ ".to_string(),
            DayStatus::Missed => "x ".to_string(),
            DayStatus::Empty | DayStatus::Future => format!("{:>2}", date.day()),
        };
        line.push_str(&cell);
        line.push(' ');
        if date.weekday().num_days_from_monday() == 6 {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }

    println!();
    println!(
        "Perfect {}  Partial {}  Missed {}  Planned per day {}",
        summary.perfect,
        summary.partial,
        summary.missed,
        planned_count(&habits)
    );
    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,habit_hero=debug"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
