//! # Tally Core Library
//!
//! Recurring transactions for a personal ledger: templates that describe a
//! repeating income or expense, and an engine that catches up on every
//! occurrence that fell due since the last run.
//!
//! ## Features
//!
//! - **Calendar-Aware Scheduling**: Day, week, month and year steps in a
//!   configurable IANA timezone, with month-end clamping and DST handling
//! - **Catch-Up Materialization**: One transaction per missed occurrence,
//!   capped per scan and isolated per template
//! - **Idempotent Writes**: A template never produces two transactions for
//!   the same occurrence date
//! - **Throttled Runs**: Scans triggered on startup are rate limited through
//!   a small persistent key-value store
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`repository`]: Data access layer with Repository pattern
//! - [`schedule`]: Next-occurrence calculation
//! - [`service`]: Input validation and template creation
//! - [`engine`]: Materialization scans and throttled catch-up
//! - [`state`], [`throttle`]: Scan throttling and its persistence
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tally_core::{
//!     db,
//!     engine::MaterializationEngine,
//!     models::{EngineConfig, NewTemplateInput, RepeatUnit},
//!     repository::{CategoryRepository, SqliteRepository},
//!     service,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("tally.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let category = repo.add_category("Housing".to_string()).await?;
//!     service::create_template(
//!         &repo,
//!         NewTemplateInput {
//!             title: "Rent".to_string(),
//!             amount: "850".to_string(),
//!             category_id: Some(category.id),
//!             repeat_interval: 1,
//!             repeat_unit: RepeatUnit::Month,
//!             start_date: 1_704_067_200,
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//!     let engine = MaterializationEngine::new(repo, EngineConfig::default())?;
//!     let outcome = engine.process_due_templates(chrono::Utc::now().timestamp()).await?;
//!     if let Some(summary) = outcome.summary() {
//!         println!("Added {} transactions", summary.added_count);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod repository;
pub mod schedule;
pub mod service;
pub mod state;
pub mod throttle;
