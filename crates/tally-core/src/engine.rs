//! Catch-up materialization of recurring templates.
//!
//! A scan reads every template whose cursor is due, writes one transaction per
//! missed occurrence and then moves the cursor past the last one written.
//! Templates are processed independently: a failure in one is recorded in the
//! summary and the scan carries on with the rest.

use crate::error::CoreError;
use crate::models::{EngineConfig, PeriodicTemplate, RepeatUnit, Transaction, TransactionDetails};
use crate::repository::PeriodicTemplateStore;
use crate::schedule::ScheduleCalculator;
use crate::service::{MAX_REPEAT_INTERVAL, MIN_REPEAT_INTERVAL};
use crate::state::KeyValueStore;
use crate::throttle::{Clock, ThrottleGate};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Appended to the notes of every generated transaction.
pub const AUTO_GENERATED_NOTE: &str = "Added automatically from a recurring transaction";

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// A template that could not be processed during a scan.
#[derive(Debug)]
pub struct TemplateError {
    pub template_id: Uuid,
    pub title: String,
    pub error: CoreError,
}

/// Statistics and results of one scan
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Number of due templates looked at
    pub templates_processed: usize,
    /// Total transactions written across all templates
    pub added_count: usize,
    /// The written transactions, in write order
    pub added_transactions: Vec<TransactionDetails>,
    pub template_errors: Vec<TemplateError>,
    /// Templates that hit the per-scan iteration cap and still have a backlog
    pub capped_templates: Vec<Uuid>,
    pub duration_ms: u64,
}

impl ScanSummary {
    pub fn has_errors(&self) -> bool {
        !self.template_errors.is_empty()
    }
}

#[derive(Debug)]
pub enum ScanOutcome {
    Completed(ScanSummary),
    /// Another scan on the same engine was still in progress
    AlreadyRunning,
}

impl ScanOutcome {
    pub fn summary(&self) -> Option<&ScanSummary> {
        match self {
            ScanOutcome::Completed(summary) => Some(summary),
            ScanOutcome::AlreadyRunning => None,
        }
    }

    pub fn into_summary(self) -> Option<ScanSummary> {
        match self {
            ScanOutcome::Completed(summary) => Some(summary),
            ScanOutcome::AlreadyRunning => None,
        }
    }
}

/// Notifications for list screens and other subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    TransactionsAdded { count: usize },
}

/// Clears the scan flag when dropped, including on early return.
struct ScanGuard<'a>(&'a AtomicBool);

impl<'a> ScanGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct MaterializationEngine<S> {
    store: S,
    config: EngineConfig,
    calculator: ScheduleCalculator,
    scanning: AtomicBool,
    events: broadcast::Sender<ScanEvent>,
}

impl<S: PeriodicTemplateStore> MaterializationEngine<S> {
    /// Creates an engine; fails if the configured timezone is unknown.
    pub fn new(store: S, config: EngineConfig) -> Result<Self, CoreError> {
        let calculator = ScheduleCalculator::from_timezone_name(&config.timezone)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            store,
            config,
            calculator,
            scanning: AtomicBool::new(false),
            events,
        })
    }

    /// Creates an engine with the default configuration (UTC calendar).
    pub fn with_defaults(store: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            config: EngineConfig::default(),
            calculator: ScheduleCalculator::utc(),
            scanning: AtomicBool::new(false),
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calculator(&self) -> &ScheduleCalculator {
        &self.calculator
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Materializes every occurrence due at or before `now`.
    ///
    /// Returns `ScanOutcome::AlreadyRunning` without touching the store if
    /// another call on this engine has not finished yet. Only the initial
    /// bulk read can fail the whole scan; per-template failures end up in
    /// `ScanSummary::template_errors`.
    #[tracing::instrument(skip(self))]
    pub async fn process_due_templates(&self, now: i64) -> Result<ScanOutcome, CoreError> {
        let Some(_guard) = ScanGuard::acquire(&self.scanning) else {
            tracing::info!("scan already in progress");
            return Ok(ScanOutcome::AlreadyRunning);
        };

        let started = Instant::now();
        let due = self.store.find_due(now).await?;
        let mut summary = ScanSummary::default();

        for template in due {
            summary.templates_processed += 1;
            let mut added = Vec::new();

            match self.process_template(&template, now, &mut added).await {
                Ok(capped) => {
                    if capped {
                        tracing::warn!(
                            template_id = %template.id,
                            cap = self.config.max_iterations_per_template,
                            "iteration cap reached, remaining occurrences wait for the next scan"
                        );
                        summary.capped_templates.push(template.id);
                    }
                }
                Err(error) => {
                    tracing::error!(
                        template_id = %template.id,
                        written = added.len(),
                        error = %error,
                        "failed to materialize template"
                    );
                    summary.template_errors.push(TemplateError {
                        template_id: template.id,
                        title: template.title.clone(),
                        error,
                    });
                }
            }

            summary.added_count += added.len();
            summary.added_transactions.extend(added);
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;

        if summary.added_count > 0 {
            // No subscribers is fine.
            let _ = self.events.send(ScanEvent::TransactionsAdded {
                count: summary.added_count,
            });
        }

        tracing::info!(
            templates = summary.templates_processed,
            added = summary.added_count,
            errors = summary.template_errors.len(),
            capped = summary.capped_templates.len(),
            duration_ms = summary.duration_ms,
            "scan finished"
        );

        Ok(ScanOutcome::Completed(summary))
    }

    /// Runs one template's catch-up loop, pushing written rows into `added`.
    ///
    /// Returns whether the iteration cap cut the loop short. The cursor is
    /// written once, after the loop; an error inside the loop leaves it as it was.
    async fn process_template(
        &self,
        template: &PeriodicTemplate,
        now: i64,
        added: &mut Vec<TransactionDetails>,
    ) -> Result<bool, CoreError> {
        if template.is_exhausted() {
            tracing::debug!(template_id = %template.id, "template past its end date");
            return Ok(false);
        }

        let unit = RepeatUnit::resolve(&template.repeat_unit, self.config.strict_repeat_units)?;
        let interval = u32::try_from(template.repeat_interval)
            .ok()
            .filter(|i| (MIN_REPEAT_INTERVAL..=MAX_REPEAT_INTERVAL).contains(&i64::from(*i)))
            .ok_or_else(|| {
                CoreError::CorruptRecord(format!(
                    "template {} has repeat interval {}",
                    template.id, template.repeat_interval
                ))
            })?;
        let tags = self.store.get_tags_for(template.id).await?;

        let max_iterations = self.config.max_iterations_per_template.max(1);
        let past_end = |cursor: i64| template.end_date.is_some_and(|end| cursor > end);

        let mut cursor = template.next_occurrence_date;
        let mut iterations = 0u32;

        while cursor <= now && iterations < max_iterations && !past_end(cursor) {
            let transaction = occurrence_transaction(template, cursor);
            match self.store.insert_occurrence(&transaction, &tags).await? {
                Some(details) => added.push(details),
                None => {
                    tracing::debug!(template_id = %template.id, cursor, "occurrence already materialized")
                }
            }
            cursor = self.calculator.next_occurrence(cursor, interval, unit);
            iterations += 1;
        }

        if cursor != template.next_occurrence_date {
            self.store.advance_cursor(template.id, cursor).await?;
        }

        tracing::debug!(template_id = %template.id, iterations, cursor, "template processed");
        Ok(iterations >= max_iterations && cursor <= now && !past_end(cursor))
    }
}

/// The transaction a template produces for the occurrence at `date`.
pub fn occurrence_transaction(template: &PeriodicTemplate, date: i64) -> Transaction {
    let notes = match template.notes.as_deref().map(str::trim) {
        Some(notes) if !notes.is_empty() => format!("{}\n\n{}", notes, AUTO_GENERATED_NOTE),
        _ => AUTO_GENERATED_NOTE.to_string(),
    };

    Transaction {
        id: Uuid::now_v7(),
        amount: template.amount,
        title: template.title.clone(),
        transaction_date: date,
        notes: Some(notes),
        location: None,
        category_id: template.category_id,
        periodic_transaction_id: Some(template.id),
        created_at: Utc::now().timestamp(),
    }
}

// ============================================================================
// Throttled catch-up
// ============================================================================

#[derive(Debug)]
pub enum CatchUpResult {
    /// The last scan was too recent
    Throttled { last_check: i64 },
    AlreadyRunning,
    Completed(ScanSummary),
}

/// Runs a scan when the throttle allows it and records its completion.
pub struct CatchUp<S, K, C> {
    engine: MaterializationEngine<S>,
    throttle: ThrottleGate<K, C>,
}

impl<S, K, C> CatchUp<S, K, C>
where
    S: PeriodicTemplateStore,
    K: KeyValueStore,
    C: Clock,
{
    pub fn new(engine: MaterializationEngine<S>, throttle: ThrottleGate<K, C>) -> Self {
        Self { engine, throttle }
    }

    pub fn engine(&self) -> &MaterializationEngine<S> {
        &self.engine
    }

    pub fn throttle(&self) -> &ThrottleGate<K, C> {
        &self.throttle
    }

    /// Scans at the clock's current time unless throttled. `force` skips the
    /// throttle check but still records the completed scan.
    pub async fn run(&self, force: bool) -> Result<CatchUpResult, CoreError> {
        if !force && !self.throttle.should_run_scan().await? {
            let last_check = self.throttle.last_check().await?;
            tracing::debug!(last_check, "catch-up throttled");
            return Ok(CatchUpResult::Throttled { last_check });
        }

        let now = self.throttle.clock().now();
        match self.engine.process_due_templates(now).await? {
            ScanOutcome::AlreadyRunning => Ok(CatchUpResult::AlreadyRunning),
            ScanOutcome::Completed(summary) => {
                // Losing this write only costs one redundant scan.
                if let Err(error) = self.throttle.mark_scan_completed().await {
                    tracing::warn!(error = %error, "could not record scan completion");
                }
                Ok(CatchUpResult::Completed(summary))
            }
        }
    }
}
