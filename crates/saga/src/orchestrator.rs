//! Saga orchestrator with automatic reverse-order compensation.

use std::sync::Arc;
use std::time::Instant;

use crate::context::SagaContext;
use crate::error::SagaError;
use crate::fulfillment;
use crate::services::{PaymentService, StockService};
use crate::step::SagaStep;

/// Drives saga steps in sequence and rolls back on failure.
///
/// Steps live in an insertion-ordered registry keyed by step id; a failing
/// step aborts the run and triggers best-effort compensation of every
/// already-executed step, in reverse order, before the original error is
/// returned. There is no retry: a failed step is never re-attempted.
pub struct SagaOrchestrator {
    steps: Vec<Arc<dyn SagaStep>>,
}

impl SagaOrchestrator {
    /// Creates an orchestrator pre-registered with the fulfillment steps.
    pub fn new(stock: Arc<dyn StockService>, payment: Arc<dyn PaymentService>) -> Self {
        Self {
            steps: fulfillment::default_steps(stock, payment),
        }
    }

    /// Creates an orchestrator with no registered steps.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Registers a step, replacing any step with the same id in place.
    pub fn add_step(&mut self, step: Arc<dyn SagaStep>) {
        match self.steps.iter().position(|s| s.id() == step.id()) {
            Some(pos) => self.steps[pos] = step,
            None => self.steps.push(step),
        }
    }

    /// Returns the registered step ids in execution order.
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    fn step(&self, id: &str) -> Option<Arc<dyn SagaStep>> {
        self.steps.iter().find(|s| s.id() == id).cloned()
    }

    /// Runs a single registered step.
    ///
    /// On success the step id is appended to the context's executed log; on
    /// failure the error is recorded in the context and returned. This does
    /// not trigger compensation.
    #[tracing::instrument(skip(self, ctx), fields(saga = %ctx.saga_name()))]
    pub async fn run_step(&self, id: &str, ctx: &mut SagaContext) -> Result<(), SagaError> {
        let step = self.step(id).ok_or_else(|| SagaError::StepNotFound {
            id: id.to_string(),
        })?;

        if !step.can_execute(ctx) {
            return Err(SagaError::StepNotExecutable {
                id: id.to_string(),
            });
        }

        tracing::debug!(step = id, name = step.name(), "executing saga step");
        match step.execute(ctx).await {
            Ok(()) => {
                ctx.mark_executed(id);
                ctx.collect_order_events();
                Ok(())
            }
            Err(error) => {
                ctx.record_error(format!("{id}: {error}"));
                Err(error)
            }
        }
    }

    /// Runs every registered step in order.
    ///
    /// Aborts at the first failure, compensates everything already executed
    /// in reverse order, and returns the original error.
    #[tracing::instrument(skip(self, ctx), fields(saga = %ctx.saga_name()))]
    pub async fn run_saga(&self, ctx: &mut SagaContext) -> Result<(), SagaError> {
        let ids: Vec<String> = self.steps.iter().map(|s| s.id().to_string()).collect();
        self.run_sequence(&ids, ctx).await
    }

    /// Runs the named steps in the given order.
    ///
    /// Unknown ids fail with `StepNotFound` before anything executes. Abort
    /// and compensation behave as in [`run_saga`].
    #[tracing::instrument(skip(self, ctx), fields(saga = %ctx.saga_name()))]
    pub async fn run_saga_steps(
        &self,
        ctx: &mut SagaContext,
        ids: &[&str],
    ) -> Result<(), SagaError> {
        for id in ids {
            if self.step(id).is_none() {
                return Err(SagaError::StepNotFound {
                    id: id.to_string(),
                });
            }
        }
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        self.run_sequence(&ids, ctx).await
    }

    async fn run_sequence(&self, ids: &[String], ctx: &mut SagaContext) -> Result<(), SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let started = Instant::now();

        for id in ids {
            if let Err(error) = self.run_step(id, ctx).await {
                tracing::warn!(step = %id, %error, "saga step failed, compensating");
                self.rollback(ctx).await;
                metrics::counter!("saga_failed").increment(1);
                metrics::histogram!("saga_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                return Err(error);
            }
        }

        metrics::counter!("saga_completed").increment(1);
        metrics::histogram!("saga_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(steps = ids.len(), "saga completed");
        Ok(())
    }

    /// Compensates every executed step in reverse order.
    ///
    /// Best-effort: a failing compensation is recorded in the context's
    /// errors and does not halt the remaining rollbacks. Compensated steps
    /// are popped from the executed log.
    #[tracing::instrument(skip(self, ctx), fields(saga = %ctx.saga_name()))]
    pub async fn rollback(&self, ctx: &mut SagaContext) {
        self.compensate_down_to(ctx, 0).await;
    }

    /// Partially compensates: undoes only the steps executed *after*
    /// `through_step_id`, preserving earlier effects.
    ///
    /// If `through_step_id` is not in the executed log, nothing is
    /// compensated.
    #[tracing::instrument(skip(self, ctx), fields(saga = %ctx.saga_name()))]
    pub async fn compensate(&self, ctx: &mut SagaContext, through_step_id: &str) {
        let Some(pos) = ctx
            .executed_steps()
            .iter()
            .position(|id| id == through_step_id)
        else {
            tracing::debug!(
                step = through_step_id,
                "step not in execution history, nothing to compensate"
            );
            return;
        };
        self.compensate_down_to(ctx, pos + 1).await;
    }

    async fn compensate_down_to(&self, ctx: &mut SagaContext, keep: usize) {
        while ctx.executed_steps().len() > keep {
            let Some(id) = ctx.executed_steps().last().cloned() else {
                break;
            };
            match self.step(&id) {
                Some(step) => {
                    if let Err(error) = step.compensate(ctx).await {
                        tracing::warn!(step = %id, %error, "compensation failed, continuing");
                        ctx.record_error(format!("compensation {id}: {error}"));
                    } else {
                        tracing::debug!(step = %id, "step compensated");
                    }
                    ctx.collect_order_events();
                }
                None => {
                    ctx.record_error(format!("compensation {id}: step no longer registered"));
                }
            }
            ctx.pop_executed();
        }
    }
}
