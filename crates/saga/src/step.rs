//! Saga step contract.

use async_trait::async_trait;

use crate::context::SagaContext;
use crate::error::SagaError;

/// A named saga step with a compensating action.
///
/// Steps are registered with the orchestrator as `Arc<dyn SagaStep>` and
/// invoked in sequence. Each step's `execute` is attempted exactly once; the
/// orchestrator never retries. `compensate` undoes the step's effect and is
/// expected to be tolerant of partially applied state.
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// Stable step identifier, used for registration and the executed log.
    fn id(&self) -> &str;

    /// Human-readable step name.
    fn name(&self) -> &str;

    /// Precondition checked before `execute`. Defaults to always true.
    fn can_execute(&self, _ctx: &SagaContext) -> bool {
        true
    }

    /// Performs the step's effect.
    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), SagaError>;

    /// Undoes the step's effect.
    async fn compensate(&self, ctx: &mut SagaContext) -> Result<(), SagaError>;
}
