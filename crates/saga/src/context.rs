//! Mutable state threaded through one saga run.

use std::collections::HashMap;

use domain::{EventRecord, Order};
use serde_json::Value;

/// Shared mutable state for a single saga run.
///
/// A context owns the order being processed, a free-form parameter bag for
/// data exchanged between steps, the ordered log of executed step ids, the
/// domain events collected from the order along the way, and a log of errors
/// captured during the run. One saga run operates on one context; callers
/// must serialize access to a given order.
#[derive(Debug)]
pub struct SagaContext {
    saga_name: String,
    order: Order,
    parameters: HashMap<String, Value>,
    executed_steps: Vec<String>,
    events: Vec<EventRecord>,
    errors: Vec<String>,
}

impl SagaContext {
    /// Creates a context for the given order.
    pub fn new(saga_name: impl Into<String>, order: Order) -> Self {
        Self {
            saga_name: saga_name.into(),
            order,
            parameters: HashMap::new(),
            executed_steps: Vec::new(),
            events: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Creates a context with initial parameters.
    pub fn with_parameters(
        saga_name: impl Into<String>,
        order: Order,
        parameters: HashMap<String, Value>,
    ) -> Self {
        Self {
            parameters,
            ..Self::new(saga_name, order)
        }
    }

    /// Returns the saga name.
    pub fn saga_name(&self) -> &str {
        &self.saga_name
    }

    /// Returns the order.
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Returns the order for mutation by steps.
    pub fn order_mut(&mut self) -> &mut Order {
        &mut self.order
    }

    /// Consumes the context, returning the order.
    pub fn into_order(self) -> Order {
        self.order
    }

    /// Sets a parameter.
    pub fn set_param(&mut self, key: impl Into<String>, value: Value) {
        self.parameters.insert(key.into(), value);
    }

    /// Returns a parameter.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// Returns a parameter as a string slice, if it is a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// Removes a parameter, returning it.
    pub fn remove_param(&mut self, key: &str) -> Option<Value> {
        self.parameters.remove(key)
    }

    /// Returns the ordered log of executed step ids.
    pub fn executed_steps(&self) -> &[String] {
        &self.executed_steps
    }

    /// Returns the domain events collected from the order so far.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Drains and returns the collected domain events for publishing.
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    /// Moves the order's pending events into the context's collection.
    pub(crate) fn collect_order_events(&mut self) {
        let mut drained = self.order.take_events();
        self.events.append(&mut drained);
    }

    pub(crate) fn mark_executed(&mut self, id: &str) {
        self.executed_steps.push(id.to_string());
    }

    pub(crate) fn pop_executed(&mut self) -> Option<String> {
        self.executed_steps.pop()
    }

    /// Records an error without interrupting the run.
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Returns the errors captured during the run.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}
