//! Table-driven status transition engine.
//!
//! Transitions are declared in a static rule table; each rule may carry a
//! guard predicate and pre/post hooks. Hooks are side-effecting only (they
//! log) and are never part of the transition invariant.

use std::collections::{HashMap, VecDeque};
use std::future::Future;

use crate::error::OrderError;
use crate::order::Order;
use crate::status::OrderStatus;

/// Predicate gating whether a transition is currently allowed.
pub type Guard = fn(&Order) -> Result<(), OrderError>;

/// Side-effecting hook invoked around a transition.
pub type Hook = fn(&Order);

/// One edge of the transition graph.
pub struct TransitionRule {
    /// Source status.
    pub from: OrderStatus,
    /// Target status.
    pub to: OrderStatus,
    /// Optional guard; evaluated by `can_transition` and `execute_transition`.
    pub guard: Option<Guard>,
    /// Optional hook run before the status flips.
    pub pre: Option<Hook>,
    /// Optional hook run after the status flips.
    pub post: Option<Hook>,
}

fn confirmable(order: &Order) -> Result<(), OrderError> {
    if order.is_empty() || order.total().is_zero() {
        return Err(OrderError::EmptyOrderConfirmation);
    }
    Ok(())
}

fn log_confirmed(order: &Order) {
    tracing::info!(order_id = %order.id(), total = %order.total(), "order confirmed");
}

fn log_shipping(order: &Order) {
    tracing::info!(order_id = %order.id(), "order leaving warehouse");
}

static RULES: &[TransitionRule] = &[
    TransitionRule {
        from: OrderStatus::Pending,
        to: OrderStatus::Confirmed,
        guard: Some(confirmable),
        pre: None,
        post: Some(log_confirmed),
    },
    TransitionRule {
        from: OrderStatus::Pending,
        to: OrderStatus::Canceled,
        guard: None,
        pre: None,
        post: None,
    },
    TransitionRule {
        from: OrderStatus::Confirmed,
        to: OrderStatus::Preparing,
        guard: None,
        pre: None,
        post: None,
    },
    TransitionRule {
        from: OrderStatus::Confirmed,
        to: OrderStatus::Canceled,
        guard: None,
        pre: None,
        post: None,
    },
    TransitionRule {
        from: OrderStatus::Preparing,
        to: OrderStatus::Ready,
        guard: None,
        pre: None,
        post: None,
    },
    TransitionRule {
        from: OrderStatus::Preparing,
        to: OrderStatus::Canceled,
        guard: None,
        pre: None,
        post: None,
    },
    TransitionRule {
        from: OrderStatus::Ready,
        to: OrderStatus::Shipped,
        guard: None,
        pre: Some(log_shipping),
        post: None,
    },
    TransitionRule {
        from: OrderStatus::Shipped,
        to: OrderStatus::Delivered,
        guard: None,
        pre: None,
        post: None,
    },
];

fn rule_for(from: OrderStatus, to: OrderStatus) -> Option<&'static TransitionRule> {
    RULES.iter().find(|r| r.from == from && r.to == to)
}

/// Returns the direct successor statuses of `from`, ignoring guards.
pub fn successors(from: OrderStatus) -> impl Iterator<Item = OrderStatus> {
    RULES.iter().filter(move |r| r.from == from).map(|r| r.to)
}

/// Returns true if an edge to `target` exists and its guard passes.
///
/// Guard errors count as "not allowed"; use [`execute_transition`] to see
/// the underlying error.
pub fn can_transition(order: &Order, target: OrderStatus) -> bool {
    match rule_for(order.status(), target) {
        Some(rule) => rule.guard.is_none_or(|guard| guard(order).is_ok()),
        None => false,
    }
}

/// Executes a transition, failing when no edge exists or the guard rejects.
///
/// Guard failures propagate their own error (e.g. the empty-order
/// confirmation rejection).
pub fn execute_transition(order: &mut Order, target: OrderStatus) -> Result<(), OrderError> {
    let from = order.status();
    let rule = rule_for(from, target).ok_or(OrderError::InvalidTransition { from, to: target })?;

    if let Some(guard) = rule.guard {
        guard(order)?;
    }
    if let Some(pre) = rule.pre {
        pre(order);
    }
    order.apply_status_change(target);
    if let Some(post) = rule.post {
        post(order);
    }
    tracing::debug!(order_id = %order.id(), %from, to = %target, "status transition");
    Ok(())
}

/// Returns the statuses currently reachable in one hop.
///
/// Permissive introspection: guard failures are swallowed, not propagated.
pub fn available_transitions(order: &Order) -> Vec<OrderStatus> {
    successors(order.status())
        .filter(|target| can_transition(order, *target))
        .collect()
}

/// Finds the shortest status sequence from `from` to `to`, ignoring guards.
///
/// Returns the sequence excluding `from`, or an empty vector when `to` is
/// unreachable or equals `from`.
pub fn find_path(from: OrderStatus, to: OrderStatus) -> Vec<OrderStatus> {
    if from == to {
        return Vec::new();
    }

    let mut parent: HashMap<OrderStatus, OrderStatus> = HashMap::new();
    let mut queue = VecDeque::from([from]);

    while let Some(current) = queue.pop_front() {
        for next in successors(current) {
            if next == from || parent.contains_key(&next) {
                continue;
            }
            parent.insert(next, current);
            if next == to {
                let mut path = vec![to];
                let mut cursor = to;
                while let Some(&prev) = parent.get(&cursor) {
                    if prev == from {
                        break;
                    }
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return path;
            }
            queue.push_back(next);
        }
    }

    Vec::new()
}

/// Walks the shortest path to `target`, executing each transition in turn.
///
/// No-ops when already at `target`; fails with `UnreachableTarget` when no
/// path exists. The path is chosen ignoring guards, so a guard failure can
/// surface partway through the walk. Returns the path walked.
pub async fn run_auto_advance(
    order: &mut Order,
    target: OrderStatus,
) -> Result<Vec<OrderStatus>, OrderError> {
    run_auto_advance_with(order, target, |_, _| std::future::ready(())).await
}

/// [`run_auto_advance`] with an async callback awaited before each hop.
///
/// The callback receives the source and target of the upcoming transition;
/// it is intended for cross-cutting concerns such as notifications.
pub async fn run_auto_advance_with<F, Fut>(
    order: &mut Order,
    target: OrderStatus,
    mut on_transition: F,
) -> Result<Vec<OrderStatus>, OrderError>
where
    F: FnMut(OrderStatus, OrderStatus) -> Fut,
    Fut: Future<Output = ()>,
{
    if order.status() == target {
        return Ok(Vec::new());
    }

    let path = find_path(order.status(), target);
    if path.is_empty() {
        return Err(OrderError::UnreachableTarget {
            from: order.status(),
            to: target,
        });
    }

    for &next in &path {
        on_transition(order.status(), next).await;
        execute_transition(order, next)?;
    }
    Ok(path)
}
