use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::model::method::MethodLookup;
use crate::model::plan::{
    compare_orders, Container, DropPosition, GroupId, ItemRef, Plan,
};

/// Error type for reordering operations. Callers keep the plan they passed
/// in when one of these comes back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReorderError {
    #[error("exercise not found: {0}")]
    ExerciseNotFound(String),
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),
    #[error("item not found: {0}")]
    ItemNotFound(ItemRef),
    #[error("group {group_id} is full: at most {max} exercises allowed")]
    GroupFull { group_id: GroupId, max: usize },
    #[error("cannot reorder {dragged} against {target}: they are in different groups")]
    CrossGroup { dragged: String, target: String },
    #[error("{0} is not a top-level item")]
    NotTopLevel(ItemRef),
    #[error("nothing to change")]
    NoChange,
}

// ---------------------------------------------------------------------------
// Group membership
// ---------------------------------------------------------------------------

/// Move an exercise into a group (appended at its end) or out to the top
/// level (appended after the last top-level item).
///
/// Joining a group copies its training method onto the exercise; leaving
/// clears it. A group whose method has a `max_group_size` that is already
/// reached rejects the move with `GroupFull`.
pub fn update_exercise_group(
    plan: &Plan,
    instance_id: &str,
    new_group_id: Option<GroupId>,
    methods: &dyn MethodLookup,
) -> Result<Plan, ReorderError> {
    let exercise = plan
        .exercise(instance_id)
        .ok_or_else(|| ReorderError::ExerciseNotFound(instance_id.to_string()))?;
    if exercise.group_id == new_group_id {
        return Err(ReorderError::NoChange);
    }

    let next = match new_group_id {
        Some(group_id) => {
            let group = plan
                .group(group_id)
                .ok_or(ReorderError::GroupNotFound(group_id))?;
            let size = plan.group_size(group_id);
            if let Some(method) = methods.method_by_id(&group.training_method_id)
                && !method.has_room(size)
            {
                let max = method.max_group_size.unwrap_or(size);
                warn!(group_id, max, instance_id, "group is full, exercise not moved");
                return Err(ReorderError::GroupFull { group_id, max });
            }
            let (mut next, order) = append_slot(plan, Container::Group(group_id));
            if let Some(e) = next.exercise_mut(instance_id) {
                e.group_id = Some(group_id);
                e.training_method_id = Some(group.training_method_id.clone());
                e.order = order;
            }
            debug!(instance_id, group_id, order, "exercise joined group");
            next
        }
        None => {
            let (mut next, order) = append_slot(plan, Container::TopLevel);
            if let Some(e) = next.exercise_mut(instance_id) {
                e.group_id = None;
                e.training_method_id = None;
                e.order = order;
            }
            debug!(instance_id, order, "exercise moved to top level");
            next
        }
    };
    Ok(next)
}

/// A copy of `plan` plus the `order` that places a new member after
/// everything in `container`. From 2^53 up `max + 1.0 == max`, so such
/// plans are re-indexed before appending.
fn append_slot(plan: &Plan, container: Container) -> (Plan, f64) {
    match plan.max_order(container) {
        None => (plan.clone(), 0.0),
        Some(max) if max + 1.0 > max => (plan.clone(), max + 1.0),
        Some(max) => {
            debug!(%container, max, "orders too large to append after, re-indexing");
            let next = reindex_all_orders(plan);
            let order = next.max_order(container).map_or(0.0, |m| m + 1.0);
            (next, order)
        }
    }
}

// ---------------------------------------------------------------------------
// Reordering within a container
// ---------------------------------------------------------------------------

/// Reorder two exercises that share a container. Exercises in different
/// groups are refused; move the dragged one with `update_exercise_group`
/// first.
pub fn reorder_exercises(
    plan: &Plan,
    dragged_id: &str,
    target_id: &str,
    position: DropPosition,
) -> Result<Plan, ReorderError> {
    let dragged = plan
        .exercise(dragged_id)
        .ok_or_else(|| ReorderError::ExerciseNotFound(dragged_id.to_string()))?;
    let target = plan
        .exercise(target_id)
        .ok_or_else(|| ReorderError::ExerciseNotFound(target_id.to_string()))?;

    if dragged.group_id != target.group_id {
        warn!(
            dragged = dragged_id,
            target = target_id,
            "refusing cross-group reorder; regroup the exercise first"
        );
        return Err(ReorderError::CrossGroup {
            dragged: dragged_id.to_string(),
            target: target_id.to_string(),
        });
    }

    reorder_within(
        plan,
        dragged.container(),
        &dragged.item_ref(),
        &target.item_ref(),
        position,
    )
}

/// Reorder top-level items: ungrouped exercises and groups.
pub fn reorder_plan_items(
    plan: &Plan,
    dragged: &ItemRef,
    target: &ItemRef,
    position: DropPosition,
) -> Result<Plan, ReorderError> {
    for item in [dragged, target] {
        match plan.container_of(item) {
            None => return Err(ReorderError::ItemNotFound(item.clone())),
            Some(Container::Group(_)) => return Err(ReorderError::NotTopLevel(item.clone())),
            Some(Container::TopLevel) => {}
        }
    }
    reorder_within(plan, Container::TopLevel, dragged, target, position)
}

/// Take `dragged` out of the container's sequence, put it back next to
/// `target`, and renumber the container `0..n`.
fn reorder_within(
    plan: &Plan,
    container: Container,
    dragged: &ItemRef,
    target: &ItemRef,
    position: DropPosition,
) -> Result<Plan, ReorderError> {
    if dragged == target {
        return Err(ReorderError::NoChange);
    }

    let mut items = plan.container_items(container);
    let from = items
        .iter()
        .position(|i| i == dragged)
        .ok_or_else(|| ReorderError::ItemNotFound(dragged.clone()))?;
    let moving = items.remove(from);

    // Index lookup after removal absorbs the shift
    let to = items
        .iter()
        .position(|i| i == target)
        .ok_or_else(|| ReorderError::ItemNotFound(target.clone()))?;
    let insert_at = match position {
        DropPosition::Before => to,
        DropPosition::After => to + 1,
    };
    items.insert(insert_at, moving);

    let mut next = plan.clone();
    for (i, item) in items.iter().enumerate() {
        next.set_order(item, i as f64);
    }
    debug!(%dragged, %target, %position, %container, from, to = insert_at, "reordered");
    Ok(next)
}

// ---------------------------------------------------------------------------
// Re-indexing
// ---------------------------------------------------------------------------

/// Renumber every container `0..n` in its current sequence.
///
/// Sequences are computed with a stable sort, so equal orders keep array
/// position (exercises before groups at the top level). NaN orders sort
/// last, and every order comes out finite. Idempotent.
pub fn reindex_all_orders(plan: &Plan) -> Plan {
    let mut next = plan.clone();

    // Top level, by slot so duplicate ids cannot alias
    #[derive(Clone, Copy)]
    enum Slot {
        Exercise(usize),
        Group(usize),
    }
    let order_of = |slot: Slot| match slot {
        Slot::Exercise(i) => plan.exercises[i].order,
        Slot::Group(i) => plan.groups[i].order,
    };
    let mut top: Vec<Slot> = plan
        .exercises
        .iter()
        .enumerate()
        .filter(|(_, e)| e.group_id.is_none())
        .map(|(i, _)| Slot::Exercise(i))
        .chain((0..plan.groups.len()).map(Slot::Group))
        .collect();
    top.sort_by(|a, b| compare_orders(order_of(*a), order_of(*b)));
    for (n, slot) in top.into_iter().enumerate() {
        match slot {
            Slot::Exercise(i) => next.exercises[i].order = n as f64,
            Slot::Group(i) => next.groups[i].order = n as f64,
        }
    }

    // Each group's members, including groups the plan no longer lists
    let mut members: BTreeMap<GroupId, Vec<usize>> = BTreeMap::new();
    for (i, e) in plan.exercises.iter().enumerate() {
        if let Some(group_id) = e.group_id {
            members.entry(group_id).or_default().push(i);
        }
    }
    for indices in members.values_mut() {
        indices.sort_by(|a, b| compare_orders(plan.exercises[*a].order, plan.exercises[*b].order));
        for (n, i) in indices.iter().enumerate() {
            next.exercises[*i].order = n as f64;
        }
    }

    next
}
