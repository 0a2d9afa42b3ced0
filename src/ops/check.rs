use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::method::MethodLookup;
use crate::model::plan::{ExerciseGroup, GroupId, Plan};

/// Structured result from `plandrag check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (the plan is inconsistent).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// Two exercise entries share an instance id
    #[serde(rename = "duplicate_instance_id")]
    DuplicateInstanceId { instance_id: String, count: usize },
    /// Two groups share an id
    #[serde(rename = "duplicate_group_id")]
    DuplicateGroupId { group_id: GroupId, count: usize },
    /// An exercise points at a group the plan does not have
    #[serde(rename = "dangling_group")]
    DanglingGroup { instance_id: String, group_id: GroupId },
    /// An `order` is NaN or infinite
    #[serde(rename = "non_finite_order")]
    NonFiniteOrder { item: String },
    /// More members than the method allows
    #[serde(rename = "group_over_capacity")]
    GroupOverCapacity {
        group_id: GroupId,
        size: usize,
        max: usize,
    },
}

/// A validation warning (non-critical issue).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Fewer members than the method wants
    #[serde(rename = "group_under_minimum")]
    GroupUnderMinimum {
        group_id: GroupId,
        size: usize,
        min: usize,
    },
    /// Group with no members at all
    #[serde(rename = "empty_group")]
    EmptyGroup { group_id: GroupId },
    /// Grouped exercise whose method differs from its group's
    #[serde(rename = "method_mismatch")]
    MethodMismatch {
        instance_id: String,
        group_id: GroupId,
        expected: String,
        found: Option<String>,
    },
    /// Group method unknown to the lookup
    #[serde(rename = "unknown_method")]
    UnknownMethod { group_id: GroupId, method_id: String },
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate a plan and return structured results.
///
/// This is a read-only operation; it does not modify the plan.
///
/// Checks performed:
/// 1. Instance ids and group ids are unique
/// 2. Every `group_id` resolves to a group
/// 3. Every `order` is finite
/// 4. Group sizes respect their method's min/max
/// 5. Grouped exercises mirror their group's method
pub fn check_plan(plan: &Plan, methods: &dyn MethodLookup) -> CheckResult {
    let mut result = CheckResult::default();

    for (instance_id, count) in duplicates(plan.exercises.iter().map(|e| e.instance_id.clone())) {
        result
            .errors
            .push(CheckError::DuplicateInstanceId { instance_id, count });
    }
    for (group_id, count) in duplicates(plan.groups.iter().map(|g| g.id)) {
        result
            .errors
            .push(CheckError::DuplicateGroupId { group_id, count });
    }

    let group_ids: HashSet<GroupId> = plan.groups.iter().map(|g| g.id).collect();
    for e in &plan.exercises {
        if !e.order.is_finite() {
            result.errors.push(CheckError::NonFiniteOrder {
                item: format!("e:{}", e.instance_id),
            });
        }
        if let Some(group_id) = e.group_id
            && !group_ids.contains(&group_id)
        {
            result.errors.push(CheckError::DanglingGroup {
                instance_id: e.instance_id.clone(),
                group_id,
            });
        }
    }

    for group in &plan.groups {
        check_group(plan, group, methods, &mut result);
    }

    result.valid = result.errors.is_empty();
    result
}

// ---------------------------------------------------------------------------
// Per-group validation
// ---------------------------------------------------------------------------

fn check_group(plan: &Plan, group: &ExerciseGroup, methods: &dyn MethodLookup, result: &mut CheckResult) {
    if !group.order.is_finite() {
        result.errors.push(CheckError::NonFiniteOrder {
            item: format!("g:{}", group.id),
        });
    }

    let members = plan.items_in_group(group.id);
    let size = members.len();
    if size == 0 {
        result
            .warnings
            .push(CheckWarning::EmptyGroup { group_id: group.id });
    }

    for e in &members {
        if e.training_method_id.as_deref() != Some(group.training_method_id.as_str()) {
            result.warnings.push(CheckWarning::MethodMismatch {
                instance_id: e.instance_id.clone(),
                group_id: group.id,
                expected: group.training_method_id.clone(),
                found: e.training_method_id.clone(),
            });
        }
    }

    let Some(method) = methods.method_by_id(&group.training_method_id) else {
        result.warnings.push(CheckWarning::UnknownMethod {
            group_id: group.id,
            method_id: group.training_method_id.clone(),
        });
        return;
    };

    if let Some(max) = method.max_group_size
        && size > max
    {
        result.errors.push(CheckError::GroupOverCapacity {
            group_id: group.id,
            size,
            max,
        });
    }
    // Empty groups are already reported
    if let Some(min) = method.min_group_size
        && size > 0
        && size < min
    {
        result.warnings.push(CheckWarning::GroupUnderMinimum {
            group_id: group.id,
            size,
            min,
        });
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Values seen more than once, in first-seen order, with their counts
fn duplicates<T>(values: impl Iterator<Item = T>) -> Vec<(T, usize)>
where
    T: std::hash::Hash + Eq + Clone,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut seen_order = Vec::new();
    for v in values {
        let count = counts.entry(v.clone()).or_insert(0);
        if *count == 0 {
            seen_order.push(v);
        }
        *count += 1;
    }
    seen_order
        .into_iter()
        .filter_map(|v| {
            let count = counts[&v];
            (count > 1).then_some((v, count))
        })
        .collect()
}
