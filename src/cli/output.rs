use std::fmt::Write;

use serde::Serialize;

use crate::drag::DropResult;
use crate::model::plan::{Container, ExerciseEntry, ItemRef, Plan, TopLevelItem};
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::ops::preview::PreviewOffsets;
use crate::ops::resolve::{DropTarget, Resolution};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ResolutionJson {
    /// `top` or `g:<id>`
    pub container: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl From<&Resolution> for ResolutionJson {
    fn from(r: &Resolution) -> Self {
        ResolutionJson {
            container: container_label(r.container),
            target: r.target.as_ref().map(|t| t.target.to_string()),
            position: r.target.as_ref().map(|t| t.position.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct TickJson {
    pub tick: usize,
    /// Only non-zero offsets
    pub offsets: Vec<OffsetJson>,
}

#[derive(Serialize)]
pub struct OffsetJson {
    pub item: String,
    pub offset: f64,
}

#[derive(Serialize)]
pub struct ReplayJson {
    pub ticks: Vec<TickJson>,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub plan: Plan,
}

fn container_label(container: Container) -> String {
    match container {
        Container::TopLevel => "top".to_string(),
        Container::Group(id) => format!("g:{}", id),
    }
}

pub fn offsets_json(offsets: &PreviewOffsets) -> Vec<OffsetJson> {
    offsets
        .iter()
        .filter(|(_, v)| **v != 0.0)
        .map(|(item, v)| OffsetJson {
            item: item.to_string(),
            offset: *v,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// One line per top-level item, group members indented beneath their group.
pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();
    for item in plan.top_level_items() {
        match item {
            TopLevelItem::Exercise(e) => {
                let _ = writeln!(out, "{}", exercise_line(e));
            }
            TopLevelItem::Group(g) => {
                let _ = writeln!(out, "[g:{}] {} #{}", g.id, g.training_method_id, fmt_order(g.order));
                for member in plan.items_in_group(g.id) {
                    let _ = writeln!(out, "  {}", exercise_line(member));
                }
            }
        }
    }
    out
}

fn exercise_line(e: &ExerciseEntry) -> String {
    let name = if e.exercise_name.is_empty() {
        e.exercise_id.as_str()
    } else {
        e.exercise_name.as_str()
    };
    let warmup = if e.is_warmup { " (warmup)" } else { "" };
    format!("e:{} {}{} #{}", e.instance_id, name, warmup, fmt_order(e.order))
}

/// Integral orders print without a fraction
fn fmt_order(order: f64) -> String {
    if order.is_finite() && order.fract() == 0.0 {
        format!("{}", order as i64)
    } else {
        format!("{}", order)
    }
}

pub fn format_resolution(r: &Resolution) -> String {
    match &r.target {
        Some(t) => format!("{} {} (in {})", t.position, t.target, r.container),
        None => format!("no target (in {})", r.container),
    }
}

pub fn format_offsets(offsets: &PreviewOffsets) -> String {
    let parts: Vec<String> = offsets
        .iter()
        .filter(|(_, v)| **v != 0.0)
        .map(|(item, v)| format!("{}{:+}", item, v))
        .collect();
    if parts.is_empty() {
        "(no offsets)".to_string()
    } else {
        parts.join(" ")
    }
}

pub fn format_drop_result(result: &DropResult) -> String {
    let at = |t: &Option<DropTarget>| match t {
        Some(t) => format!(" {} {}", t.position, t.target),
        None => String::new(),
    };
    match result {
        DropResult::Moved { target } => format!("moved {} {}", target.position, target.target),
        DropResult::Regrouped { group_id, target } => {
            format!("joined {}{}", ItemRef::Group(*group_id), at(target))
        }
        DropResult::Extracted { target } => format!("moved to top level{}", at(target)),
        DropResult::CapacityExceeded { group_id, max } => {
            format!("rejected: g:{} is full ({} max)", group_id, max)
        }
        DropResult::Missed => "no valid target; plan unchanged".to_string(),
        DropResult::NoSession => "no drag in progress".to_string(),
    }
}

pub fn format_check(result: &CheckResult) -> String {
    let mut out = String::new();
    for e in &result.errors {
        let _ = writeln!(out, "error: {}", check_error_text(e));
    }
    for w in &result.warnings {
        let _ = writeln!(out, "warning: {}", check_warning_text(w));
    }
    if result.valid && result.warnings.is_empty() {
        out.push_str("plan ok\n");
    }
    out
}

fn check_error_text(e: &CheckError) -> String {
    match e {
        CheckError::DuplicateInstanceId { instance_id, count } => {
            format!("instance id {} used {} times", instance_id, count)
        }
        CheckError::DuplicateGroupId { group_id, count } => {
            format!("group id {} used {} times", group_id, count)
        }
        CheckError::DanglingGroup {
            instance_id,
            group_id,
        } => format!("e:{} points at missing group {}", instance_id, group_id),
        CheckError::NonFiniteOrder { item } => format!("{} has a non-finite order", item),
        CheckError::GroupOverCapacity {
            group_id,
            size,
            max,
        } => format!("g:{} has {} exercises (max {})", group_id, size, max),
    }
}

fn check_warning_text(w: &CheckWarning) -> String {
    match w {
        CheckWarning::GroupUnderMinimum {
            group_id,
            size,
            min,
        } => format!("g:{} has {} exercises (min {})", group_id, size, min),
        CheckWarning::EmptyGroup { group_id } => format!("g:{} is empty", group_id),
        CheckWarning::MethodMismatch {
            instance_id,
            group_id,
            expected,
            found,
        } => format!(
            "e:{} in g:{} has method {} (expected {})",
            instance_id,
            group_id,
            found.as_deref().unwrap_or("none"),
            expected
        ),
        CheckWarning::UnknownMethod {
            group_id,
            method_id,
        } => format!("g:{} uses unknown method {}", group_id, method_id),
    }
}
