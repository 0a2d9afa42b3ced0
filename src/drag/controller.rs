use tracing::{debug, warn};

use crate::model::config::DragConfig;
use crate::model::layout::{LayoutMeasurer, LayoutRegistry, Point};
use crate::model::method::MethodLookup;
use crate::model::plan::{Container, GroupId, ItemRef, Plan};
use crate::ops::preview::{clear_offsets, compute_preview_offsets, PreviewOffsets};
use crate::ops::reorder::{
    reindex_all_orders, reorder_exercises, reorder_plan_items, update_exercise_group, ReorderError,
};
use crate::ops::resolve::{resolve, DropTarget, ResolveMode, Resolution};

/// Error type for drag lifecycle calls
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DragError {
    #[error("cannot drag {0}: not in the plan")]
    NotFound(ItemRef),
}

/// Where the controller is in a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// Drag started, no slot resolved yet
    Dragging,
    /// At least one pointer-move resolved a slot
    Previewing,
}

/// Transient state of one gesture
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub dragged: ItemRef,
    pub original_container: Container,
    pub original_index: usize,
    /// Height used to open/close gaps in the preview
    pub dragged_height: f64,
    /// Last preview resolution, for hosts that draw a drop indicator
    pub last_resolution: Option<Resolution>,
}

/// How a drop ended
#[derive(Debug, Clone, PartialEq)]
pub enum DropResult {
    /// Reordered inside its own container
    Moved { target: DropTarget },
    /// Joined a different group, optionally positioned next to `target`
    Regrouped {
        group_id: GroupId,
        target: Option<DropTarget>,
    },
    /// Left its group for the top level, optionally next to `target`
    Extracted { target: Option<DropTarget> },
    /// The hovered group had no room; nothing changed
    CapacityExceeded { group_id: GroupId, max: usize },
    /// No valid target; nothing changed
    Missed,
    /// Drop arrived with no drag in progress
    NoSession,
}

impl DropResult {
    /// User-facing warning, if the drop deserves one
    pub fn warning(&self) -> Option<String> {
        match self {
            DropResult::CapacityExceeded { group_id, max } => Some(
                ReorderError::GroupFull {
                    group_id: *group_id,
                    max: *max,
                }
                .to_string(),
            ),
            _ => None,
        }
    }

    pub fn changed_plan(&self) -> bool {
        matches!(
            self,
            DropResult::Moved { .. } | DropResult::Regrouped { .. } | DropResult::Extracted { .. }
        )
    }
}

/// Committed plan plus what happened
#[derive(Debug, Clone, PartialEq)]
pub struct DropOutcome {
    pub plan: Plan,
    pub result: DropResult,
}

/// Bridges gesture callbacks to the pure resolver and engine.
///
/// The controller never mutates a plan it is handed; `on_drop` returns the
/// committed plan for the host to store.
pub struct DragController<M, L> {
    config: DragConfig,
    measurer: M,
    methods: L,
    layouts: LayoutRegistry,
    session: Option<DragSession>,
    offsets: PreviewOffsets,
    scroll_enabled: bool,
    phase: DragPhase,
}

impl<M, L> DragController<M, L>
where
    M: LayoutMeasurer,
    L: MethodLookup,
{
    pub fn new(config: DragConfig, measurer: M, methods: L) -> Self {
        DragController {
            config,
            measurer,
            methods,
            layouts: LayoutRegistry::new(),
            session: None,
            offsets: PreviewOffsets::new(),
            scroll_enabled: true,
            phase: DragPhase::Idle,
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Offsets the rendering layer reads each frame
    pub fn preview_offsets(&self) -> &PreviewOffsets {
        &self.offsets
    }

    /// Outer scrolling is disabled while a drag is in flight
    pub fn is_scroll_enabled(&self) -> bool {
        self.scroll_enabled
    }

    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    /// Store a post-render measurement pass
    pub fn set_layouts(&mut self, layouts: LayoutRegistry) {
        self.layouts.replace(layouts);
    }

    /// Begin a drag of `dragged`. A session still open from a lost gesture is
    /// cancelled first.
    pub fn on_drag_start(&mut self, plan: &Plan, dragged: ItemRef) -> Result<(), DragError> {
        if self.session.is_some() {
            debug!("drag started while another was open; cancelling the old one");
            self.cancel();
        }

        let original_container = plan
            .container_of(&dragged)
            .ok_or_else(|| DragError::NotFound(dragged.clone()))?;
        let original_index = plan
            .index_in_container(&dragged)
            .ok_or_else(|| DragError::NotFound(dragged.clone()))?;

        self.layouts.replace(self.measurer.measure_layouts());
        let dragged_height = self
            .layouts
            .get(&dragged)
            .map_or(self.config.default_item_height, |l| l.height);

        self.scroll_enabled = false;
        clear_offsets(&mut self.offsets);
        debug!(%dragged, %original_container, original_index, "drag started");

        self.session = Some(DragSession {
            dragged,
            original_container,
            original_index,
            dragged_height,
            last_resolution: None,
        });
        self.phase = DragPhase::Dragging;
        Ok(())
    }

    /// Recompute preview offsets for a pointer tick. Without a session the
    /// offsets stay as they are (all zero).
    pub fn on_drag_move(&mut self, plan: &Plan, point: Point) -> &PreviewOffsets {
        let Some(session) = self.session.as_mut() else {
            return &self.offsets;
        };

        let resolution = resolve(
            point,
            &session.dragged,
            plan,
            &self.layouts,
            &self.config,
            ResolveMode::Preview {
                origin: session.original_container,
                placeholder_height: session.dragged_height,
            },
        );
        let fresh = compute_preview_offsets(
            plan,
            &session.dragged,
            session.original_container,
            &resolution,
            session.dragged_height,
        );

        // Items no longer affected fall back to zero rather than disappearing
        clear_offsets(&mut self.offsets);
        self.offsets.extend(fresh);

        if resolution.target.is_some() {
            self.phase = DragPhase::Previewing;
        }
        session.last_resolution = Some(resolution);
        &self.offsets
    }

    /// Commit the drag at `point` and end the session.
    pub fn on_drop(&mut self, plan: &Plan, point: Point) -> DropOutcome {
        let Some(session) = self.session.take() else {
            return DropOutcome {
                plan: plan.clone(),
                result: DropResult::NoSession,
            };
        };

        let outcome = self.commit(plan, &session, point);
        match outcome.result.warning() {
            Some(w) => warn!(dragged = %session.dragged, "{}", w),
            None => debug!(dragged = %session.dragged, result = ?outcome.result, "drop committed"),
        }
        self.reset();
        outcome
    }

    /// Abandon the gesture. Offsets are zeroed and the session dropped.
    pub fn cancel(&mut self) {
        if let Some(session) = &self.session {
            debug!(dragged = %session.dragged, "drag cancelled");
        }
        self.session = None;
        self.reset();
    }

    fn reset(&mut self) {
        clear_offsets(&mut self.offsets);
        self.scroll_enabled = true;
        self.phase = DragPhase::Idle;
    }

    fn resolve_commit(&self, plan: &Plan, dragged: &ItemRef, point: Point) -> Resolution {
        resolve(point, dragged, plan, &self.layouts, &self.config, ResolveMode::Commit)
    }

    fn commit(&self, plan: &Plan, session: &DragSession, point: Point) -> DropOutcome {
        let dragged = &session.dragged;
        let unchanged = |result| DropOutcome {
            plan: plan.clone(),
            result,
        };
        let finish = |next: Plan, result| DropOutcome {
            plan: reindex_all_orders(&next),
            result,
        };

        if !plan.contains(dragged) {
            return unchanged(DropResult::Missed);
        }
        let current = plan.container_of(dragged).unwrap_or(Container::TopLevel);
        let resolution = self.resolve_commit(plan, dragged, point);

        let ItemRef::Exercise(instance_id) = dragged else {
            // Groups only move at the top level
            return match resolution.target {
                Some(target) => match reorder_plan_items(plan, dragged, &target.target, target.position) {
                    Ok(next) => finish(next, DropResult::Moved { target }),
                    Err(_) => unchanged(DropResult::Missed),
                },
                None => unchanged(DropResult::Missed),
            };
        };

        match (resolution.container, current) {
            // Hovering a group other than the one the exercise is in: join it first
            (Container::Group(group_id), _) if resolution.container != current => {
                let joined = match update_exercise_group(plan, instance_id, Some(group_id), &self.methods) {
                    Ok(p) => p,
                    Err(ReorderError::GroupFull { group_id, max }) => {
                        return unchanged(DropResult::CapacityExceeded { group_id, max });
                    }
                    Err(_) => return unchanged(DropResult::Missed),
                };
                let target = self.resolve_commit(&joined, dragged, point).target;
                let placed = target.as_ref().and_then(|t| {
                    let target_id = t.target.as_exercise()?;
                    reorder_exercises(&joined, instance_id, target_id, t.position).ok()
                });
                match placed {
                    Some(next) => finish(next, DropResult::Regrouped { group_id, target }),
                    None => finish(joined, DropResult::Regrouped { group_id, target: None }),
                }
            }
            // Over the top level while grouped: leave the group, then place
            (Container::TopLevel, Container::Group(_)) => self.extract_and_place(plan, instance_id, point),
            // Same container
            _ => match resolution.target {
                Some(target) => {
                    let moved = match (&target.target, current) {
                        (ItemRef::Exercise(target_id), Container::Group(_)) => {
                            reorder_exercises(plan, instance_id, target_id, target.position)
                        }
                        _ => reorder_plan_items(plan, dragged, &target.target, target.position),
                    };
                    match moved {
                        Ok(next) => finish(next, DropResult::Moved { target }),
                        Err(_) => unchanged(DropResult::Missed),
                    }
                }
                // Nothing to land on, e.g. the lone member of its own group
                None => unchanged(DropResult::Missed),
            },
        }
    }

    fn extract_and_place(&self, plan: &Plan, instance_id: &str, point: Point) -> DropOutcome {
        let extracted = match update_exercise_group(plan, instance_id, None, &self.methods) {
            Ok(p) => p,
            Err(_) => {
                return DropOutcome {
                    plan: plan.clone(),
                    result: DropResult::Missed,
                };
            }
        };
        let dragged = ItemRef::exercise(instance_id);
        let target = self
            .resolve_commit(&extracted, &dragged, point)
            .target
            .filter(|t| extracted.container_of(&t.target) == Some(Container::TopLevel));
        let placed = target
            .as_ref()
            .and_then(|t| reorder_plan_items(&extracted, &dragged, &t.target, t.position).ok());
        let (next, target) = match placed {
            Some(next) => (next, target),
            None => (extracted, None),
        };
        DropOutcome {
            plan: reindex_all_orders(&next),
            result: DropResult::Extracted { target },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::model::layout::{FixedLayouts, Layout};
    use crate::model::method::TrainingMethod;
    use crate::model::plan::{ExerciseEntry, ExerciseGroup};

    type Controller = DragController<FixedLayouts, HashMap<String, TrainingMethod>>;

    fn grouped(id: &str, group: GroupId, order: f64) -> ExerciseEntry {
        let mut e = ExerciseEntry::new(id, "cat", order);
        e.group_id = Some(group);
        e.training_method_id = Some("superset".into());
        e
    }

    /// E1 [0,60]; G1 [80,280] with GA [100,160], GB [200,260]; E2 [300,360]
    fn fixture() -> (Plan, LayoutRegistry) {
        let plan = Plan::new(
            vec![
                ExerciseEntry::new("E1", "squat", 0.0),
                grouped("GA", 1, 0.0),
                grouped("GB", 1, 1.0),
                ExerciseEntry::new("E2", "lunge", 2.0),
            ],
            vec![ExerciseGroup::new(1, "superset", 1.0)],
        );
        let mut layouts = LayoutRegistry::new();
        layouts.set(&ItemRef::exercise("E1"), Layout::new(0.0, 0.0, 300.0, 60.0));
        layouts.set(&ItemRef::Group(1), Layout::new(0.0, 80.0, 300.0, 200.0));
        layouts.set(&ItemRef::exercise("GA"), Layout::new(10.0, 100.0, 280.0, 60.0));
        layouts.set(&ItemRef::exercise("GB"), Layout::new(10.0, 200.0, 280.0, 60.0));
        layouts.set(&ItemRef::exercise("E2"), Layout::new(0.0, 300.0, 300.0, 60.0));
        (plan, layouts)
    }

    fn controller(max: Option<usize>) -> Controller {
        let (_, layouts) = fixture();
        let mut methods = HashMap::new();
        methods.insert("superset".to_string(), TrainingMethod::with_limits(None, max));
        DragController::new(DragConfig::default(), FixedLayouts(layouts), methods)
    }

    fn top_level(plan: &Plan) -> Vec<String> {
        plan.container_items(Container::TopLevel)
            .iter()
            .map(|i| i.to_string())
            .collect()
    }

    #[test]
    fn test_drag_start_captures_origin_and_locks_scroll() {
        let (plan, _) = fixture();
        let mut c = controller(None);
        c.on_drag_start(&plan, ItemRef::exercise("GB")).unwrap();
        let s = c.session().unwrap();
        assert_eq!(s.original_container, Container::Group(1));
        assert_eq!(s.original_index, 1);
        assert_eq!(s.dragged_height, 60.0);
        assert!(!c.is_scroll_enabled());
        assert_eq!(c.phase(), DragPhase::Dragging);
        assert!(!c.layouts().is_empty());
    }

    #[test]
    fn test_drag_start_unknown_item() {
        let (plan, _) = fixture();
        let mut c = controller(None);
        assert_eq!(
            c.on_drag_start(&plan, ItemRef::Group(9)),
            Err(DragError::NotFound(ItemRef::Group(9)))
        );
        assert!(c.session().is_none());
        assert!(c.is_scroll_enabled());
    }

    #[test]
    fn test_move_previews_without_touching_plan() {
        let (plan, _) = fixture();
        let before = plan.clone();
        let mut c = controller(None);
        c.on_drag_start(&plan, ItemRef::exercise("E2")).unwrap();
        let offsets = c.on_drag_move(&plan, Point::new(50.0, 10.0)).clone();
        assert_eq!(c.phase(), DragPhase::Previewing);
        assert_eq!(offsets[&ItemRef::exercise("E1")], 60.0);
        assert_eq!(offsets[&ItemRef::Group(1)], 60.0);
        assert_eq!(offsets[&ItemRef::exercise("E2")], 0.0);
        assert_eq!(plan, before);
    }

    #[test]
    fn test_drop_reorders_top_level() {
        let (plan, _) = fixture();
        let mut c = controller(None);
        c.on_drag_start(&plan, ItemRef::exercise("E2")).unwrap();
        c.on_drag_move(&plan, Point::new(50.0, 10.0));
        let out = c.on_drop(&plan, Point::new(50.0, 10.0));
        assert_eq!(
            out.result,
            DropResult::Moved {
                target: DropTarget::before(ItemRef::exercise("E1"))
            }
        );
        assert_eq!(top_level(&out.plan), vec!["e:E2", "e:E1", "g:1"]);
        assert!(c.preview_offsets().values().all(|v| *v == 0.0));
        assert!(c.is_scroll_enabled());
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_drop_into_group_regroups() {
        let (plan, _) = fixture();
        let mut c = controller(None);
        c.on_drag_start(&plan, ItemRef::exercise("E1")).unwrap();
        // Gap GA..GB is 160..200, split at 180
        let out = c.on_drop(&plan, Point::new(50.0, 190.0));
        assert_eq!(
            out.result,
            DropResult::Regrouped {
                group_id: 1,
                target: Some(DropTarget::before(ItemRef::exercise("GB")))
            }
        );
        let members: Vec<&str> = out
            .plan
            .items_in_group(1)
            .iter()
            .map(|e| e.instance_id.as_str())
            .collect();
        assert_eq!(members, vec!["GA", "E1", "GB"]);
        assert_eq!(
            out.plan.exercise("E1").unwrap().training_method_id.as_deref(),
            Some("superset")
        );
    }

    #[test]
    fn test_drop_into_full_group_changes_nothing() {
        let (plan, _) = fixture();
        let mut c = controller(Some(2));
        c.on_drag_start(&plan, ItemRef::exercise("E1")).unwrap();
        let out = c.on_drop(&plan, Point::new(50.0, 190.0));
        assert_eq!(out.result, DropResult::CapacityExceeded { group_id: 1, max: 2 });
        assert_eq!(out.plan, plan);
        assert!(out.result.warning().unwrap().contains("full"));
    }

    #[test]
    fn test_drop_grouped_exercise_at_top_level_extracts() {
        let (plan, _) = fixture();
        let mut c = controller(None);
        c.on_drag_start(&plan, ItemRef::exercise("GA")).unwrap();
        let out = c.on_drop(&plan, Point::new(50.0, 10.0));
        assert_eq!(
            out.result,
            DropResult::Extracted {
                target: Some(DropTarget::before(ItemRef::exercise("E1")))
            }
        );
        assert_eq!(top_level(&out.plan), vec!["e:GA", "e:E1", "g:1", "e:E2"]);
        assert_eq!(out.plan.exercise("GA").unwrap().training_method_id, None);
    }

    #[test]
    fn test_drop_lone_member_inside_own_group_is_noop() {
        let (mut plan, _) = fixture();
        plan.exercises.retain(|e| e.instance_id != "GB");
        let mut c = controller(None);
        c.on_drag_start(&plan, ItemRef::exercise("GA")).unwrap();
        c.on_drag_move(&plan, Point::new(50.0, 140.0));
        let out = c.on_drop(&plan, Point::new(50.0, 140.0));
        assert_eq!(out.result, DropResult::Missed);
        assert_eq!(out.plan, plan);
        let ga = out.plan.exercise("GA").unwrap();
        assert_eq!(ga.group_id, Some(1));
        assert_eq!(ga.training_method_id.as_deref(), Some("superset"));
        assert!(c.preview_offsets().values().all(|v| *v == 0.0));
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_drop_without_session() {
        let (plan, _) = fixture();
        let mut c = controller(None);
        let out = c.on_drop(&plan, Point::new(0.0, 0.0));
        assert_eq!(out.result, DropResult::NoSession);
        assert_eq!(out.plan, plan);
    }

    #[test]
    fn test_cancel_clears_offsets() {
        let (plan, _) = fixture();
        let mut c = controller(None);
        c.on_drag_start(&plan, ItemRef::exercise("E1")).unwrap();
        c.on_drag_move(&plan, Point::new(50.0, 340.0));
        assert!(c.preview_offsets().values().any(|v| *v != 0.0));
        c.cancel();
        assert!(c.preview_offsets().values().all(|v| *v == 0.0));
        assert!(c.session().is_none());
        assert!(c.is_scroll_enabled());
    }

    #[test]
    fn test_restart_cancels_open_session() {
        let (plan, _) = fixture();
        let mut c = controller(None);
        c.on_drag_start(&plan, ItemRef::exercise("E1")).unwrap();
        c.on_drag_move(&plan, Point::new(50.0, 340.0));
        c.on_drag_start(&plan, ItemRef::Group(1)).unwrap();
        assert!(c.preview_offsets().values().all(|v| *v == 0.0));
        assert_eq!(c.session().unwrap().dragged, ItemRef::Group(1));
    }
}
