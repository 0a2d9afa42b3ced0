use serde::Serialize;

use crate::model::config::DragConfig;
use crate::model::layout::{Layout, LayoutRegistry, Point};
use crate::model::plan::{Container, DropPosition, GroupId, ItemRef, Plan};

/// Where a drop would land: next to `target`, inside `target`'s container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropTarget {
    pub target: ItemRef,
    pub position: DropPosition,
}

impl DropTarget {
    pub fn new(target: ItemRef, position: DropPosition) -> Self {
        DropTarget { target, position }
    }

    pub fn before(target: ItemRef) -> Self {
        Self::new(target, DropPosition::Before)
    }

    pub fn after(target: ItemRef) -> Self {
        Self::new(target, DropPosition::After)
    }
}

/// How the resolver is being used
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolveMode {
    /// Single authoritative resolution on drop
    Commit,
    /// Live preview during a drag. When the pointer has left `origin`, the
    /// dragged item is represented by a placeholder of `placeholder_height`
    /// centred on the pointer.
    Preview {
        origin: Container,
        placeholder_height: f64,
    },
}

/// Resolver output: the container under the pointer and the slot in it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub container: Container,
    pub target: Option<DropTarget>,
}

/// One measured item of the active container
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    item: ItemRef,
    layout: Layout,
    /// Hit band, shrunk for groups
    band_top: f64,
    band_bottom: f64,
}

impl Candidate {
    fn new(item: ItemRef, layout: Layout, inset: f64) -> Self {
        let (band_top, band_bottom) = if item.is_group() {
            group_band(&layout, inset)
        } else {
            (layout.y, layout.bottom())
        };
        Candidate {
            item,
            layout,
            band_top,
            band_bottom,
        }
    }
}

/// Vertical hit band of a group box. The inset never exceeds a quarter of
/// the box height, so the band cannot invert.
pub fn group_band(layout: &Layout, inset: f64) -> (f64, f64) {
    let inset = inset.max(0.0).min(layout.height / 4.0);
    (layout.y + inset, layout.bottom() - inset)
}

/// The group whose core band contains the pointer, if any
pub fn group_at(point: Point, plan: &Plan, layouts: &LayoutRegistry, inset: f64) -> Option<GroupId> {
    plan.top_level_items()
        .iter()
        .filter_map(|item| match item.item_ref() {
            ItemRef::Group(id) => Some(id),
            ItemRef::Exercise(_) => None,
        })
        .find(|id| {
            layouts.get(&ItemRef::Group(*id)).is_some_and(|layout| {
                let (top, bottom) = group_band(&layout, inset);
                layout.contains_x(point.x) && point.y >= top && point.y <= bottom
            })
        })
}

/// Container the dragged item would drop into at `point`.
/// Groups only ever live at the top level.
pub fn active_container(
    point: Point,
    dragged: &ItemRef,
    plan: &Plan,
    layouts: &LayoutRegistry,
    inset: f64,
) -> Container {
    match dragged {
        ItemRef::Group(_) => Container::TopLevel,
        ItemRef::Exercise(_) => group_at(point, plan, layouts, inset)
            .map(Container::Group)
            .unwrap_or(Container::TopLevel),
    }
}

/// Resolve the container and slot under `point`.
pub fn resolve(
    point: Point,
    dragged: &ItemRef,
    plan: &Plan,
    layouts: &LayoutRegistry,
    config: &DragConfig,
    mode: ResolveMode,
) -> Resolution {
    let inset = match mode {
        ResolveMode::Commit => config.group_edge_inset_px,
        ResolveMode::Preview { .. } => config.preview_group_edge_inset_px,
    };
    let container = active_container(point, dragged, plan, layouts, inset);
    let candidates = collect_candidates(container, dragged, plan, layouts, inset);

    let target = match mode {
        ResolveMode::Preview {
            origin,
            placeholder_height,
        } if origin != container => {
            resolve_with_placeholder(point.y, dragged, candidates, placeholder_height)
        }
        _ => resolve_in_band(point.y, &candidates, config),
    };

    Resolution {
        container,
        target: target.filter(|t| &t.target != dragged),
    }
}

/// Commit-mode resolution, target only
pub fn resolve_drop_target(
    point: Point,
    dragged: &ItemRef,
    plan: &Plan,
    layouts: &LayoutRegistry,
    config: &DragConfig,
) -> Option<DropTarget> {
    resolve(point, dragged, plan, layouts, config, ResolveMode::Commit).target
}

/// Measured items of `container`, dragged item excluded, top to bottom
fn collect_candidates(
    container: Container,
    dragged: &ItemRef,
    plan: &Plan,
    layouts: &LayoutRegistry,
    inset: f64,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = plan
        .container_items(container)
        .into_iter()
        .filter(|item| item != dragged)
        .filter_map(|item| layouts.get(&item).map(|layout| Candidate::new(item, layout, inset)))
        .collect();
    candidates.sort_by(|a, b| a.layout.y.total_cmp(&b.layout.y));
    candidates
}

/// Walk candidates top to bottom and pick the slot containing `y`.
fn resolve_in_band(y: f64, candidates: &[Candidate], config: &DragConfig) -> Option<DropTarget> {
    let first = candidates.first()?;
    if y <= first.band_top {
        return Some(DropTarget::before(first.item.clone()));
    }

    for (i, c) in candidates.iter().enumerate() {
        if y > c.band_top && y < c.band_bottom {
            return Some(DropTarget::new(c.item.clone(), band_position(y, c, config)));
        }

        let raw_bottom = c.layout.bottom();
        if y >= raw_bottom && y <= raw_bottom + config.min_drop_gap_px {
            return Some(DropTarget::after(c.item.clone()));
        }

        match candidates.get(i + 1) {
            Some(next) if y >= c.band_bottom && y <= next.band_top => {
                let gap = next.band_top - c.band_bottom;
                let effective = if c.item.is_group() && next.item.is_group() {
                    gap.max(config.min_drop_gap_px)
                } else {
                    gap
                };
                let split = c.band_bottom + effective * config.gap_trigger_threshold;
                return Some(if y < split {
                    DropTarget::after(c.item.clone())
                } else {
                    DropTarget::before(next.item.clone())
                });
            }
            Some(_) => {}
            None if y >= c.band_bottom => return Some(DropTarget::after(c.item.clone())),
            None => {}
        }
    }

    // Only reachable with overlapping (stale) layouts
    candidates
        .last()
        .map(|last| DropTarget::after(last.item.clone()))
}

/// Before/after within a band: edge zones first, then the midpoint.
fn band_position(y: f64, c: &Candidate, config: &DragConfig) -> DropPosition {
    let height = c.band_bottom - c.band_top;
    let rel = (y - c.band_top) / height;
    if rel < config.edge_zone_fraction {
        DropPosition::Before
    } else if rel > 1.0 - config.edge_zone_fraction {
        DropPosition::After
    } else if y < c.band_top + height / 2.0 {
        DropPosition::Before
    } else {
        DropPosition::After
    }
}

/// Insert a placeholder for the dragged item at `y` and return the slot it
/// occupies, expressed relative to its neighbour.
fn resolve_with_placeholder(
    y: f64,
    dragged: &ItemRef,
    mut candidates: Vec<Candidate>,
    height: f64,
) -> Option<DropTarget> {
    let placeholder = Candidate::new(
        dragged.clone(),
        Layout::new(0.0, y - height / 2.0, 0.0, height),
        0.0,
    );
    let centre = |c: &Candidate| c.layout.y + c.layout.height / 2.0;
    let slot = candidates
        .iter()
        .position(|c| centre(c) > y)
        .unwrap_or(candidates.len());
    candidates.insert(slot, placeholder);

    if slot > 0 {
        Some(DropTarget::after(candidates[slot - 1].item.clone()))
    } else {
        candidates
            .get(slot + 1)
            .map(|next| DropTarget::before(next.item.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::plan::{ExerciseEntry, ExerciseGroup};

    const W: f64 = 300.0;

    /// Top level: E1 [0,60], G1 [80,280] holding GA [100,160] GB [200,260],
    /// E2 [290,350], G2 [352,452]
    fn fixture() -> (Plan, LayoutRegistry) {
        let mut ga = ExerciseEntry::new("GA", "row", 0.0);
        ga.group_id = Some(1);
        let mut gb = ExerciseEntry::new("GB", "press", 1.0);
        gb.group_id = Some(1);
        let plan = Plan::new(
            vec![
                ExerciseEntry::new("E1", "squat", 0.0),
                ga,
                gb,
                ExerciseEntry::new("E2", "lunge", 2.0),
            ],
            vec![ExerciseGroup::new(1, "superset", 1.0), ExerciseGroup::new(2, "circuit", 3.0)],
        );
        let mut layouts = LayoutRegistry::new();
        layouts.set(&ItemRef::exercise("E1"), Layout::new(0.0, 0.0, W, 60.0));
        layouts.set(&ItemRef::Group(1), Layout::new(0.0, 80.0, W, 200.0));
        layouts.set(&ItemRef::exercise("GA"), Layout::new(10.0, 100.0, W - 20.0, 60.0));
        layouts.set(&ItemRef::exercise("GB"), Layout::new(10.0, 200.0, W - 20.0, 60.0));
        layouts.set(&ItemRef::exercise("E2"), Layout::new(0.0, 290.0, W, 60.0));
        layouts.set(&ItemRef::Group(2), Layout::new(0.0, 352.0, W, 100.0));
        (plan, layouts)
    }

    fn commit(y: f64, dragged: &ItemRef) -> Resolution {
        let (plan, layouts) = fixture();
        resolve(
            Point::new(50.0, y),
            dragged,
            &plan,
            &layouts,
            &DragConfig::default(),
            ResolveMode::Commit,
        )
    }

    #[test]
    fn test_group_band_is_inset_and_clamped() {
        assert_eq!(group_band(&Layout::new(0.0, 80.0, W, 200.0), 24.0), (104.0, 256.0));
        assert_eq!(group_band(&Layout::new(0.0, 0.0, W, 40.0), 24.0), (10.0, 30.0));
    }

    #[test]
    fn test_exercise_over_group_band_targets_group_members() {
        let r = commit(120.0, &ItemRef::exercise("E2"));
        assert_eq!(r.container, Container::Group(1));
        assert_eq!(r.target, Some(DropTarget::before(ItemRef::exercise("GA"))));
    }

    #[test]
    fn test_group_header_chrome_is_top_level() {
        // 90 is inside G1's raw box but above its band
        let r = commit(90.0, &ItemRef::exercise("E2"));
        assert_eq!(r.container, Container::TopLevel);
        assert_eq!(r.target, Some(DropTarget::before(ItemRef::Group(1))));
    }

    #[test]
    fn test_dragged_group_stays_top_level() {
        let r = commit(120.0, &ItemRef::Group(2));
        assert_eq!(r.container, Container::TopLevel);
        assert_eq!(r.target, Some(DropTarget::before(ItemRef::Group(1))));
    }

    #[test]
    fn test_band_zones() {
        let dragged = ItemRef::Group(2);
        // E1 band [0,60]: top 20% before, bottom 20% after, middle by midpoint
        assert_eq!(commit(5.0, &dragged).target, Some(DropTarget::before(ItemRef::exercise("E1"))));
        assert_eq!(commit(29.0, &dragged).target, Some(DropTarget::before(ItemRef::exercise("E1"))));
        assert_eq!(commit(31.0, &dragged).target, Some(DropTarget::after(ItemRef::exercise("E1"))));
        assert_eq!(commit(55.0, &dragged).target, Some(DropTarget::after(ItemRef::exercise("E1"))));
    }

    #[test]
    fn test_min_gap_zone_below_item_means_after() {
        // 60..72 is E1's trigger zone even though the gap to G1 runs to 104
        assert_eq!(
            commit(70.0, &ItemRef::Group(2)).target,
            Some(DropTarget::after(ItemRef::exercise("E1")))
        );
    }

    #[test]
    fn test_gap_split_between_items() {
        // E2 dragged: G1 band ends 256, raw bottom 280, trigger zone to 292.
        // Next candidate G2 band starts 352 + 24 = 376.
        let r = commit(300.0, &ItemRef::exercise("E2"));
        // gap 256..376, split at 316
        assert_eq!(r.target, Some(DropTarget::after(ItemRef::Group(1))));
        let r = commit(330.0, &ItemRef::exercise("E2"));
        assert_eq!(r.target, Some(DropTarget::before(ItemRef::Group(2))));
    }

    #[test]
    fn test_min_gap_between_small_groups() {
        // G1 [0,32] band 8..24, G2 [32,40] band 34..38. The 10px band gap is
        // widened to 12, moving the split from 29 to 30.
        let plan = Plan::new(
            vec![ExerciseEntry::new("E", "squat", 0.0)],
            vec![ExerciseGroup::new(1, "superset", 1.0), ExerciseGroup::new(2, "circuit", 2.0)],
        );
        let mut layouts = LayoutRegistry::new();
        layouts.set(&ItemRef::Group(1), Layout::new(0.0, 0.0, W, 32.0));
        layouts.set(&ItemRef::Group(2), Layout::new(0.0, 32.0, W, 8.0));
        layouts.set(&ItemRef::exercise("E"), Layout::new(0.0, 100.0, W, 60.0));
        let at = |y| {
            resolve(
                Point::new(50.0, y),
                &ItemRef::exercise("E"),
                &plan,
                &layouts,
                &DragConfig::default(),
                ResolveMode::Commit,
            )
        };

        let r = at(29.5);
        assert_eq!(r.container, Container::TopLevel);
        assert_eq!(r.target, Some(DropTarget::after(ItemRef::Group(1))));
        assert_eq!(at(30.5).target, Some(DropTarget::before(ItemRef::Group(2))));
    }

    #[test]
    fn test_below_last_item_is_after_last() {
        let r = commit(900.0, &ItemRef::exercise("E1"));
        assert_eq!(r.target, Some(DropTarget::after(ItemRef::Group(2))));
    }

    #[test]
    fn test_unmeasured_items_are_skipped() {
        let (plan, mut layouts) = fixture();
        layouts.remove(&ItemRef::exercise("E1"));
        let t = resolve_drop_target(
            Point::new(50.0, 5.0),
            &ItemRef::exercise("E2"),
            &plan,
            &layouts,
            &DragConfig::default(),
        );
        assert_eq!(t, Some(DropTarget::before(ItemRef::Group(1))));
    }

    #[test]
    fn test_empty_container_resolves_nothing() {
        let plan = Plan::new(vec![ExerciseEntry::new("E1", "x", 0.0)], vec![]);
        let t = resolve_drop_target(
            Point::new(0.0, 10.0),
            &ItemRef::exercise("E1"),
            &plan,
            &LayoutRegistry::new(),
            &DragConfig::default(),
        );
        assert_eq!(t, None);
    }

    #[test]
    fn test_preview_injects_placeholder_in_foreign_group() {
        let (plan, layouts) = fixture();
        let mode = ResolveMode::Preview {
            origin: Container::TopLevel,
            placeholder_height: 60.0,
        };
        // Pointer at 190 sits between GA's centre (130) and GB's centre (230)
        let r = resolve(
            Point::new(50.0, 190.0),
            &ItemRef::exercise("E2"),
            &plan,
            &layouts,
            &DragConfig::default(),
            mode,
        );
        assert_eq!(r.container, Container::Group(1));
        assert_eq!(r.target, Some(DropTarget::after(ItemRef::exercise("GA"))));

        let r = resolve(
            Point::new(50.0, 118.0),
            &ItemRef::exercise("E2"),
            &plan,
            &layouts,
            &DragConfig::default(),
            mode,
        );
        assert_eq!(r.target, Some(DropTarget::before(ItemRef::exercise("GA"))));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let a = commit(187.5, &ItemRef::exercise("E1"));
        let b = commit(187.5, &ItemRef::exercise("E1"));
        assert_eq!(a, b);
    }
}
