use indexmap::IndexMap;

use crate::model::plan::{Container, DropPosition, ItemRef, Plan};
use crate::ops::resolve::Resolution;

/// Vertical pixel displacement per item, applied while a drag is in flight.
/// Keys stay once tracked; ending a drag zeroes values rather than removing them.
pub type PreviewOffsets = IndexMap<ItemRef, f64>;

/// Offsets that make room for the dragged item at the resolved slot.
///
/// Items displaced toward the end of their container get `+height`, items
/// closing the hole the dragged item left get `-height`, the dragged item
/// itself gets `0`. The plan is not modified.
pub fn compute_preview_offsets(
    plan: &Plan,
    dragged: &ItemRef,
    origin: Container,
    resolution: &Resolution,
    height: f64,
) -> PreviewOffsets {
    let mut offsets = PreviewOffsets::new();

    let origin_items = plan.container_items(origin);
    let origin_rest: Vec<&ItemRef> = origin_items.iter().filter(|i| *i != dragged).collect();

    if resolution.container == origin {
        // Final sequence with the dragged item re-inserted
        let mut landed = origin_rest.clone();
        let insert_at = match &resolution.target {
            Some(target) => slot_index(&origin_rest, target.target.clone(), target.position),
            None => origin_items.iter().position(|i| i == dragged),
        };
        if let Some(at) = insert_at {
            landed.insert(at.min(landed.len()), dragged);
        }
        for (from, item) in origin_items.iter().enumerate() {
            let to = landed.iter().position(|i| *i == item).unwrap_or(from);
            offsets.insert(item.clone(), shift(from, to, height));
        }
    } else {
        // The dragged item left `origin`: everything below it closes up
        for (from, item) in origin_items.iter().enumerate() {
            let to = origin_rest.iter().position(|i| *i == item).unwrap_or(from);
            offsets.insert(item.clone(), shift(from, to, height));
        }
        // ...and the hovered container opens a slot
        let target_items = plan.container_items(resolution.container);
        let target_rest: Vec<&ItemRef> = target_items.iter().filter(|i| *i != dragged).collect();
        let insert_at = resolution
            .target
            .as_ref()
            .and_then(|t| slot_index(&target_rest, t.target.clone(), t.position))
            .unwrap_or(target_rest.len());
        for (k, item) in target_rest.iter().enumerate() {
            let offset = if k >= insert_at { height } else { 0.0 };
            offsets.insert((*item).clone(), offset);
        }
    }

    offsets.insert(dragged.clone(), 0.0);
    offsets
}

/// Index the dragged item takes in `rest` when landing next to `target`
fn slot_index(rest: &[&ItemRef], target: ItemRef, position: DropPosition) -> Option<usize> {
    let idx = rest.iter().position(|i| **i == target)?;
    Some(match position {
        DropPosition::Before => idx,
        DropPosition::After => idx + 1,
    })
}

fn shift(from: usize, to: usize, height: f64) -> f64 {
    (to as f64 - from as f64) * height
}

/// Zero every tracked offset in place
pub fn clear_offsets(offsets: &mut PreviewOffsets) {
    for value in offsets.values_mut() {
        *value = 0.0;
    }
}
