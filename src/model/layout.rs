use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::plan::{GroupId, ItemRef};

/// A pointer position in scroll-content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Axis-aligned bounding box measured after render
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Layout {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.x && x <= self.right()
    }

    /// Stale measurements can carry NaN or negative sizes; those are skipped.
    pub fn is_usable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// Latest measured layouts, keyed by item id. Advisory only: any id may be
/// missing or stale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegistry {
    #[serde(default)]
    pub groups: HashMap<GroupId, Layout>,
    #[serde(default)]
    pub exercises: HashMap<String, Layout>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usable layout for an item, `None` when unmeasured
    pub fn get(&self, item: &ItemRef) -> Option<Layout> {
        let layout = match item {
            ItemRef::Exercise(id) => self.exercises.get(id),
            ItemRef::Group(id) => self.groups.get(id),
        };
        layout.copied().filter(Layout::is_usable)
    }

    pub fn set(&mut self, item: &ItemRef, layout: Layout) {
        match item {
            ItemRef::Exercise(id) => {
                self.exercises.insert(id.clone(), layout);
            }
            ItemRef::Group(id) => {
                self.groups.insert(*id, layout);
            }
        }
    }

    pub fn remove(&mut self, item: &ItemRef) {
        match item {
            ItemRef::Exercise(id) => {
                self.exercises.remove(id);
            }
            ItemRef::Group(id) => {
                self.groups.remove(id);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.exercises.is_empty()
    }

    /// Replace this snapshot with a fresh measurement
    pub fn replace(&mut self, other: LayoutRegistry) {
        *self = other;
    }
}

/// Supplies fresh layouts on demand. Implemented by the rendering layer.
pub trait LayoutMeasurer {
    fn measure_layouts(&mut self) -> LayoutRegistry;
}

/// A measurer that always returns the same snapshot
#[derive(Debug, Clone, Default)]
pub struct FixedLayouts(pub LayoutRegistry);

impl LayoutMeasurer for FixedLayouts {
    fn measure_layouts(&mut self) -> LayoutRegistry {
        self.0.clone()
    }
}

impl<F> LayoutMeasurer for F
where
    F: FnMut() -> LayoutRegistry,
{
    fn measure_layouts(&mut self) -> LayoutRegistry {
        self()
    }
}
