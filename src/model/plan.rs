use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Group ids are allocated by the host and never reused within a session.
pub type GroupId = u32;

/// One placement of a catalog exercise in the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    /// Session-stable id of this placement (not the catalog id)
    pub instance_id: String,
    /// Catalog exercise id
    pub exercise_id: String,
    /// Catalog exercise name, display only
    #[serde(default)]
    pub exercise_name: String,
    /// Owning group, `None` for a top-level entry
    #[serde(default)]
    pub group_id: Option<GroupId>,
    /// Relative position inside the owning container
    pub order: f64,
    /// Mirrors the owning group's method while grouped
    #[serde(default)]
    pub training_method_id: Option<String>,

    // --- Opaque payload, never touched by reordering ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sets: Option<u32>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub target_metrics: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub is_warmup: bool,
}

impl ExerciseEntry {
    /// Create a top-level entry with an empty payload
    pub fn new(instance_id: impl Into<String>, exercise_id: impl Into<String>, order: f64) -> Self {
        ExerciseEntry {
            instance_id: instance_id.into(),
            exercise_id: exercise_id.into(),
            exercise_name: String::new(),
            group_id: None,
            order,
            training_method_id: None,
            target_sets: None,
            target_metrics: IndexMap::new(),
            is_warmup: false,
        }
    }

    pub fn container(&self) -> Container {
        Container::from(self.group_id)
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef::Exercise(self.instance_id.clone())
    }
}

/// A superset/circuit: exercises sharing one training method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseGroup {
    pub id: GroupId,
    pub training_method_id: String,
    /// Shares the ordering space of top-level exercises
    pub order: f64,
}

impl ExerciseGroup {
    pub fn new(id: GroupId, training_method_id: impl Into<String>, order: f64) -> Self {
        ExerciseGroup {
            id,
            training_method_id: training_method_id.into(),
            order,
        }
    }
}

/// Reference to a draggable/targetable item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ItemRef {
    Exercise(String),
    Group(GroupId),
}

impl ItemRef {
    pub fn exercise(instance_id: impl Into<String>) -> Self {
        ItemRef::Exercise(instance_id.into())
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ItemRef::Group(_))
    }

    pub fn as_exercise(&self) -> Option<&str> {
        match self {
            ItemRef::Exercise(id) => Some(id),
            ItemRef::Group(_) => None,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Exercise(id) => write!(f, "e:{}", id),
            ItemRef::Group(id) => write!(f, "g:{}", id),
        }
    }
}

impl FromStr for ItemRef {
    type Err = String;

    /// Parse `e:<instanceId>` or `g:<groupId>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix("e:") {
            if id.is_empty() {
                return Err("empty exercise instance id".into());
            }
            return Ok(ItemRef::Exercise(id.to_string()));
        }
        if let Some(id) = s.strip_prefix("g:") {
            return id
                .parse::<GroupId>()
                .map(ItemRef::Group)
                .map_err(|_| format!("invalid group id: {}", id));
        }
        Err(format!("expected e:<instance> or g:<group>, got '{}'", s))
    }
}

/// Scope within which an `order` value is meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    TopLevel,
    Group(GroupId),
}

impl From<Option<GroupId>> for Container {
    fn from(group_id: Option<GroupId>) -> Self {
        match group_id {
            Some(id) => Container::Group(id),
            None => Container::TopLevel,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::TopLevel => write!(f, "top level"),
            Container::Group(id) => write!(f, "group {}", id),
        }
    }
}

/// Where the dragged item lands relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    Before,
    After,
}

impl FromStr for DropPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(DropPosition::Before),
            "after" => Ok(DropPosition::After),
            other => Err(format!("expected before or after, got '{}'", other)),
        }
    }
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropPosition::Before => write!(f, "before"),
            DropPosition::After => write!(f, "after"),
        }
    }
}

/// A borrowed top-level item: an ungrouped exercise or a group
#[derive(Debug, Clone, Copy)]
pub enum TopLevelItem<'a> {
    Exercise(&'a ExerciseEntry),
    Group(&'a ExerciseGroup),
}

impl TopLevelItem<'_> {
    pub fn item_ref(&self) -> ItemRef {
        match self {
            TopLevelItem::Exercise(e) => e.item_ref(),
            TopLevelItem::Group(g) => ItemRef::Group(g.id),
        }
    }

    pub fn order(&self) -> f64 {
        match self {
            TopLevelItem::Exercise(e) => e.order,
            TopLevelItem::Group(g) => g.order,
        }
    }
}

/// The plan being edited
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
    #[serde(default)]
    pub groups: Vec<ExerciseGroup>,
}

impl Plan {
    pub fn new(exercises: Vec<ExerciseEntry>, groups: Vec<ExerciseGroup>) -> Self {
        Plan { exercises, groups }
    }

    /// Ungrouped exercises and all groups, sorted by `order`.
    /// Ties keep array position, exercises before groups.
    pub fn top_level_items(&self) -> Vec<TopLevelItem<'_>> {
        let mut items: Vec<TopLevelItem<'_>> = self
            .exercises
            .iter()
            .filter(|e| e.group_id.is_none())
            .map(TopLevelItem::Exercise)
            .chain(self.groups.iter().map(TopLevelItem::Group))
            .collect();
        items.sort_by(|a, b| compare_orders(a.order(), b.order()));
        items
    }

    /// Exercises whose `group_id` is `group_id`, sorted by `order`
    pub fn items_in_group(&self, group_id: GroupId) -> Vec<&ExerciseEntry> {
        let mut items: Vec<&ExerciseEntry> = self
            .exercises
            .iter()
            .filter(|e| e.group_id == Some(group_id))
            .collect();
        items.sort_by(|a, b| compare_orders(a.order, b.order));
        items
    }

    /// Ordered item refs of one container
    pub fn container_items(&self, container: Container) -> Vec<ItemRef> {
        match container {
            Container::TopLevel => self.top_level_items().iter().map(|i| i.item_ref()).collect(),
            Container::Group(id) => self.items_in_group(id).iter().map(|e| e.item_ref()).collect(),
        }
    }

    pub fn exercise(&self, instance_id: &str) -> Option<&ExerciseEntry> {
        self.exercises.iter().find(|e| e.instance_id == instance_id)
    }

    pub fn exercise_mut(&mut self, instance_id: &str) -> Option<&mut ExerciseEntry> {
        self.exercises.iter_mut().find(|e| e.instance_id == instance_id)
    }

    pub fn group(&self, group_id: GroupId) -> Option<&ExerciseGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn contains(&self, item: &ItemRef) -> bool {
        match item {
            ItemRef::Exercise(id) => self.exercise(id).is_some(),
            ItemRef::Group(id) => self.group(*id).is_some(),
        }
    }

    /// The container an item currently lives in. Groups are always top-level.
    pub fn container_of(&self, item: &ItemRef) -> Option<Container> {
        match item {
            ItemRef::Exercise(id) => self.exercise(id).map(|e| e.container()),
            ItemRef::Group(id) => self.group(*id).map(|_| Container::TopLevel),
        }
    }

    /// Position of an item within its container
    pub fn index_in_container(&self, item: &ItemRef) -> Option<usize> {
        let container = self.container_of(item)?;
        self.container_items(container).iter().position(|i| i == item)
    }

    pub fn group_size(&self, group_id: GroupId) -> usize {
        self.exercises
            .iter()
            .filter(|e| e.group_id == Some(group_id))
            .count()
    }

    /// Overwrite the `order` of one item
    pub(crate) fn set_order(&mut self, item: &ItemRef, order: f64) {
        match item {
            ItemRef::Exercise(id) => {
                if let Some(e) = self.exercise_mut(id) {
                    e.order = order;
                }
            }
            ItemRef::Group(id) => {
                if let Some(g) = self.groups.iter_mut().find(|g| g.id == *id) {
                    g.order = order;
                }
            }
        }
    }

    /// Largest `order` in a container, `None` when it is empty
    pub(crate) fn max_order(&self, container: Container) -> Option<f64> {
        let orders: Vec<f64> = match container {
            Container::TopLevel => self.top_level_items().iter().map(|i| i.order()).collect(),
            Container::Group(id) => self.items_in_group(id).iter().map(|e| e.order).collect(),
        };
        orders
            .into_iter()
            .filter(|o| o.is_finite())
            .max_by(|a, b| a.total_cmp(b))
    }
}

/// Total order over `order` values. Numeric comparison (so `-0.0 == 0.0`
/// and ties fall back to the caller's stable sort), every NaN sorts last.
pub fn compare_orders(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}
