use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Reference data for a training method (superset, circuit, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingMethod {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub min_group_size: Option<usize>,
    #[serde(default)]
    pub max_group_size: Option<usize>,
}

impl TrainingMethod {
    pub fn with_limits(min: Option<usize>, max: Option<usize>) -> Self {
        TrainingMethod {
            name: String::new(),
            min_group_size: min,
            max_group_size: max,
        }
    }

    /// Whether a group of `size` members can take one more
    pub fn has_room(&self, size: usize) -> bool {
        self.max_group_size.is_none_or(|max| size < max)
    }
}

/// Resolves method metadata by id. Unknown ids impose no constraints.
pub trait MethodLookup {
    fn method_by_id(&self, id: &str) -> Option<TrainingMethod>;
}

impl MethodLookup for HashMap<String, TrainingMethod> {
    fn method_by_id(&self, id: &str) -> Option<TrainingMethod> {
        self.get(id).cloned()
    }
}

impl<F> MethodLookup for F
where
    F: Fn(&str) -> Option<TrainingMethod>,
{
    fn method_by_id(&self, id: &str) -> Option<TrainingMethod> {
        self(id)
    }
}

/// Lookup that knows no methods
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMethods;

impl MethodLookup for NoMethods {
    fn method_by_id(&self, _id: &str) -> Option<TrainingMethod> {
        None
    }
}
