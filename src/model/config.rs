use serde::{Deserialize, Serialize};

/// Geometry tunables for drop-target resolution and preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DragConfig {
    /// Fraction of an item band at each edge that snaps to before/after.
    /// Default: 0.2
    #[serde(default = "default_edge_zone_fraction")]
    pub edge_zone_fraction: f64,
    /// Split point of the gap between two items. Default: 0.5
    #[serde(default = "default_gap_trigger_threshold")]
    pub gap_trigger_threshold: f64,
    /// Height of the "insert after" zone below every item, and the minimum
    /// effective gap between two groups. Default: 12
    #[serde(default = "default_min_drop_gap_px")]
    pub min_drop_gap_px: f64,
    /// Vertical inset of group hit boxes when committing a drop. Default: 24
    #[serde(default = "default_group_edge_inset_px")]
    pub group_edge_inset_px: f64,
    /// Vertical inset of group hit boxes while previewing. Default: 16
    #[serde(default = "default_preview_group_edge_inset_px")]
    pub preview_group_edge_inset_px: f64,
    /// Height assumed for a dragged item that has no layout. Default: 64
    #[serde(default = "default_item_height")]
    pub default_item_height: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        DragConfig {
            edge_zone_fraction: default_edge_zone_fraction(),
            gap_trigger_threshold: default_gap_trigger_threshold(),
            min_drop_gap_px: default_min_drop_gap_px(),
            group_edge_inset_px: default_group_edge_inset_px(),
            preview_group_edge_inset_px: default_preview_group_edge_inset_px(),
            default_item_height: default_item_height(),
        }
    }
}

fn default_edge_zone_fraction() -> f64 {
    0.2
}

fn default_gap_trigger_threshold() -> f64 {
    0.5
}

fn default_min_drop_gap_px() -> f64 {
    12.0
}

fn default_group_edge_inset_px() -> f64 {
    24.0
}

fn default_preview_group_edge_inset_px() -> f64 {
    16.0
}

fn default_item_height() -> f64 {
    64.0
}
