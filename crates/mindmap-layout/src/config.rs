#![forbid(unsafe_code)]

//! Plain-data tunables for layout and hit-testing.
//!
//! Both structs are `Serialize`/`Deserialize` with `serde(default)`, so a
//! partial config file only needs the fields it overrides, and a
//! [`LayoutConfig`] can be shipped to the layout worker as-is.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Text metrics and spacing used by the layout engine.
///
/// All lengths are layout units (pixels at scale 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Default font size; a node's `style.font_size` overrides it.
    pub font_size: f64,
    pub min_node_width: f64,
    pub max_node_width: f64,
    pub min_node_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f64,
    /// Advance of a narrow (Latin) character as a multiple of the font size.
    pub latin_char_factor: f64,
    /// Advance of a wide (CJK / full-width) character.
    pub wide_char_factor: f64,
    /// Gap between the widest node of a level and the next level's left edge.
    pub horizontal_gap: f64,
    /// Gap between consecutive sibling subtrees.
    pub vertical_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            min_node_width: 100.0,
            max_node_width: 220.0,
            min_node_height: 40.0,
            padding_x: 16.0,
            padding_y: 10.0,
            line_height_factor: 1.5,
            latin_char_factor: 0.6,
            wide_char_factor: 1.0,
            horizontal_gap: 80.0,
            vertical_gap: 20.0,
        }
    }
}

impl LayoutConfig {
    /// Validate the config, returning a list of human-readable errors.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let positive = [
            ("layout.font_size", self.font_size),
            ("layout.min_node_width", self.min_node_width),
            ("layout.min_node_height", self.min_node_height),
            ("layout.line_height_factor", self.line_height_factor),
            ("layout.latin_char_factor", self.latin_char_factor),
            ("layout.wide_char_factor", self.wide_char_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("{name} must be > 0, got {value}"));
            }
        }

        let non_negative = [
            ("layout.padding_x", self.padding_x),
            ("layout.padding_y", self.padding_y),
            ("layout.horizontal_gap", self.horizontal_gap),
            ("layout.vertical_gap", self.vertical_gap),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be >= 0, got {value}"));
            }
        }

        if self.max_node_width < self.min_node_width {
            errors.push(format!(
                "layout.max_node_width ({}) must be >= layout.min_node_width ({})",
                self.max_node_width, self.min_node_width
            ));
        }
        if self.max_node_width <= 2.0 * self.padding_x {
            errors.push(format!(
                "layout.max_node_width ({}) must exceed twice layout.padding_x ({})",
                self.max_node_width, self.padding_x
            ));
        }

        errors
    }

    /// Hash of every field, used to detect config changes between passes.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for value in [
            self.font_size,
            self.min_node_width,
            self.max_node_width,
            self.min_node_height,
            self.padding_x,
            self.padding_y,
            self.line_height_factor,
            self.latin_char_factor,
            self.wide_char_factor,
            self.horizontal_gap,
            self.vertical_gap,
        ] {
            value.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Constants of the drag-and-drop hit-testing heuristics.
///
/// The proximity fallback magnitudes are tuned for the default font metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTestConfig {
    /// Edge length of a spatial grid cell.
    pub cell_size: f64,
    /// Cells searched around the pointer's cell by the proximity fallback.
    pub search_radius_cells: u32,
    /// Horizontal offset of a childless node's insertion slot from its right edge.
    pub slot_offset_x: f64,
    /// Maximum horizontal distance to a slot for it to qualify.
    pub tolerance_x: f64,
    /// Maximum vertical distance to a slot for it to qualify.
    pub tolerance_y: f64,
    /// Pointer within this distance below a target's bottom edge snaps to index 0.
    pub near_top_snap: f64,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            cell_size: 240.0,
            search_radius_cells: 2,
            slot_offset_x: 100.0,
            tolerance_x: 140.0,
            tolerance_y: 140.0,
            near_top_snap: 8.0,
        }
    }
}

impl HitTestConfig {
    /// Validate the config, returning a list of human-readable errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            errors.push(format!(
                "interaction.hit_test.cell_size must be > 0, got {}",
                self.cell_size
            ));
        }
        for (name, value) in [
            ("interaction.hit_test.tolerance_x", self.tolerance_x),
            ("interaction.hit_test.tolerance_y", self.tolerance_y),
            ("interaction.hit_test.near_top_snap", self.near_top_snap),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be >= 0, got {value}"));
            }
        }
        if !self.slot_offset_x.is_finite() {
            errors.push("interaction.hit_test.slot_offset_x must be finite".into());
        }
        errors
    }
}
