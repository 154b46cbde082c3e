#![forbid(unsafe_code)]

//! Screen/world view transform.
//!
//! A world point `w` renders at `w * scale + translate`. Zooming re-solves
//! `translate` so the world point under the anchor stays under it.

use mindmap_core::geometry::{Bounds, Point, Size};
use serde::{Deserialize, Serialize};

/// Zoom limits and per-tick factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale multiplier for one wheel tick toward the user.
    pub zoom_in_factor: f64,
    /// Scale multiplier for one wheel tick away from the user.
    pub zoom_out_factor: f64,
    pub initial_scale: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 3.0,
            zoom_in_factor: 1.1,
            zoom_out_factor: 0.9,
            initial_scale: 1.0,
        }
    }
}

impl ViewConfig {
    /// Validate the config, returning a list of human-readable errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            errors.push(format!("view.min_scale must be > 0, got {}", self.min_scale));
        }
        if !(self.max_scale.is_finite() && self.max_scale >= self.min_scale) {
            errors.push(format!(
                "view.max_scale ({}) must be >= view.min_scale ({})",
                self.max_scale, self.min_scale
            ));
        }
        if !(self.zoom_in_factor.is_finite() && self.zoom_in_factor > 1.0) {
            errors.push(format!(
                "view.zoom_in_factor must be > 1, got {}",
                self.zoom_in_factor
            ));
        }
        if !(self.zoom_out_factor > 0.0 && self.zoom_out_factor < 1.0) {
            errors.push(format!(
                "view.zoom_out_factor must be in (0, 1), got {}",
                self.zoom_out_factor
            ));
        }
        if !(self.initial_scale >= self.min_scale && self.initial_scale <= self.max_scale) {
            errors.push(format!(
                "view.initial_scale ({}) must lie within [view.min_scale, view.max_scale]",
                self.initial_scale
            ));
        }
        errors
    }

    /// Clamp `scale` into `[min_scale, max_scale]`.
    #[must_use]
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

/// Pan offset (screen pixels) and zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Result of an anchored zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomOutcome {
    pub transform: ViewTransform,
    /// The requested scale fell outside the limits and was clamped.
    pub clamped: bool,
}

impl ViewTransform {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(translate_x: f64, translate_y: f64, scale: f64) -> Self {
        Self {
            translate_x,
            translate_y,
            scale,
        }
    }

    #[inline]
    #[must_use]
    pub fn translate(&self) -> Point {
        Point::new(self.translate_x, self.translate_y)
    }

    #[inline]
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.translate_x) / self.scale,
            (screen.y - self.translate_y) / self.scale,
        )
    }

    #[inline]
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.translate_x,
            world.y * self.scale + self.translate_y,
        )
    }

    /// World-space rectangle covered by a canvas of `size` pixels.
    #[must_use]
    pub fn world_viewport(&self, size: Size) -> Bounds {
        let top_left = self.screen_to_world(Point::ORIGIN);
        let bottom_right = self.screen_to_world(Point::new(size.width, size.height));
        Bounds::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
    }

    /// Shifted by a screen-space delta.
    #[must_use]
    pub fn panned(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.translate_x + dx, self.translate_y + dy, self.scale)
    }

    /// Same scale, translated so `world` sits at the canvas center.
    #[must_use]
    pub fn center_on(&self, world: Point, size: Size) -> Self {
        let center = size.center();
        Self::new(
            center.x - world.x * self.scale,
            center.y - world.y * self.scale,
            self.scale,
        )
    }

    /// Multiply the scale by `factor`, keeping the world point under the
    /// screen-space `anchor` fixed.
    #[must_use]
    pub fn zoom_by(&self, factor: f64, anchor: Point, config: &ViewConfig) -> ZoomOutcome {
        let requested = self.scale * factor;
        let scale = config.clamp_scale(requested);
        let world = self.screen_to_world(anchor);
        ZoomOutcome {
            transform: Self::new(anchor.x - world.x * scale, anchor.y - world.y * scale, scale),
            clamped: scale != requested,
        }
    }

    /// Largest in-range scale showing all of `bounds` inside `size` with
    /// `margin` pixels on every side, centered.
    #[must_use]
    pub fn fit_bounds(bounds: Bounds, size: Size, margin: f64, config: &ViewConfig) -> Self {
        let avail_w = (size.width - 2.0 * margin).max(1.0);
        let avail_h = (size.height - 2.0 * margin).max(1.0);
        let scale_w = if bounds.width() > 0.0 {
            avail_w / bounds.width()
        } else {
            config.max_scale
        };
        let scale_h = if bounds.height() > 0.0 {
            avail_h / bounds.height()
        } else {
            config.max_scale
        };
        let scale = config.clamp_scale(scale_w.min(scale_h));
        Self::new(0.0, 0.0, scale).center_on(bounds.center(), size)
    }

    /// Keep the apparent view center when the canvas changes size.
    #[must_use]
    pub fn resized(&self, old: Size, new: Size) -> Self {
        self.panned(
            (new.width - old.width) / 2.0,
            (new.height - old.height) / 2.0,
        )
    }
}
