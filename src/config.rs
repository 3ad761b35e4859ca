use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Shape and interaction constants shared by every geometry component.
///
/// All lengths are canvas units unless noted otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub node_size: f32,
    pub port_size: f32,
    pub port_margin: f32,
    pub grid_size: f32,
    /// Screen pixels the pointer must travel before a press becomes a drag.
    pub drag_threshold: f32,
    pub node_padding: f32,
    pub min_visibility: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub endpoint_bias: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            node_size: 32.0,
            port_size: 9.0,
            port_margin: 1.5,
            grid_size: 5.0,
            drag_threshold: 5.0,
            node_padding: 10.0,
            min_visibility: 0.7,
            min_zoom: 0.1,
            max_zoom: 5.0,
            endpoint_bias: 4.0,
        }
    }
}

impl CanvasConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read canvas config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid canvas config in {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Clamps values that would make the geometry degenerate.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.node_size > 0.0) {
            self.node_size = defaults.node_size;
        }
        if !(self.port_size > 0.0) {
            self.port_size = defaults.port_size;
        }
        if !(self.grid_size >= 1.0) {
            self.grid_size = 1.0;
        }
        if !(self.min_zoom > 0.0) {
            self.min_zoom = defaults.min_zoom;
        }
        if self.max_zoom < self.min_zoom {
            self.max_zoom = self.min_zoom;
        }
        self.drag_threshold = self.drag_threshold.max(0.0);
        self.node_padding = self.node_padding.max(0.0);
        self.min_visibility = self.min_visibility.clamp(0.0, 1.0);
        self
    }

    /// Distance between two stacked placements of a padded node.
    pub fn placement_step(&self) -> f32 {
        self.node_size + self.node_padding
    }

    /// Snapping step for the current modifier state.
    pub fn snap_step(&self, bypass_grid: bool) -> f32 {
        if bypass_grid { 1.0 } else { self.grid_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: CanvasConfig = serde_json::from_str(r#"{"grid_size": 10}"#).unwrap();
        assert_eq!(config.grid_size, 10.0);
        assert_eq!(config.node_size, 32.0);
        assert_eq!(config.port_size, 9.0);
    }

    #[test]
    fn sanitize_rejects_degenerate_values() {
        let config = CanvasConfig {
            node_size: -1.0,
            grid_size: 0.0,
            min_zoom: 2.0,
            max_zoom: 1.0,
            min_visibility: 3.0,
            ..CanvasConfig::default()
        }
        .sanitized();

        assert_eq!(config.node_size, 32.0);
        assert_eq!(config.grid_size, 1.0);
        assert_eq!(config.max_zoom, 2.0);
        assert_eq!(config.min_visibility, 1.0);
    }

    #[test]
    fn snap_step_honors_modifier() {
        let config = CanvasConfig::default();
        assert_eq!(config.snap_step(false), 5.0);
        assert_eq!(config.snap_step(true), 1.0);
    }
}
