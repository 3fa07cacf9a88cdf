use crate::error::{LayoutError, LayoutResult};
use crate::geometry::Padding;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on offset rings; beyond this the candidate list only grows
/// without reaching meaningfully different positions.
pub const MAX_SEARCH_RINGS: u32 = 16;

/// Upper bound on evenly spaced label positions along one side.
pub const MAX_SLIDE_STEPS: u32 = 17;

/// Weights of the placement cost terms.
///
/// `overlap` and `out_of_canvas` form the collision tier, `distance` and
/// `own_object` the preference tier. Collision always dominates preference,
/// whatever the weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostWeights {
    pub overlap: f32,
    pub out_of_canvas: f32,
    pub distance: f32,
    pub own_object: f32,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            overlap: 1.0,
            out_of_canvas: 1.0,
            distance: 1.0,
            own_object: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub grid_size: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    /// Total optimization passes allowed over the solver's lifetime.
    pub max_iterations: u32,
    /// Extra offset rings tried around each object, `padding` apart.
    pub search_rings: u32,
    /// Label positions along each side, from start-aligned to end-aligned.
    /// 1 keeps only the centered position; 3 adds the two edge-aligned ends.
    pub slide_steps: u32,
    pub weights: CostWeights,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_size: 100.0,
            padding_x: 2.0,
            padding_y: 2.0,
            max_iterations: 20,
            search_rings: 3,
            slide_steps: 3,
            weights: CostWeights::default(),
        }
    }
}

impl LayoutConfig {
    pub fn padding(&self) -> Padding {
        Padding::new(self.padding_x, self.padding_y)
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> LayoutResult<()> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(invalid(format!("gridSize must be positive, got {}", self.grid_size)));
        }
        for (name, value) in [("paddingX", self.padding_x), ("paddingY", self.padding_y)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }
        if self.search_rings > MAX_SEARCH_RINGS {
            return Err(invalid(format!(
                "searchRings must be at most {MAX_SEARCH_RINGS}, got {}",
                self.search_rings
            )));
        }
        if !(1..=MAX_SLIDE_STEPS).contains(&self.slide_steps) {
            return Err(invalid(format!(
                "slideSteps must be between 1 and {MAX_SLIDE_STEPS}, got {}",
                self.slide_steps
            )));
        }
        let w = &self.weights;
        for (name, value) in [
            ("weights.overlap", w.overlap),
            ("weights.outOfCanvas", w.out_of_canvas),
            ("weights.distance", w.distance),
            ("weights.ownObject", w.own_object),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }
        if w.overlap <= 0.0 {
            return Err(invalid("weights.overlap must be positive".to_string()));
        }
        Ok(())
    }
}

/// Canvas the labels must stay inside, `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> LayoutResult<Self> {
        let canvas = Self { width, height };
        canvas.validate()?;
        Ok(canvas)
    }

    pub fn validate(&self) -> LayoutResult<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(invalid(format!("canvasWidth must be positive, got {}", self.width)));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(invalid(format!("canvasHeight must be positive, got {}", self.height)));
        }
        Ok(())
    }
}

fn invalid(message: String) -> LayoutError {
    LayoutError::InvalidConfig(message)
}

/// Load a config file, falling back to defaults when `path` is `None`.
///
/// The file is JSON; comments and trailing commas are accepted. Missing
/// keys keep their default values.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config = parse_config(&contents)?;
    Ok(config)
}

pub fn parse_config(contents: &str) -> anyhow::Result<LayoutConfig> {
    let config: LayoutConfig = match serde_json::from_str(contents) {
        Ok(config) => config,
        Err(_) => json5::from_str(contents)?,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_grid_size() {
        for grid_size in [0.0, -5.0, f32::NAN] {
            let config = LayoutConfig {
                grid_size,
                ..LayoutConfig::default()
            };
            assert!(matches!(config.validate(), Err(LayoutError::InvalidConfig(_))));
        }
    }

    #[test]
    fn rejects_negative_padding_and_zero_overlap_weight() {
        let config = LayoutConfig {
            padding_y: -1.0,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = LayoutConfig::default();
        config.weights.overlap = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_canvas() {
        assert!(Canvas::new(0.0, 100.0).is_err());
        assert!(Canvas::new(100.0, -1.0).is_err());
        assert!(Canvas::new(800.0, 600.0).is_ok());
    }

    #[test]
    fn parses_camel_case_with_defaults() {
        let config = parse_config(r#"{"gridSize": 50, "paddingX": 4, "maxIterations": 0}"#)
            .expect("config should parse");
        assert_eq!(config.grid_size, 50.0);
        assert_eq!(config.padding_x, 4.0);
        assert_eq!(config.padding_y, 2.0);
        assert_eq!(config.max_iterations, 0);
        assert_eq!(config.search_rings, 3);
    }

    #[test]
    fn parses_json5_comments() {
        let config = parse_config(
            "{\n  // dense scenes want small cells\n  gridSize: 40,\n  weights: { distance: 0.5, },\n}",
        )
        .expect("json5 config should parse");
        assert_eq!(config.grid_size, 40.0);
        assert_eq!(config.weights.distance, 0.5);
        assert_eq!(config.weights.overlap, 1.0);
    }

    #[test]
    fn parse_rejects_invalid_values() {
        assert!(parse_config(r#"{"gridSize": 0}"#).is_err());
        assert!(parse_config(r#"{"slideSteps": 0}"#).is_err());
        assert!(parse_config(r#"{"slideSteps": 18}"#).is_err());
    }

    #[test]
    fn parses_slide_steps() {
        let config = parse_config(r#"{"slideSteps": 9}"#).expect("config should parse");
        assert_eq!(config.slide_steps, 9);
        assert_eq!(LayoutConfig::default().slide_steps, 3);
    }
}
