// JSON scene input: a canvas, optional config overrides and the objects to
// label. Shared by the CLI and the WASM wrapper.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::LayoutConfig;
use crate::error::LayoutResult;
use crate::layout::LabelLayout;
use crate::layout_dump::{FrameDump, LayoutDump};
use crate::text_metrics::{TextMeasure, TextSize};

fn default_font_size() -> f32 {
    14.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub canvas: SceneCanvas,
    /// Partial config, layered over whatever config the caller starts from.
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SceneCanvas {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    /// `[left, top, right, bottom]`.
    pub bbox: [f32; 4],
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Pre-measured label size; when present the scene's measurer is skipped.
    #[serde(default)]
    pub size: Option<TextSize>,
}

impl Scene {
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        match serde_json::from_str(input) {
            Ok(scene) => Ok(scene),
            Err(_) => Ok(json5::from_str(input)?),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// `base` with this scene's config overrides applied and validated.
    pub fn resolve_config(&self, base: LayoutConfig) -> anyhow::Result<LayoutConfig> {
        let Some(overrides) = &self.config else {
            return Ok(base);
        };
        let mut merged = serde_json::to_value(base)?;
        merge_json(&mut merged, overrides);
        let config: LayoutConfig = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Register every object, optimize, and dump the result. With `frames`
    /// set, the layout after each pass is recorded too, starting from the
    /// unoptimized baseline.
    pub fn solve<M: TextMeasure>(
        &self,
        config: LayoutConfig,
        measure: M,
        frames: bool,
    ) -> LayoutResult<LayoutDump> {
        let measure = SceneMeasure::new(&self.objects, measure);
        let mut layout = LabelLayout::new(self.canvas.width, self.canvas.height, measure, config)?;
        for object in &self.objects {
            let [left, top, right, bottom] = object.bbox;
            layout.add(left, top, right, bottom, &object.text, object.font_size)?;
        }

        let mut recorded = Vec::new();
        if frames {
            recorded.push(FrameDump::capture(&layout, 0));
            while let Some(moves) = layout.step() {
                recorded.push(FrameDump::capture(&layout, moves));
            }
        } else {
            layout.solve();
        }
        Ok(LayoutDump::from_layout(&layout).with_frames(recorded))
    }
}

/// Serves pre-measured sizes from the scene and delegates the rest.
struct SceneMeasure<M> {
    known: BTreeMap<(String, u32), TextSize>,
    fallback: M,
}

impl<M> SceneMeasure<M> {
    fn new(objects: &[SceneObject], fallback: M) -> Self {
        let mut known = BTreeMap::new();
        for object in objects {
            if let Some(size) = object.size {
                known
                    .entry((object.text.clone(), object.font_size.to_bits()))
                    .or_insert(size);
            }
        }
        Self { known, fallback }
    }
}

impl<M: TextMeasure> TextMeasure for SceneMeasure<M> {
    fn measure(&self, text: &str, font_size: f32) -> TextSize {
        match self.known.get(&(text.to_string(), font_size.to_bits())) {
            Some(size) => *size,
            None => self.fallback.measure(text, font_size),
        }
    }
}

fn merge_json(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_metrics::FixedAdvance;

    const SCENE: &str = r#"{
        "canvas": {"width": 400, "height": 300},
        "config": {"gridSize": 40, "weights": {"distance": 2}},
        "objects": [
            {"bbox": [80, 80, 120, 120], "text": "Obj-0", "fontSize": 20},
            {"bbox": [90, 80, 130, 120], "text": "Obj-1", "fontSize": 20, "size": {"width": 30, "height": 10}}
        ]
    }"#;

    #[test]
    fn parses_scene_objects() {
        let scene = Scene::parse(SCENE).expect("scene should parse");
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.objects[0].bbox, [80.0, 80.0, 120.0, 120.0]);
        assert_eq!(scene.objects[1].size, Some(TextSize::new(30.0, 10.0)));
    }

    #[test]
    fn scene_config_overrides_only_named_keys() {
        let scene = Scene::parse(SCENE).expect("scene should parse");
        let base = LayoutConfig {
            padding_x: 5.0,
            ..LayoutConfig::default()
        };
        let config = scene.resolve_config(base).expect("config should merge");
        assert_eq!(config.grid_size, 40.0);
        assert_eq!(config.padding_x, 5.0);
        assert_eq!(config.weights.distance, 2.0);
        assert_eq!(config.weights.overlap, 1.0);
    }

    #[test]
    fn pre_measured_sizes_win() {
        let scene = Scene::parse(SCENE).expect("scene should parse");
        let dump = scene
            .solve(LayoutConfig::default(), FixedAdvance::default(), false)
            .expect("scene should solve");
        assert_eq!(dump.labels[0].width, 60.0);
        assert_eq!(dump.labels[1].width, 30.0);
        assert_eq!(dump.labels[1].height, 10.0);
    }

    #[test]
    fn frames_start_at_the_baseline() {
        let scene = Scene::parse(SCENE).expect("scene should parse");
        let config = scene.resolve_config(LayoutConfig::default()).expect("config");
        let dump = scene
            .solve(config, FixedAdvance::default(), true)
            .expect("scene should solve");
        assert!(dump.frames.len() >= 2);
        assert_eq!(dump.frames[0].pass, 0);
        let last = dump.frames.last().expect("frames recorded");
        assert_eq!(last.moves, 0);
        assert_eq!(last.pass, dump.passes);
    }

    #[test]
    fn accepts_json5_scenes() {
        let scene = Scene::parse("{canvas: {width: 10, height: 10}, objects: [],}").expect("json5 scene");
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn invalid_objects_surface_as_errors() {
        let scene = Scene::parse(
            r#"{"canvas": {"width": 100, "height": 100}, "objects": [{"bbox": [10, 10, 10, 20], "text": "x"}]}"#,
        )
        .expect("scene should parse");
        assert!(scene.solve(LayoutConfig::default(), FixedAdvance::default(), false).is_err());
    }
}
