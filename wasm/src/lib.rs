use label_layout::{FixedAdvance, LayoutConfig, LayoutDump, Scene};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Options accepted next to the scene. Everything is optional; scene-level
/// config overrides are applied on top of `config`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelLayoutOptions {
    config: Option<LayoutConfig>,
    frames: Option<bool>,
    /// Per-character advance used for labels without a pre-measured size.
    char_advance: Option<f32>,
    line_height: Option<f32>,
}

fn solve_scene(scene_json: &str, options: LabelLayoutOptions) -> Result<LayoutDump, String> {
    let scene = Scene::parse(scene_json).map_err(|error| error.to_string())?;
    let config = scene
        .resolve_config(options.config.unwrap_or_default())
        .map_err(|error| error.to_string())?;

    let mut measure = FixedAdvance::default();
    if let Some(advance) = options.char_advance {
        measure.advance = advance;
    }
    if let Some(line_height) = options.line_height {
        measure.line_height = line_height;
    }

    scene
        .solve(config, measure, options.frames.unwrap_or(false))
        .map_err(|error| error.to_string())
}

/// Lay out the labels of a JSON scene and return the layout as JSON.
///
/// Browsers measure text far better than a fixed advance can, so callers
/// should send a `size` with every object and let the estimate cover only
/// the stragglers.
#[wasm_bindgen]
pub fn layout_labels(scene_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<LabelLayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        LabelLayoutOptions::default()
    };

    let dump = solve_scene(scene_json, options).map_err(|error| JsValue::from_str(&error))?;
    dump.to_json().map_err(|error| JsValue::from_str(&error.to_string()))
}
