use crate::layout::{LabelLayout, SolverState};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub state: SolverState,
    pub passes: u32,
    pub overlap_score: f32,
    pub labels: Vec<LabelDump>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<FrameDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDump {
    pub id: usize,
    pub text: String,
    pub object: [f32; 4],
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub text_ascent: f32,
}

/// Label positions after one pass; pass 0 is the unoptimized baseline.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDump {
    pub pass: u32,
    pub moves: usize,
    pub overlap_score: f32,
    /// `[left, top]` per label, in registration order.
    pub positions: Vec<[f32; 2]>,
}

impl FrameDump {
    pub fn capture<M>(layout: &LabelLayout<M>, moves: usize) -> Self {
        Self {
            pass: layout.passes(),
            moves,
            overlap_score: layout.overlap_score(),
            positions: layout
                .placements()
                .iter()
                .map(|placement| [placement.left, placement.top])
                .collect(),
        }
    }
}

impl LayoutDump {
    pub fn from_layout<M>(layout: &LabelLayout<M>) -> Self {
        let canvas = layout.canvas();
        let labels = layout
            .objects()
            .iter()
            .zip(layout.placements())
            .map(|(object, placement)| LabelDump {
                id: object.id,
                text: object.text.clone(),
                object: [
                    object.bbox.left,
                    object.bbox.top,
                    object.bbox.right,
                    object.bbox.bottom,
                ],
                left: placement.left,
                top: placement.top,
                width: placement.width,
                height: placement.height,
                font_size: placement.font_size,
                text_ascent: placement.text_ascent,
            })
            .collect();

        LayoutDump {
            canvas_width: canvas.width,
            canvas_height: canvas.height,
            state: layout.state(),
            passes: layout.passes(),
            overlap_score: layout.overlap_score(),
            labels,
            frames: Vec::new(),
        }
    }

    pub fn with_frames(mut self, frames: Vec<FrameDump>) -> Self {
        self.frames = frames;
        self
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write `dump` as pretty JSON to `path`, or stdout when `path` is `None`.
pub fn write_layout_dump(dump: &LayoutDump, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, dump)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, dump)?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}
