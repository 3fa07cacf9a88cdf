#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod layout_dump;
pub mod scene;
pub mod text_metrics;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Canvas, CostWeights, LayoutConfig, load_config};
pub use error::{LayoutError, LayoutResult};
pub use geometry::{Padding, Rect};
pub use layout::{LabelLayout, Placement, SolveSummary, SolverState};
pub use layout_dump::LayoutDump;
pub use scene::Scene;
pub use text_metrics::{FixedAdvance, FontMeasurer, TextMeasure, TextSize};
