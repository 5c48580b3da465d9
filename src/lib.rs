//! Non-destructive photo/video edit engine: a versioned settings model, a
//! bounded undo/redo history of full snapshots, and a deterministic CPU
//! compositing pipeline shared verbatim between live preview and final
//! export.
//!
//! The crate owns no UI, no network and no asset upload; it consumes a
//! decoded source image, a [`settings::ProjectSettings`] value, a render
//! target and (for layer content) a [`ops::layers::LayerAssets`] provider,
//! and produces pixels.

pub mod ai;
pub mod export;
pub mod history;
pub mod ops;
pub mod presets;
pub mod project;
pub mod render;
pub mod settings;
pub mod store;
pub mod studio;

pub use ai::{AiAdapter, AiError, GradeProposal};
pub use export::{ExportArtifact, ExportError, ExportFormat, ExportOptions, Exporter};
pub use history::{HistoryItem, HistoryStack, MAX_HISTORY};
pub use ops::layers::{FileAssets, LayerAssets, MemoryAssets, NoAssets};
pub use project::{MediaKind, Project};
pub use render::{render, RenderTarget, Renderer};
pub use settings::{
    AspectRatio, BlendMode, CurvePoint, HslShift, Layer, LayerKind, ProjectSettings, SettingsPatch,
};
pub use store::{JsonFileStore, ProjectStore, StoreError};
pub use studio::Studio;
