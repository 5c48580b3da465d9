// ============================================================================
// SETTINGS MODEL — the complete parameter set describing one edit state
// ============================================================================
//
// A `ProjectSettings` value is closed and total: every field carries a
// defined value at all times, so the render pipeline never sees a partial
// state. Mutation goes through `SettingsPatch` merging, which always
// produces a new value; history snapshots are plain `Clone`s.
//
// The model performs no validation or clamping. The render pipeline is
// responsible for tolerating out-of-range values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output framing preset for the crop tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait,
    #[default]
    Custom,
}

/// Pixel-combination function used when compositing a layer over its
/// backdrop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
}

impl BlendMode {
    /// All supported modes, in UI display order.
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::SoftLight,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::SoftLight => "Soft Light",
        }
    }
}

fn default_font_size() -> f32 {
    32.0
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

/// Kind-specific payload of a layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    /// A raster element referenced by an opaque content string, resolved
    /// through the `LayerAssets` provider at composite time.
    Image { content: String },
    /// A single line of text drawn centered at the layer position.
    Text {
        content: String,
        #[serde(default = "default_font_size")]
        font_size: f32,
        #[serde(default = "default_text_color")]
        color: String,
    },
    /// Placeholder kinds carried in the data model; the compositor skips
    /// them.
    Shape,
    Adjustment,
}

/// An independently positioned, blended visual element composited above the
/// base image. `x`/`y` are percentages of the destination canvas, origin
/// top-left; `opacity` is 0–100.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: Uuid,
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub rotation: f32,
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    fn new(name: &str, kind: LayerKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            visible: true,
            opacity: 100.0,
            blend_mode: BlendMode::Normal,
            x: 50.0,
            y: 50.0,
            scale: 1.0,
            rotation: 0.0,
            kind,
        }
    }

    pub fn image(name: &str, content: &str) -> Self {
        Self::new(
            name,
            LayerKind::Image {
                content: content.to_string(),
            },
        )
    }

    pub fn text(name: &str, content: &str) -> Self {
        Self::new(
            name,
            LayerKind::Text {
                content: content.to_string(),
                font_size: default_font_size(),
                color: default_text_color(),
            },
        )
    }
}

/// Normalized tone-curve control point. The first point is (0,0), the last
/// (1,1), monotonic in x. Modeled but not yet consulted by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

impl CurvePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Per-channel hue/saturation/lightness shift, keyed by channel name in
/// `ProjectSettings::hsl`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct HslShift {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

/// Crop rectangle in source-pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The complete parameter set describing one edit state of an asset.
///
/// Scalar conventions: brightness/contrast/saturation are percentages with
/// neutral 100; exposure is an additive offset on brightness, neutral 0;
/// vibrance is a delta around its own midpoint of 100; blur is a radius in
/// destination pixels; everything else is 0 = off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    // Basic adjustment stack
    pub brightness: f32,
    pub contrast: f32,
    pub exposure: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
    pub saturation: f32,
    pub vibrance: f32,
    pub temperature: f32,
    pub tint: f32,
    pub sharpness: f32,
    pub clarity: f32,
    pub noise_reduction: f32,
    pub dehaze: f32,

    // Advanced effects & optics
    pub sepia: f32,
    pub blur: f32,
    pub vignette: f32,
    pub grain: f32,
    pub glow: f32,
    pub bloom: f32,
    pub chromatic_aberration: f32,
    pub hue: f32,

    // Transform
    pub aspect_ratio: AspectRatio,
    pub rotation: i32,
    pub flip_h: bool,
    pub flip_v: bool,
    pub skew_x: f32,
    pub skew_y: f32,

    // Filter selection & layers
    pub active_filter: String,
    pub filter_intensity: f32,
    pub layers: Vec<Layer>,

    // Color grading
    pub curves: Vec<CurvePoint>,
    pub hsl: BTreeMap<String, HslShift>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_rect: Option<CropRect>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        let mut hsl = BTreeMap::new();
        for channel in ["red", "green", "blue"] {
            hsl.insert(channel.to_string(), HslShift::default());
        }

        Self {
            brightness: 100.0,
            contrast: 100.0,
            exposure: 0.0,
            highlights: 100.0,
            shadows: 0.0,
            whites: 0.0,
            blacks: 0.0,
            saturation: 100.0,
            vibrance: 100.0,
            temperature: 0.0,
            tint: 0.0,
            sharpness: 0.0,
            clarity: 0.0,
            noise_reduction: 0.0,
            dehaze: 0.0,
            sepia: 0.0,
            blur: 0.0,
            vignette: 0.0,
            grain: 0.0,
            glow: 0.0,
            bloom: 0.0,
            chromatic_aberration: 0.0,
            hue: 0.0,
            aspect_ratio: AspectRatio::Custom,
            rotation: 0,
            flip_h: false,
            flip_v: false,
            skew_x: 0.0,
            skew_y: 0.0,
            active_filter: "none".to_string(),
            filter_intensity: 100.0,
            layers: Vec::new(),
            curves: vec![CurvePoint::new(0.0, 0.0), CurvePoint::new(1.0, 1.0)],
            hsl,
            mask_base64: None,
            crop_rect: None,
        }
    }
}

impl ProjectSettings {
    /// Returns a new value with every field present in `patch` overwritten
    /// and every absent field preserved. Overwrites apply regardless of the
    /// prior value; there is no additive accumulation.
    pub fn merged(&self, patch: &SettingsPatch) -> ProjectSettings {
        let mut next = self.clone();
        next.apply(patch);
        next
    }

    /// In-place variant of [`merged`](Self::merged).
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.brightness {
            self.brightness = v;
        }
        if let Some(v) = patch.contrast {
            self.contrast = v;
        }
        if let Some(v) = patch.exposure {
            self.exposure = v;
        }
        if let Some(v) = patch.highlights {
            self.highlights = v;
        }
        if let Some(v) = patch.shadows {
            self.shadows = v;
        }
        if let Some(v) = patch.whites {
            self.whites = v;
        }
        if let Some(v) = patch.blacks {
            self.blacks = v;
        }
        if let Some(v) = patch.saturation {
            self.saturation = v;
        }
        if let Some(v) = patch.vibrance {
            self.vibrance = v;
        }
        if let Some(v) = patch.temperature {
            self.temperature = v;
        }
        if let Some(v) = patch.tint {
            self.tint = v;
        }
        if let Some(v) = patch.sharpness {
            self.sharpness = v;
        }
        if let Some(v) = patch.clarity {
            self.clarity = v;
        }
        if let Some(v) = patch.noise_reduction {
            self.noise_reduction = v;
        }
        if let Some(v) = patch.dehaze {
            self.dehaze = v;
        }
        if let Some(v) = patch.sepia {
            self.sepia = v;
        }
        if let Some(v) = patch.blur {
            self.blur = v;
        }
        if let Some(v) = patch.vignette {
            self.vignette = v;
        }
        if let Some(v) = patch.grain {
            self.grain = v;
        }
        if let Some(v) = patch.glow {
            self.glow = v;
        }
        if let Some(v) = patch.bloom {
            self.bloom = v;
        }
        if let Some(v) = patch.chromatic_aberration {
            self.chromatic_aberration = v;
        }
        if let Some(v) = patch.hue {
            self.hue = v;
        }
        if let Some(v) = patch.aspect_ratio {
            self.aspect_ratio = v;
        }
        if let Some(v) = patch.rotation {
            self.rotation = v;
        }
        if let Some(v) = patch.flip_h {
            self.flip_h = v;
        }
        if let Some(v) = patch.flip_v {
            self.flip_v = v;
        }
        if let Some(v) = patch.skew_x {
            self.skew_x = v;
        }
        if let Some(v) = patch.skew_y {
            self.skew_y = v;
        }
        if let Some(ref v) = patch.active_filter {
            self.active_filter = v.clone();
        }
        if let Some(v) = patch.filter_intensity {
            self.filter_intensity = v;
        }
        if let Some(ref v) = patch.layers {
            self.layers = v.clone();
        }
        if let Some(ref v) = patch.curves {
            self.curves = v.clone();
        }
        if let Some(ref v) = patch.hsl {
            self.hsl = v.clone();
        }
        if let Some(ref v) = patch.mask_base64 {
            self.mask_base64 = v.clone();
        }
        if let Some(ref v) = patch.crop_rect {
            self.crop_rect = *v;
        }
    }
}

/// Sparse delta over [`ProjectSettings`]. Fields left `None` are unchanged
/// by a merge. The two trailing options are doubled up so a patch can both
/// set and clear the optional mask/crop fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadows: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whites: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blacks: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_reduction: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dehaze: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sepia: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vignette: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grain: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glow: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromatic_aberration: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_h: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_v: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_intensity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curves: Option<Vec<CurvePoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hsl: Option<BTreeMap<String, HslShift>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_base64: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_rect: Option<Option<CropRect>>,
}

impl SettingsPatch {
    /// Patch restoring the neutral diagonal tone curve.
    pub fn curves_reset() -> Self {
        Self {
            curves: Some(vec![CurvePoint::new(0.0, 0.0), CurvePoint::new(1.0, 1.0)]),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_structurally_complete() {
        let s = ProjectSettings::default();
        assert_eq!(s.brightness, 100.0);
        assert_eq!(s.contrast, 100.0);
        assert_eq!(s.exposure, 0.0);
        assert_eq!(s.vibrance, 100.0);
        assert_eq!(s.highlights, 100.0);
        assert_eq!(s.active_filter, "none");
        assert_eq!(s.filter_intensity, 100.0);
        assert_eq!(s.aspect_ratio, AspectRatio::Custom);
        assert!(s.layers.is_empty());
        assert_eq!(
            s.curves,
            vec![CurvePoint::new(0.0, 0.0), CurvePoint::new(1.0, 1.0)]
        );
        assert_eq!(s.hsl.len(), 3);
        assert!(s.hsl.contains_key("red"));
        assert!(s.mask_base64.is_none());
    }

    #[test]
    fn merge_preserves_absent_and_overwrites_present() {
        let base = ProjectSettings {
            brightness: 120.0,
            contrast: 90.0,
            ..Default::default()
        };
        let patch = SettingsPatch {
            contrast: Some(140.0),
            // Explicitly writing the default value still overwrites.
            brightness: Some(100.0),
            ..Default::default()
        };

        let next = base.merged(&patch);
        assert_eq!(next.brightness, 100.0);
        assert_eq!(next.contrast, 140.0);
        // Everything absent from the patch is untouched.
        assert_eq!(next.saturation, base.saturation);
        assert_eq!(next.layers, base.layers);
        assert_eq!(next.hsl, base.hsl);
    }

    #[test]
    fn merge_is_not_additive() {
        let base = ProjectSettings {
            rotation: 90,
            ..Default::default()
        };
        let patch = SettingsPatch {
            rotation: Some(90),
            ..Default::default()
        };
        assert_eq!(base.merged(&patch).rotation, 90);
    }

    #[test]
    fn empty_patch_is_identity() {
        let mut base = ProjectSettings::default();
        base.layers.push(Layer::text("Title", "HELLO"));
        base.vignette = 35.0;
        assert_eq!(base.merged(&SettingsPatch::default()), base);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut s = ProjectSettings::default();
        s.layers.push(Layer::image("Sticker", "stickers/star.png"));
        s.layers.push(Layer::text("Caption", "golden hour"));
        s.layers[1].blend_mode = BlendMode::SoftLight;
        s.crop_rect = Some(CropRect {
            x: 10.0,
            y: 20.0,
            width: 640.0,
            height: 480.0,
        });

        let json = serde_json::to_string(&s).unwrap();
        let back: ProjectSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn layer_kind_uses_lowercase_type_tag() {
        let layer = Layer::text("Caption", "hi");
        let json = serde_json::to_string(&layer).unwrap();
        assert!(json.contains("\"type\":\"text\""));

        let blend = serde_json::to_string(&BlendMode::SoftLight).unwrap();
        assert_eq!(blend, "\"soft-light\"");
    }

    #[test]
    fn curves_reset_patch_restores_diagonal() {
        let mut s = ProjectSettings::default();
        s.curves = vec![
            CurvePoint::new(0.0, 0.0),
            CurvePoint::new(0.4, 0.6),
            CurvePoint::new(1.0, 1.0),
        ];
        let next = s.merged(&SettingsPatch::curves_reset());
        assert_eq!(next.curves.len(), 2);
        assert_eq!(next.curves[1], CurvePoint::new(1.0, 1.0));
    }
}
