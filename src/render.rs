// ============================================================================
// RENDER PIPELINE — deterministic compositing shared by preview and export
// ============================================================================
//
// `render` is a pure function over (source, settings, target, assets); the
// preview canvas and the export encoder call the exact same code with
// different targets. Stage order is a contract: fit, geometric transform,
// combined tonal filter, vignette, layer composite. The stages are not
// commutative, so none of them may be reordered.

use image::RgbaImage;

use crate::ops::{effects, layers, tonal, transform};
use crate::ops::layers::LayerAssets;
use crate::settings::ProjectSettings;

/// Padding subtracted from a viewport before fitting, in pixels.
pub const VIEWPORT_PADDING: f32 = 60.0;

/// Where a frame is headed. Preview fits the source into a padded viewport;
/// export renders at the source's native resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderTarget {
    Viewport { width: f32, height: f32 },
    Native,
}

/// Uniform-scale fit of the source into the target, preserving aspect
/// ratio. Upscaling is allowed; degenerate viewports floor at one pixel.
pub fn fit_destination(src_w: u32, src_h: u32, target: RenderTarget) -> (u32, u32) {
    match target {
        RenderTarget::Native => (src_w.max(1), src_h.max(1)),
        RenderTarget::Viewport { width, height } => {
            let max_w = (width - VIEWPORT_PADDING).max(1.0);
            let max_h = (height - VIEWPORT_PADDING).max(1.0);
            let scale = (max_w / src_w.max(1) as f32).min(max_h / src_h.max(1) as f32);
            let dw = (src_w as f32 * scale).round().max(1.0) as u32;
            let dh = (src_h as f32 * scale).round().max(1.0) as u32;
            (dw, dh)
        }
    }
}

/// Compose one frame. Deterministic: identical inputs produce identical
/// pixels, and it never fails — out-of-range settings saturate.
pub fn render(
    source: &RgbaImage,
    settings: &ProjectSettings,
    target: RenderTarget,
    assets: &dyn LayerAssets,
) -> RgbaImage {
    let (dw, dh) = fit_destination(source.width(), source.height(), target);

    let mut frame = transform::geometric_pass(
        source,
        dw,
        dh,
        settings.flip_h,
        settings.flip_v,
        settings.rotation,
    );

    let filter = tonal::TonalFilter::from_settings(settings);
    if !filter.is_identity() {
        frame = tonal::apply(&frame, &filter);
    }

    if settings.vignette > 0.0 {
        frame = effects::vignette_pass(&frame, settings.vignette);
    }

    if !settings.layers.is_empty() {
        layers::composite_layers(&mut frame, &settings.layers, assets);
    }

    frame
}

/// One scheduled frame.
#[derive(Clone, Debug)]
pub struct FrameRequest {
    pub settings: ProjectSettings,
    pub target: RenderTarget,
}

/// Cooperative per-canvas render scheduler.
///
/// Settings changes schedule a frame rather than rendering synchronously;
/// a newer request replaces a still-pending one, so at most one frame is
/// ever in flight and the drawn frame always reflects the latest settings.
/// Rendering before the source has decoded defers: the request is kept and
/// served once the source arrives.
#[derive(Default)]
pub struct Renderer {
    source: Option<RgbaImage>,
    pending: Option<FrameRequest>,
    cancelled: u64,
    rendered: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or replace) the decoded source image.
    pub fn set_source(&mut self, source: RgbaImage) {
        self.source = Some(source);
    }

    pub fn source_ready(&self) -> bool {
        self.source.is_some()
    }

    /// Schedule a frame, cancelling any stale pending one.
    pub fn schedule(&mut self, settings: ProjectSettings, target: RenderTarget) {
        if self.pending.is_some() {
            self.cancelled += 1;
        }
        self.pending = Some(FrameRequest { settings, target });
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Render the most recent scheduled frame, if both a request and the
    /// source are available. Returns `None` (and keeps the request) while
    /// the source is still loading.
    pub fn render_pending(&mut self, assets: &dyn LayerAssets) -> Option<RgbaImage> {
        if self.pending.is_none() {
            return None;
        }
        let Some(source) = self.source.as_ref() else {
            log::debug!("render deferred: source image not ready");
            return None;
        };
        let request = self.pending.take()?;
        self.rendered += 1;
        Some(render(source, &request.settings, request.target, assets))
    }

    /// Frames discarded because a newer request replaced them.
    pub fn cancelled_frames(&self) -> u64 {
        self.cancelled
    }

    pub fn frames_rendered(&self) -> u64 {
        self.rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::layers::{MemoryAssets, NoAssets};
    use crate::settings::Layer;
    use image::Rgba;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([
                (x * 7 % 256) as u8,
                (y * 11 % 256) as u8,
                ((x + y) * 3 % 256) as u8,
                255,
            ])
        })
    }

    #[test]
    fn fit_scales_into_padded_viewport() {
        let (dw, dh) = fit_destination(
            200,
            100,
            RenderTarget::Viewport {
                width: 460.0,
                height: 260.0,
            },
        );
        // max 400x200 — width is the binding constraint
        assert_eq!((dw, dh), (400, 200));
    }

    #[test]
    fn fit_native_is_source_size() {
        assert_eq!(fit_destination(123, 77, RenderTarget::Native), (123, 77));
    }

    #[test]
    fn default_settings_reproduce_the_source() {
        let src = gradient(64, 48);
        let out = render(&src, &ProjectSettings::default(), RenderTarget::Native, &NoAssets);
        assert_eq!(out, src);
    }

    #[test]
    fn rendering_is_deterministic() {
        let src = gradient(80, 50);
        let mut settings = ProjectSettings {
            brightness: 115.0,
            contrast: 120.0,
            saturation: 140.0,
            vignette: 30.0,
            blur: 2.0,
            rotation: 25,
            flip_h: true,
            ..Default::default()
        };
        settings.layers.push(Layer::image("dot", "dot"));

        let mut assets = MemoryAssets::new();
        assets.insert("dot", RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 255])));

        let a = render(&src, &settings, RenderTarget::Native, &assets);
        let b = render(&src, &settings, RenderTarget::Native, &assets);
        assert_eq!(a, b);
    }

    #[test]
    fn full_rotation_equals_zero_rotation() {
        let src = gradient(40, 40);
        let mut settings = ProjectSettings::default();
        // Four quarter turns, as the rotate action applies them.
        for _ in 0..4 {
            settings.rotation = (settings.rotation + 90) % 360;
        }
        assert_eq!(settings.rotation, 0);

        let rotated = render(&src, &settings, RenderTarget::Native, &NoAssets);
        let straight = render(
            &src,
            &ProjectSettings::default(),
            RenderTarget::Native,
            &NoAssets,
        );
        assert_eq!(rotated, straight);
    }

    #[test]
    fn invisible_layers_match_zero_layers() {
        let src = gradient(60, 60);
        let mut assets = MemoryAssets::new();
        assets.insert("dot", RgbaImage::from_pixel(6, 6, Rgba([255, 0, 0, 255])));

        let mut with_hidden = ProjectSettings::default();
        let mut a = Layer::image("A", "dot");
        a.visible = false;
        let mut b = Layer::text("B", "HI");
        b.visible = false;
        with_hidden.layers.push(a);
        with_hidden.layers.push(b);

        let hidden = render(&src, &with_hidden, RenderTarget::Native, &assets);
        let bare = render(&src, &ProjectSettings::default(), RenderTarget::Native, &assets);
        assert_eq!(hidden, bare);
    }

    #[test]
    fn preview_and_export_share_one_pipeline() {
        // Rendering the same settings at the source's own size through the
        // viewport path must match the native path bit for bit.
        let src = gradient(100, 100);
        let settings = ProjectSettings {
            contrast: 130.0,
            vignette: 20.0,
            ..Default::default()
        };
        let native = render(&src, &settings, RenderTarget::Native, &NoAssets);
        let viewport = render(
            &src,
            &settings,
            RenderTarget::Viewport {
                width: 100.0 + VIEWPORT_PADDING,
                height: 100.0 + VIEWPORT_PADDING,
            },
            &NoAssets,
        );
        assert_eq!(native, viewport);
    }

    #[test]
    fn scheduler_coalesces_to_the_latest_request() {
        let mut renderer = Renderer::new();
        renderer.set_source(gradient(30, 30));

        renderer.schedule(
            ProjectSettings {
                brightness: 50.0,
                ..Default::default()
            },
            RenderTarget::Native,
        );
        renderer.schedule(ProjectSettings::default(), RenderTarget::Native);
        assert_eq!(renderer.cancelled_frames(), 1);

        let frame = renderer.render_pending(&NoAssets).unwrap();
        // The stale brightness=50 request was replaced by the default one.
        assert_eq!(frame, gradient(30, 30));
        assert_eq!(renderer.frames_rendered(), 1);
        // Nothing left in flight.
        assert!(renderer.render_pending(&NoAssets).is_none());
    }

    #[test]
    fn scheduler_defers_until_source_is_ready() {
        let mut renderer = Renderer::new();
        renderer.schedule(ProjectSettings::default(), RenderTarget::Native);

        assert!(renderer.render_pending(&NoAssets).is_none());
        assert!(renderer.has_pending());

        renderer.set_source(gradient(10, 10));
        assert!(renderer.render_pending(&NoAssets).is_some());
        assert!(!renderer.has_pending());
    }
}
