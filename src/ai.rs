// ============================================================================
// AI ADAPTER — opaque external capability for grades and subject isolation
// ============================================================================
//
// The provider is network-backed and entirely outside the engine; the core
// consumes two operations and guarantees that a failure leaves Settings,
// history and the source image untouched — no partial application.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::SettingsPatch;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("ai provider unavailable: {0}")]
    Unavailable(String),
    #[error("ai response invalid: {0}")]
    InvalidResponse(String),
}

/// External capability invoked by the editing surface.
pub trait AiAdapter {
    /// Propose a color grade for the image as a bounded settings delta.
    fn propose_grade(&self, image: &RgbaImage) -> Result<GradeProposal, AiError>;

    /// Return a replacement image with the background removed.
    fn isolate_subject(&self, image: &RgbaImage) -> Result<RgbaImage, AiError>;
}

/// Numeric suggestions for the fixed grade subset. Providers answer with
/// whatever fields they produced; application clamps each into its
/// contract range, so a misbehaving provider can never push the settings
/// outside the suggested-grade envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeProposal {
    pub brightness: Option<f32>,
    pub contrast: Option<f32>,
    pub saturation: Option<f32>,
    pub vibrance: Option<f32>,
    pub temperature: Option<f32>,
    pub tint: Option<f32>,
    pub exposure: Option<f32>,
    pub vignette: Option<f32>,
}

impl GradeProposal {
    /// Parse a provider's JSON answer.
    pub fn from_json(raw: &str) -> Result<Self, AiError> {
        serde_json::from_str(raw).map_err(|e| AiError::InvalidResponse(e.to_string()))
    }

    /// Convert into a settings patch, clamping every present field into its
    /// contract range.
    pub fn clamped(&self) -> SettingsPatch {
        SettingsPatch {
            brightness: self.brightness.map(|v| v.clamp(70.0, 130.0)),
            contrast: self.contrast.map(|v| v.clamp(80.0, 140.0)),
            saturation: self.saturation.map(|v| v.clamp(80.0, 140.0)),
            vibrance: self.vibrance.map(|v| v.clamp(90.0, 130.0)),
            temperature: self.temperature.map(|v| v.clamp(-30.0, 30.0)),
            tint: self.tint.map(|v| v.clamp(-20.0, 20.0)),
            exposure: self.exposure.map(|v| v.clamp(-20.0, 20.0)),
            vignette: self.vignette.map(|v| v.clamp(0.0, 40.0)),
            ..Default::default()
        }
    }
}
