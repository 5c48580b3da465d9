// Master grade presets offered by the grade surface. Each preset is a
// sparse settings delta; applying one merges it over the live settings and
// records a single history entry.

use crate::settings::SettingsPatch;

pub struct Preset {
    pub name: &'static str,
    pub patch: SettingsPatch,
}

pub fn master_presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "Cinematic Cyan",
            patch: SettingsPatch {
                hue: Some(180.0),
                saturation: Some(120.0),
                contrast: Some(115.0),
                sepia: Some(10.0),
                ..Default::default()
            },
        },
        Preset {
            name: "Muted Gold",
            patch: SettingsPatch {
                saturation: Some(80.0),
                sepia: Some(40.0),
                contrast: Some(105.0),
                brightness: Some(105.0),
                ..Default::default()
            },
        },
        Preset {
            name: "Kodak Portra",
            patch: SettingsPatch {
                vibrance: Some(110.0),
                temperature: Some(10.0),
                shadows: Some(5.0),
                whites: Some(5.0),
                ..Default::default()
            },
        },
        Preset {
            name: "High Contrast BW",
            patch: SettingsPatch {
                saturation: Some(0.0),
                contrast: Some(160.0),
                blacks: Some(-20.0),
                whites: Some(20.0),
                ..Default::default()
            },
        },
    ]
}
