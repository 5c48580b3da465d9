use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::ProjectSettings;

/// Media kind of the source asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

/// One editable document.
///
/// `thumbnail` doubles as the canonical source-image reference for the
/// compositing pipeline: an opaque string (path, URL or data URI) resolved
/// by the embedding application. A project owns exactly one live Settings;
/// its history stack lives in the active edit session and is not persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub thumbnail: String,
    pub media: MediaKind,
    pub last_edited_ms: u64,
    pub settings: ProjectSettings,
}

impl Project {
    /// New project with default settings. `title` falls back to a name
    /// derived from the id when empty.
    pub fn new(title: &str, thumbnail: &str, media: MediaKind) -> Self {
        let id = Uuid::new_v4();
        let title = if title.is_empty() {
            let tail = &id.simple().to_string()[..4];
            format!("Project_{tail}")
        } else {
            title.to_string()
        };
        Self {
            id,
            title,
            thumbnail: thumbnail.to_string(),
            media,
            last_edited_ms: now_millis(),
            settings: ProjectSettings::default(),
        }
    }

    /// Refresh the last-edited marker.
    pub fn touch(&mut self) {
        self.last_edited_ms = now_millis();
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
