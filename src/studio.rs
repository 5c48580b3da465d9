// ============================================================================
// STUDIO — application state for one edit session
// ============================================================================
//
// Owns the project collection, the active-project pointer and the history
// stack of the current session, passed explicitly wherever it is needed
// (no ambient singletons). Continuous slider input flows through
// `update_settings` with no label and is never recorded; a commit supplies
// a label and lands in history.

use image::RgbaImage;
use uuid::Uuid;

use crate::ai::{AiAdapter, AiError};
use crate::history::HistoryStack;
use crate::presets::Preset;
use crate::project::{MediaKind, Project};
use crate::settings::{ProjectSettings, SettingsPatch};
use crate::store::{ProjectStore, StoreError};

pub struct Studio<S: ProjectStore> {
    store: S,
    projects: Vec<Project>,
    active: Option<Uuid>,
    history: HistoryStack,
}

impl<S: ProjectStore> Studio<S> {
    /// Load the saved collection from the store. No project is active yet.
    pub fn load(store: S) -> Result<Self, StoreError> {
        let projects = store.load()?;
        Ok(Self {
            store,
            projects,
            active: None,
            history: HistoryStack::new(),
        })
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn active_project(&self) -> Option<&Project> {
        let id = self.active?;
        self.projects.iter().find(|p| p.id == id)
    }

    fn active_project_mut(&mut self) -> Option<&mut Project> {
        let id = self.active?;
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Create a project, make it active and seed its session history with a
    /// single "Original" entry. New projects go to the front of the list.
    pub fn create_project(&mut self, title: &str, source_ref: &str, media: MediaKind) -> Uuid {
        let project = Project::new(title, source_ref, media);
        let id = project.id;
        self.projects.insert(0, project);
        self.active = Some(id);
        self.history.reset(&ProjectSettings::default(), "Original");
        id
    }

    /// Re-open a saved project. Session history restarts from the saved
    /// settings — prior history is not persisted across sessions.
    pub fn open_project(&mut self, id: Uuid) -> bool {
        let Some(project) = self.projects.iter().find(|p| p.id == id) else {
            return false;
        };
        let seed = project.settings.clone();
        self.active = Some(id);
        self.history.reset(&seed, "Resumed");
        true
    }

    pub fn delete_project(&mut self, id: Uuid) {
        self.projects.retain(|p| p.id != id);
        if self.active == Some(id) {
            self.active = None;
            self.history = HistoryStack::new();
        }
    }

    pub fn rename_project(&mut self, id: Uuid, title: &str) {
        if let Some(project) = self.projects.iter_mut().find(|p| p.id == id) {
            project.title = title.to_string();
            project.touch();
        }
    }

    /// Merge a sparse delta into the active project's live settings.
    /// With `label == None` this is an uncommitted (drag) update: the
    /// preview re-renders from it, but nothing is recorded. With a label
    /// the merged state lands in history as one entry.
    pub fn update_settings(&mut self, patch: &SettingsPatch, label: Option<&str>) -> bool {
        let Some(project) = self.active_project_mut() else {
            return false;
        };
        project.settings.apply(patch);
        project.touch();
        if let Some(label) = label {
            let snapshot = project.settings.clone();
            self.history.record(&snapshot, label);
        }
        true
    }

    /// Commit a slider value, labeled the way the adjust surface labels it.
    pub fn commit_adjustment(&mut self, patch: &SettingsPatch, tool_label: &str) -> bool {
        self.update_settings(patch, Some(&format!("Adjust {tool_label}")))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back in history and install a deep copy of that snapshot as the
    /// live settings. No-op when at the start or with no active project.
    pub fn undo(&mut self) -> bool {
        if self.active_project().is_none() {
            return false;
        }
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        if let Some(project) = self.active_project_mut() {
            project.settings = snapshot;
            project.touch();
        }
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.active_project().is_none() {
            return false;
        }
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        if let Some(project) = self.active_project_mut() {
            project.settings = snapshot;
            project.touch();
        }
        true
    }

    /// Quarter-turn rotate action: +90 degrees, wrapping mod 360.
    pub fn rotate_cw(&mut self) -> bool {
        let Some(project) = self.active_project() else {
            return false;
        };
        let next = (project.settings.rotation + 90) % 360;
        self.update_settings(
            &SettingsPatch {
                rotation: Some(next),
                ..Default::default()
            },
            Some("Rotate"),
        )
    }

    pub fn toggle_flip_h(&mut self) -> bool {
        let Some(project) = self.active_project() else {
            return false;
        };
        let next = !project.settings.flip_h;
        self.update_settings(
            &SettingsPatch {
                flip_h: Some(next),
                ..Default::default()
            },
            Some("Mirror Horizontal"),
        )
    }

    pub fn toggle_flip_v(&mut self) -> bool {
        let Some(project) = self.active_project() else {
            return false;
        };
        let next = !project.settings.flip_v;
        self.update_settings(
            &SettingsPatch {
                flip_v: Some(next),
                ..Default::default()
            },
            Some("Mirror Vertical"),
        )
    }

    pub fn apply_preset(&mut self, preset: &Preset) -> bool {
        self.update_settings(&preset.patch, Some(&format!("Applied Preset: {}", preset.name)))
    }

    pub fn reset_curves(&mut self) -> bool {
        self.update_settings(&SettingsPatch::curves_reset(), Some("Reset Curves"))
    }

    /// Ask the adapter for a grade and apply it as one committed edit.
    /// On any adapter failure the live settings and the history stack are
    /// left exactly as they were.
    pub fn apply_ai_grade(
        &mut self,
        adapter: &dyn AiAdapter,
        source: &RgbaImage,
    ) -> Result<(), AiError> {
        if self.active_project().is_none() {
            return Err(AiError::Unavailable("no active project".to_string()));
        }
        let proposal = adapter.propose_grade(source)?;
        self.update_settings(&proposal.clamped(), Some("Neural Enhance"));
        Ok(())
    }

    /// Ask the adapter for a background-removed replacement image. Pure
    /// passthrough: nothing is mutated here, so a failure cannot leave
    /// partial state. On success the caller encodes the replacement and
    /// installs it via [`replace_source`](Self::replace_source).
    pub fn isolate_subject(
        &self,
        adapter: &dyn AiAdapter,
        source: &RgbaImage,
    ) -> Result<RgbaImage, AiError> {
        adapter.isolate_subject(source)
    }

    /// Swap the active project's source reference (AI replacement flow).
    /// The pre-swap settings are recorded so the swap is undoable as a
    /// history point.
    pub fn replace_source(&mut self, reference: &str) -> bool {
        let Some(project) = self.active_project_mut() else {
            return false;
        };
        let snapshot = project.settings.clone();
        project.thumbnail = reference.to_string();
        project.touch();
        self.history.record(&snapshot, "AI Processing");
        true
    }

    /// Persist the whole collection through the store.
    pub fn persist(&self) -> Result<(), StoreError> {
        self.store.save(&self.projects)
    }
}
