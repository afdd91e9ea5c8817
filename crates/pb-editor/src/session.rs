//! Editor session: the single owner of all editing state.
//!
//! Routes every edit through the mutation engine, then records it in the
//! history, re-arms auto-save and remembers which component was used.
//! Problems the user should hear about (a template dropped in the wrong
//! place, a failed save) become [`Notice`]s instead of errors.

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use pb_core::id::NodeId;
use pb_core::lint::{LintDiagnostic, lint_page};
use pb_core::model::{PageDocument, Props};
use pb_core::registry::{Registry, TemplateContext};
use pb_core::zone::DropZone;
use pb_render::{RenderOptions, render_page};

use crate::autosave::AutoSave;
use crate::config::EditorConfig;
use crate::drag::{DragPayload, DragSession};
use crate::history::HistoryStack;
use crate::mutations::{Engine, PageMutation};
use crate::persist::{PageStore, SaveError};
use crate::prefs::{KeyValueStore, Preferences};
use crate::shortcuts::{ShortcutAction, ShortcutMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A non-fatal message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Modifier keys held during a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

pub struct EditorSession<K: KeyValueStore> {
    page: Arc<PageDocument>,
    registry: Registry,
    context: TemplateContext,
    selection: Option<NodeId>,
    history: HistoryStack,
    drag: DragSession,
    autosave: AutoSave,
    prefs: Preferences<K>,
    notices: Vec<Notice>,
}

impl<K: KeyValueStore> EditorSession<K> {
    /// Open `page` for editing. A stored auto-save preference overrides the
    /// configured default.
    pub fn new(
        page: PageDocument,
        registry: Registry,
        context: TemplateContext,
        config: &EditorConfig,
        prefs_store: K,
    ) -> Self {
        let prefs = Preferences::new(prefs_store, config.recent_limit);
        let autosave_enabled = prefs.autosave_enabled(config.autosave_enabled);
        let history = HistoryStack::new(page, config.history_depth);
        Self {
            page: history.current(),
            registry,
            context,
            selection: None,
            history,
            drag: DragSession::new(),
            autosave: AutoSave::new(config.autosave_delay(), autosave_enabled),
            prefs,
            notices: Vec::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn page(&self) -> &PageDocument {
        &self.page
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn autosave(&self) -> &AutoSave {
        &self.autosave
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    pub fn recent_components(&self) -> Vec<String> {
        self.prefs.recent_components()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Hand pending notices to the UI.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn engine(&self) -> Engine<'_> {
        Engine::new(&self.registry, &self.context)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a node. Unknown ids are ignored.
    pub fn select(&mut self, id: NodeId) -> bool {
        if !self.page.contains(id) {
            return false;
        }
        self.selection = Some(id);
        true
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Apply one mutation. Returns whether the page changed; a change is
    /// pushed to history exactly once.
    pub fn apply(&mut self, mutation: PageMutation, now: Instant) -> bool {
        let result = mutation.apply(&self.page, &self.engine());
        match result {
            Ok(Some(edit)) => {
                self.selection = edit.next_selection(self.selection);
                self.history.push(edit.page, &mutation.label());
                self.page = self.history.current();
                self.autosave.schedule(now);
                if let PageMutation::Add { kind, .. } | PageMutation::AddInColumn { kind, .. } =
                    &mutation
                {
                    self.prefs.record_use(kind);
                }
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!("session: {err}");
                self.notify(NoticeLevel::Warning, err.to_string());
                false
            }
        }
    }

    pub fn add(
        &mut self,
        kind: &str,
        index: usize,
        parent_id: Option<NodeId>,
        now: Instant,
    ) -> bool {
        self.apply(
            PageMutation::Add {
                kind: kind.to_string(),
                index,
                parent_id,
                overrides: Props::new(),
            },
            now,
        )
    }

    pub fn update(&mut self, id: NodeId, props: Props, now: Instant) -> bool {
        self.apply(PageMutation::Update { id, props }, now)
    }

    pub fn remove(&mut self, id: NodeId, now: Instant) -> bool {
        self.apply(PageMutation::Remove { id }, now)
    }

    pub fn duplicate(&mut self, id: NodeId, now: Instant) -> bool {
        self.apply(PageMutation::Duplicate { id }, now)
    }

    pub fn move_up(&mut self, id: NodeId, now: Instant) -> bool {
        self.apply(PageMutation::MoveUp { id }, now)
    }

    pub fn move_down(&mut self, id: NodeId, now: Instant) -> bool {
        self.apply(PageMutation::MoveDown { id }, now)
    }

    pub fn undo(&mut self, now: Instant) -> bool {
        let Some(page) = self.history.undo() else {
            return false;
        };
        self.restore(page, now);
        true
    }

    pub fn redo(&mut self, now: Instant) -> bool {
        let Some(page) = self.history.redo() else {
            return false;
        };
        self.restore(page, now);
        true
    }

    fn restore(&mut self, page: Arc<PageDocument>, now: Instant) {
        self.page = page;
        if let Some(id) = self.selection
            && !self.page.contains(id)
        {
            self.selection = None;
        }
        self.autosave.schedule(now);
    }

    // ─── Drag and drop ───────────────────────────────────────────────────

    pub fn start_drag(&mut self, payload: DragPayload) {
        self.drag.start_drag(payload);
    }

    pub fn hover_target(&mut self, zone: DropZone) {
        self.drag.hover_target(zone);
    }

    pub fn leave_target(&mut self, zone: &DropZone) {
        self.drag.leave_target(zone);
    }

    /// Complete the drag on `zone`.
    pub fn drop(&mut self, zone: &DropZone, now: Instant) -> bool {
        match self.drag.drop(zone, &self.page) {
            Some(mutation) => self.apply(mutation, now),
            None => false,
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Zones to highlight for the active drag.
    pub fn drop_zones(&self) -> Vec<DropZone> {
        self.drag.drop_zones(&self.page, &self.registry)
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Resolve and perform a keyboard shortcut. Returns the action taken.
    pub fn handle_key(
        &mut self,
        key: &str,
        mods: KeyModifiers,
        store: &mut dyn PageStore,
        now: Instant,
    ) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(key, mods.ctrl, mods.shift, mods.alt, mods.meta)?;
        match action {
            ShortcutAction::Escape => {
                if self.drag.is_dragging() {
                    self.drag.cancel();
                } else {
                    self.deselect();
                }
            }
            ShortcutAction::Undo => {
                self.undo(now);
            }
            ShortcutAction::Redo => {
                self.redo(now);
            }
            ShortcutAction::Save => {
                // Failures are already surfaced as a notice.
                self.save(store).ok();
            }
            ShortcutAction::Delete
            | ShortcutAction::Duplicate
            | ShortcutAction::MoveUp
            | ShortcutAction::MoveDown => {
                let id = self.selection?;
                let mutation = match action {
                    ShortcutAction::Delete => PageMutation::Remove { id },
                    ShortcutAction::Duplicate => PageMutation::Duplicate { id },
                    ShortcutAction::MoveUp => PageMutation::MoveUp { id },
                    _ => PageMutation::MoveDown { id },
                };
                self.apply(mutation, now);
            }
        }
        Some(action)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Save the current page. Failure keeps the page and adds a notice.
    pub fn save(&mut self, store: &mut dyn PageStore) -> Result<(), SaveError> {
        match store.save(&self.page) {
            Ok(()) => {
                info!("session: saved \"{}\"", self.page.meta.title);
                self.autosave.cancel();
                Ok(())
            }
            Err(err) => {
                warn!("session: save failed: {err}");
                self.notify(NoticeLevel::Error, format!("Could not save: {err}"));
                Err(err)
            }
        }
    }

    /// Drive auto-save from the host's clock. Returns whether a save was
    /// attempted.
    pub fn tick(&mut self, now: Instant, store: &mut dyn PageStore) -> bool {
        if !self.autosave.poll(now) {
            return false;
        }
        self.save(store).ok();
        true
    }

    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        self.prefs.set_autosave_enabled(enabled);
        self.autosave.set_enabled(enabled);
        self.notify(
            NoticeLevel::Info,
            if enabled {
                "Auto-save on".to_string()
            } else {
                "Auto-save off".to_string()
            },
        );
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Markup of the current page; `edit_mode` adds editor hooks.
    pub fn render(&self, edit_mode: bool) -> String {
        let options = RenderOptions {
            edit_mode,
            context: self.context.clone(),
        };
        render_page(&self.page, &self.registry, &options)
    }

    /// Structural problems of the current page.
    pub fn lint(&self) -> Vec<LintDiagnostic> {
        lint_page(&self.page, &self.registry)
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.push(Notice { level, message });
    }
}
