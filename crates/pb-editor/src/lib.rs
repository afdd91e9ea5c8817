pub mod autosave;
pub mod config;
pub mod drag;
pub mod history;
pub mod mutations;
pub mod persist;
pub mod prefs;
pub mod sections;
pub mod session;
pub mod shortcuts;

pub use autosave::AutoSave;
pub use config::EditorConfig;
pub use drag::{DragPayload, DragSession, DragState};
pub use history::HistoryStack;
pub use mutations::{Edit, EditResult, Engine, PageMutation, PlacementError};
pub use persist::{MemoryPageStore, PageStore, SaveError};
pub use prefs::{KeyValueStore, MemoryStore, Preferences};
pub use sections::SectionList;
pub use session::{EditorSession, KeyModifiers, Notice, NoticeLevel};
pub use shortcuts::{ShortcutAction, ShortcutMap};
