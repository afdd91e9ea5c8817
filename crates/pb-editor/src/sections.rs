//! Flat section list for the single-level builder.
//!
//! Unlike the nested page tree, sections carry an explicit `order`. The list
//! is kept sorted by it, and every operation renumbers `order` to `0..N-1`.

use log::debug;
use pb_core::id::NodeId;
use pb_core::model::{Props, SectionInstance};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionList {
    sections: Vec<SectionInstance>,
}

impl SectionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt sections from storage. Sorted by their stored `order` (ties keep
    /// input order), then renumbered.
    pub fn from_sections(mut sections: Vec<SectionInstance>) -> Self {
        sections.sort_by_key(|s| s.order);
        let mut list = Self { sections };
        list.renumber();
        list
    }

    pub fn sections(&self) -> &[SectionInstance] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SectionInstance> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Sections shown on the published page.
    pub fn visible(&self) -> impl Iterator<Item = &SectionInstance> {
        self.sections.iter().filter(|s| s.visible)
    }

    fn position(&self, id: NodeId) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    /// Insert a new section at `index` (clamped) and return its id.
    pub fn add(&mut self, kind: &str, index: usize, props: Props) -> NodeId {
        let id = NodeId::fresh(kind);
        let at = index.min(self.sections.len());
        self.sections.insert(
            at,
            SectionInstance {
                id,
                kind: kind.to_string(),
                order: 0,
                props,
                visible: true,
            },
        );
        self.renumber();
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SectionInstance> {
        let Some(pos) = self.position(id) else {
            debug!("sections: remove of missing {id}");
            return None;
        };
        let removed = self.sections.remove(pos);
        self.renumber();
        Some(removed)
    }

    /// Copy a section (fresh id) right after the original.
    pub fn duplicate(&mut self, id: NodeId) -> Option<NodeId> {
        let pos = self.position(id)?;
        let mut copy = self.sections[pos].clone();
        copy.id = NodeId::fresh(&copy.kind);
        let copy_id = copy.id;
        self.sections.insert(pos + 1, copy);
        self.renumber();
        Some(copy_id)
    }

    /// Move the section at `from` to `to` (clamped).
    pub fn move_section(&mut self, from: usize, to: usize) -> bool {
        if from >= self.sections.len() {
            return false;
        }
        let to = to.min(self.sections.len() - 1);
        if from == to {
            return false;
        }
        let section = self.sections.remove(from);
        self.sections.insert(to, section);
        self.renumber();
        true
    }

    /// Replace a section's props wholesale.
    pub fn update(&mut self, id: NodeId, props: Props) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.sections[pos].props = props;
        self.renumber();
        true
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.sections[pos].visible = visible;
        self.renumber();
        true
    }

    fn renumber(&mut self) {
        for (i, section) in self.sections.iter_mut().enumerate() {
            section.order = i as u32;
        }
    }
}
